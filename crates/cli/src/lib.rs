//! bookcheck CLI
//!
//! Command-line interface for validating records against declarative
//! schemas, generating booking payloads, and probing the booking API.

pub mod commands;
pub mod output;
