//! CLI Commands

pub mod generate;
pub mod ping;
pub mod schema;
pub mod validate;
