//! bookcheck E2E Test Framework
//!
//! This crate drives two kinds of end-to-end tests:
//! - The booking API lifecycle (auth, create, read, update, delete), with
//!   every response checked by the record validator from `bookcheck-common`
//! - Declarative YAML UI flows, each compiled into one Playwright script
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    E2E Test Runner (Rust)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestRunner                                                 │
//! │    ├── run_lifecycle() -> TestResult                        │
//! │    │     └── BookingLifecycle<dyn BookingApi>               │
//! │    │           ping → auth → create → get → update →        │
//! │    │           delete → verify_deleted                      │
//! │    └── run_flow(flow: FlowSpec) -> TestResult               │
//! │          └── PlaywrightDriver (one node process per flow)   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  FlowSpec (YAML)                                            │
//! │    ├── name, description, tags, base_url?                   │
//! │    └── steps: [Step]                                        │
//! │          ├── navigate { url }                               │
//! │          ├── click / fill / press { selector }              │
//! │          ├── wait { selector } / wait_for_load { state }    │
//! │          ├── assert { selector, visible?, text?, count? }   │
//! │          ├── evaluate { script, expected? }                 │
//! │          └── screenshot { name, selector? }                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod booker;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod playwright;
pub mod runner;
pub mod spec;

pub use booker::{ApiResponse, BookerClient, BookingApi};
pub use config::BookerConfig;
pub use error::{E2eError, E2eResult};
pub use lifecycle::{BookingLifecycle, LifecycleStep};
pub use runner::{TestResult, TestRunner, TestSuiteResult};
pub use spec::{FlowSpec, FlowStep};
