//! Seatwise E2E Test Framework
//!
//! Drives the host-stand flows from `seatwise-cli` against an in-process
//! fake of the reservation REST backend:
//! - Spawns the fake backend on a free local port
//! - Parses declarative YAML scenarios
//! - Runs each scenario through the same flow functions the CLI uses
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  E2E Scenario Runner (Rust)                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestRunner                                                 │
//! │    ├── start_server() -> ServerHandle (axum FakeApi)        │
//! │    └── run_spec(spec: TestSpec) -> TestResult               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestSpec (YAML)                                            │
//! │    ├── name, description, tags                              │
//! │    └── steps: [Step]                                        │
//! │          ├── create_course / create_student / edit_student  │
//! │          ├── seat / finish / cancel                         │
//! │          └── expect_student / expect_course / ...           │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod fake_api;
pub mod fixtures;
pub mod runner;
pub mod server;
pub mod spec;

pub use error::{E2eError, E2eResult};
pub use fake_api::FakeApi;
pub use runner::TestRunner;
pub use server::{ServerConfig, ServerHandle};
pub use spec::{TestSpec, TestStep};
