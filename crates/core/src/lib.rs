// Sparenet Core - Domain Logic & Ports
// No infrastructure dependencies: probes, HTTP clients and servers live in infra crates.

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{AppError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
