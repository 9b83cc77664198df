// Application layer: ownership checks and translation of storage outcomes
// into typed errors. Transports (the CLI, an HTTP layer) talk to this only.

pub mod error;
pub mod service;

pub use error::*;
pub use service::*;
