#![warn(clippy::unwrap_used)]
mod error;
#[cfg(test)]
mod fake;
pub mod ops;
mod proxy;
mod runner;
mod session;
pub mod value;

pub use error::{Error, Result};
pub use proxy::DataModelProxy;
pub use runner::{run_model, ReleaseFailure, RunConfig, RunOutcome, RunReport, RunStatus};
pub use session::{ApiClient, ProfilingEntry, Session, CLIENT_VERSION};
