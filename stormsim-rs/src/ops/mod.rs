//! Per-resource operation wrappers.
//!
//! Each wrapper is a thin translation from a method call to a fixed
//! `/<resource>/operations/<op>` path; transport, classification, and error
//! handling all live in the session layer.

mod administration;
mod appprofile;
mod capture;
mod evasionprofile;
mod loadprofile;
mod network;
mod remote;
mod reports;
mod results;
mod statistics;
mod strikelist;
mod strikes;
mod superflow;
mod testmodel;
mod topology;

pub use administration::AdministrationOps;
pub use appprofile::AppProfileOps;
pub use capture::CaptureOps;
pub use evasionprofile::EvasionProfileOps;
pub use loadprofile::LoadProfileOps;
pub use network::NetworkOps;
pub use remote::RemoteOps;
pub use reports::ReportsOps;
pub use results::ResultsOps;
pub use statistics::StatisticsOps;
pub use strikelist::StrikeListOps;
pub use strikes::StrikesOps;
pub use superflow::SuperflowOps;
pub use testmodel::TestModelOps;
pub use topology::TopologyOps;
