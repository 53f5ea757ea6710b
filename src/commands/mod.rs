//! Command handlers module.
//!
//! - `cloudwatch.rs`: CloudWatch Logs retention sweep
//! - `version.rs`: build information

mod cloudwatch;
mod version;

pub use cloudwatch::{CloudwatchArgs, cmd_cloudwatch};
pub use version::cmd_version;
