//! `version` command handler.

use std::fmt;

use aws_cleanup::{DESCRIPTION, SERVICE, VERSION};

const UNKNOWN: &str = "unknown";

/// Build information, injected at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildInfo {
    /// Service name.
    pub service: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// Git commit, from `AWS_CLEANUP_GIT_COMMIT`.
    pub git_commit: &'static str,
    /// Build date, from `AWS_CLEANUP_BUILD_DATE`.
    pub build_date: &'static str,
}

impl BuildInfo {
    /// Returns the information of the running binary.
    #[must_use]
    pub const fn current() -> Self {
        Self {
            service: SERVICE,
            version: VERSION,
            git_commit: match option_env!("AWS_CLEANUP_GIT_COMMIT") {
                Some(commit) => commit,
                None => UNKNOWN,
            },
            build_date: match option_env!("AWS_CLEANUP_BUILD_DATE") {
                Some(date) => date,
                None => UNKNOWN,
            },
        }
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} - {DESCRIPTION}", self.service)?;
        writeln!(f, "Version:    {}", self.version)?;
        writeln!(f, "Git commit: {}", self.git_commit)?;
        write!(f, "Built:      {}", self.build_date)
    }
}

/// Prints service name, version, git commit and build date.
pub fn cmd_version() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", BuildInfo::current());
    Ok(())
}
