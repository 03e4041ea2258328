//! Build environment.

/// Environment variable selecting the ticket-name prefix.
pub const PR_NUMBER_VAR: &str = "PR_NUMBER";

/// Environment variable recorded as the ticket's `COMMIT`.
pub const SOURCE_VERSION_VAR: &str = "CODEBUILD_RESOLVED_SOURCE_VERSION";

/// Values the requester takes from the CI environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildEnv {
    /// `PR_NUMBER`, e.g. `pr/1234`.
    pub pr_number: Option<String>,
    /// `CODEBUILD_RESOLVED_SOURCE_VERSION`.
    pub source_version: Option<String>,
}

impl BuildEnv {
    /// Read from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read through an arbitrary lookup function.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            pr_number: lookup(PR_NUMBER_VAR),
            source_version: lookup(SOURCE_VERSION_VAR),
        }
    }

    /// Value for the ticket's `COMMIT` field; empty when unset.
    pub fn commit(&self) -> &str {
        self.source_version.as_deref().unwrap_or("")
    }
}
