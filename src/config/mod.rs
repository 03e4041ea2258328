//! Requester configuration
//!
//! Settings are merged from four layers, later layers winning:
//! 1. Built-in defaults
//! 2. Host/user config (~/.config/dlc/requester.toml)
//! 3. Repo config (.dlc/requester.toml)
//! 4. CLI flags
//!
//! The build environment (`PR_NUMBER`, `CODEBUILD_RESOLVED_SOURCE_VERSION`)
//! is read separately into [`BuildEnv`].

mod defaults;
mod effective;
mod env;
mod merge;

pub use defaults::BuiltinDefaults;
pub use effective::{
    ConfigError, ConfigOrigin, ConfigSource, RequesterConfig, HOST_CONFIG_PATH, REPO_CONFIG_PATH,
};
pub use env::BuildEnv;
pub use merge::{merge_into, merge_layers};
