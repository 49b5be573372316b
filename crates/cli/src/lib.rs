//! Library half of the `git-ipfs-mirror` binary
//!
//! - `config`: user configuration file
//! - `driver`: one mirror run, generic over source and block store
//! - `progress`: terminal spinner

pub mod config;
pub mod driver;
pub mod progress;

pub use config::MirrorConfig;
pub use driver::{mirror_reference, MirrorOutcome};
pub use progress::SpinnerProgress;
