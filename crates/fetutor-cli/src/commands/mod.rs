//! Subcommand implementations and the plumbing they share.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use fetutor_core::model::ProblemBank;
use fetutor_core::traits::Oracle;
use fetutor_providers::{OfflineOracle, TutorConfig};

pub mod check;
pub mod init;
pub mod problems;
pub mod report;
pub mod score;
pub mod session;
pub mod validate;

/// Options for commands that talk to the oracle.
#[derive(Args, Debug, Clone)]
pub struct OracleArgs {
    /// Config file path
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Provider name from the config (default: `default_provider`)
    #[arg(long)]
    pub provider: Option<String>,

    /// Model override
    #[arg(long)]
    pub model: Option<String>,

    /// Run without an oracle: answers are still graded, scores are unavailable
    #[arg(long)]
    pub offline: bool,
}

impl OracleArgs {
    pub fn load_config(&self) -> Result<TutorConfig> {
        fetutor_providers::load_config_from(self.config.as_deref())
    }

    pub fn oracle(&self, config: &TutorConfig) -> Result<Arc<dyn Oracle>> {
        if self.offline {
            return Ok(Arc::new(OfflineOracle::new("running with --offline")));
        }
        config.oracle(self.provider.as_deref())
    }
}

/// Load the bank from `override_path`, else the configured location.
pub fn load_bank(override_path: Option<&Path>, config: &TutorConfig) -> Result<ProblemBank> {
    let path = override_path.unwrap_or(&config.bank);
    fetutor_core::parser::load_bank(path)
}
