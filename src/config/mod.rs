pub mod toml_config;

use crate::adapters::snapshot_gateway::DEFAULT_SNAPSHOT_FILE;
use crate::domain::model::LoanTerm;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use toml_config::TomlConfig;

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::path::PathBuf;

pub const DEFAULT_DATA_DIR: &str = "./data";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// 合併預設值、設定檔與命令列參數後的最終設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryConfig {
    pub data_dir: String,
    pub snapshot_file: String,
    pub loan_term_seconds: u64,
    pub log_format: LogFormat,
    pub verbose: bool,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            data_dir: DEFAULT_DATA_DIR.to_string(),
            snapshot_file: DEFAULT_SNAPSHOT_FILE.to_string(),
            loan_term_seconds: LoanTerm::DEFAULT_SECONDS,
            log_format: LogFormat::Text,
            verbose: false,
        }
    }
}

impl LibraryConfig {
    pub fn loan_term(&self) -> LoanTerm {
        LoanTerm::from_secs(self.loan_term_seconds)
    }

    pub fn apply_file(mut self, file: &TomlConfig) -> Self {
        if let Some(data_dir) = &file.storage.data_dir {
            self.data_dir = data_dir.clone();
        }
        if let Some(snapshot_file) = &file.storage.snapshot_file {
            self.snapshot_file = snapshot_file.clone();
        }
        if let Some(term) = file.loans.term_seconds {
            self.loan_term_seconds = term;
        }
        if let Some(format) = file.logging.format {
            self.log_format = format;
        }
        self
    }
}

impl Validate for LibraryConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("storage.data_dir", &self.data_dir)?;
        validation::validate_file_name("storage.snapshot_file", &self.snapshot_file)?;
        validation::validate_positive_number("loans.term_seconds", self.loan_term_seconds, 1)?;
        Ok(())
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "small-library")]
#[command(about = "A small terminal library catalog and lending tracker")]
pub struct CliConfig {
    /// Path to an optional TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory holding the library snapshot
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Snapshot file name inside the data directory
    #[arg(long)]
    pub snapshot_file: Option<String>,

    /// Loan term in seconds before a loan is overdue
    #[arg(long)]
    pub loan_term_secs: Option<u64>,

    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 優先順序：命令列 > 設定檔 > 預設值
    pub fn resolve(&self) -> Result<LibraryConfig> {
        let file = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };

        let mut config = LibraryConfig::default().apply_file(&file);
        if let Some(data_dir) = &self.data_dir {
            config.data_dir = data_dir.clone();
        }
        if let Some(snapshot_file) = &self.snapshot_file {
            config.snapshot_file = snapshot_file.clone();
        }
        if let Some(term) = self.loan_term_secs {
            config.loan_term_seconds = term;
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        config.verbose = self.verbose;
        Ok(config)
    }
}
