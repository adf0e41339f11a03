use clap::Parser;

use crate::path::PathLimits;
use crate::server::ServerConfig;
use crate::tree::TreeConfig;

#[derive(Parser, Debug)]
#[command(name = "simse-ft-engine", about = "In-memory file tree over JSON-RPC 2.0 / NDJSON stdio")]
pub struct CliArgs {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "SIMSE_FT_LOG_LEVEL")]
    pub log_level: String,

    /// Maximum number of components in a path
    #[arg(long, default_value = "64", env = "SIMSE_FT_MAX_PATH_DEPTH")]
    pub max_path_depth: usize,

    /// Maximum length of a single path component, in bytes
    #[arg(long, default_value = "255", env = "SIMSE_FT_MAX_NAME_LENGTH")]
    pub max_name_length: usize,

    /// Start with the tree already initialized
    #[arg(long)]
    pub auto_init: bool,

    /// Run the structural checker after every successful mutation
    #[arg(long)]
    pub check_after_mutation: bool,
}

impl CliArgs {
    pub fn tree_config(&self) -> TreeConfig {
        TreeConfig {
            limits: PathLimits {
                max_path_depth: self.max_path_depth,
                max_name_length: self.max_name_length,
            },
        }
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            check_after_mutation: self.check_after_mutation,
        }
    }
}
