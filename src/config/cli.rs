use crate::config::toml_config::LibraryConfig;
use crate::utils::error::Result;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "library-lending")]
#[command(about = "Book lending service with a small JSON API")]
pub struct CliConfig {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "library.toml")]
    pub config: String,

    /// Override `server.bind_address` from the config file
    #[arg(long)]
    pub bind: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

impl CliConfig {
    /// Reads the config file and applies command-line overrides.
    pub fn load(&self) -> Result<LibraryConfig> {
        let mut config = LibraryConfig::from_file(&self.config)?;
        if let Some(bind) = &self.bind {
            config.server.bind_address = Some(bind.clone());
        }
        Ok(config)
    }
}
