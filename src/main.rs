use clap::Parser;
use library_lending::adapters::http;
use library_lending::domain::ports::ConfigProvider;
use library_lending::utils::{logger, validation::Validate};
use library_lending::CliConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting library-lending");
    tracing::info!("Loading configuration from: {}", cli.config);

    let config = match cli.load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load config file '{}': {}", cli.config, e);
            eprintln!("Failed to load config file '{}': {}", cli.config, e);
            eprintln!("Suggestion: {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("{}", e);
        eprintln!("Suggestion: {}", e.recovery_suggestion());
        std::process::exit(1);
    }
    tracing::debug!(
        bind_address = ConfigProvider::bind_address(&config),
        loan_period_days = config.loan_period_days(),
        tokens = config.auth.tokens.len(),
        "Configuration validated"
    );

    let state = library_lending::app::build_state(&config).await?;
    let app = library_lending::router(state);

    let listener = tokio::net::TcpListener::bind(ConfigProvider::bind_address(&config)).await?;
    http::serve(listener, app).await?;

    Ok(())
}
