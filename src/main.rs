use clap::Parser;
use tickforge::cli::{Cli, Commands};
use tickforge::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration, falling back to defaults when no file is present
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        Config::default()
    });

    // Initialize telemetry
    let _guard = tickforge::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Convert(args) => {
            tracing::info!("Starting conversion run");
            args.execute(&config).await?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!("  Memory policy: {:?}", config.converter.memory_policy);
            println!("  Flush interval: {}", config.converter.flush_interval);
            println!("  Parallelism: {}", config.converter.parallelism);
            println!("  Extractor: {}", config.converter.extractor);
            println!("  Log level: {}", config.telemetry.log_level);
        }
    }

    Ok(())
}
