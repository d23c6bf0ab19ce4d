//! modbot CLI: run the bot with the bundled modules, list modules, check config.

use anyhow::Result;
use clap::Parser;
use modbot::{run_bot, ModuleRegistry};
use modbot_cli::{describe_config, load_config, module_table, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut registry = ModuleRegistry::new();
    modbot_examples::register_all(&mut registry);

    match cli.command {
        Commands::Run { token } => {
            let config = load_config(token)?;
            run_bot(config, registry).await
        }
        Commands::Modules => {
            tracing_subscriber::fmt()
                .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string()))
                .with_target(false)
                .init();
            let config = load_config(None)?;
            for line in module_table(config, &registry)? {
                println!("{}", line);
            }
            Ok(())
        }
        Commands::CheckConfig => {
            let config = load_config(None)?;
            config.validate()?;
            for line in describe_config(&config) {
                println!("{}", line);
            }
            println!("Config OK");
            Ok(())
        }
    }
}
