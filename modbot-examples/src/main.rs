use anyhow::Result;
use modbot::{run_bot, BotConfig, ModuleRegistry};

/// Runs the example modules. Config comes from the environment (and `.env`).
#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = BotConfig::load(None)?;
    let mut registry = ModuleRegistry::new();
    modbot_examples::register_all(&mut registry);
    run_bot(config, registry).await
}
