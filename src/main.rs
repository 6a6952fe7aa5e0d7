use ai_content_translate::config::Config;
use ai_content_translate::providers::provider_options;
use ai_content_translate::store::{ContentItem, Document, JsonFileItem};
use ai_content_translate::TranslateAction;
use anyhow::{bail, Context, Result};
use tracing::{info, warn};

const USAGE: &str = "Usage: ai-translate <item.json> | ai-translate --providers";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored when the variables come from the environment)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ai_content_translate=info".parse()?),
        )
        .init();

    let config = Config::from_env()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let path = match args.as_slice() {
        [flag] if flag == "--providers" => {
            let options = provider_options(&config.providers);
            println!("{}", serde_json::to_string_pretty(&options)?);
            return Ok(());
        }
        [path] => path,
        _ => bail!(USAGE),
    };

    let item = JsonFileItem::load(path)?;
    let action = TranslateAction::from_config(config);

    if !action.visible_to(&item) {
        warn!(
            "Translation is only offered for entries with a configured provider and model ({:?} item)",
            item.kind()
        );
    }

    info!("Translating {}", item.path().display());
    let mut items = [item];
    let result = action
        .run(&mut items, &Document::new())
        .await
        .with_context(|| format!("Failed to translate {}", path))?;

    info!("Saved {}", items[0].path().display());
    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}
