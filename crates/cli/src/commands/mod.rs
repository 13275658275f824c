//! CLI command implementations.

pub mod ask;
pub mod chat;
pub mod config_cmd;

use std::sync::Arc;

use groundwire_config::AppConfig;
use groundwire_engine::OpenAiCompatEngine;
use groundwire_retrieval::WikipediaRetriever;
use groundwire_router::TurnRouter;

pub type CliError = Box<dyn std::error::Error>;

/// Build the turn router from configuration.
///
/// Fails early with setup instructions when no API key is available.
pub fn build_router(config: &AppConfig) -> Result<TurnRouter, CliError> {
    let Some(api_key) = config.api_key.clone() else {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    GROUNDWIRE_API_KEY = 'sk-...'   (highest priority)");
        eprintln!("    OPENCODE_API_KEY   = 'sk-...'");
        eprintln!("    OPENAI_API_KEY     = 'sk-...'");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    };

    let engine = OpenAiCompatEngine::new("opencode", &config.base_url, api_key)?;
    let retriever =
        WikipediaRetriever::with_api_url(&config.retrieval.api_url, config.retrieval.sentences)?;

    let mut router = TurnRouter::new(
        Arc::new(engine),
        Arc::new(retriever),
        config.model.as_str(),
    )
    .with_temperature(config.temperature);

    if let Some(max) = config.max_tokens {
        router = router.with_max_tokens(max);
    }

    Ok(router)
}
