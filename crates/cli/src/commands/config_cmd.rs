//! `groundwire config` — Show or initialize the configuration.

use groundwire_config::AppConfig;

use super::CliError;

pub fn run(init: bool) -> Result<(), CliError> {
    let config_path = AppConfig::config_dir().join("config.toml");

    if init {
        if config_path.exists() {
            println!("  Config already exists: {}", config_path.display());
        } else {
            std::fs::create_dir_all(AppConfig::config_dir())?;
            std::fs::write(&config_path, AppConfig::default_toml())?;
            println!("  Wrote default config: {}", config_path.display());
        }
        return Ok(());
    }

    let config = AppConfig::load()?;
    println!("  Config file: {}", config_path.display());
    println!("  API key:     {}", if config.has_api_key() { "set" } else { "not set" });
    println!("  Endpoint:    {}", config.base_url);
    println!("  Model:       {}", config.model);
    println!("  Temperature: {}", config.temperature);
    match config.max_tokens {
        Some(max) => println!("  Max tokens:  {max}"),
        None => println!("  Max tokens:  endpoint default"),
    }
    println!("  Retrieval:   {} ({} sentences)", config.retrieval.api_url, config.retrieval.sentences);

    Ok(())
}
