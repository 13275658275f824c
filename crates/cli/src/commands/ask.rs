//! `groundwire ask` — Answer a single question and exit.

use groundwire_config::AppConfig;
use groundwire_core::routing::Provenance;
use groundwire_core::session::Session;

use super::CliError;

pub async fn run(question: &str) -> Result<(), CliError> {
    let config = AppConfig::load()?;
    let router = super::build_router(&config)?;

    let mut session = Session::new();

    eprint!("  Thinking...");
    let result = router.route(&mut session, question).await?;
    eprint!("\r             \r");

    println!("{}", result.text);

    // Provenance footer goes to stderr so piped output stays clean
    match (result.provenance, &result.grounding_title) {
        (Provenance::Grounded, Some(title)) => {
            eprintln!("  [source: retrieval — {title}]");
        }
        (provenance, _) => {
            eprintln!("  [source: {provenance}]");
        }
    }

    Ok(())
}
