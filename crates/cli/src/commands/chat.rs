//! `groundwire chat` — Interactive REPL with streaming answers.

use std::io::Write as _;
use std::pin::pin;

use groundwire_config::AppConfig;
use groundwire_core::routing::Provenance;
use groundwire_core::session::Session;
use groundwire_router::RouteEvent;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use super::CliError;

pub async fn run() -> Result<(), CliError> {
    let config = AppConfig::load()?;
    let router = super::build_router(&config)?;

    println!();
    println!("  Groundwire — chat with encyclopedia fallback");
    println!();
    println!("  Endpoint:  {}", config.base_url);
    println!("  Model:     {}", config.model);
    println!();
    println!("  Type your question and press Enter.");
    println!("  'clear' resets the conversation; 'exit' or Ctrl+C quits.");
    println!();

    let mut session = Session::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    prompt()?;
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        match input {
            "" => {
                prompt()?;
                continue;
            }
            "exit" | "quit" => break,
            "clear" => {
                session.clear();
                println!("  (conversation cleared)");
                prompt()?;
                continue;
            }
            _ => {}
        }

        let (tx, mut rx) = mpsc::channel::<RouteEvent>(64);
        let mut outcome = None;
        {
            let mut route = pin!(router.route_streamed(&mut session, input, &tx));
            while outcome.is_none() {
                tokio::select! {
                    result = &mut route => outcome = Some(result),
                    Some(event) = rx.recv() => render(&event)?,
                }
            }
        }
        drop(tx);
        // Events still buffered when the route future finished first
        while let Ok(event) = rx.try_recv() {
            render(&event)?;
        }

        match outcome {
            Some(Ok(_)) => {}
            Some(Err(e)) => eprintln!("  [error] {e}"),
            None => unreachable!(),
        }

        println!();
        prompt()?;
    }

    println!();
    println!("  Goodbye!");
    Ok(())
}

fn prompt() -> Result<(), CliError> {
    print!("  You > ");
    std::io::stdout().flush()?;
    Ok(())
}

fn render(event: &RouteEvent) -> Result<(), CliError> {
    match event {
        RouteEvent::Delta { content } => {
            print!("{content}");
            std::io::stdout().flush()?;
        }
        RouteEvent::Grounding { title } => {
            println!("  [consulting the encyclopedia: {title}]");
        }
        RouteEvent::Done {
            provenance,
            grounding_title,
            usage,
            session_tokens,
        } => {
            println!();
            let source = match (provenance, grounding_title) {
                (Provenance::Grounded, Some(title)) => format!("{provenance} ({title})"),
                _ => provenance.to_string(),
            };
            let turn_tokens = usage
                .as_ref()
                .map(|u| u.total_tokens.to_string())
                .unwrap_or_else(|| "?".into());
            println!("  [source: {source} | turn tokens: {turn_tokens} | session tokens: {session_tokens}]");
        }
        RouteEvent::Error { message } => {
            eprintln!("  [error] {message}");
        }
    }
    Ok(())
}
