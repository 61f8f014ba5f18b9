//! Terminal front-end for the localization sidebar.
//!
//! Drives one session against a JSON file standing in for the host entry.
//!
//! Required environment variables:
//! - SIDEBAR_LOCALES (e.g. "en-US=English,de=German,fr=French")
//! - SIDEBAR_DEFAULT_LOCALE (e.g. "en-US")
//!
//! Optional:
//! - SIDEBAR_DOCUMENT_PATH (defaults to data/entry.json)
//! - SIDEBAR_FIELD_ID (defaults to phrase)
//! - POLL_INTERVAL_MS (defaults to 1000)

use anyhow::Result;
use chrono::Utc;
use phrase_sidebar::config::Config;
use phrase_sidebar::host::FileDocumentStore;
use phrase_sidebar::session::SidebarSession;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

const HELP: &str = "Commands:
  show              Render the sidebar
  json              Render the sidebar as JSON
  check <code>      Check a language
  uncheck <code>    Uncheck a language
  all | none        Select all / select none
  click             Press the primary action button
  help              Show this help
  quit              Exit";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored when absent)
    let _ = dotenvy::dotenv();

    // Initialize logging on stderr so the rendered sidebar stays readable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("phrase_sidebar=info".parse()?),
        )
        .init();

    let config = Config::from_env()?;
    let catalog = config.catalog()?;

    info!("Using entry file {}", config.document_path.display());
    let store = Arc::new(FileDocumentStore::new(
        config.document_path.clone(),
        config.field_id.clone(),
    ));

    let mut session = SidebarSession::open(store, catalog, config.poll_interval).await?;

    println!("{}", session.view(Utc::now()).render_text());
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or_default();
        let argument = words.next();

        match (command, argument) {
            ("", _) => continue,
            ("quit" | "exit", _) => break,
            ("help", _) => println!("{}", HELP),
            ("show", _) => {}
            ("json", _) => {
                println!("{}", serde_json::to_string_pretty(&session.view(Utc::now()))?);
                continue;
            }
            ("check", Some(code)) => {
                if !session.toggle_language(code, true) {
                    println!("Cannot check {}", code);
                }
            }
            ("uncheck", Some(code)) => {
                if !session.toggle_language(code, false) {
                    println!("Cannot uncheck {}", code);
                }
            }
            ("all", _) => {
                if !session.select_all() {
                    println!("Selection is locked");
                }
            }
            ("none", _) => {
                if !session.select_none() {
                    println!("Selection is locked");
                }
            }
            ("click", _) => match session.trigger_primary_action(Utc::now().timestamp()) {
                Some(write) => {
                    // Wait so the file reflects the click before the next command
                    match write.await {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => warn!("Changes kept locally but not saved: {}", e),
                        Err(e) => error!("Save task did not finish: {}", e),
                    }
                }
                None => println!("Nothing to do"),
            },
            _ => {
                println!("Unknown command: {}", line.trim());
                continue;
            }
        }

        println!("{}", session.view(Utc::now()).render_text());
    }

    session.close();
    Ok(())
}
