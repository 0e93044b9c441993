//! Open an Assistant session, send one message and close the session.
//!
//! ```text
//! cargo run --example assistant_session -- --config watson.toml <assistant-id> "Hello"
//! ```
//!
//! The config file needs a `[services.assistant]` section, for example:
//!
//! ```toml
//! [services.assistant]
//! url = "https://api.us-south.assistant.watson.cloud.ibm.com"
//! version = "2021-06-14"
//!
//! [services.assistant.auth]
//! type = "iam"
//! apikey = "..."
//! ```

use std::path::PathBuf;

use anyhow::{Context, bail};
use tracing_subscriber::EnvFilter;
use watson_sdk::SdkConfig;
use watson_sdk::services::AssistantV2;
use watson_sdk::services::assistant::MessageRequest;

struct CliArgs {
    config_path: PathBuf,
    assistant_id: String,
    text: String,
}

fn parse_args() -> anyhow::Result<CliArgs> {
    let mut args = std::env::args().skip(1);
    let mut config_path = PathBuf::from("watson.toml");
    let mut positional = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                config_path = args
                    .next()
                    .map(PathBuf::from)
                    .context("--config requires a path argument")?;
            }
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let Some(assistant_id) = positional.next() else {
        bail!("usage: assistant_session [--config <path>] <assistant-id> [text]");
    };
    let text = positional.next().unwrap_or_else(|| "Hello".to_string());

    Ok(CliArgs {
        config_path,
        assistant_id,
        text,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("watson_sdk=info,warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = parse_args()?;

    let config = SdkConfig::load(&args.config_path)
        .with_context(|| format!("loading {}", args.config_path.display()))?;
    let assistant = AssistantV2::from_settings(config.service("assistant")?)?;

    let session = assistant
        .create_session(&args.assistant_id)
        .await?
        .into_result();
    tracing::info!(session_id = %session.session_id, "Session created");

    let reply = assistant
        .message(
            &args.assistant_id,
            &session.session_id,
            &MessageRequest::text(args.text),
        )
        .await?;
    for intent in &reply.result.output.intents {
        tracing::info!(intent = %intent.intent, confidence = intent.confidence, "Intent");
    }
    println!("{}", reply.result.text());

    assistant
        .delete_session(&args.assistant_id, &session.session_id)
        .await?;
    Ok(())
}
