//! One-shot translation from the command line, without touching chat history
//!
//! Usage:
//!   cargo run --bin translate -- --language French "Good morning"
//!   cargo run --bin translate -- Hola amigo            # defaults to English
//!
//! Required environment variables:
//! - GEMINI_API_KEY
//!
//! Optional:
//! - AI_MODEL (defaults to gemini-1.5-flash)
//! - GEMINI_API_URL
//! - GATEWAY_MAX_ATTEMPTS (defaults to 1)

use anyhow::Result;
use chat_translator::config::Config;
use chat_translator::gateway::{GeminiGateway, TranslationGateway};
use chat_translator::language;
use chat_translator::orchestrator::EMPTY_TEXT_MESSAGE;
use chat_translator::prompt::build_translation_prompt;
use tracing::info;

#[derive(Debug, PartialEq)]
struct CliArgs {
    language: Option<String>,
    text: String,
}

fn parse_args(args: &[String]) -> Result<CliArgs> {
    let mut language = None;
    let mut words = Vec::new();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--language" | "-l" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("{} needs a value", arg))?;
                language = Some(value.clone());
            }
            _ => words.push(arg.as_str()),
        }
    }

    Ok(CliArgs {
        language,
        text: words.join(" "),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("chat_translator=warn".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = parse_args(&args)?;

    if cli.text.is_empty() {
        eprintln!("{}", EMPTY_TEXT_MESSAGE);
        std::process::exit(2);
    }

    let config = Config::from_env()?;
    let gateway = GeminiGateway::from_config(&config);

    let target_language = language::resolve(cli.language.as_deref());
    info!("Translating to {} with {}", target_language, gateway.model());

    let prompt = build_translation_prompt(&cli.text, &target_language);
    match gateway.translate(&prompt).await {
        Ok(text) => {
            println!("{}", text);
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", e.user_message());
            std::process::exit(1);
        }
    }
}
