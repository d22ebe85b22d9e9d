//! pagelens command line
//!
//! Extracts a page (live through Chromium, or from a saved HTML file) and
//! prints the result envelope, the analysis prompt or a model's answer.

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use pagelens::browser::{BrowserConfig, BrowserController, PageDriver, StaticPage};
use pagelens::chat::{ChatClient, ChatConfig, ChatMessage};
use pagelens::orchestrator::{ExtractOptions, ExtractionResult, Orchestrator};
use pagelens::platform::{CancelFlag, LoaderConfig};
use pagelens::prompt::{PromptBuilder, SYSTEM_PROMPT};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the chat API key
const API_KEY_ENV: &str = "PAGELENS_API_KEY";

/// Page content extraction for LLM analysis
#[derive(Parser, Debug)]
#[command(name = "pagelens")]
#[command(version)]
#[command(about = "Extract the main content of a web page for LLM analysis")]
struct Args {
    /// Page to open in the browser
    #[arg(required_unless_present = "file", conflicts_with = "file")]
    target: Option<String>,

    /// Read a saved HTML file instead of opening a browser
    #[arg(long)]
    file: Option<PathBuf>,

    /// Location the saved file was served from
    #[arg(long, requires = "file")]
    url: Option<String>,

    /// Scroll and click through lazily loaded comments
    #[arg(long)]
    auto_load_comments: bool,

    /// Cycle cap for comment loading
    #[arg(long, default_value_t = 50)]
    max_cycles: usize,

    /// Wait for this selector before extracting
    #[arg(long)]
    wait_for: Option<String>,

    /// What to print
    #[arg(long, value_enum, default_value_t = Output::Json)]
    output: Output,

    /// Send the prompt to the chat API and print the answer
    #[arg(long)]
    ask: bool,

    /// Use the local bridge server instead of the hosted API
    #[arg(long)]
    local_bridge: bool,

    /// Chat model
    #[arg(long)]
    model: Option<String>,

    /// Path to Chrome/Chromium executable
    #[arg(long)]
    chrome_path: Option<String>,

    /// Show the browser window
    #[arg(long)]
    headful: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Output {
    /// The result envelope as JSON
    Json,
    /// The analysis prompt
    Prompt,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    let options = ExtractOptions::builder()
        .auto_load_comments(args.auto_load_comments)
        .loader(LoaderConfig::builder().max_cycles(args.max_cycles).build())
        .build();

    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, stopping after the current cycle");
                cancel.cancel();
            }
        });
    }

    let result = match &args.file {
        Some(path) => {
            let html = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            let url = match &args.url {
                Some(url) => url.clone(),
                None => file_url(path)?,
            };
            run(&StaticPage::new(url, html), &options, &cancel).await
        }
        None => {
            let target = args.target.as_deref().context("no URL given")?;
            let mut config = BrowserConfig::builder().headless(!args.headful);
            if let Some(path) = &args.chrome_path {
                config = config.chrome_path(path);
            }

            let browser = BrowserController::with_config(config.build()).await?;
            let extracted = match browser.navigate(target, args.wait_for.as_deref()).await {
                Ok(page) => Ok(run(&page, &options, &cancel).await),
                Err(e) => Err(e),
            };
            browser.close().await?;
            extracted?
        }
    };

    if args.ask {
        let Some(payload) = result.payload() else {
            bail!(
                "extraction failed: {}",
                result.error_message().unwrap_or_default()
            );
        };
        let config = if args.local_bridge {
            ChatConfig::local_bridge()
        } else {
            ChatConfig::moonshot(std::env::var(API_KEY_ENV).ok())
        };
        let config = match &args.model {
            Some(model) => config.with_model(model.as_str()),
            None => config,
        };

        let client = ChatClient::new(config)?;
        if args.local_bridge && !client.health().await {
            tracing::warn!("Local bridge did not answer its health probe");
        }
        let prompt = PromptBuilder::build(payload);
        let answer = client
            .complete(SYSTEM_PROMPT, &[ChatMessage::user(prompt)])
            .await?;
        println!("{answer}");
        return Ok(());
    }

    match args.output {
        Output::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        Output::Prompt => match result.payload() {
            Some(payload) => println!("{}", PromptBuilder::build(payload)),
            None => bail!(
                "extraction failed: {}",
                result.error_message().unwrap_or_default()
            ),
        },
    }
    Ok(())
}

async fn run<D: PageDriver>(
    driver: &D,
    options: &ExtractOptions,
    cancel: &CancelFlag,
) -> ExtractionResult {
    Orchestrator::extract(driver, options, Some(cancel)).await
}

fn file_url(path: &Path) -> anyhow::Result<String> {
    let absolute = std::fs::canonicalize(path)?;
    url::Url::from_file_path(&absolute)
        .map(String::from)
        .map_err(|()| anyhow::anyhow!("cannot express {} as a URL", absolute.display()))
}
