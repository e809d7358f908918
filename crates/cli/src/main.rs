//! pagetext command-line entry point.
//!
//! Prints the visible text of one page to stdout. Logging goes to stderr so
//! the output can be piped. Every failure prints `Error: <message>` and
//! exits with status 1.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use clap::error::ErrorKind;
use pagetext_client::{ExtractionResult, TextExtractor};
use pagetext_core::AppConfig;
use tracing_subscriber::EnvFilter;

/// Fetch a web page and print its visible text.
#[derive(Debug, Parser)]
#[command(name = "pagetext", version, about)]
struct Cli {
    /// Absolute http(s) URL of the page.
    url: String,

    /// Per-attempt timeout in milliseconds (overrides PAGETEXT_TIMEOUT_MS).
    #[arg(short, long)]
    timeout_ms: Option<u64>,

    /// Retries for network failures and 5xx responses (overrides PAGETEXT_RETRIES).
    #[arg(short, long)]
    retries: Option<u32>,

    /// Print the full extraction result as JSON.
    #[arg(long)]
    json: bool,

    /// Print the page title on the first line.
    #[arg(long, conflicts_with = "json")]
    title: bool,

    /// Log filter, e.g. `debug` or `pagetext_client=trace`.
    #[arg(short, long, env = "RUST_LOG", default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = err.print();
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            eprintln!("{}", usage_error(&err));
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&cli.log_level, cli.log_json);

    match run(&cli).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::debug!(error = ?err, "extraction failed");
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Render a clap usage error as `Error: <message>`, keeping clap's usage hint.
fn usage_error(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let rendered = rendered.trim_end();
    format!("Error: {}", rendered.strip_prefix("error: ").unwrap_or(rendered))
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: &Cli) -> Result<String> {
    let config = resolve_config(AppConfig::load().context("failed to load configuration")?, cli)?;

    let extractor = TextExtractor::from_app_config(&config)?;
    let result = extractor.extract(&cli.url).await?;

    render(&result, cli)
}

/// Apply command-line overrides on top of the loaded configuration.
fn resolve_config(mut config: AppConfig, cli: &Cli) -> Result<AppConfig> {
    if let Some(timeout_ms) = cli.timeout_ms {
        config.timeout_ms = timeout_ms;
    }
    if let Some(retries) = cli.retries {
        config.retries = retries;
    }

    config.validate().context("invalid command-line option")?;
    Ok(config)
}

fn render(result: &ExtractionResult, cli: &Cli) -> Result<String> {
    if cli.json {
        return serde_json::to_string_pretty(result).context("failed to serialize result");
    }

    match (&result.title, cli.title) {
        (Some(title), true) => Ok(format!("{title}\n\n{}", result.text)),
        _ => Ok(result.text.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("pagetext").chain(args.iter().copied())).unwrap()
    }

    fn sample() -> ExtractionResult {
        ExtractionResult {
            url: "https://example.com/".into(),
            final_url: "https://example.com/".into(),
            success: true,
            text: "Hello World".into(),
            title: Some("Greeting".into()),
            status: 200,
            content_type: Some("text/html".into()),
            charset: "UTF-8".into(),
            attempts: 1,
            fetched_at: Utc::now(),
            fetch_ms: 12,
        }
    }

    #[test]
    fn test_parse_positional_url() {
        let cli = parse(&["https://example.com"]);
        assert_eq!(cli.url, "https://example.com");
        assert_eq!(cli.timeout_ms, None);
        assert_eq!(cli.retries, None);
        assert!(!cli.json);
    }

    #[test]
    fn test_parse_overrides() {
        let cli = parse(&["--timeout-ms", "1500", "-r", "0", "--json", "https://example.com"]);
        assert_eq!(cli.timeout_ms, Some(1500));
        assert_eq!(cli.retries, Some(0));
        assert!(cli.json);
    }

    #[test]
    fn test_parse_requires_url() {
        let err = Cli::try_parse_from(["pagetext"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_usage_error_uses_error_prefix() {
        let err = Cli::try_parse_from(["pagetext"]).unwrap_err();
        let message = usage_error(&err);
        assert!(message.starts_with("Error: the following required arguments were not provided"), "{message}");
        assert!(!message.contains("error:"));
    }

    #[test]
    fn test_usage_error_unknown_flag() {
        let err = Cli::try_parse_from(["pagetext", "--bogus", "https://example.com"]).unwrap_err();
        let message = usage_error(&err);
        assert!(message.starts_with("Error: unexpected argument '--bogus'"), "{message}");
    }

    #[test]
    fn test_json_conflicts_with_title() {
        let err = Cli::try_parse_from(["pagetext", "--json", "--title", "https://example.com"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_resolve_config_applies_overrides() {
        let cli = parse(&["--timeout-ms", "1500", "--retries", "4", "https://example.com"]);
        let config = resolve_config(AppConfig::default(), &cli).unwrap();
        assert_eq!(config.timeout_ms, 1500);
        assert_eq!(config.retries, 4);
    }

    #[test]
    fn test_resolve_config_rejects_bad_override() {
        let cli = parse(&["--timeout-ms", "1", "https://example.com"]);
        let err = resolve_config(AppConfig::default(), &cli).unwrap_err();
        assert!(format!("{err:#}").contains("timeout_ms"));
    }

    #[test]
    fn test_render_text() {
        let cli = parse(&["https://example.com"]);
        assert_eq!(render(&sample(), &cli).unwrap(), "Hello World");
    }

    #[test]
    fn test_render_with_title() {
        let cli = parse(&["--title", "https://example.com"]);
        assert_eq!(render(&sample(), &cli).unwrap(), "Greeting\n\nHello World");
    }

    #[test]
    fn test_render_json() {
        let cli = parse(&["--json", "https://example.com"]);
        let out = render(&sample(), &cli).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["text"], "Hello World");
        assert_eq!(value["success"], true);
    }

    #[tokio::test]
    async fn test_run_invalid_url_fails() {
        let cli = parse(&["not a url"]);
        let config = resolve_config(AppConfig::default(), &cli).unwrap();
        let extractor = TextExtractor::from_app_config(&config).unwrap();
        let err = extractor.extract(&cli.url).await.unwrap_err();
        assert!(err.to_string().starts_with("INVALID_INPUT"));
    }
}
