use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::EnvFilter;
use wos_client_rs::{
    ClientConfig, OutputFormat, Record, TimeSpan, WosClient, to_ris_text, write_ris_file,
    write_text_file,
};

#[derive(Parser)]
#[command(
    name = "wos-cli",
    about = "Command-line interface for the Web of Science RESTful API",
    long_about = "Run a Web of Science search and save every matching record as RIS, JSON or XML"
)]
struct Cli {
    /// Web of Science advanced search query (e.g. "TS=(catchment AND uncertain*)")
    query: String,

    /// YAML config file holding the API key and default search parameters
    #[arg(short, long, default_value = "config.yml")]
    config: PathBuf,

    /// Web of Science Expanded API key (overrides the config file)
    #[arg(long, env = "WOS_API_KEY")]
    api_key: Option<String>,

    /// Output format: ris, json or xml
    #[arg(short, long, default_value = "ris")]
    format: OutputFormat,

    /// Earliest publication date (YYYY-MM-DD)
    #[arg(long, requires = "end")]
    start: Option<String>,

    /// Latest publication date (YYYY-MM-DD)
    #[arg(long, requires = "start")]
    end: Option<String>,

    /// Search parameter override, repeatable (e.g. --param count=50)
    #[arg(short, long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
    params: Vec<(String, String)>,

    /// Only report how many records match, without retrieving them
    #[arg(long)]
    count_only: bool,

    /// Output file; an extension matching the format is added if missing
    #[arg(short, long, default_value = "ris_output")]
    output: PathBuf,

    /// Replace the output file if it already exists
    #[arg(long)]
    overwrite: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn parse_param(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got `{raw}`")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let client = WosClient::with_config(load_config(&cli)?)?;

    let time_span = match (&cli.start, &cli.end) {
        (Some(start), Some(end)) => Some(TimeSpan::new(start, end)?),
        _ => None,
    };
    let overrides: Vec<(&str, &str)> = cli
        .params
        .iter()
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect();

    if cli.count_only {
        let found = client
            .records_found(&cli.query, time_span.as_ref(), &overrides)
            .await?;
        println!("{found}");
        return Ok(());
    }

    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} pages")?
        .progress_chars("#>-");
    let progress = ProgressBar::new(0);
    progress.set_style(style);
    let client = client.with_progress(progress.clone());

    let records = client
        .query(&cli.query, time_span.as_ref(), &overrides)
        .await?;
    progress.finish_and_clear();

    let path = write_records(&records, cli.format, &cli.output, cli.overwrite)?;
    info!(
        records = records.len(),
        path = %path.display(),
        "Saved search results"
    );

    Ok(())
}

fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let config = if cli.config.exists() {
        ClientConfig::from_yaml_file(&cli.config)
            .with_context(|| format!("Failed to load config from {}", cli.config.display()))?
    } else if cli.api_key.is_some() {
        ClientConfig::new()
    } else {
        bail!(
            "Config file {} not found and no API key given (use --api-key or WOS_API_KEY)",
            cli.config.display()
        );
    };

    let config = match &cli.api_key {
        Some(key) => config.with_api_key(key.clone()),
        None => config,
    };
    Ok(config.with_format(cli.format))
}

fn write_records(
    records: &[Record],
    format: OutputFormat,
    output: &Path,
    overwrite: bool,
) -> Result<PathBuf> {
    let path = match format {
        OutputFormat::Ris => {
            let ris: Vec<_> = records.iter().filter_map(|r| r.as_ris().cloned()).collect();
            write_ris_file(&to_ris_text(&ris), output, overwrite)?
        }
        OutputFormat::Json => {
            let json: Vec<_> = records.iter().filter_map(Record::as_json).collect();
            let text = serde_json::to_string_pretty(&json)?;
            write_text_file(&text, output, "json", overwrite)?
        }
        OutputFormat::Xml => {
            let xml = records
                .iter()
                .filter_map(Record::as_xml)
                .collect::<Vec<_>>()
                .join("\n");
            write_text_file(&xml, output, "xml", overwrite)?
        }
    };
    Ok(path)
}
