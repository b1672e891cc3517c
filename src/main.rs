mod book;
mod error;
mod logging;
mod merge;
mod metadata;
mod pages;
mod preferences;
mod render;
mod tools;
mod transcript;
mod turns;

#[cfg(test)]
mod testutil;

use anyhow::{Context, Result, bail};
use clap::Parser;
use logging::{LogConfig, LogFormat, LogPreset};
use merge::Source;
use metadata::SessionMetadata;
use preferences::Preferences;
use render::{BookInput, RenderOptions};
use std::path::{Path, PathBuf};
use std::process;
use tools::ToolIndex;

const SESSION_ID_CHARS: usize = 8;

/// Turn Claude Code session transcripts into an mdBook.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Transcript files (JSON lines). Several files of one session are merged.
    #[arg(required_unless_present = "init_config")]
    inputs: Vec<PathBuf>,

    /// Directory the book is written to.
    #[arg(short, long, default_value = "book")]
    output: PathBuf,

    /// Book title, overriding the configuration and the derived title.
    #[arg(short, long)]
    title: Option<String>,

    /// Configuration file (defaults to ./claudebook.toml if present).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// More logging; repeat for more detail.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long)]
    quiet: bool,

    /// Log output format: text or json.
    #[arg(long, default_value = "text")]
    log_format: LogFormat,

    /// Write a default claudebook.toml to the current directory and exit.
    #[arg(long)]
    init_config: bool,
}

/// Title precedence: flag, configuration, first compaction summary, then
/// the session id.
fn book_title(cli: Option<&str>, configured: Option<&str>, metadata: &SessionMetadata) -> String {
    cli.or(configured)
        .or(metadata.summaries.first().map(String::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| match &metadata.session_id {
            Some(id) => format!(
                "Claude session {}",
                id.chars().take(SESSION_ID_CHARS).collect::<String>()
            ),
            None => "Claude session".to_string(),
        })
}

fn load_sources(inputs: &[PathBuf]) -> Result<Vec<Source>> {
    inputs
        .iter()
        .map(|path| -> Result<Source> {
            let records = transcript::load(path)?;
            tracing::info!(path = %path.display(), records = records.len(), "read transcript");
            Ok(Source {
                name: path.display().to_string(),
                records,
            })
        })
        .collect()
}

fn convert(cli: &Cli, cwd: &Path) -> Result<()> {
    let prefs = Preferences::load(cli.config.as_deref(), cwd)?;
    let templates = prefs.templates()?;

    let sources = load_sources(&cli.inputs)?;
    let summaries: Vec<String> = sources
        .iter()
        .flat_map(|s| transcript::summaries(&s.records))
        .map(str::to_string)
        .collect();
    let records = merge::merge(sources);

    let metadata = SessionMetadata::extract(&records).with_summaries(summaries);
    let turns = turns::segment(&records);
    if turns.is_empty() {
        bail!("no conversation turns found");
    }
    let paged = pages::partition(&turns);
    let index = ToolIndex::build(&turns);
    tracing::info!(
        turns = turns.len(),
        pages = paged.iter().map(|t| t.pages.len()).sum::<usize>(),
        invocations = index.len(),
        "partitioned session"
    );

    let options = RenderOptions {
        title: book_title(cli.title.as_deref(), prefs.title.as_deref(), &metadata),
        authors: prefs.authors,
        language: prefs.language,
        max_result_chars: prefs.max_result_chars,
        max_input_chars: prefs.max_input_chars,
        include_thinking: prefs.include_thinking,
        templates,
    };
    let files = render::render_book(
        &BookInput {
            turns: &paged,
            index: &index,
            metadata: &metadata,
        },
        &options,
    )?;
    book::write_book(&cli.output, &files)
}

fn run(cli: &Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("reading current directory")?;
    if cli.init_config {
        let (path, created) = Preferences::write_default(&cwd)?;
        if created {
            println!("wrote {}", path.display());
        } else {
            println!("{} already exists", path.display());
        }
        return Ok(());
    }
    convert(cli, &cwd)
}

fn main() {
    let cli = Cli::parse();
    logging::init(&LogConfig {
        preset: LogPreset::from_flags(cli.verbose, cli.quiet),
        format: cli.log_format,
    });

    if let Err(err) = run(&cli) {
        tracing::debug!(error = ?err, "conversion failed");
        eprintln!("claudebook: {err:#}");
        process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(session_id: Option<&str>, summaries: &[&str]) -> SessionMetadata {
        SessionMetadata {
            session_id: session_id.map(str::to_string),
            ..SessionMetadata::default()
        }
        .with_summaries(summaries.iter().copied())
    }

    #[test]
    fn title_precedence() {
        let meta = metadata(Some("0123456789abcdef"), &["Refactor parser"]);
        assert_eq!(book_title(Some("Flag"), Some("Config"), &meta), "Flag");
        assert_eq!(book_title(None, Some("Config"), &meta), "Config");
        assert_eq!(book_title(None, None, &meta), "Refactor parser");

        let meta = metadata(Some("0123456789abcdef"), &[]);
        assert_eq!(book_title(None, None, &meta), "Claude session 01234567");
        assert_eq!(book_title(None, None, &metadata(None, &[])), "Claude session");
    }

    #[test]
    fn cli_requires_inputs_unless_initialising() {
        assert!(Cli::try_parse_from(["claudebook"]).is_err());
        assert!(Cli::try_parse_from(["claudebook", "--init-config"]).is_ok());

        let cli = Cli::try_parse_from(["claudebook", "a.jsonl", "b.jsonl", "-vv", "-o", "out"]).unwrap();
        assert_eq!(cli.inputs.len(), 2);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.output, PathBuf::from("out"));
        assert_eq!(cli.log_format, LogFormat::Text);
    }
}
