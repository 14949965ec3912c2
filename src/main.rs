use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use respdiff::config::{Config, OutputFormat};
use respdiff::datapath::ExecuteOptions;
use respdiff::file::loader::{load_data_file, load_data_from_stdin};
use respdiff::file::saver::{render_data, save_data};
use respdiff::filter::{ResponseFilter, Rule};

/// respdiff - narrow and reshape response bodies with path rules
#[derive(Parser)]
#[command(name = "respdiff")]
#[command(version)]
#[command(about = "Select, ignore, move and map parts of a JSON/YAML response body", long_about = None)]
struct Cli {
    /// Body to read (JSON, YAML or JSON Lines, optionally gzipped); omit to read stdin
    file: Option<PathBuf>,

    /// Keep only what PATH matches (repeatable)
    #[arg(short, long = "only", value_name = "PATH")]
    only: Vec<String>,

    /// Drop what PATH matches (repeatable)
    #[arg(short, long = "ignore", value_name = "PATH")]
    ignore: Vec<String>,

    /// Move matches of FROM to the template TO (repeatable)
    #[arg(short = 'm', long = "move", value_name = "FROM>TO")]
    moves: Vec<String>,

    /// Copy matches of FROM to the template TO (repeatable)
    #[arg(short = 'M', long = "map", value_name = "FROM>TO")]
    maps: Vec<String>,

    /// Show partially rebuilt sequences as index maps
    #[arg(long)]
    keep_indices: bool,

    /// Output format (default: from config, else json)
    #[arg(short, long, value_enum)]
    format: Option<FormatArg>,

    /// Write JSON on one line
    #[arg(long)]
    compact: bool,

    /// Write the result to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    write: Option<PathBuf>,

    /// Config file to use instead of ~/.config/respdiff/config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Json,
    Yaml,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Yaml => OutputFormat::Yaml,
        }
    }
}

fn init_logging(config: &Config) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}

/// Collects config defaults and CLI rules into one filter. Config paths come
/// first so CLI rules see their effect.
fn build_filter(cli: &Cli, config: &Config) -> ResponseFilter {
    let mut filter = ResponseFilter::new();

    let only = config.only.iter().chain(&cli.only);
    for path in only {
        filter.add(Rule::Only(path.clone()));
    }
    let ignore = config.ignore.iter().chain(&cli.ignore);
    for path in ignore {
        filter.add(Rule::Ignore(path.clone()));
    }
    for mapping in &cli.moves {
        match Rule::parse_move(mapping) {
            Ok(rule) => {
                filter.add(rule);
            }
            Err(err) => filter.reject(err),
        }
    }
    for mapping in &cli.maps {
        match Rule::parse_map(mapping) {
            Ok(rule) => {
                filter.add(rule);
            }
            Err(err) => filter.reject(err),
        }
    }

    filter
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };
    init_logging(&config);

    let body = match &cli.file {
        Some(path) => load_data_file(path, config.max_input_bytes)?,
        None if !io::stdin().is_terminal() => load_data_from_stdin(config.max_input_bytes)?,
        None => anyhow::bail!("No input: pass a FILE or pipe a body on stdin"),
    };

    let mut filter = build_filter(&cli, &config);
    for err in filter.rejected() {
        eprintln!("Error: {}", err);
    }

    let options = ExecuteOptions {
        preserve_indices: cli.keep_indices || config.preserve_indices,
    };
    let execution = filter
        .apply(&body, options)
        .context("Failed to apply path rules")?;
    for diagnostic in &execution.diagnostics {
        eprintln!("Warning: {}", diagnostic);
    }

    // CLI overrides config
    let format = cli.format.map(OutputFormat::from).unwrap_or(config.output_format);
    let pretty = config.pretty && !cli.compact;

    match &cli.write {
        Some(path) => save_data(path, &execution.data, format, pretty)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => {
            let text = render_data(&execution.data, format, pretty)?;
            io::stdout()
                .write_all(text.as_bytes())
                .context("Failed to write to stdout")?;
        }
    }

    if !filter.rejected().is_empty() {
        std::process::exit(2);
    }
    Ok(())
}
