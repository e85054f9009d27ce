use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use sheetlingo_core::config::DEFAULT_CONFIG_FILE;
use sheetlingo_core::reader::read_headers;
use sheetlingo_core::{
    BatchPolicy, CliOverrides, ColumnAssignment, Direction, FileSettings, HeaderStyle, Pipeline,
    Placement, ProviderKind, Settings, default_output_path, translate_path,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

mod formatter;

/// Files above this size should go through `--staged`
const LARGE_FILE_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Parser)]
#[command(name = "sheetlingo")]
#[command(about = "Translate spreadsheet columns between Chinese and English", long_about = None)]
#[command(version)]
struct Cli {
    /// Controls verbosity of log output (overrides RUST_LOG when provided)
    #[arg(long, value_enum, default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate columns of a spreadsheet into new adjacent columns
    Translate(TranslateArgs),
    /// Write a commented configuration template
    GenConfig {
        /// Where to write the template
        #[arg(value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args)]
struct TranslateArgs {
    /// Path to the Excel/ODS/CSV file to translate
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Columns translated Chinese → English, e.g. "A,C"
    #[arg(long, value_name = "COLS")]
    zh2en: Option<String>,

    /// Columns translated English → Chinese, e.g. "B"
    #[arg(long, value_name = "COLS")]
    en2zh: Option<String>,

    /// Translate every column in one direction
    #[arg(long, value_enum, value_name = "DIR", conflicts_with_all = ["zh2en", "en2zh"])]
    all_columns: Option<DirectionArg>,

    /// Worksheet to translate (defaults to the first sheet)
    #[arg(long)]
    sheet: Option<String>,

    /// Output file (defaults to <name>_translated.<ext> next to the input)
    #[arg(short, long, value_name = "OUT")]
    output: Option<PathBuf>,

    /// Path to configuration file (TOML)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human")]
    format: OutputFormat,

    /// Stream the sheet through a temporary CSV file (for large inputs)
    #[arg(long)]
    staged: bool,

    /// Translation provider: mymemory, google, baidu, deepl, deepseek
    #[arg(long, value_parser = parse_provider)]
    provider: Option<ProviderKind>,

    /// Batching policy
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,

    /// Strings per request (count policy)
    #[arg(long = "batch", value_name = "N")]
    batch_size: Option<usize>,

    /// Characters per request (chars policy)
    #[arg(long, value_name = "N")]
    max_chars: Option<usize>,

    /// Pause between batches in milliseconds
    #[arg(long, value_name = "MS")]
    delay_ms: Option<u64>,

    /// Batches translated concurrently
    #[arg(long, value_name = "N")]
    workers: Option<usize>,

    /// HTTP timeout per request in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Place translated columns after or before their source
    #[arg(long, value_parser = parse_placement)]
    placement: Option<Placement>,

    /// Header of translated columns: suffix or translated
    #[arg(long, value_parser = parse_header)]
    header: Option<HeaderStyle>,

    #[arg(long, value_name = "ID")]
    baidu_appid: Option<String>,

    #[arg(long, value_name = "KEY")]
    baidu_key: Option<String>,

    #[arg(long, value_name = "KEY")]
    deepl_key: Option<String>,

    #[arg(long, value_name = "KEY")]
    deepseek_key: Option<String>,

    #[arg(long, value_name = "URL")]
    deepseek_url: Option<String>,

    #[arg(long, value_name = "MODEL")]
    deepseek_model: Option<String>,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON output for scripting
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum DirectionArg {
    Zh2en,
    En2zh,
}

impl From<DirectionArg> for Direction {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Zh2en => Direction::ZhToEn,
            DirectionArg::En2zh => Direction::EnToZh,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    Count,
    Chars,
}

impl From<PolicyArg> for BatchPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Count => BatchPolicy::Count,
            PolicyArg::Chars => BatchPolicy::Chars,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_env_filter(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

fn parse_provider(s: &str) -> Result<ProviderKind, String> {
    s.parse().map_err(|e: anyhow::Error| e.to_string())
}

fn parse_placement(s: &str) -> Result<Placement, String> {
    s.parse().map_err(|e: anyhow::Error| e.to_string())
}

fn parse_header(s: &str) -> Result<HeaderStyle, String> {
    s.parse().map_err(|e: anyhow::Error| e.to_string())
}

fn init_logging(level: &LogLevel) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level.as_env_filter()))?;

    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    match cli.command {
        Commands::Translate(args) => run_translate(args),
        Commands::GenConfig { path, force } => generate_config(&path, force),
    }
}

fn run_translate(args: TranslateArgs) -> Result<()> {
    let file_settings = load_file_settings(args.config.as_deref())?;
    let overrides = CliOverrides {
        provider: args.provider,
        policy: args.policy.map(BatchPolicy::from),
        batch_size: args.batch_size,
        max_chars: args.max_chars,
        delay_ms: args.delay_ms,
        workers: args.workers,
        placement: args.placement,
        header: args.header,
        timeout_secs: args.timeout,
        baidu_appid: args.baidu_appid.clone(),
        baidu_key: args.baidu_key.clone(),
        deepl_key: args.deepl_key.clone(),
        deepseek_key: args.deepseek_key.clone(),
        deepseek_url: args.deepseek_url.clone(),
        deepseek_model: args.deepseek_model.clone(),
        staged: args.staged,
    };
    let settings =
        Settings::from_environment(&file_settings, &overrides).context("Invalid configuration")?;

    let assignment = build_assignment(&args)?;
    warn_if_large(&args.file, args.staged);

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.file));

    let pipeline = Pipeline::from_settings(&settings, &assignment)?;
    info!(provider = %settings.provider, workers = settings.batch.workers, "Starting run");

    let summary = translate_path(
        &pipeline,
        &args.file,
        &output,
        args.sheet.as_deref(),
        &assignment,
        args.staged,
    )
    .with_context(|| format!("Failed to translate file: {}", args.file.display()))?;

    match args.format {
        OutputFormat::Human => formatter::print_human(&summary),
        OutputFormat::Json => formatter::print_json(&summary)?,
    }

    Ok(())
}

fn load_file_settings(path: Option<&Path>) -> Result<FileSettings> {
    if let Some(config_path) = path {
        return FileSettings::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()));
    }

    // Try to load default config from current directory if it exists
    let default_config_path = PathBuf::from(DEFAULT_CONFIG_FILE);
    if default_config_path.exists() {
        FileSettings::from_file(&default_config_path).with_context(|| {
            format!(
                "Failed to load config from {}",
                default_config_path.display()
            )
        })
    } else {
        Ok(FileSettings::default())
    }
}

fn build_assignment(args: &TranslateArgs) -> Result<ColumnAssignment> {
    if let Some(direction) = args.all_columns {
        let headers = read_headers(&args.file, args.sheet.as_deref())
            .with_context(|| format!("Failed to read {}", args.file.display()))?;
        return Ok(ColumnAssignment::all(headers.len(), direction.into()));
    }

    let mut assignment = ColumnAssignment::new();
    if let Some(cols) = &args.zh2en {
        assignment
            .assign_letters(cols, Direction::ZhToEn)
            .context("Invalid --zh2en columns")?;
    }
    if let Some(cols) = &args.en2zh {
        assignment
            .assign_letters(cols, Direction::EnToZh)
            .context("Invalid --en2zh columns")?;
    }

    if assignment.is_empty() {
        anyhow::bail!("No columns selected: use --zh2en, --en2zh or --all-columns");
    }
    Ok(assignment)
}

fn warn_if_large(path: &Path, staged: bool) {
    if staged {
        return;
    }
    if let Ok(metadata) = fs::metadata(path) {
        if metadata.len() > LARGE_FILE_BYTES {
            warn!(
                file = %path.display(),
                size_mb = metadata.len() / (1024 * 1024),
                "Large file: consider --staged to stream it through CSV"
            );
        }
    }
}

fn generate_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    fs::write(path, FileSettings::template())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Configuration template written to {}", path.display());
    Ok(())
}
