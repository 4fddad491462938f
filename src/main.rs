// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use booktranslate::app_config::{self, Config, ReviewProvider};
use booktranslate::app_controller::{Controller, TranslateRequest};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a document or every .txt/.md document in a directory
    Translate(TranslateArgs),

    /// Print the editing pages of a translated document as JSON
    Pages(PagesArgs),

    /// Inspect or clear the translation cache
    Cache(CacheArgs),

    /// Generate shell completions for booktranslate
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Input document or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Directory for translated documents (defaults to next to each input)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Target language code (e.g., 'SV', 'de', 'EN-GB')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Skip the review stage
    #[arg(long)]
    no_review: bool,

    /// Stored glossary to apply
    #[arg(short, long)]
    glossary: Option<String>,

    /// JSON file of glossary entries to import and apply
    #[arg(long)]
    glossary_file: Option<PathBuf>,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Parser, Debug)]
struct PagesArgs {
    /// Document id printed by a previous translate run
    #[arg(value_name = "DOCUMENT_ID")]
    document_id: String,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Parser, Debug)]
struct CacheArgs {
    #[arg(value_enum)]
    action: CacheAction,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Debug, Clone, ValueEnum)]
enum CacheAction {
    /// Print cache and database statistics
    Stats,
    /// Remove every cached translation
    Clear,
}

#[derive(Parser, Debug)]
struct CommonArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// booktranslate - Book translation with machine translation and AI review
#[derive(Parser, Debug)]
#[command(name = "booktranslate")]
#[command(version)]
#[command(about = "Translate long documents with DeepL and optional AI review")]
#[command(long_about = "booktranslate splits documents into segments, translates them with a machine
translation engine, optionally refines complex segments with an AI reviewer and
applies glossary terms.

EXAMPLES:
    booktranslate translate novel.txt                   # Translate using default config
    booktranslate translate -f -t DE books/             # Whole directory into German
    booktranslate translate --glossary-file terms.json novel.md
    booktranslate pages 4f0c...                         # Editing pages of a document
    booktranslate cache stats                           # Cache and database statistics
    booktranslate completions bash > booktranslate.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. If the config file doesn't
    exist, a default one will be created automatically. DEEPL_API_KEY,
    OPENAI_API_KEY and OPENAI_ASSISTANT_ID fill empty credentials.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Trace here so the effective level is decided by set_max_level below
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "booktranslate", &mut std::io::stdout());
            Ok(())
        }
        Commands::Translate(args) => run_translate(args).await,
        Commands::Pages(args) => run_pages(args).await,
        Commands::Cache(args) => run_cache(args).await,
    }
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    let mut config = load_config(&options.common)?;

    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }
    if options.no_review {
        config.review.provider = ReviewProvider::Disabled;
    }

    let controller = Controller::with_config(config)?;
    let report = controller
        .run(TranslateRequest {
            input_path: options.input_path,
            output_dir: options.output_dir,
            force_overwrite: options.force_overwrite,
            glossary_id: options.glossary,
            glossary_file: options.glossary_file,
        })
        .await?;

    for document in &report.written {
        println!("{}\t{}", document.document_id, document.output.display());
    }

    if !report.failed.is_empty() {
        return Err(anyhow::anyhow!("{} document(s) failed to translate", report.failed.len()));
    }
    Ok(())
}

async fn run_pages(options: PagesArgs) -> Result<()> {
    let config = load_config(&options.common)?;
    let controller = Controller::with_config(config)?;

    let pages = controller.pages(&options.document_id).await?;
    info!("Document {} has {} page(s)", options.document_id, pages.len());

    let json = serde_json::to_string_pretty(&pages).context("Failed to serialize pages")?;
    println!("{}", json);
    Ok(())
}

async fn run_cache(options: CacheArgs) -> Result<()> {
    let config = load_config(&options.common)?;
    let controller = Controller::with_config(config)?;
    let stores = controller.stores();

    match options.action {
        CacheAction::Stats => {
            let stats = stores.cache_stats().await?;
            println!("Cache entries: {}, Hits: {}", stats.total_entries, stats.total_hits);
            if let Some(db_stats) = stores.database_stats().await? {
                println!("{}", db_stats);
            }
        }
        CacheAction::Clear => {
            let removed = stores.clear_cache().await?;
            info!("Removed {} cached translation(s)", removed);
        }
    }
    Ok(())
}

// Loads the configuration, creating a default file when absent, and applies
// environment and log level overrides
fn load_config(common: &CommonArgs) -> Result<Config> {
    if let Some(cmd_log_level) = &common.log_level {
        log::set_max_level(level_filter(&cmd_log_level.clone().into()));
    }

    let config_path = &common.config_path;
    let mut config = if Path::new(config_path).exists() {
        let file = File::open(config_path)
            .context(format!("Failed to open config file: {}", config_path))?;

        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", config_path))?
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;

        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;

        config
    };

    config.apply_env_overrides();

    if let Some(log_level) = &common.log_level {
        config.log_level = log_level.clone().into();
    } else {
        log::set_max_level(level_filter(&config.log_level));
    }

    // Validated by the controller, after command line overrides
    Ok(config)
}
