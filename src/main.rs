// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, warn};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::app_config::Config;
use app_controller::Controller;

mod app_config;
mod app_controller;
mod chunker;
mod dispatcher;
mod errors;
mod file_utils;
mod language_utils;
mod providers;
mod reassembler;
mod tokenizer;
mod translator;

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

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a document using the configured AI provider (default command)
    Translate(TranslateArgs),

    /// Generate shell completions for doctrans
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Input document (UTF-8 text file)
    #[arg(value_name = "INPUT_FILE")]
    input_file: PathBuf,

    /// Output file (defaults to <input>.<target-language>.<ext>)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Force overwrite of an existing output file
    #[arg(short, long)]
    force_overwrite: bool,

    /// Source language code, or 'auto' for auto-detection
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Custom translation instructions replacing the default system prompt
    #[arg(short, long)]
    instructions: Option<String>,

    /// Chunk size in tokens
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Carry-over context size in tokens
    #[arg(long)]
    context_size: Option<usize>,

    /// Maximum number of concurrent translation requests
    #[arg(short = 'p', long)]
    max_parallel: Option<usize>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// doctrans - AI document translation
///
/// Splits long documents into token-bounded chunks with overlapping context,
/// translates the chunks concurrently through the DeepSeek API, and
/// reassembles them into a single coherent output.
#[derive(Parser, Debug)]
#[command(name = "doctrans")]
#[command(version = "0.1.0")]
#[command(about = "AI-powered document translation tool")]
#[command(long_about = "doctrans translates long UTF-8 documents through an AI chat-completion service.

EXAMPLES:
    doctrans book.txt                           # Translate using default config
    doctrans -t ru book.txt                     # Translate into Russian
    doctrans -s en -t fr book.txt               # Translate from English to French
    doctrans -f book.txt                        # Force overwrite existing output
    doctrans -p 10 book.txt                     # At most 10 concurrent requests
    doctrans --log-level debug book.txt         # Verbose logging
    doctrans completions bash > doctrans.bash   # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically. The API key is read from the config file or
    the DEEPSEEK_API_KEY environment variable.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input document (UTF-8 text file)
    #[arg(value_name = "INPUT_FILE")]
    input_file: Option<PathBuf>,

    /// Output file (defaults to <input>.<target-language>.<ext>)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Force overwrite of an existing output file
    #[arg(short, long)]
    force_overwrite: bool,

    /// Source language code, or 'auto' for auto-detection
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Custom translation instructions replacing the default system prompt
    #[arg(short, long)]
    instructions: Option<String>,

    /// Chunk size in tokens
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Carry-over context size in tokens
    #[arg(long)]
    context_size: Option<usize>,

    /// Maximum number of concurrent translation requests
    #[arg(short = 'p', long)]
    max_parallel: Option<usize>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
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

    // @returns: ANSI color code for log level
    fn get_color_for_level(level: Level) -> &'static str {
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
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let color = Self::get_color_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {}\x1B[0m", color, now, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    // Parse command line arguments using clap
    let cli = CommandLineOptions::parse();

    // Handle subcommands
    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "doctrans", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Translate(args)) => run_translate(args).await,
        None => {
            // Default behavior - use top-level args for backwards compatibility
            let input_file = cli
                .input_file
                .ok_or_else(|| anyhow!("INPUT_FILE is required when no subcommand is specified"))?;

            let translate_args = TranslateArgs {
                input_file,
                output: cli.output,
                force_overwrite: cli.force_overwrite,
                source_language: cli.source_language,
                target_language: cli.target_language,
                instructions: cli.instructions,
                chunk_size: cli.chunk_size,
                context_size: cli.context_size,
                max_parallel: cli.max_parallel,
                config_path: cli.config_path,
                log_level: cli.log_level,
            };
            run_translate(translate_args).await
        }
    }
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let config_log_level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(config_log_level.to_level_filter());
    }

    // Load or create configuration
    let config_path = &options.config_path;
    let mut config = if Path::new(config_path).exists() {
        Config::from_file(config_path)
            .context(format!("Failed to load config file: {}", config_path))?
    } else {
        // Create default configuration if not exists
        warn!("Config file not found at '{}', creating default config.", config_path);
        let config = Config::default();
        config
            .save(config_path)
            .context(format!("Failed to write default config to file: {}", config_path))?;
        config
    };

    // Override config with CLI options if provided
    if let Some(source_lang) = &options.source_language {
        config.source_language = source_lang.clone();
    }
    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }
    if let Some(instructions) = &options.instructions {
        config.translation.common.instructions = Some(instructions.clone());
    }
    if let Some(chunk_size) = options.chunk_size {
        config.chunking.chunk_size = chunk_size;
    }
    if let Some(context_size) = options.context_size {
        config.chunking.context_size = context_size;
    }
    if let Some(max_parallel) = options.max_parallel {
        config.translation.common.max_parallel = max_parallel;
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    // Validate the configuration after loading and overriding
    config.validate().context("Configuration validation failed")?;

    // If log level was not set via command line, update it from config now
    if options.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }

    // Create controller and run the translation
    let controller = Controller::with_config(config)?;
    controller
        .run(options.input_file, options.output, options.force_overwrite)
        .await
}
