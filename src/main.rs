// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow, Context};
use log::{info, warn, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::path::{Path, PathBuf};
use std::io::Write;
use std::fs::File;
use std::io::BufReader;
use clap::{Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use subcondense::app_config::{self, Config};
use subcondense::app_controller::{Controller, RunRequest};
use subcondense::file_utils::FileManager;
use subcondense::subtitle_processor::SubtitleFormat;

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

/// CLI Wrapper for SubtitleFormat to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliSubtitleFormat {
    Vtt,
    Ass,
}

impl From<CliSubtitleFormat> for SubtitleFormat {
    fn from(cli_format: CliSubtitleFormat) -> Self {
        match cli_format {
            CliSubtitleFormat::Vtt => SubtitleFormat::WebVtt,
            CliSubtitleFormat::Ass => SubtitleFormat::Ass,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate shell completions for subcondense
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// subcondense - condensed dialogue audio from subtitled videos
#[derive(Parser, Debug)]
#[command(name = "subcondense")]
#[command(version)]
#[command(about = "Condense a video into dialogue-only audio with a matching subtitle track")]
#[command(long_about = "subcondense keeps only the parts of a video covered by dialogue subtitles,
writes them as a single audio file and rebases the subtitles onto it.

EXAMPLES:
    subcondense --vin Show_S01E01.mp4                      # Infer subtitle and outputs from S01E01
    subcondense --vin movie.mkv --sin movie.vtt --out movie.mp3 --sout movie.vtt
    subcondense --vin movie.mkv --sin movie.ass --style Dialogue --out a.mp3 --sout a.vtt
    subcondense --vin Show_S01E01.mp4 --print-subtitle    # Only print the filtered captions
    subcondense completions bash > subcondense.bash       # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Video infile
    #[arg(long = "vin", value_name = "VIDEO")]
    video_in: Option<PathBuf>,

    /// Condensed audio outfile (default: <video dir>/condensed/<SxxEyy>.mp3)
    #[arg(long = "out", value_name = "AUDIO")]
    audio_out: Option<PathBuf>,

    /// Subtitle infile (default: the single *<SxxEyy>*.vtt next to the video)
    #[arg(long = "sin", value_name = "SUBTITLE")]
    sub_in: Option<PathBuf>,

    /// Rebased subtitle outfile (default: <video dir>/condensed/<SxxEyy>.vtt)
    #[arg(long = "sout", value_name = "SUBTITLE")]
    sub_out: Option<PathBuf>,

    /// Subtitle format, overriding the file extension
    #[arg(long, value_enum)]
    format: Option<CliSubtitleFormat>,

    /// Directory for intermediate segments (must exist)
    #[arg(long)]
    tmpdir: Option<PathBuf>,

    /// Keep intermediate segments after the run
    #[arg(long)]
    keep_tmpdir: bool,

    /// Only print the filtered / processed subtitles without processing the video
    #[arg(long)]
    print_subtitle: bool,

    /// Silence in milliseconds that splits captions into separate segments
    #[arg(long, value_name = "MS")]
    gap_ms: Option<u64>,

    /// Style tag treated as dialogue in ASS subtitles
    #[arg(long)]
    style: Option<String>,

    /// Number of segments cut concurrently
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation, filtered by the global max level
struct CustomLogger;

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color and tag for level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("1;31", "ERROR"),
            Level::Warn => ("1;33", "WARN "),
            Level::Info => ("1;32", "INFO "),
            Level::Debug => ("1;36", "DEBUG"),
            Level::Trace => ("1;35", "TRACE"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        // The max level is adjusted after config load
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (color, tag) = Self::style_for_level(record.level());
            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "\x1B[{}m{} {} {}\x1B[0m", color, now, tag, record.args());
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

    let cli = CommandLineOptions::parse();

    if let Some(Commands::Completions { shell }) = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "subcondense", &mut std::io::stdout());
        return Ok(());
    }

    run_condense(cli).await
}

/// Load the configuration file, creating a default one when it is missing
fn load_config(config_path: &str) -> Result<Config> {
    if Path::new(config_path).exists() {
        let file = File::open(config_path)
            .context(format!("Failed to open config file: {}", config_path))?;
        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", config_path))?;
        Ok(config)
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;
        Ok(config)
    }
}

/// Override config fields with command line options
fn apply_overrides(config: &mut Config, options: &CommandLineOptions) {
    if let Some(tmpdir) = &options.tmpdir {
        config.temp_dir = tmpdir.clone();
    }
    if options.keep_tmpdir {
        config.keep_intermediates = true;
    }
    if let Some(gap_ms) = options.gap_ms {
        config.gap_threshold_ms = gap_ms;
    }
    if let Some(style) = &options.style {
        config.subtitle.dialogue_style = style.clone();
    }
    if let Some(jobs) = options.jobs {
        config.audio.max_concurrent_cuts = jobs;
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }
}

async fn run_condense(options: CommandLineOptions) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let config_log_level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(config_log_level.to_level_filter());
    }

    let mut config = load_config(&options.config_path)?;
    apply_overrides(&mut config, &options);
    config.validate()
        .context("Configuration validation failed")?;
    log::set_max_level(config.log_level.to_level_filter());

    let video_in = options
        .video_in
        .as_deref()
        .ok_or_else(|| anyhow!("--vin is required when no subcommand is specified"))?;
    let video = FileManager::absolute(video_in)?;

    let subtitle = match &options.sub_in {
        Some(path) => FileManager::absolute(path)?,
        None => FileManager::infer_subtitle_path(&video)?,
    };
    let subtitle_format = options.format.map(SubtitleFormat::from);

    let controller = Controller::with_config(config)?;

    if options.print_subtitle {
        return controller.print_subtitles(&subtitle, subtitle_format);
    }

    let audio_out = match &options.audio_out {
        Some(path) => FileManager::absolute(path)?,
        None => FileManager::infer_output_path(&video, &controller.config().audio.output_extension)?,
    };
    let subtitle_out = match &options.sub_out {
        Some(path) => FileManager::absolute(path)?,
        None => FileManager::infer_output_path(&video, SubtitleFormat::WebVtt.extension())?,
    };

    let request = RunRequest {
        video,
        subtitle,
        subtitle_format,
        audio_out,
        subtitle_out,
    };
    let report = controller.run(&request).await?;
    info!("Condensed {} segments", report.segments.len());

    Ok(())
}
