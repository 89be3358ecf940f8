use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::PathBuf;

use crate::condense::grouper::DEFAULT_GAP_THRESHOLD_MS;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Silence in milliseconds that splits captions into separate segments
    #[serde(default = "default_gap_threshold_ms")]
    pub gap_threshold_ms: u64,

    /// Working directory for intermediate segments and the concat manifest
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Keep intermediate segments after the run (debugging)
    #[serde(default)]
    pub keep_intermediates: bool,

    /// Subtitle settings
    #[serde(default)]
    pub subtitle: SubtitleConfig,

    /// Audio output settings
    #[serde(default)]
    pub audio: AudioConfig,

    /// External tool settings
    #[serde(default)]
    pub ffmpeg: FfmpegConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Subtitle filtering settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SubtitleConfig {
    // @field: Style tag treated as dialogue in styled tracks
    #[serde(default = "default_dialogue_style")]
    pub dialogue_style: String,

    // @field: Drop web captions carrying a music note
    #[serde(default = "default_true")]
    pub skip_music_cues: bool,
}

impl Default for SubtitleConfig {
    fn default() -> Self {
        Self {
            dialogue_style: default_dialogue_style(),
            skip_music_cues: default_true(),
        }
    }
}

/// Audio segment and output settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AudioConfig {
    // @field: Container extension for intermediate segments
    #[serde(default = "default_segment_extension")]
    pub segment_extension: String,

    // @field: Container extension for the condensed audio
    #[serde(default = "default_audio_extension")]
    pub output_extension: String,

    // @field: Max concurrent cut operations
    #[serde(default = "default_max_concurrent_cuts")]
    pub max_concurrent_cuts: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            segment_extension: default_segment_extension(),
            output_extension: default_audio_extension(),
            max_concurrent_cuts: default_max_concurrent_cuts(),
        }
    }
}

/// ffmpeg / ffprobe settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FfmpegConfig {
    /// ffmpeg binary
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    /// ffprobe binary
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: String,

    /// Timeout for a single tool invocation in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for FfmpegConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Log level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_gap_threshold_ms() -> u64 {
    DEFAULT_GAP_THRESHOLD_MS
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir()
}

fn default_dialogue_style() -> String {
    "Default".to_string()
}

fn default_true() -> bool {
    true
}

fn default_segment_extension() -> String {
    "aac".to_string()
}

fn default_audio_extension() -> String {
    "mp3".to_string()
}

fn default_max_concurrent_cuts() -> usize {
    1
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe_path() -> String {
    "ffprobe".to_string()
}

fn default_timeout_secs() -> u64 {
    600
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.audio.max_concurrent_cuts == 0 {
            return Err(anyhow!("max_concurrent_cuts must be at least 1"));
        }

        if self.audio.segment_extension.trim().is_empty() || self.audio.output_extension.trim().is_empty() {
            return Err(anyhow!("Audio extensions must not be empty"));
        }

        if self.subtitle.dialogue_style.trim().is_empty() {
            return Err(anyhow!("dialogue_style must not be empty"));
        }

        if self.ffmpeg.timeout_secs == 0 {
            return Err(anyhow!("ffmpeg timeout_secs must be greater than zero"));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            gap_threshold_ms: default_gap_threshold_ms(),
            temp_dir: default_temp_dir(),
            keep_intermediates: false,
            subtitle: SubtitleConfig::default(),
            audio: AudioConfig::default(),
            ffmpeg: FfmpegConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
