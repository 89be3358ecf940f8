use std::ffi::OsString;
use std::path::Path;
use std::process::Output;
use std::time::Duration;
use async_trait::async_trait;
use log::{debug, error};
use tokio::process::Command;

use crate::app_config::FfmpegConfig;
use crate::errors::{CondenseError, CondenseResult};
use crate::timestamp::Timestamp;

// @module: External media tools (probe, cut, concat)

/// Capabilities the condensing run needs from an external media toolchain
#[async_trait]
pub trait MediaTool: Send + Sync {
    /// Duration of a media file
    async fn probe_duration(&self, path: &Path) -> CondenseResult<Timestamp>;

    /// Extract `duration` of audio starting at `start` from `source` into `dest`
    async fn cut_clip(&self, source: &Path, dest: &Path, start: &str, duration: &str) -> CondenseResult<()>;

    /// Concatenate the clips listed in a concat manifest into `dest`
    async fn concat(&self, manifest: &Path, dest: &Path) -> CondenseResult<()>;
}

/// `MediaTool` backed by the ffmpeg and ffprobe binaries
#[derive(Debug, Clone)]
pub struct FfmpegTool {
    ffmpeg_path: String,
    ffprobe_path: String,
    timeout: Duration,
}

impl FfmpegTool {
    pub fn new(config: &FfmpegConfig) -> Self {
        Self {
            ffmpeg_path: config.ffmpeg_path.clone(),
            ffprobe_path: config.ffprobe_path.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Run a tool to completion, failing on spawn errors, timeouts and non-zero exit
    async fn run(&self, program: &str, args: Vec<OsString>) -> CondenseResult<Output> {
        debug!("Running {} {:?}", program, args);

        // kill_on_drop lets a cancelled cut take its process down with it
        let future = Command::new(program)
            .args(&args)
            .kill_on_drop(true)
            .output();

        let output = tokio::select! {
            result = future => {
                result.map_err(|e| CondenseError::external(program, format!("failed to execute: {}", e)))?
            },
            _ = tokio::time::sleep(self.timeout) => {
                return Err(CondenseError::external(
                    program,
                    format!("timed out after {} seconds", self.timeout.as_secs()),
                ));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let filtered = filter_ffmpeg_stderr(&stderr);
            error!("{} exited with {}: {}", program, output.status, filtered);
            return Err(CondenseError::external(
                program,
                format!("exited with {}: {}", output.status, filtered),
            ));
        }

        Ok(output)
    }

    fn ffmpeg_args(tail: Vec<OsString>) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-y", "-nostdin", "-hide_banner", "-loglevel", "error"]
            .iter()
            .map(OsString::from)
            .collect();
        args.extend(tail);
        args
    }
}

#[async_trait]
impl MediaTool for FfmpegTool {
    async fn probe_duration(&self, path: &Path) -> CondenseResult<Timestamp> {
        if !path.exists() {
            return Err(CondenseError::ResourceNotFound(path.to_path_buf()));
        }

        let args: Vec<OsString> = vec![
            "-v".into(),
            "error".into(),
            "-show_entries".into(),
            "format=duration".into(),
            "-of".into(),
            "default=noprint_wrappers=1:nokey=1".into(),
            path.into(),
        ];
        let output = self.run(&self.ffprobe_path, args).await?;
        parse_probe_output(&String::from_utf8_lossy(&output.stdout))
            .map_err(|e| CondenseError::external(&self.ffprobe_path, format!("{} ({})", e, path.display())))
    }

    async fn cut_clip(&self, source: &Path, dest: &Path, start: &str, duration: &str) -> CondenseResult<()> {
        let args = Self::ffmpeg_args(vec![
            "-ss".into(),
            start.into(),
            "-i".into(),
            source.into(),
            "-t".into(),
            duration.into(),
            "-vn".into(),
            dest.into(),
        ]);
        self.run(&self.ffmpeg_path, args).await.map(|_| ())
    }

    async fn concat(&self, manifest: &Path, dest: &Path) -> CondenseResult<()> {
        let args = Self::ffmpeg_args(vec![
            "-f".into(),
            "concat".into(),
            "-safe".into(),
            "0".into(),
            "-i".into(),
            manifest.into(),
            dest.into(),
        ]);
        self.run(&self.ffmpeg_path, args).await.map(|_| ())
    }
}

/// Parse the single duration line printed by ffprobe
pub fn parse_probe_output(stdout: &str) -> CondenseResult<Timestamp> {
    let line = stdout.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or_default();
    let seconds: f64 = line
        .parse()
        .map_err(|_| CondenseError::Validation(format!("unexpected ffprobe duration '{}'", line)))?;
    Timestamp::from_seconds(seconds)
}

/// Filter ffmpeg stderr down to meaningful error lines, dropping the version banner,
/// build configuration and stream metadata noise.
pub fn filter_ffmpeg_stderr(stderr: &str) -> String {
    let noise_prefixes = [
        "ffmpeg version",
        "ffprobe version",
        "built with",
        "configuration:",
        "lib",
        "Input #",
        "Metadata:",
        "Duration:",
        "Chapter",
        "Stream #",
        "Output #",
        "Stream mapping:",
        "Press [q]",
    ];

    let meaningful: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !noise_prefixes.iter().any(|p| line.starts_with(p)))
        .collect();

    if meaningful.is_empty() {
        "unknown error (stderr was empty after filtering)".to_string()
    } else {
        meaningful.join("\n")
    }
}
