use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use indicatif::{ProgressBar, ProgressStyle};

use crate::app_config::Config;
use crate::condense::{group_captions, rebase, CondenseReport, ScratchSpace, SegmentOrchestrator};
use crate::errors::CondenseError;
use crate::file_utils::FileManager;
use crate::media_tool::{FfmpegTool, MediaTool};
use crate::subtitle_processor::{write_webvtt, Caption, SubtitleFormat, SubtitleSource};

// @module: Application controller for condensing runs

/// Input and output files of one condensing run
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub video: PathBuf,
    pub subtitle: PathBuf,
    /// Explicit subtitle format; inferred from the extension when `None`
    pub subtitle_format: Option<SubtitleFormat>,
    pub audio_out: PathBuf,
    pub subtitle_out: PathBuf,
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Media toolchain used for probing, cutting and concatenating
    tool: Arc<dyn MediaTool>,
}

impl Controller {
    // @method: Create a controller backed by ffmpeg with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let tool = Arc::new(FfmpegTool::new(&config.ffmpeg));
        Ok(Self::with_tool(config, tool))
    }

    /// Create a controller with a custom media toolchain
    pub fn with_tool(config: Config, tool: Arc<dyn MediaTool>) -> Self {
        Self { config, tool }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fail early when an input file or the scratch directory is missing
    pub fn check_resources(&self, request: &RunRequest) -> Result<()> {
        for file in [&request.video, &request.subtitle] {
            if !FileManager::file_exists(file) {
                return Err(CondenseError::ResourceNotFound(file.clone()).into());
            }
        }
        if !FileManager::dir_exists(&self.config.temp_dir) {
            return Err(CondenseError::ResourceNotFound(self.config.temp_dir.clone()).into());
        }
        Ok(())
    }

    /// Read and normalize the captions of a subtitle file
    pub fn load_captions(&self, subtitle: &Path, format: Option<SubtitleFormat>) -> Result<Vec<Caption>> {
        let source = SubtitleSource::from_file(subtitle, format)?;
        let policy = source
            .format
            .default_policy(self.config.subtitle.skip_music_cues, &self.config.subtitle.dialogue_style);
        let captions = source
            .normalize(policy.as_ref())
            .with_context(|| format!("Failed to load captions from {}", subtitle.display()))?;
        info!("Loaded {} {} captions", captions.len(), source.format);
        Ok(captions)
    }

    /// Print the normalized captions without touching any media
    pub fn print_subtitles(&self, subtitle: &Path, format: Option<SubtitleFormat>) -> Result<()> {
        if !FileManager::file_exists(subtitle) {
            return Err(CondenseError::ResourceNotFound(subtitle.to_path_buf()).into());
        }
        for (i, caption) in self.load_captions(subtitle, format)?.iter().enumerate() {
            println!("{:>3} {}", i, caption.text());
        }
        Ok(())
    }

    /// Run the full condensing workflow
    pub async fn run(&self, request: &RunRequest) -> Result<CondenseReport> {
        let start_time = std::time::Instant::now();
        self.check_resources(request)?;

        info!(
            "Running with the following parameters:\nInput\n  Video = \"{}\"\n  Sub = \"{}\"\nOutput\n  Audio = \"{}\"\n  Sub = \"{}\"",
            request.video.display(),
            request.subtitle.display(),
            request.audio_out.display(),
            request.subtitle_out.display()
        );

        // Validation and rebasing happen before any external call
        let captions = self.load_captions(&request.subtitle, request.subtitle_format)?;
        let groups = group_captions(&captions, self.config.gap_threshold_ms);
        let rebased = rebase(&groups).context("Failed to rebase caption groups")?;
        debug!("{} captions in {} groups", captions.len(), groups.len());

        let scratch = ScratchSpace::new(&self.config.temp_dir, self.config.keep_intermediates)?;
        let orchestrator = SegmentOrchestrator::new(
            Arc::clone(&self.tool),
            self.config.audio.max_concurrent_cuts,
            self.config.audio.segment_extension.clone(),
        );

        if let Some(parent) = request.audio_out.parent() {
            FileManager::ensure_dir(parent)?;
        }

        let progress_bar = ProgressBar::new(groups.len() as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} segments ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style);
        progress_bar.set_message("Cutting");

        let pb = progress_bar.clone();
        let on_progress = move |done: usize, _total: usize| pb.set_position(done as u64);
        let result = orchestrator
            .run(&request.video, &groups, &request.audio_out, &scratch, &on_progress)
            .await;
        progress_bar.finish_and_clear();
        let report = result.context("Failed to condense audio")?;

        if report.segments.is_empty() {
            warn!("Nothing to process: no dialogue captions in {}", request.subtitle.display());
            return Ok(report);
        }

        let track = rebased
            .into_iter()
            .map(|c| c.into_caption())
            .collect::<Result<Vec<_>, _>>()?;
        write_webvtt(&request.subtitle_out, &track)?;
        info!("Success: {}", request.subtitle_out.display());
        info!("Success: {}", request.audio_out.display());

        info!("{}", report.summary());
        debug!("Finished in {:.1}s", start_time.elapsed().as_secs_f64());

        Ok(report)
    }
}
