/*!
 * Segment orchestration.
 *
 * Turns caption groups into cut requests, runs them through a `MediaTool`, writes the
 * concat manifest and asks for the final concatenation. Every file the run creates is
 * registered with a `ScratchSpace`, which removes them again when it goes out of scope.
 */

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use futures::stream::{self, StreamExt, TryStreamExt};
use log::{debug, error, info, warn};
use parking_lot::Mutex;

use crate::errors::{CondenseError, CondenseResult};
use crate::media_tool::MediaTool;
use crate::timestamp::{Delta, Timestamp};

use super::grouper::{is_empty_run, Group};

/// File name of the concat manifest inside the scratch directory
pub const MANIFEST_FILE_NAME: &str = "list.txt";

/// One condensed audio clip handed to the concatenation step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntermediateSegment {
    pub path: PathBuf,
    pub duration: Timestamp,
}

/// Cut request for one group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentCut {
    /// Group index, also used to number the output file
    pub index: usize,
    /// Offset into the source video
    pub start: Timestamp,
    pub segment: IntermediateSegment,
}

/// Compute the cut boundaries and output path of every group, in group order
pub fn plan_segments(groups: &[Group], scratch_dir: &Path, extension: &str) -> CondenseResult<Vec<SegmentCut>> {
    let mut plan = Vec::with_capacity(groups.len());
    let mut accumulated = Timestamp::ZERO;

    for (index, group) in groups.iter().enumerate() {
        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            return Err(CondenseError::InvariantViolation(format!(
                "Cannot plan a segment for empty group {}",
                index
            )));
        };
        let duration = Timestamp::try_from(last.end() - first.start())?;
        accumulated = accumulated + Delta::from(duration);
        debug!(
            "Segment {}: start {}, duration {}, accumulated {}",
            index,
            first.start(),
            duration,
            accumulated
        );

        plan.push(SegmentCut {
            index,
            start: first.start(),
            segment: IntermediateSegment {
                path: scratch_dir.join(format!("out_{:03}.{}", index, extension)),
                duration,
            },
        });
    }

    Ok(plan)
}

/// Render the concat manifest, one `file`/`duration` pair per segment
pub fn render_manifest(segments: &[IntermediateSegment]) -> String {
    let mut manifest = String::new();
    for segment in segments {
        // Single quotes are closed, escaped and reopened for the concat demuxer
        let path = segment.path.display().to_string().replace('\'', r"'\''");
        manifest.push_str(&format!("file '{}'\n", path));
        manifest.push_str(&format!("duration {:.3}\n", segment.duration.total_seconds()));
    }
    manifest
}

/// Scratch directory plus the set of files the run created in it.
///
/// Files are registered before they are produced and removed on drop, on every exit
/// path, unless the operator asked to keep them.
#[derive(Debug)]
pub struct ScratchSpace {
    dir: PathBuf,
    keep: bool,
    created: Mutex<Vec<PathBuf>>,
}

impl ScratchSpace {
    /// Use an existing directory as scratch space
    pub fn new<P: AsRef<Path>>(dir: P, keep: bool) -> CondenseResult<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(CondenseError::ResourceNotFound(dir.to_path_buf()));
        }
        let dir = dir
            .canonicalize()
            .map_err(|e| CondenseError::File(format!("Failed to resolve {}: {}", dir.display(), e)))?;
        Ok(Self {
            dir,
            keep,
            created: Mutex::new(Vec::new()),
        })
    }

    /// Absolute path of the scratch directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE_NAME)
    }

    /// Register a file for removal at cleanup
    pub fn track(&self, path: impl Into<PathBuf>) {
        self.created.lock().push(path.into());
    }

    /// Files currently registered, in registration order
    pub fn tracked(&self) -> Vec<PathBuf> {
        self.created.lock().clone()
    }

    /// Remove every registered file that exists; returns how many were deleted
    pub fn cleanup(&self) -> usize {
        let paths: Vec<PathBuf> = std::mem::take(&mut *self.created.lock());
        if self.keep {
            if !paths.is_empty() {
                info!("Keeping {} intermediate files in {}", paths.len(), self.dir.display());
            }
            return 0;
        }

        let mut removed = 0;
        for path in paths {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
            }
        }
        debug!("Removed {} intermediate files", removed);
        removed
    }
}

impl Drop for ScratchSpace {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Outcome of a condensing run
#[derive(Debug, Clone)]
pub struct CondenseReport {
    pub segments: Vec<IntermediateSegment>,
    /// Probed duration of the source video; `None` when nothing was processed
    pub input_duration: Option<Timestamp>,
    pub output_duration: Timestamp,
}

impl CondenseReport {
    fn empty() -> Self {
        Self {
            segments: Vec::new(),
            input_duration: None,
            output_duration: Timestamp::ZERO,
        }
    }

    /// Output duration as a percentage of the input duration
    pub fn ratio_percent(&self) -> Option<f64> {
        match self.input_duration {
            Some(input) if input > Timestamp::ZERO => {
                Some(self.output_duration.total_seconds() / input.total_seconds() * 100.0)
            }
            _ => None,
        }
    }

    pub fn summary(&self) -> String {
        match self.ratio_percent() {
            Some(ratio) => format!("Output duration is {:.2}% of the original", ratio),
            None => format!("Output duration is {}", self.output_duration),
        }
    }
}

/// Drives cutting and concatenation for one run
pub struct SegmentOrchestrator {
    tool: Arc<dyn MediaTool>,
    max_concurrent_cuts: usize,
    segment_extension: String,
}

impl SegmentOrchestrator {
    pub fn new(tool: Arc<dyn MediaTool>, max_concurrent_cuts: usize, segment_extension: impl Into<String>) -> Self {
        Self {
            tool,
            max_concurrent_cuts: max_concurrent_cuts.max(1),
            segment_extension: segment_extension.into(),
        }
    }

    /// Cut every planned segment from the source video.
    ///
    /// Up to `max_concurrent_cuts` cuts run at once. The first failure is returned as
    /// soon as it happens and drops every outstanding cut; results are put back in plan
    /// order before returning.
    pub async fn cut_segments(
        &self,
        video: &Path,
        plan: &[SegmentCut],
        scratch: &ScratchSpace,
        progress: &(dyn Fn(usize, usize) + Send + Sync),
    ) -> CondenseResult<Vec<IntermediateSegment>> {
        let total = plan.len();
        let completed = AtomicUsize::new(0);

        let mut finished: Vec<(usize, IntermediateSegment)> = stream::iter(plan)
            .map(|cut| {
                let completed = &completed;
                async move {
                    scratch.track(cut.segment.path.clone());
                    let start = cut.start.to_string();
                    let duration = cut.segment.duration.to_string();
                    if let Err(e) = self.tool.cut_clip(video, &cut.segment.path, &start, &duration).await {
                        error!("Cutting segment {} ({} +{}) failed: {}", cut.index, start, duration, e);
                        return Err(e);
                    }
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    progress(done, total);
                    Ok((cut.index, cut.segment.clone()))
                }
            })
            .buffer_unordered(self.max_concurrent_cuts)
            .try_collect()
            .await?;

        finished.sort_by_key(|(index, _)| *index);
        Ok(finished.into_iter().map(|(_, segment)| segment).collect())
    }

    /// Condense `video` into `audio_out` following the caption groups.
    ///
    /// A run whose groups are all empty performs no external call and reports a
    /// zero-length output.
    pub async fn run(
        &self,
        video: &Path,
        groups: &[Group],
        audio_out: &Path,
        scratch: &ScratchSpace,
        progress: &(dyn Fn(usize, usize) + Send + Sync),
    ) -> CondenseResult<CondenseReport> {
        if is_empty_run(groups) {
            warn!("No captions to condense, skipping cut and concat");
            return Ok(CondenseReport::empty());
        }

        let plan = plan_segments(groups, scratch.dir(), &self.segment_extension)?;
        info!("Cutting {} audio segments", plan.len());
        let segments = self.cut_segments(video, &plan, scratch, progress).await?;

        let manifest_path = scratch.manifest_path();
        scratch.track(manifest_path.clone());
        fs::write(&manifest_path, render_manifest(&segments)).map_err(|e| {
            CondenseError::File(format!("Failed to write manifest {}: {}", manifest_path.display(), e))
        })?;

        info!("Concatenating {} audio segments", segments.len());
        self.tool.concat(&manifest_path, audio_out).await?;

        let input_duration = self.tool.probe_duration(video).await?;
        let output_duration = self.tool.probe_duration(audio_out).await?;

        Ok(CondenseReport {
            segments,
            input_duration: Some(input_duration),
            output_duration,
        })
    }
}
