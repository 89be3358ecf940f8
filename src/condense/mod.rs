/*!
 * Condensing core: caption grouping, timeline rebasing and segment orchestration.
 *
 * - `grouper`: splits captions into contiguous groups by silence threshold
 * - `rebaser`: moves each group onto the gap-free output timeline
 * - `orchestrator`: cuts one audio segment per group and concatenates them
 */

pub mod grouper;
pub mod rebaser;
pub mod orchestrator;

pub use grouper::{group_captions, is_empty_run, Group, DEFAULT_GAP_THRESHOLD_MS};
pub use rebaser::{rebase, RebasedCaption, GROUP_MARGIN};
pub use orchestrator::{
    plan_segments, render_manifest, CondenseReport, IntermediateSegment, ScratchSpace, SegmentCut,
    SegmentOrchestrator,
};
