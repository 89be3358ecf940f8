/*!
 * Gap-based grouping of captions.
 *
 * A group is a maximal run of consecutive captions where no caption starts more than
 * the threshold after the previous one ended. Each group becomes one audio segment.
 */

use crate::subtitle_processor::Caption;

/// Default silence, in milliseconds, that splits two captions into separate groups
pub const DEFAULT_GAP_THRESHOLD_MS: u64 = 1000;

/// Ordered run of captions cut as a single segment
pub type Group = Vec<Caption>;

/// Partition captions into contiguous groups.
///
/// A new group starts when `captions[i].start - captions[i - 1].end` is strictly
/// greater than `gap_threshold_ms`. Empty input yields a single empty group.
pub fn group_captions(captions: &[Caption], gap_threshold_ms: u64) -> Vec<Group> {
    let mut groups: Vec<Group> = vec![Vec::new()];

    for (i, caption) in captions.iter().enumerate() {
        if i > 0 {
            let gap = (caption.start() - captions[i - 1].end()).total_milliseconds();
            // Overlapping captions give a negative gap and always stay together
            if gap > 0 && gap as u64 > gap_threshold_ms {
                groups.push(Vec::new());
            }
        }
        if let Some(current) = groups.last_mut() {
            current.push(caption.clone());
        }
    }

    groups
}

/// Whether grouping produced nothing to process
pub fn is_empty_run(groups: &[Group]) -> bool {
    groups.iter().all(|g| g.is_empty())
}
