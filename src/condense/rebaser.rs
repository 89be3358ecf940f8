/*!
 * Rebasing of grouped captions onto the condensed timeline.
 *
 * Every group is moved back by a constant shift so that it starts right after the
 * previous group's last rebased caption. Spacing inside a group is never touched.
 */

use log::debug;

use crate::errors::{CondenseError, CondenseResult};
use crate::subtitle_processor::Caption;
use crate::timestamp::{Delta, Timestamp};

use super::grouper::{is_empty_run, Group};

/// Gap left between the last caption of a group and the first caption of the next one
pub const GROUP_MARGIN: Delta = Delta::from_millis(1);

/// Caption placed on the condensed output timeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebasedCaption {
    pub start: Timestamp,
    pub end: Timestamp,
    pub text: String,
}

impl RebasedCaption {
    /// Convert back into a caption for serialization
    pub fn into_caption(self) -> CondenseResult<Caption> {
        Caption::new(self.start, self.end, self.text)
    }
}

/// Shift every group so the output timeline has no gaps between groups.
///
/// Group 0 is shifted to start at zero. Group `k > 0` is shifted by
/// `(group[k].start - last_end) - 1ms`, where `last_end` is the end of the last
/// rebased caption of group `k - 1`. A run where every group is empty rebases to
/// nothing; an empty group next to non-empty ones is a contract breach.
pub fn rebase(groups: &[Group]) -> CondenseResult<Vec<RebasedCaption>> {
    if is_empty_run(groups) {
        return Ok(Vec::new());
    }

    let mut rebased: Vec<RebasedCaption> = Vec::with_capacity(groups.iter().map(Vec::len).sum());

    for (k, group) in groups.iter().enumerate() {
        let Some(first) = group.first() else {
            return Err(CondenseError::InvariantViolation(format!(
                "Group {} is empty while other groups have captions",
                k
            )));
        };

        let shift = match rebased.last() {
            Some(last) if k > 0 => (first.start() - last.end) - GROUP_MARGIN,
            _ => Delta::from(first.start()),
        };
        if shift.is_negative() {
            return Err(CondenseError::InvariantViolation(format!(
                "Negative shift {} for group {} starting at {}; groups overlap or are out of order",
                shift,
                k,
                first.start()
            )));
        }
        debug!("Group {}: {} captions, shift {}", k, group.len(), shift);

        for caption in group {
            let start = shift_back(caption.start(), shift, k)?;
            let end = shift_back(caption.end(), shift, k)?;
            rebased.push(RebasedCaption {
                start,
                end,
                text: caption.text().to_string(),
            });
        }
    }

    Ok(rebased)
}

fn shift_back(timestamp: Timestamp, shift: Delta, group: usize) -> CondenseResult<Timestamp> {
    timestamp.checked_add(-shift).ok_or_else(|| {
        CondenseError::InvariantViolation(format!(
            "Caption at {} in group {} would move before zero with shift {}",
            timestamp, group, shift
        ))
    })
}
