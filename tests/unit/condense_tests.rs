/*!
 * Tests for caption grouping, rebasing and segment planning
 */

use std::path::Path;
use anyhow::Result;
use subcondense::condense::{
    group_captions, is_empty_run, plan_segments, rebase, render_manifest, Group,
    DEFAULT_GAP_THRESHOLD_MS,
};
use subcondense::errors::CondenseError;
use subcondense::subtitle_processor::Caption;
use subcondense::timestamp::Timestamp;

fn caption(start: u64, end: u64, text: &str) -> Caption {
    Caption::new(Timestamp::from_millis(start), Timestamp::from_millis(end), text).unwrap()
}

fn bounds(group: &Group) -> Vec<(u64, u64)> {
    group
        .iter()
        .map(|c| (c.start().total_milliseconds(), c.end().total_milliseconds()))
        .collect()
}

#[test]
fn test_groupCaptions_withLongPause_shouldSplitIntoTwoGroups() {
    let captions = vec![caption(0, 1000, "a"), caption(1200, 2000, "b"), caption(5000, 6000, "c")];
    let groups = group_captions(&captions, DEFAULT_GAP_THRESHOLD_MS);
    assert_eq!(groups.len(), 2);
    assert_eq!(bounds(&groups[0]), vec![(0, 1000), (1200, 2000)]);
    assert_eq!(bounds(&groups[1]), vec![(5000, 6000)]);
}

#[test]
fn test_groupCaptions_withGapEqualToThreshold_shouldStayTogether() {
    let captions = vec![caption(0, 1000, "a"), caption(2000, 3000, "b"), caption(4001, 5000, "c")];
    let groups = group_captions(&captions, 1000);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].len(), 2);
    assert_eq!(groups[1][0].text(), "c");
}

#[test]
fn test_groupCaptions_withOverlap_shouldNeverSplit() {
    let captions = vec![caption(0, 3000, "a"), caption(1000, 2000, "b")];
    let groups = group_captions(&captions, 0);
    assert_eq!(groups.len(), 1);
}

#[test]
fn test_groupCaptions_withNoCaptions_shouldYieldOneEmptyGroup() {
    let groups = group_captions(&[], DEFAULT_GAP_THRESHOLD_MS);
    assert_eq!(groups.len(), 1);
    assert!(groups[0].is_empty());
    assert!(is_empty_run(&groups));
}

#[test]
fn test_rebase_withTwoGroups_shouldCloseGapKeepingOneMillisecondMargin() -> Result<()> {
    let captions = vec![caption(0, 1000, "a"), caption(1200, 2000, "b"), caption(5000, 6000, "c")];
    let rebased = rebase(&group_captions(&captions, DEFAULT_GAP_THRESHOLD_MS))?;
    let got: Vec<(u64, u64, &str)> = rebased
        .iter()
        .map(|r| (r.start.total_milliseconds(), r.end.total_milliseconds(), r.text.as_str()))
        .collect();
    assert_eq!(got, vec![(0, 1000, "a"), (1200, 2000, "b"), (2001, 3001, "c")]);
    Ok(())
}

#[test]
fn test_rebase_withLateFirstCaption_shouldStartAtZero() -> Result<()> {
    let captions = vec![caption(90_000, 91_500, "late")];
    let rebased = rebase(&group_captions(&captions, DEFAULT_GAP_THRESHOLD_MS))?;
    assert_eq!(rebased[0].start, Timestamp::ZERO);
    assert_eq!(rebased[0].end, Timestamp::from_millis(1500));
    Ok(())
}

#[test]
fn test_rebase_shouldPreserveCountOrderAndDurations() -> Result<()> {
    let captions: Vec<Caption> = (0..20u64)
        .map(|i| caption(i * 2500, i * 2500 + 700 + (i % 3) * 100, "x"))
        .collect();
    let rebased = rebase(&group_captions(&captions, 1000))?;
    assert_eq!(rebased.len(), captions.len());
    for (original, moved) in captions.iter().zip(&rebased) {
        assert_eq!(moved.end - moved.start, original.end() - original.start());
    }
    for pair in rebased.windows(2) {
        assert!(pair[0].start <= pair[1].start);
    }
    Ok(())
}

#[test]
fn test_rebase_withOnlyEmptyRun_shouldYieldNothing() -> Result<()> {
    assert!(rebase(&group_captions(&[], 1000))?.is_empty());
    Ok(())
}

#[test]
fn test_rebase_withEmptyGroupAmongOthers_shouldBeInvariantViolation() {
    let groups = vec![vec![caption(0, 1000, "a")], Vec::new()];
    assert!(matches!(rebase(&groups), Err(CondenseError::InvariantViolation(_))));
}

#[test]
fn test_rebasedCaption_intoCaption_shouldKeepText() -> Result<()> {
    let rebased = rebase(&[vec![caption(3000, 4000, "hi")]])?;
    let caption = rebased.into_iter().next().unwrap().into_caption()?;
    assert_eq!(caption.text(), "hi");
    assert_eq!(caption.start(), Timestamp::ZERO);
    Ok(())
}

#[test]
fn test_planSegments_andManifest_shouldMatchRebasedTimeline() -> Result<()> {
    let captions = vec![caption(0, 1000, "a"), caption(1200, 2000, "b"), caption(5000, 6000, "c")];
    let groups = group_captions(&captions, DEFAULT_GAP_THRESHOLD_MS);
    let plan = plan_segments(&groups, Path::new("/work"), "aac")?;
    let segments: Vec<_> = plan.iter().map(|cut| cut.segment.clone()).collect();
    let manifest = render_manifest(&segments);
    assert_eq!(
        manifest,
        "file '/work/out_000.aac'\nduration 2.000\nfile '/work/out_001.aac'\nduration 1.000\n"
    );
    Ok(())
}
