/*!
 * Tests for subtitle reading, caption policies and WebVTT output
 */

use anyhow::Result;
use subcondense::errors::CondenseError;
use subcondense::subtitle_processor::{
    parse_ass, parse_webvtt, render_webvtt, write_webvtt, Caption, CaptionPolicy,
    DialogueStylePolicy, RawCaption, SubtitleFormat, SubtitleSource, WebVttPolicy,
};
use subcondense::timestamp::Timestamp;
use crate::common;

fn ms(value: u64) -> Timestamp {
    Timestamp::from_millis(value)
}

#[test]
fn test_subtitleFormat_fromPath_shouldInferFromExtension() {
    assert_eq!(SubtitleFormat::from_path("a/b/show.vtt").unwrap(), SubtitleFormat::WebVtt);
    assert_eq!(SubtitleFormat::from_path("show.ASS").unwrap(), SubtitleFormat::Ass);
    assert_eq!(SubtitleFormat::from_path("show.ssa").unwrap(), SubtitleFormat::Ass);
}

#[test]
fn test_subtitleFormat_fromPath_withUnknownExtension_shouldBeUnsupported() {
    assert!(matches!(
        SubtitleFormat::from_path("show.srt"),
        Err(CondenseError::UnsupportedFormat(_))
    ));
    assert!(matches!(
        SubtitleFormat::from_path("show"),
        Err(CondenseError::UnsupportedFormat(_))
    ));
}

#[test]
fn test_caption_new_withEndBeforeStart_shouldFailValidation() {
    let result = Caption::new(ms(2000), ms(1000), "backwards");
    assert!(matches!(result, Err(CondenseError::Validation(_))));
}

#[test]
fn test_caption_new_withZeroDuration_shouldBeAccepted() {
    let caption = Caption::new(ms(1000), ms(1000), "blink").unwrap();
    assert_eq!(caption.duration().total_milliseconds(), 0);
}

#[test]
fn test_parseWebvtt_withIdentifiersAndNotes_shouldReadCues() {
    let content = "WEBVTT - sample\n\nNOTE this is\na comment\n\nintro\n00:00:01.000 --> 00:00:02.000 align:start\nfirst line\nsecond line\n\n00:03.000 --> 00:04.000\nshort clock\n";
    let track = parse_webvtt(content).unwrap();
    assert_eq!(track.captions.len(), 2);
    assert_eq!(track.captions[0].start, ms(1000));
    assert_eq!(track.captions[0].end, ms(2000));
    assert_eq!(track.captions[0].text, "first line\nsecond line");
    assert_eq!(track.captions[1].start, ms(3000));
    assert!(track.declared_styles.is_empty());
}

#[test]
fn test_parseWebvtt_withoutHeader_shouldFailValidation() {
    let result = parse_webvtt("00:00:01.000 --> 00:00:02.000\nhello\n");
    assert!(matches!(result, Err(CondenseError::Validation(_))));
}

#[test]
fn test_parseAss_shouldReadStylesAndKeepCommasInText() {
    let track = parse_ass(common::SAMPLE_ASS).unwrap();
    assert_eq!(track.declared_styles, vec!["Default".to_string(), "Signs".to_string()]);
    assert_eq!(track.captions.len(), 3);
    assert_eq!(track.captions[0].text, "Hello, there");
    assert_eq!(track.captions[0].start, ms(1000));
    assert_eq!(track.captions[0].end, ms(2500));
    assert_eq!(track.captions[0].style.as_deref(), Some("Default"));
    assert_eq!(track.captions[1].style.as_deref(), Some("Signs"));
}

#[test]
fn test_webVttPolicy_shouldDropMusicCuesAndStripParentheticals() -> Result<()> {
    let policy = WebVttPolicy::default();
    let music = RawCaption::new(ms(0), ms(1000), "♪ la la ♪");
    assert!(!policy.is_valid(&music)?);

    let annotated = RawCaption::new(ms(0), ms(1000), "(laughs) Hi there");
    assert!(policy.is_valid(&annotated)?);
    assert_eq!(policy.normalize(annotated).text, " Hi there");

    let plain = RawCaption::new(ms(0), ms(1000), "Just words");
    assert_eq!(policy.normalize(plain.clone()), plain);
    Ok(())
}

#[test]
fn test_webVttPolicy_withMusicCuesAllowed_shouldKeepThem() -> Result<()> {
    let policy = WebVttPolicy { skip_music_cues: false };
    assert!(policy.is_valid(&RawCaption::new(ms(0), ms(1000), "♪ la la ♪"))?);
    Ok(())
}

#[test]
fn test_webVttPolicy_withNegativeDuration_shouldRejectSource() {
    let policy = WebVttPolicy::default();
    let backwards = RawCaption::new(ms(2000), ms(1000), "oops");
    assert!(matches!(policy.is_valid(&backwards), Err(CondenseError::Validation(_))));
}

#[test]
fn test_dialogueStylePolicy_shouldKeepOnlyConfiguredStyle() -> Result<()> {
    let source = SubtitleSource::new(SubtitleFormat::Ass, "sample.ass", common::SAMPLE_ASS);
    let captions = source.normalize(&DialogueStylePolicy::new("Default"))?;
    let texts: Vec<&str> = captions.iter().map(|c| c.text()).collect();
    assert_eq!(texts, vec!["Hello, there", "General Kenobi"]);

    let signs = source.normalize(&DialogueStylePolicy::new("Signs"))?;
    assert_eq!(signs.len(), 1);
    assert_eq!(signs[0].text(), "STORE");
    Ok(())
}

#[test]
fn test_dialogueStylePolicy_withUndeclaredStyle_shouldFailValidation() {
    let source = SubtitleSource::new(SubtitleFormat::Ass, "sample.ass", common::SAMPLE_ASS);
    let result = source.normalize(&DialogueStylePolicy::new("Dialogue"));
    assert!(matches!(result, Err(CondenseError::Validation(_))));
}

#[test]
fn test_subtitleSource_normalize_shouldPreserveSourceOrder() -> Result<()> {
    let source = SubtitleSource::new(SubtitleFormat::WebVtt, "sample.vtt", common::SAMPLE_VTT);
    let policy = source.format.default_policy(true, "Default");
    let captions = source.normalize(policy.as_ref())?;
    let texts: Vec<&str> = captions.iter().map(|c| c.text()).collect();
    assert_eq!(texts, vec!["a", "b", "c"]);
    Ok(())
}

#[test]
fn test_subtitleSource_fromFile_withMissingFile_shouldBeResourceNotFound() {
    let result = SubtitleSource::from_file("/definitely/not/here.vtt", None);
    assert!(matches!(result, Err(CondenseError::ResourceNotFound(_))));
}

#[test]
fn test_subtitleSource_fromFile_withExplicitFormat_shouldIgnoreExtension() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "dialogue.txt", common::SAMPLE_ASS)?;
    let source = SubtitleSource::from_file(&path, Some(SubtitleFormat::Ass))?;
    assert_eq!(source.format, SubtitleFormat::Ass);
    assert_eq!(source.read_raw()?.captions.len(), 3);
    Ok(())
}

#[test]
fn test_renderWebvtt_shouldWriteHeaderAndBlankLineSeparatedCues() -> Result<()> {
    let captions = vec![
        Caption::new(ms(0), ms(1000), "a")?,
        Caption::new(ms(2001), ms(3001), "c")?,
    ];
    let rendered = render_webvtt(&captions);
    assert_eq!(
        rendered,
        "WEBVTT\n\n00:00:00.000 --> 00:00:01.000\na\n\n00:00:02.001 --> 00:00:03.001\nc\n"
    );
    Ok(())
}

#[test]
fn test_writeWebvtt_shouldCreateParentAndReadBack() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("nested").join("out.vtt");
    let captions = vec![Caption::new(ms(500), ms(1500), "hello")?];
    write_webvtt(&path, &captions)?;

    let source = SubtitleSource::from_file(&path, None)?;
    let read_back = source.normalize(&WebVttPolicy::default())?;
    assert_eq!(read_back, captions);
    Ok(())
}
