use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use regex::Regex;
use once_cell::sync::Lazy;
use log::{debug, warn};

use crate::errors::{CondenseError, CondenseResult};
use crate::timestamp::{Delta, Timestamp};

// @module: Subtitle reading, normalization and writing

// @const: Parenthetical annotation, e.g. "(laughs)"
static PARENTHETICAL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(.+\)").expect("parenthetical regex is valid")
});

// @const: Marker used by web captions for music and sound cues
const MUSIC_NOTE: char = '♪';

// @const: Default ASS event format when the file omits a Format line
const DEFAULT_ASS_EVENT_FORMAT: [&str; 10] = [
    "Layer", "Start", "End", "Style", "Name", "MarginL", "MarginR", "MarginV", "Effect", "Text",
];

// @struct: Validated caption
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caption {
    start: Timestamp,
    end: Timestamp,
    text: String,
}

impl Caption {
    /// Create a caption, rejecting intervals that end before they start
    pub fn new(start: Timestamp, end: Timestamp, text: impl Into<String>) -> CondenseResult<Self> {
        if end < start {
            return Err(CondenseError::Validation(format!(
                "Caption ends before it starts: {} --> {}",
                start, end
            )));
        }
        Ok(Caption {
            start,
            end,
            text: text.into(),
        })
    }

    pub fn start(&self) -> Timestamp {
        self.start
    }

    pub fn end(&self) -> Timestamp {
        self.end
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn duration(&self) -> Delta {
        self.end - self.start
    }
}

impl fmt::Display for Caption {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{} --> {}", self.start, self.end)?;
        writeln!(f, "{}", self.text)
    }
}

// @struct: Caption as read from the source, before any validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCaption {
    pub start: Timestamp,
    pub end: Timestamp,
    pub text: String,
    /// Style tag, only present for styled dialogue tracks
    pub style: Option<String>,
}

impl RawCaption {
    pub fn new(start: Timestamp, end: Timestamp, text: impl Into<String>) -> Self {
        RawCaption {
            start,
            end,
            text: text.into(),
            style: None,
        }
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn duration(&self) -> Delta {
        self.end - self.start
    }
}

/// Raw captions of one source plus the styles it declares
#[derive(Debug, Clone, Default)]
pub struct RawTrack {
    pub captions: Vec<RawCaption>,
    /// Style names declared by the source (ASS only)
    pub declared_styles: Vec<String>,
}

/// Supported subtitle container formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleFormat {
    /// Web captions (`.vtt`)
    WebVtt,
    /// Styled dialogue track (`.ass` / `.ssa`)
    Ass,
}

impl SubtitleFormat {
    /// Infer the format from a file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> CondenseResult<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "vtt" => Ok(Self::WebVtt),
            "ass" | "ssa" => Ok(Self::Ass),
            _ => Err(CondenseError::UnsupportedFormat(path.display().to_string())),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::WebVtt => "vtt",
            Self::Ass => "ass",
        }
    }

    /// Build the default caption policy for this format
    pub fn default_policy(&self, skip_music_cues: bool, dialogue_style: &str) -> Box<dyn CaptionPolicy> {
        match self {
            Self::WebVtt => Box::new(WebVttPolicy { skip_music_cues }),
            Self::Ass => Box::new(DialogueStylePolicy::new(dialogue_style)),
        }
    }
}

impl fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::WebVtt => write!(f, "WebVTT"),
            Self::Ass => write!(f, "ASS"),
        }
    }
}

/// Validity and text policy applied to every raw caption of a source
pub trait CaptionPolicy: Send + Sync {
    /// Check source-wide preconditions before any caption is filtered
    fn prepare(&self, _track: &RawTrack) -> CondenseResult<()> {
        Ok(())
    }

    /// Whether the caption is spoken dialogue; errors reject the whole source
    fn is_valid(&self, caption: &RawCaption) -> CondenseResult<bool>;

    /// Transform the caption text
    fn normalize(&self, caption: RawCaption) -> RawCaption {
        caption
    }
}

/// Policy for web captions: drops music cues and strips parenthetical annotations
#[derive(Debug, Clone)]
pub struct WebVttPolicy {
    pub skip_music_cues: bool,
}

impl Default for WebVttPolicy {
    fn default() -> Self {
        Self { skip_music_cues: true }
    }
}

impl CaptionPolicy for WebVttPolicy {
    fn is_valid(&self, caption: &RawCaption) -> CondenseResult<bool> {
        if self.skip_music_cues && caption.text.contains(MUSIC_NOTE) {
            return Ok(false);
        }
        if caption.duration().is_negative() {
            return Err(CondenseError::Validation(format!(
                "Invalid caption {} --> {} '{}': negative duration {}",
                caption.start,
                caption.end,
                caption.text,
                caption.duration()
            )));
        }
        Ok(true)
    }

    fn normalize(&self, caption: RawCaption) -> RawCaption {
        if !PARENTHETICAL_REGEX.is_match(&caption.text) {
            return caption;
        }
        let text = PARENTHETICAL_REGEX.replace_all(&caption.text, "").into_owned();
        if text == caption.text {
            return caption;
        }
        RawCaption { text, ..caption }
    }
}

/// Policy for styled dialogue tracks: keeps only the configured style
#[derive(Debug, Clone)]
pub struct DialogueStylePolicy {
    style: String,
}

impl DialogueStylePolicy {
    pub fn new(style: impl Into<String>) -> Self {
        Self { style: style.into() }
    }

    pub fn style(&self) -> &str {
        &self.style
    }
}

impl CaptionPolicy for DialogueStylePolicy {
    fn prepare(&self, track: &RawTrack) -> CondenseResult<()> {
        if !track.declared_styles.is_empty() && !track.declared_styles.iter().any(|s| s == &self.style) {
            return Err(CondenseError::Validation(format!(
                "Unrecognized style '{}', the track declares: {}",
                self.style,
                track.declared_styles.join(", ")
            )));
        }
        Ok(())
    }

    fn is_valid(&self, caption: &RawCaption) -> CondenseResult<bool> {
        Ok(caption.style.as_deref() == Some(self.style.as_str()))
    }
}

/// Subtitle content tagged with its format
#[derive(Debug, Clone)]
pub struct SubtitleSource {
    pub format: SubtitleFormat,
    pub origin: PathBuf,
    content: String,
}

impl SubtitleSource {
    /// Wrap in-memory subtitle content
    pub fn new(format: SubtitleFormat, origin: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        SubtitleSource {
            format,
            origin: origin.into(),
            content: content.into(),
        }
    }

    /// Read a subtitle file; the format is inferred from the extension when not given
    pub fn from_file<P: AsRef<Path>>(path: P, format: Option<SubtitleFormat>) -> CondenseResult<Self> {
        let path = path.as_ref();
        let format = match format {
            Some(format) => format,
            None => SubtitleFormat::from_path(path)?,
        };
        if !path.is_file() {
            return Err(CondenseError::ResourceNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)
            .map_err(|e| CondenseError::File(format!("Failed to read {}: {}", path.display(), e)))?;
        Ok(Self::new(format, path, content))
    }

    /// Parse the raw caption stream for this source's format
    pub fn read_raw(&self) -> CondenseResult<RawTrack> {
        match self.format {
            SubtitleFormat::WebVtt => parse_webvtt(&self.content),
            SubtitleFormat::Ass => parse_ass(&self.content),
        }
    }

    /// Filter and transform the source into validated captions, keeping source order
    pub fn normalize(&self, policy: &dyn CaptionPolicy) -> CondenseResult<Vec<Caption>> {
        let track = self.read_raw()?;
        policy.prepare(&track)?;

        let total = track.captions.len();
        let mut captions = Vec::with_capacity(total);
        for raw in track.captions {
            if !policy.is_valid(&raw)? {
                continue;
            }
            let raw = policy.normalize(raw);
            captions.push(Caption::new(raw.start, raw.end, raw.text)?);
        }

        debug!(
            "Normalized {} source: kept {} of {} captions",
            self.format,
            captions.len(),
            total
        );
        Ok(captions)
    }
}

/// Parse WebVTT content into raw captions
pub fn parse_webvtt(content: &str) -> CondenseResult<RawTrack> {
    let content = content.trim_start_matches('\u{feff}');
    let mut lines = content.lines().map(|l| l.trim_end_matches('\r'));

    match lines.next() {
        Some(header) if header.starts_with("WEBVTT") => {}
        _ => {
            return Err(CondenseError::Validation(
                "Missing WEBVTT header".to_string(),
            ))
        }
    }

    let mut captions = Vec::new();
    let mut current: Option<(Timestamp, Timestamp)> = None;
    let mut text_lines: Vec<&str> = Vec::new();
    // NOTE, STYLE and REGION blocks run until the next blank line
    let mut skipping_block = false;

    let mut finish = |current: &mut Option<(Timestamp, Timestamp)>, text_lines: &mut Vec<&str>| {
        if let Some((start, end)) = current.take() {
            captions.push(RawCaption::new(start, end, text_lines.join("\n")));
        }
        text_lines.clear();
    };

    for line in lines {
        if line.trim().is_empty() {
            finish(&mut current, &mut text_lines);
            skipping_block = false;
            continue;
        }
        if skipping_block {
            continue;
        }
        if current.is_none() {
            if line.starts_with("NOTE") || line.starts_with("STYLE") || line.starts_with("REGION") {
                skipping_block = true;
                continue;
            }
            if let Some((start, rest)) = line.split_once("-->") {
                let end = rest.split_whitespace().next().unwrap_or_default();
                current = Some((Timestamp::parse_clock(start)?, Timestamp::parse_clock(end)?));
            }
            // Anything else before the timing line is a cue identifier
            continue;
        }
        text_lines.push(line);
    }
    finish(&mut current, &mut text_lines);

    Ok(RawTrack {
        captions,
        declared_styles: Vec::new(),
    })
}

/// Parse ASS/SSA content into raw captions carrying their style tag
pub fn parse_ass(content: &str) -> CondenseResult<RawTrack> {
    let content = content.trim_start_matches('\u{feff}');
    let mut section = String::new();
    let mut event_format: Vec<String> = DEFAULT_ASS_EVENT_FORMAT.iter().map(|s| s.to_string()).collect();
    let mut track = RawTrack::default();

    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            section = line[1..line.len() - 1].to_lowercase();
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };

        match (section.as_str(), key.trim()) {
            ("v4+ styles" | "v4 styles", "Style") => {
                if let Some(name) = value.split(',').next() {
                    track.declared_styles.push(name.trim().to_string());
                }
            }
            ("events", "Format") => {
                event_format = value.split(',').map(|f| f.trim().to_string()).collect();
            }
            ("events", "Dialogue") => {
                let fields: Vec<&str> = value.trim_start().splitn(event_format.len(), ',').collect();
                if fields.len() != event_format.len() {
                    warn!("Skipping malformed dialogue at line {}: {}", line_no + 1, line);
                    continue;
                }
                let field = |name: &str| {
                    event_format
                        .iter()
                        .position(|f| f.eq_ignore_ascii_case(name))
                        .map(|i| fields[i])
                };
                let (Some(start), Some(end), Some(text)) = (field("Start"), field("End"), field("Text")) else {
                    return Err(CondenseError::Validation(format!(
                        "ASS event format lacks Start/End/Text: {}",
                        event_format.join(", ")
                    )));
                };
                let mut caption = RawCaption::new(
                    Timestamp::parse_clock(start)?,
                    Timestamp::parse_clock(end)?,
                    text,
                );
                if let Some(style) = field("Style") {
                    caption = caption.with_style(style.trim());
                }
                track.captions.push(caption);
            }
            _ => {}
        }
    }

    Ok(track)
}

/// Render captions as a WebVTT document
pub fn render_webvtt<'a, I>(captions: I) -> String
where
    I: IntoIterator<Item = &'a Caption>,
{
    let mut out = String::from("WEBVTT\n");
    for caption in captions {
        out.push('\n');
        out.push_str(&caption.to_string());
    }
    out
}

/// Write captions to a WebVTT file, creating the parent directory if needed
pub fn write_webvtt<'a, P, I>(path: P, captions: I) -> CondenseResult<()>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = &'a Caption>,
{
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, render_webvtt(captions))
        .map_err(|e| CondenseError::File(format!("Failed to write {}: {}", path.display(), e)))
}
