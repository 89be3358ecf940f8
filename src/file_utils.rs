use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use regex::Regex;
use once_cell::sync::Lazy;

// @module: File and directory utilities

// @const: Episode tag such as S01E01
static EPISODE_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"S\d+E\d+").expect("episode tag regex is valid")
});

// @const: Directory, next to the video, receiving inferred outputs
pub const CONDENSED_DIR_NAME: &str = "condensed";

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {}", path.display()))?;
        }
        Ok(())
    }

    /// Make a path absolute against the current directory
    pub fn absolute<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
        std::path::absolute(path.as_ref())
            .with_context(|| format!("Failed to resolve path: {}", path.as_ref().display()))
    }

    /// Find files with a specific extension in a directory (not recursive)
    pub fn find_files<P: AsRef<Path>>(dir: P, extension: &str) -> Result<Vec<PathBuf>> {
        let extension = extension.trim_start_matches('.');
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).max_depth(1).sort_by_file_name() {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() {
                if let Some(ext) = path.extension() {
                    if ext.to_string_lossy().eq_ignore_ascii_case(extension) {
                        result.push(path.to_path_buf());
                    }
                }
            }
        }

        Ok(result)
    }

    /// Episode tag (e.g. `S01E01`) found in a path, last occurrence wins
    pub fn episode_tag<P: AsRef<Path>>(path: P) -> Option<String> {
        let path = path.as_ref().to_string_lossy();
        EPISODE_TAG_REGEX
            .find_iter(&path)
            .last()
            .map(|m| m.as_str().to_string())
    }

    /// Find the single `*<tag>*.vtt` subtitle next to a video
    pub fn infer_subtitle_path<P: AsRef<Path>>(video: P) -> Result<PathBuf> {
        let video = video.as_ref();
        let tag = Self::episode_tag(video).ok_or_else(|| {
            anyhow!(
                "No subtitle given and no episode tag (e.g. S01E01) in video path: {}",
                video.display()
            )
        })?;
        let dir = video.parent().unwrap_or(Path::new("."));

        let matches: Vec<PathBuf> = Self::find_files(dir, "vtt")?
            .into_iter()
            .filter(|p| {
                p.file_name()
                    .map(|n| n.to_string_lossy().contains(&tag))
                    .unwrap_or(false)
            })
            .collect();

        match matches.as_slice() {
            [single] => Ok(single.clone()),
            [] => Err(anyhow!("No *{}*.vtt subtitle found in {}", tag, dir.display())),
            _ => Err(anyhow!(
                "Expected one *{}*.vtt subtitle in {}, found {}: {:?}",
                tag,
                dir.display(),
                matches.len(),
                matches
            )),
        }
    }

    // @generates: `<video dir>/condensed/<tag>.<extension>`
    pub fn infer_output_path<P: AsRef<Path>>(video: P, extension: &str) -> Result<PathBuf> {
        let video = video.as_ref();
        let tag = Self::episode_tag(video).ok_or_else(|| {
            anyhow!(
                "No output given and no episode tag (e.g. S01E01) in video path: {}",
                video.display()
            )
        })?;
        let dir = video.parent().unwrap_or(Path::new("."));
        Ok(dir.join(CONDENSED_DIR_NAME).join(format!("{}.{}", tag, extension)))
    }
}
