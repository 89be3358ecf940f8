/*!
 * Tests for file utility functions
 */

use std::path::{Path, PathBuf};
use anyhow::Result;
use subcondense::file_utils::FileManager;
use crate::common;

/// Test that file_exists returns true for existing files
#[test]
fn test_file_exists_withExistingFile_shouldReturnTrue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(temp_dir.path(), "test_file_exists.tmp", "test content")?;

    assert!(FileManager::file_exists(&test_file));
    assert!(!FileManager::dir_exists(&test_file));

    Ok(())
}

#[test]
fn test_file_exists_withNonExistentFile_shouldReturnFalse() {
    assert!(!FileManager::file_exists("non_existent_file.tmp"));
}

#[test]
fn test_ensure_dir_withNestedPath_shouldCreateAllLevels() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let nested = temp_dir.path().join("a").join("b").join("c");

    FileManager::ensure_dir(&nested)?;
    assert!(FileManager::dir_exists(&nested));

    // Second call is a no-op
    FileManager::ensure_dir(&nested)?;
    Ok(())
}

#[test]
fn test_find_files_shouldMatchExtensionCaseInsensitivelyAndSort() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "b.vtt", "")?;
    common::create_test_file(temp_dir.path(), "a.VTT", "")?;
    common::create_test_file(temp_dir.path(), "c.ass", "")?;
    std::fs::create_dir(temp_dir.path().join("sub"))?;
    common::create_test_file(&temp_dir.path().join("sub"), "d.vtt", "")?;

    let found = FileManager::find_files(temp_dir.path(), ".vtt")?;
    let names: Vec<String> = found
        .iter()
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();
    assert_eq!(names, vec!["a.VTT".to_string(), "b.vtt".to_string()]);
    Ok(())
}

#[test]
fn test_episode_tag_shouldReturnLastMatch() {
    assert_eq!(
        FileManager::episode_tag("/shows/S01E01/Show.S01E02.mkv"),
        Some("S01E02".to_string())
    );
    assert_eq!(FileManager::episode_tag("/movies/film.mkv"), None);
}

#[test]
fn test_infer_output_path_shouldUseCondensedDirAndTag() -> Result<()> {
    let output = FileManager::infer_output_path(Path::new("/media/Show_S02E10_720p.mkv"), "mp3")?;
    assert_eq!(output, PathBuf::from("/media/condensed/S02E10.mp3"));
    Ok(())
}

#[test]
fn test_infer_output_path_withoutTag_shouldFail() {
    assert!(FileManager::infer_output_path(Path::new("/media/film.mkv"), "vtt").is_err());
}

#[test]
fn test_infer_subtitle_path_withSingleMatch_shouldFindIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let video = common::create_test_file(temp_dir.path(), "Show_S01E03.mp4", "")?;
    let subtitle = common::create_test_file(temp_dir.path(), "Show_S01E03.en.vtt", "WEBVTT\n")?;
    common::create_test_file(temp_dir.path(), "Show_S01E04.en.vtt", "WEBVTT\n")?;

    assert_eq!(FileManager::infer_subtitle_path(&video)?, subtitle);
    Ok(())
}

#[test]
fn test_infer_subtitle_path_withAmbiguousMatches_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let video = common::create_test_file(temp_dir.path(), "Show_S01E03.mp4", "")?;
    common::create_test_file(temp_dir.path(), "Show_S01E03.en.vtt", "WEBVTT\n")?;
    common::create_test_file(temp_dir.path(), "Show_S01E03.fr.vtt", "WEBVTT\n")?;

    let error = FileManager::infer_subtitle_path(&video).unwrap_err();
    assert!(error.to_string().contains("found 2"));
    Ok(())
}

#[test]
fn test_infer_subtitle_path_withNoMatch_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let video = common::create_test_file(temp_dir.path(), "Show_S01E03.mp4", "")?;
    assert!(FileManager::infer_subtitle_path(&video).is_err());
    Ok(())
}
