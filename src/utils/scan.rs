//! Expansion of batch inputs into the audio files they name.
//!
//! Files are taken as given; directories are walked recursively, with
//! sibling subdirectories scanned in parallel. The order of results from a
//! directory is not deterministic, so callers sort when they need to.

use crate::constants::AUDIO_EXTENSIONS;
use rayon::prelude::*;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

const SKIP_DIRECTORIES: &[&str] = &["node_modules", ".git", "temp"];

pub fn is_hidden_file(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

pub fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| AUDIO_EXTENSIONS.contains(&ext.as_str()))
}

/// Expand `inputs` into a sorted, de-duplicated list of audio files.
///
/// A missing input is an error. Unreadable subdirectories are logged and
/// skipped.
pub fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    let mut files = Vec::new();

    for input in inputs {
        if input.is_dir() {
            scan_directory(input, &mut files)?;
        } else if input.is_file() {
            files.push(input.clone());
        } else {
            return Err(format!("Path does not exist: {}", input.display()).into());
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

fn scan_directory(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), Box<dyn Error>> {
    let entries: Vec<_> = fs::read_dir(dir)?.collect::<Result<_, _>>()?;
    let mut directories = Vec::new();

    for entry in entries {
        let path = entry.path();
        if is_hidden_file(&path) {
            continue;
        }

        if path.is_dir() {
            let skip = path
                .file_name()
                .is_some_and(|name| SKIP_DIRECTORIES.iter().any(|skip| name == *skip));
            if !skip {
                directories.push(path);
            }
        } else if path.is_file() && is_audio_file(&path) {
            files.push(path);
        }
    }

    let nested: Vec<Vec<PathBuf>> = directories
        .par_iter()
        .filter_map(|subdir| {
            let mut found = Vec::new();
            match scan_directory(subdir, &mut found) {
                Ok(()) => Some(found),
                Err(e) => {
                    log::warn!("Failed to scan directory '{}': {e}", subdir.display());
                    None
                }
            }
        })
        .collect();

    files.extend(nested.into_iter().flatten());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_is_hidden_file() {
        assert!(is_hidden_file(Path::new(".hidden")));
        assert!(is_hidden_file(Path::new("/path/.hidden")));
        assert!(!is_hidden_file(Path::new("visible")));
    }

    #[test]
    fn test_is_audio_file() {
        assert!(is_audio_file(Path::new("take.WAV")));
        assert!(is_audio_file(Path::new("take.flac")));
        assert!(!is_audio_file(Path::new("take.waveform.json")));
        assert!(!is_audio_file(Path::new("take")));
    }

    #[test]
    fn test_collect_nested_directories() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a");
        let b = temp_dir.path().join("b");
        fs::create_dir(&a).unwrap();
        fs::create_dir(&b).unwrap();
        fs::write(temp_dir.path().join("root.wav"), b"fake").unwrap();
        fs::write(a.join("one.flac"), b"fake").unwrap();
        fs::write(b.join("two.wav"), b"fake").unwrap();
        fs::write(b.join("notes.txt"), b"fake").unwrap();
        fs::write(temp_dir.path().join(".hidden.wav"), b"fake").unwrap();

        let files = collect_inputs(&[temp_dir.path().to_path_buf()]).unwrap();
        assert_eq!(files.len(), 3);
        assert!(files.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_skip_directories() {
        let temp_dir = TempDir::new().unwrap();
        let skip = temp_dir.path().join("node_modules");
        fs::create_dir(&skip).unwrap();
        fs::write(skip.join("test.wav"), b"fake").unwrap();

        let files = collect_inputs(&[temp_dir.path().to_path_buf()]).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_explicit_file_kept_once() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("take.wav");
        fs::write(&file, b"fake").unwrap();

        let files = collect_inputs(&[file.clone(), temp_dir.path().to_path_buf()]).unwrap();
        assert_eq!(files, vec![file]);
    }

    #[test]
    fn test_missing_input_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.wav");
        assert!(collect_inputs(&[missing]).is_err());
    }
}
