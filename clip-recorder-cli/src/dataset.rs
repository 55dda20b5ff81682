//! Dataset layout helpers
//!
//! Takes live under `<output-dir>/<LABEL>/<prefix>_<index>.wav`, with the
//! label directory uppercased on disk and indices starting at 1.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::ValueEnum;

/// Category assigned to a take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Label {
    Ok,
    Ng,
}

impl Label {
    /// Directory name for this label inside the dataset root.
    pub fn dir_name(self) -> &'static str {
        match self {
            Label::Ok => "OK",
            Label::Ng => "NG",
        }
    }
}

/// Path of take `<prefix>_<index>.wav` inside `dir`.
pub fn take_path(dir: &Path, prefix: &str, index: u32) -> PathBuf {
    dir.join(format!("{prefix}_{index}.wav"))
}

/// First unused take index in `dir`: one past the highest existing
/// `<prefix>_<n>.wav`. A missing directory counts as empty, so the first
/// take of a fresh dataset gets index 1.
pub fn next_free_index(dir: &Path, prefix: &str) -> io::Result<u32> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(1),
        Err(err) => return Err(err),
    };

    let mut highest = 0;
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if let Some(index) = parse_take_index(name, prefix) {
            highest = highest.max(index);
        }
    }
    Ok(highest + 1)
}

fn parse_take_index(file_name: &str, prefix: &str) -> Option<u32> {
    file_name
        .strip_prefix(prefix)?
        .strip_prefix('_')?
        .strip_suffix(".wav")?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn take_path_joins_prefix_and_index() {
        let path = take_path(Path::new("output/OK"), "sample", 12);
        assert_eq!(path, Path::new("output/OK/sample_12.wav"));
    }

    #[test]
    fn missing_directory_starts_at_one() {
        let dir = tempdir().unwrap();
        let index = next_free_index(&dir.path().join("OK"), "sample").unwrap();
        assert_eq!(index, 1);
    }

    #[test]
    fn empty_directory_starts_at_one() {
        let dir = tempdir().unwrap();
        let index = next_free_index(dir.path(), "sample").unwrap();
        assert_eq!(index, 1);
    }

    #[test]
    fn next_index_is_one_past_the_highest_take() {
        let dir = tempdir().unwrap();
        for n in [1u32, 7, 3] {
            File::create(dir.path().join(format!("sample_{n}.wav"))).unwrap();
        }
        let index = next_free_index(dir.path(), "sample").unwrap();
        assert_eq!(index, 8);
    }

    #[test]
    fn gaps_are_not_reused() {
        let dir = tempdir().unwrap();
        for n in [2u32, 5] {
            File::create(dir.path().join(format!("sample_{n}.wav"))).unwrap();
        }
        assert_eq!(next_free_index(dir.path(), "sample").unwrap(), 6);
    }

    #[test]
    fn foreign_files_are_ignored() {
        let dir = tempdir().unwrap();
        for name in [
            "sample_4.wav",
            "other_9.wav",
            "sample_x.wav",
            "sample9.wav",
            "sample_2.txt",
            "notes.md",
        ] {
            File::create(dir.path().join(name)).unwrap();
        }
        assert_eq!(next_free_index(dir.path(), "sample").unwrap(), 5);
    }

    #[test]
    fn prefix_with_underscore_parses() {
        assert_eq!(parse_take_index("my_word_3.wav", "my_word"), Some(3));
        assert_eq!(parse_take_index("my_word_3.wav", "my"), None);
    }

    #[test]
    fn label_directories_are_uppercase() {
        assert_eq!(Label::Ok.dir_name(), "OK");
        assert_eq!(Label::Ng.dir_name(), "NG");
    }
}
