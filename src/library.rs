use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Every `.mid` file below `dir`, sorted. Creates `dir` if it does not exist yet.
pub fn list_midi_library<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();

    if !dir.exists() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create MIDI library {}", dir.display()))?;
        debug!("Created empty MIDI library at {}..!", dir.display());
    }

    let mut files = Vec::new();
    collect_midi_files(dir, &mut files)?;
    files.sort();

    Ok(files)
}

fn collect_midi_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))?;

    for entry in entries {
        let path = entry?.path();

        if path.is_dir() {
            collect_midi_files(&path, out)?;
        } else if path.is_file() && is_midi(&path) {
            out.push(path);
        }
    }

    Ok(())
}

fn is_midi(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("mid"))
}

/// File name without the `.mid` extension, for listings.
pub fn display_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod test {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("siano-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn creates_missing_library() {
        let dir = scratch_dir("missing");

        let files = list_midi_library(&dir).expect("library should be created");
        assert!(files.is_empty());
        assert!(dir.is_dir());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn lists_nested_midi_files() {
        let dir = scratch_dir("nested");
        fs::create_dir_all(dir.join("etudes")).unwrap();
        fs::write(dir.join("b_song.mid"), b"").unwrap();
        fs::write(dir.join("a_song.MID"), b"").unwrap();
        fs::write(dir.join("notes.txt"), b"").unwrap();
        fs::write(dir.join("etudes").join("scale.mid"), b"").unwrap();

        let files = list_midi_library(&dir).expect("library should list");
        let names: Vec<String> = files.iter().map(|p| display_name(p)).collect();

        assert_eq!(files.len(), 3);
        assert!(names.contains(&"a_song".to_string()));
        assert!(names.contains(&"b_song".to_string()));
        assert!(names.contains(&"scale".to_string()));

        let _ = fs::remove_dir_all(&dir);
    }
}
