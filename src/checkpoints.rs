// checkpoint discovery
//
// checkpoint files are opaque inputs; we only resolve names to paths. the
// cache directory is scanned for .pkl files keyed by file stem, and when it
// yields nothing the built-in procedural presets keep the app usable.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// name -> path; None marks a built-in preset with no file behind it
pub type CheckpointMap = BTreeMap<String, Option<PathBuf>>;

const BUILTIN_PRESETS: [&str; 3] = ["builtin_faces", "builtin_lions", "builtin_terrain"];

pub fn discover(cache_dir: &Path) -> CheckpointMap {
    let mut found = CheckpointMap::new();
    if let Ok(entries) = std::fs::read_dir(cache_dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("pkl") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                found.insert(stem.to_owned(), Some(path.clone()));
            }
        }
    }
    if found.is_empty() {
        log::info!(
            "no checkpoints under {}, using built-in presets",
            cache_dir.display()
        );
        for name in BUILTIN_PRESETS {
            found.insert(name.to_owned(), None);
        }
    } else {
        log::info!("found {} checkpoint(s) under {}", found.len(), cache_dir.display());
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_dir_falls_back_to_presets() {
        let map = discover(Path::new("/definitely/not/a/dir"));
        assert_eq!(map.len(), BUILTIN_PRESETS.len());
        assert!(map.values().all(Option::is_none));
    }

    #[test]
    fn test_scans_pkl_files_only() {
        let dir = std::env::temp_dir().join("latentdrag_ckpt_test");
        let _ = std::fs::create_dir_all(&dir);
        std::fs::write(dir.join("stylegan2_lions_512.pkl"), b"x").unwrap();
        std::fs::write(dir.join("notes.txt"), b"x").unwrap();

        let map = discover(&dir);
        assert_eq!(map.len(), 1);
        assert!(map.contains_key("stylegan2_lions_512"));
        assert!(map["stylegan2_lions_512"].is_some());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
