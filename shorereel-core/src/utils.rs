//! Small helpers shared across the pipeline.

use std::path::{Path, PathBuf};

use crate::error::{CoreError, CoreResult};

/// Derives a display title from a source file name: extension dropped,
/// dashes/underscores become spaces, each word capitalized. Computed
/// once at record creation and never recomputed.
pub fn derive_title(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    stem.split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Moves `src` into `dir`, appending `-1`, `-2`, ... to the stem if the
/// name is already taken. Returns the final destination path.
pub fn move_into_unique(src: &Path, dir: &Path) -> CoreResult<PathBuf> {
    let file_name = src
        .file_name()
        .ok_or_else(|| CoreError::InvalidPath(format!("no file name in {}", src.display())))?;

    let mut dest = dir.join(file_name);
    let stem = src
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = src
        .extension()
        .map(|e| e.to_string_lossy().into_owned());

    let mut counter = 1;
    while dest.exists() {
        let candidate = match &ext {
            Some(ext) => format!("{stem}-{counter}.{ext}"),
            None => format!("{stem}-{counter}"),
        };
        dest = dir.join(candidate);
        counter += 1;
    }

    std::fs::rename(src, &dest)?;
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_from_dashed_filename() {
        assert_eq!(
            derive_title(Path::new("/tmp/sunset-over_the-bay.mp4")),
            "Sunset Over The Bay"
        );
    }

    #[test]
    fn title_keeps_inner_capitalization() {
        assert_eq!(derive_title(Path::new("GoPro-clip.mov")), "GoPro Clip");
    }

    #[test]
    fn move_into_unique_suffixes_on_collision() {
        let dir = tempfile::tempdir().unwrap();
        let hold = dir.path().join("hold");
        std::fs::create_dir(&hold).unwrap();
        std::fs::write(hold.join("clip.mp4"), b"old").unwrap();

        let src = dir.path().join("clip.mp4");
        std::fs::write(&src, b"new").unwrap();

        let dest = move_into_unique(&src, &hold).unwrap();
        assert_eq!(dest.file_name().unwrap(), "clip-1.mp4");
        assert!(!src.exists());
        assert_eq!(std::fs::read(hold.join("clip.mp4")).unwrap(), b"old");
        assert_eq!(std::fs::read(&dest).unwrap(), b"new");
    }
}
