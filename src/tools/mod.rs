//! Image loading and dataset walking shared by the CLI, benches and tests.

use crate::error::{Result, ScanError};
use image::DynamicImage;
use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Extensions picked up when scanning a directory
pub const IMAGE_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "gif", "bmp", "tif", "tiff"];

/// Source name that reads the image from standard input
pub const STDIN_SOURCE: &str = "-";

/// Load an image file.
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    image::open(path).map_err(|source| ScanError::ImageLoad {
        path: path.to_path_buf(),
        source,
    })
}

/// Decode an in-memory encoded image (PNG, JPEG, ...).
pub fn load_image_bytes(bytes: &[u8], label: &str) -> Result<DynamicImage> {
    image::load_from_memory(bytes).map_err(|source| ScanError::ImageDecode {
        label: label.to_string(),
        source,
    })
}

/// Load from a path, or from stdin when `source` is `-`.
pub fn load_image_source(source: &str) -> Result<DynamicImage> {
    if source == STDIN_SOURCE {
        let mut bytes = Vec::new();
        io::stdin().lock().read_to_end(&mut bytes)?;
        load_image_bytes(&bytes, "stdin")
    } else {
        load_image(Path::new(source))
    }
}

/// Whether `path` has one of [`IMAGE_EXTENSIONS`] (case-insensitive)
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Default dataset root from `QR_DATASET_ROOT`.
pub fn dataset_root_from_env() -> PathBuf {
    env::var("QR_DATASET_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("benches/images"))
}

/// Image limit from `QR_BENCH_LIMIT`; unset or `0` means the whole dataset.
pub fn bench_limit_from_env() -> Option<usize> {
    match env::var("QR_BENCH_LIMIT") {
        Ok(value) => value.parse::<usize>().ok().filter(|&v| v != 0),
        Err(_) => None,
    }
}

/// Smoke test flag from `QR_SMOKE`.
pub fn smoke_from_env() -> bool {
    matches!(
        env::var("QR_SMOKE").as_deref(),
        Ok("1") | Ok("true") | Ok("TRUE") | Ok("yes") | Ok("YES")
    )
}

/// Sorted image paths under `root`, optionally restricted to the `_smoke.txt`
/// list and truncated to `limit`.
pub fn dataset_iter<P: AsRef<Path>>(
    root: P,
    limit: Option<usize>,
    smoke: bool,
) -> impl Iterator<Item = PathBuf> {
    let root = root.as_ref();
    let mut images = if smoke {
        load_smoke_list(root).unwrap_or_else(|| collect_images(root))
    } else {
        collect_images(root)
    };

    images.sort();
    if let Some(limit) = limit {
        images.truncate(limit);
    }
    images.into_iter()
}

fn load_smoke_list(root: &Path) -> Option<Vec<PathBuf>> {
    let contents = fs::read_to_string(root.join("_smoke.txt")).ok()?;
    let mut paths = Vec::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let candidate = Path::new(line);
        let path = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            root.join(candidate)
        };
        if path.exists() {
            paths.push(path);
        }
    }
    if paths.is_empty() { None } else { Some(paths) }
}

/// Every image file below `root`, recursively; unreadable directories are skipped.
pub fn collect_images(root: &Path) -> Vec<PathBuf> {
    let mut stack = vec![root.to_path_buf()];
    let mut images = Vec::new();

    while let Some(dir) = stack.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) => {
                log::debug!("skipping {}: {err}", dir.display());
                continue;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if is_image_path(&path) {
                images.push(path);
            }
        }
    }

    images
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn extension_filter() {
        assert!(is_image_path(Path::new("a/frame.PNG")));
        assert!(is_image_path(Path::new("scan.tiff")));
        assert!(!is_image_path(Path::new("notes.txt")));
        assert!(!is_image_path(Path::new("README")));
    }

    #[test]
    fn dataset_iter_recurses_sorts_and_limits() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("b.jpg"));
        touch(&dir.path().join("nested/a.png"));
        touch(&dir.path().join("nested/skip.csv"));
        touch(&dir.path().join("c.bmp"));

        let all: Vec<PathBuf> = dataset_iter(dir.path(), None, false).collect();
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0] <= w[1]));

        assert_eq!(dataset_iter(dir.path(), Some(2), false).count(), 2);
    }

    #[test]
    fn smoke_list_restricts_images() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("one.png"));
        touch(&dir.path().join("two.png"));
        fs::write(dir.path().join("_smoke.txt"), "# quick set\ntwo.png\nmissing.png\n").unwrap();

        let smoke: Vec<PathBuf> = dataset_iter(dir.path(), None, true).collect();
        assert_eq!(smoke, vec![dir.path().join("two.png")]);
    }

    #[test]
    fn load_errors_name_the_path() {
        let err = load_image(Path::new("/nonexistent/frame.png")).unwrap_err();
        assert_eq!(err.to_string(), "Could not load image from /nonexistent/frame.png");
    }

    #[test]
    fn load_from_memory() {
        let mut bytes = Vec::new();
        GrayImage::from_pixel(4, 3, Luma([9]))
            .write_to(&mut io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        let image = load_image_bytes(&bytes, "upload").unwrap();
        assert_eq!((image.width(), image.height()), (4, 3));

        let err = load_image_bytes(b"not an image", "upload").unwrap_err();
        assert!(matches!(err, ScanError::ImageDecode { .. }));
    }
}
