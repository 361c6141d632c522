use std::path::{Path, PathBuf};
use std::time::SystemTime;

use image::RgbImage;

use crate::foundation::error::{PosterError, PosterResult};

/// Identity of one published poster file: its modification time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PosterVersion(pub SystemTime);

/// Where the display loop learns about new posters.
pub trait UpdateSource {
    /// Version currently published, or `None` when nothing is there yet.
    fn poll_for_update(&mut self) -> Option<PosterVersion>;

    /// Decode the poster for `version`.
    fn load(&mut self, version: PosterVersion) -> PosterResult<RgbImage>;
}

/// Watches the poster file's modification time.
#[derive(Clone, Debug)]
pub struct FileUpdateSource {
    path: PathBuf,
}

impl FileUpdateSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl UpdateSource for FileUpdateSource {
    fn poll_for_update(&mut self) -> Option<PosterVersion> {
        std::fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .ok()
            .map(PosterVersion)
    }

    fn load(&mut self, _version: PosterVersion) -> PosterResult<RgbImage> {
        let img = image::ImageReader::open(&self.path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| {
                PosterError::decode(format!("decode poster '{}': {e}", self.path.display()))
            })?;
        Ok(img.to_rgb8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_has_no_version() {
        let dir = tempfile::tempdir().unwrap();
        let mut src = FileUpdateSource::new(dir.path().join("poster_final.jpg"));
        assert_eq!(src.poll_for_update(), None);
    }

    #[test]
    fn existing_file_loads_as_rgb() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("poster_final.png");
        RgbImage::from_pixel(4, 3, image::Rgb([7, 8, 9]))
            .save(&path)
            .unwrap();

        let mut src = FileUpdateSource::new(&path);
        let version = src.poll_for_update().expect("version");
        let img = src.load(version).unwrap();
        assert_eq!(img.dimensions(), (4, 3));
        assert_eq!(img.get_pixel(0, 0).0, [7, 8, 9]);
    }

    #[test]
    fn garbage_file_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("poster_final.jpg");
        std::fs::write(&path, b"not an image").unwrap();

        let mut src = FileUpdateSource::new(&path);
        let version = src.poll_for_update().unwrap();
        assert!(src.load(version).is_err());
    }
}
