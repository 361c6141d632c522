use std::io::{BufWriter, Write};
use std::path::Path;

use image::{ImageFormat, RgbImage};

use crate::foundation::error::{PosterError, PosterResult};

/// Encoder chosen from the destination extension.
pub(crate) fn output_format(path: &Path) -> PosterResult<ImageFormat> {
    ImageFormat::from_path(path).map_err(|e| {
        PosterError::validation(format!(
            "cannot infer image format from '{}': {e}",
            path.display()
        ))
    })
}

/// Encode `img` into a sibling temp file and rename it over `path`.
///
/// Readers of `path` see either the previous complete file or the new one.
pub(crate) fn write_atomic(img: &RgbImage, path: &Path, format: ImageFormat) -> PosterResult<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".postershow-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    {
        let mut w = BufWriter::new(tmp.as_file_mut());
        img.write_to(&mut w, format).map_err(|e| {
            PosterError::render(format!("encode {format:?} for '{}': {e}", path.display()))
        })?;
        w.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| PosterError::Io(e.error))?;
    Ok(())
}
