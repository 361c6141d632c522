use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::foundation::error::{PosterError, PosterResult};

/// Identity of the last poster published by the fetcher.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosterCache {
    #[serde(default)]
    pub item_id: Option<String>,
    #[serde(default)]
    pub image_tag: Option<String>,
}

impl PosterCache {
    /// Read the cache file; a missing file is an empty cache.
    pub fn load(path: &Path) -> PosterResult<Self> {
        let f = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_reader(BufReader::new(f)).map_err(|e| {
            PosterError::validation(format!("parse cache '{}': {e}", path.display()))
        })
    }

    pub fn save(&self, path: &Path) -> PosterResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut w = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut w, self)
            .map_err(|e| PosterError::Other(anyhow::Error::new(e)))?;
        w.flush()?;
        Ok(())
    }

    /// `true` when `item_id`/`image_tag` is the poster already published.
    pub fn matches(&self, item_id: &str, image_tag: Option<&str>) -> bool {
        self.item_id.as_deref() == Some(item_id) && self.image_tag.as_deref() == image_tag
    }
}
