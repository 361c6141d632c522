use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::fetch::{ItemDetails, MediaServer, NowPlaying};
use crate::foundation::error::{PosterError, PosterResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SessionInfo {
    #[serde(default)]
    now_playing_item: Option<NowPlayingItem>,
    #[serde(default)]
    user_name: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
}

/// Subset of a session's `NowPlayingItem`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NowPlayingItem {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "Type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub production_year: Option<i32>,
    #[serde(default)]
    pub image_tags: HashMap<String, String>,
}

impl NowPlayingItem {
    pub fn primary_image_tag(&self) -> Option<&str> {
        self.image_tags.get("Primary").map(String::as_str)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ItemResponse {
    #[serde(default)]
    provider_ids: HashMap<String, String>,
    #[serde(default)]
    taglines: Vec<String>,
}

/// Blocking Jellyfin REST client authenticated with an API key.
pub struct JellyfinClient {
    base_url: String,
    api_key: String,
    http: reqwest::blocking::Client,
}

impl JellyfinClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> PosterResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| PosterError::fetch(format!("build http client: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            http,
        })
    }

    fn get(&self, path: &str) -> reqwest::blocking::RequestBuilder {
        self.http
            .get(format!("{}{path}", self.base_url))
            .header("X-Emby-Token", &self.api_key)
    }
}

fn http_err(what: &str) -> impl FnOnce(reqwest::Error) -> PosterError + '_ {
    move |e| PosterError::fetch(format!("{what}: {e}"))
}

impl MediaServer for JellyfinClient {
    fn now_playing(&self) -> PosterResult<Option<NowPlaying>> {
        let sessions: Vec<SessionInfo> = self
            .get("/Sessions")
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(http_err("query sessions"))?
            .json()
            .map_err(http_err("parse sessions"))?;

        // Only the first session is considered.
        let Some(session) = sessions.into_iter().next() else {
            return Ok(None);
        };
        let Some(item) = session.now_playing_item else {
            return Ok(None);
        };
        Ok(Some(NowPlaying {
            item,
            user_name: session.user_name.unwrap_or_default(),
            user_id: session.user_id.unwrap_or_default(),
        }))
    }

    fn item_details(&self, item_id: &str, user_id: &str) -> PosterResult<ItemDetails> {
        let resp: ItemResponse = self
            .get(&format!("/Items/{item_id}"))
            .query(&[("fields", "ProviderIds,Taglines"), ("userId", user_id)])
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(http_err("query item details"))?
            .json()
            .map_err(http_err("parse item details"))?;
        Ok(ItemDetails {
            imdb_id: resp.provider_ids.get("Imdb").cloned(),
            tagline: resp.taglines.into_iter().next(),
        })
    }

    fn download_primary_image(&self, item_id: &str, dest: &Path) -> PosterResult<()> {
        let resp = self
            .get(&format!("/Items/{item_id}/Images/Primary"))
            .send()
            .map_err(http_err("download poster"))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(PosterError::fetch(format!(
                "poster download failed with status {status}"
            )));
        }
        let bytes = resp.bytes().map_err(http_err("read poster body"))?;
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(dest, &bytes)?;
        tracing::debug!(bytes = bytes.len(), path = %dest.display(), "poster downloaded");
        Ok(())
    }
}
