//! Fetcher: asks the media server what the target user is watching and publishes its poster.

use std::path::Path;

use crate::config::{FetchConfig, PosterStyle};
use crate::foundation::error::PosterResult;
use crate::poster::{ComposeReport, PosterRequest, Year, compose};

mod cache;
mod jellyfin;

pub use cache::PosterCache;
pub use jellyfin::{JellyfinClient, NowPlayingItem};

/// The first session's playing item and who is playing it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NowPlaying {
    pub item: NowPlayingItem,
    pub user_name: String,
    pub user_id: String,
}

/// Extra metadata fetched per item.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ItemDetails {
    pub imdb_id: Option<String>,
    pub tagline: Option<String>,
}

impl ItemDetails {
    pub fn imdb_url(&self) -> Option<String> {
        self.imdb_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(|id| format!("https://www.imdb.com/title/{id}/"))
    }
}

/// Media-server queries the fetcher depends on.
pub trait MediaServer {
    fn now_playing(&self) -> PosterResult<Option<NowPlaying>>;
    fn item_details(&self, item_id: &str, user_id: &str) -> PosterResult<ItemDetails>;
    fn download_primary_image(&self, item_id: &str, dest: &Path) -> PosterResult<()>;
}

/// What one fetch cycle decided.
#[derive(Clone, Debug, PartialEq)]
pub enum FetchOutcome {
    NothingPlaying,
    OtherUser(String),
    NotAMovie(Option<String>),
    AlreadyShown,
    Published(ComposeReport),
}

pub struct Fetcher<M> {
    server: M,
    cfg: FetchConfig,
    style: PosterStyle,
}

impl<M: MediaServer> Fetcher<M> {
    pub fn new(server: M, cfg: FetchConfig, style: PosterStyle) -> Self {
        Self { server, cfg, style }
    }

    /// Run one poll of the media server, composing a poster when the movie changed.
    ///
    /// The cache is only updated after the poster was published.
    pub fn run_once(&self) -> PosterResult<FetchOutcome> {
        let Some(now) = self.server.now_playing()? else {
            tracing::info!("no media is currently playing");
            return Ok(FetchOutcome::NothingPlaying);
        };
        if now.user_name != self.cfg.target_user {
            tracing::info!(user = %now.user_name, target = %self.cfg.target_user, "playing for another user");
            return Ok(FetchOutcome::OtherUser(now.user_name));
        }
        if now.item.kind.as_deref() != Some("Movie") {
            tracing::info!(kind = ?now.item.kind, "current media is not a movie");
            return Ok(FetchOutcome::NotAMovie(now.item.kind));
        }

        let item = &now.item;
        let image_tag = item.primary_image_tag();
        let mut cache = PosterCache::load(&self.cfg.cache_path)?;
        if cache.matches(&item.id, image_tag) {
            tracing::info!(item = %item.id, "poster already shown");
            return Ok(FetchOutcome::AlreadyShown);
        }

        let details = self.server.item_details(&item.id, &now.user_id)?;
        self.server
            .download_primary_image(&item.id, &self.cfg.raw_poster_path)?;

        let request = PosterRequest {
            raw_image_path: self.cfg.raw_poster_path.clone(),
            title: item
                .name
                .clone()
                .unwrap_or_else(|| "Unknown Title".to_string()),
            year: Year::from(item.production_year),
            tagline: details.tagline.clone(),
            external_url: details.imdb_url(),
            output_path: self.cfg.output_path.clone(),
        };
        let report = compose(&request, &self.style)?;

        cache.item_id = Some(item.id.clone());
        cache.image_tag = image_tag.map(str::to_string);
        cache.save(&self.cfg.cache_path)?;
        Ok(FetchOutcome::Published(report))
    }
}
