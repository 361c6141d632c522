//! Postershow renders the movie currently playing on a media server as a framed poster and
//! shows it full-screen, crossfading whenever it changes.
//!
//! - [`poster::compose`] turns a raw cover plus metadata into the published poster file
//! - [`display::DisplayLoop`] polls that file and presents it on a [`display::Screen`]
//! - [`fetch::Fetcher`] decides when to compose, based on the media server's sessions
#![forbid(unsafe_code)]

mod foundation;

pub mod config;
pub mod display;
pub mod fetch;
pub mod poster;

pub use crate::config::{AppConfig, AspectRatio, DisplayConfig, FetchConfig, PosterStyle, TextStyle};
pub use crate::display::{DisplayFrame, DisplayLoop, DisplayState, Screen, StepOutcome};
pub use crate::fetch::{FetchOutcome, Fetcher, JellyfinClient, MediaServer};
pub use crate::foundation::color::Rgb8;
pub use crate::foundation::error::{PosterError, PosterResult};
pub use crate::poster::{ComposeReport, PosterRequest, Year, compose};
