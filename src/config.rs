//! Explicit configuration passed to each component at construction.
//!
//! Every struct deserializes from JSON with per-field defaults, so a partial config file only has
//! to name the values it changes.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::foundation::color::Rgb8;
use crate::foundation::error::{PosterError, PosterResult};

/// Top-level configuration file layout.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub poster: PosterStyle,
    pub display: DisplayConfig,
    pub fetch: FetchConfig,
}

impl AppConfig {
    /// Read and validate a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> PosterResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            PosterError::validation(format!("open config '{}': {e}", path.display()))
        })?;
        let cfg: Self = serde_json::from_reader(BufReader::new(f)).map_err(|e| {
            PosterError::validation(format!("parse config '{}': {e}", path.display()))
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> PosterResult<()> {
        self.poster.validate()?;
        self.display.validate()
    }
}

/// Font file plus size and fill for one text element.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub font_path: PathBuf,
    pub size_px: f32,
    #[serde(default)]
    pub color: Rgb8,
}

/// Target width:height ratio of the framed layout before rotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl AspectRatio {
    pub const PORTRAIT_9_16: Self = Self {
        width: 9,
        height: 16,
    };
}

/// Layout constants of the framed poster.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PosterStyle {
    /// The raw poster is force-resized to this size, ignoring its own aspect ratio.
    pub working_width: u32,
    pub working_height: u32,

    pub bevel_thickness: u32,
    pub bevel_background: Rgb8,
    /// Top and left strips.
    pub bevel_dark: Rgb8,
    /// Bottom and right strips.
    pub bevel_light: Rgb8,

    pub passe_padding: u32,
    pub passe_background: Rgb8,

    pub title: TextStyle,
    pub title_margin_right: u32,
    pub title_margin_bottom: u32,

    pub qr_size_px: u32,
    pub qr_module_px: u32,
    pub qr_version: i16,
    pub qr_offset_left: u32,

    pub aspect: AspectRatio,

    pub tagline: TextStyle,
    pub tagline_margin_x: u32,
    pub tagline_margin_bottom: u32,
}

impl Default for PosterStyle {
    fn default() -> Self {
        Self {
            working_width: 2000,
            working_height: 3000,
            bevel_thickness: 10,
            bevel_background: Rgb8::WHITE,
            bevel_dark: Rgb8::gray(160),
            bevel_light: Rgb8::gray(230),
            passe_padding: 80,
            passe_background: Rgb8::gray(0xf8),
            title: TextStyle {
                font_path: PathBuf::from("nexa.ttf"),
                size_px: 30.0,
                color: Rgb8::BLACK,
            },
            title_margin_right: 85,
            title_margin_bottom: 55,
            qr_size_px: 80,
            qr_module_px: 2,
            qr_version: 2,
            qr_offset_left: 82,
            aspect: AspectRatio::PORTRAIT_9_16,
            tagline: TextStyle {
                font_path: PathBuf::from("melodrame.ttf"),
                size_px: 70.0,
                color: Rgb8::BLACK,
            },
            tagline_margin_x: 240,
            tagline_margin_bottom: 75,
        }
    }
}

impl PosterStyle {
    pub fn validate(&self) -> PosterResult<()> {
        if self.working_width == 0 || self.working_height == 0 {
            return Err(PosterError::validation(
                "poster working size must be non-zero",
            ));
        }
        if self.aspect.width == 0 || self.aspect.height == 0 {
            return Err(PosterError::validation(
                "poster aspect ratio must be non-zero",
            ));
        }
        for (name, t) in [("title", &self.title), ("tagline", &self.tagline)] {
            if !t.size_px.is_finite() || t.size_px <= 0.0 {
                return Err(PosterError::validation(format!(
                    "{name} size_px must be finite and > 0"
                )));
            }
        }
        if self.qr_size_px == 0 || self.qr_module_px == 0 {
            return Err(PosterError::validation("qr sizes must be non-zero"));
        }
        if !(1..=40).contains(&self.qr_version) {
            return Err(PosterError::validation("qr_version must be in 1..=40"));
        }
        Ok(())
    }
}

/// Display loop settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub poster_path: PathBuf,
    pub poll_interval_secs: f64,
    pub fade_duration_secs: f64,
    pub fps: f64,
    pub window_title: String,
    /// Fixed surface size; `None` uses the primary monitor size.
    pub size_override: Option<(u32, u32)>,
    pub hide_cursor: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            poster_path: PathBuf::from("poster_final.jpg"),
            poll_interval_secs: 15.0,
            fade_duration_secs: 1.0,
            fps: 30.0,
            window_title: "postershow".to_string(),
            size_override: None,
            hide_cursor: true,
        }
    }
}

impl DisplayConfig {
    pub fn validate(&self) -> PosterResult<()> {
        if !self.fps.is_finite() || self.fps <= 0.0 {
            return Err(PosterError::validation("display fps must be finite and > 0"));
        }
        if !self.poll_interval_secs.is_finite() || self.poll_interval_secs <= 0.0 {
            return Err(PosterError::validation(
                "poll_interval_secs must be finite and > 0",
            ));
        }
        if !self.fade_duration_secs.is_finite() || self.fade_duration_secs < 0.0 {
            return Err(PosterError::validation(
                "fade_duration_secs must be finite and >= 0",
            ));
        }
        if let Some((w, h)) = self.size_override
            && (w == 0 || h == 0)
        {
            return Err(PosterError::validation("size_override must be non-zero"));
        }
        for (name, secs) in [
            ("poll_interval_secs", self.poll_interval_secs),
            ("fade_duration_secs", self.fade_duration_secs),
            ("1 / fps", 1.0 / self.fps),
        ] {
            Duration::try_from_secs_f64(secs).map_err(|e| {
                PosterError::validation(format!("{name} is not a representable duration: {e}"))
            })?;
        }
        Ok(())
    }

    /// Saturates at `Duration::MAX` for values `validate` rejects.
    pub fn poll_interval(&self) -> Duration {
        secs_or_max(self.poll_interval_secs)
    }

    pub fn fade_duration(&self) -> Duration {
        secs_or_max(self.fade_duration_secs)
    }

    pub fn frame_duration(&self) -> Duration {
        secs_or_max(1.0 / self.fps)
    }
}

fn secs_or_max(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

/// Media-server fetcher settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub server_url: String,
    pub api_key: String,
    pub target_user: String,
    pub cache_path: PathBuf,
    pub raw_poster_path: PathBuf,
    pub output_path: PathBuf,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8096".to_string(),
            api_key: String::new(),
            target_user: String::new(),
            cache_path: PathBuf::from("poster_cache.json"),
            raw_poster_path: PathBuf::from("poster.jpg"),
            output_path: PathBuf::from("poster_final.jpg"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_validate() {
        AppConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: AppConfig = serde_json::from_value(json!({
            "poster": { "passe_padding": 40, "bevel_dark": "#101010" },
            "display": { "fps": 60.0 }
        }))
        .unwrap();
        assert_eq!(cfg.poster.passe_padding, 40);
        assert_eq!(cfg.poster.bevel_dark, Rgb8::gray(16));
        assert_eq!(cfg.poster.working_width, 2000);
        assert_eq!(cfg.display.fps, 60.0);
        assert_eq!(cfg.display.poll_interval_secs, 15.0);
        assert_eq!(cfg.fetch.cache_path, PathBuf::from("poster_cache.json"));
    }

    #[test]
    fn rejects_nonsense_values() {
        let mut style = PosterStyle::default();
        style.aspect.height = 0;
        assert!(style.validate().is_err());

        let mut style = PosterStyle::default();
        style.tagline.size_px = f32::NAN;
        assert!(style.validate().is_err());

        let display = DisplayConfig {
            fps: 0.0,
            ..Default::default()
        };
        assert!(display.validate().is_err());

        let display = DisplayConfig {
            size_override: Some((0, 10)),
            ..Default::default()
        };
        assert!(display.validate().is_err());
    }

    #[test]
    fn unrepresentable_durations_are_rejected() {
        let display = DisplayConfig {
            poll_interval_secs: 1e20,
            ..Default::default()
        };
        assert!(display.validate().is_err());
        assert_eq!(display.poll_interval(), Duration::MAX);

        let display = DisplayConfig {
            fps: 1e-300,
            ..Default::default()
        };
        assert!(display.validate().is_err());
        assert_eq!(display.frame_duration(), Duration::MAX);

        let display = DisplayConfig {
            fade_duration_secs: 1e30,
            ..Default::default()
        };
        assert!(display.validate().is_err());
    }

    #[test]
    fn durations_follow_seconds() {
        let d = DisplayConfig::default();
        assert_eq!(d.poll_interval(), Duration::from_secs(15));
        assert_eq!(d.fade_duration(), Duration::from_secs(1));
        assert!((d.frame_duration().as_secs_f64() - 1.0 / 30.0).abs() < 1e-9);
    }
}
