use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_VOLUME, TOAST_DURATION_MS, TOKEN_LIFETIME_MS, TOKEN_SPAWN_INTERVAL_MS,
};
use crate::error::PageError;
use crate::shared_playlist::Track;

/// Tunables for one page instance. Every field falls back to the value the
/// hand-authored page shipped with, so a partial JSON block only overrides
/// what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub tracks: Vec<Track>,
    /// Prefix prepended to relative track sources.
    pub asset_base: String,
    /// Handle copied by the Discord button.
    pub handle: String,
    pub initial_volume: f64,
    /// Opacity slider position; the alpha multiplier is derived from it.
    pub initial_opacity: f64,
    pub initial_density: f64,
    pub spawn_interval_ms: u32,
    pub token_lifetime_ms: u32,
    pub toast_ms: u32,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            tracks: default_tracks(),
            asset_base: String::new(),
            handle: "paranoct".to_string(),
            initial_volume: DEFAULT_VOLUME,
            initial_opacity: 0.9,
            initial_density: 20.0,
            spawn_interval_ms: TOKEN_SPAWN_INTERVAL_MS,
            token_lifetime_ms: TOKEN_LIFETIME_MS,
            toast_ms: TOAST_DURATION_MS,
        }
    }
}

impl PageConfig {
    pub fn from_json(raw: &str) -> Result<Self, PageError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), PageError> {
        if self.tracks.is_empty() {
            return Err(PageError::Config("playlist must contain at least one track".to_string()));
        }
        if !(0.0..=1.0).contains(&self.initial_volume) {
            return Err(PageError::Config(format!(
                "initial_volume {} is outside 0..=1",
                self.initial_volume
            )));
        }
        if self.initial_density < 0.0 || !self.initial_density.is_finite() {
            return Err(PageError::Config("initial_density must be a non-negative number".to_string()));
        }
        for (name, ms) in [
            ("spawn_interval_ms", self.spawn_interval_ms),
            ("token_lifetime_ms", self.token_lifetime_ms),
            ("toast_ms", self.toast_ms),
        ] {
            if ms == 0 {
                return Err(PageError::Config(format!("{} must be greater than zero", name)));
            }
        }
        Ok(())
    }

    /// Resolves a track source against `asset_base`. Absolute URLs pass through.
    pub fn asset_url(&self, src: &str) -> String {
        if src.starts_with("http") || self.asset_base.is_empty() {
            src.to_string()
        } else {
            format!("{}/{}", self.asset_base.trim_end_matches('/'), src)
        }
    }
}

fn default_tracks() -> Vec<Track> {
    [
        ("Тёмный принц - Овердоз", "temnyy_princ_overdoz.mp3"),
        ("Тёмный принц - ПАПА", "PAPA.mp3"),
        ("KSB Music - Баратрум", "bara.mp3"),
        ("KSB Music - Я вытащу тебя со дна", "so_dna.mp3"),
        ("KSB Music - На урсе", "na_urse.mp3"),
        ("Drowning Love", "edit_aizen.mp3"),
        ("zxcursed, interworld - Metamarphosis 3", "meta3.mp3"),
        ("Серега Пират - АМ ФП", "AMFP.mp3"),
        ("Лида, Серега Пират - ЧСВ", "CHSV.mp3"),
        ("Серега Пират - Тильт", "TILT.mp3"),
        ("Napoleon's song - Amour Plastique", "napoleon.mp3"),
        ("Серега Пират - И я кричу остановите катку!", "KATKA.mp3"),
    ]
    .iter()
    .map(|(title, src)| Track::new(title, src))
    .collect()
}
