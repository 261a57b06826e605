use serde::{Deserialize, Serialize};

use crate::constants::{
    AMBIENT_PREFS_KEY, CONSTRAINED_ALPHA_CAP, CONSTRAINED_DENSITY_MAX, CONSTRAINED_DENSITY_MIN,
    OPACITY_SCALE, SPAWN_ENABLED_KEY,
};
use crate::storage::KeyValueStore;

/// What the page knows about the device it is running on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceProfile {
    pub touch: bool,
    pub narrow: bool,
}

impl DeviceProfile {
    pub fn desktop() -> Self {
        Self::default()
    }

    pub fn is_constrained(&self) -> bool {
        self.touch || self.narrow
    }
}

/// Slider positions that survive a reload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmbientPrefs {
    pub density: f64,
    pub opacity: f64,
}

impl AmbientPrefs {
    pub fn load(store: &impl KeyValueStore) -> Option<Self> {
        let raw = store.get(AMBIENT_PREFS_KEY)?;
        match serde_json::from_str::<Self>(&raw) {
            Ok(prefs) if prefs.density.is_finite() && prefs.opacity.is_finite() => Some(prefs),
            Ok(_) => None,
            Err(e) => {
                log::warn!("Ignoring stored ambient preferences: {}", e);
                None
            }
        }
    }

    pub fn save(&self, store: &mut impl KeyValueStore) {
        match serde_json::to_string(self) {
            Ok(raw) => store.set(AMBIENT_PREFS_KEY, &raw),
            Err(e) => log::warn!("Failed to encode ambient preferences: {}", e),
        }
    }
}

/// Live parameters of the background animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientSettings {
    pub density: f64,
    pub opacity: f64,
    pub alpha_multiplier: f64,
    pub enabled: bool,
    constrained: bool,
}

impl AmbientSettings {
    pub fn new(density: f64, opacity: f64) -> Self {
        Self {
            density: density.max(0.0),
            opacity,
            alpha_multiplier: opacity / OPACITY_SCALE,
            enabled: true,
            constrained: false,
        }
    }

    pub fn is_constrained(&self) -> bool {
        self.constrained
    }

    pub fn set_opacity(&mut self, opacity: f64) {
        self.opacity = opacity;
        self.alpha_multiplier = opacity / OPACITY_SCALE;
        if self.constrained {
            self.alpha_multiplier = self.alpha_multiplier.min(CONSTRAINED_ALPHA_CAP);
        }
    }

    /// Flips the animation on or off. Returns the new state, or `None` when
    /// the device was downgraded and the animation stays off.
    pub fn toggle_enabled(&mut self) -> Option<bool> {
        if self.constrained {
            return None;
        }
        self.enabled = !self.enabled;
        Some(self.enabled)
    }

    pub fn set_density(&mut self, density: f64) {
        self.density = density.max(0.0);
    }

    pub fn prefs(&self) -> AmbientPrefs {
        AmbientPrefs {
            density: self.density,
            opacity: self.opacity,
        }
    }

    /// One-way downgrade for touch or narrow devices.
    pub fn constrain(&mut self) {
        self.density = self.density.clamp(CONSTRAINED_DENSITY_MIN, CONSTRAINED_DENSITY_MAX);
        self.alpha_multiplier = self.alpha_multiplier.min(CONSTRAINED_ALPHA_CAP);
        self.enabled = false;
        self.constrained = true;
    }
}

/// Reads the persisted spawn flag. Only an explicit `"0"` disables spawning.
pub fn load_spawn_enabled(store: &impl KeyValueStore) -> bool {
    store.get(SPAWN_ENABLED_KEY).as_deref() != Some("0")
}

pub fn save_spawn_enabled(store: &mut impl KeyValueStore, enabled: bool) {
    store.set(SPAWN_ENABLED_KEY, if enabled { "1" } else { "0" });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_alpha_multiplier_tracks_opacity() {
        let mut settings = AmbientSettings::new(20.0, 0.9);
        assert!((settings.alpha_multiplier - 30.0).abs() < 1e-9);
        settings.set_opacity(0.3);
        assert!((settings.alpha_multiplier - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_constrain() {
        let mut settings = AmbientSettings::new(20.0, 0.9);
        settings.constrain();
        assert_eq!(settings.density, 8.0);
        assert_eq!(settings.alpha_multiplier, 6.0);
        assert!(!settings.enabled);
        assert_eq!(settings.toggle_enabled(), None);
        settings.set_opacity(1.0);
        assert_eq!(settings.alpha_multiplier, 6.0);

        let mut sparse = AmbientSettings::new(1.0, 0.09);
        sparse.constrain();
        assert_eq!(sparse.density, 4.0);
        assert!(sparse.alpha_multiplier < 6.0);
    }

    #[test]
    fn test_spawn_flag_defaults_on() {
        let mut store = MemoryStore::new();
        assert!(load_spawn_enabled(&store));
        save_spawn_enabled(&mut store, false);
        assert_eq!(store.get(SPAWN_ENABLED_KEY).as_deref(), Some("0"));
        assert!(!load_spawn_enabled(&store));
        let junk = MemoryStore::new().with_entry(SPAWN_ENABLED_KEY, "yes");
        assert!(load_spawn_enabled(&junk));
    }

    #[test]
    fn test_prefs_ignore_garbage() {
        let store = MemoryStore::new().with_entry(AMBIENT_PREFS_KEY, "{\"density\":");
        assert_eq!(AmbientPrefs::load(&store), None);
    }

    #[test]
    fn test_device_profile() {
        assert!(!DeviceProfile::desktop().is_constrained());
        assert!(DeviceProfile { touch: true, narrow: false }.is_constrained());
        assert!(DeviceProfile { touch: false, narrow: true }.is_constrained());
    }
}
