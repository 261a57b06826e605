use serde::{Deserialize, Serialize};

/// One playlist entry. The duration is not part of the track: it is unknown
/// until the asset's metadata loads and is cached on the `Playlist`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Track {
    pub title: String,
    pub src: String,
}

impl Track {
    pub fn new(title: &str, src: &str) -> Self {
        Self {
            title: title.to_string(),
            src: src.to_string(),
        }
    }
}

/// What to do once the current track finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndAction {
    Replay,
    Advance(usize),
}

/// Fixed, ordered track list with a single cursor.
#[derive(Debug, Clone)]
pub struct Playlist {
    tracks: Vec<Track>,
    durations: Vec<Option<f64>>,
    current: usize,
    looping: bool,
}

impl Playlist {
    /// Callers guarantee a non-empty list (`PageConfig` validates it).
    pub fn new(tracks: Vec<Track>) -> Self {
        let durations = vec![None; tracks.len()];
        Self {
            tracks,
            durations,
            current: 0,
            looping: false,
        }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> &Track {
        &self.tracks[self.current]
    }

    pub fn track(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn toggle_loop(&mut self) -> bool {
        self.looping = !self.looping;
        self.looping
    }

    pub fn next_index(&self) -> usize {
        (self.current + 1) % self.tracks.len()
    }

    pub fn prev_index(&self) -> usize {
        (self.current + self.tracks.len() - 1) % self.tracks.len()
    }

    /// Moves the cursor. Out-of-range indices are ignored.
    pub fn select(&mut self, index: usize) -> Option<&Track> {
        if index >= self.tracks.len() {
            return None;
        }
        self.current = index;
        Some(&self.tracks[index])
    }

    pub fn on_ended(&self) -> EndAction {
        if self.looping {
            EndAction::Replay
        } else {
            EndAction::Advance(self.next_index())
        }
    }

    pub fn duration(&self, index: usize) -> Option<f64> {
        self.durations.get(index).copied().flatten()
    }

    /// Caches a probed duration. Returns false for unknown indices or
    /// unusable values.
    pub fn record_duration(&mut self, index: usize, seconds: f64) -> bool {
        if !seconds.is_finite() || seconds < 0.0 {
            return false;
        }
        match self.durations.get_mut(index) {
            Some(slot) => {
                *slot = Some(seconds);
                true
            }
            None => false,
        }
    }
}

/// `mm:ss`, both parts zero-padded. Unknown durations (NaN, infinite, zero or
/// negative) render as `00:00`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "00:00".to_string();
    }
    let minutes = (seconds / 60.0).floor() as u64;
    let secs = (seconds % 60.0).floor() as u64;
    format!("{:02}:{:02}", minutes, secs)
}

/// Horizontal click position inside the progress bar as a fraction in [0, 1].
pub fn seek_fraction(click_x: f64, rect_left: f64, rect_width: f64) -> f64 {
    if rect_width <= 0.0 || !rect_width.is_finite() {
        return 0.0;
    }
    ((click_x - rect_left) / rect_width).clamp(0.0, 1.0)
}

/// Target playback time for a seek, or `None` while the duration is unknown.
pub fn seek_target(fraction: f64, duration: f64) -> Option<f64> {
    if !duration.is_finite() || duration <= 0.0 {
        return None;
    }
    Some(fraction.clamp(0.0, 1.0) * duration)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub percent: f64,
    pub label: String,
}

/// Fill width and `elapsed / total` label for a playback position update.
pub fn progress(current: f64, duration: f64) -> Option<Progress> {
    if !duration.is_finite() || duration <= 0.0 {
        return None;
    }
    Some(Progress {
        percent: (current / duration * 100.0).clamp(0.0, 100.0),
        label: time_label(current, duration),
    })
}

pub fn time_label(current: f64, duration: f64) -> String {
    format!("{} / {}", format_time(current), format_time(duration))
}

/// Rounded percentage shown next to the volume slider.
pub fn volume_label(volume: f64) -> String {
    let hundredths = (volume * 100.0).round() / 100.0;
    format!("{}%", (hundredths * 100.0).round() as i64)
}
