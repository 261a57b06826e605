use log::{debug, info};
use rand::Rng;

use crate::config::PageConfig;
use crate::constants::*;
use crate::settings::{
    load_spawn_enabled, save_spawn_enabled, AmbientPrefs, AmbientSettings, DeviceProfile,
};
use crate::shared_ambient::ParticleField;
use crate::shared_coin_game::{place_token, Rect, TokenId, TokenRegistry, Viewport, Wallet};
use crate::shared_playlist::{
    format_time, progress, seek_fraction, seek_target, time_label, volume_label, EndAction,
    Playlist,
};
use crate::shared_wheel_game::{fallback_delay_ms, Reward, SettleVia, SpinId, WheelGame};
use crate::storage::KeyValueStore;

/// Where a clipboard write was requested from. Each source has its own
/// failure message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopySource {
    Skill,
    Handle,
}

/// Everything the page reacts to, already reduced to plain data by the DOM
/// layer.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    Resize { width: f64, height: f64 },
    KeyDown { key: String, code: String },
    /// Escape seen by the capture-phase listener, ahead of every other handler.
    EscapeCapture,
    /// A click somewhere in the document; each flag says whether it landed
    /// outside that panel and its toggle button.
    DocumentClick { outside_settings: bool, outside_playlist: bool },

    PlayPressed,
    PlaybackChanged { playing: bool },
    PlaybackRejected,
    NextPressed,
    PrevPressed,
    TrackChosen(usize),
    TrackEnded,
    LoopPressed,
    PlaylistPressed,
    DurationProbed { index: usize, seconds: f64 },
    CurrentMetadataLoaded { seconds: f64 },
    TimeUpdate { current: f64, duration: f64 },
    SeekClick { click_x: f64, rect_left: f64, rect_width: f64, duration: f64 },

    SettingsPressed,
    VolumeInput(f64),
    OpacityInput(f64),
    DensityInput(f64),
    SpawnToggled(bool),

    /// Periodic spawn timer fired. Carries the layout measured at that moment.
    SpawnTick { viewport: Viewport, exclusions: Vec<Rect> },
    TokenPressed(TokenId),
    TokenExpired(TokenId),
    TokenFaded(TokenId),

    WheelOpenPressed,
    WheelClosePressed,
    WheelBackdropClicked,
    SpinPressed,
    SpinSettled { spin: SpinId, via: SettleVia },

    CopyRequested { text: String, source: CopySource },
    CopyFinished { text: String, source: CopySource, ok: bool },
}

/// DOM work requested by the session, applied in order by the frontend.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Toast(String),
    PreventDefault,
    StopPropagation,
    StopImmediatePropagation,

    SetCoinCount(u32),
    SetSpawnToggle(bool),
    HideMinigame,
    SyncSliders { volume: f64, opacity: f64, density: f64 },
    ShowSettings(bool),
    ShowPlaylist(bool),

    ShowWheel(bool),
    ResetWheel,
    SetWheelResult(String),
    SetSpinControls { busy: bool, label: &'static str },
    SpinStarted { spin: SpinId, target_deg: f64, duration_ms: u32, fallback_ms: u32 },
    SpinResolved(SpinId),

    SpawnToken { id: TokenId, x: f64, y: f64, lifetime_ms: u32 },
    CollectToken { id: TokenId, fade_ms: u32 },
    RemoveToken(TokenId),

    PrimeSource { src: String },
    TogglePlayback,
    SetPlayGlyph(&'static str),
    LoadTrack { index: usize, src: String, title: String },
    ShowTrack { index: usize, title: String },
    Replay,
    ProbeDuration { index: usize, src: String },
    SetTrackDuration { index: usize, text: String },
    SetTimeLabel(String),
    SetProgress { percent: f64, label: String },
    Seek(f64),
    SetVolume { volume: f64, label: String },
    SetMuted(bool),
    SetLoop(bool),
    WriteClipboard { text: String, source: CopySource },
}

/// Single owner of all mutable page state.
pub struct Session<S: KeyValueStore> {
    config: PageConfig,
    device: DeviceProfile,
    store: S,
    wallet: Wallet,
    wheel: WheelGame,
    tokens: TokenRegistry,
    ambient: AmbientSettings,
    field: ParticleField,
    playlist: Playlist,
    viewport: Viewport,
    spawn_enabled: bool,
    volume: f64,
    muted: bool,
    primed: bool,
    position: f64,
    settings_open: bool,
    playlist_open: bool,
    wheel_open: bool,
}

impl<S: KeyValueStore> Session<S> {
    pub fn new<R: Rng + ?Sized>(
        config: PageConfig,
        device: DeviceProfile,
        store: S,
        viewport: Viewport,
        rng: &mut R,
    ) -> Self {
        let wallet = Wallet::load(&store);
        let prefs = AmbientPrefs::load(&store).unwrap_or(AmbientPrefs {
            density: config.initial_density,
            opacity: config.initial_opacity,
        });
        let mut ambient = AmbientSettings::new(prefs.density, prefs.opacity);
        let mut spawn_enabled = load_spawn_enabled(&store);
        if device.is_constrained() {
            ambient.constrain();
            spawn_enabled = false;
            info!("Constrained device detected, ambient animation and minigame disabled");
        }
        let field = ParticleField::new(viewport.width, viewport.height, ambient.density, rng);
        let playlist = Playlist::new(config.tracks.clone());
        let volume = config.initial_volume;

        Self {
            config,
            device,
            store,
            wallet,
            wheel: WheelGame::new(),
            tokens: TokenRegistry::new(),
            ambient,
            field,
            playlist,
            viewport,
            spawn_enabled,
            volume,
            muted: false,
            primed: false,
            position: 0.0,
            settings_open: false,
            playlist_open: false,
            wheel_open: false,
        }
    }

    /// Initial UI sync, emitted once after the DOM is wired.
    pub fn boot(&mut self) -> Vec<Effect> {
        let mut effects = vec![
            Effect::SetCoinCount(self.wallet.balance()),
            Effect::SetSpawnToggle(self.spawn_enabled),
            Effect::SyncSliders {
                volume: self.volume,
                opacity: self.ambient.opacity,
                density: self.ambient.density,
            },
            Effect::SetVolume {
                volume: self.volume,
                label: volume_label(self.volume),
            },
            Effect::SetPlayGlyph(PLAY_GLYPH),
            Effect::ShowTrack {
                index: self.playlist.current_index(),
                title: self.playlist.current().title.clone(),
            },
        ];
        if self.device.is_constrained() {
            effects.push(Effect::HideMinigame);
        }
        for (index, track) in self.playlist.tracks().iter().enumerate() {
            effects.push(Effect::ProbeDuration {
                index,
                src: self.config.asset_url(&track.src),
            });
        }
        info!(
            "Session ready: {} coins, {} tracks, {} particles, spawn {}",
            self.wallet.balance(),
            self.playlist.len(),
            self.field.len(),
            if self.spawn_enabled { "on" } else { "off" }
        );
        effects
    }

    /// One animation frame. A disabled animation keeps its particles frozen.
    pub fn advance_frame<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.ambient.enabled {
            self.field.advance(rng);
        }
    }

    pub fn handle<R: Rng + ?Sized>(&mut self, event: PageEvent, rng: &mut R) -> Vec<Effect> {
        match event {
            PageEvent::Resize { width, height } => {
                self.viewport = Viewport { width, height };
                self.field.regenerate(width, height, self.ambient.density, rng);
                Vec::new()
            }
            PageEvent::KeyDown { key, code } => self.on_key(&key, &code),
            PageEvent::EscapeCapture => {
                if self.wheel.is_spinning() {
                    vec![
                        Effect::StopImmediatePropagation,
                        Effect::PreventDefault,
                        Effect::Toast(MSG_CANNOT_CLOSE_SPINNING.to_string()),
                    ]
                } else {
                    Vec::new()
                }
            }
            PageEvent::DocumentClick { outside_settings, outside_playlist } => {
                let mut effects = Vec::new();
                if outside_settings && self.settings_open {
                    self.settings_open = false;
                    effects.push(Effect::ShowSettings(false));
                }
                if outside_playlist && self.playlist_open {
                    self.playlist_open = false;
                    effects.push(Effect::ShowPlaylist(false));
                }
                effects
            }

            PageEvent::PlayPressed => self.toggle_playback(),
            PageEvent::PlaybackChanged { playing } => {
                vec![Effect::SetPlayGlyph(if playing { PAUSE_GLYPH } else { PLAY_GLYPH })]
            }
            PageEvent::PlaybackRejected => vec![Effect::Toast(MSG_PLAYBACK_FAILED.to_string())],
            PageEvent::NextPressed => self.load_track(self.playlist.next_index()),
            PageEvent::PrevPressed => self.load_track(self.playlist.prev_index()),
            PageEvent::TrackChosen(index) => {
                let mut effects = self.load_track(index);
                if !effects.is_empty() {
                    self.playlist_open = false;
                    effects.push(Effect::ShowPlaylist(false));
                }
                effects
            }
            PageEvent::TrackEnded => match self.playlist.on_ended() {
                EndAction::Replay => vec![Effect::Replay],
                EndAction::Advance(next) => self.load_track(next),
            },
            PageEvent::LoopPressed => vec![Effect::SetLoop(self.playlist.toggle_loop())],
            PageEvent::PlaylistPressed => {
                self.playlist_open = !self.playlist_open;
                vec![Effect::ShowPlaylist(self.playlist_open)]
            }
            PageEvent::DurationProbed { index, seconds } => self.on_duration(index, seconds),
            PageEvent::CurrentMetadataLoaded { seconds } => {
                self.on_duration(self.playlist.current_index(), seconds)
            }
            PageEvent::TimeUpdate { current, duration } => {
                self.position = current;
                match progress(current, duration) {
                    Some(p) => vec![Effect::SetProgress { percent: p.percent, label: p.label }],
                    None => Vec::new(),
                }
            }
            PageEvent::SeekClick { click_x, rect_left, rect_width, duration } => {
                let fraction = seek_fraction(click_x, rect_left, rect_width);
                seek_target(fraction, duration)
                    .map(|t| vec![Effect::Seek(t)])
                    .unwrap_or_default()
            }

            PageEvent::SettingsPressed => {
                self.settings_open = !self.settings_open;
                vec![Effect::ShowSettings(self.settings_open)]
            }
            PageEvent::VolumeInput(volume) => {
                self.volume = volume.clamp(0.0, 1.0);
                vec![Effect::SetVolume { volume: self.volume, label: volume_label(self.volume) }]
            }
            PageEvent::OpacityInput(opacity) => {
                self.ambient.set_opacity(opacity);
                self.ambient.prefs().save(&mut self.store);
                Vec::new()
            }
            PageEvent::DensityInput(density) => {
                self.ambient.set_density(density);
                self.field.regenerate(
                    self.viewport.width,
                    self.viewport.height,
                    self.ambient.density,
                    rng,
                );
                self.ambient.prefs().save(&mut self.store);
                debug!("Density {} -> {} particles", self.ambient.density, self.field.len());
                Vec::new()
            }
            PageEvent::SpawnToggled(enabled) => self.on_spawn_toggled(enabled),

            PageEvent::SpawnTick { viewport, exclusions } => {
                if !self.spawn_enabled {
                    return Vec::new();
                }
                let placement = place_token(viewport, &exclusions, rng);
                let id = self.tokens.spawn();
                debug!(
                    "Spawned token {:?} at ({}, {}) after {} attempts",
                    id, placement.x, placement.y, placement.attempts
                );
                vec![Effect::SpawnToken {
                    id,
                    x: placement.x,
                    y: placement.y,
                    lifetime_ms: self.config.token_lifetime_ms,
                }]
            }
            PageEvent::TokenPressed(id) => {
                let mut effects = vec![Effect::StopPropagation];
                if self.tokens.collect(id) {
                    let balance = self.wallet.credit(1, &mut self.store);
                    debug!("Collected token {:?}, balance {}", id, balance);
                    effects.push(Effect::CollectToken { id, fade_ms: TOKEN_COLLECT_FADE_MS });
                    effects.push(Effect::SetCoinCount(balance));
                    effects.push(Effect::Toast(MSG_TOKEN_COLLECTED.to_string()));
                }
                effects
            }
            PageEvent::TokenExpired(id) => {
                if self.tokens.expire(id) {
                    vec![Effect::RemoveToken(id)]
                } else {
                    Vec::new()
                }
            }
            PageEvent::TokenFaded(id) => {
                self.tokens.discard(id);
                vec![Effect::RemoveToken(id)]
            }

            PageEvent::WheelOpenPressed => {
                if self.device.is_constrained() {
                    return Vec::new();
                }
                self.wheel_open = true;
                vec![
                    Effect::ShowWheel(true),
                    Effect::ResetWheel,
                    Effect::SetWheelResult(String::new()),
                ]
            }
            PageEvent::WheelClosePressed => self.close_wheel(MSG_CANNOT_CLOSE_SPINNING),
            PageEvent::WheelBackdropClicked => self.close_wheel(MSG_CANNOT_LEAVE_SPINNING),
            PageEvent::SpinPressed => self.start_spin(rng),
            PageEvent::SpinSettled { spin, via } => self.settle_spin(spin, via),

            PageEvent::CopyRequested { text, source } => {
                if text.is_empty() {
                    return Vec::new();
                }
                vec![Effect::WriteClipboard { text, source }]
            }
            PageEvent::CopyFinished { text, source, ok } => {
                let msg = match (ok, source) {
                    (true, _) => format!("{}{}", MSG_COPIED, text),
                    (false, CopySource::Skill) => MSG_COPY_FAILED.to_string(),
                    (false, CopySource::Handle) => MSG_HANDLE_COPY_FAILED.to_string(),
                };
                vec![Effect::Toast(msg)]
            }
        }
    }

    fn on_key(&mut self, key: &str, code: &str) -> Vec<Effect> {
        let mut effects = Vec::new();
        if code == "Space" {
            effects.push(Effect::PreventDefault);
            effects.extend(self.toggle_playback());
        }
        match key {
            "s" | "S" => {
                if let Some(enabled) = self.ambient.toggle_enabled() {
                    let msg = if enabled { MSG_SNOW_ON } else { MSG_SNOW_OFF };
                    effects.push(Effect::Toast(msg.to_string()));
                }
            }
            "m" | "M" => {
                self.muted = !self.muted;
                effects.push(Effect::SetMuted(self.muted));
                let msg = if self.muted { MSG_MUTED } else { MSG_UNMUTED };
                effects.push(Effect::Toast(msg.to_string()));
            }
            "Escape" | "Esc" => {
                if self.settings_open {
                    self.settings_open = false;
                    effects.push(Effect::ShowSettings(false));
                }
            }
            _ => {}
        }
        effects
    }

    fn toggle_playback(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if !self.primed {
            self.primed = true;
            effects.push(Effect::PrimeSource {
                src: self.config.asset_url(&self.playlist.current().src),
            });
        }
        effects.push(Effect::TogglePlayback);
        effects
    }

    fn load_track(&mut self, index: usize) -> Vec<Effect> {
        let track = match self.playlist.select(index) {
            Some(track) => track.clone(),
            None => return Vec::new(),
        };
        self.primed = true;
        self.position = 0.0;
        debug!("Loading track {}: {}", index, track.title);
        vec![Effect::LoadTrack {
            index,
            src: self.config.asset_url(&track.src),
            title: track.title,
        }]
    }

    fn on_duration(&mut self, index: usize, seconds: f64) -> Vec<Effect> {
        if !self.playlist.record_duration(index, seconds) {
            return Vec::new();
        }
        let mut effects = vec![Effect::SetTrackDuration { index, text: format_time(seconds) }];
        if index == self.playlist.current_index() {
            effects.push(Effect::SetTimeLabel(time_label(self.position, seconds)));
        }
        effects
    }

    fn on_spawn_toggled(&mut self, enabled: bool) -> Vec<Effect> {
        if self.device.is_constrained() {
            return vec![Effect::SetSpawnToggle(false)];
        }
        self.spawn_enabled = enabled;
        save_spawn_enabled(&mut self.store, enabled);
        let msg = if enabled { MSG_SPAWN_ON } else { MSG_SPAWN_OFF };
        vec![Effect::Toast(msg.to_string())]
    }

    fn close_wheel(&mut self, refusal: &str) -> Vec<Effect> {
        if self.wheel.is_spinning() {
            return vec![Effect::Toast(refusal.to_string())];
        }
        self.wheel_open = false;
        vec![Effect::ShowWheel(false)]
    }

    fn start_spin<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<Effect> {
        if self.wheel.is_spinning() {
            return Vec::new();
        }
        if !self.wallet.try_debit(SPIN_COST, &mut self.store) {
            return vec![Effect::Toast(MSG_SPIN_NEEDS_COIN.to_string())];
        }
        let spin = match self.wheel.start(rng) {
            Some(spin) => spin,
            None => return Vec::new(),
        };
        debug!(
            "Spin {:?}: {} turns + {} deg",
            spin.id, spin.plan.full_turns, spin.plan.final_offset
        );
        vec![
            Effect::SetCoinCount(self.wallet.balance()),
            Effect::SetSpinControls { busy: true, label: SPIN_BUTTON_BUSY },
            Effect::SetWheelResult(String::new()),
            Effect::SpinStarted {
                spin: spin.id,
                target_deg: spin.plan.target_rotation(),
                duration_ms: SPIN_DURATION_MS,
                fallback_ms: fallback_delay_ms(),
            },
        ]
    }

    fn settle_spin(&mut self, spin: SpinId, via: SettleVia) -> Vec<Effect> {
        let outcome = match self.wheel.settle(spin, via) {
            Some(outcome) => outcome,
            None => return Vec::new(),
        };
        info!("Spin {:?} landed on {:?} via {:?}", spin, outcome.segment.label, via);
        let mut effects = vec![
            Effect::SpinResolved(spin),
            Effect::SetWheelResult(format!("{}{}", WHEEL_RESULT_PREFIX, outcome.segment.label)),
        ];
        if let Reward::Coins(amount) = outcome.segment.reward {
            let balance = self.wallet.credit(amount, &mut self.store);
            effects.push(Effect::SetCoinCount(balance));
            effects.push(Effect::Toast(MSG_BONUS_COINS.to_string()));
        }
        effects.push(Effect::SetSpinControls { busy: false, label: SPIN_BUTTON_IDLE });
        effects
    }

    /// Adds coins outside of gameplay; backs the page's debug hook.
    pub fn credit_debug(&mut self, amount: u32) -> Vec<Effect> {
        let balance = self.wallet.credit(amount, &mut self.store);
        vec![Effect::SetCoinCount(balance)]
    }

    /// Tokens spawned but neither collected nor expired.
    pub fn live_tokens(&self) -> usize {
        self.tokens.live_count()
    }

    pub fn balance(&self) -> u32 {
        self.wallet.balance()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &PageConfig {
        &self.config
    }

    pub fn device(&self) -> DeviceProfile {
        self.device
    }

    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    pub fn ambient(&self) -> &AmbientSettings {
        &self.ambient
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn is_spinning(&self) -> bool {
        self.wheel.is_spinning()
    }

    pub fn spawn_enabled(&self) -> bool {
        self.spawn_enabled
    }

    pub fn settings_open(&self) -> bool {
        self.settings_open
    }

    pub fn playlist_open(&self) -> bool {
        self.playlist_open
    }

    pub fn wheel_open(&self) -> bool {
        self.wheel_open
    }

    pub fn muted(&self) -> bool {
        self.muted
    }
}
