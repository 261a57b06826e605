use rand::rngs::StdRng;
use rand::SeedableRng;

use shared::constants::*;
use shared::settings::DeviceProfile;
use shared::shared_ambient::particle_count;
use shared::shared_coin_game::{Rect, TokenId, Viewport};
use shared::shared_wheel_game::{SettleVia, SpinId};
use shared::{Effect, KeyValueStore, MemoryStore, PageConfig, PageEvent, Session};

const VIEWPORT: Viewport = Viewport { width: 1280.0, height: 800.0 };

fn session_with(store: MemoryStore, device: DeviceProfile, rng: &mut StdRng) -> Session<MemoryStore> {
    Session::new(PageConfig::default(), device, store, VIEWPORT, rng)
}

fn spawn_token(session: &mut Session<MemoryStore>, rng: &mut StdRng) -> TokenId {
    let effects = session.handle(
        PageEvent::SpawnTick {
            viewport: VIEWPORT,
            exclusions: vec![Rect::new(400.0, 100.0, 400.0, 500.0)],
        },
        rng,
    );
    effects
        .iter()
        .find_map(|e| match e {
            Effect::SpawnToken { id, .. } => Some(*id),
            _ => None,
        })
        .expect("token should spawn")
}

fn start_spin(session: &mut Session<MemoryStore>, rng: &mut StdRng) -> SpinId {
    session
        .handle(PageEvent::SpinPressed, rng)
        .iter()
        .find_map(|e| match e {
            Effect::SpinStarted { spin, .. } => Some(*spin),
            _ => None,
        })
        .expect("spin should start")
}

fn results(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|e| matches!(e, Effect::SetWheelResult(text) if !text.is_empty()))
        .count()
}

#[test]
fn token_collected_at_most_once() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut session = session_with(MemoryStore::new(), DeviceProfile::desktop(), &mut rng);
    let id = spawn_token(&mut session, &mut rng);

    let first = session.handle(PageEvent::TokenPressed(id), &mut rng);
    assert!(first.contains(&Effect::SetCoinCount(1)));
    assert!(first.contains(&Effect::Toast(MSG_TOKEN_COLLECTED.to_string())));

    // click fallback after pointerdown
    let second = session.handle(PageEvent::TokenPressed(id), &mut rng);
    assert_eq!(second, vec![Effect::StopPropagation]);
    assert!(session.handle(PageEvent::TokenExpired(id), &mut rng).is_empty());

    assert_eq!(session.balance(), 1);
    assert_eq!(session.store().get(COINS_KEY).as_deref(), Some("1"));
}

#[test]
fn uncollected_token_expires_without_reward() {
    let mut rng = StdRng::seed_from_u64(2);
    let mut session = session_with(MemoryStore::new(), DeviceProfile::desktop(), &mut rng);
    let id = spawn_token(&mut session, &mut rng);
    assert_eq!(
        session.handle(PageEvent::TokenExpired(id), &mut rng),
        vec![Effect::RemoveToken(id)]
    );
    let late = session.handle(PageEvent::TokenPressed(id), &mut rng);
    assert_eq!(late, vec![Effect::StopPropagation]);
    assert_eq!(session.balance(), 0);
}

#[test]
fn unrendered_token_is_retired_on_expiry() {
    let mut rng = StdRng::seed_from_u64(12);
    let mut session = session_with(MemoryStore::new(), DeviceProfile::desktop(), &mut rng);
    let kept = spawn_token(&mut session, &mut rng);
    let failed = spawn_token(&mut session, &mut rng);
    assert_eq!(session.live_tokens(), 2);

    // the page retires a token it could not show
    assert_eq!(
        session.handle(PageEvent::TokenExpired(failed), &mut rng),
        vec![Effect::RemoveToken(failed)]
    );
    assert_eq!(session.live_tokens(), 1);

    session.handle(PageEvent::TokenPressed(kept), &mut rng);
    session.handle(PageEvent::TokenFaded(kept), &mut rng);
    assert_eq!(session.live_tokens(), 0);
    assert_eq!(session.balance(), 1);
}

#[test]
fn spin_rejected_without_coins() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut session = session_with(MemoryStore::new(), DeviceProfile::desktop(), &mut rng);
    let effects = session.handle(PageEvent::SpinPressed, &mut rng);
    assert_eq!(effects, vec![Effect::Toast(MSG_SPIN_NEEDS_COIN.to_string())]);
    assert!(!session.is_spinning());
    assert_eq!(session.balance(), 0);
    assert_eq!(session.store().get(COINS_KEY), None);
}

#[test]
fn spin_resolves_once_completion_first() {
    let mut rng = StdRng::seed_from_u64(4);
    let store = MemoryStore::new().with_entry(COINS_KEY, "3");
    let mut session = session_with(store, DeviceProfile::desktop(), &mut rng);
    let spin = start_spin(&mut session, &mut rng);
    assert_eq!(session.balance(), 2);
    assert!(session.is_spinning());
    assert!(session.handle(PageEvent::SpinPressed, &mut rng).is_empty());

    let done = session.handle(PageEvent::SpinSettled { spin, via: SettleVia::Completion }, &mut rng);
    let late = session.handle(PageEvent::SpinSettled { spin, via: SettleVia::Fallback }, &mut rng);
    assert_eq!(results(&done), 1);
    assert!(late.is_empty());

    let bonus = done.contains(&Effect::Toast(MSG_BONUS_COINS.to_string()));
    assert_eq!(session.balance(), if bonus { 4 } else { 2 });
    assert!(!session.is_spinning());
}

#[test]
fn spin_resolves_once_fallback_first() {
    for seed in 0..20 {
        let mut rng = StdRng::seed_from_u64(seed);
        let store = MemoryStore::new().with_entry(COINS_KEY, "1");
        let mut session = session_with(store, DeviceProfile::desktop(), &mut rng);
        let spin = start_spin(&mut session, &mut rng);
        assert_eq!(session.balance(), 0);

        let done = session.handle(PageEvent::SpinSettled { spin, via: SettleVia::Fallback }, &mut rng);
        let late = session.handle(PageEvent::SpinSettled { spin, via: SettleVia::Completion }, &mut rng);
        assert_eq!(results(&done), 1);
        assert!(late.is_empty());
        assert!(done.contains(&Effect::SpinResolved(spin)));
        assert!(done.contains(&Effect::SetSpinControls { busy: false, label: SPIN_BUTTON_IDLE }));

        let bonus = done.contains(&Effect::Toast(MSG_BONUS_COINS.to_string()));
        let expected = if bonus { 2 } else { 0 };
        assert_eq!(session.balance(), expected);
        assert_eq!(session.store().get(COINS_KEY), Some(expected.to_string()));
    }
}

#[test]
fn overlay_cannot_be_dismissed_mid_spin() {
    let mut rng = StdRng::seed_from_u64(5);
    let store = MemoryStore::new().with_entry(COINS_KEY, "1");
    let mut session = session_with(store, DeviceProfile::desktop(), &mut rng);
    session.handle(PageEvent::WheelOpenPressed, &mut rng);
    let spin = start_spin(&mut session, &mut rng);

    let escape = session.handle(PageEvent::EscapeCapture, &mut rng);
    assert_eq!(escape[0], Effect::StopImmediatePropagation);
    assert!(escape.contains(&Effect::PreventDefault));
    assert_eq!(
        session.handle(PageEvent::WheelBackdropClicked, &mut rng),
        vec![Effect::Toast(MSG_CANNOT_LEAVE_SPINNING.to_string())]
    );
    assert_eq!(
        session.handle(PageEvent::WheelClosePressed, &mut rng),
        vec![Effect::Toast(MSG_CANNOT_CLOSE_SPINNING.to_string())]
    );
    assert!(session.wheel_open());

    session.handle(PageEvent::SpinSettled { spin, via: SettleVia::Completion }, &mut rng);
    assert!(session.handle(PageEvent::EscapeCapture, &mut rng).is_empty());
    assert_eq!(
        session.handle(PageEvent::WheelBackdropClicked, &mut rng),
        vec![Effect::ShowWheel(false)]
    );
}

#[test]
fn balance_survives_reload() {
    let mut rng = StdRng::seed_from_u64(6);
    let mut session = session_with(MemoryStore::new(), DeviceProfile::desktop(), &mut rng);
    assert_eq!(session.balance(), 0);
    session.credit_debug(7);

    let reloaded = session_with(session.store().clone(), DeviceProfile::desktop(), &mut rng);
    assert_eq!(reloaded.balance(), 7);
}

#[test]
fn constrained_device_overrides_persisted_spawn_flag() {
    let mut rng = StdRng::seed_from_u64(7);
    let store = MemoryStore::new().with_entry(SPAWN_ENABLED_KEY, "1");
    let touch = DeviceProfile { touch: true, narrow: false };
    let mut session = session_with(store, touch, &mut rng);

    assert!(!session.spawn_enabled());
    assert!(!session.ambient().enabled);
    assert!(session.ambient().density <= 8.0);
    let boot = session.boot();
    assert!(boot.contains(&Effect::HideMinigame));
    assert!(boot.contains(&Effect::SetSpawnToggle(false)));

    let tick = PageEvent::SpawnTick { viewport: VIEWPORT, exclusions: Vec::new() };
    assert!(session.handle(tick, &mut rng).is_empty());
    assert_eq!(
        session.handle(PageEvent::SpawnToggled(true), &mut rng),
        vec![Effect::SetSpawnToggle(false)]
    );
    let snow = PageEvent::KeyDown { key: "s".to_string(), code: "KeyS".to_string() };
    assert!(session.handle(snow, &mut rng).is_empty());
    assert!(!session.ambient().enabled);
    assert_eq!(session.store().get(SPAWN_ENABLED_KEY).as_deref(), Some("1"));
}

#[test]
fn spawn_toggle_persists() {
    let mut rng = StdRng::seed_from_u64(8);
    let mut session = session_with(MemoryStore::new(), DeviceProfile::desktop(), &mut rng);
    let off = session.handle(PageEvent::SpawnToggled(false), &mut rng);
    assert_eq!(off, vec![Effect::Toast(MSG_SPAWN_OFF.to_string())]);
    assert_eq!(session.store().get(SPAWN_ENABLED_KEY).as_deref(), Some("0"));

    let tick = PageEvent::SpawnTick { viewport: VIEWPORT, exclusions: Vec::new() };
    assert!(session.handle(tick, &mut rng).is_empty());

    let reloaded = session_with(session.store().clone(), DeviceProfile::desktop(), &mut rng);
    assert!(!reloaded.spawn_enabled());

    session.handle(PageEvent::SpawnToggled(true), &mut rng);
    assert_eq!(session.store().get(SPAWN_ENABLED_KEY).as_deref(), Some("1"));
}

#[test]
fn playlist_navigation_wraps_and_loops() {
    let mut rng = StdRng::seed_from_u64(9);
    let mut session = session_with(MemoryStore::new(), DeviceProfile::desktop(), &mut rng);

    let prev = session.handle(PageEvent::PrevPressed, &mut rng);
    assert!(matches!(prev.as_slice(), [Effect::LoadTrack { index: 11, .. }]));
    let next = session.handle(PageEvent::NextPressed, &mut rng);
    assert!(matches!(next.as_slice(), [Effect::LoadTrack { index: 0, .. }]));

    let ended = session.handle(PageEvent::TrackEnded, &mut rng);
    assert!(matches!(ended.as_slice(), [Effect::LoadTrack { index: 1, .. }]));

    assert_eq!(session.handle(PageEvent::LoopPressed, &mut rng), vec![Effect::SetLoop(true)]);
    assert_eq!(session.handle(PageEvent::TrackEnded, &mut rng), vec![Effect::Replay]);
    assert_eq!(session.playlist().current_index(), 1);
}

#[test]
fn choosing_a_row_closes_the_playlist() {
    let mut rng = StdRng::seed_from_u64(10);
    let mut session = session_with(MemoryStore::new(), DeviceProfile::desktop(), &mut rng);
    session.handle(PageEvent::PlaylistPressed, &mut rng);
    assert!(session.playlist_open());

    let effects = session.handle(PageEvent::TrackChosen(4), &mut rng);
    assert!(matches!(effects[0], Effect::LoadTrack { index: 4, .. }));
    assert!(effects.contains(&Effect::ShowPlaylist(false)));
    assert!(!session.playlist_open());
    assert!(session.handle(PageEvent::TrackChosen(40), &mut rng).is_empty());
}

#[test]
fn source_primed_only_on_first_play() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut session = session_with(MemoryStore::new(), DeviceProfile::desktop(), &mut rng);
    let first = session.handle(PageEvent::PlayPressed, &mut rng);
    assert_eq!(
        first,
        vec![
            Effect::PrimeSource { src: "temnyy_princ_overdoz.mp3".to_string() },
            Effect::TogglePlayback
        ]
    );
    let space = PageEvent::KeyDown { key: " ".to_string(), code: "Space".to_string() };
    assert_eq!(
        session.handle(space, &mut rng),
        vec![Effect::PreventDefault, Effect::TogglePlayback]
    );
}

#[test]
fn duration_probe_updates_current_time_label() {
    let mut rng = StdRng::seed_from_u64(12);
    let mut session = session_with(MemoryStore::new(), DeviceProfile::desktop(), &mut rng);
    let current = session.handle(PageEvent::DurationProbed { index: 0, seconds: 125.0 }, &mut rng);
    assert_eq!(
        current,
        vec![
            Effect::SetTrackDuration { index: 0, text: "02:05".to_string() },
            Effect::SetTimeLabel("00:00 / 02:05".to_string()),
        ]
    );
    let other = session.handle(PageEvent::DurationProbed { index: 3, seconds: 61.0 }, &mut rng);
    assert_eq!(other, vec![Effect::SetTrackDuration { index: 3, text: "01:01".to_string() }]);
}

#[test]
fn settings_close_on_outside_click_and_escape() {
    let mut rng = StdRng::seed_from_u64(13);
    let mut session = session_with(MemoryStore::new(), DeviceProfile::desktop(), &mut rng);

    assert_eq!(session.handle(PageEvent::SettingsPressed, &mut rng), vec![Effect::ShowSettings(true)]);
    let inside = PageEvent::DocumentClick { outside_settings: false, outside_playlist: true };
    assert!(session.handle(inside, &mut rng).is_empty());
    let outside = PageEvent::DocumentClick { outside_settings: true, outside_playlist: true };
    assert_eq!(session.handle(outside, &mut rng), vec![Effect::ShowSettings(false)]);

    session.handle(PageEvent::SettingsPressed, &mut rng);
    let escape = PageEvent::KeyDown { key: "Escape".to_string(), code: "Escape".to_string() };
    assert_eq!(session.handle(escape, &mut rng), vec![Effect::ShowSettings(false)]);
    assert!(!session.settings_open());
}

#[test]
fn ambient_preferences_round_trip() {
    let mut rng = StdRng::seed_from_u64(14);
    let mut session = session_with(MemoryStore::new(), DeviceProfile::desktop(), &mut rng);
    assert_eq!(session.field().len(), particle_count(1280.0, 800.0, 20.0));

    session.handle(PageEvent::DensityInput(3.0), &mut rng);
    session.handle(PageEvent::OpacityInput(0.6), &mut rng);
    assert_eq!(session.field().len(), 80);

    let reloaded = session_with(session.store().clone(), DeviceProfile::desktop(), &mut rng);
    assert_eq!(reloaded.ambient().density, 3.0);
    assert_eq!(reloaded.ambient().opacity, 0.6);
    assert_eq!(reloaded.field().len(), 80);
}

#[test]
fn mute_hotkey_toggles() {
    let mut rng = StdRng::seed_from_u64(15);
    let mut session = session_with(MemoryStore::new(), DeviceProfile::desktop(), &mut rng);
    let m = PageEvent::KeyDown { key: "M".to_string(), code: "KeyM".to_string() };
    assert_eq!(
        session.handle(m.clone(), &mut rng),
        vec![Effect::SetMuted(true), Effect::Toast(MSG_MUTED.to_string())]
    );
    session.handle(m, &mut rng);
    assert!(!session.muted());
}
