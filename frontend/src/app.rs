use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo::events::{EventListener, EventListenerOptions, EventListenerPhase};
use gloo_timers::callback::Interval;
use shared::shared_coin_game::Viewport;
use shared::{Effect, PageError, PageEvent, Session};
use wasm_bindgen::JsCast;
use web_sys::{Event, EventTarget, KeyboardEvent};

use crate::components::ambient::Ambient;
use crate::components::clipboard;
use crate::components::minigame::Minigame;
use crate::components::player::Player;
use crate::components::settings::SettingsPanel;
use crate::components::toast::Toast;
use crate::config;
use crate::dom;
use crate::storage::LocalStore;

thread_local! {
    static APP: RefCell<Option<Rc<App>>> = RefCell::new(None);
}

/// Runs `f` against the live page, if it has started.
pub fn with_app<T>(f: impl FnOnce(&Rc<App>) -> T) -> Option<T> {
    APP.with(|slot| slot.borrow().as_ref().map(f))
}

/// Owns the session and every DOM handle. All listeners hold a `Weak<App>`,
/// so dropping the app detaches the page.
pub struct App {
    session: RefCell<Session<LocalStore>>,
    toast: Toast,
    ambient: Ambient,
    player: Player,
    settings: SettingsPanel,
    minigame: Minigame,
    listeners: RefCell<Vec<EventListener>>,
    intervals: RefCell<Vec<Interval>>,
}

pub fn start() -> Result<(), PageError> {
    let config = config::load_page_config();
    let device = config::detect_device();
    let store = LocalStore::open();
    let (width, height) = config::window_size();
    let spawn_interval_ms = config.spawn_interval_ms;
    let toast_ms = config.toast_ms;
    let handle = config.handle.clone();

    let ambient = Ambient::new()?;
    ambient.resize(width, height);
    let player = Player::new()?;
    player.build_rows(&config.tracks);

    let session = Session::new(
        config,
        device,
        store,
        Viewport { width, height },
        &mut rand::thread_rng(),
    );

    let app = Rc::new(App {
        session: RefCell::new(session),
        toast: Toast::new(toast_ms),
        ambient,
        player,
        settings: SettingsPanel::new(),
        minigame: Minigame::new(),
        listeners: RefCell::new(Vec::new()),
        intervals: RefCell::new(Vec::new()),
    });

    let mut listeners = app.wire_page();
    listeners.extend(app.player.wire(&app));
    listeners.extend(app.settings.wire(&app));
    listeners.extend(app.minigame.wire(&app));
    listeners.extend(clipboard::wire(&app, &handle));
    app.listeners.replace(listeners);

    let boot = app.session.borrow_mut().boot();
    app.apply_all(boot, None);

    // first token right away, then on the timer
    app.spawn_tick();
    let weak = Rc::downgrade(&app);
    app.intervals.borrow_mut().push(Interval::new(spawn_interval_ms, move || {
        if let Some(app) = weak.upgrade() {
            app.spawn_tick();
        }
    }));

    app.ambient.schedule_frame(Rc::downgrade(&app));
    app.ambient.start_lamp(Rc::downgrade(&app));

    APP.with(|slot| slot.replace(Some(app)));
    log::debug!("Page wired");
    Ok(())
}

impl App {
    pub fn ambient(&self) -> &Ambient {
        &self.ambient
    }

    pub fn balance(&self) -> u32 {
        self.session.borrow().balance()
    }

    pub fn credit_debug(self: &Rc<Self>, amount: u32) {
        let effects = self.session.borrow_mut().credit_debug(amount);
        self.apply_all(effects, None);
    }

    /// Attaches a listener that turns DOM events into page events.
    pub fn listen<F>(self: &Rc<Self>, target: &EventTarget, event_type: &'static str, to_event: F) -> EventListener
    where
        F: Fn(&Event) -> Option<PageEvent> + 'static,
    {
        self.listen_with_options(target, event_type, EventListenerOptions::default(), to_event)
    }

    pub fn listen_with_options<F>(
        self: &Rc<Self>,
        target: &EventTarget,
        event_type: &'static str,
        options: EventListenerOptions,
        to_event: F,
    ) -> EventListener
    where
        F: Fn(&Event) -> Option<PageEvent> + 'static,
    {
        let app: Weak<App> = Rc::downgrade(self);
        EventListener::new_with_options(target, event_type, options, move |e| {
            let Some(event) = to_event(e) else {
                return;
            };
            if let Some(app) = app.upgrade() {
                app.dispatch_dom(event, e);
            }
        })
    }

    pub fn dispatch(self: &Rc<Self>, event: PageEvent) {
        self.run(event, None);
    }

    pub fn dispatch_dom(self: &Rc<Self>, event: PageEvent, dom_event: &Event) {
        self.run(event, Some(dom_event));
    }

    fn run(self: &Rc<Self>, event: PageEvent, dom_event: Option<&Event>) {
        // the session borrow ends before any effect touches the DOM
        let effects = self.session.borrow_mut().handle(event, &mut rand::thread_rng());
        self.apply_all(effects, dom_event);
    }

    fn apply_all(self: &Rc<Self>, effects: Vec<Effect>, dom_event: Option<&Event>) {
        for effect in effects {
            self.apply(effect, dom_event);
        }
    }

    fn apply(self: &Rc<Self>, effect: Effect, dom_event: Option<&Event>) {
        match effect {
            Effect::Toast(text) => self.toast.show(&text),
            Effect::PreventDefault => {
                if let Some(e) = dom_event {
                    e.prevent_default();
                }
            }
            Effect::StopPropagation => {
                if let Some(e) = dom_event {
                    e.stop_propagation();
                }
            }
            Effect::StopImmediatePropagation => {
                if let Some(e) = dom_event {
                    e.stop_immediate_propagation();
                }
            }

            Effect::SetCoinCount(balance) => self.minigame.set_count(balance),
            Effect::SetSpawnToggle(enabled) => self.settings.set_spawn_checked(enabled),
            Effect::HideMinigame => self.minigame.hide(),
            Effect::SyncSliders { volume, opacity, density } => {
                self.player.sync_volume_slider(volume);
                self.settings.sync_sliders(opacity, density);
            }
            Effect::ShowSettings(open) => self.settings.show(open),
            Effect::ShowPlaylist(open) => self.player.show_playlist(open),

            Effect::ShowWheel(open) => self.minigame.show_wheel(open),
            Effect::ResetWheel => self.minigame.reset_wheel(),
            Effect::SetWheelResult(text) => self.minigame.set_result(&text),
            Effect::SetSpinControls { busy, label } => self.minigame.set_spin_controls(busy, label),
            Effect::SpinStarted { spin, target_deg, duration_ms, fallback_ms } => {
                self.minigame.start_spin(self, spin, target_deg, duration_ms, fallback_ms)
            }
            Effect::SpinResolved(spin) => self.minigame.end_spin(spin),

            Effect::SpawnToken { id, x, y, lifetime_ms } => {
                if let Err(e) = self.minigame.spawn_token(self, id, x, y, lifetime_ms) {
                    log::warn!("Failed to place token: {:?}", e);
                    // no element means no expiry timer, so retire it now
                    self.dispatch(PageEvent::TokenExpired(id));
                }
            }
            Effect::CollectToken { id, fade_ms } => self.minigame.collect_token(self, id, fade_ms),
            Effect::RemoveToken(id) => self.minigame.remove_token(id),

            Effect::PrimeSource { src } => self.player.prime(&src),
            Effect::TogglePlayback => self.player.toggle(self),
            Effect::SetPlayGlyph(glyph) => self.player.set_glyph(glyph),
            Effect::LoadTrack { index, src, title } => self.player.load(self, index, &src, &title),
            Effect::ShowTrack { index, title } => self.player.show_track(index, &title),
            Effect::Replay => self.player.replay(self),
            Effect::ProbeDuration { index, src } => self.player.probe(self, index, &src),
            Effect::SetTrackDuration { index, text } => self.player.set_track_duration(index, &text),
            Effect::SetTimeLabel(text) => self.player.set_time_label(&text),
            Effect::SetProgress { percent, label } => self.player.set_progress(percent, &label),
            Effect::Seek(time) => self.player.seek(time),
            Effect::SetVolume { volume, label } => self.player.set_volume(volume, &label),
            Effect::SetMuted(muted) => self.player.set_muted(muted),
            Effect::SetLoop(looping) => self.player.set_loop(looping),
            Effect::WriteClipboard { text, source } => clipboard::copy(self, text, source),
        }
    }

    /// Draws the current particles, then moves them one step.
    pub fn render_frame(&self) {
        let mut session = self.session.borrow_mut();
        self.ambient.draw(session.field(), session.ambient());
        session.advance_frame(&mut rand::thread_rng());
    }

    fn spawn_tick(self: &Rc<Self>) {
        let event = PageEvent::SpawnTick {
            viewport: config::viewport(),
            exclusions: dom::exclusion_rects(),
        };
        self.dispatch(event);
    }

    /// Window and document level listeners: resize, hotkeys, escape guard,
    /// outside clicks.
    fn wire_page(self: &Rc<Self>) -> Vec<EventListener> {
        let window = gloo_utils::window();
        let document = gloo_utils::document();
        let mut listeners = Vec::new();

        let weak = Rc::downgrade(self);
        listeners.push(EventListener::new(&window, "resize", move |_| {
            let Some(app) = weak.upgrade() else {
                return;
            };
            let (width, height) = config::window_size();
            app.ambient.resize(width, height);
            app.dispatch(PageEvent::Resize { width, height });
        }));

        listeners.push(self.listen_with_options(
            &window,
            "keydown",
            EventListenerOptions::enable_prevent_default(),
            |e| {
                let key = e.dyn_ref::<KeyboardEvent>()?;
                Some(PageEvent::KeyDown { key: key.key(), code: key.code() })
            },
        ));

        // capture phase on the document runs before any bubbling handler
        listeners.push(self.listen_with_options(
            &document,
            "keydown",
            EventListenerOptions {
                phase: EventListenerPhase::Capture,
                passive: false,
            },
            |e| {
                let key = e.dyn_ref::<KeyboardEvent>()?.key();
                (key == "Escape" || key == "Esc").then_some(PageEvent::EscapeCapture)
            },
        ));

        let weak = Rc::downgrade(self);
        listeners.push(EventListener::new(&document, "click", move |e| {
            let Some(app) = weak.upgrade() else {
                return;
            };
            let target = dom::event_target_node(e);
            let outside_settings = !dom::within(
                target.as_ref(),
                &[app.settings.panel.as_ref(), app.settings.toggle.as_ref()],
            );
            let outside_playlist = !dom::within(
                target.as_ref(),
                &[app.player.playlist_panel.as_ref(), app.player.playlist_btn.as_ref()],
            );
            app.dispatch_dom(PageEvent::DocumentClick { outside_settings, outside_playlist }, e);
        }));

        listeners
    }
}
