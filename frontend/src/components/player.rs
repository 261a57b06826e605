use std::cell::RefCell;
use std::rc::Rc;

use gloo::events::EventListener;
use shared::shared_playlist::Track;
use shared::{PageError, PageEvent};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{Element, HtmlAudioElement, HtmlElement, HtmlInputElement, MouseEvent};

use crate::app::App;
use crate::dom::{self, set_class, set_style, set_text};

/// Audio element, transport controls and the playlist panel.
pub struct Player {
    audio: HtmlAudioElement,
    toggle_btn: Option<HtmlElement>,
    prog: Option<HtmlElement>,
    prog_fill: Option<HtmlElement>,
    time_label: Option<HtmlElement>,
    title: Option<HtmlElement>,
    prev_btn: Option<HtmlElement>,
    next_btn: Option<HtmlElement>,
    loop_btn: Option<HtmlElement>,
    vol_range: Option<HtmlInputElement>,
    vol_val: Option<HtmlElement>,
    pub playlist_btn: Option<HtmlElement>,
    pub playlist_panel: Option<HtmlElement>,
    rows: RefCell<Vec<(HtmlElement, HtmlElement)>>,
    probes: RefCell<Vec<(HtmlAudioElement, EventListener)>>,
}

impl Player {
    pub fn new() -> Result<Self, PageError> {
        let audio: HtmlAudioElement = dom::required("audio")?;
        // no network traffic until the first play intent
        let _ = audio.remove_attribute("src");
        audio.set_preload("none");

        let prog: Option<HtmlElement> = dom::by_id("prog");
        let prog_fill = prog
            .as_ref()
            .and_then(|bar| bar.query_selector("i").ok().flatten())
            .and_then(|el| el.dyn_into::<HtmlElement>().ok());

        Ok(Self {
            audio,
            toggle_btn: dom::by_id("toggleBtn"),
            prog,
            prog_fill,
            time_label: dom::by_id("timeLabel"),
            title: dom::by_id("currentTrackTitle"),
            prev_btn: dom::by_id("prevBtn"),
            next_btn: dom::by_id("nextBtn"),
            loop_btn: dom::by_id("loopBtn"),
            vol_range: dom::by_id("volRange"),
            vol_val: dom::by_id("volVal"),
            playlist_btn: dom::by_id("playlistBtn"),
            playlist_panel: dom::by_id("playlistPanel"),
            rows: RefCell::new(Vec::new()),
            probes: RefCell::new(Vec::new()),
        })
    }

    /// Builds one row per track inside the playlist panel.
    pub fn build_rows(&self, tracks: &[Track]) {
        let Some(panel) = &self.playlist_panel else {
            return;
        };
        let mut rows = Vec::with_capacity(tracks.len());
        for (index, track) in tracks.iter().enumerate() {
            match build_row(index, track) {
                Ok((row, duration)) => {
                    if panel.append_child(&row).is_ok() {
                        rows.push((row, duration));
                    }
                }
                Err(e) => log::warn!("Failed to build playlist row {}: {:?}", index, e),
            }
        }
        self.rows.replace(rows);
    }

    pub fn wire(&self, app: &Rc<App>) -> Vec<EventListener> {
        let mut listeners = Vec::new();
        let audio = &self.audio;

        if let Some(btn) = &self.toggle_btn {
            listeners.push(app.listen(btn, "click", |_| Some(PageEvent::PlayPressed)));
        }
        listeners.push(app.listen(audio, "play", |_| Some(PageEvent::PlaybackChanged { playing: true })));
        listeners.push(app.listen(audio, "pause", |_| Some(PageEvent::PlaybackChanged { playing: false })));
        listeners.push(app.listen(audio, "ended", |_| Some(PageEvent::TrackEnded)));

        let media = audio.clone();
        listeners.push(app.listen(audio, "timeupdate", move |_| {
            Some(PageEvent::TimeUpdate {
                current: media.current_time(),
                duration: media.duration(),
            })
        }));
        let media = audio.clone();
        listeners.push(app.listen(audio, "loadedmetadata", move |_| {
            Some(PageEvent::CurrentMetadataLoaded { seconds: media.duration() })
        }));

        if let Some(bar) = &self.prog {
            let media = audio.clone();
            let bar_el = bar.clone();
            listeners.push(app.listen(bar, "click", move |e| {
                let click = e.dyn_ref::<MouseEvent>()?;
                let rect = bar_el.get_bounding_client_rect();
                Some(PageEvent::SeekClick {
                    click_x: click.client_x() as f64,
                    rect_left: rect.left(),
                    rect_width: rect.width(),
                    duration: media.duration(),
                })
            }));
        }

        if let Some(btn) = &self.prev_btn {
            listeners.push(app.listen(btn, "click", |_| Some(PageEvent::PrevPressed)));
        }
        if let Some(btn) = &self.next_btn {
            listeners.push(app.listen(btn, "click", |_| Some(PageEvent::NextPressed)));
        }
        if let Some(btn) = &self.loop_btn {
            listeners.push(app.listen(btn, "click", |_| Some(PageEvent::LoopPressed)));
        }
        if let Some(btn) = &self.playlist_btn {
            listeners.push(app.listen(btn, "click", |_| Some(PageEvent::PlaylistPressed)));
        }
        if let Some(panel) = &self.playlist_panel {
            listeners.push(app.listen(panel, "click", |e| {
                let target = e.target()?.dyn_into::<Element>().ok()?;
                let row = target.closest(".playlist-item").ok().flatten()?;
                let index = row.get_attribute("data-index")?.parse::<usize>().ok()?;
                Some(PageEvent::TrackChosen(index))
            }));
        }
        if let Some(range) = &self.vol_range {
            let input = range.clone();
            listeners.push(app.listen(range, "input", move |_| {
                Some(PageEvent::VolumeInput(input.value_as_number()))
            }));
        }

        listeners
    }

    pub fn prime(&self, src: &str) {
        self.audio.set_src(src);
        self.audio.load();
    }

    pub fn toggle(&self, app: &Rc<App>) {
        if self.audio.paused() {
            self.play(app);
        } else if let Err(e) = self.audio.pause() {
            log::warn!("Pause failed: {:?}", e);
        }
    }

    pub fn load(&self, app: &Rc<App>, index: usize, src: &str, title: &str) {
        self.audio.set_src(src);
        self.audio.load();
        self.show_track(index, title);
        self.play(app);
    }

    pub fn replay(&self, app: &Rc<App>) {
        self.play(app);
    }

    fn play(&self, app: &Rc<App>) {
        let app = Rc::downgrade(app);
        match self.audio.play() {
            Ok(promise) => spawn_local(async move {
                if let Err(e) = JsFuture::from(promise).await {
                    log::warn!("Playback rejected: {:?}", e);
                    if let Some(app) = app.upgrade() {
                        app.dispatch(PageEvent::PlaybackRejected);
                    }
                }
            }),
            Err(e) => {
                log::warn!("Playback failed to start: {:?}", e);
                if let Some(app) = app.upgrade() {
                    app.dispatch(PageEvent::PlaybackRejected);
                }
            }
        }
    }

    /// Title and selected marker always name the same track.
    pub fn show_track(&self, index: usize, title: &str) {
        set_text(self.title.as_ref(), title);
        for (i, (row, _)) in self.rows.borrow().iter().enumerate() {
            set_class(row, "selected", i == index);
        }
    }

    pub fn set_glyph(&self, glyph: &str) {
        set_text(self.toggle_btn.as_ref(), glyph);
    }

    /// Loads metadata for one track through a detached element.
    pub fn probe(&self, app: &Rc<App>, index: usize, src: &str) {
        let probe = match HtmlAudioElement::new_with_src(src) {
            Ok(probe) => probe,
            Err(e) => {
                log::warn!("Could not probe {}: {:?}", src, e);
                return;
            }
        };
        probe.set_preload("metadata");
        let media = probe.clone();
        let listener = app.listen(&probe, "loadedmetadata", move |_| {
            Some(PageEvent::DurationProbed { index, seconds: media.duration() })
        });
        self.probes.borrow_mut().push((probe, listener));
    }

    pub fn set_track_duration(&self, index: usize, text: &str) {
        if let Some((_, duration)) = self.rows.borrow().get(index) {
            duration.set_text_content(Some(text));
        }
    }

    pub fn set_time_label(&self, text: &str) {
        set_text(self.time_label.as_ref(), text);
    }

    pub fn set_progress(&self, percent: f64, label: &str) {
        if let Some(fill) = &self.prog_fill {
            set_style(fill, "width", &format!("{}%", percent));
        }
        self.set_time_label(label);
    }

    pub fn seek(&self, time: f64) {
        self.audio.set_current_time(time);
    }

    pub fn set_volume(&self, volume: f64, label: &str) {
        self.audio.set_volume(volume);
        set_text(self.vol_val.as_ref(), label);
    }

    pub fn sync_volume_slider(&self, volume: f64) {
        if let Some(range) = &self.vol_range {
            range.set_value(&volume.to_string());
        }
    }

    pub fn set_muted(&self, muted: bool) {
        self.audio.set_muted(muted);
    }

    pub fn set_loop(&self, looping: bool) {
        if let Some(btn) = &self.loop_btn {
            set_class(btn, "active", looping);
        }
    }

    pub fn show_playlist(&self, open: bool) {
        if let Some(panel) = &self.playlist_panel {
            set_class(panel, "open", open);
        }
    }
}

fn build_row(index: usize, track: &Track) -> Result<(HtmlElement, HtmlElement), wasm_bindgen::JsValue> {
    let document = gloo_utils::document();
    let row: HtmlElement = document.create_element("div")?.dyn_into()?;
    row.set_class_name("playlist-item");
    row.set_attribute("data-index", &index.to_string())?;

    let label: HtmlElement = document.create_element("div")?.dyn_into()?;
    set_style(&label, "display", "flex");
    set_style(&label, "align-items", "center");
    set_style(&label, "gap", "16px");
    let number = document.create_element("span")?;
    number.set_text_content(Some(&(index + 1).to_string()));
    let title = document.create_element("span")?;
    title.set_text_content(Some(&track.title));
    label.append_child(&number)?;
    label.append_child(&title)?;

    let duration: HtmlElement = document.create_element("span")?.dyn_into()?;
    duration.set_class_name("duration");
    set_style(&duration, "opacity", "0.7");
    set_style(&duration, "font-size", "13px");
    duration.set_text_content(Some("--:--"));

    row.append_child(&label)?;
    row.append_child(&duration)?;
    Ok((row, duration))
}
