use std::cell::RefCell;
use std::f64::consts::PI;
use std::rc::{Rc, Weak};

use gloo_render::{request_animation_frame, AnimationFrame};
use gloo_timers::callback::Timeout;
use shared::settings::AmbientSettings;
use shared::shared_ambient::{particle_alpha, LampEffect, LampTick, ParticleField};
use shared::PageError;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlElement};

use crate::app::App;
use crate::dom;

/// Full-window canvas with falling particles, plus the flickering lamp backdrop.
pub struct Ambient {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
    lamp: Option<HtmlElement>,
    frame: RefCell<Option<AnimationFrame>>,
    lamp_tick: RefCell<Option<Timeout>>,
    lamp_hold: RefCell<Option<Timeout>>,
}

impl Ambient {
    pub fn new() -> Result<Self, PageError> {
        let canvas: HtmlCanvasElement = dom::required("snowCanvas")?;
        let context = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
            .ok_or(PageError::WrongAnchorType("snowCanvas"))?;

        Ok(Self {
            canvas,
            context,
            lamp: dom::by_id("lampBg"),
            frame: RefCell::new(None),
            lamp_tick: RefCell::new(None),
            lamp_hold: RefCell::new(None),
        })
    }

    pub fn resize(&self, width: f64, height: f64) {
        self.canvas.set_width(width as u32);
        self.canvas.set_height(height as u32);
    }

    pub fn draw(&self, field: &ParticleField, settings: &AmbientSettings) {
        let width = self.canvas.width() as f64;
        let height = self.canvas.height() as f64;
        self.context.clear_rect(0.0, 0.0, width, height);
        if !settings.enabled {
            return;
        }

        for p in field.particles() {
            let alpha = particle_alpha(p.base_alpha, settings.alpha_multiplier);
            self.context.begin_path();
            self.context.set_fill_style_str(&format!("rgba(255,255,255,{})", alpha));
            let _ = self.context.arc(p.x, p.y, p.radius, 0.0, 2.0 * PI);
            self.context.fill();
        }
    }

    /// Keeps one frame request in flight for as long as the app lives.
    pub fn schedule_frame(&self, app: Weak<App>) {
        let handle = request_animation_frame(move |_timestamp| {
            if let Some(app) = app.upgrade() {
                app.render_frame();
                app.ambient().schedule_frame(Rc::downgrade(&app));
            }
        });
        self.frame.replace(Some(handle));
    }

    pub fn start_lamp(&self, app: Weak<App>) {
        let Some(lamp) = self.lamp.clone() else {
            return;
        };
        let tick = LampTick::roll(&mut rand::thread_rng());

        if let Some((effect, hold_ms)) = tick.effect {
            // a new effect replaces whatever is still showing
            clear_lamp(&lamp);
            let _ = lamp.class_list().add_1(effect.class_name());
            let hold = Timeout::new(hold_ms, move || clear_lamp(&lamp));
            self.lamp_hold.replace(Some(hold));
        }

        let next = Timeout::new(tick.next_in_ms, move || {
            if let Some(app) = app.upgrade() {
                app.ambient().start_lamp(Rc::downgrade(&app));
            }
        });
        self.lamp_tick.replace(Some(next));
    }
}

fn clear_lamp(lamp: &HtmlElement) {
    for effect in LampEffect::ALL {
        let _ = lamp.class_list().remove_1(effect.class_name());
    }
}
