use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use gloo::events::EventListener;
use gloo_timers::callback::Timeout;
use shared::shared_coin_game::TokenId;
use shared::shared_wheel_game::{SettleVia, SpinId};
use shared::PageEvent;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{HtmlButtonElement, HtmlElement, TransitionEvent};

use crate::app::App;
use crate::dom::{self, set_class, set_style, set_text};

/// A token on screen together with everything that keeps it interactive.
struct LiveToken {
    el: HtmlElement,
    _listeners: [EventListener; 2],
    /// Expiry while live, removal after the exit transition once collected.
    _timer: Timeout,
}

/// Completion signals for the running spin. Dropping it cancels both.
struct SpinWatch {
    spin: SpinId,
    _transition_end: Option<EventListener>,
    _fallback: Timeout,
}

/// Coin counter, spawned tokens and the prize wheel overlay.
pub struct Minigame {
    counter: Option<HtmlElement>,
    count: Option<HtmlElement>,
    wheel_btn: Option<HtmlElement>,
    overlay: Option<HtmlElement>,
    wheel: Option<HtmlElement>,
    spin_btn: Option<HtmlButtonElement>,
    close_btn: Option<HtmlButtonElement>,
    result: Option<HtmlElement>,
    tokens: RefCell<HashMap<TokenId, LiveToken>>,
    spin_watch: RefCell<Option<SpinWatch>>,
}

impl Minigame {
    pub fn new() -> Self {
        Self {
            counter: dom::by_id("coinCounter"),
            count: dom::by_id("coinCount"),
            wheel_btn: dom::by_id("wheelBtn"),
            overlay: dom::by_id("wheelOverlay"),
            wheel: dom::by_id("wheel"),
            spin_btn: dom::by_id("spinBtn"),
            close_btn: dom::by_id("closeWheel"),
            result: dom::by_id("wheelResult"),
            tokens: RefCell::new(HashMap::new()),
            spin_watch: RefCell::new(None),
        }
    }

    pub fn wire(&self, app: &Rc<App>) -> Vec<EventListener> {
        let mut listeners = Vec::new();
        if let Some(btn) = &self.wheel_btn {
            listeners.push(app.listen(btn, "click", |_| Some(PageEvent::WheelOpenPressed)));
        }
        if let Some(btn) = &self.close_btn {
            listeners.push(app.listen(btn, "click", |_| Some(PageEvent::WheelClosePressed)));
        }
        if let Some(btn) = &self.spin_btn {
            listeners.push(app.listen(btn, "click", |_| Some(PageEvent::SpinPressed)));
        }
        if let Some(overlay) = &self.overlay {
            let backdrop = overlay.clone();
            listeners.push(app.listen(overlay, "click", move |e| {
                let target = e.target()?;
                dom::same_node(&target, &backdrop).then_some(PageEvent::WheelBackdropClicked)
            }));
        }
        listeners
    }

    pub fn set_count(&self, balance: u32) {
        set_text(self.count.as_ref(), &balance.to_string());
        if let Some(counter) = &self.counter {
            dom::pulse(counter);
        }
    }

    /// Permanently removes every minigame surface from view.
    pub fn hide(&self) {
        for el in [&self.counter, &self.wheel_btn, &self.overlay].into_iter().flatten() {
            set_style(el, "display", "none");
        }
    }

    pub fn show_wheel(&self, open: bool) {
        if let Some(overlay) = &self.overlay {
            set_class(overlay, "open", open);
            let _ = overlay.set_attribute("aria-hidden", if open { "false" } else { "true" });
        }
    }

    pub fn reset_wheel(&self) {
        if let Some(wheel) = &self.wheel {
            set_style(wheel, "transition", "none");
            set_style(wheel, "transform", "rotate(0deg)");
        }
    }

    pub fn set_result(&self, text: &str) {
        set_text(self.result.as_ref(), text);
    }

    pub fn set_spin_controls(&self, busy: bool, label: &str) {
        if let Some(btn) = &self.spin_btn {
            btn.set_disabled(busy);
            btn.set_text_content(Some(label));
        }
        if let Some(btn) = &self.close_btn {
            btn.set_disabled(busy);
        }
    }

    /// Starts the CSS rotation and arms both completion signals.
    pub fn start_spin(&self, app: &Rc<App>, spin: SpinId, target_deg: f64, duration_ms: u32, fallback_ms: u32) {
        let transition_end = self.wheel.as_ref().map(|wheel| {
            set_style(
                wheel,
                "transition",
                &format!("transform {}s cubic-bezier(.14,.9,.36,1)", duration_ms as f64 / 1000.0),
            );
            // reflow so the transition starts from the reset angle
            let _ = wheel.offset_width();
            set_style(wheel, "transform", &format!("rotate({}deg)", target_deg));

            app.listen(wheel, "transitionend", move |e| {
                let end = e.dyn_ref::<TransitionEvent>()?;
                (end.property_name() == "transform").then_some(PageEvent::SpinSettled {
                    spin,
                    via: SettleVia::Completion,
                })
            })
        });

        let weak = Rc::downgrade(app);
        let fallback = Timeout::new(fallback_ms, move || {
            if let Some(app) = weak.upgrade() {
                app.dispatch(PageEvent::SpinSettled { spin, via: SettleVia::Fallback });
            }
        });

        self.spin_watch.replace(Some(SpinWatch {
            spin,
            _transition_end: transition_end,
            _fallback: fallback,
        }));
    }

    pub fn end_spin(&self, spin: SpinId) {
        let mut watch = self.spin_watch.borrow_mut();
        if watch.as_ref().map_or(false, |w| w.spin == spin) {
            watch.take();
        }
    }

    pub fn spawn_token(&self, app: &Rc<App>, id: TokenId, x: f64, y: f64, lifetime_ms: u32) -> Result<(), JsValue> {
        let document = gloo_utils::document();
        let el: HtmlElement = document.create_element("div")?.dyn_into()?;
        el.set_class_name("coin spawn-anim");
        el.set_text_content(Some("¢"));
        set_style(&el, "left", &format!("{}px", x));
        set_style(&el, "top", &format!("{}px", y));
        set_style(&el, "opacity", "0.92");

        let body = document.body().ok_or_else(|| JsValue::from_str("document has no body"))?;
        body.append_child(&el)?;

        // pointerdown lands first; click covers devices that never send it
        let listeners = [
            app.listen(&el, "pointerdown", move |_| Some(PageEvent::TokenPressed(id))),
            app.listen(&el, "click", move |_| Some(PageEvent::TokenPressed(id))),
        ];
        let weak = Rc::downgrade(app);
        let expiry = Timeout::new(lifetime_ms, move || {
            if let Some(app) = weak.upgrade() {
                app.dispatch(PageEvent::TokenExpired(id));
            }
        });

        self.tokens.borrow_mut().insert(
            id,
            LiveToken {
                el,
                _listeners: listeners,
                _timer: expiry,
            },
        );
        Ok(())
    }

    /// Plays the exit transition and schedules the removal. Replacing the
    /// timer cancels the pending expiry.
    pub fn collect_token(&self, app: &Rc<App>, id: TokenId, fade_ms: u32) {
        let mut tokens = self.tokens.borrow_mut();
        let Some(token) = tokens.get_mut(&id) else {
            return;
        };
        set_style(&token.el, "pointer-events", "none");
        set_style(&token.el, "transform", "scale(1.4) translateY(-8px)");
        set_style(&token.el, "opacity", "0");

        let weak = Rc::downgrade(app);
        token._timer = Timeout::new(fade_ms, move || {
            if let Some(app) = weak.upgrade() {
                app.dispatch(PageEvent::TokenFaded(id));
            }
        });
    }

    pub fn remove_token(&self, id: TokenId) {
        let removed = self.tokens.borrow_mut().remove(&id);
        if let Some(token) = removed {
            token.el.remove();
        }
    }
}
