use std::cell::RefCell;

use gloo_timers::callback::Timeout;
use wasm_bindgen::JsCast;
use web_sys::HtmlElement;

use crate::dom::{self, set_style};

/// Transient notification line. A new message replaces the current one and
/// restarts its hide timer.
pub struct Toast {
    el: Option<HtmlElement>,
    duration_ms: u32,
    hide: RefCell<Option<Timeout>>,
}

impl Toast {
    pub fn new(duration_ms: u32) -> Self {
        Self {
            el: dom::by_id("toast"),
            duration_ms,
            hide: RefCell::new(None),
        }
    }

    pub fn show(&self, text: &str) {
        match &self.el {
            Some(el) => {
                el.set_text_content(Some(text));
                set_style(el, "opacity", "1");
                let el = el.clone();
                let timer = Timeout::new(self.duration_ms, move || set_style(&el, "opacity", "0"));
                // dropping the previous timer cancels it
                self.hide.replace(Some(timer));
            }
            None => show_detached(text),
        }
    }
}

/// Pages without a `#toast` anchor get a throwaway bubble instead.
fn show_detached(text: &str) {
    let document = gloo_utils::document();
    let Some(body) = document.body() else {
        return;
    };
    let Ok(el) = document.create_element("div") else {
        return;
    };
    let Ok(el) = el.dyn_into::<HtmlElement>() else {
        return;
    };
    el.set_text_content(Some(text));
    for (property, value) in [
        ("position", "fixed"),
        ("left", "50%"),
        ("bottom", "22px"),
        ("transform", "translateX(-50%)"),
        ("background", "rgba(0,0,0,0.7)"),
        ("color", "#fff"),
        ("padding", "8px 12px"),
        ("border-radius", "8px"),
        ("z-index", "10005"),
    ] {
        set_style(&el, property, value);
    }
    if body.append_child(&el).is_err() {
        return;
    }

    let fading = el.clone();
    Timeout::new(1400, move || set_style(&fading, "opacity", "0")).forget();
    Timeout::new(2000, move || el.remove()).forget();
}
