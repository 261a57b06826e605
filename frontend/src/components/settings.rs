use std::rc::Rc;

use gloo::events::EventListener;
use shared::PageEvent;
use web_sys::{HtmlElement, HtmlInputElement};

use crate::app::App;
use crate::dom::{self, set_style};

/// Settings gear, its panel and the animation/spawn controls inside it.
pub struct SettingsPanel {
    pub toggle: Option<HtmlElement>,
    pub panel: Option<HtmlElement>,
    opacity: Option<HtmlInputElement>,
    density: Option<HtmlInputElement>,
    spawn: Option<HtmlInputElement>,
}

impl SettingsPanel {
    pub fn new() -> Self {
        Self {
            toggle: dom::by_id("settingsToggle"),
            panel: dom::by_id("settingsPanel"),
            opacity: dom::by_id("snowOpacity"),
            density: dom::by_id("snowDensity"),
            spawn: dom::by_id("spawnCoinsToggle"),
        }
    }

    pub fn wire(&self, app: &Rc<App>) -> Vec<EventListener> {
        let mut listeners = Vec::new();
        if let Some(toggle) = &self.toggle {
            listeners.push(app.listen(toggle, "click", |_| Some(PageEvent::SettingsPressed)));
        }
        if let Some(slider) = &self.opacity {
            let input = slider.clone();
            listeners.push(app.listen(slider, "input", move |_| {
                Some(PageEvent::OpacityInput(input.value_as_number()))
            }));
        }
        if let Some(slider) = &self.density {
            let input = slider.clone();
            listeners.push(app.listen(slider, "input", move |_| {
                Some(PageEvent::DensityInput(input.value_as_number()))
            }));
        }
        if let Some(checkbox) = &self.spawn {
            let input = checkbox.clone();
            listeners.push(app.listen(checkbox, "change", move |_| {
                Some(PageEvent::SpawnToggled(input.checked()))
            }));
        }
        listeners
    }

    pub fn show(&self, open: bool) {
        if let Some(panel) = &self.panel {
            set_style(panel, "display", if open { "flex" } else { "none" });
            let _ = panel.set_attribute("aria-hidden", if open { "false" } else { "true" });
        }
    }

    pub fn sync_sliders(&self, opacity: f64, density: f64) {
        if let Some(slider) = &self.opacity {
            slider.set_value(&opacity.to_string());
        }
        if let Some(slider) = &self.density {
            slider.set_value(&density.to_string());
        }
    }

    pub fn set_spawn_checked(&self, enabled: bool) {
        if let Some(checkbox) = &self.spawn {
            checkbox.set_checked(enabled);
        }
    }
}
