use std::rc::Rc;

use gloo::events::EventListener;
use shared::{CopySource, PageEvent};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{spawn_local, JsFuture};

use crate::app::App;
use crate::dom;

/// Skill chips copy their label; the Discord button copies the configured handle.
pub fn wire(app: &Rc<App>, handle: &str) -> Vec<EventListener> {
    let mut listeners = Vec::new();

    for btn in dom::query_all(".skill-btn") {
        let chip = btn.clone();
        listeners.push(app.listen(&btn, "click", move |_| {
            dom::pulse(&chip);
            let text = chip
                .get_attribute("data-skill")
                .filter(|skill| !skill.is_empty())
                .unwrap_or_else(|| chip.text_content().unwrap_or_default().trim().to_string());
            Some(PageEvent::CopyRequested { text, source: CopySource::Skill })
        }));
    }

    if let Some(btn) = dom::by_id::<web_sys::HtmlElement>("discordBtn") {
        let chip = btn.clone();
        let handle = handle.to_string();
        listeners.push(app.listen(&btn, "click", move |_| {
            dom::pulse(&chip);
            Some(PageEvent::CopyRequested {
                text: handle.clone(),
                source: CopySource::Handle,
            })
        }));
    }

    listeners
}

/// Writes `text` and reports the outcome back to the session.
pub fn copy(app: &Rc<App>, text: String, source: CopySource) {
    let app = Rc::downgrade(app);
    spawn_local(async move {
        let ok = match write_text(&text).await {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Clipboard write failed: {:?}", e);
                false
            }
        };
        if let Some(app) = app.upgrade() {
            app.dispatch(PageEvent::CopyFinished { text, source, ok });
        }
    });
}

async fn write_text(text: &str) -> Result<(), JsValue> {
    let navigator = gloo_utils::window().navigator();
    let clipboard = js_sys::Reflect::get(&navigator, &JsValue::from_str("clipboard"))?;
    if clipboard.is_undefined() || clipboard.is_null() {
        return Err(JsValue::from_str("clipboard API unavailable"));
    }
    let write_fn: js_sys::Function =
        js_sys::Reflect::get(&clipboard, &JsValue::from_str("writeText"))?.dyn_into()?;
    let promise: js_sys::Promise = write_fn.call1(&clipboard, &JsValue::from_str(text))?.dyn_into()?;
    JsFuture::from(promise).await?;
    Ok(())
}
