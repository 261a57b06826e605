use shared::settings::DeviceProfile;
use shared::shared_coin_game::Viewport;
use shared::PageConfig;
use wasm_bindgen::JsValue;
use web_sys::window;

const CONFIG_ELEMENT_ID: &str = "page-config";
const NARROW_QUERY: &str = "(max-width:700px)";

/// Reads the optional inline `<script type="application/json" id="page-config">`
/// block. Anything unreadable falls back to the defaults.
pub fn load_page_config() -> PageConfig {
    let raw = gloo_utils::document()
        .get_element_by_id(CONFIG_ELEMENT_ID)
        .and_then(|el| el.text_content());

    match raw {
        Some(raw) if !raw.trim().is_empty() => match PageConfig::from_json(&raw) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{}, using defaults", e);
                PageConfig::default()
            }
        },
        _ => PageConfig::default(),
    }
}

pub fn detect_device() -> DeviceProfile {
    let Some(window) = window() else {
        return DeviceProfile::desktop();
    };

    let has_touch_handler = js_sys::Reflect::has(&window, &JsValue::from_str("ontouchstart"))
        .unwrap_or(false);
    let touch = has_touch_handler || window.navigator().max_touch_points() > 0;
    let narrow = window
        .match_media(NARROW_QUERY)
        .ok()
        .flatten()
        .map_or(false, |query| query.matches());

    DeviceProfile { touch, narrow }
}

/// Visible viewport, the larger of the layout width and the window width.
pub fn viewport() -> Viewport {
    let window = gloo_utils::window();
    let inner_width = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    let inner_height = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    let (client_width, client_height) = gloo_utils::document()
        .document_element()
        .map(|root| (root.client_width() as f64, root.client_height() as f64))
        .unwrap_or((0.0, 0.0));

    Viewport {
        width: client_width.max(inner_width),
        height: client_height.max(inner_height),
    }
}

/// Size of the window itself, used for the canvas backing store.
pub fn window_size() -> (f64, f64) {
    let window = gloo_utils::window();
    let width = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    let height = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    (width, height)
}
