use shared::shared_coin_game::Rect;
use shared::PageError;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Element, Event, HtmlElement, Node};

/// Elements that coin tokens must never cover.
const EXCLUDED_IDS: [&str; 4] = ["settingsToggle", "settingsPanel", "wheelBtn", "coinCounter"];
const EXCLUDED_SELECTORS: [&str; 4] = ["main.card", ".right", ".profile", ".card-footer"];

/// Looks up an anchor the page can live without.
pub fn by_id<T: JsCast>(id: &str) -> Option<T> {
    gloo_utils::document()
        .get_element_by_id(id)
        .and_then(|el| el.dyn_into::<T>().ok())
}

/// Looks up an anchor the page cannot run without.
pub fn required<T: JsCast>(id: &'static str) -> Result<T, PageError> {
    let el = gloo_utils::document()
        .get_element_by_id(id)
        .ok_or(PageError::MissingAnchor(id))?;
    el.dyn_into::<T>().map_err(|_| PageError::WrongAnchorType(id))
}

pub fn query(selector: &str) -> Option<Element> {
    gloo_utils::document().query_selector(selector).ok().flatten()
}

pub fn query_all(selector: &str) -> Vec<HtmlElement> {
    let Ok(nodes) = gloo_utils::document().query_selector_all(selector) else {
        return Vec::new();
    };
    (0..nodes.length())
        .filter_map(|i| nodes.item(i))
        .filter_map(|node| node.dyn_into::<HtmlElement>().ok())
        .collect()
}

pub fn to_rect(el: &Element) -> Rect {
    let r = el.get_bounding_client_rect();
    Rect {
        left: r.left(),
        top: r.top(),
        right: r.right(),
        bottom: r.bottom(),
    }
}

/// Current bounding boxes of the page chrome. Measured on every call since the
/// layout can change between spawns.
pub fn exclusion_rects() -> Vec<Rect> {
    let document = gloo_utils::document();
    EXCLUDED_IDS
        .iter()
        .filter_map(|id| document.get_element_by_id(id))
        .chain(EXCLUDED_SELECTORS.iter().filter_map(|sel| query(sel)))
        .map(|el| to_rect(&el))
        .collect()
}

pub fn event_target_node(event: &Event) -> Option<Node> {
    event.target().and_then(|t| t.dyn_into::<Node>().ok())
}

/// True when `target` is inside any of `regions`.
pub fn within(target: Option<&Node>, regions: &[Option<&HtmlElement>]) -> bool {
    regions
        .iter()
        .flatten()
        .any(|region| region.contains(target))
}

pub fn same_node(a: &JsValue, b: &JsValue) -> bool {
    a == b
}

pub fn set_style(el: &HtmlElement, property: &str, value: &str) {
    if let Err(e) = el.style().set_property(property, value) {
        log::warn!("Failed to set {}: {:?}", property, e);
    }
}

pub fn set_text(el: Option<&HtmlElement>, text: &str) {
    if let Some(el) = el {
        el.set_text_content(Some(text));
    }
}

pub fn set_class(el: &Element, class: &str, on: bool) {
    let _ = el.class_list().toggle_with_force(class, on);
}

/// Restarts a one-shot CSS animation bound to the `bump` class.
pub fn pulse(el: &HtmlElement) {
    let _ = el.class_list().remove_1("bump");
    // reflow so the animation restarts
    let _ = el.offset_width();
    let _ = el.class_list().add_1("bump");
}
