pub mod app;
pub mod components;
pub mod config;
pub mod dom;
pub mod storage;

use wasm_bindgen::prelude::*;

pub use app::start;

/// Current coin balance, for poking at the page from the devtools console.
#[wasm_bindgen]
pub fn debug_coins() -> u32 {
    app::with_app(|app| app.balance()).unwrap_or(0)
}

#[wasm_bindgen]
pub fn debug_add_coins(amount: u32) {
    app::with_app(|app| app.credit_debug(amount));
}
