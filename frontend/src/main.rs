use wasm_logger;

fn main() {
    // Initialize the logger for WebAssembly
    wasm_logger::init(wasm_logger::Config::default());

    if let Err(e) = frontend::start() {
        log::error!("Page failed to start: {}", e);
    }
}
