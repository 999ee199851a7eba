mod api;

pub use api::{format_size, is_drag_activation, validate_upload, NoteEngine};

use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    #[cfg(all(debug_assertions, target_arch = "wasm32"))]
    web_sys::console::log_1(&"NexusNote engine loaded".into());
}
