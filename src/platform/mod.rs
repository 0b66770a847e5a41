#[cfg(not(target_arch = "wasm32"))]
pub mod desktop;
pub mod timer;
