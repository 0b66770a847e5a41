mod app;
mod config;
mod domain;
mod infra;
mod platform;
mod ui;
mod usecase;


use app::App;

fn main() {
    init_tracing();

    #[cfg(feature = "desktop")]
    launch_desktop();

    #[cfg(not(feature = "desktop"))]
    dioxus::launch(App);
}

#[cfg(not(target_arch = "wasm32"))]
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // dioxus may already have installed a subscriber
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(target_arch = "wasm32")]
fn init_tracing() {}

#[cfg(feature = "desktop")]
fn launch_desktop() {
    let mut cfg = dioxus::desktop::Config::new()
        .with_window(dioxus::desktop::WindowBuilder::new().with_title("ARK Database"));
    match config::default_webview_data_dir() {
        Ok(dir) => cfg = cfg.with_data_directory(dir),
        Err(err) => tracing::warn!(error = %err, "using default webview data directory"),
    }

    dioxus::LaunchBuilder::desktop().with_cfg(cfg).launch(App);
}
