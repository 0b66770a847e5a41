use std::time::Duration;

#[cfg(not(target_arch = "wasm32"))]
pub async fn sleep(delay: Duration) {
    tokio::time::sleep(delay).await;
}

// The browser build has no tokio timer; backoff collapses to an immediate retry.
#[cfg(target_arch = "wasm32")]
pub async fn sleep(_delay: Duration) {}
