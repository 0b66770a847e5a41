/// Runs a synchronous database call from async code. The grid drives one
/// request at a time on the UI thread, so the call is made in place.
pub fn run_blocking<F, T>(f: F) -> T
where
    F: FnOnce() -> T,
{
    f()
}
