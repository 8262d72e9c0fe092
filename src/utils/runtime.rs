use anyhow::Result;

/// The dashboard is driven by one thread of control. Task mutations and the metrics request share
/// it.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
