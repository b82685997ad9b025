use anyhow::Result;

/// Everything in the daemon runs on one thread: the collector and the processor are joined
/// futures, and the open journal entry never crosses threads.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
