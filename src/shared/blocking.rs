//! Usage: Run blocking (sqlite) work off the async thread with a task label for diagnostics.

pub(crate) async fn run<T, F>(label: &'static str, task: F) -> Result<T, String>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, String> + Send + 'static,
{
    match tokio::task::spawn_blocking(task).await {
        Ok(result) => result,
        Err(err) => {
            tracing::error!(task = label, "blocking task join failed: {err}");
            Err(format!("TASK_ERROR: {label}: {err}"))
        }
    }
}
