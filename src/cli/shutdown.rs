use tokio::select;
use tokio_util::sync::CancellationToken;

/// Cancels `cancelation` when the user presses Ctrl-C. Installing the handler also keeps the
/// default SIGINT behaviour from killing the process halfway through a save.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            cancelation.cancel();
        },
        _ = cancelation.cancelled() => {},
    };
}
