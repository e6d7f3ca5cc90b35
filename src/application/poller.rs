// Poll loop - fetch, ingest and publish one dashboard frame per cycle
use crate::application::dashboard_controller::DashboardController;
use crate::application::metrics_source::MetricsSource;
use crate::domain::dashboard::DashboardFrame;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, broadcast, watch};

/// Run one poll cycle. Returns whether the cycle produced a new frame.
///
/// The controller lock is not held while the fetch is in flight, so renders
/// requested by handlers only ever see complete cycles.
pub async fn poll_once(
    controller: &Mutex<DashboardController>,
    source: &dyn MetricsSource,
    frames: &broadcast::Sender<DashboardFrame>,
) -> bool {
    let snapshot = match source.fetch().await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!("Poll skipped, fetch failed: {:#}", e);
            controller.lock().await.note_fetch_failure(format!("{:#}", e));
            return false;
        }
    };

    let frame = {
        let mut controller = controller.lock().await;
        match controller.ingest(snapshot) {
            Ok(report) => {
                tracing::debug!(
                    "Cycle {} ingested ({} fields omitted)",
                    report.cycle,
                    report.omitted.len()
                );
                controller.frame()
            }
            Err(e) => {
                tracing::error!("Poll cycle failed: {}", e);
                return false;
            }
        }
    };

    // no subscribers is not an error
    let _ = frames.send(frame);
    true
}

/// Poll `source` until `shutdown` flips to true. The next cycle is scheduled
/// `interval` after the previous fetch completed, whether it succeeded or not.
pub async fn run_poll_loop(
    controller: Arc<Mutex<DashboardController>>,
    source: Arc<dyn MetricsSource>,
    interval: Duration,
    frames: broadcast::Sender<DashboardFrame>,
    mut shutdown: watch::Receiver<bool>,
) {
    tracing::info!("Polling every {:?}", interval);

    loop {
        if *shutdown.borrow() {
            break;
        }

        poll_once(&controller, source.as_ref(), &frames).await;

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    tracing::info!("Poll loop stopped");
}
