// Application state for HTTP handlers
use crate::application::dashboard_controller::DashboardController;
use crate::domain::dashboard::DashboardFrame;
use tokio::sync::{Mutex, broadcast, watch};

pub struct AppState {
    pub controller: std::sync::Arc<Mutex<DashboardController>>,
    pub frames: broadcast::Sender<DashboardFrame>,
    pub shutdown: watch::Receiver<bool>,
}
