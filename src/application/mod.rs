// Application layer - derivation, orchestration and the poll loop
pub mod dashboard_controller;
pub mod derive_engine;
pub mod metrics_source;
pub mod poller;
