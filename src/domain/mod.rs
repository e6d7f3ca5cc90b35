// Domain layer - measurement history, derivation inputs and chart rendering
pub mod chart;
pub mod dashboard;
pub mod derived;
pub mod error;
pub mod registry;
pub mod snapshot;
pub mod units;
