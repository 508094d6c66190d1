// Library root: the event pipeline (normalize, filter, aggregate, rank), the
// tournament cache and the dashboard views built on top of it.

pub mod aggregate;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod export;
pub mod filter;
pub mod metrics;
pub mod model;
pub mod normalize;
pub mod positions;
pub mod ranking;
pub mod source;
pub mod views;
