pub mod config;
pub mod engine;
pub mod filter;
pub mod limits;
pub mod logging;
pub mod model;
pub mod observability;
pub mod request;
