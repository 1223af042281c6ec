pub mod app;
pub mod core;
pub mod dedup;
pub mod queue;
