//! Data models: provider blocks, deals and configuration.

pub mod block;
pub mod config;
pub mod context;
pub mod deal;
