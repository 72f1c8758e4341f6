pub mod models;
pub mod probe;
pub mod serve;

use anyhow::Context;

/// Runtime for the async commands.
fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("failed to start tokio runtime")
}
