//! Interface trait for interactive-llm front-ends.
//!
//! Every front-end (terminal, web) is driven through this trait by `main`.

use anyhow::Result;

/// Trait implemented by each front-end
#[async_trait::async_trait]
pub trait Interface: Send {
    /// Initialize the interface
    async fn init(&mut self) -> Result<()>;

    /// Run the interface until the user quits or the server stops
    async fn run(&mut self) -> Result<()>;

    /// Cleanup the interface
    async fn cleanup(&mut self) -> Result<()>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}
