pub mod client;
pub mod logging;
pub mod mock_client;
pub mod stream;

pub use client::{ApiClient, ByteStream};

use crate::types::{Thread, ThreadWithMessages};
use anyhow::Result;
use async_trait::async_trait;

/// Calls the conversation controller makes against the assistant backend.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn list_threads(&self) -> Result<Vec<Thread>>;
    async fn create_thread(&self, title: &str) -> Result<Thread>;
    async fn fetch_thread(&self, thread_id: &str) -> Result<ThreadWithMessages>;
    async fn rename_thread(&self, thread_id: &str, title: &str) -> Result<Thread>;
    async fn delete_thread(&self, thread_id: &str) -> Result<()>;
    /// Opens the streaming query call; the body is `data:`-framed events.
    async fn send_query(&self, thread_id: &str, query: &str) -> Result<ByteStream>;
}
