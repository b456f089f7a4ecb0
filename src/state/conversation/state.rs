use super::super::store::{SendPhase, StoreSnapshot, StoreUpdate, ThreadStore};
use crate::api::Transport;
use crate::config::Config;
use crate::types::{Message, Thread};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Result of one `send_message` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// No active thread, or another send was still in flight.
    Skipped,
    Completed,
    /// The assistant placeholder now holds the failure message.
    Failed,
}

/// The user-facing operation set over a thread store and a backend transport.
///
/// Clones share the same store and client, so a send can run on its own
/// task while other intents are issued.
pub struct ConversationController<T: Transport> {
    pub(super) client: Arc<T>,
    pub(super) store: Arc<Mutex<ThreadStore>>,
    pub(super) default_thread_title: String,
}

impl<T: Transport> Clone for ConversationController<T> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            store: Arc::clone(&self.store),
            default_thread_title: self.default_thread_title.clone(),
        }
    }
}

impl<T: Transport> ConversationController<T> {
    pub fn new(client: T, config: &Config) -> Self {
        Self {
            client: Arc::new(client),
            store: Arc::new(Mutex::new(ThreadStore::new())),
            default_thread_title: config.default_thread_title.clone(),
        }
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<StoreUpdate> {
        self.store.lock().subscribe()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.store.lock().snapshot()
    }

    pub fn threads(&self) -> Vec<Thread> {
        self.store.lock().threads().to_vec()
    }

    pub fn active_thread_id(&self) -> Option<String> {
        self.store.lock().active_thread_id().map(str::to_string)
    }

    pub fn messages(&self) -> Vec<Message> {
        self.store.lock().messages().to_vec()
    }

    pub fn is_busy(&self) -> bool {
        self.store.lock().is_busy()
    }

    pub fn phase(&self) -> SendPhase {
        self.store.lock().phase()
    }
}
