use super::ConversationController;
use crate::api::Transport;
use crate::types::Thread;

impl<T: Transport> ConversationController<T> {
    /// Replaces the thread list with the backend's. Failures leave it as is.
    pub async fn list_threads(&self) {
        match self.client.list_threads().await {
            Ok(threads) => {
                tracing::debug!(count = threads.len(), "thread list refreshed");
                self.store.lock().replace_threads(threads);
            }
            Err(error) => tracing::warn!(error = %error, "failed to fetch threads"),
        }
    }

    pub async fn create_thread(&self) -> Option<Thread> {
        match self.client.create_thread(&self.default_thread_title).await {
            Ok(thread) => {
                tracing::info!(thread_id = %thread.id, "thread created");
                let mut store = self.store.lock();
                store.prepend_thread(thread.clone());
                store.set_active_thread(Some(thread.id.clone()));
                store.replace_messages(Vec::new());
                Some(thread)
            }
            Err(error) => {
                tracing::warn!(error = %error, "failed to create thread");
                None
            }
        }
    }

    /// Activates `thread_id` immediately, then loads its messages.
    ///
    /// On failure the previous message list stays visible. A response that
    /// arrives after the user has moved to another thread is discarded.
    pub async fn select_thread(&self, thread_id: &str) {
        self.store
            .lock()
            .set_active_thread(Some(thread_id.to_string()));

        match self.client.fetch_thread(thread_id).await {
            Ok(detail) => {
                let mut store = self.store.lock();
                if store.active_thread_id() != Some(thread_id) {
                    tracing::debug!(
                        thread_id,
                        "selection changed while loading; dropping stale thread"
                    );
                    return;
                }
                tracing::debug!(
                    thread_id,
                    messages = detail.messages.len(),
                    "thread loaded"
                );
                store.replace_messages(detail.messages);
            }
            Err(error) => tracing::warn!(thread_id, error = %error, "failed to fetch thread"),
        }
    }

    pub async fn delete_thread(&self, thread_id: &str) -> bool {
        if let Err(error) = self.client.delete_thread(thread_id).await {
            tracing::warn!(thread_id, error = %error, "failed to delete thread");
            return false;
        }

        tracing::info!(thread_id, "thread deleted");
        let mut store = self.store.lock();
        store.remove_thread(thread_id);
        if store.active_thread_id() == Some(thread_id) {
            store.set_active_thread(None);
            store.replace_messages(Vec::new());
        }
        true
    }

    pub async fn rename_thread(&self, thread_id: &str, title: &str) -> Option<Thread> {
        match self.client.rename_thread(thread_id, title).await {
            Ok(thread) => {
                tracing::info!(thread_id, "thread renamed");
                self.store.lock().replace_thread(thread.clone());
                Some(thread)
            }
            Err(error) => {
                tracing::warn!(thread_id, error = %error, "failed to rename thread");
                None
            }
        }
    }
}
