use super::super::store::{MessagePatch, SendPhase};
use super::streaming::{StreamReducer, STREAM_FAILURE_MESSAGE};
use super::{ConversationController, SendOutcome};
use crate::api::Transport;
use crate::types::{Message, Role};
use crate::util::preview;

impl<T: Transport + 'static> ConversationController<T> {
    /// Sends `content` to the active thread and streams the reply into a placeholder.
    ///
    /// Single-flight: returns `Skipped` without touching the store when no
    /// thread is active or a previous send has not settled.
    pub async fn send_message(&self, content: String) -> SendOutcome {
        let (thread_id, assistant_id) = {
            let mut store = self.store.lock();
            let Some(thread_id) = store.active_thread_id().map(str::to_string) else {
                tracing::debug!("send ignored: no active thread");
                return SendOutcome::Skipped;
            };
            if store.is_busy() {
                tracing::debug!(thread_id, "send ignored: a reply is still streaming");
                return SendOutcome::Skipped;
            }

            store.set_phase(SendPhase::Sending);
            store.append_message(Message::provisional(&thread_id, Role::User, content.clone()));
            let placeholder = Message::provisional(&thread_id, Role::Assistant, String::new());
            let assistant_id = placeholder.id.clone();
            store.append_in_flight(placeholder);
            (thread_id, assistant_id)
        };

        tracing::info!(thread_id, query = %preview(&content, 50), "sending query");
        let reducer = StreamReducer::new(assistant_id.clone());
        let result = match self.client.send_query(&thread_id, &content).await {
            Ok(stream) => {
                self.store.lock().set_phase(SendPhase::Streaming);
                reducer.run(stream, &self.store).await
            }
            Err(error) => Err(error),
        };

        let outcome = match result {
            Ok(summary) => {
                tracing::info!(
                    thread_id,
                    events = summary.events,
                    saw_done = summary.saw_done,
                    "stream completed"
                );
                self.store.lock().set_phase(SendPhase::SettledOk);
                SendOutcome::Completed
            }
            Err(error) => {
                tracing::warn!(thread_id, error = %error, "stream failed");
                let failure = MessagePatch {
                    content: STREAM_FAILURE_MESSAGE.to_string(),
                    route: None,
                    confidence: None,
                };
                let mut store = self.store.lock();
                store.apply_patch(&assistant_id, &failure);
                store.set_phase(SendPhase::SettledErr);
                SendOutcome::Failed
            }
        };
        self.store.lock().set_phase(SendPhase::Idle);

        if outcome == SendOutcome::Completed {
            self.spawn_thread_refresh();
        }
        outcome
    }

    /// Refreshes thread metadata (title, timestamps) without holding up the caller.
    fn spawn_thread_refresh(&self) {
        let controller = self.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    controller.list_threads().await;
                });
            }
            Err(_) => tracing::warn!("no tokio runtime; skipping thread list refresh"),
        }
    }
}
