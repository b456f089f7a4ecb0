use crate::types::{Confidence, Message, Thread};
use tokio::sync::mpsc;

/// Lifecycle of a single `send_message` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SendPhase {
    #[default]
    Idle,
    /// Optimistic messages are appended; the query call is being opened.
    Sending,
    Streaming,
    SettledOk,
    SettledErr,
}

impl SendPhase {
    pub fn is_busy(self) -> bool {
        matches!(self, SendPhase::Sending | SendPhase::Streaming)
    }
}

/// Published to subscribers after every store mutation, in mutation order.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreUpdate {
    ThreadsReplaced,
    ThreadAdded { thread_id: String },
    ThreadChanged { thread_id: String },
    ThreadRemoved { thread_id: String },
    ActiveThreadChanged(Option<String>),
    MessagesReplaced,
    MessageAppended { message_id: String },
    MessageUpdated { message_id: String },
    PhaseChanged(SendPhase),
}

/// Displayable fields the stream reducer writes onto its target message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessagePatch {
    pub content: String,
    pub route: Option<String>,
    pub confidence: Option<Confidence>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreSnapshot {
    pub threads: Vec<Thread>,
    pub active_thread_id: Option<String>,
    pub messages: Vec<Message>,
    pub phase: SendPhase,
    pub in_flight_message_id: Option<String>,
}

impl StoreSnapshot {
    pub fn is_busy(&self) -> bool {
        self.phase.is_busy()
    }
}

/// Client-side state: thread list, selection, and the visible messages.
#[derive(Default)]
pub struct ThreadStore {
    threads: Vec<Thread>,
    active_thread_id: Option<String>,
    messages: Vec<Message>,
    phase: SendPhase,
    in_flight: Option<String>,
    subscribers: Vec<mpsc::UnboundedSender<StoreUpdate>>,
}

impl ThreadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<StoreUpdate> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn threads(&self) -> &[Thread] {
        &self.threads
    }

    pub fn active_thread_id(&self) -> Option<&str> {
        self.active_thread_id.as_deref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message(&self, message_id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == message_id)
    }

    pub fn phase(&self) -> SendPhase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase.is_busy()
    }

    pub fn in_flight_message_id(&self) -> Option<&str> {
        self.in_flight.as_deref()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            threads: self.threads.clone(),
            active_thread_id: self.active_thread_id.clone(),
            messages: self.messages.clone(),
            phase: self.phase,
            in_flight_message_id: self.in_flight.clone(),
        }
    }

    pub fn replace_threads(&mut self, threads: Vec<Thread>) {
        self.threads = threads;
        self.emit(StoreUpdate::ThreadsReplaced);
    }

    pub fn prepend_thread(&mut self, thread: Thread) {
        let thread_id = thread.id.clone();
        self.threads.insert(0, thread);
        self.emit(StoreUpdate::ThreadAdded { thread_id });
    }

    /// Swaps in a fresh copy of a listed thread. Returns false if it is not listed.
    pub fn replace_thread(&mut self, thread: Thread) -> bool {
        let Some(slot) = self.threads.iter_mut().find(|t| t.id == thread.id) else {
            return false;
        };
        let thread_id = thread.id.clone();
        *slot = thread;
        self.emit(StoreUpdate::ThreadChanged { thread_id });
        true
    }

    pub fn remove_thread(&mut self, thread_id: &str) -> bool {
        let before = self.threads.len();
        self.threads.retain(|t| t.id != thread_id);
        if self.threads.len() == before {
            return false;
        }
        self.emit(StoreUpdate::ThreadRemoved {
            thread_id: thread_id.to_string(),
        });
        true
    }

    pub fn set_active_thread(&mut self, thread_id: Option<String>) {
        self.active_thread_id = thread_id.clone();
        self.emit(StoreUpdate::ActiveThreadChanged(thread_id));
    }

    pub fn replace_messages(&mut self, messages: Vec<Message>) {
        self.messages = messages;
        self.emit(StoreUpdate::MessagesReplaced);
    }

    pub fn append_message(&mut self, message: Message) {
        let message_id = message.id.clone();
        self.messages.push(message);
        self.emit(StoreUpdate::MessageAppended { message_id });
    }

    /// Appends the assistant placeholder and marks it as the one in-flight message.
    pub fn append_in_flight(&mut self, message: Message) {
        self.in_flight = Some(message.id.clone());
        self.append_message(message);
    }

    /// Overwrites a message's displayable fields. No-op if the id is not visible.
    pub fn apply_patch(&mut self, message_id: &str, patch: &MessagePatch) -> bool {
        let Some(message) = self.messages.iter_mut().find(|m| m.id == message_id) else {
            return false;
        };
        message.content = patch.content.clone();
        message.route = patch.route.clone();
        message.confidence = patch.confidence;
        self.emit(StoreUpdate::MessageUpdated {
            message_id: message_id.to_string(),
        });
        true
    }

    pub fn set_phase(&mut self, phase: SendPhase) {
        if self.phase == phase {
            return;
        }
        self.phase = phase;
        if !phase.is_busy() {
            self.in_flight = None;
        }
        self.emit(StoreUpdate::PhaseChanged(phase));
    }

    fn emit(&mut self, update: StoreUpdate) {
        self.subscribers.retain(|tx| tx.send(update.clone()).is_ok());
    }
}
