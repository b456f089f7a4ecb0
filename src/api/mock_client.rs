use super::client::ByteStream;
use super::stream::StreamParser;
use super::Transport;
use crate::types::{Message, Role, SseFrame, Thread, ThreadWithMessages};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::{stream, StreamExt};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Backend calls that can be made to fail on the mock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockCall {
    ListThreads,
    CreateThread,
    FetchThread,
    RenameThread,
    DeleteThread,
    SendQuery,
}

enum ScriptedStream {
    Items(Vec<Result<Bytes>>),
    Channel(mpsc::UnboundedReceiver<Result<Bytes>>),
    OpenFailure(String),
}

#[derive(Default)]
struct MockState {
    threads: Vec<ThreadWithMessages>,
    streams: VecDeque<ScriptedStream>,
    failing: HashSet<MockCall>,
    calls: Vec<MockCall>,
    queries: Vec<(String, String)>,
    fetch_gates: HashMap<String, oneshot::Receiver<()>>,
    next_id: usize,
}

impl MockState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    /// Stores a message the way the backend does, under a server-minted id.
    fn persist_message(
        &mut self,
        thread_id: &str,
        role: Role,
        content: String,
        route: Option<String>,
    ) {
        let id = self.next_id("msg");
        let Some(entry) = self.threads.iter_mut().find(|t| t.thread.id == thread_id) else {
            return;
        };
        entry.messages.push(Message {
            id,
            thread_id: thread_id.to_string(),
            role,
            content,
            route,
            confidence: None,
            created_at: mock_timestamp(),
        });
    }
}

/// In-memory stand-in for the assistant backend.
#[derive(Clone, Default)]
pub struct MockApiClient {
    state: Arc<Mutex<MockState>>,
}

impl MockApiClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threads(threads: Vec<ThreadWithMessages>) -> Self {
        let client = Self::new();
        client.state.lock().threads = threads;
        client
    }

    /// Queues a response whose body is delivered exactly as the given chunks.
    pub fn enqueue_stream<S: Into<String>>(&self, chunks: Vec<S>) {
        let items = chunks
            .into_iter()
            .map(|chunk| Ok(Bytes::from(chunk.into())))
            .collect();
        self.enqueue_stream_items(items);
    }

    /// Queues a response that can also yield read errors mid-body.
    pub fn enqueue_stream_items(&self, items: Vec<Result<Bytes>>) {
        self.state
            .lock()
            .streams
            .push_back(ScriptedStream::Items(items));
    }

    /// Queues a response fed by the returned sender; the body ends when it is dropped.
    pub fn enqueue_channel_stream(&self) -> mpsc::UnboundedSender<Result<Bytes>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.state
            .lock()
            .streams
            .push_back(ScriptedStream::Channel(rx));
        tx
    }

    /// Queues a send whose request fails before any body is read.
    pub fn enqueue_open_failure(&self, reason: &str) {
        self.state
            .lock()
            .streams
            .push_back(ScriptedStream::OpenFailure(reason.to_string()));
    }

    /// Holds the next `fetch_thread(thread_id)` until the returned sender fires or drops.
    pub fn hold_fetch(&self, thread_id: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state
            .lock()
            .fetch_gates
            .insert(thread_id.to_string(), rx);
        tx
    }

    pub fn fail(&self, call: MockCall) {
        self.state.lock().failing.insert(call);
    }

    pub fn recover(&self, call: MockCall) {
        self.state.lock().failing.remove(&call);
    }

    pub fn call_count(&self, call: MockCall) -> usize {
        self.state.lock().calls.iter().filter(|c| **c == call).count()
    }

    /// `(thread_id, query)` pairs received by `send_query`, oldest first.
    pub fn queries(&self) -> Vec<(String, String)> {
        self.state.lock().queries.clone()
    }

    pub fn thread(&self, thread_id: &str) -> Option<Thread> {
        self.state
            .lock()
            .threads
            .iter()
            .find(|t| t.thread.id == thread_id)
            .map(|t| t.thread.clone())
    }

    fn begin(&self, call: MockCall) -> Result<parking_lot::MutexGuard<'_, MockState>> {
        let mut state = self.state.lock();
        state.calls.push(call);
        if state.failing.contains(&call) {
            return Err(anyhow!("MockApiClient: {call:?} configured to fail"));
        }
        Ok(state)
    }
}

/// Frames a JSON payload as one `data:` event.
pub fn sse_data(payload: &serde_json::Value) -> String {
    format!("data: {payload}\n\n")
}

fn mock_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[async_trait]
impl Transport for MockApiClient {
    async fn list_threads(&self) -> Result<Vec<Thread>> {
        let state = self.begin(MockCall::ListThreads)?;
        Ok(state.threads.iter().map(|t| t.thread.clone()).collect())
    }

    async fn create_thread(&self, title: &str) -> Result<Thread> {
        let mut state = self.begin(MockCall::CreateThread)?;
        let now = mock_timestamp();
        let thread = Thread {
            id: state.next_id("thread"),
            title: title.to_string(),
            created_at: now.clone(),
            updated_at: now,
        };
        state.threads.insert(
            0,
            ThreadWithMessages {
                thread: thread.clone(),
                messages: Vec::new(),
            },
        );
        Ok(thread)
    }

    async fn fetch_thread(&self, thread_id: &str) -> Result<ThreadWithMessages> {
        let gate = {
            let mut state = self.begin(MockCall::FetchThread)?;
            state.fetch_gates.remove(thread_id)
        };
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        self.state
            .lock()
            .threads
            .iter()
            .find(|t| t.thread.id == thread_id)
            .cloned()
            .ok_or_else(|| anyhow!("MockApiClient: thread '{thread_id}' not found"))
    }

    async fn rename_thread(&self, thread_id: &str, title: &str) -> Result<Thread> {
        let mut state = self.begin(MockCall::RenameThread)?;
        let entry = state
            .threads
            .iter_mut()
            .find(|t| t.thread.id == thread_id)
            .ok_or_else(|| anyhow!("MockApiClient: thread '{thread_id}' not found"))?;
        entry.thread.title = title.to_string();
        entry.thread.updated_at = mock_timestamp();
        Ok(entry.thread.clone())
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        let mut state = self.begin(MockCall::DeleteThread)?;
        let before = state.threads.len();
        state.threads.retain(|t| t.thread.id != thread_id);
        if state.threads.len() == before {
            return Err(anyhow!("MockApiClient: thread '{thread_id}' not found"));
        }
        Ok(())
    }

    async fn send_query(&self, thread_id: &str, query: &str) -> Result<ByteStream> {
        let mut state = self.begin(MockCall::SendQuery)?;
        state
            .queries
            .push((thread_id.to_string(), query.to_string()));

        let body: ByteStream = match state.streams.pop_front() {
            Some(ScriptedStream::Items(items)) => Box::pin(stream::iter(items)),
            Some(ScriptedStream::Channel(rx)) => {
                Box::pin(stream::unfold(rx, |mut rx| async move {
                    rx.recv().await.map(|item| (item, rx))
                }))
            }
            Some(ScriptedStream::OpenFailure(reason)) => {
                return Err(anyhow!("MockApiClient: send_query failed: {reason}"));
            }
            None => return Err(anyhow!("MockApiClient: No more responses configured")),
        };

        state.persist_message(thread_id, Role::User, query.to_string(), None);

        // The backend retitles fresh threads after the first query.
        if let Some(entry) = state.threads.iter_mut().find(|t| t.thread.id == thread_id) {
            if entry.thread.title == crate::config::DEFAULT_THREAD_TITLE {
                entry.thread.title = crate::util::preview(query, 50);
            }
            entry.thread.updated_at = mock_timestamp();
        }

        drop(state);

        Ok(ReplyRecorder::new(thread_id, Arc::clone(&self.state)).wrap(body))
    }
}

/// Watches a scripted body and stores the final reply once it closes cleanly,
/// as the backend does after its graph finishes.
struct ReplyRecorder {
    thread_id: String,
    state: Arc<Mutex<MockState>>,
    parser: StreamParser,
    route: Option<String>,
    response: Option<String>,
}

impl ReplyRecorder {
    fn new(thread_id: &str, state: Arc<Mutex<MockState>>) -> Self {
        Self {
            thread_id: thread_id.to_string(),
            state,
            parser: StreamParser::new(),
            route: None,
            response: None,
        }
    }

    fn wrap(self, body: ByteStream) -> ByteStream {
        Box::pin(stream::unfold(
            Some((body, self)),
            |slot| async move {
                let (mut body, mut recorder) = slot?;
                match body.next().await {
                    Some(Ok(chunk)) => {
                        recorder.observe(&chunk);
                        Some((Ok(chunk), Some((body, recorder))))
                    }
                    // A broken body is never stored.
                    Some(Err(error)) => Some((Err(error), None)),
                    None => {
                        recorder.persist();
                        None
                    }
                }
            },
        ))
    }

    fn observe(&mut self, chunk: &[u8]) {
        for frame in self.parser.process(chunk) {
            self.fold(frame);
        }
    }

    fn fold(&mut self, frame: SseFrame) {
        let SseFrame::Event(event) = frame else {
            return;
        };
        let Some(payload) = event.data else {
            return;
        };
        if let Some(route) = payload.route.filter(|r| !r.is_empty()) {
            self.route = Some(route);
        }
        if let Some(response) = payload.response.filter(|r| !r.is_empty()) {
            self.response = Some(response);
        }
    }

    fn persist(mut self) {
        if let Some(frame) = self.parser.finish() {
            self.fold(frame);
        }
        let Some(response) = self.response else {
            return;
        };
        self.state
            .lock()
            .persist_message(&self.thread_id, Role::Assistant, response, self.route);
    }
}
