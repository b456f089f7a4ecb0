use super::super::store::{MessagePatch, ThreadStore};
use crate::api::stream::StreamParser;
use crate::api::ByteStream;
use crate::types::{Confidence, SseFrame, StreamEvent};
use anyhow::Result;
use futures::StreamExt;
use parking_lot::Mutex;

/// Shown in place of the assistant reply when the query stream fails.
pub const STREAM_FAILURE_MESSAGE: &str = "Error: Failed to get response";

/// Running fold of the stream's `route`, `response` and `confidence` fields.
///
/// `response` is a cumulative snapshot, so each one replaces the content
/// outright. Empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseAccumulator {
    route: Option<String>,
    content: String,
    confidence: Option<Confidence>,
}

impl ResponseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: &StreamEvent) {
        if let Some(error) = &event.error {
            tracing::warn!(
                node = event.node.as_deref().unwrap_or("<none>"),
                error = %error,
                "backend reported a stream error"
            );
        }

        let Some(payload) = &event.data else {
            return;
        };
        if let Some(route) = payload.route.as_deref().filter(|r| !r.is_empty()) {
            self.route = Some(route.to_string());
        }
        if let Some(response) = payload.response.as_deref().filter(|r| !r.is_empty()) {
            self.content = response.to_string();
        }
        if let Some(confidence) = payload.confidence {
            self.confidence = Some(confidence);
        }
    }

    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn confidence(&self) -> Option<Confidence> {
        self.confidence
    }

    pub fn patch(&self) -> MessagePatch {
        MessagePatch {
            content: self.content.clone(),
            route: self.route.clone(),
            confidence: self.confidence,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamSummary {
    pub events: usize,
    pub saw_done: bool,
}

/// Decodes a query stream and writes the fold onto one bound message.
///
/// The target id is fixed at construction; if the message leaves the
/// visible list (thread switched, refetched, deleted) the writes become
/// no-ops.
pub struct StreamReducer {
    target_id: String,
    parser: StreamParser,
    accumulator: ResponseAccumulator,
    summary: StreamSummary,
}

impl StreamReducer {
    pub fn new(target_id: impl Into<String>) -> Self {
        Self {
            target_id: target_id.into(),
            parser: StreamParser::new(),
            accumulator: ResponseAccumulator::new(),
            summary: StreamSummary::default(),
        }
    }

    pub fn accumulator(&self) -> &ResponseAccumulator {
        &self.accumulator
    }

    /// Feeds one network chunk. Each decoded event is a separate store write.
    pub fn ingest(&mut self, chunk: &[u8], store: &Mutex<ThreadStore>) {
        for frame in self.parser.process(chunk) {
            self.apply_frame(frame, store);
        }
    }

    /// Flushes a trailing unterminated line once the body has closed.
    pub fn finish(&mut self, store: &Mutex<ThreadStore>) -> StreamSummary {
        if let Some(frame) = self.parser.finish() {
            self.apply_frame(frame, store);
        }
        self.summary
    }

    /// Reads the body to its end. `[DONE]` does not stop the loop.
    pub async fn run(
        mut self,
        mut stream: ByteStream,
        store: &Mutex<ThreadStore>,
    ) -> Result<StreamSummary> {
        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result?;
            self.ingest(&chunk, store);
        }
        Ok(self.finish(store))
    }

    fn apply_frame(&mut self, frame: SseFrame, store: &Mutex<ThreadStore>) {
        match frame {
            SseFrame::Done => {
                tracing::debug!(target_id = %self.target_id, "stream sentinel received");
                self.summary.saw_done = true;
            }
            SseFrame::Event(event) => {
                tracing::debug!(
                    node = event.node.as_deref().unwrap_or("<none>"),
                    "stream event"
                );
                self.accumulator.apply(&event);
                self.summary.events += 1;
                let patch = self.accumulator.patch();
                if !store.lock().apply_patch(&self.target_id, &patch) {
                    tracing::debug!(
                        target_id = %self.target_id,
                        "stream target no longer visible; update dropped"
                    );
                }
            }
        }
    }
}
