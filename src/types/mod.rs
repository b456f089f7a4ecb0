mod stream;
mod thread;

pub use stream::{SseFrame, StreamEvent, StreamPayload};
pub use thread::{Confidence, Message, Role, Thread, ThreadWithMessages, LOCAL_ID_PREFIX};
