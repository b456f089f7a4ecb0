mod core;
mod state;
mod streaming;
mod threads;


pub use state::{ConversationController, SendOutcome};
pub use streaming::{ResponseAccumulator, StreamReducer, StreamSummary, STREAM_FAILURE_MESSAGE};
