mod conversation;
mod store;

pub use conversation::{
    ConversationController, ResponseAccumulator, SendOutcome, StreamReducer, StreamSummary,
    STREAM_FAILURE_MESSAGE,
};
pub use store::{MessagePatch, SendPhase, StoreSnapshot, StoreUpdate, ThreadStore};
