// realmfeed-api: Live push transport and wire codec for entity streams

pub mod error;
pub mod message;
pub mod transport;

pub use error::Error;
pub use message::{DecodedFrame, LiveMessage, WireUpsert, decode_frame};
pub use transport::{FrameStream, Transport, WebSocketTransport};
