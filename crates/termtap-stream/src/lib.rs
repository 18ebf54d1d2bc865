//! termtap-stream: durable per-pane output capture.
//!
//! Every byte a pane emits is mirrored to an append-only stream file by
//! the multiplexer's pipe facility; a JSON sidecar tracks per-command byte
//! ranges and named read marks so output can be sliced by command id or
//! "since last read". Files survive supervisor restarts; marks are
//! rebuilt only for commands issued by the current supervisor.

pub mod meta;
pub mod registry;
pub mod stream;

pub use meta::{CommandMark, LAST_READ, StreamMetadata};
pub use registry::{StreamRegistry, default_stream_dir};
pub use stream::{PaneStream, StreamError};
