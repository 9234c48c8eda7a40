//! artemis-core: Shared protocol library for the artemis client.
//!
//! Provides the inbound message model, kind resolution, the versioned
//! console protocol tables, and the little-endian Artemis wire codec.

pub mod codec;
pub mod error;
pub mod kind;
pub mod messages;
pub mod protocol;

// Re-export commonly used items at crate root.
pub use codec::{
    decode, encode_client, encode_server, Frame, FrameDecoder, DEFAULT_PORT, MAX_FRAME_LEN,
};
pub use error::{ArtemisError, ArtemisResult};
pub use kind::{resolve_kind_name, MessageKind};
pub use messages::{
    ClientPacket, Console, ConsoleAssignments, ConsoleStatus, DriveType, Message, ShipSettings,
    Version,
};
pub use protocol::ProtocolTable;
