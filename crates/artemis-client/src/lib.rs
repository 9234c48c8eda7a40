//! artemis-client: packet dispatch and session tracking for Artemis servers.
//!
//! Connects over TCP, decodes the inbound packet stream against the
//! session's active protocol table, and routes each message to a handler
//! that updates [`SessionState`] or prints to the operator.
//!
//! # Quick Start
//!
//! ```no_run
//! use artemis_client::{transport, ConnectConfig, Processor};
//! use artemis_core::ClientPacket;
//!
//! # async fn example() -> artemis_core::ArtemisResult<()> {
//! let (sender, inbound) = transport::connect("localhost", &ConnectConfig::default()).await?;
//! let rx = artemis_client::receive::spawn(inbound, Processor::stdout()?);
//!
//! sender.send(ClientPacket::Ready).await?;
//!
//! let (processor, _stats) = rx.await.expect("receive task panicked");
//! println!("{:?}", processor.state().current_ship());
//! # Ok(())
//! # }
//! ```

pub mod dispatch;
pub mod processor;
pub mod receive;
pub mod state;
pub mod transport;

// Re-export primary public types.
pub use dispatch::{Dispatcher, Handler, Outcome};
pub use processor::Processor;
pub use receive::LoopStats;
pub use state::SessionState;
pub use transport::{ConnectConfig, Inbound, Sender};

// Re-export artemis-core error types for convenience.
pub use artemis_core::{ArtemisError, ArtemisResult};
