//! The receive loop.
//!
//! Drains an inbound frame sequence into a [`Processor`], one frame at a
//! time and in arrival order. Each frame is decoded with the protocol table
//! that is active when the frame reaches the front of the queue, so a
//! Version message changes how every later frame is read.

use std::io::Write;

use artemis_core::codec::{self, Frame};
use futures_util::{Stream, StreamExt};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::dispatch::Outcome;
use crate::processor::Processor;

/// Counters kept by a finished receive loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub handled: u64,
    pub unhandled: u64,
    /// Frames that failed to decode or whose handler failed.
    pub failed: u64,
}

/// Run until `inbound` ends, returning the processor and counters.
///
/// Decode and handler failures are logged and skipped; only the end of the
/// sequence stops the loop.
pub async fn run<S, W>(mut inbound: S, mut processor: Processor<W>) -> (Processor<W>, LoopStats)
where
    S: Stream<Item = Frame> + Unpin,
    W: Write,
{
    let mut stats = LoopStats::default();

    while let Some(frame) = inbound.next().await {
        let table = processor.state().protocol_table();
        let message = match codec::decode(&frame, table) {
            Ok(message) => message,
            Err(e) => {
                warn!(
                    packet_type = format_args!("0x{:08x}", frame.packet_type),
                    "failed to decode packet: {}", e
                );
                stats.failed += 1;
                continue;
            }
        };

        match processor.process(message) {
            Ok(Outcome::Handled) => stats.handled += 1,
            Ok(Outcome::Unhandled { .. }) => stats.unhandled += 1,
            Err(e) => {
                warn!("packet handler failed: {}", e);
                stats.failed += 1;
            }
        }
    }

    debug!(?stats, "receive loop ended");
    (processor, stats)
}

/// Spawn [`run`] as a background task.
pub fn spawn<S, W>(inbound: S, processor: Processor<W>) -> JoinHandle<(Processor<W>, LoopStats)>
where
    S: Stream<Item = Frame> + Unpin + Send + 'static,
    W: Write + Send + 'static,
{
    tokio::spawn(run(inbound, processor))
}
