//! The shell shown while a session is live.
//!
//! Packet output from the receive loop and this shell share stdout; lines
//! may interleave with the prompt.

use std::io::{Stdout, Write};

use artemis_client::{LoopStats, Processor, Sender};
use artemis_core::ClientPacket;
use clap::{Parser, Subcommand};
use tokio::task::JoinHandle;
use tracing::{debug, error};

use super::{parse_line, Prompt};

pub const PROMPT: &str = "artemis > ";

/// The spawned receive loop of the current session.
pub type ReceiveTask<W = Stdout> = JoinHandle<(Processor<W>, LoopStats)>;

#[derive(Parser, Debug)]
#[command(
    name = "connected",
    no_binary_name = true,
    disable_version_flag = true,
    help_template = "commands:\n{subcommands}"
)]
struct Line {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Tell the server this console is ready
    Ready,

    /// Leave the client
    #[command(alias = "exit")]
    Quit,
}

/// Prompt until the operator quits, input ends, or the server goes away.
pub async fn run<W>(prompt: &mut Prompt, sender: &Sender, receive: &mut ReceiveTask<W>, host: &str)
where
    W: Write + Send + 'static,
{
    loop {
        tokio::select! {
            line = prompt.read(PROMPT) => {
                let Some(line) = line else {
                    debug!("end of input in connected shell");
                    return;
                };
                let Some(Line { command }) = parse_line::<Line>(&line) else {
                    continue;
                };
                match command {
                    Command::Ready => {
                        if let Err(e) = sender.send(ClientPacket::Ready).await {
                            println!("\nconnection to {host} closed: {e}");
                            return;
                        }
                    }
                    Command::Quit => return,
                }
            }
            finished = &mut *receive => {
                match finished {
                    Ok((processor, stats)) => {
                        debug!(?stats, ship = ?processor.state().current_ship(), "session ended");
                    }
                    Err(e) => error!("receive loop failed: {}", e),
                }
                println!("\nconnection to {host} closed");
                return;
            }
        }
    }
}
