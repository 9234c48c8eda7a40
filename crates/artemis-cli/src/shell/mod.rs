//! Line-oriented operator shells.
//!
//! The client runs one of two shells at a time: [`disconnected`] until a
//! connection is made, then [`connected`] for the rest of the session.
//! Each input line is parsed as a clap command without a binary name.

pub mod connected;
pub mod disconnected;

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Input lines read on a dedicated thread.
///
/// Blocking stdin reads never sit on the runtime, so the process can exit
/// while a read is still pending.
pub struct Prompt {
    lines: mpsc::Receiver<String>,
}

impl Prompt {
    /// Read from the process's stdin.
    pub fn stdin() -> Result<Self> {
        Self::spawn(std::io::BufReader::new(std::io::stdin()))
    }

    /// Read from any line source until EOF.
    pub fn spawn<R: BufRead + Send + 'static>(reader: R) -> Result<Self> {
        let (tx, rx) = mpsc::channel::<String>(16);

        std::thread::Builder::new()
            .name("artemis-input".into())
            .spawn(move || {
                for line in reader.lines() {
                    match line {
                        Ok(line) => {
                            if tx.blocking_send(line).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            warn!("failed to read input: {}", e);
                            break;
                        }
                    }
                }
                debug!("input ended");
            })
            .context("failed to start input thread")?;

        Ok(Self { lines: rx })
    }

    /// Print `prompt` and wait for the next line. `None` at end of input.
    pub async fn read(&mut self, prompt: &str) -> Option<String> {
        print!("{prompt}");
        let _ = std::io::stdout().flush();
        self.lines.recv().await
    }
}

/// Parse one shell line into `P`.
///
/// Blank lines yield `None` silently. Usage errors and help requests are
/// printed and also yield `None`, so the shell simply re-prompts.
pub fn parse_line<P: Parser>(line: &str) -> Option<P> {
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.is_empty() {
        return None;
    }

    match P::try_parse_from(words) {
        Ok(command) => Some(command),
        Err(e) => {
            let _ = e.print();
            None
        }
    }
}
