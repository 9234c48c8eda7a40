//! The message processor: binds one [`SessionState`] to the handler set.
//!
//! Operator-visible output (welcome text, incoming comms, the version banner,
//! unhandled-packet notices) goes to the processor's writer, stdout by
//! default. The processor is not reentrant; feed it from one task only.

use std::io::{self, Stdout, Write};

use artemis_core::error::{ArtemisError, ArtemisResult};
use artemis_core::kind::MessageKind;
use artemis_core::messages::Message;
use tracing::{debug, info, warn};

use crate::dispatch::{Dispatcher, Outcome};
use crate::state::SessionState;

/// What handlers operate on.
pub struct HandlerContext<W> {
    state: SessionState,
    out: W,
}

/// Applies inbound messages to one session's state.
///
/// Handlers are bound at construction; output goes to `W`.
pub struct Processor<W: Write = Stdout> {
    dispatcher: Dispatcher<HandlerContext<W>>,
    context: HandlerContext<W>,
}

impl Processor<Stdout> {
    /// A processor printing to stdout.
    pub fn stdout() -> ArtemisResult<Self> {
        Self::new(io::stdout())
    }
}

impl<W: Write> Processor<W> {
    /// Create a processor with fresh session state, writing output to `out`.
    pub fn new(out: W) -> ArtemisResult<Self> {
        let dispatcher = Dispatcher::new()
            .with("all_ship_settings", all_ship_settings::<W>)?
            .with("console_status", console_status::<W>)?
            .with("heartbeat", ignore::<W>)?
            .with("comms_incoming", comms_incoming::<W>)?
            .with("welcome", welcome::<W>)?
            .with("version", version::<W>)?
            .with("object_update", ignore::<W>)?
            .with("noise", ignore::<W>)?
            .with("intel", ignore::<W>)?;

        Ok(Self {
            dispatcher,
            context: HandlerContext {
                state: SessionState::new(),
                out,
            },
        })
    }

    /// Apply one message. Unhandled kinds are reported on the output and
    /// are not an error, even if the report cannot be written.
    pub fn process(&mut self, message: Message) -> ArtemisResult<Outcome> {
        let outcome = self.dispatcher.dispatch(&mut self.context, message)?;
        if let Outcome::Unhandled { type_name } = &outcome {
            let out = &mut self.context.out;
            let reported = writeln!(out, "--- unhandled packet: {type_name} ---")
                .and_then(|_| out.flush());
            if let Err(e) = reported {
                warn!(kind = %type_name, "failed to report unhandled packet: {}", e);
            }
        }
        Ok(outcome)
    }

    /// The session state built so far.
    pub fn state(&self) -> &SessionState {
        &self.context.state
    }

    /// Whether a handler is registered for `kind`.
    pub fn handles(&self, kind: MessageKind) -> bool {
        self.dispatcher.handles(kind)
    }

    /// The output writer.
    pub fn output(&self) -> &W {
        &self.context.out
    }

    /// Consume the processor, returning its output writer.
    pub fn into_output(self) -> W {
        self.context.out
    }
}

fn mismatched(expected: MessageKind, got: &Message) -> ArtemisError {
    ArtemisError::InvalidMessage(format!(
        "{} handler given {}",
        expected.handler_name(),
        got.type_name()
    ))
}

// ── Handlers ─────────────────────────────────────────────────────────

fn all_ship_settings<W: Write>(ctx: &mut HandlerContext<W>, message: Message) -> ArtemisResult<()> {
    let ships = match message {
        Message::AllShipSettings { ships } => ships,
        other => return Err(mismatched(MessageKind::AllShipSettings, &other)),
    };
    debug!(count = ships.len(), "ship roster updated");
    ctx.state.set_ships(ships);
    Ok(())
}

fn console_status<W: Write>(ctx: &mut HandlerContext<W>, message: Message) -> ArtemisResult<()> {
    let (ship, consoles) = match message {
        Message::ConsoleStatus { ship, consoles } => (ship, consoles),
        other => return Err(mismatched(MessageKind::ConsoleStatus, &other)),
    };
    debug!(ship, "console status updated");
    ctx.state.set_consoles(consoles, ship as usize);
    Ok(())
}

fn comms_incoming<W: Write>(ctx: &mut HandlerContext<W>, message: Message) -> ArtemisResult<()> {
    let (sender, text) = match message {
        Message::CommsIncoming {
            sender, message, ..
        } => (sender, message),
        other => return Err(mismatched(MessageKind::CommsIncoming, &other)),
    };
    writeln!(ctx.out, "incoming message from {sender}: {text}")?;
    ctx.out.flush()?;
    Ok(())
}

fn welcome<W: Write>(ctx: &mut HandlerContext<W>, message: Message) -> ArtemisResult<()> {
    let text = match message {
        Message::Welcome { message } => message,
        other => return Err(mismatched(MessageKind::Welcome, &other)),
    };
    writeln!(ctx.out, "{text}")?;
    ctx.out.flush()?;
    Ok(())
}

fn version<W: Write>(ctx: &mut HandlerContext<W>, message: Message) -> ArtemisResult<()> {
    let version = match message {
        Message::Version(version) => version,
        other => return Err(mismatched(MessageKind::Version, &other)),
    };
    // The table swap must not depend on the banner reaching the operator.
    let table = ctx.state.apply_version(version);
    info!(%version, %table, "installed protocol table");
    writeln!(ctx.out, "server v{version}")?;
    ctx.out.flush()?;
    Ok(())
}

/// Recognized kinds with no effect on state.
fn ignore<W: Write>(_ctx: &mut HandlerContext<W>, _message: Message) -> ArtemisResult<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use artemis_core::messages::{
        Console, ConsoleAssignments, ConsoleStatus, DriveType, ShipSettings, Version,
    };
    use artemis_core::protocol::ProtocolTable;

    fn processor() -> Processor<Vec<u8>> {
        Processor::new(Vec::new()).unwrap()
    }

    fn printed(p: &Processor<Vec<u8>>) -> String {
        String::from_utf8(p.output().clone()).unwrap()
    }

    fn ships() -> Vec<ShipSettings> {
        vec![
            ShipSettings::new("Artemis", DriveType::Warp, 0),
            ShipSettings::new("Intrepid", DriveType::Jump, 1),
            ShipSettings::new("Aegis", DriveType::Warp, 2),
        ]
    }

    #[test]
    fn roster_replaces_ships_in_order() {
        let mut p = processor();
        p.process(Message::AllShipSettings { ships: ships() }).unwrap();
        assert_eq!(p.state().ships(), Some(ships().as_slice()));

        let smaller = vec![ShipSettings::new("Solo", DriveType::Jump, 9)];
        p.process(Message::AllShipSettings {
            ships: smaller.clone(),
        })
        .unwrap();
        assert_eq!(p.state().ships(), Some(smaller.as_slice()));
        assert!(printed(&p).is_empty());
    }

    #[test]
    fn console_status_selects_ship() {
        let mut p = processor();
        p.process(Message::AllShipSettings { ships: ships() }).unwrap();
        for i in 0..3 {
            p.process(Message::ConsoleStatus {
                ship: i,
                consoles: ConsoleAssignments::default(),
            })
            .unwrap();
            assert_eq!(p.state().current_ship(), ships().get(i as usize));
        }
    }

    #[test]
    fn console_status_before_roster_leaves_ship_absent() {
        let mut p = processor();
        let consoles = ConsoleAssignments::new(vec![(Console::Helm, ConsoleStatus::Yours)]);
        p.process(Message::ConsoleStatus {
            ship: 0,
            consoles: consoles.clone(),
        })
        .unwrap();
        assert_eq!(p.state().consoles(), Some(&consoles));
        assert_eq!(p.state().selected_index(), Some(0));
        assert!(p.state().current_ship().is_none());
    }

    #[test]
    fn version_prints_banner_and_installs_table() {
        let cases = [
            ((1, 5), ProtocolTable::V2_3),
            ((2, 0), ProtocolTable::Pre2_1),
            ((2, 1), ProtocolTable::V2_1),
            ((2, 2), ProtocolTable::V2_1),
            ((2, 3), ProtocolTable::V2_3),
            ((3, 0), ProtocolTable::V2_3),
        ];
        for ((major, minor), expected) in cases {
            let mut p = processor();
            p.process(Message::Version(Version::new(major, minor, 7))).unwrap();
            assert_eq!(p.state().protocol_table(), expected, "{major}.{minor}");
            assert_eq!(printed(&p), format!("server v{major}.{minor}.7\n"));
        }
    }

    #[test]
    fn comms_and_welcome_are_printed() {
        let mut p = processor();
        p.process(Message::Welcome {
            message: "Welcome aboard.".into(),
        })
        .unwrap();
        p.process(Message::CommsIncoming {
            priority: 2,
            sender: "DS3".into(),
            message: "We need supplies.".into(),
        })
        .unwrap();
        assert_eq!(
            printed(&p),
            "Welcome aboard.\nincoming message from DS3: We need supplies.\n"
        );
        assert_eq!(p.state(), &SessionState::new());
    }

    #[test]
    fn ignored_kinds_are_handled_without_effect() {
        let mut p = processor();
        let before = p.state().clone();
        let quiet = vec![
            Message::Heartbeat,
            Message::ObjectUpdate {
                payload: vec![1, 2, 3],
            },
            Message::Noise,
            Message::Intel {
                object_id: 4,
                intel_type: 1,
                text: "Kralien cruiser".into(),
            },
        ];
        for message in quiet {
            assert_eq!(p.process(message).unwrap(), Outcome::Handled);
        }
        assert_eq!(p.state(), &before);
        assert!(printed(&p).is_empty());
    }

    #[test]
    fn unhandled_kinds_are_reported() {
        let mut p = processor();
        let outcome = p
            .process(Message::BeamFired {
                beam_id: 1,
                origin_id: 2,
                target_id: 3,
            })
            .unwrap();
        assert!(matches!(outcome, Outcome::Unhandled { .. }));
        assert_eq!(printed(&p), "--- unhandled packet: BeamFiredPacket ---\n");
        assert!(!p.handles(MessageKind::BeamFired));
        assert!(!p.handles(MessageKind::Unknown));
        assert!(p.handles(MessageKind::Intel));
    }

    /// A writer whose every write fails, like stdout piped into a closed reader.
    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe"))
        }
    }

    #[test]
    fn version_installs_table_even_when_output_fails() {
        let mut p = Processor::new(BrokenPipe).unwrap();
        let result = p.process(Message::Version(Version::new(2, 0, 0)));
        assert!(matches!(result, Err(ArtemisError::Io(_))));
        assert_eq!(p.state().protocol_table(), ProtocolTable::Pre2_1);
        assert_eq!(p.state().server_version(), Some(Version::new(2, 0, 0)));
    }

    #[test]
    fn unhandled_stays_unhandled_when_output_fails() {
        let mut p = Processor::new(BrokenPipe).unwrap();
        let outcome = p
            .process(Message::BeamFired {
                beam_id: 1,
                origin_id: 2,
                target_id: 3,
            })
            .unwrap();
        assert_eq!(
            outcome,
            Outcome::Unhandled {
                type_name: "BeamFiredPacket".into()
            }
        );
    }
}
