//! Kind-keyed message dispatch.
//!
//! Handlers are registered once, by normalized handler name
//! (`comms_incoming`, `all_ship_settings`, ...). The name is resolved to a
//! [`MessageKind`] at registration, so dispatching a message is a table
//! lookup on its kind.

use std::collections::HashMap;

use artemis_core::error::{ArtemisError, ArtemisResult};
use artemis_core::kind::MessageKind;
use artemis_core::messages::Message;
use tracing::debug;

/// A handler takes ownership of the message it is given.
pub type Handler<T> = fn(&mut T, Message) -> ArtemisResult<()>;

/// Result of dispatching one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A handler ran and succeeded.
    Handled,
    /// No handler is registered for the message's kind.
    Unhandled {
        /// Declared (unnormalized) type name of the message.
        type_name: String,
    },
}

/// Routes messages to handlers operating on a target of type `T`.
pub struct Dispatcher<T> {
    handlers: HashMap<MessageKind, Handler<T>>,
}

impl<T> Default for Dispatcher<T> {
    fn default() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }
}

impl<T> Dispatcher<T> {
    /// Create a dispatcher with no handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under a handler name.
    ///
    /// Fails if no message kind normalizes to `name`. Registering the same
    /// kind twice replaces the earlier handler.
    pub fn register(&mut self, name: &str, handler: Handler<T>) -> ArtemisResult<()> {
        let kind = MessageKind::from_handler_name(name)
            .ok_or_else(|| ArtemisError::UnknownHandler(name.to_string()))?;
        if self.handlers.insert(kind, handler).is_some() {
            debug!(kind = %kind, "replaced handler");
        }
        Ok(())
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, name: &str, handler: Handler<T>) -> ArtemisResult<Self> {
        self.register(name, handler)?;
        Ok(self)
    }

    /// Whether a handler is registered for `kind`.
    pub fn handles(&self, kind: MessageKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Invoke the handler for `message` against `target`.
    ///
    /// A missing handler is not an error: the kind is logged and
    /// [`Outcome::Unhandled`] returned. Handler errors are propagated.
    pub fn dispatch(&self, target: &mut T, message: Message) -> ArtemisResult<Outcome> {
        match self.handlers.get(&message.kind()) {
            Some(handler) => {
                handler(target, message)?;
                Ok(Outcome::Handled)
            }
            None => {
                let type_name = message.type_name();
                debug!(kind = %type_name, "unhandled packet");
                Ok(Outcome::Unhandled { type_name })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use artemis_core::messages::Version;

    #[derive(Default)]
    struct Recorder {
        seen: Vec<String>,
    }

    fn record_version(r: &mut Recorder, message: Message) -> ArtemisResult<()> {
        if let Message::Version(v) = message {
            r.seen.push(format!("version {v}"));
        }
        Ok(())
    }

    fn record_noise(r: &mut Recorder, _message: Message) -> ArtemisResult<()> {
        r.seen.push("noise".into());
        Ok(())
    }

    fn fail(_r: &mut Recorder, _message: Message) -> ArtemisResult<()> {
        Err(ArtemisError::Other("handler failed".into()))
    }

    #[test]
    fn routes_by_kind() {
        let dispatcher = Dispatcher::new()
            .with("version", record_version)
            .unwrap()
            .with("NoisePacket", record_noise)
            .unwrap();
        let mut recorder = Recorder::default();

        let outcome = dispatcher
            .dispatch(&mut recorder, Message::Version(Version::new(2, 3, 0)))
            .unwrap();
        assert_eq!(outcome, Outcome::Handled);
        dispatcher.dispatch(&mut recorder, Message::Noise).unwrap();

        assert_eq!(recorder.seen, vec!["version 2.3.0", "noise"]);
    }

    #[test]
    fn missing_handler_is_unhandled_not_error() {
        let dispatcher: Dispatcher<Recorder> = Dispatcher::new();
        let mut recorder = Recorder::default();

        let outcome = dispatcher
            .dispatch(
                &mut recorder,
                Message::BeamFired {
                    beam_id: 1,
                    origin_id: 2,
                    target_id: 3,
                },
            )
            .unwrap();
        assert_eq!(
            outcome,
            Outcome::Unhandled {
                type_name: "BeamFiredPacket".into()
            }
        );

        let outcome = dispatcher
            .dispatch(
                &mut recorder,
                Message::Unknown {
                    packet_type: 0xabcd,
                    subtype: None,
                },
            )
            .unwrap();
        assert_eq!(
            outcome,
            Outcome::Unhandled {
                type_name: "UnknownPacket(0x0000abcd)".into()
            }
        );
        assert!(recorder.seen.is_empty());
    }

    #[test]
    fn unknown_handler_name_is_rejected() {
        let mut dispatcher: Dispatcher<Recorder> = Dispatcher::new();
        let err = dispatcher.register("beam_fired_packet_handler", record_noise);
        assert!(matches!(err, Err(ArtemisError::UnknownHandler(_))));
        assert!(!dispatcher.handles(MessageKind::BeamFired));
    }

    #[test]
    fn handler_errors_propagate() {
        let dispatcher = Dispatcher::new().with("heartbeat", fail).unwrap();
        let mut recorder = Recorder::default();
        assert!(dispatcher.dispatch(&mut recorder, Message::Heartbeat).is_err());
    }

    #[test]
    fn re_registering_replaces() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.register("heartbeat", fail).unwrap();
        dispatcher.register("heartbeat", record_noise).unwrap();
        let mut recorder = Recorder::default();
        dispatcher.dispatch(&mut recorder, Message::Heartbeat).unwrap();
        assert_eq!(recorder.seen, vec!["noise"]);
    }
}
