//! Inbound message model and outbound client packets.

use std::fmt;

use crate::kind::MessageKind;

/// Server protocol version triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Ship propulsion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveType {
    Warp,
    Jump,
    /// A drive code this client does not know.
    Other(u32),
}

impl From<u32> for DriveType {
    fn from(v: u32) -> Self {
        match v {
            0 => Self::Warp,
            1 => Self::Jump,
            other => Self::Other(other),
        }
    }
}

impl From<DriveType> for u32 {
    fn from(d: DriveType) -> u32 {
        match d {
            DriveType::Warp => 0,
            DriveType::Jump => 1,
            DriveType::Other(v) => v,
        }
    }
}

/// Settings for one player ship slot, as reported by the server roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipSettings {
    pub name: String,
    pub drive: DriveType,
    /// Vessel hull identifier from the server's vessel data.
    pub hull_id: u32,
}

impl ShipSettings {
    pub fn new(name: impl Into<String>, drive: DriveType, hull_id: u32) -> Self {
        Self {
            name: name.into(),
            drive,
            hull_id,
        }
    }
}

/// A bridge station. Which stations exist, and at which slot, depends on the
/// active [`ProtocolTable`](crate::protocol::ProtocolTable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Console {
    MainScreen,
    Helm,
    Weapons,
    Engineering,
    Science,
    Communications,
    SingleSeatCraft,
    Fighter,
    Data,
    Observer,
    CaptainsMap,
    GameMaster,
}

impl fmt::Display for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MainScreen => "main screen",
            Self::Helm => "helm",
            Self::Weapons => "weapons",
            Self::Engineering => "engineering",
            Self::Science => "science",
            Self::Communications => "communications",
            Self::SingleSeatCraft => "single-seat craft",
            Self::Fighter => "fighter",
            Self::Data => "data",
            Self::Observer => "observer",
            Self::CaptainsMap => "captain's map",
            Self::GameMaster => "game master",
        };
        f.write_str(name)
    }
}

/// Availability of a console on the selected ship.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleStatus {
    Available,
    Yours,
    Unavailable,
}

impl TryFrom<u8> for ConsoleStatus {
    type Error = String;
    fn try_from(v: u8) -> Result<Self, String> {
        match v {
            0 => Ok(Self::Available),
            1 => Ok(Self::Yours),
            2 => Ok(Self::Unavailable),
            _ => Err(format!("unknown console status: {v}")),
        }
    }
}

impl From<ConsoleStatus> for u8 {
    fn from(s: ConsoleStatus) -> u8 {
        match s {
            ConsoleStatus::Available => 0,
            ConsoleStatus::Yours => 1,
            ConsoleStatus::Unavailable => 2,
        }
    }
}

/// Console/role assignment for a ship, one entry per table slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsoleAssignments {
    slots: Vec<(Console, ConsoleStatus)>,
}

impl ConsoleAssignments {
    pub fn new(slots: Vec<(Console, ConsoleStatus)>) -> Self {
        Self { slots }
    }

    /// Status of `console`, or `None` if the active table has no such slot.
    pub fn status(&self, console: Console) -> Option<ConsoleStatus> {
        self.slots
            .iter()
            .find(|(c, _)| *c == console)
            .map(|(_, status)| *status)
    }

    /// Consoles held by this client.
    pub fn claimed(&self) -> impl Iterator<Item = Console> + '_ {
        self.slots
            .iter()
            .filter(|(_, status)| *status == ConsoleStatus::Yours)
            .map(|(console, _)| *console)
    }

    pub fn slots(&self) -> &[(Console, ConsoleStatus)] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// A decoded inbound message. Immutable once produced by the decoder.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Full roster of player ships.
    AllShipSettings { ships: Vec<ShipSettings> },
    /// Console assignments for the selected ship.
    ConsoleStatus {
        /// Index of the selected ship in the roster.
        ship: u32,
        consoles: ConsoleAssignments,
    },
    Heartbeat,
    Version(Version),
    CommsIncoming {
        priority: u32,
        sender: String,
        message: String,
    },
    /// World object deltas. Kept raw; object tracking is not modelled.
    ObjectUpdate { payload: Vec<u8> },
    Noise,
    Welcome { message: String },
    BeamFired {
        beam_id: u32,
        origin_id: u32,
        target_id: u32,
    },
    Intel {
        object_id: u32,
        intel_type: u8,
        text: String,
    },
    /// A frame whose type tag the decoder does not recognise.
    Unknown {
        packet_type: u32,
        subtype: Option<u32>,
    },
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::AllShipSettings { .. } => MessageKind::AllShipSettings,
            Self::ConsoleStatus { .. } => MessageKind::ConsoleStatus,
            Self::Heartbeat => MessageKind::Heartbeat,
            Self::Version(_) => MessageKind::Version,
            Self::CommsIncoming { .. } => MessageKind::CommsIncoming,
            Self::ObjectUpdate { .. } => MessageKind::ObjectUpdate,
            Self::Noise => MessageKind::Noise,
            Self::Welcome { .. } => MessageKind::Welcome,
            Self::BeamFired { .. } => MessageKind::BeamFired,
            Self::Intel { .. } => MessageKind::Intel,
            Self::Unknown { .. } => MessageKind::Unknown,
        }
    }

    /// Declared type name, with the raw type tag for unrecognised frames.
    pub fn type_name(&self) -> String {
        match self {
            Self::Unknown {
                packet_type,
                subtype: Some(sub),
            } => format!("UnknownPacket(0x{packet_type:08x}/0x{sub:02x})"),
            Self::Unknown {
                packet_type,
                subtype: None,
            } => format!("UnknownPacket(0x{packet_type:08x})"),
            other => other.kind().type_name().to_string(),
        }
    }
}

/// Packets this client sends to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientPacket {
    /// Signal that this console is ready to start.
    Ready,
    /// Client keepalive.
    Heartbeat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_type_name_carries_tag() {
        let msg = Message::Unknown {
            packet_type: 0x1234_abcd,
            subtype: Some(0x2a),
        };
        assert_eq!(msg.type_name(), "UnknownPacket(0x1234abcd/0x2a)");
        assert_eq!(msg.kind(), MessageKind::Unknown);
    }

    #[test]
    fn known_type_name_is_declared_name() {
        assert_eq!(Message::Noise.type_name(), "NoisePacket");
        assert_eq!(
            Message::Version(Version::new(2, 1, 0)).type_name(),
            "VersionPacket"
        );
    }

    #[test]
    fn claimed_consoles() {
        let assignments = ConsoleAssignments::new(vec![
            (Console::MainScreen, ConsoleStatus::Unavailable),
            (Console::Helm, ConsoleStatus::Yours),
            (Console::Weapons, ConsoleStatus::Available),
            (Console::Science, ConsoleStatus::Yours),
        ]);
        let claimed: Vec<Console> = assignments.claimed().collect();
        assert_eq!(claimed, vec![Console::Helm, Console::Science]);
        assert_eq!(assignments.status(Console::Weapons), Some(ConsoleStatus::Available));
        assert_eq!(assignments.status(Console::Fighter), None);
    }

    #[test]
    fn drive_type_codes() {
        assert_eq!(DriveType::from(0), DriveType::Warp);
        assert_eq!(DriveType::from(1), DriveType::Jump);
        assert_eq!(DriveType::from(7), DriveType::Other(7));
        assert_eq!(u32::from(DriveType::Jump), 1);
    }

    #[test]
    fn console_status_codes() {
        assert_eq!(ConsoleStatus::try_from(1), Ok(ConsoleStatus::Yours));
        assert!(ConsoleStatus::try_from(9).is_err());
    }
}
