//! Message kinds and handler-name resolution.
//!
//! Every inbound packet type has a declared CamelCase type name such as
//! `AllShipSettingsPacket`. Handlers are keyed by the normalized snake_case
//! form of that name (`all_ship_settings`), produced by [`resolve_kind_name`].

/// Marker token stripped from declared type names before normalization.
const PACKET_TOKEN: &str = "Packet";

/// Discriminant of an inbound [`Message`](crate::messages::Message).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    AllShipSettings,
    ConsoleStatus,
    Heartbeat,
    Version,
    CommsIncoming,
    ObjectUpdate,
    Noise,
    Welcome,
    BeamFired,
    Intel,
    Unknown,
}

impl MessageKind {
    /// Every kind, in declaration order.
    pub const ALL: [MessageKind; 11] = [
        Self::AllShipSettings,
        Self::ConsoleStatus,
        Self::Heartbeat,
        Self::Version,
        Self::CommsIncoming,
        Self::ObjectUpdate,
        Self::Noise,
        Self::Welcome,
        Self::BeamFired,
        Self::Intel,
        Self::Unknown,
    ];

    /// The declared protocol type name for this kind.
    pub fn type_name(self) -> &'static str {
        match self {
            Self::AllShipSettings => "AllShipSettingsPacket",
            Self::ConsoleStatus => "ConsoleStatusPacket",
            Self::Heartbeat => "HeartbeatPacket",
            Self::Version => "VersionPacket",
            Self::CommsIncoming => "CommsIncomingPacket",
            Self::ObjectUpdate => "ObjectUpdatePacket",
            Self::Noise => "NoisePacket",
            Self::Welcome => "WelcomePacket",
            Self::BeamFired => "BeamFiredPacket",
            Self::Intel => "IntelPacket",
            Self::Unknown => "UnknownPacket",
        }
    }

    /// The normalized handler name for this kind.
    pub fn handler_name(self) -> String {
        resolve_kind_name(self.type_name())
    }

    /// Find the kind whose normalized handler name equals `name`.
    ///
    /// `name` is normalized first, so both `comms_incoming` and
    /// `CommsIncomingPacket` resolve to [`MessageKind::CommsIncoming`].
    pub fn from_handler_name(name: &str) -> Option<Self> {
        let wanted = resolve_kind_name(name);
        Self::ALL
            .into_iter()
            .find(|kind| kind.handler_name() == wanted)
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Normalize a declared type name into a handler-lookup key.
///
/// Removes every `Packet` token, then splits CamelCase words with `_` and
/// lowercases the result:
///
/// - a capitalized word (`[A-Z][a-z]+`) preceded by any character gets a
///   separator, which splits acronyms from the word that follows them
///   (`HTTPResponse` → `http_response`);
/// - an uppercase letter directly after a lowercase letter or digit gets a
///   separator (`Ship2Ship` → `ship2_ship`).
///
/// Already-normalized names pass through unchanged.
pub fn resolve_kind_name(type_name: &str) -> String {
    let stripped = type_name.replace(PACKET_TOKEN, "");
    let words = split_capitalized_words(&stripped);
    split_lower_upper(&words).to_lowercase()
}

/// First pass: insert `_` between any character and a following
/// capitalized word. Matches do not overlap; scanning resumes after the
/// lowercase run of each match.
fn split_capitalized_words(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len() + 8);
    let mut i = 0;

    while i < chars.len() {
        let starts_word = chars[i] != '\n'
            && chars.get(i + 1).is_some_and(|c| c.is_ascii_uppercase())
            && chars.get(i + 2).is_some_and(|c| c.is_ascii_lowercase());

        if starts_word {
            let mut end = i + 2;
            while chars.get(end).is_some_and(|c| c.is_ascii_lowercase()) {
                end += 1;
            }
            out.push(chars[i]);
            out.push('_');
            out.extend(&chars[i + 1..end]);
            i = end;
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }

    out
}

/// Second pass: insert `_` between a lowercase letter or digit and a
/// following uppercase letter.
fn split_lower_upper(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len() + 8);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let boundary = (c.is_ascii_lowercase() || c.is_ascii_digit())
            && chars.get(i + 1).is_some_and(|n| n.is_ascii_uppercase());

        out.push(c);
        if boundary {
            out.push('_');
            out.push(chars[i + 1]);
            i += 2;
        } else {
            i += 1;
        }
    }

    out
}
