//! Versioned console tables.
//!
//! The server encodes console assignments positionally, and the set of
//! consoles changed across server releases. A `ProtocolTable` maps slot
//! positions to [`Console`] values for one range of server versions.

use std::fmt;

use crate::messages::{Console, Version};

const CONSOLES_PRE_2_1: &[Console] = &[
    Console::MainScreen,
    Console::Helm,
    Console::Weapons,
    Console::Engineering,
    Console::Science,
    Console::Communications,
    Console::Data,
    Console::Observer,
    Console::CaptainsMap,
    Console::GameMaster,
];

const CONSOLES_2_1: &[Console] = &[
    Console::MainScreen,
    Console::Helm,
    Console::Weapons,
    Console::Engineering,
    Console::Science,
    Console::Communications,
    Console::SingleSeatCraft,
    Console::Data,
    Console::Observer,
    Console::CaptainsMap,
    Console::GameMaster,
];

const CONSOLES_2_3: &[Console] = &[
    Console::MainScreen,
    Console::Helm,
    Console::Weapons,
    Console::Engineering,
    Console::Science,
    Console::Communications,
    Console::Fighter,
    Console::Data,
    Console::Observer,
    Console::CaptainsMap,
    Console::GameMaster,
];

/// One of the three console layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProtocolTable {
    /// Servers before 2.1.
    Pre2_1,
    /// Servers 2.1 and 2.2.
    V2_1,
    /// Servers 2.3 onwards, and any major version other than 2.
    #[default]
    V2_3,
}

impl ProtocolTable {
    /// Select the table for a server version. Total over `(major, minor)`;
    /// `patch` never matters.
    pub fn for_version(version: Version) -> Self {
        match (version.major, version.minor) {
            (2, minor) if minor < 1 => Self::Pre2_1,
            (2, 1 | 2) => Self::V2_1,
            _ => Self::V2_3,
        }
    }

    /// Consoles in slot order.
    pub fn consoles(self) -> &'static [Console] {
        match self {
            Self::Pre2_1 => CONSOLES_PRE_2_1,
            Self::V2_1 => CONSOLES_2_1,
            Self::V2_3 => CONSOLES_2_3,
        }
    }

    /// Console at slot `index`, if the table has that many slots.
    pub fn console_at(self, index: usize) -> Option<Console> {
        self.consoles().get(index).copied()
    }

    pub fn slot_count(self) -> usize {
        self.consoles().len()
    }
}

impl fmt::Display for ProtocolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pre2_1 => "pre-2.1",
            Self::V2_1 => "2.1-2.2",
            Self::V2_3 => "2.3+",
        };
        f.write_str(name)
    }
}
