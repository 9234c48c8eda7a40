//! Session state derived from the inbound message stream.
//!
//! A `SessionState` has a single writer: the processor driven by the receive
//! loop. Derived values are computed on demand and never cached.

use artemis_core::messages::{ConsoleAssignments, ShipSettings, Version};
use artemis_core::protocol::ProtocolTable;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    ships: Option<Vec<ShipSettings>>,
    consoles: Option<ConsoleAssignments>,
    selected_index: Option<usize>,
    protocol_table: ProtocolTable,
    server_version: Option<Version>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ship roster, or `None` before the first roster message.
    pub fn ships(&self) -> Option<&[ShipSettings]> {
        self.ships.as_deref()
    }

    /// Console assignments, or `None` before the first status message.
    pub fn consoles(&self) -> Option<&ConsoleAssignments> {
        self.consoles.as_ref()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected_index
    }

    /// The selected ship. `None` whenever the roster or selection is missing,
    /// or the selection points past the end of the roster.
    pub fn current_ship(&self) -> Option<&ShipSettings> {
        let index = self.selected_index?;
        self.ships.as_ref()?.get(index)
    }

    /// Table used to decode console-bearing messages.
    pub fn protocol_table(&self) -> ProtocolTable {
        self.protocol_table
    }

    /// Last version reported by the server.
    pub fn server_version(&self) -> Option<Version> {
        self.server_version
    }

    pub(crate) fn set_ships(&mut self, ships: Vec<ShipSettings>) {
        self.ships = Some(ships);
    }

    pub(crate) fn set_consoles(&mut self, consoles: ConsoleAssignments, selected_index: usize) {
        self.consoles = Some(consoles);
        self.selected_index = Some(selected_index);
    }

    /// Record the server version and install the matching table.
    pub(crate) fn apply_version(&mut self, version: Version) -> ProtocolTable {
        self.server_version = Some(version);
        self.protocol_table = ProtocolTable::for_version(version);
        self.protocol_table
    }
}
