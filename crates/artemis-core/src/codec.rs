//! Artemis wire codec.
//!
//! Wire format (all integers little-endian):
//! `[magic 0xdeadbeef][total length][origin][padding 0][remaining length][packet type][payload]`
//!
//! `total length` covers the whole frame including the 24-byte header;
//! `remaining length` is `total length - 20`.

use crate::error::{ArtemisError, ArtemisResult};
use crate::messages::{
    ClientPacket, ConsoleAssignments, ConsoleStatus, Message, ShipSettings, Version,
};
use crate::protocol::ProtocolTable;

/// Default Artemis server port.
pub const DEFAULT_PORT: u16 = 2010;

const MAGIC: u32 = 0xdead_beef;
const HEADER_LEN: usize = 24;
/// Bytes preceding the `remaining length` count.
const PREAMBLE_LEN: usize = 20;
/// Largest frame accepted from the wire, header included.
pub const MAX_FRAME_LEN: usize = 1_048_576;

pub const ORIGIN_SERVER: u32 = 1;
pub const ORIGIN_CLIENT: u32 = 2;

/// Packet type tags.
pub mod packet_type {
    pub const WELCOME: u32 = 0x6d04_b3da;
    pub const VERSION: u32 = 0xe548_e74a;
    pub const CONSOLE_STATUS: u32 = 0x19c6_e2d4;
    pub const HEARTBEAT: u32 = 0xf582_1226;
    pub const OBJECT_UPDATE: u32 = 0x8080_3df9;
    pub const INTEL: u32 = 0xee66_5279;
    pub const COMMS_INCOMING: u32 = 0xd672_c35f;
    pub const BEAM_FIRED: u32 = 0xb83f_d2c4;
    /// Server event family; the first payload word is a subtype.
    pub const SIMPLE_EVENT: u32 = 0xf754_c8fe;
    /// Client request family; the first payload word is a subtype.
    pub const VALUE_INT: u32 = 0x4c82_1d3c;
}

/// Subtype tags inside the `SIMPLE_EVENT` and `VALUE_INT` families.
pub mod subtype {
    pub const ALL_SHIP_SETTINGS: u32 = 0x0f;
    pub const NOISE: u32 = 0x13;

    pub const READY: u32 = 0x0f;
    pub const CLIENT_HEARTBEAT: u32 = 0x24;
}

/// One undecoded packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub origin: u32,
    pub packet_type: u32,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn new(origin: u32, packet_type: u32, payload: Vec<u8>) -> Self {
        Self {
            origin,
            packet_type,
            payload,
        }
    }

    /// Serialize this frame with its header.
    pub fn encode(&self) -> Vec<u8> {
        let total = (HEADER_LEN + self.payload.len()) as u32;
        let mut out = Vec::with_capacity(total as usize);
        out.extend_from_slice(&MAGIC.to_le_bytes());
        out.extend_from_slice(&total.to_le_bytes());
        out.extend_from_slice(&self.origin.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&(total - PREAMBLE_LEN as u32).to_le_bytes());
        out.extend_from_slice(&self.packet_type.to_le_bytes());
        out.extend_from_slice(&self.payload);
        out
    }
}

fn read_u32_at(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

/// Streaming frame decoder: accumulates bytes and yields complete frames.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Feed bytes into the decoder and return all complete frames.
    ///
    /// A header with the wrong magic, an impossible length, or a length
    /// above [`MAX_FRAME_LEN`] is an error; the stream cannot be
    /// resynchronized after that.
    pub fn feed(&mut self, data: &[u8]) -> ArtemisResult<Vec<Frame>> {
        self.buffer.extend_from_slice(data);
        let mut frames = Vec::new();

        loop {
            if self.buffer.len() < HEADER_LEN {
                break;
            }

            let magic = read_u32_at(&self.buffer, 0);
            if magic != MAGIC {
                return Err(ArtemisError::Codec(format!(
                    "bad frame magic: 0x{magic:08x}"
                )));
            }

            let total = read_u32_at(&self.buffer, 4) as usize;
            if total < HEADER_LEN {
                return Err(ArtemisError::Codec(format!(
                    "frame length {total} shorter than header"
                )));
            }
            if total > MAX_FRAME_LEN {
                return Err(ArtemisError::Codec(format!(
                    "frame too large: {total} bytes (max {MAX_FRAME_LEN})"
                )));
            }
            let remaining = read_u32_at(&self.buffer, 16) as usize;
            if remaining + PREAMBLE_LEN != total {
                return Err(ArtemisError::Codec(format!(
                    "frame length mismatch: total {total}, remaining {remaining}"
                )));
            }

            if self.buffer.len() < total {
                break;
            }

            let origin = read_u32_at(&self.buffer, 8);
            let packet_type = read_u32_at(&self.buffer, 20);
            let payload = self.buffer[HEADER_LEN..total].to_vec();
            frames.push(Frame::new(origin, packet_type, payload));

            self.buffer.drain(..total);
        }

        Ok(frames)
    }

    /// Reset internal buffer.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Number of bytes remaining in the internal buffer.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

/// Cursor over a frame payload.
struct PayloadReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> PayloadReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> ArtemisResult<&'a [u8]> {
        if self.data.len() - self.pos < n {
            return Err(ArtemisError::Codec(format!(
                "payload truncated: wanted {n} bytes at offset {}, have {}",
                self.pos,
                self.data.len() - self.pos
            )));
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn u8(&mut self) -> ArtemisResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> ArtemisResult<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn f32(&mut self) -> ArtemisResult<f32> {
        let b = self.take(4)?;
        Ok(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// UTF-16LE string prefixed with its length in code units, NUL included.
    fn string(&mut self) -> ArtemisResult<String> {
        let units = self.u32()? as usize;
        let bytes = self.take(units * 2)?;
        let mut wide: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        while wide.last() == Some(&0) {
            wide.pop();
        }
        String::from_utf16(&wide).map_err(|e| ArtemisError::Codec(format!("bad string: {e}")))
    }

    /// ASCII text prefixed with its byte length.
    fn ascii(&mut self) -> ArtemisResult<String> {
        let len = self.u32()? as usize;
        let bytes = self.take(len)?;
        if !bytes.is_ascii() {
            return Err(ArtemisError::Codec("non-ASCII welcome text".into()));
        }
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    fn rest(&mut self) -> &'a [u8] {
        let bytes = &self.data[self.pos..];
        self.pos = self.data.len();
        bytes
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }
}

#[derive(Default)]
struct PayloadWriter {
    buf: Vec<u8>,
}

impl PayloadWriter {
    fn u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    fn u32(&mut self, v: u32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    fn f32(&mut self, v: f32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    fn string(&mut self, s: &str) -> &mut Self {
        let wide: Vec<u16> = s.encode_utf16().chain(std::iter::once(0)).collect();
        self.u32(wide.len() as u32);
        for unit in wide {
            self.buf.extend_from_slice(&unit.to_le_bytes());
        }
        self
    }

    fn ascii(&mut self, s: &str) -> &mut Self {
        self.u32(s.len() as u32);
        self.buf.extend_from_slice(s.as_bytes());
        self
    }

    fn bytes(&mut self, b: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(b);
        self
    }

    fn finish(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }
}

/// Decode a server frame into a [`Message`].
///
/// Console-status payloads are read positionally against `table`, so the
/// same bytes decode differently under different tables.
pub fn decode(frame: &Frame, table: ProtocolTable) -> ArtemisResult<Message> {
    let mut r = PayloadReader::new(&frame.payload);

    let message = match frame.packet_type {
        packet_type::WELCOME => Message::Welcome { message: r.ascii()? },
        packet_type::VERSION => {
            let _unknown = r.u32()?;
            let _legacy = r.f32()?;
            Message::Version(Version::new(r.u32()?, r.u32()?, r.u32()?))
        }
        packet_type::CONSOLE_STATUS => {
            let ship = r.u32()?;
            let mut slots = Vec::with_capacity(table.slot_count());
            for &console in table.consoles() {
                let status = ConsoleStatus::try_from(r.u8()?).map_err(ArtemisError::Codec)?;
                slots.push((console, status));
            }
            Message::ConsoleStatus {
                ship,
                consoles: ConsoleAssignments::new(slots),
            }
        }
        packet_type::HEARTBEAT => Message::Heartbeat,
        packet_type::OBJECT_UPDATE => Message::ObjectUpdate {
            payload: r.rest().to_vec(),
        },
        packet_type::INTEL => Message::Intel {
            object_id: r.u32()?,
            intel_type: r.u8()?,
            text: r.string()?,
        },
        packet_type::COMMS_INCOMING => Message::CommsIncoming {
            priority: r.u32()?,
            sender: r.string()?,
            message: r.string()?,
        },
        packet_type::BEAM_FIRED => Message::BeamFired {
            beam_id: r.u32()?,
            origin_id: r.u32()?,
            target_id: r.u32()?,
        },
        packet_type::SIMPLE_EVENT => match r.u32()? {
            subtype::ALL_SHIP_SETTINGS => {
                let mut ships = Vec::new();
                while !r.is_empty() {
                    let drive = r.u32()?.into();
                    let hull_id = r.u32()?;
                    let name = r.string()?;
                    ships.push(ShipSettings::new(name, drive, hull_id));
                }
                Message::AllShipSettings { ships }
            }
            subtype::NOISE => Message::Noise,
            other => Message::Unknown {
                packet_type: frame.packet_type,
                subtype: Some(other),
            },
        },
        other => Message::Unknown {
            packet_type: other,
            subtype: None,
        },
    };

    Ok(message)
}

/// Encode a server-originated message, as a server would send it.
pub fn encode_server(message: &Message, table: ProtocolTable) -> ArtemisResult<Vec<u8>> {
    let mut w = PayloadWriter::default();

    let tag = match message {
        Message::Welcome { message } => {
            if !message.is_ascii() {
                return Err(ArtemisError::InvalidMessage(
                    "welcome text must be ASCII".into(),
                ));
            }
            w.ascii(message);
            packet_type::WELCOME
        }
        Message::Version(v) => {
            let legacy = v.major as f32 + v.minor as f32 / 10.0;
            w.u32(0).f32(legacy).u32(v.major).u32(v.minor).u32(v.patch);
            packet_type::VERSION
        }
        Message::ConsoleStatus { ship, consoles } => {
            w.u32(*ship);
            for &console in table.consoles() {
                let status = consoles.status(console).unwrap_or(ConsoleStatus::Unavailable);
                w.u8(status.into());
            }
            packet_type::CONSOLE_STATUS
        }
        Message::Heartbeat => packet_type::HEARTBEAT,
        Message::ObjectUpdate { payload } => {
            w.bytes(payload);
            packet_type::OBJECT_UPDATE
        }
        Message::Intel {
            object_id,
            intel_type,
            text,
        } => {
            w.u32(*object_id).u8(*intel_type).string(text);
            packet_type::INTEL
        }
        Message::CommsIncoming {
            priority,
            sender,
            message,
        } => {
            w.u32(*priority).string(sender).string(message);
            packet_type::COMMS_INCOMING
        }
        Message::BeamFired {
            beam_id,
            origin_id,
            target_id,
        } => {
            w.u32(*beam_id).u32(*origin_id).u32(*target_id);
            packet_type::BEAM_FIRED
        }
        Message::AllShipSettings { ships } => {
            w.u32(subtype::ALL_SHIP_SETTINGS);
            for ship in ships {
                w.u32(ship.drive.into()).u32(ship.hull_id).string(&ship.name);
            }
            packet_type::SIMPLE_EVENT
        }
        Message::Noise => {
            w.u32(subtype::NOISE);
            packet_type::SIMPLE_EVENT
        }
        Message::Unknown { .. } => {
            return Err(ArtemisError::InvalidMessage(format!(
                "cannot encode {}",
                message.type_name()
            )))
        }
    };

    Ok(Frame::new(ORIGIN_SERVER, tag, w.finish()).encode())
}

/// Encode a client packet.
pub fn encode_client(packet: ClientPacket) -> Vec<u8> {
    let sub = match packet {
        ClientPacket::Ready => subtype::READY,
        ClientPacket::Heartbeat => subtype::CLIENT_HEARTBEAT,
    };
    let payload = PayloadWriter::default().u32(sub).finish();
    Frame::new(ORIGIN_CLIENT, packet_type::VALUE_INT, payload).encode()
}
