//! Frame codec for the SSM2 wire format.
//!
//! Every SSM2 message is a single frame:
//!
//! ```text
//! Magic byte (0x80)
//! Destination device
//! Source device
//! Payload size (count of data bytes + 1 checksum byte)
//! Command
//! Data
//! Checksum
//! ```
//!
//! The checksum is the low 8 bits of the sum of every preceding byte. This
//! module only builds and validates frames; all I/O lives in
//! [`crate::transport`].

use crate::error::HeaderError;

/// Byte offsets of the fixed header fields.
pub const INDEX_MAGIC_BYTE: usize = 0;
pub const INDEX_DESTINATION: usize = 1;
pub const INDEX_SOURCE: usize = 2;
pub const INDEX_PAYLOAD_SIZE: usize = 3;
pub const INDEX_COMMAND: usize = 4;
pub const INDEX_PAYLOAD_START: usize = 5;

/// Every frame starts with this byte.
pub const MAGIC_BYTE: u8 = 0x80;

/// Size of the fixed header (magic through command).
pub const HEADER_SIZE: usize = 5;

/// A device participating in the SSM2 conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Device {
    Engine = 0x10,
    Transmission = 0x18,
    DiagnosticTool = 0xF0,
    FastModeDiagnosticTool = 0xF2,
}

impl Device {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x10 => Some(Device::Engine),
            0x18 => Some(Device::Transmission),
            0xF0 => Some(Device::DiagnosticTool),
            0xF2 => Some(Device::FastModeDiagnosticTool),
            _ => None,
        }
    }
}

/// A request or response command. Requests flow diag-tool to engine,
/// responses the other way. The write commands are reserved by the protocol
/// but unused by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    ReadBlockRequest = 0xA0,
    ReadBlockResponse = 0xE0,
    ReadAddressesRequest = 0xA8,
    ReadAddressesResponse = 0xE8,
    WriteBlockRequest = 0xB0,
    WriteBlockResponse = 0xF0,
    WriteAddressRequest = 0xB8,
    WriteAddressResponse = 0xF8,
    InitRequest = 0xBF,
    InitResponse = 0xFF,
}

impl Command {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0xA0 => Some(Command::ReadBlockRequest),
            0xE0 => Some(Command::ReadBlockResponse),
            0xA8 => Some(Command::ReadAddressesRequest),
            0xE8 => Some(Command::ReadAddressesResponse),
            0xB0 => Some(Command::WriteBlockRequest),
            0xF0 => Some(Command::WriteBlockResponse),
            0xB8 => Some(Command::WriteAddressRequest),
            0xF8 => Some(Command::WriteAddressResponse),
            0xBF => Some(Command::InitRequest),
            0xFF => Some(Command::InitResponse),
            _ => None,
        }
    }
}

/// One full SSM2 frame, header and checksum included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet(Vec<u8>);

impl Packet {
    /// Builds a frame with the payload size and checksum filled in.
    pub fn new(source: Device, destination: Device, command: Command, data: &[u8]) -> Self {
        let mut bytes = Vec::with_capacity(HEADER_SIZE + data.len() + 1);
        bytes.push(MAGIC_BYTE);
        bytes.push(destination as u8);
        bytes.push(source as u8);
        bytes.push(data.len() as u8 + 1);
        bytes.push(command as u8);
        bytes.extend_from_slice(data);
        bytes.push(0);
        let last = bytes.len() - 1;
        bytes[last] = checksum(&bytes);
        Packet(bytes)
    }

    /// Wraps bytes assembled off the wire. The caller is responsible for
    /// having validated the header and checksum.
    pub(crate) fn from_bytes(bytes: Vec<u8>) -> Self {
        Packet(bytes)
    }

    /// The data segment: everything between the command byte and the
    /// checksum trailer.
    pub fn data(&self) -> &[u8] {
        &self.0[INDEX_PAYLOAD_START..self.0.len() - 1]
    }

    /// The raw command byte.
    pub fn command(&self) -> u8 {
        self.0[INDEX_COMMAND]
    }
}

impl std::ops::Deref for Packet {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

/// Calculates the checksum over a full frame: the low 8 bits of the sum of
/// every byte except the trailer byte itself.
pub fn checksum(frame: &[u8]) -> u8 {
    frame[..frame.len() - 1]
        .iter()
        .fold(0u8, |sum, b| sum.wrapping_add(*b))
}

/// Validates the five fixed header bytes of a frame.
pub fn validate_header(header: &[u8; HEADER_SIZE]) -> Result<(), HeaderError> {
    if header[INDEX_MAGIC_BYTE] != MAGIC_BYTE {
        return Err(HeaderError::Magic);
    }
    if Device::from_byte(header[INDEX_DESTINATION]).is_none() {
        return Err(HeaderError::Destination);
    }
    if Device::from_byte(header[INDEX_SOURCE]).is_none() {
        return Err(HeaderError::Source);
    }
    if Command::from_byte(header[INDEX_COMMAND]).is_none() {
        return Err(HeaderError::Command);
    }
    if header[INDEX_PAYLOAD_SIZE] < 1 {
        return Err(HeaderError::PayloadSize);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_request_bytes() {
        let p = Packet::new(Device::DiagnosticTool, Device::Engine, Command::InitRequest, &[]);
        assert_eq!(&*p, &[0x80, 0x10, 0xF0, 0x01, 0xBF, 0x40]);
    }

    #[test]
    fn build_invariants() {
        let payload = [0x01, 0x02, 0x03];
        let p = Packet::new(
            Device::DiagnosticTool,
            Device::Engine,
            Command::ReadAddressesRequest,
            &payload,
        );
        assert_eq!(p[INDEX_MAGIC_BYTE], MAGIC_BYTE);
        assert_eq!(p[INDEX_PAYLOAD_SIZE], payload.len() as u8 + 1);
        assert_eq!(p.len(), HEADER_SIZE + p[INDEX_PAYLOAD_SIZE] as usize);
        assert_eq!(p[p.len() - 1], checksum(&p));

        let mut header = [0u8; HEADER_SIZE];
        header.copy_from_slice(&p[..HEADER_SIZE]);
        assert!(validate_header(&header).is_ok());
    }

    #[test]
    fn data_round_trip() {
        let payload = [0xDE, 0xAD, 0xBE, 0xEF];
        let p = Packet::new(
            Device::Engine,
            Device::DiagnosticTool,
            Command::ReadAddressesResponse,
            &payload,
        );
        assert_eq!(p.data(), &payload);
        assert_eq!(p.data().len(), p[INDEX_PAYLOAD_SIZE] as usize - 1);
    }

    #[test]
    fn empty_payload_data_is_empty() {
        let p = Packet::new(Device::DiagnosticTool, Device::Engine, Command::InitRequest, &[]);
        assert!(p.data().is_empty());
    }

    #[test]
    fn header_rejections() {
        let valid = [MAGIC_BYTE, 0x10, 0xF0, 0x01, 0xBF];
        assert!(validate_header(&valid).is_ok());

        let mut h = valid;
        h[INDEX_MAGIC_BYTE] = 0x81;
        assert_eq!(validate_header(&h), Err(HeaderError::Magic));

        let mut h = valid;
        h[INDEX_DESTINATION] = 0xBF;
        assert_eq!(validate_header(&h), Err(HeaderError::Destination));

        let mut h = valid;
        h[INDEX_SOURCE] = 0x11;
        assert_eq!(validate_header(&h), Err(HeaderError::Source));

        let mut h = valid;
        h[INDEX_COMMAND] = 0x10;
        assert_eq!(validate_header(&h), Err(HeaderError::Command));

        let mut h = valid;
        h[INDEX_PAYLOAD_SIZE] = 0;
        assert_eq!(validate_header(&h), Err(HeaderError::PayloadSize));
    }

    #[test]
    fn checksum_wraps() {
        let frame = [0xFF, 0xFF, 0xFF, 0x00];
        assert_eq!(checksum(&frame), 0xFDu8);
    }
}
