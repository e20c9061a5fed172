//! Diagnostic trouble code (DTC) reads.
//!
//! Trouble codes live in two ECU byte ranges: a temporary ("set") range
//! holding the codes currently asserted, and a memory ("stored") range
//! holding the codes latched since the last clear. Each code is one bit.
//! Both reads are one-shot read-block queries and must not overlap a
//! logging session; stop the session first to get the connection back.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;

use crate::connection::Connection;
use crate::error::Error;

#[cfg(feature = "serde")]
use serde::Serialize;

/// Bound on one trouble-code read. Generous because some ECUs answer block
/// reads far more slowly than address reads.
pub const DTC_READ_TIMEOUT: Duration = Duration::from_secs(60);

/// A diagnostic trouble code and where its flag bit lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Dtc {
    pub name: &'static str,
    /// Byte holding the code's bit in the temporary range.
    pub set_address: [u8; 3],
    /// Byte holding the code's bit in the stored range.
    pub stored_address: [u8; 3],
    /// Bit index within both bytes.
    pub bit: u8,
}

const SET_RANGE_BASE: u8 = 0x8E;
const STORED_RANGE_BASE: u8 = 0xB6;

const fn dtc(name: &'static str, byte: u8, bit: u8) -> Dtc {
    Dtc {
        name,
        set_address: [0x00, 0x00, SET_RANGE_BASE + byte],
        stored_address: [0x00, 0x00, STORED_RANGE_BASE + byte],
        bit,
    }
}

/// The known trouble codes. One bit per code; the set and stored ranges
/// share the same layout.
pub static DTCS: &[Dtc] = &[
    dtc("P0031 Front O2 Sensor Heater Circuit Low", 0, 0),
    dtc("P0032 Front O2 Sensor Heater Circuit High", 0, 1),
    dtc("P0101 Mass Air Flow Sensor Range/Performance", 0, 2),
    dtc("P0102 Mass Air Flow Sensor Circuit Low", 0, 3),
    dtc("P0103 Mass Air Flow Sensor Circuit High", 0, 4),
    dtc("P0106 Manifold Absolute Pressure Range/Performance", 0, 5),
    dtc("P0107 Manifold Absolute Pressure Circuit Low", 0, 6),
    dtc("P0108 Manifold Absolute Pressure Circuit High", 0, 7),
    dtc("P0111 Intake Air Temperature Sensor Range/Performance", 1, 0),
    dtc("P0112 Intake Air Temperature Sensor Circuit Low", 1, 1),
    dtc("P0113 Intake Air Temperature Sensor Circuit High", 1, 2),
    dtc("P0116 Coolant Temperature Sensor Range/Performance", 1, 3),
    dtc("P0117 Coolant Temperature Sensor Circuit Low", 1, 4),
    dtc("P0118 Coolant Temperature Sensor Circuit High", 1, 5),
    dtc("P0121 Throttle Position Sensor Range/Performance", 1, 6),
    dtc("P0122 Throttle Position Sensor Circuit Low", 1, 7),
    dtc("P0123 Throttle Position Sensor Circuit High", 2, 0),
    dtc("P0125 Insufficient Coolant Temperature for Closed Loop", 2, 1),
    dtc("P0128 Coolant Thermostat Below Regulating Temperature", 2, 2),
    dtc("P0130 Front O2 Sensor Circuit Malfunction", 2, 3),
    dtc("P0131 Front O2 Sensor Circuit Low Voltage", 2, 4),
    dtc("P0132 Front O2 Sensor Circuit High Voltage", 2, 5),
    dtc("P0133 Front O2 Sensor Circuit Slow Response", 2, 6),
    dtc("P0139 Rear O2 Sensor Circuit Slow Response", 2, 7),
    dtc("P0301 Cylinder 1 Misfire Detected", 3, 0),
    dtc("P0302 Cylinder 2 Misfire Detected", 3, 1),
    dtc("P0303 Cylinder 3 Misfire Detected", 3, 2),
    dtc("P0304 Cylinder 4 Misfire Detected", 3, 3),
    dtc("P0325 Knock Sensor Circuit Malfunction", 3, 4),
    dtc("P0327 Knock Sensor Circuit Low", 3, 5),
    dtc("P0335 Crankshaft Position Sensor Circuit", 3, 6),
    dtc("P0340 Camshaft Position Sensor Circuit", 3, 7),
];

/// Reads the currently-asserted ("set") trouble codes, sorted by name.
pub async fn read_set_dtcs<S>(
    conn: &mut Connection<S>,
    cancel: &CancellationToken,
) -> Result<Vec<&'static Dtc>, Error>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    read_dtcs(conn, cancel, false).await
}

/// Reads the latched ("stored") trouble codes, sorted by name.
pub async fn read_stored_dtcs<S>(
    conn: &mut Connection<S>,
    cancel: &CancellationToken,
) -> Result<Vec<&'static Dtc>, Error>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    read_dtcs(conn, cancel, true).await
}

async fn read_dtcs<S>(
    conn: &mut Connection<S>,
    cancel: &CancellationToken,
    stored: bool,
) -> Result<Vec<&'static Dtc>, Error>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    let address_of = |d: &Dtc| {
        if stored {
            d.stored_address
        } else {
            d.set_address
        }
    };

    let start = DTCS
        .iter()
        .map(|d| be24(address_of(d)))
        .min()
        .unwrap_or_default();
    let end = DTCS
        .iter()
        .map(|d| be24(address_of(d)))
        .max()
        .unwrap_or_default();
    let count = (end - start + 1) as u8;

    let response = tokio::time::timeout(
        DTC_READ_TIMEOUT,
        conn.send_read_block_request(to_be24(start), count, cancel),
    )
    .await
    .map_err(|_| Error::ReadTimeout)??;

    let data = response.data();
    let mut found: Vec<&'static Dtc> = DTCS
        .iter()
        .filter(|d| {
            let index = (be24(address_of(d)) - start) as usize;
            index < data.len() && data[index] & (1 << d.bit) != 0
        })
        .collect();
    found.sort_by_key(|d| d.name);
    Ok(found)
}

fn be24(address: [u8; 3]) -> u32 {
    u32::from_be_bytes([0, address[0], address[1], address[2]])
}

fn to_be24(value: u32) -> [u8; 3] {
    let bytes = value.to_be_bytes();
    [bytes[1], bytes[2], bytes[3]]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{checksum, Command, Device, Packet};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[test]
    fn table_bits_are_unique_per_byte() {
        let mut seen = std::collections::HashSet::new();
        for d in DTCS {
            assert!(seen.insert((d.set_address, d.bit)), "{}", d.name);
            assert!(d.bit < 8);
        }
    }

    #[tokio::test]
    async fn decodes_asserted_bits_sorted_by_name() {
        let (host, mut ecu) = tokio::io::duplex(1024);
        // byte 0 bit 2 = P0101, byte 3 bits 0 and 1 = P0301 and P0302
        let response = Packet::new(
            Device::Engine,
            Device::DiagnosticTool,
            Command::ReadBlockResponse,
            &[0b0000_0100, 0x00, 0x00, 0b0000_0011],
        );
        ecu.write_all(&response).await.unwrap();

        let mut conn = Connection::new(host);
        let codes = read_set_dtcs(&mut conn, &CancellationToken::new())
            .await
            .unwrap();
        let names: Vec<_> = codes.iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            [
                "P0101 Mass Air Flow Sensor Range/Performance",
                "P0301 Cylinder 1 Misfire Detected",
                "P0302 Cylinder 2 Misfire Detected",
            ]
        );

        // the request covered the whole temporary range in one block read
        let mut want = vec![0x80, 0x10, 0xF0, 0x06, 0xA0, 0x00, 0x00, 0x00, 0x8E, 0x03];
        want.push(checksum(&[&want[..], &[0]].concat()));
        let mut written = vec![0u8; want.len()];
        ecu.read_exact(&mut written).await.unwrap();
        assert_eq!(written, want);
    }

    #[tokio::test]
    async fn stored_read_targets_the_memory_range() {
        let (host, mut ecu) = tokio::io::duplex(1024);
        let response = Packet::new(
            Device::Engine,
            Device::DiagnosticTool,
            Command::ReadBlockResponse,
            &[0x00, 0x00, 0x00, 0x00],
        );
        ecu.write_all(&response).await.unwrap();

        let mut conn = Connection::new(host);
        let codes = read_stored_dtcs(&mut conn, &CancellationToken::new())
            .await
            .unwrap();
        assert!(codes.is_empty());

        let mut want = vec![0x80, 0x10, 0xF0, 0x06, 0xA0, 0x00, 0x00, 0x00, 0xB6, 0x03];
        want.push(checksum(&[&want[..], &[0]].concat()));
        let mut written = vec![0u8; want.len()];
        ecu.read_exact(&mut written).await.unwrap();
        assert_eq!(written, want);
    }
}
