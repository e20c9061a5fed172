//! A deterministic fake ECU for tests and UI development.
//!
//! [`fake_ecu`] returns one end of an in-memory byte stream; a background
//! task plays the ECU on the other end. The fake answers init with every
//! capability bit set and, once a continuous read-addresses request
//! arrives, emits a response frame of random bytes at the configured
//! latency. Plug the returned stream straight into
//! [`crate::Connection::new`].

use std::time::Duration;

use log::trace;
use rand::Rng;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

use crate::protocol::{
    Command, Device, Packet, HEADER_SIZE, INDEX_COMMAND, INDEX_PAYLOAD_SIZE, INDEX_PAYLOAD_START,
};

/// SSM id the fake reports.
pub const FAKE_SSM_ID: [u8; 3] = [0x00, 0x00, 0x01];
/// ROM id the fake reports.
pub const FAKE_ROM_ID: [u8; 5] = [0x00, 0x00, 0x00, 0x00, 0x01];

/// Number of capability bytes in the fake's init response. Covers every
/// capability byte index in the parameter catalogue.
const CAPABILITY_BYTES: usize = 70;

/// Starts a fake ECU and returns the host side of its byte stream.
pub fn fake_ecu(latency: Duration) -> DuplexStream {
    let (host, ecu) = tokio::io::duplex(4096);
    tokio::spawn(run(ecu, latency));
    host
}

async fn run(mut stream: DuplexStream, latency: Duration) {
    let mut buf: Vec<u8> = Vec::new();
    let mut chunk = [0u8; 256];
    let mut continuous = false;
    let mut address_count = 0usize;

    loop {
        let read = if continuous {
            tokio::select! {
                read = stream.read(&mut chunk) => Some(read),
                _ = tokio::time::sleep(latency) => None,
            }
        } else {
            Some(stream.read(&mut chunk).await)
        };
        match read {
            // latency tick while a continuous read is active
            None => {
                if stream.write_all(&address_response(address_count)).await.is_err() {
                    return;
                }
                continue;
            }
            Some(Ok(0)) | Some(Err(_)) => return,
            Some(Ok(n)) => buf.extend_from_slice(&chunk[..n]),
        }

        while buf.len() >= HEADER_SIZE {
            let total = HEADER_SIZE + buf[INDEX_PAYLOAD_SIZE] as usize;
            if buf.len() < total {
                break;
            }
            let frame: Vec<u8> = buf.drain(..total).collect();
            let data = &frame[INDEX_PAYLOAD_START..frame.len() - 1];
            trace!("fake ecu request: {:02X} {data:02X?}", frame[INDEX_COMMAND]);

            let response = if frame[INDEX_COMMAND] == Command::InitRequest as u8 {
                continuous = false;
                init_response()
            } else if frame[INDEX_COMMAND] == Command::ReadAddressesRequest as u8 {
                continuous = data.first().copied() == Some(0x01);
                address_count = data.len().saturating_sub(1) / 3;
                address_response(address_count)
            } else if frame[INDEX_COMMAND] == Command::ReadBlockRequest as u8 {
                // a block read interrupts a continuous stream
                continuous = false;
                let count = data.get(4).map(|c| *c as usize + 1).unwrap_or(0);
                block_response(count)
            } else {
                // a real ECU stays silent on what it doesn't speak
                continue;
            };

            tokio::time::sleep(latency).await;
            if stream.write_all(&response).await.is_err() {
                return;
            }
        }
    }
}

fn init_response() -> Vec<u8> {
    let mut data = Vec::with_capacity(FAKE_SSM_ID.len() + FAKE_ROM_ID.len() + CAPABILITY_BYTES);
    data.extend_from_slice(&FAKE_SSM_ID);
    data.extend_from_slice(&FAKE_ROM_ID);
    data.extend(std::iter::repeat(0xFF).take(CAPABILITY_BYTES));
    Packet::new(Device::Engine, Device::DiagnosticTool, Command::InitResponse, &data).to_vec()
}

fn address_response(address_count: usize) -> Vec<u8> {
    let mut rng = rand::rng();
    let data: Vec<u8> = (0..address_count)
        .map(|_| rng.random_range(1..=20))
        .collect();
    Packet::new(
        Device::Engine,
        Device::DiagnosticTool,
        Command::ReadAddressesResponse,
        &data,
    )
    .to_vec()
}

fn block_response(count: usize) -> Vec<u8> {
    Packet::new(
        Device::Engine,
        Device::DiagnosticTool,
        Command::ReadBlockResponse,
        &vec![0u8; count],
    )
    .to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Connection;
    use crate::dtc::read_set_dtcs;
    use crate::logging::logging_session;
    use crate::parameters::{DERIVED_PARAMETERS, PARAMETERS};
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn init_reports_every_parameter() {
        let mut conn = Connection::new(fake_ecu(Duration::from_millis(1)));
        let ecu = conn.init_ecu(&CancellationToken::new()).await.unwrap();

        assert_eq!(ecu.ssm_id, FAKE_SSM_ID);
        assert_eq!(ecu.rom_id, FAKE_ROM_ID);
        assert_eq!(ecu.supported_parameters.len(), PARAMETERS.len());
        // P232 depends on another derived value, so it can never resolve
        // against the primitive set
        assert_eq!(
            ecu.supported_derived_parameters.len(),
            DERIVED_PARAMETERS.len() - 1
        );
    }

    #[tokio::test]
    async fn continuous_logging_produces_frames() {
        let mut conn = Connection::new(fake_ecu(Duration::from_millis(1)));
        let cancel = CancellationToken::new();
        let ecu = conn.init_ecu(&cancel).await.unwrap();

        let parameters: Vec<_> = ecu
            .supported_parameters
            .iter()
            .copied()
            .filter(|p| matches!(p.id, "P8" | "P9" | "P12"))
            .collect();
        let mut session = logging_session(conn, parameters, vec![], cancel.clone())
            .await
            .unwrap();

        for _ in 0..3 {
            let values = session.next_values().await.expect("expected a frame");
            assert_eq!(values.len(), 3);
            assert!(values.contains_key("P8"));
        }

        cancel.cancel();
        assert!(session.stop().await.is_ok());
    }

    #[tokio::test]
    async fn answers_block_reads_with_clear_codes() {
        let mut conn = Connection::new(fake_ecu(Duration::from_millis(1)));
        let codes = read_set_dtcs(&mut conn, &CancellationToken::new())
            .await
            .unwrap();
        assert!(codes.is_empty());
    }
}
