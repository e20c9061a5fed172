//! High-level request/response operations against an ECU.

use log::debug;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;

use crate::ecu::Ecu;
use crate::error::Error;
use crate::protocol::{Command, Device, Packet};
use crate::transport::Transport;

/// A connection to an ECU over an owned byte stream.
///
/// Operations are strictly serial: a second request must not be issued
/// while the first is awaiting its response, which the `&mut self` receivers
/// make structural. There is no re-open; after [`Connection::close`] the
/// caller constructs a new connection.
#[derive(Debug)]
pub struct Connection<S> {
    transport: Transport<S>,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wraps a byte stream that is already configured for the SSM2 line
    /// settings (4800 baud, 8 data bits, no parity, 1 stop bit).
    pub fn new(stream: S) -> Self {
        Self {
            transport: Transport::new(stream),
        }
    }

    /// The underlying transport, for tuning timeouts.
    pub fn transport_mut(&mut self) -> &mut Transport<S> {
        &mut self.transport
    }

    /// Sends an init request and parses the response into an [`Ecu`].
    pub async fn init_ecu(&mut self, cancel: &CancellationToken) -> Result<Ecu, Error> {
        let request = Packet::new(Device::DiagnosticTool, Device::Engine, Command::InitRequest, &[]);
        let response = self.send_packet(&request, cancel).await?;
        if response.command() != Command::InitResponse as u8 {
            return Err(Error::InvalidResponseCommand);
        }
        Ok(Ecu::from_init_response(&response))
    }

    /// Sends a read-addresses request and returns the first response.
    ///
    /// With `continuous` set the ECU keeps streaming responses for the same
    /// addresses; fetch them via [`Connection::next_packet`] until the ECU
    /// is interrupted.
    pub async fn send_read_addresses_request(
        &mut self,
        addresses: &[[u8; 3]],
        continuous: bool,
        cancel: &CancellationToken,
    ) -> Result<Packet, Error> {
        let mut data = Vec::with_capacity(1 + addresses.len() * 3);
        data.push(if continuous { 0x01 } else { 0x00 });
        for address in addresses {
            data.extend_from_slice(address);
        }

        let request = Packet::new(
            Device::DiagnosticTool,
            Device::Engine,
            Command::ReadAddressesRequest,
            &data,
        );
        let response = self.send_packet(&request, cancel).await?;
        if response.command() != Command::ReadAddressesResponse as u8 {
            return Err(Error::InvalidResponseCommand);
        }
        Ok(response)
    }

    /// Sends a read-block request for `count` bytes starting at `address`
    /// and returns the response.
    pub async fn send_read_block_request(
        &mut self,
        address: [u8; 3],
        count: u8,
        cancel: &CancellationToken,
    ) -> Result<Packet, Error> {
        let data = [0x00, address[0], address[1], address[2], count - 1];
        let request = Packet::new(
            Device::DiagnosticTool,
            Device::Engine,
            Command::ReadBlockRequest,
            &data,
        );
        let response = self.send_packet(&request, cancel).await?;
        if response.command() != Command::ReadBlockResponse as u8 {
            return Err(Error::InvalidResponseCommand);
        }
        Ok(response)
    }

    /// Reads the next frame from the ECU.
    pub async fn next_packet(&mut self, cancel: &CancellationToken) -> Result<Packet, Error> {
        debug!("reading next packet");
        self.transport.read_next_packet(cancel).await
    }

    /// Releases the byte stream. Consuming the connection guarantees the
    /// release happens exactly once.
    pub async fn close(self) -> Result<(), Error> {
        debug!("closing connection");
        self.transport.shutdown().await
    }

    /// Writes a frame and reads the next non-echo frame in response. A
    /// short write is fatal to the operation; there are no retries at this
    /// layer.
    async fn send_packet(
        &mut self,
        packet: &Packet,
        cancel: &CancellationToken,
    ) -> Result<Packet, Error> {
        self.transport.write_all(packet).await?;
        self.transport.read_next_packet(cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::checksum;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

    const INIT_REQUEST: [u8; 6] = [0x80, 0x10, 0xF0, 0x01, 0xBF, 0x40];

    fn response_frame(command: Command, data: &[u8]) -> Vec<u8> {
        Packet::new(Device::Engine, Device::DiagnosticTool, command, data).to_vec()
    }

    async fn connection_with_bytes(bytes: Vec<u8>) -> (Connection<DuplexStream>, DuplexStream) {
        let (host, mut ecu) = tokio::io::duplex(1024);
        ecu.write_all(&bytes).await.unwrap();
        (Connection::new(host), ecu)
    }

    #[tokio::test]
    async fn init_writes_the_canonical_request() {
        let (mut conn, mut ecu) =
            connection_with_bytes(response_frame(Command::InitResponse, &[])).await;

        conn.init_ecu(&CancellationToken::new()).await.unwrap();

        let mut written = [0u8; INIT_REQUEST.len()];
        ecu.read_exact(&mut written).await.unwrap();
        assert_eq!(written, INIT_REQUEST);
    }

    #[tokio::test]
    async fn init_tolerates_an_echoed_request() {
        let mut bytes = INIT_REQUEST.to_vec();
        bytes.extend(response_frame(Command::InitResponse, &[]));
        let (mut conn, _ecu) = connection_with_bytes(bytes).await;

        let ecu_info = conn.init_ecu(&CancellationToken::new()).await.unwrap();
        assert!(ecu_info.supported_parameters.is_empty());
    }

    #[tokio::test]
    async fn init_rejects_bad_checksum() {
        let mut bytes = response_frame(Command::InitResponse, &[]);
        let last = bytes.len() - 1;
        bytes[last] = bytes[last].wrapping_add(1);
        let (mut conn, _ecu) = connection_with_bytes(bytes).await;

        let err = conn.init_ecu(&CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidChecksum));
    }

    #[tokio::test]
    async fn init_rejects_wrong_response_command() {
        let bytes = response_frame(Command::ReadAddressesResponse, &[]);
        let (mut conn, _ecu) = connection_with_bytes(bytes).await;

        let err = conn.init_ecu(&CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidResponseCommand));
    }

    #[tokio::test]
    async fn init_parses_capabilities() {
        let data = [
            0x02, 0x03, 0x04, 0x10, 0x40, 0xA1, 0x32, 0xB1, 0b0000_0001, 0b0001_0000,
        ];
        let (mut conn, _ecu) =
            connection_with_bytes(response_frame(Command::InitResponse, &data)).await;

        let ecu_info = conn.init_ecu(&CancellationToken::new()).await.unwrap();
        assert_eq!(ecu_info.ssm_id, [0x02, 0x03, 0x04]);
        assert_eq!(ecu_info.rom_id, [0x10, 0x40, 0xA1, 0x32, 0xB1]);
        let ids: Vec<_> = ecu_info.supported_parameters.iter().map(|p| p.id).collect();
        assert_eq!(ids, ["P8", "P12", "P239", "P240", "P241"]);
    }

    #[tokio::test]
    async fn read_addresses_framing() {
        let addresses = [[0x00, 0x00, 0x01], [0x00, 0x00, 0x0A]];

        for (continuous, flag) in [(false, 0x00u8), (true, 0x01u8)] {
            let (mut conn, mut ecu) =
                connection_with_bytes(response_frame(Command::ReadAddressesResponse, &[])).await;

            conn.send_read_addresses_request(&addresses, continuous, &CancellationToken::new())
                .await
                .unwrap();

            let mut want = vec![0x80, 0x10, 0xF0, 0x08, 0xA8, flag];
            for a in &addresses {
                want.extend_from_slice(a);
            }
            want.push(checksum(&[&want[..], &[0]].concat()));

            let mut written = vec![0u8; want.len()];
            ecu.read_exact(&mut written).await.unwrap();
            assert_eq!(written, want);
        }
    }

    #[tokio::test]
    async fn read_addresses_response_data() {
        let (mut conn, _ecu) =
            connection_with_bytes(response_frame(Command::ReadAddressesResponse, &[0x20, 0xA1]))
                .await;

        let response = conn
            .send_read_addresses_request(&[[0x00, 0x00, 0x01]], false, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(response.data(), &[0x20, 0xA1]);
    }

    #[tokio::test]
    async fn read_addresses_rejects_wrong_response_command() {
        let (mut conn, _ecu) =
            connection_with_bytes(response_frame(Command::WriteBlockResponse, &[])).await;

        let err = conn
            .send_read_addresses_request(&[[0x00, 0x00, 0x01]], false, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidResponseCommand));
    }

    #[tokio::test]
    async fn read_block_framing() {
        let (mut conn, mut ecu) =
            connection_with_bytes(response_frame(Command::ReadBlockResponse, &[0xAA; 4])).await;

        let response = conn
            .send_read_block_request([0x00, 0x00, 0x8E], 4, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(response.data(), &[0xAA; 4]);

        let mut want = vec![0x80, 0x10, 0xF0, 0x06, 0xA0, 0x00, 0x00, 0x00, 0x8E, 0x03];
        want.push(checksum(&[&want[..], &[0]].concat()));
        let mut written = vec![0u8; want.len()];
        ecu.read_exact(&mut written).await.unwrap();
        assert_eq!(written, want);
    }
}
