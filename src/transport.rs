//! Half-duplex byte transport: paced reads, frame assembly, timeouts, and
//! echo suppression over a pluggable byte stream.
//!
//! The stream is injected by the caller; anything implementing
//! [`AsyncRead`] + [`AsyncWrite`] works, so a real serial port and the
//! deterministic fake in [`crate::fake`] are interchangeable. The caller is
//! responsible for configuring a real port to 4800 baud, 8 data bits, no
//! parity, 1 stop bit; the transport only uses those numbers to pace its
//! reads.

use std::io;
use std::time::Duration;

use log::{debug, trace, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use crate::error::Error;
use crate::protocol::{
    checksum, validate_header, Packet, HEADER_SIZE, INDEX_COMMAND, INDEX_PAYLOAD_SIZE, MAGIC_BYTE,
};

/// Baud rate (bits/s) of the serial link.
pub const BAUD_RATE: u32 = 4800;
/// Data bits per word on the serial link.
pub const DATA_BITS: u32 = 8;

/// Default bound on a single underlying read.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(500);
/// Default bound on assembling one complete frame. It may take several
/// reads to consume an entire frame, so this is larger than the per-read
/// timeout.
pub const DEFAULT_TOTAL_READ_TIMEOUT: Duration = Duration::from_millis(5000);

/// Time on the wire for `byte_count` bytes at the fixed line settings.
///
/// One word is 1 start bit + 8 data bits + 1 stop bit = 10 bits, and with
/// 8 data bits one word carries exactly one byte, so:
/// `µs = round(byte_count * 10 * 1_000_000 / 4800)`.
pub(crate) fn wire_time(byte_count: usize) -> Duration {
    let micros = (byte_count as f64 * 10_000_000.0 / BAUD_RATE as f64).round() as u64;
    Duration::from_micros(micros)
}

/// Half-duplex frame transport over an owned byte stream.
///
/// The transport owns the stream exclusively and closes it on
/// [`Transport::shutdown`]. It is not safe for concurrent use; exactly one
/// owner drives it at a time.
#[derive(Debug)]
pub struct Transport<S> {
    stream: S,
    read_timeout: Duration,
    total_read_timeout: Duration,
    /// Command byte of the most recent write, used to drop the frames the
    /// half-duplex line reflects back at us.
    last_sent_command: Option<u8>,
}

impl<S> Transport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            read_timeout: DEFAULT_READ_TIMEOUT,
            total_read_timeout: DEFAULT_TOTAL_READ_TIMEOUT,
            last_sent_command: None,
        }
    }

    /// Sets the bound on a single underlying read. Must stay below the
    /// total-read timeout; values at or above it are clamped.
    pub fn set_read_timeout(&mut self, timeout: Duration) {
        if timeout >= self.total_read_timeout {
            warn!(
                "read timeout {timeout:?} not below total read timeout {:?}, clamping",
                self.total_read_timeout
            );
            self.read_timeout = self.total_read_timeout / 2;
        } else {
            self.read_timeout = timeout;
        }
    }

    /// Sets the bound on assembling one complete frame.
    pub fn set_total_read_timeout(&mut self, timeout: Duration) {
        if timeout <= self.read_timeout {
            warn!(
                "total read timeout {timeout:?} not above read timeout {:?}, ignoring",
                self.read_timeout
            );
            return;
        }
        self.total_read_timeout = timeout;
    }

    /// Writes every byte to the stream or fails.
    ///
    /// When the bytes form a frame, its command byte is remembered so the
    /// next reads can discard the line's echo of this write.
    pub async fn write_all(&mut self, bytes: &[u8]) -> Result<(), Error> {
        trace!("write bytes: {bytes:02X?}");
        match self.stream.write_all(bytes).await {
            Ok(()) => {
                if bytes.len() > INDEX_COMMAND {
                    self.last_sent_command = Some(bytes[INDEX_COMMAND]);
                }
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::WriteZero => Err(Error::WriteIncomplete),
            Err(e) => Err(e.into()),
        }
    }

    /// Reads the next frame from the stream, skipping any echo of the last
    /// written frame.
    ///
    /// A half-duplex line returns the bytes the host just wrote, so after a
    /// write the next frame whose command equals the just-sent command is
    /// discarded and the read loops. Normally exactly one echo arrives, but
    /// zero or several consecutive echoes are tolerated.
    pub async fn read_next_packet(&mut self, cancel: &CancellationToken) -> Result<Packet, Error> {
        loop {
            let packet = self.read_packet(cancel).await?;
            match self.last_sent_command {
                Some(command) if packet.command() == command => {
                    debug!("read back the command we just sent, discarding echo");
                    continue;
                }
                _ => {
                    self.last_sent_command = None;
                    return Ok(packet);
                }
            }
        }
    }

    /// Shuts the stream down, releasing it. Consumes the transport so the
    /// release happens exactly once.
    pub async fn shutdown(mut self) -> Result<(), Error> {
        debug!("shutting down transport");
        self.stream.shutdown().await?;
        Ok(())
    }

    /// Reads one frame, bounded by the total-read timeout and preemptible
    /// by cancellation. Cancellation breaks the paired write-then-read
    /// invariant, so it also resets the echo filter.
    async fn read_packet(&mut self, cancel: &CancellationToken) -> Result<Packet, Error> {
        let assembled = tokio::select! {
            _ = cancel.cancelled() => None,
            assembled = tokio::time::timeout(self.total_read_timeout, self.assemble_packet()) => {
                Some(assembled)
            }
        };
        match assembled {
            None => {
                self.last_sent_command = None;
                Err(Error::Cancelled)
            }
            Some(Err(_)) => Err(Error::ReadTimeout),
            Some(Ok(result)) => result,
        }
    }

    /// Reads header + payload and verifies the checksum.
    async fn assemble_packet(&mut self) -> Result<Packet, Error> {
        let mut header = [0u8; HEADER_SIZE];
        loop {
            self.read_in_full(&mut header).await?;
            match validate_header(&header) {
                Ok(()) => break,
                Err(reason) => {
                    if header[0] == MAGIC_BYTE {
                        return Err(Error::InvalidHeader(reason));
                    }
                    // maybe we caught the tail of a previous frame; slide to
                    // the next magic byte and finish the header from there
                    let Some(k) = header.iter().position(|&b| b == MAGIC_BYTE) else {
                        continue;
                    };
                    header.copy_within(k.., 0);
                    let filled = HEADER_SIZE - k;
                    self.read_in_full(&mut header[filled..]).await?;
                    validate_header(&header)?;
                    break;
                }
            }
        }

        let payload_size = header[INDEX_PAYLOAD_SIZE] as usize;
        debug!("reading {payload_size} payload bytes");
        let mut payload = vec![0u8; payload_size];
        self.read_in_full(&mut payload).await?;

        let mut bytes = Vec::with_capacity(HEADER_SIZE + payload_size);
        bytes.extend_from_slice(&header);
        bytes.extend_from_slice(&payload);

        let received = bytes[bytes.len() - 1];
        let calculated = checksum(&bytes);
        if received != calculated {
            debug!("invalid checksum. want: {calculated:#04x}. got: {received:#04x}.");
            return Err(Error::InvalidChecksum);
        }

        Ok(Packet::from_bytes(bytes))
    }

    /// Fills `buf` from the stream. Each underlying read is preceded by the
    /// on-wire time of the outstanding byte count, to let the ECU's
    /// response actually arrive, and bounded by the per-read timeout.
    async fn read_in_full(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        let mut filled = 0;
        while filled < buf.len() {
            let pending = buf.len() - filled;
            trace!("waiting {:?} for {pending} bytes", wire_time(pending));
            tokio::time::sleep(wire_time(pending)).await;

            let count = tokio::time::timeout(self.read_timeout, self.stream.read(&mut buf[filled..]))
                .await
                .map_err(|_| Error::ReadTimeout)??;
            if count == 0 {
                return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
            }
            trace!("read: {:02X?}", &buf[filled..filled + count]);
            filled += count;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Command, Device};
    use tokio::io::AsyncWriteExt;

    fn frame(source: Device, destination: Device, command: Command, data: &[u8]) -> Vec<u8> {
        Packet::new(source, destination, command, data).to_vec()
    }

    #[tokio::test]
    async fn reads_a_valid_frame() {
        let (host, mut ecu) = tokio::io::duplex(256);
        let response = frame(
            Device::Engine,
            Device::DiagnosticTool,
            Command::ReadAddressesResponse,
            &[0x20, 0xA1],
        );
        ecu.write_all(&response).await.unwrap();

        let mut transport = Transport::new(host);
        let packet = transport
            .read_next_packet(&CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(packet.data(), &[0x20, 0xA1]);
    }

    #[tokio::test]
    async fn resyncs_on_leading_garbage() {
        let (host, mut ecu) = tokio::io::duplex(256);
        let mut bytes = vec![0x01, 0x02, 0x03];
        bytes.extend(frame(
            Device::Engine,
            Device::DiagnosticTool,
            Command::InitResponse,
            &[],
        ));
        ecu.write_all(&bytes).await.unwrap();

        let mut transport = Transport::new(host);
        let packet = transport
            .read_next_packet(&CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(packet.command(), Command::InitResponse as u8);
    }

    #[tokio::test]
    async fn rejects_bad_checksum() {
        let (host, mut ecu) = tokio::io::duplex(256);
        let mut bytes = frame(
            Device::Engine,
            Device::DiagnosticTool,
            Command::InitResponse,
            &[],
        );
        let last = bytes.len() - 1;
        bytes[last] = bytes[last].wrapping_add(1);
        ecu.write_all(&bytes).await.unwrap();

        let mut transport = Transport::new(host);
        let err = transport
            .read_next_packet(&CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidChecksum));
    }

    #[tokio::test]
    async fn discards_echoed_write() {
        let (host, mut ecu) = tokio::io::duplex(256);
        let request = frame(Device::DiagnosticTool, Device::Engine, Command::InitRequest, &[]);
        let response = frame(Device::Engine, Device::DiagnosticTool, Command::InitResponse, &[]);
        // the half-duplex line reflects the request before the response
        ecu.write_all(&request).await.unwrap();
        ecu.write_all(&response).await.unwrap();

        let mut transport = Transport::new(host);
        transport.write_all(&request).await.unwrap();
        let packet = transport
            .read_next_packet(&CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(packet.command(), Command::InitResponse as u8);
    }

    #[tokio::test]
    async fn read_times_out_on_silence() {
        let (host, _ecu) = tokio::io::duplex(256);
        let mut transport = Transport::new(host);
        transport.set_read_timeout(Duration::from_millis(50));
        transport.set_total_read_timeout(Duration::from_millis(200));

        let err = transport
            .read_next_packet(&CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ReadTimeout));
    }

    #[tokio::test]
    async fn cancellation_preempts_read() {
        let (host, _ecu) = tokio::io::duplex(256);
        let mut transport = Transport::new(host);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let start = std::time::Instant::now();
        let err = transport.read_next_packet(&cancel).await.unwrap_err();
        assert!(matches!(err, Error::Cancelled));
        assert!(start.elapsed() < DEFAULT_READ_TIMEOUT);
    }

    #[test]
    fn wire_time_matches_line_rate() {
        // one byte is 10 bits at 4800 baud
        assert_eq!(wire_time(1), Duration::from_micros(2083));
        assert_eq!(wire_time(6), Duration::from_micros(12500));
    }
}
