/// Errors produced while talking to an ECU.
///
/// The variants form a closed taxonomy: everything the frame codec, the
/// transport, the connection, and the unit graph can report is listed here
/// so callers can match on the failure kind instead of parsing messages.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An I/O error propagated from the underlying byte stream.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The byte stream accepted fewer bytes than were written. Fatal to the
    /// operation in progress.
    #[error("short write to the serial line")]
    WriteIncomplete,
    /// The per-read or total-read deadline elapsed before a full packet
    /// arrived.
    #[error("the read operation timed out")]
    ReadTimeout,
    /// The caller cancelled the operation.
    #[error("the operation was cancelled")]
    Cancelled,
    /// A packet header failed validation.
    #[error("invalid packet header: {0}")]
    InvalidHeader(#[from] HeaderError),
    /// The checksum trailer byte disagrees with the receiver's calculation.
    #[error("invalid checksum byte")]
    InvalidChecksum,
    /// The response frame's command is not the expected pair of the request.
    #[error("unexpected response command")]
    InvalidResponseCommand,
    /// The unit graph has no edge for the requested conversion.
    #[error("units are invalid for conversion")]
    InvalidConversion,
    /// The logging task panicked or was aborted before handing the
    /// connection back.
    #[error("logging task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// The reason a 5-byte packet header was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HeaderError {
    /// The first byte is not the 0x80 magic byte.
    #[error("invalid magic byte")]
    Magic,
    /// The destination byte is not a known device.
    #[error("invalid destination")]
    Destination,
    /// The source byte is not a known device.
    #[error("invalid source")]
    Source,
    /// The command byte is not a known command.
    #[error("invalid command")]
    Command,
    /// The payload size must count at least the checksum byte.
    #[error("invalid payload size")]
    PayloadSize,
}
