//! # ssm2_lib
//!
//! Client library for the Subaru Select Monitor v2 (SSM2) diagnostic
//! protocol. A host connected to the vehicle's diagnostic port through a
//! serial adapter can interrogate the ECU for the parameters it supports,
//! stream continuous reads of selected parameters, convert the decoded
//! values between units, and query diagnostic trouble codes.
//!
//! The library is transport-agnostic: [`Connection`] runs over anything
//! implementing tokio's `AsyncRead + AsyncWrite`, so a real serial port
//! (see the `tokio-serial` feature) and the in-memory fake in [`fake`] are
//! interchangeable. The caller configures the real port to the protocol's
//! fixed line settings: 4800 baud, 8 data bits, no parity, 1 stop bit.
//!
//! ## Features
//!
//! - `tokio-serial`: pulls in the `tokio-serial` crate for opening real
//!   serial ports.
//! - `serde`: `Serialize`/`Deserialize` support on value types.
//! - `default`/`bin-dependencies`: everything the `ssm2` command line tool
//!   needs.
//!
//! ## Example
//!
//! ```no_run
//! use ssm2_lib::{logging_session, Connection};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[cfg(feature = "tokio-serial")]
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use tokio_serial::SerialPortBuilderExt;
//!
//! let port = tokio_serial::new("/dev/ttyUSB0", ssm2_lib::transport::BAUD_RATE)
//!     .data_bits(tokio_serial::DataBits::Eight)
//!     .parity(tokio_serial::Parity::None)
//!     .stop_bits(tokio_serial::StopBits::One)
//!     .open_native_async()?;
//!
//! let cancel = CancellationToken::new();
//! let mut conn = Connection::new(port);
//! let ecu = conn.init_ecu(&cancel).await?;
//!
//! let parameters = ecu.supported_parameters.clone();
//! let derived = ecu.supported_derived_parameters.clone();
//! let mut session = logging_session(conn, parameters, derived, cancel).await?;
//! while let Some(values) = session.next_values().await {
//!     println!("{values:?}");
//! }
//! # Ok(())
//! # }
//! ```

/// Connection facade orchestrating requests and responses.
mod connection;
/// Diagnostic trouble code reads.
pub mod dtc;
/// The capability model parsed from an init response.
pub mod ecu;
/// Error types for the library.
mod error;
/// In-memory fake ECU.
pub mod fake;
/// Continuous logging sessions.
pub mod logging;
/// Parameter catalogue and decoders.
pub mod parameters;
/// Frame codec for the wire format.
pub mod protocol;
/// Half-duplex transport with pacing, timeouts and echo suppression.
pub mod transport;
/// Unit tags and the conversion graph.
pub mod units;

pub use connection::Connection;
pub use ecu::Ecu;
pub use error::{Error, HeaderError};
pub use logging::{apply_unit_preferences, logging_session, LoggingSession};
