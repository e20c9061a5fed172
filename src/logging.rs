//! Continuous logging of parameter values from an ECU.
//!
//! A session issues one continuous read-addresses request and then decodes
//! every subsequent frame into a map of parameter id to value, publishing
//! each map on a bounded channel. A slow consumer slows the producer; no
//! decoded frame is ever dropped.

use std::collections::HashMap;

use log::{debug, warn};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::connection::Connection;
use crate::error::Error;
use crate::parameters::{DerivedParameter, Parameter, ParameterValues};
use crate::units::Unit;

/// Capacity of the session's output channel. Large enough to absorb
/// ordinary consumer jitter at 4800 baud.
const RESULTS_BUFFER: usize = 10;

/// Number of consecutive frame failures after which the session gives up
/// and closes its output. Any successful frame resets the count.
const MAX_CONSECUTIVE_ERRORS: u32 = 3;

/// A running logging session.
///
/// The session owns the connection for its lifetime; [`LoggingSession::stop`]
/// hands it back so the caller can run other operations (e.g. trouble-code
/// reads) afterwards.
#[derive(Debug)]
pub struct LoggingSession<S> {
    values: mpsc::Receiver<ParameterValues>,
    cancel: CancellationToken,
    task: JoinHandle<Connection<S>>,
}

impl<S> LoggingSession<S> {
    /// Receives the next decoded frame. Returns `None` once the session has
    /// been cancelled or has exhausted its error budget.
    pub async fn next_values(&mut self) -> Option<ParameterValues> {
        self.values.recv().await
    }

    /// Cancels the session and returns the connection once the read loop
    /// has wound down. After this returns, no further values are produced.
    pub async fn stop(self) -> Result<Connection<S>, Error> {
        self.cancel.cancel();
        Ok(self.task.await?)
    }
}

/// Starts a continuous logging session for the given parameters.
///
/// Each parameter contributes one address per byte of its length, so a
/// two-byte parameter is read as `base` and `base+1`. The initial response
/// to the read-addresses request carries the same shape of data as every
/// later frame but is treated as the acknowledgement and discarded.
pub async fn logging_session<S>(
    mut conn: Connection<S>,
    parameters: Vec<&'static Parameter>,
    derived: Vec<&'static DerivedParameter>,
    cancel: CancellationToken,
) -> Result<LoggingSession<S>, Error>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let mut addresses = Vec::new();
    for parameter in &parameters {
        for i in 0..parameter.address.length {
            addresses.push(parameter.address.add(i as u32));
        }
    }

    conn.send_read_addresses_request(&addresses, true, &cancel)
        .await?;

    let (tx, rx) = mpsc::channel(RESULTS_BUFFER);
    let task = tokio::spawn(process_packets(conn, tx, parameters, derived, cancel.clone()));

    Ok(LoggingSession {
        values: rx,
        cancel,
        task,
    })
}

async fn process_packets<S>(
    mut conn: Connection<S>,
    results: mpsc::Sender<ParameterValues>,
    parameters: Vec<&'static Parameter>,
    derived: Vec<&'static DerivedParameter>,
    cancel: CancellationToken,
) -> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    let frame_len: usize = parameters.iter().map(|p| p.address.length).sum();
    let mut error_count = 0u32;

    while !cancel.is_cancelled() {
        let packet = match conn.next_packet(&cancel).await {
            Ok(packet) => packet,
            Err(Error::Cancelled) => break,
            Err(e) => {
                debug!("reading response packet: {e}");
                error_count += 1;
                if error_count == MAX_CONSECUTIVE_ERRORS {
                    warn!("{MAX_CONSECUTIVE_ERRORS} consecutive frame failures, stopping session");
                    break;
                }
                continue;
            }
        };

        let data = packet.data();
        if data.len() < frame_len {
            debug!(
                "response frame holds {} bytes, expected {frame_len}",
                data.len()
            );
            error_count += 1;
            if error_count == MAX_CONSECUTIVE_ERRORS {
                warn!("{MAX_CONSECUTIVE_ERRORS} consecutive frame failures, stopping session");
                break;
            }
            continue;
        }
        error_count = 0;

        let mut values = ParameterValues::with_capacity(parameters.len() + derived.len());
        let mut offset = 0;
        for parameter in &parameters {
            let raw = &data[offset..offset + parameter.address.length];
            values.insert(parameter.id, parameter.decode(raw));
            offset += parameter.address.length;
        }
        for derived_parameter in &derived {
            match derived_parameter.evaluate(&values) {
                Ok(value) => {
                    values.insert(derived_parameter.id, value);
                }
                Err(e) => debug!("getting value from {}: {e}", derived_parameter.id),
            }
        }

        // bounded backpressure: block until the consumer catches up, but
        // never publish after cancellation
        tokio::select! {
            _ = cancel.cancelled() => break,
            sent = results.send(values) => {
                if sent.is_err() {
                    debug!("results receiver dropped, stopping session");
                    break;
                }
            }
        }
    }

    conn
}

/// Converts each value a subscriber asked about to its preferred unit. A
/// value without a preference, and a value whose conversion has no edge in
/// the unit graph, keeps its original unit; failed conversions are logged.
pub fn apply_unit_preferences(values: &mut ParameterValues, preferences: &HashMap<&str, Unit>) {
    for (id, unit) in preferences {
        if let Some(value) = values.get_mut(*id) {
            match value.convert_to(*unit) {
                Ok(converted) => *value = converted,
                Err(e) => warn!("converting {id} to {unit}: {e}"),
            }
        }
    }
}
