//! `ByteStream` extension pushing a whole buffer to the collector within a
//! wall-clock deadline.
//!
//! # Partial writes
//!
//! Stream transports may accept only a prefix of the buffer. The remaining
//! suffix is re-submitted until every byte is confirmed, without any pause
//! between attempts.
//!
//! # Deadline
//!
//! The deadline is checked before each attempt, and each attempt races the
//! time left: a transport whose write never completes (full peer window) is
//! abandoned when the deadline expires. Once it has elapsed the call fails
//! with [`SendError::Timeout`]; bytes already accepted are not rolled back, so
//! the collector may have received a prefix of the report.
use crate::error::SendError;
use crate::protocol::transport::traits::{byte_stream::ByteStream, station_timer::StationTimer};
use futures_util::future::{select, Either};
use futures_util::pin_mut;

/// Trait extending `ByteStream` with an all-or-error send.
pub trait ReliableSend: ByteStream
where
    <Self as ByteStream>::Error: core::fmt::Debug,
{
    /// Send every byte of `bytes`, retrying partial writes, or fail.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - [`SendError::Timeout`] when more than `timeout_ms` elapsed before the
    ///   buffer was fully accepted (never earlier)
    /// - [`SendError::Transport`] as soon as the transport reports an error
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use meteo_station::protocol::transport::reliable_send::ReliableSend;
    ///
    /// socket.send_all(report.as_bytes(), REPORT_SEND_TIMEOUT_MS, &mut timer).await?;
    /// ```
    fn send_all<'a, T: StationTimer>(
        &'a mut self,
        bytes: &'a [u8],
        timeout_ms: u32,
        timer: &'a mut T,
    ) -> impl core::future::Future<Output = Result<(), SendError<Self::Error>>> + 'a;
}

impl<S: ByteStream> ReliableSend for S
where
    S::Error: core::fmt::Debug,
{
    fn send_all<'a, T: StationTimer>(
        &'a mut self,
        bytes: &'a [u8],
        timeout_ms: u32,
        timer: &'a mut T,
    ) -> impl core::future::Future<Output = Result<(), SendError<Self::Error>>> + 'a {
        async move {
            let total = bytes.len();
            let started_at = timer.now_ms();
            let mut sent = 0usize;

            while sent < total {
                let elapsed = timer.now_ms().saturating_sub(started_at);
                if elapsed > timeout_ms as u64 {
                    #[cfg(feature = "defmt")]
                    defmt::error!(
                        "Report send timed out: {}/{} bytes after {} ms",
                        sent,
                        total,
                        elapsed
                    );
                    return Err(SendError::Timeout {
                        timeout_ms,
                        sent,
                        total,
                    });
                }

                let remaining = (timeout_ms as u64 - elapsed) as u32;
                let attempt = self.send(&bytes[sent..]);
                let deadline = timer.delay_ms(remaining);
                pin_mut!(attempt);
                pin_mut!(deadline);

                let accepted = match select(attempt, deadline).await {
                    Either::Left((result, _)) => result.map_err(SendError::Transport)?,
                    // Abandon the pending write; the check above decides.
                    Either::Right(_) => continue,
                };

                // A transport claiming more than it was offered cannot push us past the end.
                sent += accepted.min(total - sent);
            }

            Ok(())
        }
    }
}
