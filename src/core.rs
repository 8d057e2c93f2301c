//! Data types shared by the sensor drivers, the acquisition station and the
//! transmission layer.
//!
//! Sensors render their readings into a [`ReportBuffer`]; the station hands the
//! populated bytes to the reliable sender. Measurements come back as a
//! [`Reading`], which keeps a failed cycle visible instead of silently reusing
//! the previous value.

use core::fmt;

// Three sensors produce five lines of at most ~40 bytes each. Generous margin.
pub const MAX_REPORT_BYTES: usize = 512;

/// Fixed-capacity text buffer holding one acquisition report.
///
/// Implements [`core::fmt::Write`] so sensors can use `write!` without heap
/// allocation. A write that would overflow the capacity fails as a whole and
/// leaves the buffer untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportBuffer {
    pub len: usize,
    pub data: [u8; MAX_REPORT_BYTES],
}

impl Default for ReportBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportBuffer {
    /// Create an empty buffer.
    pub const fn new() -> Self {
        Self {
            len: 0,
            data: [0; MAX_REPORT_BYTES],
        }
    }

    /// Number of valid bytes stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Checks whether the buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Maximum number of bytes the buffer accepts.
    #[inline]
    pub const fn capacity(&self) -> usize {
        MAX_REPORT_BYTES
    }

    /// Reset the buffer.
    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Append raw bytes; returns `false` (and writes nothing) when they do not fit.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> bool {
        let end = self.len + bytes.len();
        if end > MAX_REPORT_BYTES {
            return false;
        }
        self.data[self.len..end].copy_from_slice(bytes);
        self.len = end;
        true
    }

    /// Immutable view over the populated bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// View of the report as text. Only `write_str` fills the buffer, so the
    /// content is always valid UTF-8 unless raw bytes were pushed.
    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(self.as_bytes()).ok()
    }
}

impl fmt::Write for ReportBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.push_bytes(s.as_bytes()) {
            Ok(())
        } else {
            Err(fmt::Error)
        }
    }
}

/// Outcome of a measurement step.
///
/// `Stale` carries the value published by the last successful cycle together
/// with the reason the current cycle failed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading<V, E> {
    /// The measurement succeeded; `V` is the new value.
    Fresh(V),
    /// The measurement failed; `last` is still being published.
    Stale { last: V, reason: E },
}

impl<V: Copy, E> Reading<V, E> {
    /// Value that will be published, fresh or not.
    pub fn value(&self) -> V {
        match self {
            Reading::Fresh(value) => *value,
            Reading::Stale { last, .. } => *last,
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, Reading::Fresh(_))
    }

    /// Reason of the failure for stale readings.
    pub fn stale_reason(&self) -> Option<&E> {
        match self {
            Reading::Fresh(_) => None,
            Reading::Stale { reason, .. } => Some(reason),
        }
    }

    /// Convert the payload while keeping the freshness tag.
    pub fn map<U, F: FnOnce(V) -> U>(self, f: F) -> Reading<U, E> {
        match self {
            Reading::Fresh(value) => Reading::Fresh(f(value)),
            Reading::Stale { last, reason } => Reading::Stale {
                last: f(last),
                reason,
            },
        }
    }
}
