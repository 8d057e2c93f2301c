//! Connected byte-stream transport (TCP socket, UART bridge...) towards the
//! collector.
use core::future::Future;

/// Contract to push bytes to the collector.
pub trait ByteStream {
    type Error: core::fmt::Debug;

    /// Write a prefix of `bytes` and return how many were accepted.
    ///
    /// A short (even zero-length) write is not an error: callers retry the
    /// remaining suffix. The future may be dropped before completion when the
    /// send deadline expires; bytes are only accepted once it resolves.
    fn send<'a>(&'a mut self, bytes: &'a [u8])
        -> impl Future<Output = Result<usize, Self::Error>> + 'a;

    /// Tear the connection down. Errors while closing are ignored.
    fn close<'a>(&'a mut self) -> impl Future<Output = ()> + 'a;
}
