//! Reader that replays an already consumed prefix before its source.
//!
//! The walker sniffs the first bytes of every entry to decide whether it is a
//! nested archive. Entry readers are forward-only, so the sniffed bytes must be
//! served again ahead of the rest of the stream.

use std::io;
use std::io::Read;

/// Serves bytes from an in-memory prefix, then from the wrapped reader.
///
/// Reading the composite to the end yields exactly `prefix ++ rest` no matter
/// how the reads are split. Once the wrapped reader reports end of stream the
/// composite remembers it and never polls the reader again. An error raised
/// by the wrapped reader after prefix bytes were served in the same call is
/// kept and returned by the next call.
///
/// # Examples
///
/// ```
/// use nestarc_core::io::CompositeReader;
/// use std::io::Read;
///
/// let rest: &[u8] = b" world";
/// let mut reader = CompositeReader::new(b"hello".to_vec(), rest);
///
/// let mut out = String::new();
/// reader.read_to_string(&mut out)?;
/// assert_eq!(out, "hello world");
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug)]
pub struct CompositeReader<R> {
    prefix: Vec<u8>,
    pos: usize,
    inner: R,
    eof: bool,
    deferred: Option<io::Error>,
}

impl<R: Read> CompositeReader<R> {
    /// Creates a reader that serves `prefix` first and then `inner`.
    pub fn new(prefix: Vec<u8>, inner: R) -> Self {
        Self {
            prefix,
            pos: 0,
            inner,
            eof: false,
            deferred: None,
        }
    }

    /// Returns the part of the prefix not yet served.
    pub fn remaining_prefix(&self) -> &[u8] {
        &self.prefix[self.pos..]
    }

    /// Consumes the composite and returns the wrapped reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for CompositeReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "short buffer"));
        }
        if let Some(err) = self.deferred.take() {
            return Err(err);
        }

        let pending = &self.prefix[self.pos..];
        let served = pending.len().min(buf.len());
        buf[..served].copy_from_slice(&pending[..served]);
        self.pos += served;

        if served == buf.len() || self.eof {
            return Ok(served);
        }

        match self.inner.read(&mut buf[served..]) {
            Ok(0) => {
                self.eof = true;
                Ok(served)
            }
            Ok(n) => Ok(served + n),
            // Bytes already copied from the prefix must not be lost.
            Err(err) if served > 0 => {
                self.deferred = Some(err);
                Ok(served)
            }
            Err(err) => Err(err),
        }
    }
}
