//! Rotation-capable byte sink

use std::io;

/// A byte sink that owns a log file and knows how to rotate it.
///
/// `rotate` closes the current file and opens a new one. It returns an
/// error only when the switch did not happen, leaving the previous file
/// usable for writes. Housekeeping after the switch (pruning, compression)
/// must not fail the rotation.
///
/// Implementations must not emit `tracing` events: they run under the
/// writer lock, and a subscriber that writes back into the same writer
/// would deadlock.
pub trait RotatingSink: Send {
    /// Append `buf`, returning the number of bytes written
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Start a new file
    fn rotate(&mut self) -> io::Result<()>;

    /// Flush and release the current file
    fn close(&mut self) -> io::Result<()>;
}

impl<S: RotatingSink + ?Sized> RotatingSink for Box<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (**self).write(buf)
    }

    fn rotate(&mut self) -> io::Result<()> {
        (**self).rotate()
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}
