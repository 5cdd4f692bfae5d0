//! Forced time based rotation on top of a rotating sink

use parking_lot::Mutex;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::fmt::MakeWriter;

use crate::sink::RotatingSink;

/// Error returned by [`TimeRotatingWriter::write`]
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// The sink rejected the write
    #[error(transparent)]
    Write(io::Error),

    /// Rotation failed but the bytes reached the old file
    #[error("log file rotation failed: {source}")]
    Rotation {
        written: usize,
        #[source]
        source: io::Error,
    },

    /// Rotation failed and so did the write to the old file
    #[error("write failed after rotation failure: {write} (rotation error: {rotation})")]
    RotationAndWrite { rotation: io::Error, write: io::Error },
}

impl WriteError {
    /// Bytes that reached the sink despite the error
    pub fn written(&self) -> usize {
        match self {
            WriteError::Rotation { written, .. } => *written,
            WriteError::Write(_) | WriteError::RotationAndWrite { .. } => 0,
        }
    }

    /// The rotation failure, if rotation was attempted and failed
    pub fn rotation_error(&self) -> Option<&io::Error> {
        match self {
            WriteError::Rotation { source, .. } => Some(source),
            WriteError::RotationAndWrite { rotation, .. } => Some(rotation),
            WriteError::Write(_) => None,
        }
    }
}

impl From<WriteError> for io::Error {
    fn from(err: WriteError) -> Self {
        match err {
            WriteError::Write(e) => e,
            other => io::Error::new(io::ErrorKind::Other, other),
        }
    }
}

struct State<S> {
    sink: S,
    last_rotation: Instant,
}

/// Writer that rotates its sink at least once per `interval`,
/// on top of whatever policy the sink enforces itself.
///
/// One lock covers the rotation check, the rotation and the write, so
/// concurrent callers never both rotate and no write straddles a rotation.
pub struct TimeRotatingWriter<S> {
    interval: Duration,
    state: Mutex<State<S>>,
}

impl<S: RotatingSink> TimeRotatingWriter<S> {
    /// Wrap `sink`. A zero `interval` disables time based rotation.
    pub fn new(sink: S, interval: Duration) -> Self {
        Self {
            interval,
            state: Mutex::new(State {
                sink,
                last_rotation: Instant::now(),
            }),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// When the last time based rotation happened (construction time if none yet)
    pub fn last_rotation(&self) -> Instant {
        self.state.lock().last_rotation
    }

    /// Write `buf`, rotating first if the interval has elapsed.
    ///
    /// If rotation fails the bytes are still written to the current file and
    /// the rotation error is returned as [`WriteError::Rotation`] carrying the
    /// byte count. The rotation is retried on the next write.
    pub fn write(&self, buf: &[u8]) -> Result<usize, WriteError> {
        let mut state = self.state.lock();

        if !self.interval.is_zero() && state.last_rotation.elapsed() >= self.interval {
            if let Err(rotation) = state.sink.rotate() {
                return match state.sink.write(buf) {
                    Ok(written) => Err(WriteError::Rotation {
                        written,
                        source: rotation,
                    }),
                    Err(write) => Err(WriteError::RotationAndWrite { rotation, write }),
                };
            }

            state.last_rotation = Instant::now();
        }

        state.sink.write(buf).map_err(WriteError::Write)
    }

    /// Close the sink, returning its result unchanged
    pub fn close(&self) -> io::Result<()> {
        self.state.lock().sink.close()
    }

    /// Run `f` against the sink while holding the write lock
    pub fn with_sink<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut self.state.lock().sink)
    }
}

/// A failed rotation whose bytes still reached the file surfaces as `Err`
/// here, unlike the usual `io::Write` contract. Callers such as `write_all`
/// must not retry on error or the line is written twice.
impl<S: RotatingSink> io::Write for &TimeRotatingWriter<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        TimeRotatingWriter::write(*self, buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Same error reporting as the `&TimeRotatingWriter` impl.
impl<S: RotatingSink> io::Write for TimeRotatingWriter<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        TimeRotatingWriter::write(&*self, buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Shared handle to a [`TimeRotatingWriter`] usable as a `tracing` fmt writer
pub struct SharedRotatingWriter<S>(Arc<TimeRotatingWriter<S>>);

impl<S: RotatingSink> SharedRotatingWriter<S> {
    pub fn new(writer: TimeRotatingWriter<S>) -> Self {
        Self(Arc::new(writer))
    }

    pub fn writer(&self) -> &TimeRotatingWriter<S> {
        &self.0
    }
}

impl<S> Clone for SharedRotatingWriter<S> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<'a, S: RotatingSink + 'a> MakeWriter<'a> for SharedRotatingWriter<S> {
    type Writer = &'a TimeRotatingWriter<S>;

    fn make_writer(&'a self) -> Self::Writer {
        &self.0
    }
}
