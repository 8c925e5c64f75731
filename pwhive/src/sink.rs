use std::io::Write;

use crate::error::SinkError;

/// Destination for accepted passwords, one record at a time.
pub trait Sink {
    /// Writes `record` followed by a newline, or reports why it could not.
    fn emit(&mut self, record: &str) -> Result<(), SinkError>;

    /// Pushes buffered records through to the destination.
    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Line-oriented sink over any [`Write`].
///
/// No buffering is added; wrap the writer in a `BufWriter` for files.
#[derive(Debug)]
pub struct WriteSink<W> {
    inner: W,
}

impl<W: Write> WriteSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Sink for WriteSink<W> {
    fn emit(&mut self, record: &str) -> Result<(), SinkError> {
        self.inner.write_all(record.as_bytes())?;
        self.inner.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.inner.flush()?;
        Ok(())
    }
}

/// Collects records in memory.
impl Sink for Vec<String> {
    fn emit(&mut self, record: &str) -> Result<(), SinkError> {
        self.push(record.to_owned());
        Ok(())
    }
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn emit(&mut self, record: &str) -> Result<(), SinkError> {
        (**self).emit(record)
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        (**self).flush()
    }
}
