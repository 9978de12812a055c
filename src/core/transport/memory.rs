//! Scripted in-memory byte source

use super::{ByteSource, Chunk, TransportError};
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Frames written to a [`MemorySource`], shared with the test that created it
pub type WriteLog = Arc<Mutex<Vec<Vec<u8>>>>;

enum Step {
    Chunk(Chunk),
    Fail(String),
}

/// Plays back a script of chunks and failures, then reports end-of-stream
/// (or idles, see [`MemorySource::idle_when_drained`]).
pub struct MemorySource {
    script: VecDeque<Step>,
    writes: WriteLog,
    idle_when_drained: bool,
    closed: bool,
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySource {
    /// Empty script
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
            writes: Arc::new(Mutex::new(Vec::new())),
            idle_when_drained: false,
            closed: false,
        }
    }

    /// Source that yields `data` split into `chunk`-sized pieces
    pub fn from_bytes(data: &[u8], chunk: usize) -> Self {
        data.chunks(chunk.max(1)).fold(Self::new(), |source, piece| source.data(piece))
    }

    /// Queue a data chunk
    #[must_use]
    pub fn data(mut self, bytes: &[u8]) -> Self {
        self.script.push_back(Step::Chunk(Chunk::Data(Bytes::copy_from_slice(bytes))));
        self
    }

    /// Queue an idle read
    #[must_use]
    pub fn empty(mut self) -> Self {
        self.script.push_back(Step::Chunk(Chunk::Empty));
        self
    }

    /// Queue an end-of-stream
    #[must_use]
    pub fn end(mut self) -> Self {
        self.script.push_back(Step::Chunk(Chunk::EndOfStream));
        self
    }

    /// Queue a read failure
    #[must_use]
    pub fn fail(mut self, message: &str) -> Self {
        self.script.push_back(Step::Fail(message.to_string()));
        self
    }

    /// Return [`Chunk::Empty`] instead of end-of-stream once the script runs out
    #[must_use]
    pub fn idle_when_drained(mut self) -> Self {
        self.idle_when_drained = true;
        self
    }

    /// Handle on the frames written so far
    pub fn writes(&self) -> WriteLog {
        Arc::clone(&self.writes)
    }
}

impl ByteSource for MemorySource {
    fn read(&mut self, _blocking: bool) -> Result<Chunk, TransportError> {
        if self.closed {
            return Ok(Chunk::EndOfStream);
        }
        match self.script.pop_front() {
            Some(Step::Chunk(chunk)) => Ok(chunk),
            Some(Step::Fail(message)) => Err(TransportError::IoError(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                message,
            ))),
            None if self.idle_when_drained => Ok(Chunk::Empty),
            None => Ok(Chunk::EndOfStream),
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Disconnected);
        }
        self.writes.lock().push(data.to_vec());
        Ok(())
    }

    fn close(&mut self) {
        self.closed = true;
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_order() {
        let mut source = MemorySource::new().data(b"ab").empty().fail("unplugged");
        assert_eq!(source.read(true).unwrap(), Chunk::Data(Bytes::from_static(b"ab")));
        assert_eq!(source.read(true).unwrap(), Chunk::Empty);
        assert!(source.read(true).is_err());
        assert_eq!(source.read(true).unwrap(), Chunk::EndOfStream);
    }

    #[test]
    fn test_from_bytes_splits() {
        let mut source = MemorySource::from_bytes(b"abcde", 2);
        assert_eq!(source.read(false).unwrap(), Chunk::Data(Bytes::from_static(b"ab")));
        assert_eq!(source.read(false).unwrap(), Chunk::Data(Bytes::from_static(b"cd")));
        assert_eq!(source.read(false).unwrap(), Chunk::Data(Bytes::from_static(b"e")));
    }

    #[test]
    fn test_writes_recorded() {
        let mut source = MemorySource::new();
        let log = source.writes();
        source.write(&[1, 2, 3]).unwrap();
        assert_eq!(*log.lock(), vec![vec![1u8, 2, 3]]);
        source.close();
        assert!(source.write(&[4]).is_err());
    }

    #[test]
    fn test_idle_when_drained() {
        let mut source = MemorySource::new().idle_when_drained();
        assert_eq!(source.read(false).unwrap(), Chunk::Empty);
    }
}
