use std::sync::{Arc, Mutex, MutexGuard};

use crate::SealingWrite;

impl SealingWrite for Vec<u8> {
    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.extend_from_slice(buf);
        Ok(())
    }

    fn seal(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// In-memory sink whose contents stay reachable through clones after the
/// sink itself has been handed over (boxed) to a writer.
#[derive(Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<SharedBufferState>>,
}

#[derive(Default)]
struct SharedBufferState {
    data: Vec<u8>,
    sealed: bool,
}

impl SharedBuffer {
    pub fn new() -> SharedBuffer {
        Default::default()
    }

    /// Returns a copy of everything written so far.
    pub fn contents(&self) -> Vec<u8> {
        self.lock().data.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_sealed(&self) -> bool {
        self.lock().sealed
    }

    fn lock(&self) -> MutexGuard<'_, SharedBufferState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SealingWrite for SharedBuffer {
    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        let mut state = self.lock();
        if state.sealed {
            return Err(std::io::Error::other("write to a sealed buffer"));
        }
        state.data.extend_from_slice(buf);
        Ok(())
    }

    fn seal(&mut self) -> std::io::Result<()> {
        let mut state = self.lock();
        if state.sealed {
            return Err(std::io::Error::other("buffer is already sealed"));
        }
        state.sealed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_buffer_visible_through_clone() {
        let buffer = SharedBuffer::new();
        let mut sink: Box<dyn SealingWrite> = Box::new(buffer.clone());
        sink.write_all(b"hello").unwrap();
        sink.write_all(b" world").unwrap();
        assert!(!buffer.is_sealed());
        sink.seal().unwrap();
        assert!(buffer.is_sealed());
        assert_eq!(buffer.contents(), b"hello world");
        assert!(sink.write_all(b"!").is_err());
        assert!(sink.seal().is_err());
    }

    #[test]
    fn test_vec_sink() {
        let mut sink = Vec::<u8>::new();
        SealingWrite::write_all(&mut sink, b"abc").unwrap();
        sink.seal().unwrap();
        assert_eq!(sink, b"abc");
    }
}
