//! Byte sinks for container output.
//!
//! [`SealingWrite`] is the append-only sink a container writer owns for the
//! duration of one session. Implementations: `Vec<u8>`, [`SharedBuffer`]
//! and [`FileWriter`].

pub mod file;
pub mod memory;

pub use file::FileWriter;
pub use memory::SharedBuffer;

/// An append-only byte sink with an explicit commit step.
///
/// Writes accumulate until [`seal`](SealingWrite::seal) is called. Only a
/// sealed sink holds a complete artifact: a sink released without sealing
/// keeps whatever reached it, and that output must be treated as partial.
///
/// The trait requires [`Send`] so a sink can be handed to a worker thread,
/// but not [`Sync`]: a sink has a single owner at a time.
pub trait SealingWrite: Send {
    /// Appends the entire buffer.
    ///
    /// # Errors
    ///
    /// Any I/O failure of the underlying medium, or a write after `seal`.
    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()>;

    /// Flushes everything written so far and commits it. No write is
    /// accepted afterwards.
    ///
    /// # Errors
    ///
    /// Any I/O failure while flushing, or a repeated `seal`.
    fn seal(&mut self) -> std::io::Result<()>;
}

impl<W: SealingWrite + ?Sized> SealingWrite for Box<W> {
    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        (**self).write_all(buf)
    }

    fn seal(&mut self) -> std::io::Result<()> {
        (**self).seal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boxed_sealing_write() {
        let mut writer: Box<dyn SealingWrite> = Box::new(Vec::<u8>::new());
        writer.write_all(b"abc").unwrap();
        writer.seal().unwrap();
    }
}
