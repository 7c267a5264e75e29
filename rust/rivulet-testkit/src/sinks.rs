//! Instrumented `SealingWrite` sinks.

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use rivulet_io::SealingWrite;

#[derive(Debug, Default)]
struct Counters {
    bytes: AtomicU64,
    writes: AtomicU64,
    sealed: AtomicBool,
}

/// A sink that discards everything written to it, counting bytes and write
/// calls.
///
/// Clones share the counters, so a test can keep one handle while the
/// writer owns another.
#[derive(Debug, Clone, Default)]
pub struct CountingSink {
    counters: Arc<Counters>,
}

impl CountingSink {
    pub fn new() -> CountingSink {
        Default::default()
    }

    pub fn bytes_written(&self) -> u64 {
        self.counters.bytes.load(Ordering::Relaxed)
    }

    pub fn write_calls(&self) -> u64 {
        self.counters.writes.load(Ordering::Relaxed)
    }

    pub fn is_sealed(&self) -> bool {
        self.counters.sealed.load(Ordering::Relaxed)
    }
}

impl SealingWrite for CountingSink {
    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        if self.is_sealed() {
            return Err(std::io::Error::other("write to a sealed sink"));
        }
        self.counters
            .bytes
            .fetch_add(buf.len() as u64, Ordering::Relaxed);
        self.counters.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn seal(&mut self) -> std::io::Result<()> {
        if self.counters.sealed.swap(true, Ordering::Relaxed) {
            return Err(std::io::Error::other("sink already sealed"));
        }
        Ok(())
    }
}

/// A sink that accepts a fixed number of bytes and then fails every write
/// with `BrokenPipe`, optionally failing `seal` as well.
#[derive(Debug, Clone)]
pub struct FaultySink {
    capacity: u64,
    fail_seal: bool,
    counters: Arc<Counters>,
}

impl FaultySink {
    /// Fails the first write that would exceed `capacity` bytes.
    pub fn fail_after(capacity: u64) -> FaultySink {
        FaultySink {
            capacity,
            fail_seal: false,
            counters: Default::default(),
        }
    }

    /// Accepts every write but fails `seal`.
    pub fn fail_on_seal() -> FaultySink {
        FaultySink {
            capacity: u64::MAX,
            fail_seal: true,
            counters: Default::default(),
        }
    }

    pub fn bytes_written(&self) -> u64 {
        self.counters.bytes.load(Ordering::Relaxed)
    }

    pub fn is_sealed(&self) -> bool {
        self.counters.sealed.load(Ordering::Relaxed)
    }
}

impl SealingWrite for FaultySink {
    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        let written = self.bytes_written();
        if written.saturating_add(buf.len() as u64) > self.capacity {
            return Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                format!("sink capacity of {} bytes exhausted", self.capacity),
            ));
        }
        self.counters
            .bytes
            .fetch_add(buf.len() as u64, Ordering::Relaxed);
        self.counters.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn seal(&mut self) -> std::io::Result<()> {
        if self.fail_seal {
            return Err(std::io::Error::other("seal failed"));
        }
        self.counters.sealed.store(true, Ordering::Relaxed);
        Ok(())
    }
}
