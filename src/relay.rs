//! The virtual serial port: two independent byte queues.
//!
//! `inbound` holds bytes travelling toward the emulator, `outbound` bytes
//! travelling toward the device. Each queue has its own lock, held only for
//! the push or pop, so traffic in one direction never stalls the other.

use crate::error::{BridgeError, BridgeResult};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;

/// Unbounded FIFO of bytes behind its own lock.
#[derive(Debug, Default)]
pub struct ByteQueue {
    buf: Mutex<VecDeque<u8>>,
}

impl ByteQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, byte: u8) {
        self.buf.lock().push_back(byte);
    }

    pub fn extend(&self, bytes: &[u8]) {
        self.buf.lock().extend(bytes);
    }

    /// Oldest byte, if any.
    pub fn pop(&self) -> Option<u8> {
        self.buf.lock().pop_front()
    }

    /// Pop up to `out.len()` bytes in order; returns how many were taken.
    pub fn pop_into(&self, out: &mut [u8]) -> usize {
        let mut buf = self.buf.lock();
        let n = out.len().min(buf.len());
        for (slot, byte) in out.iter_mut().zip(buf.drain(..n)) {
            *slot = byte;
        }
        n
    }

    pub fn len(&self) -> usize {
        self.buf.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.lock().is_empty()
    }
}

/// Both directions of the virtual serial port.
#[derive(Debug, Default)]
pub struct ByteRelay {
    inbound: ByteQueue,
    outbound: ByteQueue,
}

impl ByteRelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_inbound(&self, byte: u8) {
        self.inbound.push(byte);
    }

    pub fn write_inbound_slice(&self, bytes: &[u8]) {
        self.inbound.extend(bytes);
    }

    /// Queue a byte for the device. Always accepts it and returns 1, like a
    /// byte-stream `write`.
    pub fn write_outbound(&self, byte: u8) -> usize {
        self.outbound.push(byte);
        1
    }

    pub fn write_outbound_slice(&self, bytes: &[u8]) -> usize {
        self.outbound.extend(bytes);
        bytes.len()
    }

    pub fn available_inbound(&self) -> usize {
        self.inbound.len()
    }

    pub fn available_outbound(&self) -> usize {
        self.outbound.len()
    }

    /// Pop the oldest inbound byte.
    ///
    /// Callers are expected to check [`available_inbound`](Self::available_inbound)
    /// first; an empty queue yields [`BridgeError::EmptyQueue`].
    pub fn read_inbound(&self) -> BridgeResult<u8> {
        self.inbound.pop().ok_or(BridgeError::EmptyQueue)
    }

    /// Pop the oldest outbound byte, or `None` if there is nothing queued.
    pub fn try_read_outbound(&self) -> Option<u8> {
        self.outbound.pop()
    }

    /// `io::Read` over the inbound queue.
    pub fn inbound_reader(&self) -> QueueReader<'_> {
        QueueReader(&self.inbound)
    }

    /// `io::Read` over the outbound queue.
    pub fn outbound_reader(&self) -> QueueReader<'_> {
        QueueReader(&self.outbound)
    }

    /// `io::Write` into the outbound queue.
    pub fn outbound_writer(&self) -> QueueWriter<'_> {
        QueueWriter(&self.outbound)
    }
}

/// Non-blocking reader draining a [`ByteQueue`].
///
/// An empty queue reports `WouldBlock` rather than end-of-stream.
#[derive(Debug)]
pub struct QueueReader<'a>(&'a ByteQueue);

impl io::Read for QueueReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self.0.pop_into(buf) {
            0 => Err(io::Error::new(io::ErrorKind::WouldBlock, "queue empty")),
            n => Ok(n),
        }
    }
}

/// Writer appending to a [`ByteQueue`]. Never short-writes.
#[derive(Debug)]
pub struct QueueWriter<'a>(&'a ByteQueue);

impl io::Write for QueueWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.extend(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
