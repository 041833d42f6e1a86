use crate::error::TransportError;
use parking_lot::Mutex;

/// A serial byte-stream endpoint with a bounded, non-blocking write buffer.
pub trait Transport: Send + Sync {
    /// Queues `bytes` for transmission.
    ///
    /// Either every byte is accepted or none is. Never blocks: when the bytes
    /// do not fit in the free buffer space the call fails with
    /// [`TransportError::BufferFull`].
    fn try_write(&self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Asks the transport to push buffered bytes out. Best-effort; may return
    /// before the bytes have left the device.
    fn flush(&self);
}

#[derive(Debug, Default)]
struct MemoryState {
    pending: Vec<u8>,
    wire: Vec<u8>,
    flushes: usize,
    disconnected: bool,
}

/// In-memory transport with a fixed buffer capacity.
///
/// Accepted bytes sit in the pending buffer until [`Transport::flush`] moves
/// them to the wire, which frees the capacity again.
#[derive(Debug)]
pub struct MemoryTransport {
    capacity: usize,
    state: Mutex<MemoryState>,
}

impl MemoryTransport {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(MemoryState::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes waiting in the buffer.
    pub fn pending(&self) -> Vec<u8> {
        self.state.lock().pending.clone()
    }

    /// Everything accepted so far, flushed bytes first.
    pub fn outbound(&self) -> Vec<u8> {
        let state = self.state.lock();
        let mut out = state.wire.clone();
        out.extend_from_slice(&state.pending);
        out
    }

    /// Number of flushes that actually moved bytes.
    pub fn flush_count(&self) -> usize {
        self.state.lock().flushes
    }

    pub fn set_disconnected(&self, disconnected: bool) {
        self.state.lock().disconnected = disconnected;
    }
}

impl Transport for MemoryTransport {
    fn try_write(&self, bytes: &[u8]) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        if state.disconnected {
            return Err(TransportError::Disconnected);
        }
        if state.pending.len() + bytes.len() > self.capacity {
            return Err(TransportError::BufferFull);
        }
        state.pending.extend_from_slice(bytes);
        Ok(())
    }

    fn flush(&self) {
        let mut state = self.state.lock();
        if state.disconnected || state.pending.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut state.pending);
        state.wire.extend_from_slice(&pending);
        state.flushes += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_writes_past_capacity() {
        let transport = MemoryTransport::new(8);
        assert_eq!(transport.try_write(b"12345"), Ok(()));
        assert_eq!(transport.try_write(b"6789"), Err(TransportError::BufferFull));
        assert_eq!(transport.try_write(b"678"), Ok(()));
        assert_eq!(transport.pending(), b"12345678");
    }

    #[test]
    fn flush_frees_capacity() {
        let transport = MemoryTransport::new(4);
        transport.try_write(b"abcd").unwrap();
        transport.flush();
        assert!(transport.pending().is_empty());
        transport.try_write(b"ef").unwrap();
        assert_eq!(transport.outbound(), b"abcdef");
        assert_eq!(transport.flush_count(), 1);
    }

    #[test]
    fn empty_flush_is_noop() {
        let transport = MemoryTransport::new(4);
        transport.flush();
        assert_eq!(transport.flush_count(), 0);
        assert!(transport.outbound().is_empty());
    }

    #[test]
    fn disconnected_refuses_writes() {
        let transport = MemoryTransport::new(4);
        transport.set_disconnected(true);
        assert_eq!(transport.try_write(b"a"), Err(TransportError::Disconnected));
        transport.set_disconnected(false);
        assert_eq!(transport.try_write(b"a"), Ok(()));
    }
}
