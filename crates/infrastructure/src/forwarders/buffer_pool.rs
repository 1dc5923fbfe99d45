use std::sync::Mutex;

/// Bounded free-list of fixed-size buffers, shared across every connection a
/// forwarder handles. A small `Mutex<Vec<_>>` rather than a lock-free queue
/// — contention is negligible compared to the socket I/O each buffer is
/// used for.
pub struct BufferPool {
    buffer_size: usize,
    free: Mutex<Vec<Box<[u8]>>>,
    max_pooled: usize,
}

impl BufferPool {
    pub fn new(buffer_size: usize, max_pooled: usize) -> Self {
        Self {
            buffer_size,
            free: Mutex::new(Vec::with_capacity(max_pooled)),
            max_pooled,
        }
    }

    pub fn acquire(&self) -> Box<[u8]> {
        if let Some(buf) = self.free.lock().unwrap().pop() {
            buf
        } else {
            vec![0u8; self.buffer_size].into_boxed_slice()
        }
    }

    pub fn release(&self, buf: Box<[u8]>) {
        let mut free = self.free.lock().unwrap();
        if free.len() < self.max_pooled {
            free.push(buf);
        }
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }
}
