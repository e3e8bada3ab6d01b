// src/acquisition/ring_buffer.rs
//! Fixed-capacity sample history with overwrite-oldest semantics

use ndarray::ArrayView2;
use thiserror::Error;
use tracing::warn;

/// Ring buffer error types
#[derive(Debug, Error, PartialEq)]
pub enum RingBufferError {
    /// Capacity of zero
    #[error("Invalid buffer capacity (must be positive)")]
    InvalidCapacity,
}

/// Single-owner ring buffer. Appending to a full buffer overwrites the
/// oldest element.
#[derive(Debug, Clone)]
pub struct ChannelRingBuffer<T = f64> {
    buffer: Vec<T>,
    capacity: usize,
    /// Index of the next write
    head: usize,
    len: usize,
}

impl<T: Copy + Default> ChannelRingBuffer<T> {
    /// Empty buffer holding at most `capacity` elements
    pub fn new(capacity: usize) -> Result<Self, RingBufferError> {
        if capacity == 0 {
            return Err(RingBufferError::InvalidCapacity);
        }

        Ok(Self {
            buffer: vec![T::default(); capacity],
            capacity,
            head: 0,
            len: 0,
        })
    }

    /// Push one sample, evicting the oldest when full
    pub fn push(&mut self, item: T) {
        self.buffer[self.head] = item;
        self.head = (self.head + 1) % self.capacity;
        if self.len < self.capacity {
            self.len += 1;
        }
    }

    /// Append samples in order
    pub fn append(&mut self, items: &[T]) {
        // Only the tail of an oversized slice can survive
        let skip = items.len().saturating_sub(self.capacity);
        for &item in &items[skip..] {
            self.push(item);
        }
    }

    /// Copy of the `count` most recent samples, oldest first.
    /// `None` when fewer than `count` are buffered.
    pub fn latest(&self, count: usize) -> Option<Vec<T>> {
        if count > self.len {
            return None;
        }
        let start = (self.head + self.capacity - count) % self.capacity;
        Some((0..count).map(|i| self.buffer[(start + i) % self.capacity]).collect())
    }

    /// Copy of every buffered sample, oldest first
    pub fn to_vec(&self) -> Vec<T> {
        self.latest(self.len).unwrap_or_default()
    }

    /// Most recent sample
    pub fn last(&self) -> Option<T> {
        if self.len == 0 {
            None
        } else {
            Some(self.buffer[(self.head + self.capacity - 1) % self.capacity])
        }
    }

    /// Drop every element, keeping the capacity
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    /// Elements currently held
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when nothing has been appended since the last clear
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True once the next append overwrites
    pub fn is_full(&self) -> bool {
        self.len == self.capacity
    }

    /// Maximum number of elements held
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current buffer utilization (0.0 to 1.0)
    pub fn utilization(&self) -> f32 {
        self.len as f32 / self.capacity as f32
    }
}

/// One `ChannelRingBuffer` per analysed channel
#[derive(Debug, Clone)]
pub struct MultiChannelBuffer {
    channels: Vec<ChannelRingBuffer<f64>>,
}

impl MultiChannelBuffer {
    /// `channel_count` buffers of `capacity` samples each
    pub fn new(channel_count: usize, capacity: usize) -> Result<Self, RingBufferError> {
        let channels = (0..channel_count)
            .map(|_| ChannelRingBuffer::new(capacity))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { channels })
    }

    /// Append a `[samples, channels]` block.
    ///
    /// Extra columns are ignored; channels missing from the block receive
    /// nothing. Empty blocks are a no-op.
    pub fn append_block(&mut self, block: ArrayView2<'_, f64>) {
        let (rows, cols) = block.dim();
        if rows == 0 || cols == 0 {
            return;
        }
        if cols < self.channels.len() {
            warn!(
                "Block carries {} channels, expected {}; missing channels stay unchanged",
                cols,
                self.channels.len()
            );
        }

        for (buffer, column) in self.channels.iter_mut().zip(block.columns()) {
            for &sample in column.iter() {
                buffer.push(sample);
            }
        }
    }

    /// Buffer of channel `index`
    pub fn channel(&self, index: usize) -> Option<&ChannelRingBuffer<f64>> {
        self.channels.get(index)
    }

    /// All channel buffers in channel order
    pub fn channels(&self) -> &[ChannelRingBuffer<f64>] {
        &self.channels
    }

    /// Number of channels
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Clear every channel
    pub fn clear(&mut self) {
        self.channels.iter_mut().for_each(ChannelRingBuffer::clear);
    }
}
