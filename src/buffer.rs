//! Size limited chunk buffer.

use crate::line::{self, Line};

/// In-memory chunk of lines limited by its serialized size.
///
/// The size of a chunk is the sum of its line lengths plus one newline separator per line.
/// It is tracked incrementally, so checking whether the buffer is full is a constant time operation.
pub struct ChunkBuffer {
    limit: u64,
    current_size: u64,
    lines: Vec<Line>,
}

impl ChunkBuffer {
    /// Creates an empty buffer.
    ///
    /// # Arguments
    /// * `limit` - Serialized size in bytes at which the buffer is considered full
    pub fn new(limit: u64) -> Self {
        ChunkBuffer {
            limit,
            current_size: 0,
            lines: Vec::new(),
        }
    }

    /// Adds a new line to the buffer.
    /// The line is always accepted even if it alone exceeds the limit.
    pub fn push(&mut self, line: Line) {
        self.current_size += line::serialized_size(&line);
        self.lines.push(line);
    }

    /// Returns the number of buffered lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns the serialized size of the buffered lines.
    pub fn mem_size(&self) -> u64 {
        self.current_size
    }

    /// Checks if the buffer reached the limit.
    pub fn is_full(&self) -> bool {
        self.current_size >= self.limit
    }

    /// Sorts buffered lines in ascending byte-wise order.
    pub fn sort(&mut self) {
        // equal lines are indistinguishable, so stability is not needed
        self.lines.sort_unstable();
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Removes all lines keeping the allocated capacity.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.current_size = 0;
    }
}
