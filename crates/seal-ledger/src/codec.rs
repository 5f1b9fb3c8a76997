//! Line-oriented record layout of the durable log.
//!
//! ```text
//! <block hash, lowercase hex>
//! <prev hash, lowercase hex>
//! <merkle root, lowercase hex>
//! <timestamp, decimal seconds>
//! <entry 0 raw bytes>
//! ...
//! <entry N-1 raw bytes>
//! <empty line>
//! ```
//!
//! Records carry no length or index; readers need the block size to know
//! how many entry lines follow the header, which also keeps empty entries
//! distinguishable from the terminator.

use std::io::BufRead;

use seal_types::{Block, Digest, Entry};

use crate::error::{LedgerError, WriteError};

/// Serialize a block into one contiguous record.
pub fn encode_block(block: &Block) -> Result<Vec<u8>, WriteError> {
    let entry_bytes: usize = block.entries().iter().map(|e| e.len() + 1).sum();
    let mut out = Vec::with_capacity(3 * 65 + 21 + entry_bytes + 1);

    for digest in [block.block_hash(), block.prev_hash(), block.merkle_root()] {
        out.extend_from_slice(digest.to_hex().as_bytes());
        out.push(b'\n');
    }
    out.extend_from_slice(block.timestamp().to_string().as_bytes());
    out.push(b'\n');

    for (position, entry) in block.entries().iter().enumerate() {
        if entry.has_line_break() {
            return Err(WriteError::Unrepresentable {
                index: block.index(),
                position,
            });
        }
        out.extend_from_slice(entry.as_bytes());
        out.push(b'\n');
    }
    out.push(b'\n');
    Ok(out)
}

enum Line {
    Complete(Vec<u8>),
    Partial,
    Eof,
}

/// Sequential reader over ledger records.
///
/// Yields blocks in file order, numbering them from `0`. Iteration stops
/// after the first error.
pub struct BlockReader<R> {
    reader: R,
    block_size: usize,
    next_index: u64,
    line: u64,
    done: bool,
}

impl<R: BufRead> BlockReader<R> {
    pub fn new(reader: R, block_size: usize) -> Self {
        Self {
            reader,
            block_size,
            next_index: 0,
            line: 0,
            done: false,
        }
    }

    /// Read the next record, or `Ok(None)` at a clean end of file.
    pub fn read_block(&mut self) -> Result<Option<Block>, LedgerError> {
        let index = self.next_index;

        let block_hash = match self.next_line()? {
            Line::Eof => return Ok(None),
            Line::Partial => return Err(self.truncated(index)),
            Line::Complete(bytes) => self.parse_digest(index, &bytes)?,
        };
        let prev_hash = self.expect_line(index).and_then(|b| self.parse_digest(index, &b))?;
        let merkle_root = self.expect_line(index).and_then(|b| self.parse_digest(index, &b))?;
        let timestamp = self
            .expect_line(index)
            .and_then(|b| self.parse_timestamp(index, &b))?;

        let mut entries = Vec::with_capacity(self.block_size);
        for _ in 0..self.block_size {
            entries.push(Entry::from(self.expect_line(index)?));
        }

        let terminator = self.expect_line(index)?;
        if !terminator.is_empty() {
            return Err(self.malformed(index, "expected blank line after entries"));
        }

        self.next_index += 1;
        Ok(Some(Block::new(
            index,
            block_hash,
            prev_hash,
            merkle_root,
            timestamp,
            entries,
        )))
    }

    fn next_line(&mut self) -> Result<Line, LedgerError> {
        let mut buf = Vec::new();
        let n = self.reader.read_until(b'\n', &mut buf)?;
        if n == 0 {
            return Ok(Line::Eof);
        }
        if buf.last() != Some(&b'\n') {
            return Ok(Line::Partial);
        }
        buf.pop();
        self.line += 1;
        Ok(Line::Complete(buf))
    }

    fn expect_line(&mut self, index: u64) -> Result<Vec<u8>, LedgerError> {
        match self.next_line()? {
            Line::Complete(bytes) => Ok(bytes),
            Line::Partial | Line::Eof => Err(self.truncated(index)),
        }
    }

    fn parse_digest(&self, index: u64, bytes: &[u8]) -> Result<Digest, LedgerError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|_| self.malformed(index, "digest is not valid UTF-8"))?;
        Digest::from_hex(text).map_err(|e| self.malformed(index, &e.to_string()))
    }

    fn parse_timestamp(&self, index: u64, bytes: &[u8]) -> Result<i64, LedgerError> {
        std::str::from_utf8(bytes)
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .ok_or_else(|| self.malformed(index, "timestamp is not a decimal integer"))
    }

    fn malformed(&self, index: u64, reason: &str) -> LedgerError {
        LedgerError::Malformed {
            index,
            line: self.line,
            reason: reason.to_string(),
        }
    }

    fn truncated(&self, index: u64) -> LedgerError {
        LedgerError::Truncated {
            index,
            line: self.line + 1,
        }
    }
}

impl<R: BufRead> Iterator for BlockReader<R> {
    type Item = Result<Block, LedgerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_block() {
            Ok(Some(block)) => Some(Ok(block)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
