use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use seal_types::Block;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::codec::{encode_block, BlockReader};
use crate::error::{LedgerError, WriteError};
use crate::traits::LedgerWriter;

/// Flush/sync strategy for the ledger file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncMode {
    /// `sync_data` after every record (safest, highest latency).
    EveryWrite,
    /// Flush to the OS after every record and rely on page-cache writeback.
    #[default]
    OsDefault,
}

/// Append-only ledger backed by a single file.
///
/// The file is opened with `O_APPEND`, so every record lands after all
/// existing bytes; nothing already written is ever truncated or rewritten.
/// Each block is encoded up front and written with a single `write_all`.
pub struct FileLedger {
    path: PathBuf,
    file: File,
    sync_mode: SyncMode,
    /// Bytes in the file after the last successful append.
    offset: u64,
}

impl FileLedger {
    /// Open (or create) the ledger at `path` for appending.
    pub fn open(path: &Path, sync_mode: SyncMode) -> Result<Self, WriteError> {
        let open_err = |source| WriteError::Open {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(open_err)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(open_err)?;
        let offset = file.metadata().map_err(open_err)?.len();

        info!(path = %path.display(), offset, "ledger opened");
        Ok(Self {
            path: path.to_path_buf(),
            file,
            sync_mode,
            offset,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current end-of-file offset.
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

impl LedgerWriter for FileLedger {
    fn append(&mut self, block: &Block) -> Result<(), WriteError> {
        let record = encode_block(block)?;
        let write_err = |source| WriteError::Write {
            path: self.path.clone(),
            source,
        };

        self.file.write_all(&record).map_err(write_err)?;
        self.file.flush().map_err(write_err)?;

        if self.sync_mode == SyncMode::EveryWrite {
            self.file.sync_data().map_err(|source| WriteError::Sync {
                path: self.path.clone(),
                source,
            })?;
        }

        let record_offset = self.offset;
        self.offset += record.len() as u64;
        debug!(
            block = block.index(),
            offset = record_offset,
            len = record.len(),
            "ledger append"
        );
        Ok(())
    }

    fn read_all(&self, block_size: usize) -> Result<Vec<Block>, LedgerError> {
        read_blocks(&self.path, block_size)
    }
}

/// Read every record in the ledger at `path`.
///
/// A missing file is an empty ledger.
pub fn read_blocks(path: &Path, block_size: usize) -> Result<Vec<Block>, LedgerError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    BlockReader::new(BufReader::new(file), block_size).collect()
}
