//! Block-addressed backing store for page images.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::trace;

use crate::error::{Result, VmError};
use crate::storage::page::{PageId, PAGE_SIZE};

/// Default file name of the simulated disk.
pub const DEFAULT_DISK_PATH: &str = "myvirtualdisk";

/// File-backed disk holding one `PAGE_SIZE` block per virtual page.
///
/// Block `n` holds the authoritative image of page `n`. The file is sized to
/// `block_count * PAGE_SIZE` bytes on open, so blocks that were never written
/// read back as zeroes.
pub struct Disk {
    /// Path to the disk file.
    path: PathBuf,
    /// File handle for the disk file.
    file: File,
    /// Number of blocks on the disk.
    block_count: usize,
}

impl Disk {
    /// Creates (or truncates) a disk file with `block_count` zeroed blocks.
    ///
    /// # Errors
    ///
    /// Returns an error if `block_count` is 0, the disk size overflows, or the
    /// file cannot be created.
    pub fn open(path: &Path, block_count: usize) -> Result<Self> {
        if block_count == 0 {
            return Err(VmError::ConfigError(
                "Disk must have at least one block".into(),
            ));
        }

        let len = block_count
            .checked_mul(PAGE_SIZE)
            .and_then(|bytes| u64::try_from(bytes).ok())
            .ok_or_else(|| {
                VmError::ConfigError(format!("{block_count} blocks overflow the disk size"))
            })?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| VmError::StorageError(format!("Failed to open disk file: {e}")))?;

        file.set_len(len)
            .map_err(|e| VmError::StorageError(format!("Failed to size disk file: {e}")))?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            block_count,
        })
    }

    /// Returns the path to the disk file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the number of blocks on the disk.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.block_count
    }

    /// Reads the image of `page` into `buf`.
    ///
    /// # Errors
    ///
    /// Returns an error if the block is out of range, `buf` is not exactly one
    /// page long, or the read fails.
    pub fn read_block(&mut self, page: PageId, buf: &mut [u8]) -> Result<()> {
        self.seek_to(page, buf.len())?;
        self.file
            .read_exact(buf)
            .map_err(|e| VmError::StorageError(format!("Failed to read {page}: {e}")))?;
        trace!("disk read {page}");
        Ok(())
    }

    /// Writes `buf` as the image of `page`.
    ///
    /// # Errors
    ///
    /// Returns an error if the block is out of range, `buf` is not exactly one
    /// page long, or the write fails.
    pub fn write_block(&mut self, page: PageId, buf: &[u8]) -> Result<()> {
        self.seek_to(page, buf.len())?;
        self.file
            .write_all(buf)
            .map_err(|e| VmError::StorageError(format!("Failed to write {page}: {e}")))?;
        trace!("disk write {page}");
        Ok(())
    }

    /// Flushes all buffered writes to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync fails.
    pub fn sync(&mut self) -> Result<()> {
        self.file
            .sync_all()
            .map_err(|e| VmError::StorageError(format!("Failed to sync disk: {e}")))
    }

    fn seek_to(&mut self, page: PageId, len: usize) -> Result<()> {
        if page.index() >= self.block_count {
            return Err(VmError::PageOutOfRange {
                page: page.index(),
                page_count: self.block_count,
            });
        }
        if len != PAGE_SIZE {
            return Err(VmError::StorageError(format!(
                "Block buffer is {len} bytes, expected {PAGE_SIZE}"
            )));
        }

        self.file
            .seek(SeekFrom::Start(page.offset()))
            .map_err(|e| VmError::StorageError(format!("Failed to seek to {page}: {e}")))?;
        Ok(())
    }
}

impl std::fmt::Debug for Disk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Disk")
            .field("path", &self.path)
            .field("block_count", &self.block_count)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_disk(blocks: usize) -> (Disk, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("disk.img");
        let disk = Disk::open(&path, blocks).unwrap();
        (disk, temp_dir)
    }

    #[test]
    fn test_open_sizes_file() {
        let (disk, _temp) = create_test_disk(4);
        assert_eq!(disk.block_count(), 4);
        let len = std::fs::metadata(disk.path()).unwrap().len();
        assert_eq!(len, 4 * PAGE_SIZE as u64);
    }

    #[test]
    fn test_zero_blocks_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let result = Disk::open(&temp_dir.path().join("disk.img"), 0);
        assert!(matches!(result, Err(VmError::ConfigError(_))));
    }

    #[test]
    fn test_oversized_disk_rejected_before_creation() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("disk.img");
        let result = Disk::open(&path, usize::MAX);
        assert!(matches!(result, Err(VmError::ConfigError(_))));
        assert!(!path.exists());
    }

    #[test]
    fn test_read_write_block() {
        let (mut disk, _temp) = create_test_disk(4);

        let mut block = vec![0u8; PAGE_SIZE];
        block[0] = 42;
        block[PAGE_SIZE - 1] = 0xFF;
        disk.write_block(PageId::new(2), &block).unwrap();

        let mut read = vec![0u8; PAGE_SIZE];
        disk.read_block(PageId::new(2), &mut read).unwrap();
        assert_eq!(read, block);

        // Neighbouring blocks are untouched
        disk.read_block(PageId::new(1), &mut read).unwrap();
        assert!(read.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_unwritten_block_reads_zero() {
        let (mut disk, _temp) = create_test_disk(2);
        let mut read = vec![0xAAu8; PAGE_SIZE];
        disk.read_block(PageId::new(1), &mut read).unwrap();
        assert!(read.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_out_of_range_block() {
        let (mut disk, _temp) = create_test_disk(2);
        let mut buf = vec![0u8; PAGE_SIZE];
        let err = disk.read_block(PageId::new(2), &mut buf).unwrap_err();
        assert!(matches!(
            err,
            VmError::PageOutOfRange {
                page: 2,
                page_count: 2
            }
        ));
        assert!(disk.write_block(PageId::new(9), &buf).is_err());
    }

    #[test]
    fn test_wrong_buffer_size() {
        let (mut disk, _temp) = create_test_disk(2);
        let mut short = vec![0u8; PAGE_SIZE / 2];
        assert!(matches!(
            disk.read_block(PageId::new(0), &mut short),
            Err(VmError::StorageError(_))
        ));
    }

    #[test]
    fn test_reopen_truncates() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("disk.img");

        {
            let mut disk = Disk::open(&path, 2).unwrap();
            disk.write_block(PageId::new(0), &vec![7u8; PAGE_SIZE]).unwrap();
            disk.sync().unwrap();
        }

        let mut disk = Disk::open(&path, 2).unwrap();
        let mut read = vec![0u8; PAGE_SIZE];
        disk.read_block(PageId::new(0), &mut read).unwrap();
        assert!(read.iter().all(|&b| b == 0));
    }
}
