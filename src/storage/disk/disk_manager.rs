use crate::common::{Error, Result};
use crate::config::config::PAGE_DB_PAGE_SIZE_BYTES;
use crate::storage::page::SlottedPage;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};

/// Offset into a heap file, in page-size units. Dense `0..page_count`.
pub type PageId = u32;

/// Page-granular I/O over one heap file. Pages are read on demand and
/// written through; durability rests on `write_page` + `sync` ordering at
/// statement boundaries (there is no redo log).
#[derive(Debug)]
pub struct DiskManager {
    page_count: AtomicU32,
    writer: BufWriter<File>,
    reader: BufReader<File>,
}

impl DiskManager {
    /// Opens (or creates) the heap file at `path`. An existing file must be
    /// an integer multiple of the page size.
    pub fn open(path: &Path) -> Result<DiskManager> {
        let file = OpenOptions::new()
            .write(true)
            .read(true)
            .create(true)
            .open(path)?;
        let len = file.metadata()?.len();
        if len % PAGE_DB_PAGE_SIZE_BYTES as u64 != 0 {
            return Err(Error::IO(format!(
                "Heap file {} is not page-aligned ({len} bytes)",
                path.display()
            )));
        }
        let reader = file;
        let writer = reader.try_clone()?;

        Ok(DiskManager {
            page_count: AtomicU32::new((len / PAGE_DB_PAGE_SIZE_BYTES as u64) as u32),
            writer: BufWriter::new(writer),
            reader: BufReader::new(reader),
        })
    }

    pub fn page_count(&self) -> u32 {
        self.page_count.load(Ordering::SeqCst)
    }

    /// Extends the file by one freshly initialized page and returns its id.
    pub fn allocate_page(&mut self) -> Result<PageId> {
        let page_id = self.page_count.fetch_add(1, Ordering::SeqCst);
        self.write_page(&SlottedPage::new(page_id))?;
        Ok(page_id)
    }

    pub fn read_page(&mut self, page_id: PageId) -> Result<SlottedPage> {
        let offset = Self::calculate_offset(page_id);
        self.reader.seek(SeekFrom::Start(offset))?;

        let mut buffer = vec![0; PAGE_DB_PAGE_SIZE_BYTES];
        self.reader.read_exact(&mut buffer[..])?;
        SlottedPage::deserialize(&buffer)
    }

    pub fn write_page(&mut self, page: &SlottedPage) -> Result<()> {
        let offset = Self::calculate_offset(page.page_id());
        self.writer.seek(SeekFrom::Start(offset))?;
        self.writer.write_all(&page.serialize())?;
        self.writer.flush()?;
        Ok(())
    }

    /// Flushes the file to stable storage.
    pub fn sync(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        Ok(())
    }

    fn calculate_offset(page_id: PageId) -> u64 {
        page_id as u64 * PAGE_DB_PAGE_SIZE_BYTES as u64
    }
}
