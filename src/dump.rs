//! Transport that writes transfer buffers to a file instead of a device

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use kontrol_display_core::{DisplayTransport, Result, TransferBuffer};

/// Appends every buffer it is handed to a file, back to back
pub struct DumpTransport {
    file: Mutex<File>,
    written: AtomicUsize,
}

impl DumpTransport {
    pub fn create(path: &Path) -> Result<Self> {
        Ok(Self {
            file: Mutex::new(File::create(path)?),
            written: AtomicUsize::new(0),
        })
    }

    /// Total bytes written so far
    pub fn bytes_written(&self) -> usize {
        self.written.load(Ordering::Relaxed)
    }
}

impl DisplayTransport for DumpTransport {
    fn send_to_display(&self, buffer: &TransferBuffer) -> Result<()> {
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        file.write_all(buffer.as_bytes())?;
        file.flush()?;
        self.written.fetch_add(buffer.len(), Ordering::Relaxed);
        Ok(())
    }
}
