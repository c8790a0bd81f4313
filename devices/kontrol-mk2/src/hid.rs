//! hidapi transport for the display endpoint

use std::sync::{Mutex, PoisonError};

use hidapi::{HidApi, HidDevice};
use kontrol_display_core::{DeviceInfo, DisplayError, DisplayTransport, Result, TransferBuffer};
use tracing::debug;

/// Writes transfer buffers to an opened hid device
pub struct HidTransport {
    device: Mutex<HidDevice>,
}

impl HidTransport {
    /// Open the first device matching the vendor and product id
    pub fn open(info: &DeviceInfo) -> Result<Self> {
        let api = HidApi::new()?;
        let device = api.open(info.vendor_id, info.product_id)?;
        debug!(device = info.name, "opened display transport");
        Ok(Self::from_device(device))
    }

    pub fn from_device(device: HidDevice) -> Self {
        Self {
            device: Mutex::new(device),
        }
    }
}

/// Partial writes leave a truncated frame on the device
fn check_written(written: usize, expected: usize) -> Result<()> {
    if written < expected {
        return Err(DisplayError::ShortWrite { written, expected });
    }
    Ok(())
}

impl DisplayTransport for HidTransport {
    fn send_to_display(&self, buffer: &TransferBuffer) -> Result<()> {
        let device = self.device.lock().unwrap_or_else(PoisonError::into_inner);
        let written = device.write(buffer.as_bytes())?;
        check_written(written, buffer.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_write_passes() {
        assert!(check_written(460_804, 460_804).is_ok());
    }

    #[test]
    fn short_write_is_an_error() {
        assert!(matches!(
            check_written(65_536, 460_804),
            Err(DisplayError::ShortWrite {
                written: 65_536,
                expected: 460_804
            })
        ));
        assert!(check_written(0, 1).is_err());
    }
}
