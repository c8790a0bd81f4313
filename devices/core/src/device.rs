//! Device descriptors and the transport trait.

use crate::{Result, TransferBuffer};

/// Static information about a device type for detection and CLI
#[derive(Debug, Clone, Copy)]
pub struct DeviceInfo {
    pub name: &'static str,
    pub cli_name: &'static str,
    pub vendor_id: u16,
    pub product_id: u16,
    /// Size of the virtual surface covering every physical screen
    pub surface: (u32, u32),
}

/// Outbound link to the display hardware.
///
/// Calls are fire-and-forget from the driver's side: whatever buffering or
/// retrying a link needs happens inside the implementation.
pub trait DisplayTransport: Send + Sync {
    fn send_to_display(&self, buffer: &TransferBuffer) -> Result<()>;
}

impl<T: DisplayTransport + ?Sized> DisplayTransport for Box<T> {
    fn send_to_display(&self, buffer: &TransferBuffer) -> Result<()> {
        (**self).send_to_display(buffer)
    }
}

impl<T: DisplayTransport + ?Sized> DisplayTransport for std::sync::Arc<T> {
    fn send_to_display(&self, buffer: &TransferBuffer) -> Result<()> {
        (**self).send_to_display(buffer)
    }
}
