//! Packet encoder and driver for the color displays of Komplete Kontrol mk2 keyboards.
//!
//! The keyboards carry two 480x360 screens that the host treats as one 960x360
//! surface. [`DisplayDriver::send`] cuts a rendered bitmap into one frame per
//! screen, encodes each into its own transfer buffer and hands them to the
//! transport, left screen first.
//!
//! At most one transfer is in flight per driver. A `send` that arrives while
//! another is running returns immediately and the frame is dropped; for a live
//! display the next frame replaces it anyway.

use std::sync::{Mutex, PoisonError};

use kontrol_display_core::{
    Bitmap, BufferAllocator, DeviceInfo, DisplayTransport, HeapAllocator, Result, TransferBuffer,
};
use tracing::{debug, trace, warn};

use crate::frame::encode_region;
use crate::guard::SendFlag;

pub mod abi;
pub mod blocks;
pub mod color;
pub mod frame;
pub mod guard;
pub mod hid;
pub mod sizing;
pub mod surface;

pub use color::PackedColor;
pub use hid::HidTransport;
pub use surface::{DisplayLayout, Encoding, Region, Target};

pub mod consts {
    pub const NI_VENDOR_ID: u16 = 0x17CC;
    pub const S49_MK2_PRODUCT_ID: u16 = 0x1610;
    pub const S61_MK2_PRODUCT_ID: u16 = 0x1620;
    pub const S88_MK2_PRODUCT_ID: u16 = 0x1630;

    /// Size of one physical screen
    pub const SCREEN_WIDTH: u32 = 480;
    pub const SCREEN_HEIGHT: u32 = 360;
}

/// Static device info for detection
pub static S49_INFO: DeviceInfo = DeviceInfo {
    name: "Komplete Kontrol S49 mk2",
    cli_name: "s49",
    vendor_id: consts::NI_VENDOR_ID,
    product_id: consts::S49_MK2_PRODUCT_ID,
    surface: (2 * consts::SCREEN_WIDTH, consts::SCREEN_HEIGHT),
};

pub static S61_INFO: DeviceInfo = DeviceInfo {
    name: "Komplete Kontrol S61 mk2",
    cli_name: "s61",
    vendor_id: consts::NI_VENDOR_ID,
    product_id: consts::S61_MK2_PRODUCT_ID,
    surface: (2 * consts::SCREEN_WIDTH, consts::SCREEN_HEIGHT),
};

pub static S88_INFO: DeviceInfo = DeviceInfo {
    name: "Komplete Kontrol S88 mk2",
    cli_name: "s88",
    vendor_id: consts::NI_VENDOR_ID,
    product_id: consts::S88_MK2_PRODUCT_ID,
    surface: (2 * consts::SCREEN_WIDTH, consts::SCREEN_HEIGHT),
};

/// All supported models
pub static DEVICES: &[&DeviceInfo] = &[&S49_INFO, &S61_INFO, &S88_INFO];

/// What happened to a frame handed to [`DisplayDriver::send`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    /// Frame was encoded and written with this many transport calls
    Sent { writes: usize },
    /// Another transfer was in flight, frame dropped
    Dropped,
    /// No transport attached, frame dropped
    NoTransport,
    /// Encoding or the transport failed, frame dropped and the error logged
    Failed,
}

/// Owns the transfer buffers for both screens and serializes access to the transport
pub struct DisplayDriver {
    layout: DisplayLayout,
    transport: Option<Box<dyn DisplayTransport>>,
    sending: SendFlag,
    // only locked while `sending` is held, so never contended
    buffers: Mutex<[TransferBuffer; 2]>,
}

impl DisplayDriver {
    /// Driver for the default 960x360 split surface
    pub fn kontrol_mk2(transport: impl DisplayTransport + 'static) -> Self {
        Self::new(DisplayLayout::kontrol_mk2(), transport)
    }

    pub fn new(layout: DisplayLayout, transport: impl DisplayTransport + 'static) -> Self {
        let transport: Box<dyn DisplayTransport> = Box::new(transport);
        Self::with_allocator(layout, Some(transport), &HeapAllocator)
    }

    /// Driver without a transport. Every `send` is a no-op.
    pub fn detached(layout: DisplayLayout) -> Self {
        Self::with_allocator(layout, None, &HeapAllocator)
    }

    pub fn with_allocator(
        layout: DisplayLayout,
        transport: Option<Box<dyn DisplayTransport>>,
        allocator: &dyn BufferAllocator,
    ) -> Self {
        let capacity = layout.buffer_capacity();
        debug!(capacity, "allocating transfer buffers");
        Self {
            layout,
            transport,
            sending: SendFlag::new(),
            buffers: Mutex::new([allocator.allocate(capacity), allocator.allocate(capacity)]),
        }
    }

    #[inline(always)]
    pub fn layout(&self) -> &DisplayLayout {
        &self.layout
    }

    #[inline(always)]
    pub fn has_transport(&self) -> bool {
        self.transport.is_some()
    }

    /// Whether a transfer is currently in flight
    #[inline(always)]
    pub fn is_sending(&self) -> bool {
        self.sending.is_set()
    }

    /// Run `f` with the transfer buffers as left by the last send
    pub fn inspect_buffers<R>(&self, f: impl FnOnce(&[TransferBuffer; 2]) -> R) -> R {
        let buffers = self.buffers.lock().unwrap_or_else(PoisonError::into_inner);
        f(&buffers)
    }

    /// Encode and transmit one frame, or drop it.
    ///
    /// Never blocks on another send and never returns an error: failures are
    /// logged and reported as [`SendOutcome::Failed`].
    pub fn send(&self, bitmap: &dyn Bitmap) -> SendOutcome {
        let Some(transport) = self.transport.as_deref() else {
            trace!("no transport attached, dropping frame");
            return SendOutcome::NoTransport;
        };
        let Some(_guard) = self.sending.try_acquire() else {
            trace!("transfer in flight, dropping frame");
            return SendOutcome::Dropped;
        };

        match self.transfer(transport, bitmap) {
            Ok(writes) => SendOutcome::Sent { writes },
            Err(e) => {
                warn!("failed to send frame: {e}");
                SendOutcome::Failed
            },
        }
    }

    /// Fill one buffer per screen, then write them out in order
    fn transfer(&self, transport: &dyn DisplayTransport, bitmap: &dyn Bitmap) -> Result<usize> {
        self.layout.check_bitmap(bitmap)?;
        let (width, height) = self.layout.target_size();
        let mut buffers = self.buffers.lock().unwrap_or_else(PoisonError::into_inner);

        let mut count = 0;
        for (target, buf) in self.layout.targets().zip(buffers.iter_mut()) {
            buf.clear();
            let region = Region::new(bitmap, target.offset, 0, width, height)?;
            let len = match self.layout.encoding() {
                Encoding::Opcode => encode_region(target.display, &region)?.write_to(buf)?,
                Encoding::Blocks => blocks::write_blocks(&region, buf)?,
            };
            debug!(display = target.display, len, "encoded frame");
            count += 1;
        }

        for buf in &buffers[..count] {
            transport.send_to_display(buf)?;
        }
        Ok(count)
    }
}
