//! Core traits and types for Kontrol display drivers.
//!
//! This crate provides:
//! - The collaborator traits a driver consumes (`Bitmap`, `BufferAllocator`, `DisplayTransport`)
//! - The bound-checked `TransferBuffer` that staged payloads are written into
//! - Common types like `DeviceInfo`, `RawBitmap` and the shared `DisplayError`

mod bitmap;
mod buffer;
mod device;
mod error;

pub use bitmap::{Bitmap, RawBitmap};
pub use buffer::{BufferAllocator, HeapAllocator, TransferBuffer};
pub use device::{DeviceInfo, DisplayTransport};
pub use error::{DisplayError, Result};
