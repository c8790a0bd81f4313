//! Device detection and selection logic.

use std::str::FromStr;

use bpaf::Bpaf;
use hidapi::HidApi;
use kontrol_display_core::{DeviceInfo, DisplayError};
use kontrol_mk2::{HidTransport, DEVICES, S49_INFO, S61_INFO, S88_INFO};

/// Supported keyboards
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Bpaf)]
#[bpaf(fallback(DeviceKind::Auto), group_help("Device selection:"))]
pub enum DeviceKind {
    /// Auto-detect connected keyboard (default)
    #[default]
    Auto,
    /// Komplete Kontrol S49 mk2
    S49,
    /// Komplete Kontrol S61 mk2
    S61,
    /// Komplete Kontrol S88 mk2
    S88,
}

impl FromStr for DeviceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "s49" => Ok(Self::S49),
            "s61" => Ok(Self::S61),
            "s88" => Ok(Self::S88),
            _ => Err(format!("unknown device: {s}. Available: auto, s49, s61, s88")),
        }
    }
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::S49 => write!(f, "s49"),
            Self::S61 => write!(f, "s61"),
            Self::S88 => write!(f, "s88"),
        }
    }
}

/// Check if a HID device matches the device info
fn matches(device: &hidapi::DeviceInfo, info: &DeviceInfo) -> bool {
    device.vendor_id() == info.vendor_id && device.product_id() == info.product_id
}

impl DeviceKind {
    /// Static info for a specific model, `None` for auto-detection
    pub fn info(&self) -> Option<&'static DeviceInfo> {
        match self {
            DeviceKind::Auto => None,
            DeviceKind::S49 => Some(&S49_INFO),
            DeviceKind::S61 => Some(&S61_INFO),
            DeviceKind::S88 => Some(&S88_INFO),
        }
    }

    /// Open the display transport of the selected keyboard, or the first one found
    pub fn open(&self) -> Result<(HidTransport, &'static DeviceInfo), DisplayError> {
        if let Some(info) = self.info() {
            return Ok((HidTransport::open(info)?, info));
        }
        // Single HID iteration, check each model's info
        let api = HidApi::new()?;
        for device in api.device_list() {
            if let Some(info) = DEVICES.iter().copied().find(|info| matches(device, info)) {
                return Ok((HidTransport::from_device(device.open_device(&api)?), info));
            }
        }
        Err(DisplayError::TransportUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for kind in [DeviceKind::Auto, DeviceKind::S49, DeviceKind::S61, DeviceKind::S88] {
            assert_eq!(kind.to_string().parse::<DeviceKind>().unwrap(), kind);
        }
        assert!("s25".parse::<DeviceKind>().is_err());
    }

    #[test]
    fn models_carry_their_info() {
        assert!(DeviceKind::Auto.info().is_none());
        assert_eq!(DeviceKind::S61.info().unwrap().cli_name, "s61");
        assert_eq!(DeviceKind::S88.info().unwrap().surface, (960, 360));
    }
}
