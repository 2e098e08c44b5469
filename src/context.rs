//! Device context shared by the control handler and the scripting surface.
//!
//! The badge's USB personality mode is a single word written from the USB
//! device task (class request `0x23`) and from scripting (`setmode`), and
//! read from scripting (`mode`). It is not range-checked: any integer is
//! stored and echoed back as-is.

use core::sync::atomic::{AtomicI32, Ordering};

/// Process-wide device state, handed around by `&'static` reference.
pub struct DeviceContext {
    mode: AtomicI32,
}

impl DeviceContext {
    /// A fresh context in mode 0.
    pub const fn new() -> Self {
        Self {
            mode: AtomicI32::new(0),
        }
    }

    /// Current personality mode.
    pub fn mode(&self) -> i32 {
        self.mode.load(Ordering::Relaxed)
    }

    /// Store a new mode and return it.
    pub fn set_mode(&self, mode: i32) -> i32 {
        self.mode.store(mode, Ordering::Relaxed);
        #[cfg(feature = "defmt")]
        defmt::debug!("usb mode -> {}", mode);
        mode
    }

    /// Store the `wValue` of a host mode-switch request.
    pub fn apply_host_mode(&self, value: u16) -> i32 {
        self.set_mode(i32::from(value))
    }
}

impl Default for DeviceContext {
    fn default() -> Self {
        Self::new()
    }
}

/// What the firmware runs for a given mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootAction {
    /// Console only.
    Console,
    /// WebUSB file service on the public channel.
    FileService,
    /// The resident application.
    LaunchApp,
}

impl BootAction {
    pub fn from_mode(mode: i32) -> Self {
        match mode {
            1 => BootAction::FileService,
            2 => BootAction::LaunchApp,
            _ => BootAction::Console,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_in_mode_zero() {
        assert_eq!(DeviceContext::new().mode(), 0);
    }

    #[test]
    fn set_mode_echoes_without_clamping() {
        let ctx = DeviceContext::new();
        for v in [0, 1, 2, -1, 65_536, i32::MIN, i32::MAX] {
            assert_eq!(ctx.set_mode(v), v);
            assert_eq!(ctx.mode(), v);
        }
    }

    #[test]
    fn host_mode_is_zero_extended() {
        let ctx = DeviceContext::new();
        assert_eq!(ctx.apply_host_mode(0xFFFF), 65_535);
        assert_eq!(ctx.mode(), 65_535);
    }

    #[test]
    fn boot_action_mapping() {
        assert_eq!(BootAction::from_mode(0), BootAction::Console);
        assert_eq!(BootAction::from_mode(1), BootAction::FileService);
        assert_eq!(BootAction::from_mode(2), BootAction::LaunchApp);
        assert_eq!(BootAction::from_mode(-7), BootAction::Console);
        assert_eq!(BootAction::from_mode(3), BootAction::Console);
    }
}
