//! Host-testable core of the badge USB personality.
//!
//! Everything here is pure logic: descriptor tables, control-request
//! handling, the vendor channel relay, HID report building, the scripting
//! bindings with their line console, and the WebUSB file service. The
//! embedded binary (`main.rs`, `embedded` feature) wires these onto the
//! nRF52840 USB peripheral.
//!
//! Usage: `cargo test --lib` or `cargo test`

#![cfg_attr(not(test), no_std)]

pub mod bindings;
pub mod config;
pub mod console;
pub mod context;
pub mod control;
pub mod descriptor;
pub mod error;
pub mod fs_service;
pub mod hid;
pub mod relay;

pub use context::{BootAction, DeviceContext};
pub use error::Error;

// ═══════════════════════════════════════════════════════════════════════════
// Cross-module Tests
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{ControlHandler, HostSignals, Request, Response, Stage};
    use crate::descriptor::{bos, layout, msos};

    struct NoSignals;

    impl HostSignals for NoSignals {
        fn keyboard_interrupt(&self) {}
    }

    // ════════════════════════════════════════════════════════════════════════
    // Descriptor consistency
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn msos_set_binds_first_vendor_interface() {
        assert_eq!(msos::DESCRIPTOR_SET[22], layout::ITF_NUM_VENDOR[0]);
    }

    #[test]
    fn bos_advertises_msos_set_length() {
        let cap = bos::CAPABILITIES[1];
        let (_, data) = bos::capability_parts(cap).unwrap();
        // Platform capability: reserved, UUID, version, then the set length.
        let len = u16::from_le_bytes([data[21], data[22]]);
        assert_eq!(usize::from(len), msos::DESCRIPTOR_SET.len());
    }

    #[test]
    fn layout_leaves_cdc_to_its_class() {
        assert!(!layout::is_vendor_interface(layout::ITF_NUM_CDC as u16));
        assert!(!layout::is_vendor_interface(layout::ITF_NUM_HID as u16));
        for i in layout::ITF_NUM_VENDOR {
            assert!(layout::is_vendor_interface(i as u16));
        }
    }

    // ════════════════════════════════════════════════════════════════════════
    // Mode switching end to end
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn host_mode_switch_selects_boot_action() {
        let ctx = DeviceContext::new();
        let mut handler = ControlHandler::new(&ctx, NoSignals);
        // Class request 0x23 to interface 3, wValue 1.
        let req = Request::parse(&[0x21, 0x23, 0x01, 0x00, 0x03, 0x00, 0x00, 0x00]);
        assert_eq!(handler.handle(Stage::Setup, &req), Response::Ack);
        assert_eq!(BootAction::from_mode(ctx.mode()), BootAction::FileService);
    }
}
