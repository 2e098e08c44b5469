//! Unit tests for HID report building and serialization.
//!
//! These tests run on the host (not embedded) and cover the pure logic
//! behind `hid.keyboard` and `hid.mouse`.

use super::keyboard::{modifier, KeyboardReport, KEYBOARD_REPORT_DESCRIPTOR};
use super::mouse::{MouseReport, MOUSE_REPORT_DESCRIPTOR};
use super::{HidInjector, HidReport, ReportSink, MAX_REPORT_SIZE, REPORT_DESCRIPTOR};

#[derive(Default)]
struct Collect(Vec<HidReport>);

impl ReportSink for Collect {
    fn submit(&mut self, report: HidReport) {
        self.0.push(report);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Keyboard Report Tests
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn keyboard_default_is_release() {
    let report = KeyboardReport::default();
    assert!(report.is_release());
    assert_eq!(report.modifier, 0);
    assert_eq!(report.keycodes, [0; 6]);
}

#[test]
fn keyboard_short_buffer_zero_fills() {
    // Left Shift + 'A'
    let report = KeyboardReport::new(modifier::LEFT_SHIFT, &[0x04]);
    assert_eq!(report.modifier, 0x02);
    assert_eq!(report.keycodes, [0x04, 0, 0, 0, 0, 0]);
    assert!(!report.is_release());
}

#[test]
fn keyboard_long_buffer_keeps_first_six() {
    let report = KeyboardReport::new(0, &[1, 2, 3, 4, 5, 6, 7, 8]);
    assert_eq!(report.keycodes, [1, 2, 3, 4, 5, 6]);
}

#[test]
fn keyboard_report_serialize() {
    let mods = modifier::LEFT_CTRL | modifier::LEFT_ALT;
    let report = KeyboardReport::new(mods, &[0x04, 0x05, 0x06]);
    let mut buf = [0u8; 8];
    assert_eq!(report.serialize(&mut buf), 8);
    assert_eq!(buf, [0x05, 0x00, 0x04, 0x05, 0x06, 0x00, 0x00, 0x00]);
}

#[test]
fn keyboard_report_serialize_buffer_too_small() {
    let report = KeyboardReport::default();
    let mut small_buf = [0u8; 4];
    assert_eq!(report.serialize(&mut small_buf), 0);
}

// ═══════════════════════════════════════════════════════════════════════════
// Mouse Report Tests
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn mouse_report_empty_is_idle() {
    assert!(MouseReport::empty().is_idle());
}

#[test]
fn mouse_report_serialize_signed() {
    let report = MouseReport {
        buttons: 0x01,
        x: 5,
        y: -5,
        wheel: 1,
        pan: -1,
    };
    let mut buf = [0u8; 5];
    assert_eq!(report.serialize(&mut buf), 5);
    assert_eq!(buf, [0x01, 0x05, 0xFB, 0x01, 0xFF]);
}

// ═══════════════════════════════════════════════════════════════════════════
// Report ID framing
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn hid_report_prefixes_report_id() {
    let mut buf = [0u8; MAX_REPORT_SIZE];

    let kb = HidReport::Keyboard(KeyboardReport::new(0, &[0x04]));
    assert_eq!(kb.serialize(&mut buf), 9);
    assert_eq!(buf[..3], [1, 0, 0]);
    assert_eq!(buf[3], 0x04);

    let m = HidReport::Mouse(MouseReport::empty());
    assert_eq!(m.serialize(&mut buf), 6);
    assert_eq!(buf[0], 2);
}

#[test]
fn hid_report_serialize_empty_buffer() {
    let kb = HidReport::Keyboard(KeyboardReport::default());
    assert_eq!(kb.serialize(&mut []), 0);
    assert_eq!(kb.serialize(&mut [0u8; 3]), 0);
}

#[test]
fn report_descriptor_is_keyboard_then_mouse() {
    let k = KEYBOARD_REPORT_DESCRIPTOR.len();
    assert_eq!(REPORT_DESCRIPTOR.len(), k + MOUSE_REPORT_DESCRIPTOR.len());
    assert_eq!(&REPORT_DESCRIPTOR[..k], KEYBOARD_REPORT_DESCRIPTOR);
    assert_eq!(&REPORT_DESCRIPTOR[k..], MOUSE_REPORT_DESCRIPTOR);
    // Report ID items
    assert_eq!(REPORT_DESCRIPTOR[6..8], [0x85, 1]);
    assert_eq!(REPORT_DESCRIPTOR[k + 6..k + 8], [0x85, 2]);
}

// ═══════════════════════════════════════════════════════════════════════════
// Injector
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn injector_keyboard_submits_one_report() {
    let mut sink = Collect::default();
    let rc = HidInjector::new(&mut sink).keyboard(0x02, &[0x0B, 0x0C]);
    assert_eq!(rc, 0);
    assert_eq!(
        sink.0,
        [HidReport::Keyboard(KeyboardReport {
            modifier: 0x02,
            keycodes: [0x0B, 0x0C, 0, 0, 0, 0],
        })]
    );
}

#[test]
fn injector_mouse_maps_wheels() {
    let mut sink = Collect::default();
    let mut hid = HidInjector::new(&mut sink);
    assert_eq!(hid.mouse(1, 10, -10, 3, -2), 0);
    assert_eq!(
        sink.0,
        [HidReport::Mouse(MouseReport {
            buttons: 1,
            x: 10,
            y: -10,
            wheel: -2,
            pan: 3,
        })]
    );
}
