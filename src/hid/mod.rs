//! HID report types and the injector behind `hid.keyboard` / `hid.mouse`.
//!
//! One HID interface carries both collections, told apart by report ID.
//! Reports are fire-and-forget: the injector hands them to a
//! [`ReportSink`] and never waits for the host.

pub mod keyboard;
pub mod mouse;

#[cfg(test)]
mod tests;

use crate::descriptor::DescriptorWriter;
use keyboard::{KeyboardReport, KEYBOARD_REPORT_DESCRIPTOR, REPORT_ID_KEYBOARD};
use mouse::{MouseReport, MOUSE_REPORT_DESCRIPTOR, REPORT_ID_MOUSE};

/// Largest serialised report, report ID included.
pub const MAX_REPORT_SIZE: usize = 1 + keyboard::KEYBOARD_REPORT_SIZE;

const REPORT_DESCRIPTOR_LEN: usize = KEYBOARD_REPORT_DESCRIPTOR.len() + MOUSE_REPORT_DESCRIPTOR.len();

/// Report descriptor of the HID interface: keyboard, then mouse.
pub static REPORT_DESCRIPTOR: [u8; REPORT_DESCRIPTOR_LEN] =
    DescriptorWriter::<REPORT_DESCRIPTOR_LEN>::new()
        .bytes(KEYBOARD_REPORT_DESCRIPTOR)
        .bytes(MOUSE_REPORT_DESCRIPTOR)
        .finish();

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HidReport {
    Keyboard(KeyboardReport),
    Mouse(MouseReport),
}

impl HidReport {
    pub fn report_id(&self) -> u8 {
        match self {
            HidReport::Keyboard(_) => REPORT_ID_KEYBOARD,
            HidReport::Mouse(_) => REPORT_ID_MOUSE,
        }
    }

    /// Serialise with the report ID prefix. Returns 0 if `buf` is too small.
    pub fn serialize(&self, buf: &mut [u8]) -> usize {
        let Some((id, body)) = buf.split_first_mut() else {
            return 0;
        };
        *id = self.report_id();
        let n = match self {
            HidReport::Keyboard(k) => k.serialize(body),
            HidReport::Mouse(m) => m.serialize(body),
        };
        if n == 0 {
            0
        } else {
            n + 1
        }
    }
}

/// Where submitted reports go. Submission never blocks and reports no
/// outcome; a full queue is the sink's business.
pub trait ReportSink {
    fn submit(&mut self, report: HidReport);
}

impl<S: ReportSink + ?Sized> ReportSink for &mut S {
    fn submit(&mut self, report: HidReport) {
        (**self).submit(report)
    }
}

/// Builds reports from scripting scalars and submits them.
pub struct HidInjector<S> {
    sink: S,
}

impl<S: ReportSink> HidInjector<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Submit one keyboard report. Always returns 0.
    pub fn keyboard(&mut self, modifiers: u8, keys: &[u8]) -> i32 {
        self.sink
            .submit(HidReport::Keyboard(KeyboardReport::new(modifiers, keys)));
        0
    }

    /// Submit one mouse report. `h` is the horizontal wheel, `v` the
    /// vertical one. Always returns 0.
    pub fn mouse(&mut self, buttons: u8, x: i8, y: i8, h: i8, v: i8) -> i32 {
        self.sink.submit(HidReport::Mouse(MouseReport {
            buttons,
            x,
            y,
            wheel: v,
            pan: h,
        }));
        0
    }
}
