//! Keyboard collection (report ID 1): a modifier byte, a reserved byte
//! and six key slots, all in USB HID usage codes.

/// Keyboard report size in bytes, without the report ID.
pub const KEYBOARD_REPORT_SIZE: usize = 8;

/// Number of key-code slots in a report.
pub const KEY_SLOTS: usize = 6;

/// Report ID of the keyboard collection.
pub const REPORT_ID_KEYBOARD: u8 = 1;

/// Modifier bits as laid out in the first report byte.
pub mod modifier {
    pub const LEFT_CTRL: u8 = 1 << 0;
    pub const LEFT_SHIFT: u8 = 1 << 1;
    pub const LEFT_ALT: u8 = 1 << 2;
    pub const LEFT_GUI: u8 = 1 << 3;
    pub const RIGHT_CTRL: u8 = 1 << 4;
    pub const RIGHT_SHIFT: u8 = 1 << 5;
    pub const RIGHT_ALT: u8 = 1 << 6;
    pub const RIGHT_GUI: u8 = 1 << 7;
}

/// Six-key-rollover keyboard report. A report with no modifier and no
/// keys releases everything.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyboardReport {
    pub modifier: u8,
    pub keycodes: [u8; KEY_SLOTS],
}

impl KeyboardReport {
    /// Build a report from a modifier mask and a key-code buffer.
    ///
    /// The first six bytes of `keys` fill the key slots; missing slots
    /// stay released and extra bytes are ignored.
    pub fn new(modifier: u8, keys: &[u8]) -> Self {
        let mut keycodes = [0; KEY_SLOTS];
        let n = keys.len().min(KEY_SLOTS);
        keycodes[..n].copy_from_slice(&keys[..n]);
        Self { modifier, keycodes }
    }

    /// Writes the 8-byte input report. Returns 0 when `buf` is too short.
    pub fn serialize(&self, buf: &mut [u8]) -> usize {
        let Some(out) = buf.get_mut(..KEYBOARD_REPORT_SIZE) else {
            return 0;
        };
        out[0] = self.modifier;
        out[1] = 0;
        out[2..].copy_from_slice(&self.keycodes);
        KEYBOARD_REPORT_SIZE
    }

    #[cfg(test)]
    pub fn is_release(&self) -> bool {
        *self == Self::default()
    }
}

/// Keyboard collection, boot-keyboard compatible apart from the report ID.
/// The LED output report is declared so hosts can send it; it is ignored.
pub const KEYBOARD_REPORT_DESCRIPTOR: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x06, // Usage (Keyboard)
    0xA1, 0x01, // Collection (Application)
    0x85, REPORT_ID_KEYBOARD,
    // modifiers: E0..E7 as 8 one-bit fields
    0x05, 0x07, 0x19, 0xE0, 0x29, 0xE7, 0x15, 0x00, 0x25, 0x01,
    0x95, 0x08, 0x75, 0x01, 0x81, 0x02,
    // reserved byte
    0x95, 0x01, 0x75, 0x08, 0x81, 0x01,
    // LEDs: Num Lock..Kana, padded to a byte
    0x05, 0x08, 0x19, 0x01, 0x29, 0x05, 0x95, 0x05, 0x75, 0x01, 0x91, 0x02,
    0x95, 0x01, 0x75, 0x03, 0x91, 0x01,
    // key array
    0x05, 0x07, 0x19, 0x00, 0x2A, 0xFF, 0x00, 0x15, 0x00, 0x26, 0xFF, 0x00,
    0x95, KEY_SLOTS as u8, 0x75, 0x08, 0x81, 0x00,
    0xC0, // End Collection
];
