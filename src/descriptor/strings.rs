//! String descriptors.
//!
//! | Index | String |
//! |---|---|
//! | 0 | language list (en-US) |
//! | 1 | manufacturer |
//! | 2 | product |
//! | 3 | serial - chip ID as 16 lowercase hex digits |
//! | 4 | CDC interface |
//! | 5-7 | vendor interfaces |
//! | 8 | HID interface |
//!
//! The USB stack allocates its own indices for interface strings; the
//! firmware maps them back onto [`StringId`] roles.

use crate::config;
use heapless::String;

/// English (United States).
pub const LANG_ID_EN_US: u16 = 0x0409;

/// Longest string, in characters, a descriptor carries.
pub const MAX_CHARS: usize = 19;

/// Length of the rendered serial number.
pub const SERIAL_LEN: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StringId {
    Manufacturer,
    Product,
    Serial,
    CdcInterface,
    VendorInterface(u8),
    HidInterface,
}

impl StringId {
    /// Index of the string in the badge's table.
    pub fn index(self) -> u8 {
        match self {
            StringId::Manufacturer => 1,
            StringId::Product => 2,
            StringId::Serial => 3,
            StringId::CdcInterface => 4,
            StringId::VendorInterface(n) => 5u8.saturating_add(n),
            StringId::HidInterface => 8,
        }
    }

    #[cfg(test)]
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            1 => Some(StringId::Manufacturer),
            2 => Some(StringId::Product),
            3 => Some(StringId::Serial),
            4 => Some(StringId::CdcInterface),
            5..=7 => Some(StringId::VendorInterface(index - 5)),
            8 => Some(StringId::HidInterface),
            _ => None,
        }
    }

    /// Fixed text of this string. The serial is rendered at runtime and
    /// has none.
    pub fn text(self) -> Option<&'static str> {
        let s = match self {
            StringId::Manufacturer => config::USB_MANUFACTURER,
            StringId::Product => config::USB_PRODUCT,
            StringId::Serial => return None,
            StringId::CdcInterface => config::USB_CDC_INTERFACE,
            StringId::VendorInterface(n) => *config::USB_VENDOR_INTERFACES.get(n as usize)?,
            StringId::HidInterface => config::USB_HID_INTERFACE,
        };
        Some(clamp(s))
    }
}

/// Cuts `s` to at most [`MAX_CHARS`] characters.
pub fn clamp(s: &str) -> &str {
    match s.char_indices().nth(MAX_CHARS) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}

/// Renders a chip ID as lowercase hex, two digits per byte, in byte order.
pub fn render_serial(id: &[u8; 8]) -> String<SERIAL_LEN> {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut s = String::new();
    for &b in id {
        // Capacity is exactly two digits per byte.
        let _ = s.push(HEX[(b >> 4) as usize] as char);
        let _ = s.push(HEX[(b & 0x0F) as usize] as char);
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_is_sixteen_lowercase_hex_digits() {
        let s = render_serial(&[0xE4, 0x61, 0x40, 0x15, 0x83, 0x0F, 0x2C, 0x29]);
        assert_eq!(s.as_str(), "e4614015830f2c29");
        assert_eq!(s.len(), SERIAL_LEN);
    }

    #[test]
    fn serial_keeps_leading_zeros() {
        let s = render_serial(&[0x00, 0x01, 0x0A, 0xA0, 0xFF, 0x10, 0x00, 0x09]);
        assert_eq!(s.as_str(), "00010aa0ff100009");
    }

    #[test]
    fn index_roundtrip() {
        for i in 1..=8u8 {
            let id = StringId::from_index(i).unwrap();
            assert_eq!(id.index(), i);
        }
        assert!(StringId::from_index(0).is_none());
        assert!(StringId::from_index(9).is_none());
    }

    #[test]
    fn table_texts() {
        assert_eq!(StringId::Manufacturer.text(), Some("HackerHotel"));
        assert_eq!(StringId::Product.text(), Some("HH22 Badge"));
        assert_eq!(StringId::Serial.text(), None);
        assert_eq!(StringId::VendorInterface(1).text(), Some("HH22 WebUSB FS"));
        assert_eq!(StringId::VendorInterface(2).text(), Some("HH22 WebUSB Secret"));
        assert_eq!(StringId::VendorInterface(3).text(), None);
        assert_eq!(StringId::HidInterface.text(), Some("HH22 HID"));
    }

    #[test]
    fn long_strings_are_clamped() {
        assert_eq!(clamp("0123456789abcdefghijk"), "0123456789abcdefghi");
        assert_eq!(clamp("short"), "short");
    }
}
