//! USB descriptor tables.
//!
//! Every table the badge hands out is assembled at compile time from a
//! declarative chain of [`DescriptorWriter`] calls. The writer knows the
//! final size up front and `finish` refuses to produce a table whose
//! written length differs from it, so a mis-sized table is a build error
//! rather than a malformed transfer.
//!
//! - [`webusb`]: landing-page URL descriptor and WebUSB platform capability
//! - [`msos`]: Microsoft OS 2.0 descriptor set and platform capability
//! - [`bos`]: BOS descriptor carrying both platform capabilities
//! - [`strings`]: string table and chip-derived serial number
//!
//! The device and configuration descriptors are produced by the USB stack
//! from [`layout`] and the identity constants in `config`.

pub mod bos;
pub mod msos;
pub mod strings;
pub mod webusb;

/// Interface numbering of the composite configuration.
///
/// The USB stack assigns interface numbers in creation order, so the
/// firmware creates the classes in exactly this order.
pub mod layout {
    /// CDC communication interface (console).
    pub const ITF_NUM_CDC: u8 = 0;
    /// CDC data interface.
    pub const ITF_NUM_CDC_DATA: u8 = 1;
    /// Vendor interfaces, indexed by channel number.
    pub const ITF_NUM_VENDOR: [u8; 3] = [2, 3, 4];
    /// HID interface (keyboard + mouse).
    pub const ITF_NUM_HID: u8 = 5;
    /// Total interface count.
    pub const ITF_NUM_TOTAL: u8 = 6;

    /// Vendor interface class code.
    pub const VENDOR_CLASS: u8 = 0xFF;

    /// Returns `true` if `interface` is one of the vendor interfaces.
    pub fn is_vendor_interface(interface: u16) -> bool {
        ITF_NUM_VENDOR.iter().any(|&n| u16::from(n) == interface)
    }
}

/// Compile-time byte writer for fixed-size descriptor tables.
///
/// All multi-byte fields are little-endian, as USB requires.
pub struct DescriptorWriter<const N: usize> {
    buf: [u8; N],
    pos: usize,
}

impl<const N: usize> DescriptorWriter<N> {
    pub const fn new() -> Self {
        Self {
            buf: [0; N],
            pos: 0,
        }
    }

    pub const fn u8(mut self, v: u8) -> Self {
        self.buf[self.pos] = v;
        self.pos += 1;
        self
    }

    pub const fn u16(self, v: u16) -> Self {
        let b = v.to_le_bytes();
        self.u8(b[0]).u8(b[1])
    }

    pub const fn u32(self, v: u32) -> Self {
        let b = v.to_le_bytes();
        self.u8(b[0]).u8(b[1]).u8(b[2]).u8(b[3])
    }

    pub const fn bytes(mut self, data: &[u8]) -> Self {
        let mut i = 0;
        while i < data.len() {
            self = self.u8(data[i]);
            i += 1;
        }
        self
    }

    /// `n` zero bytes.
    pub const fn zeros(mut self, n: usize) -> Self {
        let mut i = 0;
        while i < n {
            self = self.u8(0);
            i += 1;
        }
        self
    }

    /// ASCII text padded with zeros to `width` bytes.
    pub const fn padded(mut self, text: &str, width: usize) -> Self {
        let b = text.as_bytes();
        assert!(b.len() <= width, "text wider than its field");
        self = self.bytes(b);
        self.zeros(width - b.len())
    }

    /// ASCII text widened to UTF-16LE, followed by one NUL code unit.
    pub const fn utf16z(mut self, text: &str) -> Self {
        let b = text.as_bytes();
        let mut i = 0;
        while i < b.len() {
            self = self.u16(b[i] as u16);
            i += 1;
        }
        self.u16(0)
    }

    pub const fn finish(self) -> [u8; N] {
        assert!(self.pos == N, "descriptor length mismatch");
        self.buf
    }
}

/// Byte length of `text` as NUL-terminated UTF-16.
pub const fn utf16z_len(text: &str) -> usize {
    (text.len() + 1) * 2
}

/// Reads the little-endian `u16` at `offset`.
pub fn read_u16_le(data: &[u8], offset: usize) -> Option<u16> {
    let bytes = data.get(offset..offset + 2)?;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}
