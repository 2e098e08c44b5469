//! WebUSB landing page and platform capability.
//!
//! Browsers read the platform capability out of the BOS descriptor, then
//! issue vendor request [`VENDOR_REQUEST_WEBUSB`] with `wValue` =
//! landing page index to fetch the URL descriptor.

use super::DescriptorWriter;
use crate::config::{VENDOR_REQUEST_WEBUSB, WEBUSB_LANDING_HOST};

/// URL descriptor type (WebUSB §4.3.1).
pub const URL_DESCRIPTOR_TYPE: u8 = 3;

/// Landing page index advertised in the platform capability.
pub const LANDING_PAGE_INDEX: u8 = 1;

/// URL scheme prefix, as encoded in `bScheme`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Scheme {
    Http = 0,
    Https = 1,
}

/// Builds a URL descriptor: `bLength`, `bDescriptorType`, `bScheme`, URL.
pub const fn url_descriptor<const N: usize>(scheme: Scheme, url: &str) -> [u8; N] {
    assert!(N == 3 + url.len() && N <= 255, "url descriptor size");
    DescriptorWriter::<N>::new()
        .u8(N as u8)
        .u8(URL_DESCRIPTOR_TYPE)
        .u8(scheme as u8)
        .bytes(url.as_bytes())
        .finish()
}

pub const LANDING_URL_LEN: usize = 3 + WEBUSB_LANDING_HOST.len();

/// `https://webusb.hackz.one`
pub static LANDING_URL: [u8; LANDING_URL_LEN] =
    url_descriptor(Scheme::Https, WEBUSB_LANDING_HOST);

/// WebUSB platform capability UUID {3408B638-09A9-47A0-8BFD-A0768815B665}.
pub const PLATFORM_UUID: [u8; 16] = [
    0x38, 0xB6, 0x08, 0x34, 0xA9, 0x09, 0xA0, 0x47, 0x8B, 0xFD, 0xA0, 0x76, 0x88, 0x15, 0xB6, 0x65,
];

pub const PLATFORM_CAPABILITY_LEN: usize = 24;

/// BOS platform capability announcing WebUSB 1.0.
pub const PLATFORM_CAPABILITY: [u8; PLATFORM_CAPABILITY_LEN] =
    DescriptorWriter::<PLATFORM_CAPABILITY_LEN>::new()
        .u8(PLATFORM_CAPABILITY_LEN as u8)
        .u8(super::bos::DEVICE_CAPABILITY_TYPE)
        .u8(super::bos::CAPABILITY_PLATFORM)
        .u8(0) // bReserved
        .bytes(&PLATFORM_UUID)
        .u16(0x0100) // bcdVersion
        .u8(VENDOR_REQUEST_WEBUSB)
        .u8(LANDING_PAGE_INDEX)
        .finish();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landing_url_layout() {
        assert_eq!(LANDING_URL[0] as usize, LANDING_URL.len());
        assert_eq!(LANDING_URL[0], 19);
        assert_eq!(LANDING_URL[1], URL_DESCRIPTOR_TYPE);
        assert_eq!(LANDING_URL[2], Scheme::Https as u8);
        assert_eq!(&LANDING_URL[3..], b"webusb.hackz.one");
    }

    #[test]
    fn http_scheme_encodes_zero() {
        let d: [u8; 14] = url_descriptor(Scheme::Http, "example.org");
        assert_eq!(d[0], 14);
        assert_eq!(d[2], 0);
    }

    #[test]
    fn platform_capability_carries_vendor_code() {
        assert_eq!(PLATFORM_CAPABILITY[0], 24);
        assert_eq!(PLATFORM_CAPABILITY[2], 0x05);
        assert_eq!(&PLATFORM_CAPABILITY[4..20], &PLATFORM_UUID);
        assert_eq!(PLATFORM_CAPABILITY[22], VENDOR_REQUEST_WEBUSB);
        assert_eq!(PLATFORM_CAPABILITY[23], LANDING_PAGE_INDEX);
    }
}
