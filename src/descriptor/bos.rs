//! Binary Object Store descriptor.
//!
//! WebUSB needs the device to report `bcdUSB` 2.10 and expose a BOS with
//! its platform capability; the MS OS 2.0 capability rides along in the
//! same BOS.

use super::{msos, webusb, DescriptorWriter};

/// `bDescriptorType` of the BOS header.
pub const BOS_DESCRIPTOR_TYPE: u8 = 0x0F;

/// `bDescriptorType` of a device capability.
pub const DEVICE_CAPABILITY_TYPE: u8 = 0x10;

/// `bDevCapabilityType` of a platform capability.
pub const CAPABILITY_PLATFORM: u8 = 0x05;

const HEADER_LEN: usize = 5;

/// Platform capabilities, in BOS order.
pub static CAPABILITIES: [&[u8]; 2] = [&webusb::PLATFORM_CAPABILITY, &msos::PLATFORM_CAPABILITY];

pub const BOS_LEN: usize =
    HEADER_LEN + webusb::PLATFORM_CAPABILITY_LEN + msos::PLATFORM_CAPABILITY_LEN;

/// Full BOS: header, WebUSB capability, MS OS 2.0 capability.
pub static BOS_DESCRIPTOR: [u8; BOS_LEN] = DescriptorWriter::<BOS_LEN>::new()
    .u8(HEADER_LEN as u8)
    .u8(BOS_DESCRIPTOR_TYPE)
    .u16(BOS_LEN as u16)
    .u8(2) // bNumDeviceCaps
    .bytes(&webusb::PLATFORM_CAPABILITY)
    .bytes(&msos::PLATFORM_CAPABILITY)
    .finish();

/// Splits a capability into its `bDevCapabilityType` and the bytes that
/// follow the three-byte capability header.
pub fn capability_parts(capability: &[u8]) -> Option<(u8, &[u8])> {
    if capability.len() < 3 || capability[0] as usize != capability.len() {
        return None;
    }
    Some((capability[2], &capability[3..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_counts_both_capabilities() {
        assert_eq!(BOS_DESCRIPTOR[0], 5);
        assert_eq!(BOS_DESCRIPTOR[1], BOS_DESCRIPTOR_TYPE);
        assert_eq!(super::super::read_u16_le(&BOS_DESCRIPTOR, 2), Some(57));
        assert_eq!(BOS_DESCRIPTOR[4], 2);
    }

    #[test]
    fn capabilities_follow_header_in_order() {
        let mut offset = HEADER_LEN;
        for cap in CAPABILITIES.iter() {
            assert_eq!(&BOS_DESCRIPTOR[offset..offset + cap.len()], *cap);
            offset += cap.len();
        }
        assert_eq!(offset, BOS_LEN);
    }

    #[test]
    fn capability_parts_strip_header() {
        let (kind, body) = capability_parts(&webusb::PLATFORM_CAPABILITY).unwrap();
        assert_eq!(kind, CAPABILITY_PLATFORM);
        assert_eq!(body.len(), webusb::PLATFORM_CAPABILITY_LEN - 3);
        assert_eq!(body[0], 0);
        assert!(capability_parts(&[4, 0x10]).is_none());
        assert!(capability_parts(&[9, 0x10, 0x05]).is_none());
    }
}
