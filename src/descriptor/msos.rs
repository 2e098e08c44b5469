//! Microsoft OS 2.0 descriptors.
//!
//! Windows reads the MS OS 2.0 platform capability from the BOS, then
//! fetches the descriptor set with vendor request
//! [`VENDOR_REQUEST_MICROSOFT`], `wIndex` = [`DESCRIPTOR_INDEX`]. The set
//! binds WinUSB to the first vendor interface and registers a
//! `DeviceInterfaceGUIDs` property for it.
//!
//! Layout of the set:
//! ```text
//! Set header              10 bytes
//!   Configuration subset   8 bytes
//!     Function subset      8 bytes  (first interface = first vendor itf)
//!       Compatible ID     20 bytes  ("WINUSB")
//!       Registry property  n bytes  (DeviceInterfaceGUIDs, REG_MULTI_SZ)
//! ```

use super::{layout, utf16z_len, DescriptorWriter};
use crate::config::{VENDOR_REQUEST_MICROSOFT, WINUSB_INTERFACE_GUID};

/// `wIndex` of the "get descriptor set" vendor request.
pub const DESCRIPTOR_INDEX: u16 = 7;

/// Windows 8.1 (NTDDI_WINBLUE).
pub const WINDOWS_VERSION_8_1: u32 = 0x0603_0000;

// wDescriptorType values
pub const SET_HEADER_DESCRIPTOR: u16 = 0x00;
pub const SUBSET_HEADER_CONFIGURATION: u16 = 0x01;
pub const SUBSET_HEADER_FUNCTION: u16 = 0x02;
pub const FEATURE_COMPATIBLE_ID: u16 = 0x03;
pub const FEATURE_REG_PROPERTY: u16 = 0x04;

/// REG_MULTI_SZ property data type.
pub const REG_MULTI_SZ: u16 = 0x0007;

const SET_HEADER_LEN: usize = 0x0A;
const CONFIG_SUBSET_LEN: usize = 0x08;
const FUNCTION_SUBSET_LEN: usize = 0x08;
const COMPATIBLE_ID_LEN: usize = 0x14;

const PROPERTY_NAME: &str = "DeviceInterfaceGUIDs";
const PROPERTY_NAME_LEN: usize = utf16z_len(PROPERTY_NAME);
// REG_MULTI_SZ ends with an extra NUL after the last string.
const PROPERTY_DATA_LEN: usize = utf16z_len(WINUSB_INTERFACE_GUID) + 2;
const REG_PROPERTY_LEN: usize = 10 + PROPERTY_NAME_LEN + PROPERTY_DATA_LEN;

/// Total size of the descriptor set.
pub const DESCRIPTOR_SET_LEN: usize =
    SET_HEADER_LEN + CONFIG_SUBSET_LEN + FUNCTION_SUBSET_LEN + COMPATIBLE_ID_LEN + REG_PROPERTY_LEN;

const _: () = assert!(DESCRIPTOR_SET_LEN == 0xB2);

/// The MS OS 2.0 descriptor set returned for `wIndex` 7.
pub static DESCRIPTOR_SET: [u8; DESCRIPTOR_SET_LEN] = DescriptorWriter::<DESCRIPTOR_SET_LEN>::new()
    // Set header: length, type, windows version, total length
    .u16(SET_HEADER_LEN as u16)
    .u16(SET_HEADER_DESCRIPTOR)
    .u32(WINDOWS_VERSION_8_1)
    .u16(DESCRIPTOR_SET_LEN as u16)
    // Configuration subset: length, type, configuration index, reserved, subset length
    .u16(CONFIG_SUBSET_LEN as u16)
    .u16(SUBSET_HEADER_CONFIGURATION)
    .u8(0)
    .u8(0)
    .u16((DESCRIPTOR_SET_LEN - SET_HEADER_LEN) as u16)
    // Function subset: length, type, first interface, reserved, subset length
    .u16(FUNCTION_SUBSET_LEN as u16)
    .u16(SUBSET_HEADER_FUNCTION)
    .u8(layout::ITF_NUM_VENDOR[0])
    .u8(0)
    .u16((DESCRIPTOR_SET_LEN - SET_HEADER_LEN - CONFIG_SUBSET_LEN) as u16)
    // Compatible ID: length, type, compatible ID, sub-compatible ID
    .u16(COMPATIBLE_ID_LEN as u16)
    .u16(FEATURE_COMPATIBLE_ID)
    .padded("WINUSB", 8)
    .zeros(8)
    // Registry property: length, type, data type, name, data
    .u16(REG_PROPERTY_LEN as u16)
    .u16(FEATURE_REG_PROPERTY)
    .u16(REG_MULTI_SZ)
    .u16(PROPERTY_NAME_LEN as u16)
    .utf16z(PROPERTY_NAME)
    .u16(PROPERTY_DATA_LEN as u16)
    .utf16z(WINUSB_INTERFACE_GUID)
    .u16(0)
    .finish();

/// `wTotalLength` as stored in the set's own header (bytes 8-9).
pub fn total_length(set: &[u8]) -> Option<u16> {
    super::read_u16_le(set, 8)
}

/// MS OS 2.0 platform capability UUID {D8DD60DF-4589-4CC7-9CD2-659D9E648A9F}.
pub const PLATFORM_UUID: [u8; 16] = [
    0xDF, 0x60, 0xDD, 0xD8, 0x89, 0x45, 0xC7, 0x4C, 0x9C, 0xD2, 0x65, 0x9D, 0x9E, 0x64, 0x8A, 0x9F,
];

pub const PLATFORM_CAPABILITY_LEN: usize = 28;

/// BOS platform capability pointing Windows at the descriptor set.
pub const PLATFORM_CAPABILITY: [u8; PLATFORM_CAPABILITY_LEN] =
    DescriptorWriter::<PLATFORM_CAPABILITY_LEN>::new()
        .u8(PLATFORM_CAPABILITY_LEN as u8)
        .u8(super::bos::DEVICE_CAPABILITY_TYPE)
        .u8(super::bos::CAPABILITY_PLATFORM)
        .u8(0) // bReserved
        .bytes(&PLATFORM_UUID)
        .u32(WINDOWS_VERSION_8_1)
        .u16(DESCRIPTOR_SET_LEN as u16)
        .u8(VENDOR_REQUEST_MICROSOFT)
        .u8(0) // bAltEnumCode
        .finish();
