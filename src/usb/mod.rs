//! USB Device subsystem - presents the badge's composite device.
//!
//! The nRF52840's built-in USB 2.0 Full-Speed controller is driven by
//! `embassy-usb`. Interfaces are created in this order so their numbers
//! match `badge_usb::descriptor::layout`:
//!
//! - Interface 0-1: CDC ACM (line console)
//! - Interface 2: Vendor "HH22 WebUSB Uart"
//! - Interface 3: Vendor "HH22 WebUSB FS" (file service)
//! - Interface 4: Vendor "HH22 WebUSB Secret"
//! - Interface 5: HID keyboard + mouse
//!
//! The control handler answers WebUSB / MS OS 2.0 vendor requests and the
//! break / mode-switch class requests; the vendor pumps move bytes between
//! the bulk endpoints and the shared channel FIFOs.

pub mod composite;
pub mod handler;
pub mod vendor;

use embassy_nrf::peripherals;
use embassy_nrf::usb::vbus_detect::HardwareVbusDetect;
use embassy_nrf::usb::Driver;

pub type UsbDriver = Driver<'static, peripherals::USBD, HardwareVbusDetect>;

pub type EpIn = <UsbDriver as embassy_usb::driver::Driver<'static>>::EndpointIn;
pub type EpOut = <UsbDriver as embassy_usb::driver::Driver<'static>>::EndpointOut;
