//! Application-wide constants and compile-time configuration.
//!
//! USB identity, descriptor strings, request codes and buffer sizes
//! live here so they can be tuned in one place.

// USB identity

/// USB VID/PID - the TinyUSB "cafe" test VID used by the badge tooling.
pub const USB_VID: u16 = 0xCAFE;
pub const USB_PID: u16 = 0x4011;

/// bcdDevice reported in the device descriptor.
pub const USB_DEVICE_RELEASE: u16 = 0x0100;

/// Maximum bus power draw (mA).
pub const USB_MAX_POWER_MA: u16 = 100;

/// Control endpoint 0 packet size.
pub const USB_EP0_SIZE: u8 = 64;

/// USB device strings.
pub const USB_MANUFACTURER: &str = "HackerHotel";
pub const USB_PRODUCT: &str = "HH22 Badge";

/// Interface strings, in interface order.
pub const USB_CDC_INTERFACE: &str = "HH22 UART";
pub const USB_VENDOR_INTERFACES: [&str; 3] =
    ["HH22 WebUSB Uart", "HH22 WebUSB FS", "HH22 WebUSB Secret"];
pub const USB_HID_INTERFACE: &str = "HH22 HID";

// WebUSB / Microsoft OS 2.0

/// Landing page host advertised through the WebUSB URL descriptor.
pub const WEBUSB_LANDING_HOST: &str = "webusb.hackz.one";

/// Vendor request code announced in the WebUSB platform capability.
pub const VENDOR_REQUEST_WEBUSB: u8 = 1;

/// Vendor request code announced in the MS OS 2.0 platform capability.
pub const VENDOR_REQUEST_MICROSOFT: u8 = 2;

/// Interface GUID registered for the WinUSB-bound vendor interface.
pub const WINUSB_INTERFACE_GUID: &str = "{975F44D9-0D08-43FD-8B3E-127CA8AFFF9D}";

// Custom class requests on the vendor interfaces

/// Host-triggered break: interrupts whatever the badge is running.
pub const CLASS_REQUEST_BREAK: u8 = 0x22;

/// Host-triggered personality switch: `wValue` becomes the new mode.
pub const CLASS_REQUEST_SET_MODE: u8 = 0x23;

// Endpoints

/// Bulk endpoint size of each vendor interface.
pub const VENDOR_EP_SIZE: u16 = 64;

/// CDC data endpoint size.
pub const CDC_EP_SIZE: u16 = 64;

/// HID interrupt endpoint size and polling interval (ms).
pub const HID_EP_SIZE: u16 = 16;
pub const USB_HID_POLL_MS: u8 = 10;

/// Depth of each direction of every vendor channel FIFO.
pub const VENDOR_FIFO_DEPTH: usize = 256;

/// Number of HID reports that may be queued for the USB writer.
pub const HID_QUEUE_DEPTH: usize = 16;

// Console

/// Longest console line accepted over the CDC port.
pub const CONSOLE_LINE_MAX: usize = 128;

/// Largest `buf:N` scratch buffer the console hands to a binding.
pub const CONSOLE_SCRATCH_MAX: usize = 64;

/// Most arguments a console call may carry.
pub const CONSOLE_MAX_ARGS: usize = 6;

/// Longest console reply, result plus hex of one scratch buffer.
pub const CONSOLE_REPLY_MAX: usize = 16 + 2 * CONSOLE_SCRATCH_MAX + 64;

// WebUSB file service

/// Largest payload chunk handed to a file-service command at once.
pub const FS_CHUNK_MAX: usize = 1024;

/// File bytes pushed per read-file streaming step.
pub const FS_STREAM_STEP: usize = 32;

/// Capacity of the RAM volume used by the firmware.
pub const FS_MAX_ENTRIES: usize = 16;
pub const FS_MAX_FILE_SIZE: usize = 4096;
pub const FS_MAX_PATH: usize = 64;

/// Largest text reply (header included) the file service builds.
pub const FS_REPLY_MAX: usize = 12 + FS_MAX_ENTRIES * (FS_MAX_PATH + 2) + FS_MAX_PATH;

/// File the resident-app launcher reads the module name from.
pub const STARTUP_FILE: &str = "/startup.txt";
