//! USB composite device - CDC console + three WebUSB vendor interfaces + HID.
//!
//! Initialises the Embassy USB stack on the nRF52840 hardware USB
//! peripheral and hands back the pieces each task drives.

use badge_usb::config;
use badge_usb::context::DeviceContext;
use badge_usb::descriptor::bos;
use badge_usb::descriptor::layout::VENDOR_CLASS;
use badge_usb::hid::{HidReport, ReportSink, MAX_REPORT_SIZE, REPORT_DESCRIPTOR};
use defmt::{info, warn};
use embassy_nrf::usb::vbus_detect::HardwareVbusDetect;
use embassy_nrf::usb::Driver;
use embassy_nrf::{self, bind_interrupts, peripherals};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_usb::class::cdc_acm::{CdcAcmClass, State as CdcState};
use embassy_usb::class::hid::{Config as HidConfig, HidWriter, State as HidState};
use embassy_usb::{Builder, Config, UsbDevice};
use static_cell::StaticCell;

use super::handler::BadgeHandler;
use super::{EpIn, EpOut, UsbDriver};

bind_interrupts!(struct Irqs {
    USBD => embassy_nrf::usb::InterruptHandler<peripherals::USBD>;
    CLOCK_POWER => embassy_nrf::usb::vbus_detect::InterruptHandler;
});

static CDC_STATE: StaticCell<CdcState> = StaticCell::new();
static HID_STATE: StaticCell<HidState> = StaticCell::new();
static USB_CONFIG_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static USB_BOS_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static USB_MSOS_DESC: StaticCell<[u8; 0]> = StaticCell::new();
static USB_CTRL_BUF: StaticCell<[u8; 128]> = StaticCell::new();
static USB_HANDLER: StaticCell<BadgeHandler> = StaticCell::new();
static SERIAL: StaticCell<heapless::String<16>> = StaticCell::new();

/// Reports waiting for the HID endpoint.
static HID_REPORTS: Channel<CriticalSectionRawMutex, HidReport, { config::HID_QUEUE_DEPTH }> =
    Channel::new();

pub type Hid = HidWriter<'static, UsbDriver, MAX_REPORT_SIZE>;
pub type Cdc = CdcAcmClass<'static, UsbDriver>;

/// Build result containing the USB device runner and every class handle.
pub struct UsbComposite {
    pub device: UsbDevice<'static, UsbDriver>,
    pub cdc: Cdc,
    pub vendor: [(EpIn, EpOut); 3],
    pub hid: Hid,
}

/// Queues reports for [`hid_writer_task`] without waiting.
#[derive(Clone, Copy, Default)]
pub struct QueueSink;

impl ReportSink for QueueSink {
    fn submit(&mut self, report: HidReport) {
        if HID_REPORTS.try_send(report).is_err() {
            warn!("HID queue full, report dropped");
        }
    }
}

/// Reads the 64-bit factory device ID.
fn chip_id() -> [u8; 8] {
    let ficr = embassy_nrf::pac::FICR;
    let [a, b, c, d] = ficr.deviceid(0).read().to_le_bytes();
    let [e, f, g, h] = ficr.deviceid(1).read().to_le_bytes();
    [a, b, c, d, e, f, g, h]
}

/// Initialise the USB stack and create the composite device.
///
/// Must be called exactly once.  All static buffers are consumed here.
pub fn init(usbd: peripherals::USBD, ctx: &'static DeviceContext) -> UsbComposite {
    // Create the low-level USB driver with hardware VBUS detection.
    let driver = Driver::new(usbd, Irqs, HardwareVbusDetect::new(Irqs));

    let serial = SERIAL.init(badge_usb::descriptor::strings::render_serial(&chip_id()));
    info!("USB serial {}", serial.as_str());

    // USB device-level configuration.
    let mut usb_config = Config::new(config::USB_VID, config::USB_PID);
    usb_config.device_release = config::USB_DEVICE_RELEASE;
    usb_config.manufacturer = Some(config::USB_MANUFACTURER);
    usb_config.product = Some(config::USB_PRODUCT);
    usb_config.serial_number = Some(serial.as_str());
    usb_config.max_power = config::USB_MAX_POWER_MA;
    usb_config.max_packet_size_0 = config::USB_EP0_SIZE;
    usb_config.supports_remote_wakeup = true;
    // CDC needs an interface association.
    usb_config.composite_with_iads = true;
    usb_config.device_class = 0xEF;
    usb_config.device_sub_class = 0x02;
    usb_config.device_protocol = 0x01;

    // Allocate static descriptor buffers. MS OS requests are answered by
    // the badge handler, so the stack gets no MS OS buffer.
    let config_desc = USB_CONFIG_DESC.init([0u8; 256]);
    let bos_desc = USB_BOS_DESC.init([0u8; 256]);
    let msos_desc = USB_MSOS_DESC.init([0u8; 0]);
    let ctrl_buf = USB_CTRL_BUF.init([0u8; 128]);

    let mut builder = Builder::new(
        driver,
        usb_config,
        config_desc,
        bos_desc,
        msos_desc,
        ctrl_buf,
    );

    let handler = USB_HANDLER.init(BadgeHandler::new(ctx));

    // Interfaces 0-1
    let cdc_state = CDC_STATE.init(CdcState::new());
    let cdc = CdcAcmClass::new(&mut builder, cdc_state, config::CDC_EP_SIZE);

    // Interfaces 2-4
    let vendor = [
        vendor_interface(&mut builder, handler, 0),
        vendor_interface(&mut builder, handler, 1),
        vendor_interface(&mut builder, handler, 2),
    ];

    // Interface 5
    let hid_state = HID_STATE.init(HidState::new());
    let hid_config = HidConfig {
        report_descriptor: &REPORT_DESCRIPTOR,
        request_handler: None,
        poll_ms: config::USB_HID_POLL_MS,
        max_packet_size: config::HID_EP_SIZE,
    };
    let hid = HidWriter::new(&mut builder, hid_state, hid_config);

    builder.handler(handler);
    let device = builder.build();

    info!("USB composite device initialised (CDC + 3x vendor + HID)");

    UsbComposite {
        device,
        cdc,
        vendor,
        hid,
    }
}

/// Adds vendor interface `n` with its bulk endpoint pair. The BOS platform
/// capabilities ride on the first one.
fn vendor_interface(
    builder: &mut Builder<'static, UsbDriver>,
    handler: &mut BadgeHandler,
    n: usize,
) -> (EpIn, EpOut) {
    let name = builder.string();
    handler.set_vendor_string(n, name);

    let mut function = builder.function(VENDOR_CLASS, 0, 0);
    let mut interface = function.interface();
    let mut alt = interface.alt_setting(VENDOR_CLASS, 0, 0, Some(name));
    if n == 0 {
        for cap in bos::CAPABILITIES.iter() {
            if let Some((kind, data)) = bos::capability_parts(cap) {
                alt.bos_capability(kind, data);
            }
        }
    }
    let ep_out = alt.endpoint_bulk_out(config::VENDOR_EP_SIZE);
    let ep_in = alt.endpoint_bulk_in(config::VENDOR_EP_SIZE);
    (ep_in, ep_out)
}

/// Run the USB device stack - must be spawned as a dedicated Embassy task.
///
/// This handles USB enumeration, suspend/resume, control requests and
/// endpoint servicing.
#[embassy_executor::task]
pub async fn usb_task(mut device: UsbDevice<'static, UsbDriver>) -> ! {
    info!("USB device task started");
    device.run().await
}

/// HID report forwarding task - drains the report queue into the HID
/// endpoint, report ID first.
#[embassy_executor::task]
pub async fn hid_writer_task(mut hid: Hid) -> ! {
    info!("HID writer task started - waiting for reports");

    let mut buf = [0u8; MAX_REPORT_SIZE];

    loop {
        let report = HID_REPORTS.receive().await;
        let n = report.serialize(&mut buf);
        if let Err(_e) = hid.write(&buf[..n]).await {
            warn!("USB HID write failed");
        }
    }
}
