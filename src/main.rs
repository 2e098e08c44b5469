//! HH22 badge USB personality firmware.
//!
//! Brings up the composite device and spawns one task per concern: the
//! USB stack, the HID report writer, a pump per vendor channel, the CDC
//! console and the boot-mode dispatcher.

#![no_std]
#![no_main]

mod app;
mod usb;

use badge_usb::context::DeviceContext;
use badge_usb::fs_service::volume::RamVolume;
use badge_usb::relay::Channel;
use defmt::info;
use embassy_executor::Spawner;
use static_cell::ConstStaticCell;
use {defmt_rtt as _, panic_probe as _};

/// Personality mode shared by the control handler and the bindings.
static CONTEXT: DeviceContext = DeviceContext::new();

/// Working volume for the file service.
static VOLUME: ConstStaticCell<RamVolume> = ConstStaticCell::new(RamVolume::new());

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_nrf::init(Default::default());
    info!("badge-usb starting");

    let usb = usb::composite::init(p.USBD, &CONTEXT);

    spawner.must_spawn(usb::composite::usb_task(usb.device));
    spawner.must_spawn(usb::composite::hid_writer_task(usb.hid));

    for (ch, (ep_in, ep_out)) in Channel::ALL.into_iter().zip(usb.vendor) {
        spawner.must_spawn(usb::vendor::vendor_pump(ch, ep_in, ep_out));
    }

    spawner.must_spawn(app::console_task(usb.cdc, &CONTEXT));
    spawner.must_spawn(app::boot_task(&CONTEXT, VOLUME.take()));

    info!("all tasks spawned, mode {}", CONTEXT.mode());
}
