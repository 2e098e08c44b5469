//! Vendor channel FIFOs and the bulk endpoint pumps behind them.
//!
//! Scripts and the file service reach the FIFOs through [`SharedPort`];
//! one pump task per channel drains the transmit side into the IN
//! endpoint and fills the receive side from the OUT endpoint.

use badge_usb::config::{VENDOR_EP_SIZE, VENDOR_FIFO_DEPTH};
use badge_usb::relay::{Channel, FifoPort, VendorPort};
use core::cell::RefCell;
use defmt::{info, warn};
use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_usb::driver::{Endpoint, EndpointError, EndpointIn, EndpointOut};

use super::{EpIn, EpOut};

const PACKET: usize = VENDOR_EP_SIZE as usize;

static FIFOS: Mutex<CriticalSectionRawMutex, RefCell<FifoPort<VENDOR_FIFO_DEPTH>>> =
    Mutex::new(RefCell::new(FifoPort::new()));

/// Transmit data queued, per channel.
static TX_READY: [Signal<CriticalSectionRawMutex, ()>; 3] =
    [Signal::new(), Signal::new(), Signal::new()];

/// Receive space freed, per channel.
static RX_SPACE: [Signal<CriticalSectionRawMutex, ()>; 3] =
    [Signal::new(), Signal::new(), Signal::new()];

/// Handle onto the process-wide vendor FIFOs.
#[derive(Clone, Copy, Default)]
pub struct SharedPort;

impl VendorPort for SharedPort {
    fn available(&self, ch: Channel) -> usize {
        FIFOS.lock(|f| f.borrow().available(ch))
    }

    fn write_available(&self, ch: Channel) -> usize {
        FIFOS.lock(|f| f.borrow().write_available(ch))
    }

    fn read(&mut self, ch: Channel, buf: &mut [u8]) -> usize {
        let n = FIFOS.lock(|f| f.borrow_mut().read(ch, buf));
        if n > 0 {
            RX_SPACE[ch.index()].signal(());
        }
        n
    }

    fn write(&mut self, ch: Channel, data: &[u8]) -> usize {
        FIFOS.lock(|f| f.borrow_mut().write(ch, data))
    }

    fn flush(&mut self, ch: Channel) {
        TX_READY[ch.index()].signal(());
    }
}

/// Moves bytes between one vendor interface and its FIFO pair.
#[embassy_executor::task(pool_size = 3)]
pub async fn vendor_pump(ch: Channel, mut ep_in: EpIn, mut ep_out: EpOut) -> ! {
    loop {
        ep_out.wait_enabled().await;
        info!("vendor {}: enabled", ch);
        let err = match select(inbound(ch, &mut ep_out), outbound(ch, &mut ep_in)).await {
            Either::First(e) | Either::Second(e) => e,
        };
        match err {
            EndpointError::Disabled => warn!("vendor {}: disabled", ch),
            EndpointError::BufferOverflow => warn!("vendor {}: buffer overflow", ch),
        }
    }
}

async fn inbound(ch: Channel, ep: &mut EpOut) -> EndpointError {
    let mut buf = [0u8; PACKET];
    loop {
        let n = match ep.read(&mut buf).await {
            Ok(n) => n,
            Err(e) => return e,
        };
        let mut pending = &buf[..n];
        while !pending.is_empty() {
            let taken = FIFOS.lock(|f| f.borrow_mut().host_write(ch, pending));
            pending = &pending[taken..];
            if !pending.is_empty() {
                RX_SPACE[ch.index()].wait().await;
            }
        }
    }
}

async fn outbound(ch: Channel, ep: &mut EpIn) -> EndpointError {
    let mut buf = [0u8; PACKET];
    loop {
        let n = FIFOS.lock(|f| f.borrow_mut().host_read(ch, &mut buf));
        if n == 0 {
            TX_READY[ch.index()].wait().await;
            continue;
        }
        if let Err(e) = ep.write(&buf[..n]).await {
            return e;
        }
    }
}
