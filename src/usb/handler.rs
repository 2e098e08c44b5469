//! Bridges `embassy-usb` control callbacks onto [`ControlHandler`].

use badge_usb::context::DeviceContext;
use badge_usb::control::{ControlHandler, HostSignals, Request, Response, Stage};
use badge_usb::descriptor::strings::{self, StringId};
use defmt::{debug, info, warn};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_usb::control::{InResponse, OutResponse};
use embassy_usb::types::StringIndex;

/// Raised by class request `0x22`.
pub static INTERRUPT: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Raised by class request `0x23` with the new mode.
pub static MODE_CHANGED: Signal<CriticalSectionRawMutex, i32> = Signal::new();

pub struct FirmwareSignals;

impl HostSignals for FirmwareSignals {
    fn keyboard_interrupt(&self) {
        INTERRUPT.signal(());
    }

    fn mode_changed(&self, mode: i32) {
        MODE_CHANGED.signal(mode);
    }
}

pub struct BadgeHandler {
    control: ControlHandler<'static, FirmwareSignals>,
    vendor_strings: [Option<StringIndex>; 3],
}

impl BadgeHandler {
    pub fn new(ctx: &'static DeviceContext) -> Self {
        Self {
            control: ControlHandler::new(ctx, FirmwareSignals),
            vendor_strings: [None; 3],
        }
    }

    /// Records the string index the stack allocated for vendor interface `n`.
    pub fn set_vendor_string(&mut self, n: usize, index: StringIndex) {
        if let Some(slot) = self.vendor_strings.get_mut(n) {
            *slot = Some(index);
        }
    }

    fn decode(req: &embassy_usb::control::Request) -> Request {
        let bm = req.direction as u8 | (req.request_type as u8) << 5 | req.recipient as u8;
        let [v0, v1] = req.value.to_le_bytes();
        let [i0, i1] = req.index.to_le_bytes();
        let [l0, l1] = req.length.to_le_bytes();
        Request::parse(&[bm, req.request, v0, v1, i0, i1, l0, l1])
    }

    /// `None` when the request belongs to another handler.
    fn dispatch(&mut self, req: &embassy_usb::control::Request) -> Option<Response> {
        let req = Self::decode(req);
        if !self.control.claims(&req) {
            return None;
        }
        let resp = self.control.handle(Stage::Setup, &req);
        if resp == Response::Stall {
            debug!("control request {} stalled", req);
        }
        Some(resp)
    }
}

impl embassy_usb::Handler for BadgeHandler {
    fn reset(&mut self) {
        warn!("USB bus reset");
    }

    fn addressed(&mut self, addr: u8) {
        info!("USB addressed: {}", addr);
    }

    fn configured(&mut self, configured: bool) {
        info!("USB configured: {}", configured);
    }

    fn suspended(&mut self, suspended: bool) {
        info!("USB suspended: {}", suspended);
    }

    fn control_out(
        &mut self,
        req: embassy_usb::control::Request,
        _data: &[u8],
    ) -> Option<OutResponse> {
        match self.dispatch(&req)? {
            Response::Stall => Some(OutResponse::Rejected),
            Response::Ack | Response::Data(_) => Some(OutResponse::Accepted),
        }
    }

    fn control_in<'a>(
        &'a mut self,
        req: embassy_usb::control::Request,
        _buf: &'a mut [u8],
    ) -> Option<InResponse<'a>> {
        match self.dispatch(&req)? {
            Response::Data(data) => Some(InResponse::Accepted(data)),
            Response::Ack => Some(InResponse::Accepted(&[])),
            Response::Stall => Some(InResponse::Rejected),
        }
    }

    fn get_string(&mut self, index: StringIndex, lang_id: u16) -> Option<&str> {
        if lang_id != strings::LANG_ID_EN_US {
            return None;
        }
        let n = self.vendor_strings.iter().position(|s| *s == Some(index))?;
        StringId::VendorInterface(n as u8).text()
    }
}
