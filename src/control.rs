//! Vendor and class control requests.
//!
//! The USB stack answers standard requests itself and hands everything else
//! here. Two families are ours:
//!
//! - vendor requests: the WebUSB landing page (`VENDOR_REQUEST_WEBUSB`)
//!   and the MS OS 2.0 descriptor set (`VENDOR_REQUEST_MICROSOFT`,
//!   `wIndex` 7);
//! - class requests on a vendor interface: `0x22` breaks whatever the
//!   badge is running, `0x23` stores `wValue` as the new personality mode.
//!
//! Anything else is stalled.

use crate::config::{
    CLASS_REQUEST_BREAK, CLASS_REQUEST_SET_MODE, VENDOR_REQUEST_MICROSOFT, VENDOR_REQUEST_WEBUSB,
};
use crate::context::DeviceContext;
use crate::descriptor::{layout, msos, webusb};

/// Transfer direction, from `bmRequestType` bit 7.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Out,
    In,
}

/// Request type, from `bmRequestType` bits 6..5.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RequestType {
    Standard,
    Class,
    Vendor,
    Reserved,
}

/// Recipient, from `bmRequestType` bits 4..0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Recipient {
    Device,
    Interface,
    Endpoint,
    Other,
    Reserved,
}

/// A decoded SETUP packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Request {
    pub direction: Direction,
    pub request_type: RequestType,
    pub recipient: Recipient,
    pub request: u8,
    pub value: u16,
    pub index: u16,
    pub length: u16,
}

impl Request {
    /// Decodes the eight bytes of a SETUP packet.
    pub fn parse(setup: &[u8; 8]) -> Self {
        let bm = setup[0];
        Self {
            direction: if bm & 0x80 != 0 {
                Direction::In
            } else {
                Direction::Out
            },
            request_type: match (bm >> 5) & 0x03 {
                0 => RequestType::Standard,
                1 => RequestType::Class,
                2 => RequestType::Vendor,
                _ => RequestType::Reserved,
            },
            recipient: match bm & 0x1F {
                0 => Recipient::Device,
                1 => Recipient::Interface,
                2 => Recipient::Endpoint,
                3 => Recipient::Other,
                _ => Recipient::Reserved,
            },
            request: setup[1],
            value: u16::from_le_bytes([setup[2], setup[3]]),
            index: u16::from_le_bytes([setup[4], setup[5]]),
            length: u16::from_le_bytes([setup[6], setup[7]]),
        }
    }
}

/// Control transfer stage the handler is invoked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Stage {
    Setup,
    Data,
    Ack,
}

/// What the USB stack should do with the transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Response {
    /// Send these bytes in the data stage.
    Data(&'static [u8]),
    /// Accept with an empty status stage.
    Ack,
    /// Stall the control endpoint.
    Stall,
}

/// Receiver of the asynchronous events a control request can raise.
pub trait HostSignals {
    /// The host asked to break the running program.
    fn keyboard_interrupt(&self);

    /// The host switched the personality mode.
    fn mode_changed(&self, _mode: i32) {}
}

/// Answers the badge's vendor and class control requests.
pub struct ControlHandler<'a, S> {
    ctx: &'a DeviceContext,
    signals: S,
}

impl<'a, S: HostSignals> ControlHandler<'a, S> {
    pub fn new(ctx: &'a DeviceContext, signals: S) -> Self {
        Self { ctx, signals }
    }

    /// Returns `true` for requests this handler owns: every vendor
    /// request, and class requests addressed to a vendor interface.
    pub fn claims(&self, req: &Request) -> bool {
        match req.request_type {
            RequestType::Vendor => true,
            RequestType::Class => {
                req.recipient == Recipient::Interface && layout::is_vendor_interface(req.index)
            }
            _ => false,
        }
    }

    /// Handles one stage of a control transfer.
    pub fn handle(&mut self, stage: Stage, req: &Request) -> Response {
        // Nothing to inspect in the data and status stages.
        if stage != Stage::Setup {
            return Response::Ack;
        }

        match req.request_type {
            RequestType::Vendor => self.vendor(req),
            RequestType::Class => self.class(req),
            _ => Response::Stall,
        }
    }

    fn vendor(&mut self, req: &Request) -> Response {
        match req.request {
            VENDOR_REQUEST_WEBUSB => data_stage(req, &webusb::LANDING_URL),
            VENDOR_REQUEST_MICROSOFT if req.index == msos::DESCRIPTOR_INDEX => {
                let set: &'static [u8] = &msos::DESCRIPTOR_SET;
                match msos::total_length(set) {
                    Some(len) => data_stage(req, &set[..(len as usize).min(set.len())]),
                    None => Response::Stall,
                }
            }
            _ => {
                #[cfg(feature = "defmt")]
                defmt::debug!("stall vendor request {=u8} index {=u16}", req.request, req.index);
                Response::Stall
            }
        }
    }

    fn class(&mut self, req: &Request) -> Response {
        match req.request {
            CLASS_REQUEST_BREAK => {
                self.signals.keyboard_interrupt();
                Response::Ack
            }
            CLASS_REQUEST_SET_MODE => {
                let mode = self.ctx.apply_host_mode(req.value);
                self.signals.mode_changed(mode);
                Response::Ack
            }
            _ => Response::Stall,
        }
    }
}

/// Data response clipped to the host's `wLength`.
fn data_stage(req: &Request, data: &'static [u8]) -> Response {
    let len = data.len().min(req.length as usize);
    Response::Data(&data[..len])
}
