//! Scripting surface: the `hid` and `webusb` modules.
//!
//! Every call checks its arguments before touching USB state, so a
//! malformed call has no side effects.

use crate::context::DeviceContext;
use crate::error::{ArgError, Error};
use crate::hid::{HidInjector, ReportSink};
use crate::relay::{Buffer, Channel, Relay, VendorPort};

/// A scripting argument.
#[derive(Debug)]
pub enum Value<'v> {
    Int(i32),
    /// Read-only bytes, e.g. a string literal.
    Bytes(&'v [u8]),
    /// A writable buffer.
    Buffer(&'v mut [u8]),
    None,
}

impl Value<'_> {
    fn int(&self) -> Result<i32, Error> {
        match self {
            Value::Int(v) => Ok(*v),
            _ => Err(ArgError::NotInt.into()),
        }
    }

    fn bytes(&self) -> Result<&[u8], Error> {
        match self {
            Value::Bytes(b) => Ok(*b),
            Value::Buffer(b) => Ok(&**b),
            _ => Err(ArgError::NotBuffer.into()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Module {
    Hid,
    WebUsb,
}

impl Module {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "hid" => Some(Module::Hid),
            "webusb" => Some(Module::WebUsb),
            _ => None,
        }
    }

    fn table(self) -> &'static [Entry] {
        match self {
            Module::Hid => HID,
            Module::WebUsb => WEBUSB,
        }
    }
}

#[derive(Clone, Copy)]
enum Op {
    Keyboard,
    Mouse,
    Mode,
    SetMode,
    Available(Channel),
    WriteAvailable(Channel),
    Send(Channel),
    Read(Channel),
}

struct Entry {
    name: &'static str,
    arity: u8,
    op: Op,
}

impl Entry {
    fn check_count(&self, given: usize) -> Result<(), Error> {
        if given == usize::from(self.arity) {
            return Ok(());
        }
        Err(match self.op {
            Op::Mouse => ArgError::MouseFields.into(),
            _ => ArgError::Count {
                expected: self.arity,
                given: u8::try_from(given).unwrap_or(u8::MAX),
            }
            .into(),
        })
    }
}

const fn entry(name: &'static str, arity: u8, op: Op) -> Entry {
    Entry { name, arity, op }
}

const HID: &[Entry] = &[entry("keyboard", 2, Op::Keyboard), entry("mouse", 5, Op::Mouse)];

const WEBUSB: &[Entry] = &[
    entry("mode", 0, Op::Mode),
    entry("setmode", 1, Op::SetMode),
    entry("available", 0, Op::Available(Channel::Public)),
    entry("write_available", 0, Op::WriteAvailable(Channel::Public)),
    entry("send", 1, Op::Send(Channel::Public)),
    entry("read", 1, Op::Read(Channel::Public)),
    entry("secretavailable", 0, Op::Available(Channel::Secret)),
    entry("secretwrite_available", 0, Op::WriteAvailable(Channel::Secret)),
    entry("secretsend", 1, Op::Send(Channel::Secret)),
    entry("secretread", 1, Op::Read(Channel::Secret)),
];

fn lookup(module: &str, function: &str) -> Result<&'static Entry, Error> {
    let module = Module::from_name(module).ok_or(Error::NoSuchModule)?;
    module
        .table()
        .iter()
        .find(|e| e.name == function)
        .ok_or(Error::NoSuchFunction)
}

/// Checks that `module.function` exists and takes `given` arguments.
pub fn check_arity(module: &str, function: &str, given: usize) -> Result<(), Error> {
    lookup(module, function)?.check_count(given)
}

/// Names of a module's functions, in table order.
#[cfg(test)]
pub fn functions(module: Module) -> impl Iterator<Item = &'static str> {
    module.table().iter().map(|e| e.name)
}

pub struct Bindings<'a, S, P> {
    ctx: &'a DeviceContext,
    hid: HidInjector<S>,
    relay: Relay<P>,
}

impl<'a, S: ReportSink, P: VendorPort> Bindings<'a, S, P> {
    pub fn new(ctx: &'a DeviceContext, sink: S, port: P) -> Self {
        Self {
            ctx,
            hid: HidInjector::new(sink),
            relay: Relay::new(port),
        }
    }

    pub fn relay(&mut self) -> &mut Relay<P> {
        &mut self.relay
    }

    /// Calls `module.function(args...)`.
    pub fn call(
        &mut self,
        module: &str,
        function: &str,
        args: &mut [Value<'_>],
    ) -> Result<i32, Error> {
        let entry = lookup(module, function)?;
        entry.check_count(args.len())?;

        match entry.op {
            Op::Keyboard => {
                let modifiers = args[0].int()? as u8;
                let keys = args[1].bytes()?;
                Ok(self.hid.keyboard(modifiers, keys))
            }
            Op::Mouse => {
                let mut f = [0i32; 5];
                for (slot, arg) in f.iter_mut().zip(args.iter()) {
                    *slot = arg.int()?;
                }
                let [button, x, y, h, v] = f;
                Ok(self.hid.mouse(button as u8, x as i8, y as i8, h as i8, v as i8))
            }
            Op::Mode => Ok(self.ctx.mode()),
            Op::SetMode => Ok(self.ctx.set_mode(args[0].int()?)),
            Op::Available(ch) => Ok(self.relay.available(ch) as i32),
            Op::WriteAvailable(ch) => Ok(self.relay.write_available(ch) as i32),
            Op::Send(ch) => {
                let data = args[0].bytes()?;
                Ok(self.relay.send(ch, data) as i32)
            }
            Op::Read(ch) => {
                let buf = match &mut args[0] {
                    Value::Buffer(b) => Buffer::Writable(&mut **b),
                    Value::Bytes(b) => Buffer::ReadOnly(*b),
                    _ if self.relay.available(ch) == 0 => return Ok(0),
                    _ => return Err(ArgError::NotBuffer.into()),
                };
                self.relay.read(ch, buf).map(|n| n as i32)
            }
        }
    }
}
