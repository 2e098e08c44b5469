//! Line console on the CDC port.
//!
//! A line reads `module.function arg...`. Arguments are integers
//! (decimal, `0x` hex, optionally negative), `"quoted"` strings and
//! `#hex` byte strings (both read-only buffers), or `buf:N` for an
//! N-byte writable buffer. The reply is the integer result, then the hex
//! of each writable buffer's first `result` bytes, or the error message.

use crate::bindings::{self, Bindings, Value};
use crate::config::{CONSOLE_LINE_MAX, CONSOLE_MAX_ARGS, CONSOLE_REPLY_MAX, CONSOLE_SCRATCH_MAX};
use crate::error::{ArgError, Error};
use crate::hid::ReportSink;
use crate::relay::VendorPort;
use core::fmt::Write;
use core::num::IntErrorKind;
use heapless::{String, Vec};

pub type Reply = String<CONSOLE_REPLY_MAX>;

const CTRL_C: u8 = 0x03;
const BACKSPACE: u8 = 0x08;
const DELETE: u8 = 0x7F;

/// What one received byte did to the line being edited.
#[derive(Debug, PartialEq, Eq)]
pub enum Feed {
    Pending,
    Line(String<CONSOLE_LINE_MAX>),
    Interrupt,
}

/// Accumulates CDC bytes into lines.
#[derive(Default)]
pub struct LineEditor {
    line: String<CONSOLE_LINE_MAX>,
    overflow: bool,
}

impl LineEditor {
    pub const fn new() -> Self {
        Self {
            line: String::new(),
            overflow: false,
        }
    }

    pub fn feed(&mut self, byte: u8) -> Feed {
        match byte {
            b'\r' | b'\n' => {
                let line = core::mem::take(&mut self.line);
                if core::mem::take(&mut self.overflow) {
                    // Too long to run; drop it.
                    return Feed::Pending;
                }
                if line.trim().is_empty() {
                    Feed::Pending
                } else {
                    Feed::Line(line)
                }
            }
            CTRL_C => {
                self.line.clear();
                self.overflow = false;
                Feed::Interrupt
            }
            BACKSPACE | DELETE => {
                self.line.pop();
                Feed::Pending
            }
            0x20..=0x7E => {
                if self.line.push(byte as char).is_err() {
                    self.overflow = true;
                }
                Feed::Pending
            }
            _ => Feed::Pending,
        }
    }
}

enum Arg {
    Int(i32),
    Bytes(Vec<u8, CONSOLE_SCRATCH_MAX>),
    Buffer(Vec<u8, CONSOLE_SCRATCH_MAX>),
}

struct Call<'l> {
    module: &'l str,
    function: &'l str,
    args: Vec<Arg, CONSOLE_MAX_ARGS>,
    /// Arguments on the line, including any beyond `args`' capacity.
    given: usize,
}

fn parse(line: &str) -> Result<Call<'_>, Error> {
    let mut rest = line.trim();
    let (target, tail) = rest.split_once(' ').unwrap_or((rest, ""));
    let (module, function) = target.split_once('.').ok_or(Error::Syntax)?;
    if module.is_empty() || function.is_empty() {
        return Err(Error::Syntax);
    }
    rest = tail;

    let mut args = Vec::new();
    let mut given = 0;
    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }
        let (arg, tail) = parse_arg(rest)?;
        // Extra arguments are only counted.
        let _ = args.push(arg);
        given += 1;
        rest = tail;
    }
    Ok(Call {
        module,
        function,
        args,
        given,
    })
}

fn parse_arg(s: &str) -> Result<(Arg, &str), Error> {
    if let Some(body) = s.strip_prefix('"') {
        let end = body.find('"').ok_or(Error::Syntax)?;
        let bytes = Vec::from_slice(body[..end].as_bytes()).map_err(|_| Error::BufferOverflow)?;
        return Ok((Arg::Bytes(bytes), &body[end + 1..]));
    }

    let (token, tail) = s.split_once(' ').unwrap_or((s, ""));
    let arg = if let Some(hex) = token.strip_prefix('#') {
        Arg::Bytes(parse_hex(hex)?)
    } else if let Some(len) = token.strip_prefix("buf:") {
        let len: usize = len.parse().map_err(|_| Error::Syntax)?;
        let mut buf = Vec::new();
        buf.resize(len, 0).map_err(|_| Error::BufferOverflow)?;
        Arg::Buffer(buf)
    } else {
        Arg::Int(parse_int(token)?)
    };
    Ok((arg, tail))
}

fn parse_int(token: &str) -> Result<i32, Error> {
    let (negative, digits) = match token.strip_prefix('-') {
        Some(d) => (true, d),
        None => (false, token),
    };
    let magnitude = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16),
        None => digits.parse::<i64>(),
    }
    .map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => Error::from(ArgError::Overflow),
        _ => Error::Syntax,
    })?;
    let value = if negative { magnitude.checked_neg() } else { Some(magnitude) };
    value
        .and_then(|v| i32::try_from(v).ok())
        .ok_or(ArgError::Overflow.into())
}

fn parse_hex(hex: &str) -> Result<Vec<u8, CONSOLE_SCRATCH_MAX>, Error> {
    if hex.len() % 2 != 0 {
        return Err(Error::Syntax);
    }
    let mut out = Vec::new();
    for pair in hex.as_bytes().chunks(2) {
        let pair = core::str::from_utf8(pair).map_err(|_| Error::Syntax)?;
        let b = u8::from_str_radix(pair, 16).map_err(|_| Error::Syntax)?;
        out.push(b).map_err(|_| Error::BufferOverflow)?;
    }
    Ok(out)
}

/// Runs one console line and renders the reply.
pub fn execute<S: ReportSink, P: VendorPort>(
    bindings: &mut Bindings<'_, S, P>,
    line: &str,
) -> Reply {
    let mut reply = Reply::new();
    let result = parse(line).and_then(|mut call| {
        if call.given > call.args.len() {
            bindings::check_arity(call.module, call.function, call.given)?;
            return Err(Error::Syntax);
        }
        let rc = {
            let mut values: Vec<Value<'_>, CONSOLE_MAX_ARGS> = Vec::new();
            for arg in call.args.iter_mut() {
                let v = match arg {
                    Arg::Int(i) => Value::Int(*i),
                    Arg::Bytes(b) => Value::Bytes(b.as_slice()),
                    Arg::Buffer(b) => Value::Buffer(b.as_mut_slice()),
                };
                // Same capacity as `call.args`.
                let _ = values.push(v);
            }
            bindings.call(call.module, call.function, &mut values)?
        };
        Ok((rc, call.args))
    });

    // Overflow only truncates the reply.
    match result {
        Ok((rc, args)) => {
            let _ = write!(reply, "{}", rc);
            let filled = usize::try_from(rc).unwrap_or(0);
            for arg in args.iter().filter(|_| filled > 0) {
                if let Arg::Buffer(b) = arg {
                    let _ = reply.push(' ');
                    for byte in &b[..filled.min(b.len())] {
                        let _ = write!(reply, "{:02x}", byte);
                    }
                }
            }
        }
        Err(e) => {
            let _ = write!(reply, "{}", e);
        }
    }
    reply
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DeviceContext;
    use crate::hid::HidReport;
    use crate::relay::{Channel, FifoPort};

    #[derive(Default)]
    struct Collect(std::vec::Vec<HidReport>);

    impl ReportSink for Collect {
        fn submit(&mut self, report: HidReport) {
            self.0.push(report);
        }
    }

    fn feed_str(ed: &mut LineEditor, s: &str) -> std::vec::Vec<Feed> {
        s.bytes()
            .map(|b| ed.feed(b))
            .filter(|f| *f != Feed::Pending)
            .collect()
    }

    #[test]
    fn editor_splits_lines() {
        let mut ed = LineEditor::new();
        let out = feed_str(&mut ed, "webusb.mode\r\n\nhid.mouse 1 2 3 4 5\n");
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], Feed::Line(String::try_from("webusb.mode").unwrap()));
    }

    #[test]
    fn editor_backspace_and_interrupt() {
        let mut ed = LineEditor::new();
        assert_eq!(
            feed_str(&mut ed, "abx\x08c\n"),
            [Feed::Line(String::try_from("abc").unwrap())]
        );
        assert_eq!(feed_str(&mut ed, "junk\x03"), [Feed::Interrupt]);
        assert!(feed_str(&mut ed, "\n").is_empty());
    }

    #[test]
    fn editor_drops_overlong_line() {
        let mut ed = LineEditor::new();
        let long = "a".repeat(CONSOLE_LINE_MAX + 5);
        assert!(feed_str(&mut ed, &long).is_empty());
        assert!(feed_str(&mut ed, "\n").is_empty());
        assert_eq!(feed_str(&mut ed, "x.y\n").len(), 1);
    }

    #[test]
    fn integers() {
        assert_eq!(parse_int("42"), Ok(42));
        assert_eq!(parse_int("-7"), Ok(-7));
        assert_eq!(parse_int("0x1F"), Ok(31));
        assert_eq!(parse_int("-0x10"), Ok(-16));
        assert_eq!(parse_int("0x7FFFFFFF"), Ok(i32::MAX));
        assert_eq!(parse_int("-0x80000000"), Ok(i32::MIN));
        assert_eq!(parse_int("zz"), Err(Error::Syntax));
        assert_eq!(parse_int("-"), Err(Error::Syntax));
    }

    #[test]
    fn out_of_range_integers_overflow() {
        let overflow = Err(Error::Arg(ArgError::Overflow));
        assert_eq!(parse_int("0xFFFFFFFF"), overflow);
        assert_eq!(parse_int("2147483648"), overflow);
        assert_eq!(parse_int("-2147483649"), overflow);
        assert_eq!(parse_int("99999999999999999999"), overflow);
        assert_eq!(parse_int("0x10000000000000000"), overflow);
        assert_eq!(parse_int("--9223372036854775808"), overflow);
    }

    #[test]
    fn hex_bytes() {
        assert_eq!(parse_hex("04050a").unwrap(), [4, 5, 10]);
        assert_eq!(parse_hex("abc"), Err(Error::Syntax));
        assert_eq!(parse_hex("zz"), Err(Error::Syntax));
    }

    #[test]
    fn syntax_errors() {
        assert!(matches!(parse("nodot"), Err(Error::Syntax)));
        assert!(matches!(parse(".x"), Err(Error::Syntax)));
        assert!(matches!(parse("a.b \"open"), Err(Error::Syntax)));
        assert!(matches!(parse("a.b buf:65"), Err(Error::BufferOverflow)));
    }

    #[test]
    fn extra_arguments_are_counted() {
        let call = parse("a.b 1 2 3 4 5 6 7 8").unwrap();
        assert_eq!(call.args.len(), CONSOLE_MAX_ARGS);
        assert_eq!(call.given, 8);
    }

    #[test]
    fn too_many_arguments_is_an_arity_error() {
        let ctx = DeviceContext::new();
        let mut sink = Collect::default();
        let mut port = FifoPort::<16>::new();
        {
            let mut b = Bindings::new(&ctx, &mut sink, &mut port);
            assert_eq!(
                execute(&mut b, "hid.mouse 1 2 3 4 5 6 7").as_str(),
                "TypeError: Needs args button, x, y, horizontal, vertical"
            );
            assert_eq!(
                execute(&mut b, "webusb.setmode 1 2 3 4 5 6 7").as_str(),
                "TypeError: function takes 1 positional arguments but 7 were given"
            );
            assert_eq!(
                execute(&mut b, "webusb.nothing 1 2 3 4 5 6 7").as_str(),
                "AttributeError: module has no such attribute"
            );
        }
        assert!(sink.0.is_empty());
        assert_eq!(ctx.mode(), 0);
    }

    #[test]
    fn out_of_range_argument_changes_nothing() {
        let ctx = DeviceContext::new();
        let mut sink = Collect::default();
        let mut port = FifoPort::<16>::new();
        {
            let mut b = Bindings::new(&ctx, &mut sink, &mut port);
            for line in ["webusb.setmode 99999999999", "webusb.setmode 0x100000007"] {
                assert_eq!(
                    execute(&mut b, line).as_str(),
                    "OverflowError: overflow converting long int to machine word"
                );
            }
        }
        assert!(sink.0.is_empty());
        assert_eq!(ctx.mode(), 0);
    }

    #[test]
    fn quoted_string_keeps_spaces() {
        let call = parse("webusb.send \"a b\" 3").unwrap();
        assert_eq!((call.module, call.function), ("webusb", "send"));
        assert_eq!(call.args.len(), 2);
        assert!(matches!(&call.args[0], Arg::Bytes(b) if b.as_slice() == b"a b"));
        assert!(matches!(call.args[1], Arg::Int(3)));
    }

    #[test]
    fn runs_calls_and_renders_replies() {
        let ctx = DeviceContext::new();
        let mut sink = Collect::default();
        let mut port = FifoPort::<16>::new();
        port.host_write(Channel::Public, b"\x01\x02\xff");
        {
            let mut b = Bindings::new(&ctx, &mut sink, &mut port);
            assert_eq!(execute(&mut b, "webusb.setmode 1").as_str(), "1");
            assert_eq!(execute(&mut b, "webusb.mode").as_str(), "1");
            assert_eq!(execute(&mut b, "webusb.read buf:4").as_str(), "3 0102ff");
            assert_eq!(execute(&mut b, "webusb.read buf:4").as_str(), "0");
            assert_eq!(execute(&mut b, "webusb.send \"hi\"").as_str(), "2");
            assert_eq!(execute(&mut b, "hid.keyboard 2 #04").as_str(), "0");
            assert_eq!(
                execute(&mut b, "hid.mouse 1 2 3 4").as_str(),
                "TypeError: Needs args button, x, y, horizontal, vertical"
            );
            assert_eq!(
                execute(&mut b, "hid.keyboard 0 5").as_str(),
                "TypeError: object with buffer protocol required"
            );
            assert_eq!(execute(&mut b, "nodot").as_str(), "SyntaxError: invalid syntax");
        }
        assert_eq!(sink.0.len(), 1);
        assert_eq!(ctx.mode(), 1);
    }
}
