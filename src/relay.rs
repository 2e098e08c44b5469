//! Byte relay between scripts and the three vendor interfaces.
//!
//! Each vendor interface is a channel with its own receive and transmit
//! FIFO. Script-side calls never block: writes are short when the
//! transmit FIFO is nearly full and reads take only what has arrived.

use crate::error::{ArgError, Error};
use heapless::Deque;

/// Vendor channel selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    /// Interface 2, the WebUSB serial link.
    Uart = 0,
    /// Interface 3, used by the file service.
    Public = 1,
    /// Interface 4, reserved for application secrets.
    Secret = 2,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Uart, Channel::Public, Channel::Secret];

    pub fn index(self) -> usize {
        self as usize
    }

    #[cfg(test)]
    pub fn from_index(i: usize) -> Option<Self> {
        Self::ALL.get(i).copied()
    }
}

/// FIFO access for the vendor channels.
pub trait VendorPort {
    /// Bytes waiting in the receive FIFO.
    fn available(&self, ch: Channel) -> usize;
    /// Free space in the transmit FIFO.
    fn write_available(&self, ch: Channel) -> usize;
    /// Moves up to `buf.len()` received bytes into `buf`.
    fn read(&mut self, ch: Channel, buf: &mut [u8]) -> usize;
    /// Queues as many bytes of `data` as fit; returns the count queued.
    fn write(&mut self, ch: Channel, data: &[u8]) -> usize;
    /// Pushes queued transmit data towards the host.
    fn flush(&mut self, _ch: Channel) {}
}

impl<P: VendorPort + ?Sized> VendorPort for &mut P {
    fn available(&self, ch: Channel) -> usize {
        (**self).available(ch)
    }
    fn write_available(&self, ch: Channel) -> usize {
        (**self).write_available(ch)
    }
    fn read(&mut self, ch: Channel, buf: &mut [u8]) -> usize {
        (**self).read(ch, buf)
    }
    fn write(&mut self, ch: Channel, data: &[u8]) -> usize {
        (**self).write(ch, data)
    }
    fn flush(&mut self, ch: Channel) {
        (**self).flush(ch)
    }
}

/// A byte buffer argument handed over from a script.
#[derive(Debug)]
pub enum Buffer<'b> {
    ReadOnly(&'b [u8]),
    Writable(&'b mut [u8]),
}

/// The `available` / `write_available` / `send` / `read` family of
/// operations, parameterized by channel.
pub struct Relay<P> {
    port: P,
}

impl<P: VendorPort> Relay<P> {
    pub fn new(port: P) -> Self {
        Self { port }
    }

    pub fn port(&mut self) -> &mut P {
        &mut self.port
    }

    pub fn available(&self, ch: Channel) -> usize {
        self.port.available(ch)
    }

    pub fn write_available(&self, ch: Channel) -> usize {
        self.port.write_available(ch)
    }

    /// Queues the largest prefix of `data` that fits and flushes.
    /// Returns the number of bytes accepted.
    pub fn send(&mut self, ch: Channel, data: &[u8]) -> usize {
        let n = data.len().min(self.port.write_available(ch));
        let n = self.port.write(ch, &data[..n]);
        self.port.flush(ch);
        #[cfg(feature = "defmt")]
        defmt::trace!("relay {}: sent {}/{}", ch, n, data.len());
        n
    }

    /// Fills a writable buffer from the receive FIFO.
    ///
    /// An empty channel returns 0 before the argument is looked at, so
    /// a read-only buffer only fails once data is waiting.
    pub fn read(&mut self, ch: Channel, buf: Buffer<'_>) -> Result<usize, Error> {
        if self.port.available(ch) == 0 {
            return Ok(0);
        }
        match buf {
            Buffer::Writable(b) => Ok(self.port.read(ch, b)),
            Buffer::ReadOnly(_) => Err(ArgError::ReadOnlyBuffer.into()),
        }
    }
}

/// In-memory receive/transmit FIFO pair for each channel.
///
/// On the device the USB pump tasks drain `tx` with [`FifoPort::host_read`]
/// and fill `rx` with [`FifoPort::host_write`]; host-side tests drive the
/// same calls by hand.
pub struct FifoPort<const N: usize> {
    rx: [Deque<u8, N>; 3],
    tx: [Deque<u8, N>; 3],
}

impl<const N: usize> FifoPort<N> {
    pub const fn new() -> Self {
        Self {
            rx: [Deque::new(), Deque::new(), Deque::new()],
            tx: [Deque::new(), Deque::new(), Deque::new()],
        }
    }

    /// Bytes arriving from the host. Returns how many fit.
    pub fn host_write(&mut self, ch: Channel, data: &[u8]) -> usize {
        push_all(&mut self.rx[ch.index()], data)
    }

    /// Free space for bytes arriving from the host.
    #[cfg(test)]
    pub fn host_space(&self, ch: Channel) -> usize {
        let q = &self.rx[ch.index()];
        q.capacity() - q.len()
    }

    /// Bytes leaving for the host.
    pub fn host_read(&mut self, ch: Channel, buf: &mut [u8]) -> usize {
        pop_into(&mut self.tx[ch.index()], buf)
    }

    /// Bytes queued for the host.
    pub fn host_pending(&self, ch: Channel) -> usize {
        self.tx[ch.index()].len()
    }
}

impl<const N: usize> Default for FifoPort<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> VendorPort for FifoPort<N> {
    fn available(&self, ch: Channel) -> usize {
        self.rx[ch.index()].len()
    }

    fn write_available(&self, ch: Channel) -> usize {
        let q = &self.tx[ch.index()];
        q.capacity() - q.len()
    }

    fn read(&mut self, ch: Channel, buf: &mut [u8]) -> usize {
        pop_into(&mut self.rx[ch.index()], buf)
    }

    fn write(&mut self, ch: Channel, data: &[u8]) -> usize {
        push_all(&mut self.tx[ch.index()], data)
    }
}

fn push_all<const N: usize>(q: &mut Deque<u8, N>, data: &[u8]) -> usize {
    let mut n = 0;
    for &b in data {
        if q.push_back(b).is_err() {
            break;
        }
        n += 1;
    }
    n
}

fn pop_into<const N: usize>(q: &mut Deque<u8, N>, buf: &mut [u8]) -> usize {
    let mut n = 0;
    for slot in buf.iter_mut() {
        match q.pop_front() {
            Some(b) => *slot = b,
            None => break,
        }
        n += 1;
    }
    n
}

#[cfg(test)]
mod tests {
    use super::*;

    type Port = FifoPort<8>;

    #[test]
    fn channel_indices() {
        assert_eq!(Channel::Uart.index(), 0);
        assert_eq!(Channel::Secret.index(), 2);
        assert_eq!(Channel::from_index(1), Some(Channel::Public));
        assert_eq!(Channel::from_index(3), None);
    }

    #[test]
    fn send_is_short_when_fifo_nearly_full() {
        let mut relay = Relay::new(Port::new());
        assert_eq!(relay.send(Channel::Uart, b"hello"), 5);
        assert_eq!(relay.write_available(Channel::Uart), 3);
        assert_eq!(relay.send(Channel::Uart, b"world"), 3);
        assert_eq!(relay.write_available(Channel::Uart), 0);
        assert_eq!(relay.send(Channel::Uart, b"!"), 0);

        let mut out = [0u8; 8];
        assert_eq!(relay.port().host_read(Channel::Uart, &mut out), 8);
        assert_eq!(&out, b"hellowor");
    }

    #[test]
    fn send_empty_returns_zero() {
        let mut relay = Relay::new(Port::new());
        assert_eq!(relay.send(Channel::Public, b""), 0);
    }

    #[test]
    fn empty_read_leaves_buffer_untouched() {
        let mut relay = Relay::new(Port::new());
        let mut buf = [0xAAu8; 4];
        assert_eq!(relay.read(Channel::Public, Buffer::Writable(&mut buf)), Ok(0));
        assert_eq!(buf, [0xAA; 4]);
    }

    #[test]
    fn read_takes_what_has_arrived() {
        let mut relay = Relay::new(Port::new());
        relay.port().host_write(Channel::Public, b"abc");
        assert_eq!(relay.available(Channel::Public), 3);

        let mut buf = [0u8; 2];
        assert_eq!(relay.read(Channel::Public, Buffer::Writable(&mut buf)), Ok(2));
        assert_eq!(&buf, b"ab");
        assert_eq!(relay.available(Channel::Public), 1);
    }

    #[test]
    fn read_only_buffer_rejected_once_data_waits() {
        let mut relay = Relay::new(Port::new());
        assert_eq!(relay.read(Channel::Uart, Buffer::ReadOnly(b"xx")), Ok(0));
        relay.port().host_write(Channel::Uart, b"z");
        assert_eq!(
            relay.read(Channel::Uart, Buffer::ReadOnly(b"xx")),
            Err(Error::Arg(ArgError::ReadOnlyBuffer))
        );
        assert_eq!(relay.available(Channel::Uart), 1);
    }

    #[test]
    fn channels_are_isolated() {
        let mut relay = Relay::new(Port::new());
        relay.port().host_write(Channel::Secret, b"key");
        assert_eq!(relay.available(Channel::Secret), 3);
        assert_eq!(relay.available(Channel::Public), 0);
        assert_eq!(relay.available(Channel::Uart), 0);

        let mut buf = [0u8; 3];
        assert_eq!(relay.read(Channel::Public, Buffer::Writable(&mut buf)), Ok(0));
        assert_eq!(relay.read(Channel::Secret, Buffer::Writable(&mut buf)), Ok(3));
        assert_eq!(&buf, b"key");

        relay.send(Channel::Secret, b"s");
        assert_eq!(relay.port().host_pending(Channel::Secret), 1);
        assert_eq!(relay.port().host_pending(Channel::Uart), 0);
    }

    #[test]
    fn host_write_is_short_when_rx_full() {
        let mut port = Port::new();
        assert_eq!(port.host_write(Channel::Uart, b"0123456789"), 8);
        assert_eq!(port.host_space(Channel::Uart), 0);
    }
}
