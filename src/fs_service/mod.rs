//! WebUSB file service on the public vendor channel.
//!
//! Every frame starts with a 12-byte little-endian header:
//!
//! ```text
//! u16 command | u32 payload size | u16 check (0xADDE) | u32 request id
//! ```
//!
//! Replies reuse the request's command and id. Status replies carry the
//! 3-byte body `ok\0` or `er\0`. The session is poll-driven and never
//! blocks: outgoing bytes are staged and pushed out as the transmit FIFO
//! frees up, and nothing new is read until the previous reply is gone.

pub mod volume;

use crate::config::{FS_CHUNK_MAX, FS_MAX_PATH, FS_REPLY_MAX, FS_STREAM_STEP, STARTUP_FILE};
use crate::error::{Error, FrameError};
use crate::relay::{Buffer, Channel, Relay, VendorPort};
use heapless::{String, Vec};
use volume::{normalize, EntryKind, PathBuf, Volume};

pub const HEADER_LEN: usize = 12;
pub const CHECK: u16 = 0xADDE;

const CHANNEL: Channel = Channel::Public;
const STATUS_OK: &[u8; 3] = b"ok\0";
const STATUS_ERR: &[u8; 3] = b"er\0";
const READ_FAILED: &str = "Can't open file";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Header {
    pub command: u16,
    pub size: u32,
    pub check: u16,
    pub id: u32,
}

impl Header {
    pub fn new(command: u16, size: u32, id: u32) -> Self {
        Self {
            command,
            size,
            check: CHECK,
            id,
        }
    }

    pub fn parse(b: &[u8; HEADER_LEN]) -> Self {
        Self {
            command: u16::from_le_bytes([b[0], b[1]]),
            size: u32::from_le_bytes([b[2], b[3], b[4], b[5]]),
            check: u16::from_le_bytes([b[6], b[7]]),
            id: u32::from_le_bytes([b[8], b[9], b[10], b[11]]),
        }
    }

    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut b = [0u8; HEADER_LEN];
        b[0..2].copy_from_slice(&self.command.to_le_bytes());
        b[2..6].copy_from_slice(&self.size.to_le_bytes());
        b[6..8].copy_from_slice(&self.check.to_le_bytes());
        b[8..12].copy_from_slice(&self.id.to_le_bytes());
        b
    }

    pub fn verify(&self) -> Result<(), FrameError> {
        if self.check == CHECK {
            Ok(())
        } else {
            Err(FrameError::BadCheck)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum Command {
    Heartbeat = 1,
    ListDir = 4096,
    ReadFile = 4097,
    WriteFile = 4098,
    Delete = 4099,
    Duplicate = 4100,
    Rename = 4101,
    Mkdir = 4102,
}

impl Command {
    pub fn from_u16(v: u16) -> Option<Self> {
        Some(match v {
            1 => Command::Heartbeat,
            4096 => Command::ListDir,
            4097 => Command::ReadFile,
            4098 => Command::WriteFile,
            4099 => Command::Delete,
            4100 => Command::Duplicate,
            4101 => Command::Rename,
            4102 => Command::Mkdir,
            _ => return None,
        })
    }
}

enum State {
    Idle,
    Payload {
        header: Header,
        command: Command,
        received: usize,
    },
    Skip {
        remaining: usize,
    },
    Stream {
        path: PathBuf,
        offset: usize,
    },
}

/// Upload in progress. The first chunk carries `name\0`.
struct Upload {
    path: Option<PathBuf>,
    failed: bool,
}

/// One file-service conversation over the public channel.
pub struct Session<V> {
    volume: V,
    state: State,
    payload: Vec<u8, FS_CHUNK_MAX>,
    upload: Option<Upload>,
    tx: Vec<u8, FS_REPLY_MAX>,
    tx_pos: usize,
}

impl<V: Volume> Session<V> {
    pub fn new(volume: V) -> Self {
        Self {
            volume,
            state: State::Idle,
            payload: Vec::new(),
            upload: None,
            tx: Vec::new(),
            tx_pos: 0,
        }
    }

    pub fn volume(&mut self) -> &mut V {
        &mut self.volume
    }

    /// Discards whatever the host sent before the service started.
    pub fn start<P: VendorPort>(&mut self, relay: &mut Relay<P>) {
        drain(relay);
        self.state = State::Idle;
        self.tx.clear();
        self.tx_pos = 0;
        #[cfg(feature = "defmt")]
        defmt::info!("file service started");
    }

    /// Advances the session by one step. Returns `true` if any byte moved.
    pub fn poll<P: VendorPort>(&mut self, relay: &mut Relay<P>) -> bool {
        let mut progress = self.flush(relay);
        if self.tx_pos < self.tx.len() {
            return progress;
        }

        match core::mem::replace(&mut self.state, State::Idle) {
            State::Idle => {
                if relay.available(CHANNEL) >= HEADER_LEN {
                    let mut raw = [0u8; HEADER_LEN];
                    read_into(relay, &mut raw);
                    self.begin(relay, Header::parse(&raw));
                    progress = true;
                }
            }
            State::Payload {
                header,
                command,
                received,
            } => {
                progress |= self.receive(relay, header, command, received);
            }
            State::Skip { remaining } => {
                let mut scratch = [0u8; 64];
                let want = remaining.min(scratch.len());
                let n = read_into(relay, &mut scratch[..want]);
                if n < remaining {
                    self.state = State::Skip {
                        remaining: remaining - n,
                    };
                }
                progress |= n > 0;
            }
            State::Stream { path, offset } => {
                self.stream(path, offset);
                progress = true;
            }
        }

        progress | self.flush(relay)
    }

    fn flush<P: VendorPort>(&mut self, relay: &mut Relay<P>) -> bool {
        if self.tx_pos >= self.tx.len() {
            return false;
        }
        let n = relay.send(CHANNEL, &self.tx[self.tx_pos..]);
        self.tx_pos += n;
        n > 0
    }

    fn begin<P: VendorPort>(&mut self, relay: &mut Relay<P>, header: Header) {
        if let Err(_e) = header.verify() {
            #[cfg(feature = "defmt")]
            defmt::warn!("file service: {}, resyncing", _e);
            drain(relay);
            return;
        }
        let size = header.size as usize;
        let Some(command) = Command::from_u16(header.command) else {
            #[cfg(feature = "defmt")]
            defmt::warn!("file service: unknown command {}", header.command);
            if size > 0 {
                self.state = State::Skip { remaining: size };
            }
            return;
        };
        #[cfg(feature = "defmt")]
        defmt::debug!("file service: {} id={} size={}", command, header.id, size);

        self.payload.clear();
        if command == Command::WriteFile {
            self.upload = Some(Upload {
                path: None,
                failed: false,
            });
        } else if size > FS_CHUNK_MAX {
            self.status(&header, false);
            self.state = State::Skip { remaining: size };
            return;
        }

        if size == 0 {
            self.complete(&header, command);
        } else {
            self.state = State::Payload {
                header,
                command,
                received: 0,
            };
        }
    }

    fn receive<P: VendorPort>(
        &mut self,
        relay: &mut Relay<P>,
        header: Header,
        command: Command,
        mut received: usize,
    ) -> bool {
        let size = header.size as usize;
        let room = FS_CHUNK_MAX - self.payload.len();
        let mut scratch = [0u8; 64];
        let want = room.min(size - received).min(scratch.len());
        let n = read_into(relay, &mut scratch[..want]);
        // `want` never exceeds the free capacity.
        let _ = self.payload.extend_from_slice(&scratch[..n]);
        received += n;

        let done = received == size;
        if command == Command::WriteFile {
            if done || self.payload.is_full() {
                self.upload_chunk(&header, done);
            }
        } else if done {
            self.complete(&header, command);
        }

        if !done {
            self.state = State::Payload {
                header,
                command,
                received,
            };
        }
        n > 0
    }

    /// Runs a command whose whole payload is buffered.
    fn complete(&mut self, header: &Header, command: Command) {
        match command {
            Command::Heartbeat => self.status(header, true),
            Command::ListDir => self.list_dir(header),
            Command::ReadFile => self.read_file(header),
            Command::WriteFile => self.upload_chunk(header, true),
            Command::Delete => {
                let ok = normalize(&self.payload).and_then(|p| self.volume.remove(&p));
                self.status(header, ok.is_ok());
            }
            Command::Mkdir => {
                let ok = normalize(&self.payload).and_then(|p| self.volume.mkdir(&p));
                self.status(header, ok.is_ok());
            }
            Command::Duplicate => {
                let ok = self.path_pair().and_then(|(from, to)| self.copy(&from, &to));
                self.status(header, ok.is_ok());
            }
            Command::Rename => {
                let ok = self
                    .path_pair()
                    .and_then(|(from, to)| self.volume.rename(&from, &to));
                self.status(header, ok.is_ok());
            }
        }
    }

    fn list_dir(&mut self, header: &Header) {
        // Sizes up to 2 cover "", "/" and "/\0".
        let dir = if header.size <= 2 {
            normalize(b"")
        } else {
            normalize(&self.payload)
        };
        let listing = dir.and_then(|d| Ok((self.volume.list(&d)?, d)));
        let Ok((entries, dir)) = listing else {
            self.status(header, false);
            return;
        };

        self.begin_reply(header);
        let mut fits = self.tx.extend_from_slice(dir.as_bytes()).is_ok();
        for e in &entries {
            let tag = match e.kind {
                EntryKind::Dir => b'd',
                EntryKind::File => b'f',
            };
            fits &= self.tx.extend_from_slice(&[b'\n', tag]).is_ok()
                && self.tx.extend_from_slice(e.name.as_bytes()).is_ok();
        }
        if fits {
            self.finish_reply();
        } else {
            self.status(header, false);
        }
    }

    fn read_file(&mut self, header: &Header) {
        let target = normalize(&self.payload)
            .and_then(|p| Ok((self.volume.size(&p)?, p)));
        match target {
            Ok((size, path)) => {
                self.begin_reply(header);
                self.tx[2..6].copy_from_slice(&(size as u32).to_le_bytes());
                if size > 0 {
                    self.state = State::Stream { path, offset: 0 };
                }
            }
            Err(_) => self.text(header, READ_FAILED),
        }
    }

    fn stream(&mut self, path: PathBuf, offset: usize) {
        let mut step = [0u8; FS_STREAM_STEP];
        let n = self.volume.read(&path, offset, &mut step).unwrap_or(0);
        self.tx.clear();
        self.tx_pos = 0;
        // FS_STREAM_STEP is far below the staging capacity.
        let _ = self.tx.extend_from_slice(&step[..n]);
        if n > 0 {
            self.state = State::Stream {
                path,
                offset: offset + n,
            };
        }
    }

    fn upload_chunk(&mut self, header: &Header, last: bool) {
        let mut up = self.upload.take().unwrap_or(Upload {
            path: None,
            failed: false,
        });
        if !up.failed {
            let result = match &up.path {
                Some(path) => self.volume.append(path, &self.payload),
                None => self.open_upload(&mut up),
            };
            up.failed = result.is_err();
        }
        self.payload.clear();

        if last {
            #[cfg(feature = "defmt")]
            defmt::debug!("file service: upload done, failed={}", up.failed);
            self.status(header, !up.failed);
        } else {
            self.upload = Some(up);
        }
    }

    fn open_upload(&mut self, up: &mut Upload) -> Result<(), Error> {
        let split = self.payload.iter().position(|&b| b == 0).ok_or(Error::Volume)?;
        let path = normalize(&self.payload[..split])?;
        self.volume.create(&path)?;
        self.volume.append(&path, &self.payload[split + 1..])?;
        up.path = Some(path);
        Ok(())
    }

    /// `source\0dest`, split at the first NUL.
    fn path_pair(&self) -> Result<(PathBuf, PathBuf), Error> {
        let split = self.payload.iter().position(|&b| b == 0).ok_or(Error::Volume)?;
        let from = normalize(&self.payload[..split])?;
        let to = normalize(&self.payload[split + 1..])?;
        if from == "/" || to == "/" {
            return Err(Error::Volume);
        }
        Ok((from, to))
    }

    fn copy(&mut self, from: &str, to: &str) -> Result<(), Error> {
        if self.volume.kind(from) != Some(EntryKind::File) {
            return Err(Error::Volume);
        }
        self.volume.create(to)?;
        let mut step = [0u8; FS_STREAM_STEP];
        let mut offset = 0;
        loop {
            let n = self.volume.read(from, offset, &mut step)?;
            if n == 0 {
                return Ok(());
            }
            self.volume.append(to, &step[..n])?;
            offset += n;
        }
    }

    fn begin_reply(&mut self, header: &Header) {
        self.tx.clear();
        self.tx_pos = 0;
        let reply = Header::new(header.command, 0, header.id);
        // Staging always holds a header.
        let _ = self.tx.extend_from_slice(&reply.encode());
    }

    fn finish_reply(&mut self) {
        let size = (self.tx.len() - HEADER_LEN) as u32;
        self.tx[2..6].copy_from_slice(&size.to_le_bytes());
    }

    fn status(&mut self, header: &Header, ok: bool) {
        self.begin_reply(header);
        let _ = self
            .tx
            .extend_from_slice(if ok { STATUS_OK } else { STATUS_ERR });
        self.finish_reply();
    }

    fn text(&mut self, header: &Header, body: &str) {
        self.begin_reply(header);
        let _ = self.tx.extend_from_slice(body.as_bytes());
        self.finish_reply();
    }
}

fn read_into<P: VendorPort>(relay: &mut Relay<P>, buf: &mut [u8]) -> usize {
    relay.read(CHANNEL, Buffer::Writable(buf)).unwrap_or(0)
}

fn drain<P: VendorPort>(relay: &mut Relay<P>) {
    let mut scratch = [0u8; 64];
    while read_into(relay, &mut scratch) > 0 {}
}

/// Reads and deletes the one-shot startup file naming the module to
/// launch. `None` when there is no usable startup file, or when it
/// cannot be deleted.
pub fn take_startup_module<V: Volume>(volume: &mut V) -> Option<String<FS_MAX_PATH>> {
    let mut buf = [0u8; FS_MAX_PATH];
    let n = volume.read(STARTUP_FILE, 0, &mut buf).ok()?;
    if let Err(_e) = volume.remove(STARTUP_FILE) {
        #[cfg(feature = "defmt")]
        defmt::warn!("startup file not removed: {}", _e);
        return None;
    }
    let name = core::str::from_utf8(&buf[..n]).ok()?.trim();
    if name.is_empty() {
        return None;
    }
    String::try_from(name).ok()
}
