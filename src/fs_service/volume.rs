//! Storage behind the file service.
//!
//! Paths are absolute and `/`-separated. Stray NUL bytes coming off the
//! wire are stripped before a path reaches a [`Volume`].

use crate::config::{FS_MAX_ENTRIES, FS_MAX_FILE_SIZE, FS_MAX_PATH};
use crate::error::Error;
use heapless::{String, Vec};

pub type PathBuf = String<FS_MAX_PATH>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EntryKind {
    File,
    Dir,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub name: PathBuf,
    pub kind: EntryKind,
}

pub type Listing = Vec<Entry, FS_MAX_ENTRIES>;

/// A small flat filesystem.
pub trait Volume {
    /// Entries directly below `dir`, in creation order.
    fn list(&self, dir: &str) -> Result<Listing, Error>;
    fn kind(&self, path: &str) -> Option<EntryKind>;
    /// Size of a file in bytes.
    fn size(&self, path: &str) -> Result<usize, Error>;
    /// Reads from `offset` into `buf`; returns 0 at end of file.
    fn read(&self, path: &str, offset: usize, buf: &mut [u8]) -> Result<usize, Error>;
    /// Creates `path` empty, truncating an existing file.
    fn create(&mut self, path: &str) -> Result<(), Error>;
    fn append(&mut self, path: &str, data: &[u8]) -> Result<(), Error>;
    fn remove(&mut self, path: &str) -> Result<(), Error>;
    fn rename(&mut self, from: &str, to: &str) -> Result<(), Error>;
    fn mkdir(&mut self, path: &str) -> Result<(), Error>;
}

impl<V: Volume + ?Sized> Volume for &mut V {
    fn list(&self, dir: &str) -> Result<Listing, Error> {
        (**self).list(dir)
    }
    fn kind(&self, path: &str) -> Option<EntryKind> {
        (**self).kind(path)
    }
    fn size(&self, path: &str) -> Result<usize, Error> {
        (**self).size(path)
    }
    fn read(&self, path: &str, offset: usize, buf: &mut [u8]) -> Result<usize, Error> {
        (**self).read(path, offset, buf)
    }
    fn create(&mut self, path: &str) -> Result<(), Error> {
        (**self).create(path)
    }
    fn append(&mut self, path: &str, data: &[u8]) -> Result<(), Error> {
        (**self).append(path, data)
    }
    fn remove(&mut self, path: &str) -> Result<(), Error> {
        (**self).remove(path)
    }
    fn rename(&mut self, from: &str, to: &str) -> Result<(), Error> {
        (**self).rename(from, to)
    }
    fn mkdir(&mut self, path: &str) -> Result<(), Error> {
        (**self).mkdir(path)
    }
}

/// Turns a wire path into an absolute one: NULs dropped, leading `/`
/// added, trailing `/` removed.
pub fn normalize(raw: &[u8]) -> Result<PathBuf, Error> {
    let mut p = PathBuf::new();
    p.push('/').map_err(|_| Error::BufferOverflow)?;
    let text = core::str::from_utf8(raw).map_err(|_| Error::Volume)?;
    for c in text.chars().filter(|&c| c != '\0') {
        if c == '/' && p.ends_with('/') {
            continue;
        }
        p.push(c).map_err(|_| Error::BufferOverflow)?;
    }
    if p.len() > 1 && p.ends_with('/') {
        p.pop();
    }
    Ok(p)
}

/// Splits `/a/b/c` into (`/a/b`, `c`). The root has no parent.
pub fn split_parent(path: &str) -> Option<(&str, &str)> {
    let i = path.rfind('/')?;
    let name = &path[i + 1..];
    if name.is_empty() {
        return None;
    }
    let parent = if i == 0 { "/" } else { &path[..i] };
    Some((parent, name))
}

enum Node {
    Dir,
    File(Vec<u8, FS_MAX_FILE_SIZE>),
}

/// Volatile in-RAM volume. Contents are lost on reset.
pub struct RamVolume {
    nodes: Vec<(PathBuf, Node), FS_MAX_ENTRIES>,
}

impl RamVolume {
    pub const fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    fn find(&self, path: &str) -> Option<usize> {
        self.nodes.iter().position(|(p, _)| p == path)
    }

    fn file(&self, path: &str) -> Result<&Vec<u8, FS_MAX_FILE_SIZE>, Error> {
        match self.find(path).map(|i| &self.nodes[i].1) {
            Some(Node::File(data)) => Ok(data),
            _ => Err(Error::Volume),
        }
    }

    fn parent_exists(&self, path: &str) -> bool {
        match split_parent(path) {
            Some(("/", _)) => true,
            Some((parent, _)) => self.kind(parent) == Some(EntryKind::Dir),
            None => false,
        }
    }

    fn insert(&mut self, path: &str, node: Node) -> Result<(), Error> {
        if !self.parent_exists(path) {
            return Err(Error::Volume);
        }
        let path = PathBuf::try_from(path).map_err(|_| Error::BufferOverflow)?;
        self.nodes.push((path, node)).map_err(|_| Error::Volume)
    }
}

impl Default for RamVolume {
    fn default() -> Self {
        Self::new()
    }
}

impl Volume for RamVolume {
    fn list(&self, dir: &str) -> Result<Listing, Error> {
        if dir != "/" && self.kind(dir) != Some(EntryKind::Dir) {
            return Err(Error::Volume);
        }
        let mut out = Listing::new();
        for (path, node) in &self.nodes {
            let Some((parent, name)) = split_parent(path) else {
                continue;
            };
            if parent != dir {
                continue;
            }
            let kind = match node {
                Node::Dir => EntryKind::Dir,
                Node::File(_) => EntryKind::File,
            };
            let name = PathBuf::try_from(name).map_err(|_| Error::BufferOverflow)?;
            out.push(Entry { name, kind }).map_err(|_| Error::BufferOverflow)?;
        }
        Ok(out)
    }

    fn kind(&self, path: &str) -> Option<EntryKind> {
        if path == "/" {
            return Some(EntryKind::Dir);
        }
        self.find(path).map(|i| match self.nodes[i].1 {
            Node::Dir => EntryKind::Dir,
            Node::File(_) => EntryKind::File,
        })
    }

    fn size(&self, path: &str) -> Result<usize, Error> {
        Ok(self.file(path)?.len())
    }

    fn read(&self, path: &str, offset: usize, buf: &mut [u8]) -> Result<usize, Error> {
        let data = self.file(path)?;
        let rest = data.get(offset..).unwrap_or(&[]);
        let n = rest.len().min(buf.len());
        buf[..n].copy_from_slice(&rest[..n]);
        Ok(n)
    }

    fn create(&mut self, path: &str) -> Result<(), Error> {
        match self.find(path) {
            Some(i) => match &mut self.nodes[i].1 {
                Node::File(data) => {
                    data.clear();
                    Ok(())
                }
                Node::Dir => Err(Error::Volume),
            },
            None => self.insert(path, Node::File(Vec::new())),
        }
    }

    fn append(&mut self, path: &str, data: &[u8]) -> Result<(), Error> {
        let i = self.find(path).ok_or(Error::Volume)?;
        match &mut self.nodes[i].1 {
            Node::File(contents) => contents
                .extend_from_slice(data)
                .map_err(|_| Error::BufferOverflow),
            Node::Dir => Err(Error::Volume),
        }
    }

    fn remove(&mut self, path: &str) -> Result<(), Error> {
        let i = self.find(path).ok_or(Error::Volume)?;
        if matches!(self.nodes[i].1, Node::Dir) && !self.list(path)?.is_empty() {
            return Err(Error::Volume);
        }
        self.nodes.remove(i);
        Ok(())
    }

    fn rename(&mut self, from: &str, to: &str) -> Result<(), Error> {
        let i = self.find(from).ok_or(Error::Volume)?;
        if matches!(self.nodes[i].1, Node::Dir) {
            // Children would keep their old prefix.
            return Err(Error::Volume);
        }
        if self.find(to).is_some() || !self.parent_exists(to) {
            return Err(Error::Volume);
        }
        self.nodes[i].0 = PathBuf::try_from(to).map_err(|_| Error::BufferOverflow)?;
        Ok(())
    }

    fn mkdir(&mut self, path: &str) -> Result<(), Error> {
        if self.kind(path).is_some() {
            return Err(Error::Volume);
        }
        self.insert(path, Node::Dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_nuls_and_slashes() {
        assert_eq!(normalize(b"main.py\0").unwrap().as_str(), "/main.py");
        assert_eq!(normalize(b"/apps//x/").unwrap().as_str(), "/apps/x");
        assert_eq!(normalize(b"\0").unwrap().as_str(), "/");
        assert_eq!(normalize(b"").unwrap().as_str(), "/");
    }

    #[test]
    fn split_parent_cases() {
        assert_eq!(split_parent("/a"), Some(("/", "a")));
        assert_eq!(split_parent("/a/b"), Some(("/a", "b")));
        assert_eq!(split_parent("/"), None);
    }

    #[test]
    fn create_append_read() {
        let mut v = RamVolume::new();
        v.create("/f").unwrap();
        v.append("/f", b"hello ").unwrap();
        v.append("/f", b"world").unwrap();
        assert_eq!(v.size("/f"), Ok(11));

        let mut buf = [0u8; 4];
        assert_eq!(v.read("/f", 6, &mut buf), Ok(4));
        assert_eq!(&buf, b"worl");
        assert_eq!(v.read("/f", 11, &mut buf), Ok(0));
        assert_eq!(v.read("/f", 50, &mut buf), Ok(0));
    }

    #[test]
    fn create_truncates() {
        let mut v = RamVolume::new();
        v.create("/f").unwrap();
        v.append("/f", b"abc").unwrap();
        v.create("/f").unwrap();
        assert_eq!(v.size("/f"), Ok(0));
    }

    #[test]
    fn files_need_an_existing_parent() {
        let mut v = RamVolume::new();
        assert_eq!(v.create("/apps/x"), Err(Error::Volume));
        v.mkdir("/apps").unwrap();
        v.create("/apps/x").unwrap();
        assert_eq!(v.kind("/apps/x"), Some(EntryKind::File));
    }

    #[test]
    fn list_only_direct_children() {
        let mut v = RamVolume::new();
        v.mkdir("/apps").unwrap();
        v.create("/main.py").unwrap();
        v.create("/apps/x").unwrap();

        let root = v.list("/").unwrap();
        assert_eq!(root.len(), 2);
        assert_eq!(root[0].name.as_str(), "apps");
        assert_eq!(root[0].kind, EntryKind::Dir);
        assert_eq!(root[1].name.as_str(), "main.py");

        let apps = v.list("/apps").unwrap();
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].name.as_str(), "x");
        assert!(v.list("/nope").is_err());
    }

    #[test]
    fn remove_refuses_non_empty_dir() {
        let mut v = RamVolume::new();
        v.mkdir("/d").unwrap();
        v.create("/d/f").unwrap();
        assert_eq!(v.remove("/d"), Err(Error::Volume));
        v.remove("/d/f").unwrap();
        v.remove("/d").unwrap();
        assert_eq!(v.kind("/d"), None);
    }

    #[test]
    fn rename_moves_file() {
        let mut v = RamVolume::new();
        v.create("/a").unwrap();
        v.append("/a", b"x").unwrap();
        v.rename("/a", "/b").unwrap();
        assert!(v.size("/a").is_err());
        assert_eq!(v.size("/b"), Ok(1));
        v.create("/c").unwrap();
        assert_eq!(v.rename("/b", "/c"), Err(Error::Volume));
    }

    #[test]
    fn mkdir_twice_fails() {
        let mut v = RamVolume::new();
        v.mkdir("/d").unwrap();
        assert_eq!(v.mkdir("/d"), Err(Error::Volume));
        assert_eq!(v.mkdir("/"), Err(Error::Volume));
    }

    #[test]
    fn append_past_capacity_overflows() {
        let mut v = RamVolume::new();
        v.create("/big").unwrap();
        let chunk = [0u8; FS_MAX_FILE_SIZE];
        v.append("/big", &chunk).unwrap();
        assert_eq!(v.append("/big", b"x"), Err(Error::BufferOverflow));
    }
}
