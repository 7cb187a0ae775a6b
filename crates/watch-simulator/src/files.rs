//! The watch's flash file system, sandboxed in a host directory.
//!
//! Paths from the application are absolute watch paths (`/apps/demo/x`).
//! They are resolved below the sandbox root; anything that would climb out
//! of it is refused. Status codes follow the FatFs numbering the firmware
//! uses.

use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Component, Path, PathBuf};

use log::{debug, warn};
use watch_sdk::FileMode;

/// FatFs result codes reported by `mkdir` and `delete_file`.
pub mod status {
    pub const OK: u8 = 0;
    pub const DISK_ERR: u8 = 1;
    pub const NO_FILE: u8 = 4;
    pub const NO_PATH: u8 = 5;
    pub const DENIED: u8 = 7;
    pub const EXIST: u8 = 8;
    pub const INVALID_NAME: u8 = 6;
}

const APPS_DIR: &str = "apps";

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Use `root` as the flash, creating it if needed. Like a formatted
    /// watch, the flash starts out with an `/apps` directory.
    pub fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(root.join(APPS_DIR))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Host path for a watch path, or `None` if it escapes the sandbox.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        let mut path = self.root.clone();
        for component in Path::new(name).components() {
            match component {
                Component::RootDir | Component::CurDir => {}
                Component::Normal(part) => path.push(part),
                Component::ParentDir | Component::Prefix(_) => return None,
            }
        }
        (path != self.root).then_some(path)
    }

    pub fn mkdir(&self, name: &str) -> u8 {
        let Some(path) = self.resolve(name) else {
            return status::INVALID_NAME;
        };
        match fs::create_dir(&path) {
            Ok(()) => status::OK,
            Err(e) => io_status(&e),
        }
    }

    pub fn delete(&self, name: &str) -> u8 {
        let Some(path) = self.resolve(name) else {
            return status::INVALID_NAME;
        };
        let result = if path.is_dir() {
            fs::remove_dir(&path)
        } else {
            fs::remove_file(&path)
        };
        match result {
            Ok(()) => status::OK,
            Err(e) => io_status(&e),
        }
    }

    /// Write `data` at `offset` honouring `mode`. Returns bytes written.
    pub fn write(&self, name: &str, data: &[u8], offset: u32, mode: FileMode) -> u32 {
        let Some(path) = self.resolve(name) else {
            warn!("write: invalid name {:?}", name);
            return 0;
        };
        match write_at(&path, data, offset, mode) {
            Ok(n) => n as u32,
            Err(e) => {
                debug!("write {:?}: {}", name, e);
                0
            }
        }
    }

    /// Read into `buf` from `offset`. Returns bytes read.
    pub fn read(&self, name: &str, buf: &mut [u8], offset: u32) -> u32 {
        let Some(path) = self.resolve(name) else {
            warn!("read: invalid name {:?}", name);
            return 0;
        };
        match read_at(&path, buf, offset) {
            Ok(n) => n as u32,
            Err(e) => {
                debug!("read {:?}: {}", name, e);
                0
            }
        }
    }
}

fn io_status(e: &io::Error) -> u8 {
    match e.kind() {
        ErrorKind::NotFound => status::NO_FILE,
        ErrorKind::AlreadyExists => status::EXIST,
        ErrorKind::PermissionDenied => status::DENIED,
        ErrorKind::NotADirectory => status::NO_PATH,
        _ => status::DISK_ERR,
    }
}

fn write_at(path: &Path, data: &[u8], offset: u32, mode: FileMode) -> io::Result<usize> {
    let mut options = OpenOptions::new();
    options.write(true);

    let append = mode.contains(FileMode::OPEN_APPEND);
    if append || mode.contains(FileMode::OPEN_ALWAYS) {
        options.create(true);
    } else if mode.contains(FileMode::CREATE_ALWAYS) {
        options.create(true).truncate(true);
    } else if mode.contains(FileMode::CREATE_NEW) {
        options.create_new(true);
    }

    let mut file = options.open(path)?;
    if append {
        file.seek(SeekFrom::End(0))?;
    } else {
        file.seek(SeekFrom::Start(offset.into()))?;
    }
    file.write_all(data)?;
    Ok(data.len())
}

fn read_at(path: &Path, buf: &mut [u8], offset: u32) -> io::Result<usize> {
    let mut file = fs::File::open(path)?;
    file.seek(SeekFrom::Start(offset.into()))?;

    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}
