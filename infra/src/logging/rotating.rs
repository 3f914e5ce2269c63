//! Size-rotated log file
//!
//! When a write would push the file past `max_bytes`, the file is renamed to
//! `<name>.1`, older files shift up by one and anything past `retention` is
//! deleted.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

struct State {
    file: File,
    written: u64,
}

pub struct RotatingFileWriter {
    path: PathBuf,
    max_bytes: Option<u64>,
    retention: usize,
    state: Mutex<State>,
}

impl RotatingFileWriter {
    /// Open `path` for appending, creating parent directories
    pub fn open(path: impl Into<PathBuf>, max_bytes: Option<u64>, retention: usize) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = open_append(&path)?;
        let written = file.metadata()?.len();

        Ok(Self {
            path,
            max_bytes,
            retention,
            state: Mutex::new(State { file, written }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".{}", index));
        PathBuf::from(name)
    }

    fn rotate(&self, state: &mut State) -> io::Result<()> {
        state.file.flush()?;

        if self.retention == 0 {
            fs::remove_file(&self.path)?;
        } else {
            let oldest = self.backup_path(self.retention);
            if oldest.exists() {
                fs::remove_file(&oldest)?;
            }
            for index in (1..self.retention).rev() {
                let from = self.backup_path(index);
                if from.exists() {
                    fs::rename(&from, self.backup_path(index + 1))?;
                }
            }
            fs::rename(&self.path, self.backup_path(1))?;
        }

        state.file = open_append(&self.path)?;
        state.written = 0;
        Ok(())
    }
}

impl Write for &RotatingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.lock();
        if let Some(max_bytes) = self.max_bytes {
            if state.written > 0 && state.written + buf.len() as u64 > max_bytes {
                self.rotate(&mut state)?;
            }
        }
        state.file.write_all(buf)?;
        state.written += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock().file.flush()
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}
