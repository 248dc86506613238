// Copyright (c) 2017-2019 Rene van der Meer
//
// Permission is hereby granted, free of charge, to any person obtaining a
// copy of this software and associated documentation files (the "Software"),
// to deal in the Software without restriction, including without limitation
// the rights to use, copy, modify, merge, publish, distribute, sublicense,
// and/or sell copies of the Software, and to permit persons to whom the
// Software is furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL
// THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
// FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
// DEALINGS IN THE SOFTWARE.

//! Recording [`ControlFiles`] implementation for tests.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use super::sysfs::ControlFiles;

/// A single write that reached a control file.
#[derive(Debug, Clone)]
pub struct Written {
    pub path: PathBuf,
    pub value: String,
    pub at: Instant,
}

/// In-memory control files.
///
/// Writing a channel number to a chip's `export` file creates that channel's
/// attribute files, like the kernel does. Exporting a channel that already
/// exists is recorded, then fails with `EBUSY`. Paths registered through
/// [`MockFiles::fail`] reject writes with the given errno.
#[derive(Debug, Default)]
pub struct MockFiles {
    files: RefCell<HashMap<PathBuf, String>>,
    failing: RefCell<HashMap<PathBuf, i32>>,
    hidden: RefCell<HashSet<PathBuf>>,
    writes: RefCell<Vec<Written>>,
}

impl MockFiles {
    pub fn new() -> MockFiles {
        MockFiles::default()
    }

    /// Makes every write to `path` fail with `errno`.
    pub fn fail(&self, path: PathBuf, errno: i32) {
        self.failing.borrow_mut().insert(path, errno);
    }

    /// Skips creating attribute files below `dir` on export.
    pub fn hide(&self, dir: PathBuf) {
        self.hidden.borrow_mut().insert(dir);
    }

    /// Seeds the contents of `path` without recording a write.
    pub fn set(&self, path: PathBuf, value: &str) {
        self.files.borrow_mut().insert(path, value.to_owned());
    }

    pub fn writes(&self) -> Vec<Written> {
        self.writes.borrow().clone()
    }

    /// Writes as `(path, value)` pairs.
    pub fn written(&self) -> Vec<(PathBuf, String)> {
        self.writes
            .borrow()
            .iter()
            .map(|w| (w.path.clone(), w.value.clone()))
            .collect()
    }

    fn create_channel(&self, chip_dir: &Path, channel: &str) {
        let dir = chip_dir.join(format!("pwm{}", channel));
        if self.hidden.borrow().contains(&dir) {
            return;
        }

        let mut files = self.files.borrow_mut();
        for attr in ["period", "duty_cycle", "enable"] {
            files.entry(dir.join(attr)).or_insert_with(|| "0".to_owned());
        }
    }
}

impl ControlFiles for MockFiles {
    fn write(&self, path: &Path, value: &str) -> io::Result<()> {
        if let Some(&errno) = self.failing.borrow().get(path) {
            return Err(io::Error::from_raw_os_error(errno));
        }

        if let Some(parent) = path.parent() {
            let is_control = matches!(
                path.file_name().and_then(|n| n.to_str()),
                Some("export") | Some("unexport")
            );

            if !is_control && !self.exists(parent) {
                return Err(io::Error::from_raw_os_error(libc::ENOENT));
            }
        }

        self.writes.borrow_mut().push(Written {
            path: path.to_owned(),
            value: value.to_owned(),
            at: Instant::now(),
        });

        // The kernel rejects exporting a channel twice
        if let (Some("export"), Some(chip_dir)) =
            (path.file_name().and_then(|n| n.to_str()), path.parent())
        {
            if self.exists(&chip_dir.join(format!("pwm{}", value))) {
                return Err(io::Error::from_raw_os_error(libc::EBUSY));
            }
        }

        match (path.file_name().and_then(|n| n.to_str()), path.parent()) {
            (Some("export"), Some(chip_dir)) => self.create_channel(chip_dir, value),
            (Some("unexport"), Some(chip_dir)) => {
                let dir = chip_dir.join(format!("pwm{}", value));
                self.files.borrow_mut().retain(|file, _| !file.starts_with(&dir));
            }
            _ => {
                self.files
                    .borrow_mut()
                    .insert(path.to_owned(), value.to_owned());
            }
        }

        Ok(())
    }

    fn read(&self, path: &Path) -> io::Result<String> {
        self.files
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::from_raw_os_error(libc::ENOENT))
    }

    fn exists(&self, path: &Path) -> bool {
        self.files
            .borrow()
            .keys()
            .any(|file| file.starts_with(path))
    }
}
