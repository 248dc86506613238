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

use std::fs::{self, File};
use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Default location of the PWM class directory.
pub const PWM_CLASS_PATH: &str = "/sys/class/pwm";

/// Control file paths for a single PWM channel.
///
/// Paths follow the kernel layout `<root>/pwmchip<chip>/pwm<channel>/<attr>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelPaths {
    chip_dir: PathBuf,
    channel_dir: PathBuf,
}

impl ChannelPaths {
    /// Constructs the paths for `channel` on `chip` below `root`.
    pub fn new(root: &Path, chip: u32, channel: u32) -> ChannelPaths {
        let chip_dir = root.join(format!("pwmchip{}", chip));
        let channel_dir = chip_dir.join(format!("pwm{}", channel));

        ChannelPaths {
            chip_dir,
            channel_dir,
        }
    }

    /// Returns the chip's base directory.
    pub fn chip_dir(&self) -> &Path {
        &self.chip_dir
    }

    /// Returns the channel directory the kernel creates on export.
    pub fn channel_dir(&self) -> &Path {
        &self.channel_dir
    }

    pub fn export(&self) -> PathBuf {
        self.chip_dir.join("export")
    }

    pub fn unexport(&self) -> PathBuf {
        self.chip_dir.join("unexport")
    }

    pub fn period(&self) -> PathBuf {
        self.channel_dir.join("period")
    }

    // The sysfs PWM interface specifies the duty cycle in nanoseconds, which
    // means it's actually the pulse width.
    pub fn duty_cycle(&self) -> PathBuf {
        self.channel_dir.join("duty_cycle")
    }

    pub fn enable(&self) -> PathBuf {
        self.channel_dir.join("enable")
    }

    /// Attribute files that have to be present before the channel can be configured.
    pub fn attributes(&self) -> [PathBuf; 3] {
        [self.period(), self.duty_cycle(), self.enable()]
    }
}

/// Access to sysfs-style control files.
///
/// [`Sysfs`] talks to the real filesystem. Alternative implementations can
/// record or simulate writes.
pub trait ControlFiles {
    /// Writes `value` to the control file at `path` in a single write call.
    fn write(&self, path: &Path, value: &str) -> io::Result<()>;

    /// Reads the current contents of the control file at `path`.
    fn read(&self, path: &Path) -> io::Result<String>;

    /// Checks whether `path` exists.
    fn exists(&self, path: &Path) -> bool;
}

impl<T: ControlFiles + ?Sized> ControlFiles for &T {
    fn write(&self, path: &Path, value: &str) -> io::Result<()> {
        (**self).write(path, value)
    }

    fn read(&self, path: &Path) -> io::Result<String> {
        (**self).read(path)
    }

    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }
}

/// [`ControlFiles`] backed by `std::fs`.
#[derive(Debug, Default, Copy, Clone)]
pub struct Sysfs;

impl ControlFiles for Sysfs {
    fn write(&self, path: &Path, value: &str) -> io::Result<()> {
        File::create(path)?.write_all(value.as_bytes())
    }

    fn read(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Checks whether `err` is the kernel's response to exporting a channel
/// that's already exported.
///
/// The PWM core rejects a second export of the same channel with `EBUSY`.
/// Any other error is a real failure.
pub fn is_already_exported(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::EBUSY)
}
