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

//! Interface for a sysfs PWM channel.
//!
//! `pwmpulse` controls PWM outputs through the `/sys/class/pwm` sysfs
//! interface. Each PWM controller shows up as `pwmchip<N>`, and each of its
//! output lines has to be exported before its control files (`period`,
//! `duty_cycle` and `enable`) appear below `pwmchip<N>/pwm<M>`.
//!
//! ## Export latency
//!
//! The kernel creates the channel's control files asynchronously after the
//! export request. [`Pwm::await_channel_ready`] bridges that gap using the
//! configured [`Settle`] strategy. The default is a blind 100 ms sleep. If the
//! kernel (or udev, when it changes file permissions) takes longer, the first
//! write fails with an `io::ErrorKind::NotFound` or
//! `io::ErrorKind::PermissionDenied` error. [`Settle::Poll`] waits for the
//! files to show up instead.
//!
//! ## Troubleshooting
//!
//! ### Permission denied
//!
//! Writes to `/sys/class/pwm` require root privileges unless udev has been
//! configured to hand the PWM class over to a group the current user is a
//! member of. Alternatively, launch the application using `sudo`.
//!
//! ### Not found
//!
//! A `NotFound` error on export means the selected `pwmchip` doesn't exist.
//! Check that the PWM controller is enabled in the device tree.

use std::io;
use std::path::{Path, PathBuf};
use std::result;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};
use thiserror::Error;

#[cfg(feature = "embedded-hal")]
mod hal;
#[cfg(test)]
pub(crate) mod mock;
pub mod sysfs;

use self::sysfs::{ChannelPaths, ControlFiles, Sysfs};

/// Errors that can occur when accessing a PWM channel.
#[derive(Debug, Error)]
pub enum Error {
    /// Exporting the channel failed for a reason other than it already being exported.
    #[error("failed to export PWM channel {channel}: {source}")]
    Export { channel: u32, source: io::Error },
    /// Writing a control file failed.
    #[error("failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
    /// Reading a control file failed.
    #[error("failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    /// A control file contained something other than a decimal number.
    #[error("unexpected value {value:?} in {}", .path.display())]
    Parse { path: PathBuf, value: String },
    /// Writing the status line failed.
    #[error("failed to write status: {0}")]
    Output(#[source] io::Error),
}

impl Error {
    /// Returns the kind of the underlying I/O error, if any.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Error::Export { source, .. }
            | Error::Write { source, .. }
            | Error::Read { source, .. } => Some(source.kind()),
            Error::Output(err) => Some(err.kind()),
            Error::Parse { .. } => None,
        }
    }
}

/// Result type returned from methods that can have `pwm::Error`s.
pub type Result<T> = result::Result<T, Error>;

/// Strategy used to wait for the channel's control files after an export.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Settle {
    /// Sleep for a fixed duration without checking anything.
    Fixed(Duration),
    /// Check for the channel's attribute files every `interval`, giving up after `timeout`.
    Poll { interval: Duration, timeout: Duration },
}

impl Default for Settle {
    fn default() -> Settle {
        Settle::Fixed(Duration::from_millis(100))
    }
}

/// PWM channel settings.
///
/// `Config::default()` selects channel 0 on `pwmchip0` with a 1 kHz period
/// (1,000,000 ns) and a 990,000 ns pulse width, held for 5 seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory containing the `pwmchip<N>` entries.
    pub root: PathBuf,
    pub chip: u32,
    pub channel: u32,
    /// Time it takes to complete one cycle, in nanoseconds.
    pub period_ns: u64,
    /// Time the output is high during a single cycle, in nanoseconds. Must
    /// not exceed `period_ns`, which is enforced by the kernel.
    pub duty_ns: u64,
    pub settle: Settle,
    /// How long the output stays enabled.
    pub hold: Duration,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            root: PathBuf::from(sysfs::PWM_CLASS_PATH),
            chip: 0,
            channel: 0,
            period_ns: 1_000_000,
            // 99% duty, even though this setup used to be announced as 50%
            duty_ns: 990_000,
            settle: Settle::default(),
            hold: Duration::from_secs(5),
        }
    }
}

/// Provides access to a single PWM channel.
///
/// Constructing a `Pwm` doesn't touch the filesystem. Call [`export`] and
/// [`await_channel_ready`] before configuring the channel.
///
/// Unlike a typical RAII wrapper, dropping a `Pwm` leaves the channel as it is.
///
/// [`export`]: #method.export
/// [`await_channel_ready`]: #method.await_channel_ready
#[derive(Debug)]
pub struct Pwm<B = Sysfs> {
    config: Config,
    paths: ChannelPaths,
    files: B,
}

impl Pwm<Sysfs> {
    /// Constructs a new `Pwm` for the channel selected in `config`.
    pub fn new(config: Config) -> Pwm<Sysfs> {
        Pwm::with_backend(config, Sysfs)
    }
}

impl<B: ControlFiles> Pwm<B> {
    /// Constructs a new `Pwm` that accesses its control files through `files`.
    pub fn with_backend(config: Config, files: B) -> Pwm<B> {
        let paths = ChannelPaths::new(&config.root, config.chip, config.channel);

        Pwm {
            config,
            paths,
            files,
        }
    }

    /// Returns the settings this `Pwm` was constructed with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the control file paths of the selected channel.
    pub fn paths(&self) -> &ChannelPaths {
        &self.paths
    }

    /// Checks whether the channel directory exists.
    pub fn is_exported(&self) -> bool {
        self.files.exists(self.paths.channel_dir())
    }

    /// Requests the kernel to create the channel's control files.
    ///
    /// The channel number is always written, even if the channel is already
    /// exported. A failure that [`sysfs::is_already_exported`] recognizes is
    /// ignored. Any other failure is returned as [`Error::Export`].
    pub fn export(&self) -> Result<()> {
        let path = self.paths.export();
        let channel = self.config.channel;
        debug!("{} <- {}", path.display(), channel);

        match self.files.write(&path, &channel.to_string()) {
            Ok(()) => Ok(()),
            Err(err) if sysfs::is_already_exported(&err) => {
                debug!("PWM channel {} already exported: {}", channel, err);
                Ok(())
            }
            Err(err) => Err(Error::Export {
                channel,
                source: err,
            }),
        }
    }

    /// Removes the channel's control files, if they exist.
    pub fn unexport(&self) -> Result<()> {
        // Only unexport if the channel is actually exported
        if self.is_exported() {
            self.write(&self.paths.unexport(), &self.config.channel.to_string())?;
        }

        Ok(())
    }

    /// Waits for the kernel to create the control files after an export.
    ///
    /// With [`Settle::Fixed`] this is a plain sleep. With [`Settle::Poll`] this
    /// returns as soon as all attribute files exist, or when the timeout has
    /// elapsed, in which case the next write reports the missing file.
    pub fn await_channel_ready(&self) {
        match self.config.settle {
            Settle::Fixed(delay) => thread::sleep(delay),
            Settle::Poll { interval, timeout } => {
                let start = Instant::now();
                let attributes = self.paths.attributes();

                while !attributes.iter().all(|path| self.files.exists(path)) {
                    if start.elapsed() >= timeout {
                        warn!(
                            "{} not ready after {:?}",
                            self.paths.channel_dir().display(),
                            timeout
                        );
                        break;
                    }

                    thread::sleep(interval);
                }
            }
        }
    }

    /// Sets the period, then the pulse width, both in nanoseconds.
    ///
    /// The period is always written first, so a pulse width that only fits
    /// within the new period is accepted. If setting the period fails, the
    /// pulse width is left untouched.
    pub fn configure(&self, period_ns: u64, duty_ns: u64) -> Result<()> {
        self.set_period(period_ns)?;
        self.set_duty_cycle(duty_ns)?;

        Ok(())
    }

    /// Returns the configured period in nanoseconds.
    pub fn period(&self) -> Result<u64> {
        self.read_u64(&self.paths.period())
    }

    /// Sets the period in nanoseconds.
    pub fn set_period(&self, period_ns: u64) -> Result<()> {
        self.write(&self.paths.period(), &period_ns.to_string())
    }

    /// Returns the configured pulse width in nanoseconds.
    pub fn duty_cycle(&self) -> Result<u64> {
        self.read_u64(&self.paths.duty_cycle())
    }

    /// Sets the pulse width in nanoseconds.
    ///
    /// The pulse width must be shorter than or equal to the period.
    pub fn set_duty_cycle(&self, duty_ns: u64) -> Result<()> {
        self.write(&self.paths.duty_cycle(), &duty_ns.to_string())
    }

    /// Checks whether PWM is currently enabled on the selected channel.
    pub fn is_enabled(&self) -> Result<bool> {
        let path = self.paths.enable();
        let enabled = self.read(&path)?;

        match enabled.trim() {
            "0" => Ok(false),
            "1" => Ok(true),
            other => Err(Error::Parse {
                path,
                value: other.to_owned(),
            }),
        }
    }

    /// Writes `"1"` or `"0"` to the channel's `enable` file.
    pub fn set_enabled(&self, enabled: bool) -> Result<()> {
        let path = self.paths.enable();
        let value = if enabled { "1" } else { "0" };
        debug!("{} <- {}", path.display(), value);

        self.files.write(&path, value).map_err(|err| {
            let source = if enabled && err.kind() == io::ErrorKind::InvalidInput {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "make sure a period has been set before enabling PWM",
                )
            } else {
                err
            };

            Error::Write { path, source }
        })
    }

    /// Enables PWM on the selected channel.
    pub fn enable(&self) -> Result<()> {
        self.set_enabled(true)
    }

    /// Disables PWM on the selected channel.
    pub fn disable(&self) -> Result<()> {
        self.set_enabled(false)
    }

    fn write(&self, path: &Path, value: &str) -> Result<()> {
        debug!("{} <- {}", path.display(), value);

        self.files.write(path, value).map_err(|source| Error::Write {
            path: path.to_owned(),
            source,
        })
    }

    fn read(&self, path: &Path) -> Result<String> {
        self.files.read(path).map_err(|source| Error::Read {
            path: path.to_owned(),
            source,
        })
    }

    fn read_u64(&self, path: &Path) -> Result<u64> {
        let value = self.read(path)?;

        value.trim().parse().map_err(|_| Error::Parse {
            path: path.to_owned(),
            value: value.trim().to_owned(),
        })
    }
}
