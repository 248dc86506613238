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

//! Runs a PWM channel for a fixed duration.
//!
//! [`run`] exports the channel, configures it with the period and pulse width
//! from its [`Config`], enables the output, holds it for [`Config::hold`],
//! and disables it again. The channel stays exported afterwards.
//!
//! [`Config`]: crate::pwm::Config
//! [`Config::hold`]: crate::pwm::Config::hold

use std::io::Write;
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};

use crate::pwm::sysfs::ControlFiles;
use crate::pwm::{Config, Error, Pwm, Result};

/// Drives `pwm` through the export, configure, enable, hold and disable steps.
///
/// A failed export is logged and otherwise ignored, since the following
/// writes report the actual problem. Any other failure aborts the sequence
/// immediately, leaving the remaining steps (including the final disable)
/// undone. One status line is written to `out` before the hold.
pub fn run<B: ControlFiles, W: Write>(pwm: &Pwm<B>, out: &mut W) -> Result<()> {
    let config = pwm.config();

    if let Err(err) = pwm.export() {
        warn!("{}", err);
    }

    pwm.await_channel_ready();

    pwm.configure(config.period_ns, config.duty_ns)?;
    debug!(
        "pulse width {} ns of {} ns period ({}% duty)",
        config.duty_ns,
        config.period_ns,
        duty_percent(config.period_ns, config.duty_ns)
    );

    pwm.enable()?;
    info!("{} enabled", pwm.paths().channel_dir().display());

    writeln!(out, "{}", status_line(config)).map_err(Error::Output)?;
    out.flush().map_err(Error::Output)?;

    thread::sleep(config.hold);

    pwm.disable()?;
    info!("{} disabled", pwm.paths().channel_dir().display());

    Ok(())
}

/// Describes the running output, e.g. `PWM running at 1 kHz, 99% duty for 5 seconds...`.
pub fn status_line(config: &Config) -> String {
    format!(
        "PWM running at {}, {}% duty for {}...",
        frequency(config.period_ns),
        duty_percent(config.period_ns, config.duty_ns),
        hold_time(config.hold)
    )
}

fn frequency(period_ns: u64) -> String {
    if period_ns == 0 {
        return "0 Hz".to_owned();
    }

    if 1_000_000_000 % period_ns == 0 {
        let hz = 1_000_000_000 / period_ns;
        if hz >= 1_000_000 && hz % 1_000_000 == 0 {
            format!("{} MHz", hz / 1_000_000)
        } else if hz >= 1_000 && hz % 1_000 == 0 {
            format!("{} kHz", hz / 1_000)
        } else {
            format!("{} Hz", hz)
        }
    } else {
        format!("{:.2} Hz", 1e9 / period_ns as f64)
    }
}

// Rounded to the nearest whole percent
fn duty_percent(period_ns: u64, duty_ns: u64) -> u64 {
    if period_ns == 0 {
        return 0;
    }

    let period = u128::from(period_ns);
    let percent = (u128::from(duty_ns) * 100 + period / 2) / period;

    u64::try_from(percent).unwrap_or(u64::MAX)
}

fn hold_time(hold: Duration) -> String {
    match (hold.as_secs(), hold.subsec_millis()) {
        (1, 0) => "1 second".to_owned(),
        (secs, 0) => format!("{} seconds", secs),
        _ => format!("{} ms", hold.as_millis()),
    }
}
