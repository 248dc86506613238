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

// pwmpulse - Runs PWM channel 0 on pwmchip0 at 1 kHz for 5 seconds.
//
// Interrupting the process by pressing Ctrl-C causes the application to exit
// immediately without disabling the PWM channel.

use std::io;

use anyhow::Context;
use log::{error, info};

use pwmpulse::pulse;
use pwmpulse::pwm::{Config, Pwm};
use pwmpulse::user;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let pwm = Pwm::new(Config::default());
    info!(
        "Using {} ({} ns period, {} ns duty cycle)",
        pwm.paths().channel_dir().display(),
        pwm.config().period_ns,
        pwm.config().duty_ns
    );

    let stdout = io::stdout();
    let result = pulse::run(&pwm, &mut stdout.lock());

    if let Err(ref err) = result {
        if err.io_kind() == Some(io::ErrorKind::PermissionDenied) {
            if let Some(hint) = user::permission_hint() {
                error!("{}", hint);
            }
        }
    }

    result.with_context(|| {
        format!(
            "PWM sequence on {} aborted",
            pwm.paths().channel_dir().display()
        )
    })
}
