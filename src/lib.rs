//! pwmpulse exports a hardware PWM channel through the Linux `/sys/class/pwm`
//! sysfs interface, drives it with a fixed period and pulse width for a fixed
//! duration, and disables it again.
//!
//! The [`pwm`] module provides the channel controller, [`pulse`] runs the
//! complete sequence. Both work on any filesystem root, so they can be
//! pointed at a directory other than `/sys/class/pwm`.
//!
//! An optional `embedded-hal` feature implements the `embedded-hal` v1.0
//! `SetDutyCycle` trait for [`pwm::Pwm`].

pub mod pulse;
pub mod pwm;
pub mod user;
