//! A platform agnostic driver to measure the time-of-flight of an acoustic
//! pulse between a transmitter and a receiver, for estimating the speed of
//! sound (or distance, given a known speed).
//!
//! This driver is built using [`embedded-hal`][1] traits.
//!
//! # Usage
//! Wire an emitter to a digital output (idle low, pulled down) and a
//! receiving transducer to a digital input (pulled up, asserted low on
//! detection), and hand both lines plus a free-running cycle counter to
//! [`PulseTimer`]. [`CommandLoop`] drives it interactively over a serial
//! channel to a host: the host sends a repetition count as a line of text
//! and gets one raw tick count back per measurement.
//!
//! Tick counts are uncalibrated hardware-clock units; converting them to a
//! time or a distance is the host's job. Note also that the echo wait has
//! no timeout: a measurement with no echo blocks forever, so the wiring is
//! assumed to always produce one.
//!
//! ```no_run
//! # use pulse_tof::{CommandLoop, PulseTimer, TickCounter, indicate_ready};
//! # fn bring_up<TX, RX, C, S, D, P>(transmit: TX, receive: RX, counter: C,
//! #                                 serial: S, delay: D, mut led: P) -> !
//! # where
//! #     TX: embedded_hal::digital::v2::OutputPin<Error = core::convert::Infallible>,
//! #     RX: embedded_hal::digital::v2::InputPin<Error = core::convert::Infallible>,
//! #     C: TickCounter,
//! #     S: embedded_hal::serial::Read<u8, Error = core::convert::Infallible>
//! #         + embedded_hal::serial::Write<u8, Error = core::convert::Infallible>,
//! #     D: embedded_hal::blocking::delay::DelayMs<u16>,
//! #     P: embedded_hal::PwmPin<Duty = u16>,
//! # {
//! let timer = match PulseTimer::new(transmit, receive, counter) {
//!     Ok(timer) => timer,
//!     Err(e) => panic!("transmit line unavailable: {:?}", e),
//! };
//! indicate_ready(&mut led);
//! match CommandLoop::new(serial, timer, delay).run() {
//!     Ok(void) => match void {},
//!     Err(e) => panic!("hardware failure: {:?}", e),
//! }
//! # }
//! ```
//!
//! [1]: https://crates.io/crates/embedded-hal

#![deny(missing_docs)]
#![no_std]

#[cfg(test)]
#[macro_use]
extern crate std;

mod command;
mod indicator;
mod pulse;

pub use crate::command::{CommandLoop, Error, DEFAULT_SETTLE_MS};
pub use crate::indicator::indicate_ready;
pub use crate::pulse::{LineError, Measure, PulseTimer, TickCounter};
