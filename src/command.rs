//! Host-interactive command loop.
//!
//! The host channel protocol is line-oriented text: the host sends a base-10
//! repetition count, the loop answers with one decimal tick count per
//! completed measurement. Anything that does not parse as an integer is
//! dropped on the floor with no reply, which keeps the protocol tolerant of
//! line noise and stray terminal input.

use core::fmt::Write as _;
use core::str;

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::serial;
use heapless::{String, Vec};
use nb::block;
use void::Void;

use crate::pulse::Measure;

/// Default pause between consecutive measurements, in milliseconds.
///
/// Throttles transmit-line re-assertion and lets acoustic reverberation
/// settle before the next pulse.
pub const DEFAULT_SETTLE_MS: u16 = 50;

/// Request lines longer than this are discarded. Any value a batch can
/// actually run fits well within it.
const REQUEST_CAPACITY: usize = 16;

/// Possible error ending the command loop.
#[derive(Debug)]
pub enum Error<C, M> {
    /// The host channel failed.
    Channel(C),
    /// A digital line failed while measuring.
    Measure(M),
}

/// Host-interactive driver issuing measurements on demand.
///
/// Owns the host channel, the measurement device and a delay timer, and
/// serves repetition requests forever. There is no way to cancel a batch
/// once it has started; new input is not read until the batch completes.
pub struct CommandLoop<S, M, D> {
    /// Serial channel to the host
    channel: S,
    /// Measurement device behind the [`Measure`] seam
    device: M,
    /// Timer providing the inter-measurement pause
    delay: D,
    /// Pause between consecutive measurements (ms)
    settle_ms: u16,
}

impl<S, M, D, E> CommandLoop<S, M, D>
where
    S: serial::Read<u8, Error = E> + serial::Write<u8, Error = E>,
    M: Measure,
    D: DelayMs<u16>,
{
    /// Create a new loop with the default settle delay of
    /// [`DEFAULT_SETTLE_MS`] milliseconds.
    pub fn new(channel: S, device: M, delay: D) -> Self {
        CommandLoop {
            channel,
            device,
            delay,
            settle_ms: DEFAULT_SETTLE_MS,
        }
    }

    /// Override the pause between consecutive measurements.
    pub fn settle_ms(mut self, ms: u16) -> Self {
        self.settle_ms = ms;
        self
    }

    /// Serve repetition requests until the hardware fails.
    ///
    /// Blocks reading one line from the host, runs the requested batch, and
    /// goes back to reading. Never returns in normal operation; the `Void`
    /// success type records that. A HAL error on the channel or the digital
    /// lines is the only exit.
    pub fn run(&mut self) -> Result<Void, Error<E, M::Error>> {
        loop {
            if let Some(n) = self.read_request().map_err(Error::Channel)? {
                self.run_batch(n)?;
            }
        }
    }

    /// Read one line from the host and parse it as a repetition count.
    ///
    /// Returns `None` for anything that does not parse as an integer:
    /// empty lines, stray text, numbers out of the `i32` range, lines
    /// longer than the request buffer. No reply is sent in that case.
    fn read_request(&mut self) -> Result<Option<i32>, E> {
        let mut line: Vec<u8, REQUEST_CAPACITY> = Vec::new();
        let mut overlong = false;
        loop {
            let byte = block!(self.channel.read())?;
            if byte == b'\n' || byte == b'\r' {
                break;
            }
            if line.push(byte).is_err() {
                // keep consuming so the remainder is not parsed as a
                // fresh request
                overlong = true;
            }
        }
        if overlong {
            return Ok(None);
        }
        Ok(str::from_utf8(&line).ok().and_then(|s| s.parse().ok()))
    }

    /// Run `n` measurements back to back, emitting each result as soon as
    /// it is taken.
    ///
    /// A negative count runs zero repetitions, same as zero.
    fn run_batch(&mut self, n: i32) -> Result<(), Error<E, M::Error>> {
        for _ in 0..n {
            let ticks = self.device.measure_once().map_err(Error::Measure)?;
            self.emit(ticks).map_err(Error::Channel)?;
            self.delay.delay_ms(self.settle_ms);
        }
        Ok(())
    }

    /// Write one tick count to the host as a decimal line and flush it.
    fn emit(&mut self, ticks: u32) -> Result<(), E> {
        // ten digits plus the terminator, always fits
        let mut line: String<12> = String::new();
        let _ = writeln!(line, "{}", ticks);
        for &byte in line.as_bytes() {
            block!(self.channel.write(byte))?;
        }
        block!(self.channel.flush())
    }
}
