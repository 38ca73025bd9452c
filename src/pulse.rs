//! Pulse emission and edge timing.

use embedded_hal::digital::v2::{InputPin, OutputPin};

/// Free-running hardware cycle counter.
///
/// The counter is monotonic modulo its 32 bit width and is expected to be
/// readable with negligible overhead. It is only ever used to compute
/// elapsed tick counts, never as a wall clock, so wrapping is fine.
pub trait TickCounter {
    /// Instantaneous counter value.
    fn now(&self) -> u32;
}

/// The counter is read-only shared state, so a reference works as well as
/// the counter itself. This lets one hardware timer serve several owners.
impl<'a, C> TickCounter for &'a C
where
    C: TickCounter,
{
    fn now(&self) -> u32 {
        C::now(*self)
    }
}

/// A source of single time-of-flight samples.
///
/// This is the seam between the measurement hardware and the command loop;
/// [`PulseTimer`] is the real implementation.
pub trait Measure {
    /// Failure raised by the underlying hardware.
    type Error;

    /// Take one sample, blocking until the echo arrives.
    ///
    /// Returns the elapsed tick count between pulse assertion and echo
    /// detection, in raw counter units.
    fn measure_once(&mut self) -> Result<u32, Self::Error>;
}

/// Possible error returned by the digital lines.
#[derive(Debug, Copy, Clone)]
pub enum LineError<T, R> {
    /// The transmit line could not be driven.
    Transmit(T),
    /// The receive line could not be read.
    Receive(R),
}

/// Pulse emitter and round-trip timer.
///
/// Owns the two digital lines for the lifetime of the process: the transmit
/// line driving the emitter (idle low, pulled down) and the receive line fed
/// by the transducer (pulled up, asserted low on detection).
pub struct PulseTimer<TX, RX, C> {
    /// Output line driving the acoustic emitter
    transmit: TX,
    /// Input line from the receiving transducer
    receive: RX,
    /// Counter used to timestamp the pulse edges
    counter: C,
}

impl<TX, RX, C> PulseTimer<TX, RX, C>
where
    TX: OutputPin,
    RX: InputPin,
    C: TickCounter,
{
    /// Create a new timer from the two digital lines and a tick counter.
    ///
    /// The transmit line is driven low up front. If the line was already
    /// high every measurement would have to account for that possibility;
    /// forcing it low here lets [`measure_once`](Measure::measure_once)
    /// assume a known idle state.
    pub fn new(transmit: TX, receive: RX, counter: C) -> Result<Self, TX::Error> {
        let mut transmit = transmit;
        transmit.set_low()?;
        Ok(PulseTimer {
            transmit,
            receive,
            counter,
        })
    }
}

impl<TX, RX, C> Measure for PulseTimer<TX, RX, C>
where
    TX: OutputPin,
    RX: InputPin,
    C: TickCounter,
{
    type Error = LineError<TX::Error, RX::Error>;

    /// Emit one pulse and time the round trip.
    ///
    /// Asserts the transmit line, records the counter, then busy-polls the
    /// receive line until it reads low and records the counter again. The
    /// poll has **no timeout**: if the transducer never pulls the line low
    /// this call blocks forever. That is a deliberate property of the
    /// design, not an oversight.
    ///
    /// The returned value is the wrapping difference of the two counter
    /// reads, so it stays correct when the counter overflows mid
    /// measurement.
    fn measure_once(&mut self) -> Result<u32, Self::Error> {
        self.transmit.set_high().map_err(LineError::Transmit)?;
        let start = self.counter.now();
        // Falling-edge detection by polling. No timeout.
        while self.receive.is_high().map_err(LineError::Receive)? {}
        let end = self.counter.now();
        self.transmit.set_low().map_err(LineError::Transmit)?;
        Ok(end.wrapping_sub(start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::{Cell, RefCell};
    use core::convert::Infallible;
    use std::rc::Rc;
    use std::vec::Vec;

    /// Output pin recording every level it is driven to.
    struct Transmit {
        levels: Rc<RefCell<Vec<bool>>>,
    }

    impl OutputPin for Transmit {
        type Error = Infallible;

        fn set_low(&mut self) -> Result<(), Infallible> {
            self.levels.borrow_mut().push(false);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.levels.borrow_mut().push(true);
            Ok(())
        }
    }

    /// Input pin reading high for a fixed number of polls, then low.
    struct Receive {
        polls_high: Cell<u32>,
    }

    impl InputPin for Receive {
        type Error = Infallible;

        fn is_high(&self) -> Result<bool, Infallible> {
            let left = self.polls_high.get();
            if left == 0 {
                Ok(false)
            } else {
                self.polls_high.set(left - 1);
                Ok(true)
            }
        }

        fn is_low(&self) -> Result<bool, Infallible> {
            Ok(!self.is_high()?)
        }
    }

    /// Counter replaying a fixed sequence of values.
    struct Script {
        values: RefCell<std::vec::IntoIter<u32>>,
    }

    impl Script {
        fn new(values: Vec<u32>) -> Self {
            Script {
                values: RefCell::new(values.into_iter()),
            }
        }

        fn exhausted(&self) -> bool {
            self.values.borrow().len() == 0
        }
    }

    impl TickCounter for Script {
        fn now(&self) -> u32 {
            self.values.borrow_mut().next().unwrap()
        }
    }

    fn timer(
        polls_high: u32,
        counter: &Script,
    ) -> (PulseTimer<Transmit, Receive, &Script>, Rc<RefCell<Vec<bool>>>) {
        let levels = Rc::new(RefCell::new(Vec::new()));
        let transmit = Transmit {
            levels: Rc::clone(&levels),
        };
        let receive = Receive {
            polls_high: Cell::new(polls_high),
        };
        let timer = PulseTimer::new(transmit, receive, counter).unwrap();
        (timer, levels)
    }

    #[test]
    fn elapsed_is_counter_difference() {
        let counter = Script::new(vec![100, 250]);
        let (mut timer, _) = timer(3, &counter);
        assert_eq!(timer.measure_once().unwrap(), 150);
    }

    #[test]
    fn elapsed_survives_counter_wraparound() {
        // start five ticks before overflow, end three ticks after
        let counter = Script::new(vec![u32::MAX - 4, 3]);
        let (mut timer, _) = timer(1, &counter);
        assert_eq!(timer.measure_once().unwrap(), 8);
    }

    #[test]
    fn transmit_line_pulses_once_per_measurement() {
        let counter = Script::new(vec![0, 1]);
        let (mut timer, levels) = timer(1, &counter);
        timer.measure_once().unwrap();
        // low on construction, then exactly one high/low pulse
        assert_eq!(*levels.borrow(), vec![false, true, false]);
    }

    #[test]
    fn end_is_sampled_at_the_falling_edge() {
        let counter = Script::new(vec![7, 9]);
        let (mut timer, _) = timer(5, &counter);
        assert_eq!(timer.measure_once().unwrap(), 2);
        // both reads consumed, none wasted on intermediate polls
        assert!(counter.exhausted());
    }

    #[test]
    fn immediate_echo_measures_zero_ticks() {
        let counter = Script::new(vec![42, 42]);
        let (mut timer, _) = timer(0, &counter);
        assert_eq!(timer.measure_once().unwrap(), 0);
    }
}
