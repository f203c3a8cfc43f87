//! Generic clock device.
//!
//! The clock is the one stock device with a life of its own: between
//! [`Device::start`] and [`Device::stop`] it runs a ticker thread that counts
//! ticks at the programmed rate and raises its interrupt message on every tick.
//! Embedders that want deterministic timing can leave the bus stopped and
//! drive the clock with [`GenericClock::tick`] instead.

use super::{Device, DeviceContext, DeviceError, DeviceInfo, InterruptLine};
use crate::registers::Register;
use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Base tick rate in Hz; the programmed divider slows it down.
pub const BASE_RATE_HZ: u32 = 60;

/// Longest the ticker thread sleeps before re-checking its stop flag.
const MAX_SLEEP: Duration = Duration::from_millis(10);

/// Generic clock `HWI` commands (register A).
///
/// | A | Name        | Effect                                                   |
/// |---|-------------|----------------------------------------------------------|
/// | 0 | SET_RATE    | tick at 60/B Hz (B = 0 turns the clock off), reset ticks |
/// | 1 | GET_TICKS   | C = ticks since the last SET_RATE                        |
/// | 2 | SET_INT     | interrupt message = B (0 disables interrupts)            |
mod command {
    pub const SET_RATE: u16 = 0;
    pub const GET_TICKS: u16 = 1;
    pub const SET_INT: u16 = 2;
}

#[derive(Default)]
struct ClockState {
    divider: u16,
    ticks: u16,
    interrupt_message: u16,
    // Bumped on every SET_RATE so the ticker restarts its schedule.
    generation: u64,
    line: Option<InterruptLine>,
}

impl ClockState {
    fn tick(&mut self) -> bool {
        if self.divider == 0 {
            return false;
        }
        self.ticks = self.ticks.wrapping_add(1);
        if self.interrupt_message != 0 {
            if let Some(line) = &self.line {
                if let Err(err) = line.raise(self.interrupt_message) {
                    log::warn!("clock interrupt lost: {}", err);
                }
            }
        }
        true
    }

    fn period(&self) -> Option<Duration> {
        match self.divider {
            0 => None,
            divider => Some(Duration::from_secs(divider as u64) / BASE_RATE_HZ),
        }
    }
}

type Shared = Arc<Mutex<ClockState>>;

fn lock(shared: &Shared) -> MutexGuard<'_, ClockState> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Ticker {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

fn run_ticker(shared: Shared, stop: Arc<AtomicBool>) {
    let mut schedule: Option<(u64, Instant)> = None;

    while !stop.load(Ordering::Acquire) {
        let sleep = {
            let mut state = lock(&shared);
            match state.period() {
                None => {
                    schedule = None;
                    MAX_SLEEP
                }
                Some(period) => {
                    let now = Instant::now();
                    let next = match schedule {
                        Some((generation, next)) if generation == state.generation => next,
                        _ => now + period,
                    };
                    let next = if now >= next {
                        state.tick();
                        next + period
                    } else {
                        next
                    };
                    schedule = Some((state.generation, next));
                    next.saturating_duration_since(now).min(MAX_SLEEP)
                }
            }
        };
        thread::sleep(sleep);
    }
}

/// Generic clock (id 0x12D0B402, version 1).
///
/// # Example
///
/// ```rust
/// use libdcpu16::GenericClock;
///
/// let mut clock = GenericClock::new();
/// assert!(!clock.tick()); // off until a rate is programmed
///
/// clock.set_divider(1);   // 60 Hz
/// assert!(clock.tick());
/// assert_eq!(clock.ticks(), 1);
/// ```
pub struct GenericClock {
    shared: Shared,
    ticker: Option<Ticker>,
}

impl GenericClock {
    /// Hardware id reported by HWQ.
    pub const ID: u32 = 0x12D0_B402;
    /// Hardware version reported by HWQ.
    pub const VERSION: u16 = 1;

    /// Creates a stopped clock with no rate programmed.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(ClockState::default())),
            ticker: None,
        }
    }

    /// Advances the clock by one tick, as the ticker thread would.
    ///
    /// Returns false (and does nothing) while the clock is off.
    pub fn tick(&mut self) -> bool {
        lock(&self.shared).tick()
    }

    /// Programs the rate divider directly, as `SET_RATE` does.
    pub fn set_divider(&mut self, divider: u16) {
        let mut state = lock(&self.shared);
        state.divider = divider;
        state.ticks = 0;
        state.generation += 1;
    }

    /// Current rate divider (0 = off).
    pub fn divider(&self) -> u16 {
        lock(&self.shared).divider
    }

    /// Ticks since the rate was last set.
    pub fn ticks(&self) -> u16 {
        lock(&self.shared).ticks
    }

    /// Current interrupt message (0 = disabled).
    pub fn interrupt_message(&self) -> u16 {
        lock(&self.shared).interrupt_message
    }

    /// Returns true while the ticker thread is running.
    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }
}

impl Default for GenericClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for GenericClock {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for GenericClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenericClock")
            .field("divider", &self.divider())
            .field("ticks", &self.ticks())
            .field("running", &self.is_running())
            .finish()
    }
}

impl Device for GenericClock {
    fn info(&self) -> DeviceInfo {
        DeviceInfo {
            id: Self::ID,
            version: Self::VERSION,
            manufacturer: 0,
        }
    }

    fn connect(&mut self, line: InterruptLine) {
        lock(&self.shared).line = Some(line);
    }

    fn interrupt(&mut self, ctx: &mut DeviceContext<'_>) -> Result<u16, DeviceError> {
        match ctx.register(Register::A) {
            command::SET_RATE => self.set_divider(ctx.register(Register::B)),
            command::GET_TICKS => ctx.set_register(Register::C, self.ticks()),
            command::SET_INT => lock(&self.shared).interrupt_message = ctx.register(Register::B),
            other => {
                return Err(DeviceError::InvalidCommand {
                    device: "generic clock",
                    command: other,
                })
            }
        }

        Ok(0)
    }

    fn start(&mut self) {
        if self.ticker.is_some() {
            return;
        }

        let stop = Arc::new(AtomicBool::new(false));
        let shared = Arc::clone(&self.shared);
        let flag = Arc::clone(&stop);

        match thread::Builder::new()
            .name("dcpu16-clock".into())
            .spawn(move || run_ticker(shared, flag))
        {
            Ok(thread) => self.ticker = Some(Ticker { stop, thread }),
            Err(err) => log::error!("failed to start clock thread: {}", err),
        }
    }

    fn stop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.stop.store(true, Ordering::Release);
            if ticker.thread.join().is_err() {
                log::warn!("clock thread panicked");
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::InterruptController;

    #[test]
    fn test_clock_is_off_by_default() {
        let mut clock = GenericClock::new();
        assert!(!clock.tick());
        assert_eq!(clock.ticks(), 0);
    }

    #[test]
    fn test_set_divider_resets_ticks() {
        let mut clock = GenericClock::new();
        clock.set_divider(2);
        clock.tick();
        clock.tick();
        assert_eq!(clock.ticks(), 2);

        clock.set_divider(3);
        assert_eq!(clock.ticks(), 0);
    }

    #[test]
    fn test_tick_raises_message() {
        let interrupts = InterruptController::default();
        let mut clock = GenericClock::new();
        clock.connect(interrupts.line_for_device(3));
        clock.set_divider(1);
        lock(&clock.shared).interrupt_message = 0x0042;

        clock.tick();

        let interrupt = interrupts.poll().unwrap();
        assert_eq!(interrupt.message, 0x0042);
    }

    #[test]
    fn test_period_from_divider() {
        let mut state = ClockState::default();
        assert_eq!(state.period(), None);

        state.divider = 60;
        assert_eq!(state.period(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_start_stop_is_idempotent() {
        let mut clock = GenericClock::new();
        clock.start();
        clock.start();
        assert!(clock.is_running());

        clock.stop();
        clock.stop();
        assert!(!clock.is_running());
    }
}
