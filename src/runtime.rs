use std::cell::Cell;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent};

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum DeskEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Anything the runner can wait on for host input.
pub trait DeskEventSource: Send + 'static {
    fn recv_timeout(&self, timeout: Duration) -> Result<DeskEvent, RecvTimeoutError>;
}

/// Keys and resizes the session host cares about; focus, mouse and paste
/// events are dropped.
fn translate(ev: CtEvent) -> Option<DeskEvent> {
    match ev {
        CtEvent::Key(key) => Some(DeskEvent::Key(key)),
        CtEvent::Resize(..) => Some(DeskEvent::Resize),
        _ => None,
    }
}

/// Reads the terminal on a background thread. The thread ends when this
/// source is dropped or the terminal read fails.
pub struct CrosstermEventSource {
    rx: Receiver<DeskEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let ev = match event::read() {
                Ok(ev) => ev,
                Err(err) => {
                    tracing::error!(%err, "terminal event reader stopped");
                    return;
                }
            };
            if let Some(desk) = translate(ev) {
                if tx.send(desk).is_err() {
                    return;
                }
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl DeskEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<DeskEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Spacing between session clock ticks.
pub trait Ticker: Send + 'static {
    fn interval(&self) -> Duration;
}

#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// The session clock: one tick per second.
    pub fn one_hz() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Channel-fed source for headless hosts: whatever is sent on the paired
/// `Sender` comes out of the runner in order.
pub struct TestEventSource {
    rx: Receiver<DeskEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<DeskEvent>) -> Self {
        Self { rx }
    }
}

impl DeskEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<DeskEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event/tick at a time.
///
/// Ticks are scheduled against a deadline, so a steady stream of key presses
/// cannot starve the clock. A late tick is emitted once and the schedule
/// restarts from now; missed intervals are not replayed.
pub struct Runner<E: DeskEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
    next_tick: Cell<Instant>,
}

impl<E: DeskEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        let next_tick = Cell::new(Instant::now() + ticker.interval());
        Self {
            event_source,
            ticker,
            next_tick,
        }
    }

    /// Blocks until the next event or the next tick deadline, whichever is first
    pub fn step(&self) -> DeskEvent {
        let now = Instant::now();
        let deadline = self.next_tick.get();
        if now >= deadline {
            return self.emit_tick(now);
        }

        match self.event_source.recv_timeout(deadline - now) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) => self.emit_tick(Instant::now()),
            Err(RecvTimeoutError::Disconnected) => {
                // nothing else will arrive; just keep the clock going
                std::thread::sleep(deadline.saturating_duration_since(Instant::now()));
                self.emit_tick(Instant::now())
            }
        }
    }

    /// Restart the tick schedule, e.g. after a resume.
    pub fn reset_clock(&self) {
        self.next_tick.set(Instant::now() + self.ticker.interval());
    }

    fn emit_tick(&self, now: Instant) -> DeskEvent {
        let interval = self.ticker.interval();
        let scheduled = self.next_tick.get() + interval;
        self.next_tick
            .set(if scheduled > now { scheduled } else { now + interval });
        DeskEvent::Tick
    }
}
