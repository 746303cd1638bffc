use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyCode};

use crate::input::KeyPress;
use crate::session::Session;

/// Host-level event, already decoded for the engine. Terminal noise the
/// engine never consumes (arrows, function keys, bare modifiers) is dropped
/// at the source.
#[derive(Clone, Copy, Debug)]
pub enum WaveEvent {
    /// A keystroke the engine can consume.
    Press(KeyPress),
    /// Escape: leave the current screen.
    Cancel,
    Resize,
    Tick,
}

/// Source of decoded events for the app runner.
pub trait WaveEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<WaveEvent, RecvTimeoutError>;
}

/// A plain channel works as a source; tests feed one directly.
impl WaveEventSource for Receiver<WaveEvent> {
    fn recv_timeout(&self, timeout: Duration) -> Result<WaveEvent, RecvTimeoutError> {
        Receiver::recv_timeout(self, timeout)
    }
}

/// Production source: a reader thread decoding crossterm events into
/// engine presses.
pub struct CrosstermEventSource {
    rx: Receiver<WaveEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let decoded = match event::read() {
                Ok(CtEvent::Key(key)) if key.code == KeyCode::Esc => Some(WaveEvent::Cancel),
                Ok(CtEvent::Key(key)) => KeyPress::from_crossterm(&key).map(WaveEvent::Press),
                Ok(CtEvent::Resize(_, _)) => Some(WaveEvent::Resize),
                Ok(_) => None,
                Err(_) => break,
            };
            if let Some(ev) = decoded {
                if tx.send(ev).is_err() {
                    break;
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

impl WaveEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<WaveEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Advances the app one event or tick at a time. All session timing runs
/// through `step`, which makes keystrokes and countdown expiry a single
/// serialized stream: whichever arrives first is handled first, and a
/// keystroke that trails the expiring tick lands on an ended session.
pub struct Runner<E: WaveEventSource> {
    source: E,
    tick_interval: Duration,
}

impl<E: WaveEventSource> Runner<E> {
    pub fn new(source: E, tick_interval: Duration) -> Self {
        Self {
            source,
            tick_interval,
        }
    }

    /// Wait up to one tick interval for the next event. On timeout the
    /// session clock is checked right here, so a run never outlives its
    /// countdown by more than one interval.
    pub fn step(&self, session: &mut Session) -> WaveEvent {
        match self.source.recv_timeout(self.tick_interval) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                session.on_tick();
                WaveEvent::Tick
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::corpus::{Corpus, SeededSource, TextGenerator};
    use crate::input::apply_key;
    use crate::session::Phase;
    use std::sync::mpsc;
    use std::sync::Arc;

    fn quick_session(secs: f64) -> (Session, Arc<ManualClock>) {
        let corpus = Corpus::from_words("pets", vec!["cat".into()]).unwrap();
        let gen = TextGenerator::with_source(corpus, Box::new(SeededSource::new(0)));
        let clock = Arc::new(ManualClock::default());
        let session = Session::new(gen, secs, 1)
            .unwrap()
            .with_clock(clock.clone());
        (session, clock)
    }

    #[test]
    fn timeout_checks_the_session_countdown() {
        let (mut session, clock) = quick_session(30.0);
        apply_key(&mut session, KeyPress::plain('c'));
        clock.advance(Duration::from_secs(31));

        let (_tx, rx) = mpsc::channel();
        let runner = Runner::new(rx, Duration::from_millis(1));

        match runner.step(&mut session) {
            WaveEvent::Tick => {}
            other => panic!("expected Tick on timeout, got {other:?}"),
        }
        assert_eq!(session.phase, Phase::Ended, "step expires the countdown");
    }

    #[test]
    fn queued_press_arrives_before_any_tick() {
        let (mut session, clock) = quick_session(30.0);
        apply_key(&mut session, KeyPress::plain('c'));
        clock.advance(Duration::from_secs(31));

        let (tx, rx) = mpsc::channel();
        tx.send(WaveEvent::Press(KeyPress::plain('a'))).unwrap();
        let runner = Runner::new(rx, Duration::from_millis(10));

        // The queued press is delivered as-is; step itself never applies
        // keystrokes, so the session is untouched even though time is up.
        match runner.step(&mut session) {
            WaveEvent::Press(press) => assert_eq!(press, KeyPress::plain('a')),
            other => panic!("expected the queued press, got {other:?}"),
        }
        assert_eq!(session.phase, Phase::Running);

        // The following timeout expires the run; the late press is ignored.
        match runner.step(&mut session) {
            WaveEvent::Tick => {}
            other => panic!("expected Tick, got {other:?}"),
        }
        assert_eq!(session.phase, Phase::Ended);
    }

    #[test]
    fn cancel_and_resize_pass_through_untouched() {
        let (mut session, _) = quick_session(30.0);

        let (tx, rx) = mpsc::channel();
        tx.send(WaveEvent::Cancel).unwrap();
        tx.send(WaveEvent::Resize).unwrap();
        let runner = Runner::new(rx, Duration::from_millis(10));

        assert!(matches!(runner.step(&mut session), WaveEvent::Cancel));
        assert!(matches!(runner.step(&mut session), WaveEvent::Resize));
        assert_eq!(session.phase, Phase::Idle);
    }
}
