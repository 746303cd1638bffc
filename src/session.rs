use std::sync::Arc;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};
use crate::corpus::TextGenerator;
use crate::error::ConfigError;
use crate::scoring;

pub const DEFAULT_DURATION_SECS: f64 = 60.0;
pub const DEFAULT_INITIAL_WORDS: usize = 50;

/// Seconds granted per bonus-time activation (the modifier-chord cheat).
pub const BONUS_SECS: f64 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Pending,
    Correct,
    Incorrect,
}

/// One position of the target text: the expected character plus what the
/// typist did to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Slot {
    pub expected: char,
    pub verdict: Verdict,
}

impl Slot {
    pub fn pending(expected: char) -> Self {
        Self {
            expected,
            verdict: Verdict::Pending,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Ended,
}

/// Finalized scores, frozen on entry to `Ended` and handed to the history
/// store as the per-test result record.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestRecord {
    pub wpm: f64,
    pub error_rate: f64,
    pub duration_secs: f64,
    pub error_count: usize,
}

/// The authoritative model of one typing attempt.
///
/// Lifecycle is Idle -> Running -> Ended -> (reset) -> Idle. The first
/// accepted keystroke starts the run; the countdown reaching zero or an
/// explicit `end()` finishes it. Elapsed time is always derived from the
/// start timestamp, never from counting ticks.
pub struct Session {
    generator: TextGenerator,
    clock: Arc<dyn Clock>,
    pub slots: Vec<Slot>,
    pub cursor: usize,
    pub correct_count: usize,
    pub error_count: usize,
    pub keystroke_count: usize,
    pub last_was_error: bool,
    pub phase: Phase,
    pub duration_secs: f64,
    pub bonus_secs: f64,
    pub bonus_uses: u32,
    pub allow_backspace: bool,
    initial_words: usize,
    started_at: Option<SystemTime>,
    final_elapsed: Option<f64>,
    outcome: Option<TestRecord>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("cursor", &self.cursor)
            .field("correct_count", &self.correct_count)
            .field("error_count", &self.error_count)
            .field("keystroke_count", &self.keystroke_count)
            .field("phase", &self.phase)
            .field("duration_secs", &self.duration_secs)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(
        generator: TextGenerator,
        duration_secs: f64,
        initial_words: usize,
    ) -> Result<Self, ConfigError> {
        if duration_secs <= 0.0 {
            return Err(ConfigError::NonPositiveDuration(duration_secs));
        }

        let mut session = Self {
            generator,
            clock: Arc::new(SystemClock),
            slots: Vec::new(),
            cursor: 0,
            correct_count: 0,
            error_count: 0,
            keystroke_count: 0,
            last_was_error: false,
            phase: Phase::Idle,
            duration_secs,
            bonus_secs: 0.0,
            bonus_uses: 0,
            allow_backspace: true,
            initial_words,
            started_at: None,
            final_elapsed: None,
            outcome: None,
        };
        session.materialize();
        Ok(session)
    }

    /// Swap the wall clock, for tests that drive time by hand.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn materialize(&mut self) {
        let prompt = self.generator.prompt(self.initial_words);
        self.slots = prompt.chars().map(Slot::pending).collect();
    }

    /// The target text as a plain string.
    pub fn target_text(&self) -> String {
        self.slots.iter().map(|s| s.expected).collect()
    }

    /// Idle -> Running on the first accepted keystroke.
    pub(crate) fn begin(&mut self) {
        if self.phase == Phase::Idle {
            self.phase = Phase::Running;
            self.started_at = Some(self.clock.now());
        }
    }

    /// Wall-clock seconds since the run started; frozen once ended.
    pub fn elapsed_secs(&self) -> f64 {
        if let Some(frozen) = self.final_elapsed {
            return frozen;
        }
        match self.started_at {
            Some(start) => self
                .clock
                .now()
                .duration_since(start)
                .unwrap_or_default()
                .as_secs_f64(),
            None => 0.0,
        }
    }

    /// Countdown seconds remaining, bonus time included.
    pub fn time_left(&self) -> f64 {
        (self.duration_secs + self.bonus_secs - self.elapsed_secs()).max(0.0)
    }

    /// Periodic driver called by the host event loop. Ends the run once the
    /// countdown is exhausted; harmless in any other phase, including after a
    /// reset (a stale tick cannot revive a fresh session).
    pub fn on_tick(&mut self) {
        if self.phase == Phase::Running && self.time_left() <= 0.0 {
            self.end();
        }
    }

    /// Running -> Ended. Freezes elapsed time and the final scores; later
    /// keystrokes and ticks are no-ops.
    pub fn end(&mut self) {
        if self.phase != Phase::Running {
            return;
        }
        let elapsed = self.elapsed_secs();
        self.phase = Phase::Ended;
        self.final_elapsed = Some(elapsed);
        self.outcome = Some(TestRecord {
            wpm: scoring::wpm(self.correct_count, elapsed),
            error_rate: scoring::error_rate(self.error_count, self.keystroke_count),
            duration_secs: elapsed,
            error_count: self.error_count,
        });
    }

    /// Any state -> Idle: fresh target text, zeroed counters, cleared start
    /// timestamp.
    pub fn reset(&mut self) {
        self.materialize();
        self.cursor = 0;
        self.correct_count = 0;
        self.error_count = 0;
        self.keystroke_count = 0;
        self.last_was_error = false;
        self.phase = Phase::Idle;
        self.bonus_secs = 0.0;
        self.bonus_uses = 0;
        self.started_at = None;
        self.final_elapsed = None;
        self.outcome = None;
    }

    /// Grant extra time mid-run. This is the deliberate modifier-chord cheat;
    /// its usage counter feeds the time-lord achievement tier.
    pub fn add_bonus_time(&mut self) -> bool {
        if self.phase != Phase::Running {
            return false;
        }
        self.bonus_secs += BONUS_SECS;
        self.bonus_uses += 1;
        true
    }

    /// Append a separator plus a fresh word batch at the frontier.
    pub(crate) fn extend_target(&mut self) {
        let mut text = self.target_text();
        self.generator.extend(&mut text);
        let tail: Vec<Slot> = text
            .chars()
            .skip(self.slots.len())
            .map(Slot::pending)
            .collect();
        self.slots.extend(tail);
    }

    pub fn live_wpm(&self) -> f64 {
        scoring::wpm(self.correct_count, self.elapsed_secs())
    }

    pub fn live_error_rate(&self) -> f64 {
        scoring::error_rate(self.error_count, self.keystroke_count)
    }

    pub fn outcome(&self) -> Option<&TestRecord> {
        self.outcome.as_ref()
    }
}
