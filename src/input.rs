use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::session::{Phase, Session, Verdict};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
    pub shift: bool,
}

impl Modifiers {
    /// True when a chord modifier (not plain shift) is held.
    pub fn chorded(&self) -> bool {
        self.ctrl || self.alt || self.meta
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Backspace,
    Other,
}

/// An already-decoded key event handed in by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub mods: Modifiers,
}

impl KeyPress {
    pub fn plain(c: char) -> Self {
        Self {
            key: Key::Char(c),
            mods: Modifiers::default(),
        }
    }

    pub fn backspace() -> Self {
        Self {
            key: Key::Backspace,
            mods: Modifiers::default(),
        }
    }

    pub fn chord(c: char) -> Self {
        Self {
            key: Key::Char(c),
            mods: Modifiers {
                ctrl: true,
                ..Modifiers::default()
            },
        }
    }

    /// Decode a crossterm key event. Returns None for keys the engine never
    /// consumes (arrows, function keys, bare modifiers).
    pub fn from_crossterm(event: &KeyEvent) -> Option<Self> {
        let mods = Modifiers {
            ctrl: event.modifiers.contains(KeyModifiers::CONTROL),
            alt: event.modifiers.contains(KeyModifiers::ALT),
            meta: event.modifiers.contains(KeyModifiers::SUPER),
            shift: event.modifiers.contains(KeyModifiers::SHIFT),
        };
        match event.code {
            KeyCode::Char(c) => Some(Self {
                key: Key::Char(c),
                mods,
            }),
            KeyCode::Backspace => Some(Self {
                key: Key::Backspace,
                mods,
            }),
            _ => None,
        }
    }
}

/// What a key press did to the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyOutcome {
    Correct,
    Incorrect,
    Extended,
    Erased,
    BonusTime,
    Ignored,
}

/// Apply one key press to the session.
///
/// Counting rules: every counted printable key bumps `keystroke_count` and
/// exactly one of the correct/error counters, and advances the cursor by one.
/// Modifier-only presses, the bonus chord, the frontier space, and backspace
/// never touch the keystroke counters.
pub fn apply_key(session: &mut Session, press: KeyPress) -> KeyOutcome {
    // Stray events after the end are expected; swallow them.
    if session.phase == Phase::Ended {
        return KeyOutcome::Ignored;
    }

    if press.mods.chorded() {
        // Ctrl/Alt/Meta plus a key is the bonus-time cheat, never typed text.
        return match press.key {
            Key::Char(_) if session.add_bonus_time() => KeyOutcome::BonusTime,
            _ => KeyOutcome::Ignored,
        };
    }

    match press.key {
        Key::Other => KeyOutcome::Ignored,
        Key::Backspace => {
            if session.allow_backspace && session.cursor > 0 {
                session.cursor -= 1;
                session.slots[session.cursor].verdict = Verdict::Pending;
                KeyOutcome::Erased
            } else {
                KeyOutcome::Ignored
            }
        }
        Key::Char(c) => {
            if session.cursor == session.slots.len() {
                // Frontier: a space fetches more text and is not counted as
                // typed against any slot. Anything else is not accepted and
                // must leave an idle session idle.
                if c == ' ' {
                    session.begin();
                    session.extend_target();
                    return KeyOutcome::Extended;
                }
                return KeyOutcome::Ignored;
            }

            session.begin();
            session.keystroke_count += 1;
            let cursor = session.cursor;
            let outcome = if c == session.slots[cursor].expected {
                session.slots[cursor].verdict = Verdict::Correct;
                session.correct_count += 1;
                session.last_was_error = false;
                KeyOutcome::Correct
            } else {
                session.slots[cursor].verdict = Verdict::Incorrect;
                session.error_count += 1;
                session.last_was_error = true;
                KeyOutcome::Incorrect
            };
            session.cursor += 1;
            outcome
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{Corpus, SeededSource, TextGenerator};
    use crate::session::Session;
    use assert_matches::assert_matches;

    fn fixed_session(target: &str) -> Session {
        // A single-word corpus drawn once makes the target text exact.
        let corpus = Corpus::from_words("fixed", vec![target.to_string()]).unwrap();
        let gen = TextGenerator::with_source(corpus, Box::new(SeededSource::new(0)));
        let session = Session::new(gen, 60.0, 1).unwrap();
        assert_eq!(session.target_text(), target);
        session
    }

    fn type_str(session: &mut Session, text: &str) {
        for c in text.chars() {
            apply_key(session, KeyPress::plain(c));
        }
    }

    #[test]
    fn all_correct_keystrokes() {
        let mut session = fixed_session("cat dog");

        type_str(&mut session, "cat dog");

        assert_eq!(session.correct_count, 7);
        assert_eq!(session.error_count, 0);
        assert_eq!(session.keystroke_count, 7);
        assert_eq!(session.cursor, 7);
    }

    #[test]
    fn mismatch_marks_slot_and_advances() {
        let mut session = fixed_session("cat dog");

        type_str(&mut session, "cxt ");

        assert_eq!(session.slots[0].verdict, Verdict::Correct);
        assert_eq!(session.slots[1].verdict, Verdict::Incorrect);
        assert_eq!(session.slots[2].verdict, Verdict::Correct);
        assert_eq!(session.slots[3].verdict, Verdict::Correct);
        assert_eq!(session.correct_count, 3);
        assert_eq!(session.error_count, 1);
        assert_eq!(session.keystroke_count, 4);
        assert_eq!(session.live_error_rate(), 25.0);
    }

    #[test]
    fn counted_keys_balance_the_counters() {
        let mut session = fixed_session("cat dog");

        type_str(&mut session, "cxt dzg");

        assert_eq!(
            session.correct_count + session.error_count,
            session.keystroke_count
        );
    }

    #[test]
    fn last_was_error_tracks_the_most_recent_key() {
        let mut session = fixed_session("cat");

        apply_key(&mut session, KeyPress::plain('x'));
        assert!(session.last_was_error);

        apply_key(&mut session, KeyPress::plain('a'));
        assert!(!session.last_was_error);
    }

    #[test]
    fn frontier_space_extends_without_counting() {
        let mut session = fixed_session("cat");
        type_str(&mut session, "cat");
        let old_len = session.slots.len();
        assert_eq!(session.cursor, old_len);

        let outcome = apply_key(&mut session, KeyPress::plain(' '));

        assert_eq!(outcome, KeyOutcome::Extended);
        assert!(session.slots.len() > old_len);
        assert_eq!(session.cursor, old_len, "extension does not move the cursor");
        assert_eq!(session.keystroke_count, 3, "the trigger space is not counted");
    }

    #[test]
    fn frontier_non_space_is_ignored() {
        let mut session = fixed_session("cat");
        type_str(&mut session, "cat");
        let old_len = session.slots.len();

        let outcome = apply_key(&mut session, KeyPress::plain('q'));

        assert_eq!(outcome, KeyOutcome::Ignored);
        assert_eq!(session.slots.len(), old_len);
        assert_eq!(session.keystroke_count, 3);
    }

    #[test]
    fn cursor_never_exceeds_target_length() {
        let mut session = fixed_session("ab");

        type_str(&mut session, "ab");
        assert!(session.cursor <= session.slots.len());

        // Space at the frontier materializes more slots before anything else
        // could read out of bounds.
        apply_key(&mut session, KeyPress::plain(' '));
        assert!(session.cursor < session.slots.len());
    }

    #[test]
    fn backspace_clears_the_verdict_but_not_the_counters() {
        let mut session = fixed_session("cat");

        apply_key(&mut session, KeyPress::plain('x'));
        assert_eq!(session.error_count, 1);

        let outcome = apply_key(&mut session, KeyPress::backspace());

        assert_eq!(outcome, KeyOutcome::Erased);
        assert_eq!(session.cursor, 0);
        assert_eq!(session.slots[0].verdict, Verdict::Pending);
        // Counters are deliberately not rolled back.
        assert_eq!(session.error_count, 1);
        assert_eq!(session.keystroke_count, 1);
    }

    #[test]
    fn backspace_at_start_is_ignored() {
        let mut session = fixed_session("cat");
        assert_eq!(apply_key(&mut session, KeyPress::backspace()), KeyOutcome::Ignored);
        assert_eq!(session.cursor, 0);
    }

    #[test]
    fn backspace_can_be_disabled() {
        let mut session = fixed_session("cat");
        session.allow_backspace = false;

        apply_key(&mut session, KeyPress::plain('c'));
        let outcome = apply_key(&mut session, KeyPress::backspace());

        assert_eq!(outcome, KeyOutcome::Ignored);
        assert_eq!(session.cursor, 1);
    }

    #[test]
    fn chord_triggers_bonus_time_not_typing() {
        let mut session = fixed_session("cat");

        // Start the run first; the cheat only works mid-run.
        apply_key(&mut session, KeyPress::plain('c'));
        let outcome = apply_key(&mut session, KeyPress::chord('t'));

        assert_eq!(outcome, KeyOutcome::BonusTime);
        assert_eq!(session.bonus_uses, 1);
        assert_eq!(session.cursor, 1, "chorded key is never typed");
        assert_eq!(session.keystroke_count, 1);
    }

    #[test]
    fn chord_before_the_run_starts_is_ignored() {
        let mut session = fixed_session("cat");
        assert_eq!(apply_key(&mut session, KeyPress::chord('t')), KeyOutcome::Ignored);
        assert_eq!(session.phase, Phase::Idle);
    }

    #[test]
    fn first_printable_key_starts_the_run() {
        let mut session = fixed_session("cat");
        assert_eq!(session.phase, Phase::Idle);

        apply_key(&mut session, KeyPress::plain('c'));

        assert_eq!(session.phase, Phase::Running);
    }

    #[test]
    fn rejected_frontier_key_does_not_start_the_run() {
        // An empty corpus word yields a zero-length target, so the cursor
        // sits at the frontier before anything has been typed.
        let corpus = Corpus::from_words("blank", vec![String::new()]).unwrap();
        let gen = TextGenerator::with_source(corpus, Box::new(SeededSource::new(0)));
        let mut session = Session::new(gen, 60.0, 1).unwrap();
        assert!(session.slots.is_empty());

        assert_eq!(apply_key(&mut session, KeyPress::plain('q')), KeyOutcome::Ignored);
        assert_eq!(session.phase, Phase::Idle, "a rejected key must not start the run");

        // The extension space is accepted and does start it.
        assert_eq!(apply_key(&mut session, KeyPress::plain(' ')), KeyOutcome::Extended);
        assert_eq!(session.phase, Phase::Running);
    }

    #[test]
    fn keys_after_end_are_ignored() {
        let mut session = fixed_session("cat");

        apply_key(&mut session, KeyPress::plain('c'));
        session.end();

        assert_eq!(apply_key(&mut session, KeyPress::plain('a')), KeyOutcome::Ignored);
        assert_eq!(session.cursor, 1);
    }

    #[test]
    fn shift_alone_does_not_chord() {
        let mods = Modifiers {
            shift: true,
            ..Modifiers::default()
        };
        assert!(!mods.chorded());
    }

    #[test]
    fn from_crossterm_decodes_chars_and_backspace() {
        let ev = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE);
        assert_matches!(
            KeyPress::from_crossterm(&ev),
            Some(KeyPress {
                key: Key::Char('a'),
                ..
            })
        );

        let ev = KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE);
        assert_matches!(
            KeyPress::from_crossterm(&ev),
            Some(KeyPress {
                key: Key::Backspace,
                ..
            })
        );

        let ev = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
        assert_matches!(KeyPress::from_crossterm(&ev), None);

        let ev = KeyEvent::new(KeyCode::Char('t'), KeyModifiers::CONTROL);
        let press = KeyPress::from_crossterm(&ev).unwrap();
        assert!(press.mods.ctrl);
        assert!(press.mods.chorded());
    }
}
