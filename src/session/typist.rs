use std::time::{Duration, Instant};

use crate::session::timer::{SessionMetrics, SessionTimer};

/// Supplies practice lines to a [`TypingSession`].
pub trait PromptSource {
    fn new_prompt(&mut self) -> Option<String>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// No prompt to type.
    Idle,
    InProgress,
    /// The last character was rejected; the error flash is still showing.
    Correcting,
}

/// What a single change of the practice field did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InputOutcome {
    /// The newest character did not match the prompt at its position.
    pub typo: bool,
    /// The field no longer matched the prompt prefix and was cut back.
    pub rejected: bool,
    /// The prompt was typed in full and a new one was requested.
    pub completed: bool,
    pub metrics: Option<SessionMetrics>,
}

/// Matches the practice field against the prompt after every keystroke.
///
/// Mistakes are counted from the newest character only, while flow control
/// compares the whole field against the prompt prefix. A keystroke can
/// therefore be counted as a typo and rolled back at once, and a field that
/// was already wrong earlier is rolled back without counting a new typo.
#[derive(Clone, Debug)]
pub struct TypingSession {
    target: Option<Vec<char>>,
    input: String,
    timer: SessionTimer,
    error_flash: Duration,
    error_until: Option<Instant>,
    last_metrics: Option<SessionMetrics>,
}

impl TypingSession {
    pub fn new(error_flash: Duration) -> Self {
        Self {
            target: None,
            input: String::new(),
            timer: SessionTimer::default(),
            error_flash,
            error_until: None,
            last_metrics: None,
        }
    }

    /// Replace the prompt with a fresh one from `source` and restart the
    /// attempt. Returns `false` (and goes idle) when the source has nothing.
    pub fn new_prompt(&mut self, source: &mut dyn PromptSource, now: Instant) -> bool {
        self.input.clear();
        self.error_until = None;
        self.target = source.new_prompt().map(|text| text.chars().collect());
        match self.target {
            Some(ref target) => {
                self.timer.start(target.len(), now);
                tracing::trace!(len = target.len(), "new prompt");
                true
            }
            None => {
                tracing::debug!("no prompt available, session idle");
                false
            }
        }
    }

    /// Append a typed character to the field.
    pub fn type_char(
        &mut self,
        ch: char,
        source: &mut dyn PromptSource,
        now: Instant,
    ) -> InputOutcome {
        let mut value = self.input.clone();
        value.push(ch);
        self.on_input(&value, source, now)
    }

    /// Empty the field, which restarts the attempt.
    pub fn clear_input(&mut self, source: &mut dyn PromptSource, now: Instant) -> InputOutcome {
        self.on_input("", source, now)
    }

    /// React to the practice field now holding `value`.
    pub fn on_input(
        &mut self,
        value: &str,
        source: &mut dyn PromptSource,
        now: Instant,
    ) -> InputOutcome {
        let mut outcome = InputOutcome::default();
        let Some(ref target) = self.target else {
            return outcome;
        };
        let typed: Vec<char> = value.chars().collect();

        if typed.is_empty() {
            self.input.clear();
            self.timer.start(target.len(), now);
            return outcome;
        }

        let pos = typed.len() - 1;
        if pos == 0 {
            self.timer.start(target.len(), now);
        }

        if target.get(pos) != Some(&typed[pos]) {
            self.timer.typo();
            outcome.typo = true;
        }

        let prefix_correct = pos < target.len() && typed[..] == target[..=pos];
        if prefix_correct {
            self.input = value.to_string();
            if pos + 1 == target.len() {
                outcome.completed = true;
                outcome.metrics = self.timer.stop(now);
                if outcome.metrics.is_some() {
                    self.last_metrics = outcome.metrics;
                }
                self.new_prompt(source, now);
            }
        } else {
            self.error_until = Some(now + self.error_flash);
            outcome.rejected = true;
            self.input = typed[..pos].iter().collect();
        }

        outcome
    }

    /// The character the user should type next; what the keyboard highlights.
    pub fn next_char(&self) -> Option<char> {
        let target = self.target.as_ref()?;
        target.get(self.input.chars().count()).copied()
    }

    pub fn state(&self, now: Instant) -> SessionState {
        if self.target.is_none() {
            SessionState::Idle
        } else if self.is_flashing_error(now) {
            SessionState::Correcting
        } else {
            SessionState::InProgress
        }
    }

    pub fn is_flashing_error(&self, now: Instant) -> bool {
        self.error_until.is_some_and(|until| until > now)
    }

    pub fn target(&self) -> Option<&[char]> {
        self.target.as_deref()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn typed_len(&self) -> usize {
        self.input.chars().count()
    }

    pub fn mistakes(&self) -> u32 {
        self.timer.typos()
    }

    pub fn elapsed_secs(&self, now: Instant) -> f64 {
        self.timer.elapsed_secs(now)
    }

    /// Metrics of the most recent completion that lasted at least a second.
    pub fn last_metrics(&self) -> Option<SessionMetrics> {
        self.last_metrics
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;

    /// Hands out queued prompts and counts requests.
    struct Prompts {
        queue: VecDeque<String>,
        requests: usize,
    }

    impl Prompts {
        fn new(prompts: &[&str]) -> Self {
            Self {
                queue: prompts.iter().map(|s| s.to_string()).collect(),
                requests: 0,
            }
        }
    }

    impl PromptSource for Prompts {
        fn new_prompt(&mut self) -> Option<String> {
            self.requests += 1;
            self.queue.pop_front()
        }
    }

    fn session_with(prompts: &mut Prompts, now: Instant) -> TypingSession {
        let mut session = TypingSession::new(Duration::from_millis(150));
        assert!(session.new_prompt(prompts, now));
        session
    }

    #[test]
    fn test_mistyped_fifth_char_is_counted_and_rolled_back() {
        let t0 = Instant::now();
        let mut prompts = Prompts::new(&["the cat", "next"]);
        let mut session = session_with(&mut prompts, t0);

        for ch in ['t', 'h', 'e', ' '] {
            let outcome = session.type_char(ch, &mut prompts, t0);
            assert!(!outcome.typo && !outcome.rejected);
        }
        let outcome = session.type_char('x', &mut prompts, t0);
        assert!(outcome.typo);
        assert!(outcome.rejected);
        assert_eq!(session.mistakes(), 1);
        assert_eq!(session.input(), "the ");
        assert_eq!(session.next_char(), Some('c'));
        assert_eq!(session.state(t0), SessionState::Correcting);
        assert_eq!(
            session.state(t0 + Duration::from_millis(200)),
            SessionState::InProgress
        );
    }

    #[test]
    fn test_proper_prefixes_stay_in_progress() {
        let t0 = Instant::now();
        let target = "jumps over";
        let mut prompts = Prompts::new(&[target]);
        let mut session = session_with(&mut prompts, t0);

        let chars: Vec<char> = target.chars().collect();
        for end in 1..chars.len() {
            let prefix: String = chars[..end].iter().collect();
            let outcome = session.on_input(&prefix, &mut prompts, t0);
            assert_eq!(outcome, InputOutcome::default());
            assert_eq!(session.state(t0), SessionState::InProgress);
            assert_eq!(session.mistakes(), 0);
        }
        assert_eq!(prompts.requests, 1);
    }

    #[test]
    fn test_mistake_counter_tracks_only_newest_char() {
        let t0 = Instant::now();
        let mut prompts = Prompts::new(&["abcd"]);
        let mut session = session_with(&mut prompts, t0);

        session.on_input("a", &mut prompts, t0);
        session.on_input("ab", &mut prompts, t0);
        assert_eq!(session.mistakes(), 0);

        // wrong newest char
        session.on_input("abx", &mut prompts, t0);
        assert_eq!(session.mistakes(), 1);
        assert_eq!(session.input(), "ab");

        // earlier position wrong, newest matches: rolled back, not counted
        let outcome = session.on_input("xbc", &mut prompts, t0);
        assert!(!outcome.typo);
        assert!(outcome.rejected);
        assert_eq!(session.mistakes(), 1);
        assert_eq!(session.input(), "xb");
    }

    #[test]
    fn test_full_target_completes_once_and_requests_one_prompt() {
        let t0 = Instant::now();
        let mut prompts = Prompts::new(&["ab", "cd"]);
        let mut session = session_with(&mut prompts, t0);
        assert_eq!(prompts.requests, 1);

        let first = session.type_char('a', &mut prompts, t0);
        assert!(!first.completed);
        let done = session.type_char('b', &mut prompts, t0 + Duration::from_secs(2));
        assert!(done.completed);
        assert_eq!(prompts.requests, 2);

        assert_eq!(session.target().unwrap(), &['c', 'd']);
        assert_eq!(session.input(), "");
        assert_eq!(session.next_char(), Some('c'));
    }

    #[test]
    fn test_completion_publishes_speed_and_errors() {
        let t0 = Instant::now();
        let target = "x".repeat(60);
        let mut prompts = Prompts::new(&[&target, "more"]);
        let mut session = session_with(&mut prompts, t0);

        session.type_char('y', &mut prompts, t0);
        assert_eq!(session.mistakes(), 1);

        let mut outcome = InputOutcome::default();
        for i in 0..60 {
            let at = if i == 0 { t0 } else { t0 + Duration::from_secs(60) };
            outcome = session.type_char('x', &mut prompts, at);
        }
        assert!(outcome.completed);
        let metrics = outcome.metrics.unwrap();
        // the first correct 'x' is at pos 0 and restarts the timer and count
        assert_eq!(metrics.speed, 60);
        assert_eq!(metrics.errors, 0);
        assert_eq!(session.last_metrics(), Some(metrics));
    }

    #[test]
    fn test_fast_completion_publishes_nothing() {
        let t0 = Instant::now();
        let mut prompts = Prompts::new(&["a", "b"]);
        let mut session = session_with(&mut prompts, t0);
        let outcome = session.type_char('a', &mut prompts, t0 + Duration::from_millis(300));
        assert!(outcome.completed);
        assert_eq!(outcome.metrics, None);
        assert_eq!(session.last_metrics(), None);
    }

    #[test]
    fn test_empty_input_resets_attempt() {
        let t0 = Instant::now();
        let mut prompts = Prompts::new(&["abc"]);
        let mut session = session_with(&mut prompts, t0);

        session.on_input("x", &mut prompts, t0);
        assert_eq!(session.mistakes(), 1);

        let outcome = session.clear_input(&mut prompts, t0);
        assert_eq!(outcome, InputOutcome::default());
        assert_eq!(session.mistakes(), 0);
        assert_eq!(session.next_char(), Some('a'));
        assert_eq!(prompts.requests, 1);
    }

    #[test]
    fn test_input_longer_than_target_is_rejected() {
        let t0 = Instant::now();
        let mut prompts = Prompts::new(&["ab"]);
        let mut session = session_with(&mut prompts, t0);
        let outcome = session.on_input("abc", &mut prompts, t0);
        assert!(outcome.typo);
        assert!(outcome.rejected);
        assert_eq!(session.input(), "ab");
    }

    #[test]
    fn test_exhausted_source_goes_idle_and_ignores_input() {
        let t0 = Instant::now();
        let mut prompts = Prompts::new(&["a"]);
        let mut session = session_with(&mut prompts, t0);

        let outcome = session.type_char('a', &mut prompts, t0);
        assert!(outcome.completed);
        assert_eq!(session.state(t0), SessionState::Idle);
        assert_eq!(session.next_char(), None);

        let outcome = session.type_char('a', &mut prompts, t0);
        assert_eq!(outcome, InputOutcome::default());
        assert_eq!(session.input(), "");
    }

    #[test]
    fn test_multibyte_prompt() {
        let t0 = Instant::now();
        let mut prompts = Prompts::new(&["été"]);
        let mut session = session_with(&mut prompts, t0);
        session.type_char('é', &mut prompts, t0);
        session.type_char('e', &mut prompts, t0);
        assert_eq!(session.input(), "é");
        assert_eq!(session.next_char(), Some('t'));
    }
}
