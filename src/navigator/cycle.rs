//! One scored, time-boxed instance of guiding the user through an action.

use std::time::Duration;

use tokio::time::Instant;

use crate::action::Action;

const POLL_QUALITY_OFFSET: f64 = -0.5;
const POLL_QUALITY_DIVISOR: f64 = 22.0;
const MAX_SCORE: f64 = 1.0;

/// How an action cycle ended. Both are normal completions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleEnd {
    ScoreExhausted,
    DeadlineReached,
}

/// An action being polled.
///
/// The score starts at 1 and drifts each poll by how well the heading matches the
/// target: up (capped at 1) while quality is above one half, down otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionCycle {
    action: Action,
    score: f64,
    deadline: Instant,
    next_poll: Instant,
    poll_interval: Duration,
    polls: u32,
}

impl ActionCycle {
    pub fn new(
        action: Action,
        started: Instant,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            action,
            score: MAX_SCORE,
            deadline: started + timeout,
            next_poll: started + poll_interval,
            poll_interval,
            polls: 0,
        }
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn next_poll(&self) -> Instant {
        self.next_poll
    }

    pub fn polls(&self) -> u32 {
        self.polls
    }

    /// Applies one poll observed at `now`.
    pub fn tick(&mut self, quality: f64, now: Instant) -> Option<CycleEnd> {
        self.polls += 1;
        let gain = (quality + POLL_QUALITY_OFFSET) / POLL_QUALITY_DIVISOR;
        self.score = (self.score + gain).min(MAX_SCORE);
        self.next_poll = now + self.poll_interval;

        if self.score <= 0.0 {
            Some(CycleEnd::ScoreExhausted)
        } else if now >= self.deadline {
            Some(CycleEnd::DeadlineReached)
        } else {
            None
        }
    }

    /// Postpones the next poll without scoring, for when no heading is available.
    pub fn skip(&mut self, now: Instant) {
        self.next_poll = now + self.poll_interval;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLL: Duration = Duration::from_secs(1);

    /// Feeds `quality(n)` for poll `n` until the cycle ends.
    fn run(timeout_secs: u64, quality: impl Fn(u32) -> f64) -> (CycleEnd, ActionCycle) {
        let start = Instant::now();
        let timeout = Duration::from_secs(timeout_secs);
        let mut cycle = ActionCycle::new(Action::Left, start, timeout, POLL);
        loop {
            let now = cycle.next_poll();
            let q = quality(cycle.polls() + 1);
            if let Some(end) = cycle.tick(q, now) {
                return (end, cycle);
            }
            assert!(cycle.polls() < 10_000, "cycle never ended");
        }
    }

    #[test]
    fn aligned_heading_runs_to_deadline() {
        let (end, cycle) = run(60, |_| 1.0);
        assert_eq!(end, CycleEnd::DeadlineReached);
        assert_eq!(cycle.polls(), 60);
        assert_eq!(cycle.score(), 1.0);
    }

    #[test]
    fn opposing_heading_exhausts_score_first() {
        let (end, cycle) = run(60, |_| -1.0);
        assert_eq!(end, CycleEnd::ScoreExhausted);
        // 1 - 15 * 1.5 / 22 is the first non-positive score.
        assert_eq!(cycle.polls(), 15);
        assert!(cycle.score() <= 0.0);
    }

    #[test]
    fn score_recovers_only_up_to_the_cap() {
        // Ten bad polls, then aligned: the score climbs back but never past 1.
        let (end, cycle) = run(60, |n| if n <= 10 { -1.0 } else { 1.0 });
        assert_eq!(end, CycleEnd::DeadlineReached);
        assert_eq!(cycle.score(), 1.0);
    }

    #[test]
    fn neutral_quality_keeps_score_flat() {
        let (end, cycle) = run(5, |_| 0.5);
        assert_eq!(end, CycleEnd::DeadlineReached);
        assert_eq!(cycle.polls(), 5);
        assert_eq!(cycle.score(), 1.0);
    }

    #[test]
    fn skip_defers_without_scoring() {
        let start = Instant::now();
        let mut cycle = ActionCycle::new(Action::Back, start, Duration::from_secs(60), POLL);
        cycle.skip(start + POLL);
        assert_eq!(cycle.polls(), 0);
        assert_eq!(cycle.next_poll(), start + 2 * POLL);
        assert_eq!(cycle.deadline(), start + Duration::from_secs(60));
    }
}
