use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::TimerConfig;

/// Every n-th completed work session is followed by a long break
pub const LONG_BREAK_EVERY: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Work,
    ShortBreak,
    LongBreak,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Work => "Focus",
            Phase::ShortBreak => "Short break",
            Phase::LongBreak => "Long break",
        }
    }
}

/// What a tick changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Timer is not running, nothing changed
    Idle,
    Counting,
    /// Phase ended; the timer is stopped in the new phase
    PhaseChanged(Phase),
}

/// Pomodoro state machine. Time only moves through [`FocusTimer::tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusTimer {
    durations: TimerConfig,
    phase: Phase,
    remaining: u32,
    running: bool,
    completed_cycles: u32,
}

impl FocusTimer {
    pub fn new(durations: TimerConfig) -> Self {
        Self {
            remaining: durations.work_secs,
            durations,
            phase: Phase::Work,
            running: false,
            completed_cycles: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn completed_cycles(&self) -> u32 {
        self.completed_cycles
    }

    pub fn duration_of(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Work => self.durations.work_secs,
            Phase::ShortBreak => self.durations.short_break_secs,
            Phase::LongBreak => self.durations.long_break_secs,
        }
    }

    /// Start or pause. Returns the new running state.
    pub fn toggle(&mut self) -> bool {
        self.running = !self.running;
        self.running
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Back to a stopped, full work phase; completed cycles are kept
    pub fn reset(&mut self) {
        self.running = false;
        self.phase = Phase::Work;
        self.remaining = self.durations.work_secs;
    }

    pub fn tick(&mut self) -> TickOutcome {
        if !self.running {
            return TickOutcome::Idle;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining > 0 {
            return TickOutcome::Counting;
        }

        let next = match self.phase {
            Phase::Work => {
                self.completed_cycles += 1;
                if self.completed_cycles % LONG_BREAK_EVERY == 0 {
                    Phase::LongBreak
                } else {
                    Phase::ShortBreak
                }
            }
            Phase::ShortBreak | Phase::LongBreak => Phase::Work,
        };
        self.phase = next;
        self.remaining = self.duration_of(next);
        self.running = false;
        debug!(phase = ?next, cycles = self.completed_cycles, "focus phase changed");
        TickOutcome::PhaseChanged(next)
    }

    /// Elapsed share of the current phase, 0.0 ..= 1.0
    pub fn progress(&self) -> f64 {
        let total = self.duration_of(self.phase);
        if total == 0 {
            return 0.0;
        }
        let elapsed = total.saturating_sub(self.remaining);
        elapsed as f64 / total as f64
    }

    /// Remaining time as `MM:SS`
    pub fn display(&self) -> String {
        format!("{:02}:{:02}", self.remaining / 60, self.remaining % 60)
    }
}

/// Periodic callback running on the tokio runtime. Dropping it cancels it.
pub struct TickSchedule {
    handle: JoinHandle<()>,
}

impl TickSchedule {
    pub fn spawn<F>(runtime: &Handle, period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let handle = runtime.spawn(async move {
            let mut interval = tokio::time::interval(period);
            // the first tick of an interval completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                on_tick();
            }
        });
        Self { handle }
    }
}

impl Drop for TickSchedule {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A focus timer opened for one task, plus its running tick schedule.
/// Ticks carry the generation they were scheduled under; older ones are ignored.
pub struct FocusSession {
    pub task_title: String,
    pub timer: FocusTimer,
    schedule: Option<TickSchedule>,
    generation: u64,
}

impl FocusSession {
    pub fn new(task_title: String, durations: TimerConfig) -> Self {
        Self {
            task_title,
            timer: FocusTimer::new(durations),
            schedule: None,
            generation: 0,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start or pause. `schedule` builds the tick source for the given generation.
    pub fn toggle<S>(&mut self, schedule: S)
    where
        S: FnOnce(u64) -> TickSchedule,
    {
        if self.timer.toggle() {
            self.generation += 1;
            self.schedule = Some(schedule(self.generation));
        } else {
            self.stop_schedule();
        }
    }

    pub fn reset(&mut self) {
        self.stop_schedule();
        self.timer.reset();
    }

    /// Apply a tick from the scheduler
    pub fn on_tick(&mut self, generation: u64) -> TickOutcome {
        if generation != self.generation || self.schedule.is_none() {
            return TickOutcome::Idle;
        }
        let outcome = self.timer.tick();
        if let TickOutcome::PhaseChanged(_) = outcome {
            self.stop_schedule();
        }
        outcome
    }

    /// Closing a running session needs confirmation
    pub fn needs_close_confirmation(&self) -> bool {
        self.timer.is_running()
    }

    pub fn is_scheduled(&self) -> bool {
        self.schedule.is_some()
    }

    fn stop_schedule(&mut self) {
        self.timer.pause();
        self.generation += 1;
        self.schedule = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn running_timer() -> FocusTimer {
        let mut timer = FocusTimer::new(TimerConfig::default());
        timer.toggle();
        timer
    }

    fn finish_work(timer: &mut FocusTimer) {
        if !timer.is_running() {
            timer.toggle();
        }
        while timer.tick() != TickOutcome::PhaseChanged(timer.phase()) {}
    }

    #[test]
    fn work_session_ends_in_short_break() {
        let mut timer = running_timer();
        for _ in 0..1499 {
            assert_eq!(timer.tick(), TickOutcome::Counting);
        }
        assert_eq!(timer.tick(), TickOutcome::PhaseChanged(Phase::ShortBreak));
        assert_eq!(timer.completed_cycles(), 1);
        assert_eq!(timer.remaining(), 300);
        assert!(!timer.is_running());
    }

    #[test]
    fn fourth_work_session_ends_in_long_break() {
        let mut timer = FocusTimer::new(TimerConfig::default());
        for cycle in 1..=4 {
            finish_work(&mut timer);
            assert_eq!(timer.completed_cycles(), cycle);
            if cycle < 4 {
                assert_eq!(timer.phase(), Phase::ShortBreak);
                finish_work(&mut timer);
                assert_eq!(timer.phase(), Phase::Work);
            }
        }
        assert_eq!(timer.phase(), Phase::LongBreak);
        assert_eq!(timer.remaining(), 900);
    }

    #[test]
    fn break_returns_to_stopped_work() {
        let mut timer = FocusTimer::new(TimerConfig::default());
        finish_work(&mut timer);
        finish_work(&mut timer);
        assert_eq!(timer.phase(), Phase::Work);
        assert_eq!(timer.remaining(), 1500);
        assert!(!timer.is_running());
    }

    #[test]
    fn reset_keeps_cycles() {
        let mut timer = FocusTimer::new(TimerConfig::default());
        for _ in 0..3 {
            finish_work(&mut timer);
            finish_work(&mut timer);
        }
        timer.toggle();
        timer.tick();
        timer.reset();
        assert_eq!(timer.completed_cycles(), 3);
        assert_eq!(timer.phase(), Phase::Work);
        assert_eq!(timer.remaining(), 1500);
        assert!(!timer.is_running());
    }

    #[test]
    fn paused_timer_does_not_move() {
        let mut timer = FocusTimer::new(TimerConfig::default());
        assert_eq!(timer.tick(), TickOutcome::Idle);
        assert_eq!(timer.remaining(), 1500);
        assert_eq!(timer.display(), "25:00");
    }

    #[test]
    fn progress_is_elapsed_over_total() {
        let mut timer = running_timer();
        for _ in 0..750 {
            timer.tick();
        }
        assert_eq!(timer.progress(), 0.5);
        assert_eq!(timer.display(), "12:30");
    }

    #[tokio::test(start_paused = true)]
    async fn schedule_ticks_every_period_until_dropped() {
        let count = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&count);
        let schedule = TickSchedule::spawn(&Handle::current(), Duration::from_secs(1), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);

        drop(schedule);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_generation_ticks_are_ignored() {
        let mut session = FocusSession::new("Write report".to_string(), TimerConfig::default());
        session.toggle(|_| TickSchedule::spawn(&Handle::current(), Duration::from_secs(1), || {}));
        let generation = session.generation();
        assert_eq!(session.on_tick(generation), TickOutcome::Counting);

        session.toggle(|_| unreachable!("pausing does not schedule"));
        assert!(!session.is_scheduled());
        assert_eq!(session.on_tick(generation), TickOutcome::Idle);
        assert_eq!(session.timer.remaining(), 1499);

        session.toggle(|_| TickSchedule::spawn(&Handle::current(), Duration::from_secs(1), || {}));
        assert!(session.needs_close_confirmation());
        session.reset();
        assert!(!session.needs_close_confirmation());
        assert_eq!(session.timer.remaining(), 1500);
    }
}
