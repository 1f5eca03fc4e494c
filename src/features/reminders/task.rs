//! The per-reminder repeating task.
//!
//! Each reminder runs as one tokio task that computes its own succession
//! of fire times, polls coarsely until due, hands the fire to the delivery
//! dispatcher, and stops when its repeat budget or time window runs out.
//! Cancellation is cooperative: it is observed at the poll suspension
//! point, so an in-flight delivery always completes before the task exits.

use chrono::{DateTime, Duration, Local, NaiveDateTime};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::core::config::Timing;
use crate::features::delivery::Dispatcher;
use crate::features::schedule::{
    catch_up, interval_or_default, jitter_between, parse_fire_time, ScheduleParseError,
};

use super::ReminderDefinition;

/// Registry-visible state of one reminder task. The task writes, the
/// registry reads; a snapshot may be one fire cycle stale.
#[derive(Debug, Default)]
pub struct TaskState {
    /// Next fire time as unix seconds, zero until first computed. Published
    /// with `fetch_max` so the visible value never moves backwards.
    next_fire_unix: AtomicI64,

    /// Fire attempts so far. Counts attempts, not per-destination outcomes.
    times_sent: AtomicU32,
}

impl TaskState {
    pub fn next_fire(&self) -> Option<NaiveDateTime> {
        let secs = self.next_fire_unix.load(Ordering::Relaxed);
        if secs == 0 {
            return None;
        }
        DateTime::from_timestamp(secs, 0).map(|dt| dt.naive_utc())
    }

    pub fn times_sent(&self) -> u32 {
        self.times_sent.load(Ordering::Relaxed)
    }

    fn publish_next_fire(&self, at: NaiveDateTime) {
        self.next_fire_unix
            .fetch_max(at.and_utc().timestamp(), Ordering::Relaxed);
    }
}

/// Validate the schedule fields and spawn the task.
///
/// A malformed first-fire time is fatal for this one reminder: the task is
/// never spawned and the caller decides what to log. A malformed interval
/// is not; it falls back to the 1-day default inside `interval_or_default`.
pub fn spawn(
    name: String,
    definition: ReminderDefinition,
    dispatcher: Arc<Dispatcher>,
    state: Arc<TaskState>,
    timing: Timing,
    cancelled: watch::Receiver<bool>,
) -> Result<JoinHandle<()>, ScheduleParseError> {
    let first_fire = parse_fire_time(&definition.first_fire_at)?;
    let interval = interval_or_default(&definition.repeat_every);
    Ok(tokio::spawn(run(
        name, definition, first_fire, interval, dispatcher, state, timing, cancelled,
    )))
}

/// Theoretical final slot for a bounded schedule; `None` when the budget
/// is unbounded or the interval is zero.
fn last_slot(first_fire: NaiveDateTime, step_secs: i64, repeat_count: i64) -> Option<NaiveDateTime> {
    if repeat_count <= 0 || step_secs <= 0 {
        return None;
    }
    Some(first_fire + Duration::seconds(step_secs * (repeat_count - 1)))
}

#[allow(clippy::too_many_arguments)]
async fn run(
    name: String,
    definition: ReminderDefinition,
    first_fire: NaiveDateTime,
    interval: Duration,
    dispatcher: Arc<Dispatcher>,
    state: Arc<TaskState>,
    timing: Timing,
    mut cancelled: watch::Receiver<bool>,
) {
    let now = Local::now().naive_local();
    let step = interval.num_seconds().max(0);

    // One-shot whose moment already passed: nothing left to do.
    if step == 0 && first_fire <= now {
        info!("reminder '{name}': one-shot fire time {first_fire} already passed, expiring");
        return;
    }

    let mut slot = catch_up(first_fire, interval, now);
    let final_slot = last_slot(first_fire, step, definition.repeat_count);

    // Catch-up may have jumped past the whole window of a bounded schedule.
    if let Some(final_slot) = final_slot {
        if slot > final_slot {
            info!(
                "reminder '{name}': all {} occurrences before {final_slot} have passed, expiring",
                definition.repeat_count
            );
            return;
        }
    }

    let mut due_at = slot + jitter_between(timing.jitter_min_secs, timing.jitter_max_secs);
    state.publish_next_fire(due_at);
    info!("reminder '{name}' scheduled, next fire at {due_at}");

    loop {
        // Scheduled: coarse poll until due. Cancellation lands here; a
        // dropped sender (entry evicted from the registry) counts too.
        while Local::now().naive_local() < due_at {
            tokio::select! {
                _ = tokio::time::sleep(timing.poll) => {}
                _ = cancelled.changed() => {
                    debug!("reminder '{name}' cancelled while scheduled");
                    return;
                }
            }
        }

        // Firing: the in-flight delivery is never interrupted.
        let report = dispatcher
            .deliver(&definition.destinations, &definition.message)
            .await;
        let sent = state.times_sent.fetch_add(1, Ordering::Relaxed) + 1;
        if report.failures.is_empty() {
            info!(
                "reminder '{name}' fired to {} destination(s), {sent} sent so far",
                report.delivered
            );
        } else {
            warn!(
                "reminder '{name}' fired with {} of {} destination(s) failing, {sent} sent so far",
                report.failures.len(),
                report.attempted()
            );
        }

        if *cancelled.borrow() {
            debug!("reminder '{name}' cancelled during fire, stopping");
            return;
        }

        // Expiry, evaluated before rescheduling.
        if step == 0 {
            info!("reminder '{name}' completed its single fire, expiring");
            return;
        }
        if definition.repeat_count > 0 {
            if i64::from(sent) >= definition.repeat_count {
                info!(
                    "reminder '{name}' used its repeat budget of {}, expiring",
                    definition.repeat_count
                );
                return;
            }
            if let Some(final_slot) = final_slot {
                if slot + interval > final_slot {
                    info!("reminder '{name}' has no occurrences left before {final_slot}, expiring");
                    return;
                }
            }
        }

        // Reschedule: advance one interval from the previous unjittered
        // slot so the cadence stays anchored to the original schedule,
        // with fresh jitter for this occurrence.
        slot += interval;
        due_at = slot + jitter_between(timing.jitter_min_secs, timing.jitter_max_secs);
        state.publish_next_fire(due_at);
        debug!("reminder '{name}' rescheduled for {due_at}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(raw: &str) -> NaiveDateTime {
        parse_fire_time(raw).unwrap()
    }

    #[test]
    fn test_last_slot_bounded() {
        let first = ts("2025-01-01 09:00:00");
        assert_eq!(
            last_slot(first, 86_400, 3),
            Some(ts("2025-01-03 09:00:00"))
        );
        assert_eq!(last_slot(first, 86_400, 1), Some(first));
    }

    #[test]
    fn test_last_slot_unbounded_or_single_shot_is_none() {
        let first = ts("2025-01-01 09:00:00");
        assert_eq!(last_slot(first, 86_400, -1), None);
        assert_eq!(last_slot(first, 86_400, 0), None);
        assert_eq!(last_slot(first, 0, 3), None);
    }

    #[test]
    fn test_task_state_next_fire_roundtrip() {
        let state = TaskState::default();
        assert_eq!(state.next_fire(), None);

        let at = ts("2025-01-04 09:00:17");
        state.publish_next_fire(at);
        assert_eq!(state.next_fire(), Some(at));
    }

    #[test]
    fn test_task_state_next_fire_never_decreases() {
        let state = TaskState::default();
        let later = ts("2025-01-04 09:00:00");
        let earlier = ts("2025-01-03 09:00:00");

        state.publish_next_fire(later);
        state.publish_next_fire(earlier);
        assert_eq!(state.next_fire(), Some(later));
    }
}
