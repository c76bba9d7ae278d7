//! Single-threaded task scheduling
//!
//! A deadline queue polled by the event loop. Tasks carry a payload that the
//! caller dispatches on; nothing here runs code on its own, so every task
//! executes on the loop's thread.

use std::time::{Duration, Instant};

/// Handle to a scheduled task, used to cancel it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

#[derive(Debug)]
struct Task<T> {
    id: TaskId,
    due: Instant,
    period: Option<Duration>,
    payload: T,
}

/// Repeating and one-shot tasks ordered by deadline
#[derive(Debug)]
pub struct Scheduler<T> {
    next_id: u64,
    tasks: Vec<Task<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            tasks: Vec::new(),
        }
    }
}

impl<T: Clone> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `payload` once at `at`
    pub fn schedule_once(&mut self, at: Instant, payload: T) -> TaskId {
        self.push(at, None, payload)
    }

    /// Run `payload` every `period`, first at `now + period`
    pub fn schedule_repeating(&mut self, now: Instant, period: Duration, payload: T) -> TaskId {
        self.push(now + period, Some(period), payload)
    }

    /// Remove a task. Returns false if it already ran or was cancelled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.tasks.len() != before
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.tasks.iter().map(|t| t.due).min()
    }

    /// Every task due at `now`, earliest first, each at most once per call.
    ///
    /// One-shot tasks are removed. Repeating tasks move to `due + period`, so
    /// a loop that fell behind catches up over successive calls.
    pub fn take_due(&mut self, now: Instant) -> Vec<(TaskId, T)> {
        let mut due: Vec<(Instant, TaskId, T)> = self
            .tasks
            .iter()
            .filter(|t| t.due <= now)
            .map(|t| (t.due, t.id, t.payload.clone()))
            .collect();
        due.sort_by_key(|(at, id, _)| (*at, id.0));

        self.tasks.retain_mut(|t| {
            if t.due > now {
                return true;
            }
            match t.period {
                Some(period) => {
                    t.due += period;
                    true
                }
                None => false,
            }
        });

        due.into_iter().map(|(_, id, payload)| (id, payload)).collect()
    }

    fn push(&mut self, due: Instant, period: Option<Duration>, payload: T) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.tasks.push(Task {
            id,
            due,
            period,
            payload,
        });
        id
    }
}
