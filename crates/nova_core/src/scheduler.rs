//! Delayed and repeating tasks timed on background threads.
//!
//! Each task gets a sleeper thread that only posts its `TaskId` over a
//! channel. The payload (usually a callback) never leaves the owning thread:
//! the frame loop calls [`Scheduler::take_fired`], runs what it got, then
//! hands repeating tasks back through [`Scheduler::finish`].

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use std::collections::HashMap;
use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

struct Slot<T> {
    payload: Option<T>,
    repeating: bool,
    /// Dropping this wakes the timer thread, which then exits.
    cancel: Sender<()>,
    thread: JoinHandle<()>,
}

impl<T> Slot<T> {
    fn stop(self) {
        let Slot { cancel, thread, .. } = self;
        drop(cancel);
        if thread.join().is_err() {
            log::error!(target: "Scheduler", "Timer thread panicked");
        }
    }
}

/// A task whose timer elapsed, taken out of the scheduler.
pub struct Fired<T> {
    pub id: TaskId,
    pub payload: T,
    pub repeating: bool,
}

pub struct Scheduler<T> {
    slots: HashMap<TaskId, Slot<T>>,
    tx: Sender<TaskId>,
    rx: Receiver<TaskId>,
    next_id: u64,
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self {
            slots: HashMap::new(),
            tx,
            rx,
            next_id: 0,
        }
    }

    /// Fire `payload` once after `delay`.
    pub fn after(&mut self, delay: Duration, payload: T) -> TaskId {
        self.spawn(delay, payload, false)
    }

    /// Fire `payload` every `interval` until cancelled. A tick that lands
    /// while the previous one is still being handled is dropped.
    pub fn every(&mut self, interval: Duration, payload: T) -> TaskId {
        self.spawn(interval, payload, true)
    }

    /// Stop a task and wait for its timer thread to exit. Returns false if it
    /// was unknown or already done.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        match self.slots.remove(&id) {
            Some(slot) => {
                slot.stop();
                true
            }
            None => false,
        }
    }

    pub fn is_scheduled(&self, id: TaskId) -> bool {
        self.slots.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Every task whose timer elapsed since the last call, in firing order.
    /// One-shot tasks are forgotten here.
    pub fn take_fired(&mut self) -> Vec<Fired<T>> {
        let mut fired = Vec::new();
        let ids: Vec<TaskId> = self.rx.try_iter().collect();
        for id in ids {
            let Some(slot) = self.slots.get_mut(&id) else {
                continue;
            };
            let Some(payload) = slot.payload.take() else {
                continue;
            };
            let repeating = slot.repeating;
            if !repeating {
                self.slots.remove(&id);
            }
            fired.push(Fired {
                id,
                payload,
                repeating,
            });
        }
        fired
    }

    /// Return a repeating task after it ran. Dropped if it was cancelled in
    /// the meantime.
    pub fn finish(&mut self, fired: Fired<T>) {
        if !fired.repeating {
            return;
        }
        if let Some(slot) = self.slots.get_mut(&fired.id) {
            slot.payload = Some(fired.payload);
        }
    }

    /// Stop every task; returns once all timer threads have exited.
    pub fn cancel_all(&mut self) {
        for (_, slot) in self.slots.drain() {
            slot.stop();
        }
    }

    fn spawn(&mut self, period: Duration, payload: T, repeating: bool) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        let (cancel, cancelled) = bounded::<()>(1);
        match spawn_timer(id, period, repeating, self.tx.clone(), cancelled) {
            Ok(thread) => {
                self.slots.insert(
                    id,
                    Slot {
                        payload: Some(payload),
                        repeating,
                        cancel,
                        thread,
                    },
                );
            }
            Err(e) => log::error!(target: "Scheduler", "Failed to spawn timer thread: {}", e),
        }
        id
    }
}

fn spawn_timer(
    id: TaskId,
    period: Duration,
    repeating: bool,
    tx: Sender<TaskId>,
    cancelled: Receiver<()>,
) -> io::Result<JoinHandle<()>> {
    let kind = if repeating { "interval" } else { "timer" };
    thread::Builder::new()
        .name(format!("nova-{}-{}", kind, id.0))
        .spawn(move || loop {
            match cancelled.recv_timeout(period) {
                Err(RecvTimeoutError::Timeout) => {
                    if tx.send(id).is_err() || !repeating {
                        break;
                    }
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        })
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for Scheduler<T> {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn wait_for<T>(sched: &mut Scheduler<T>, timeout: Duration) -> Vec<Fired<T>> {
        let deadline = Instant::now() + timeout;
        loop {
            let fired = sched.take_fired();
            if !fired.is_empty() || Instant::now() >= deadline {
                return fired;
            }
            thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn one_shot_fires_once_and_is_forgotten() {
        let mut sched = Scheduler::new();
        let id = sched.after(Duration::from_millis(5), "boom");
        assert!(sched.is_scheduled(id));

        let fired = wait_for(&mut sched, Duration::from_secs(2));
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].payload, "boom");
        assert!(!fired[0].repeating);
        assert!(!sched.is_scheduled(id));
        assert!(sched.is_empty());
    }

    #[test]
    fn nothing_fires_before_delay() {
        let mut sched = Scheduler::new();
        sched.after(Duration::from_secs(30), 1);
        assert!(sched.take_fired().is_empty());
        assert_eq!(sched.len(), 1);
    }

    #[test]
    fn repeating_task_runs_again_after_finish() {
        let mut sched = Scheduler::new();
        let id = sched.every(Duration::from_millis(5), 0u32);

        let mut total = 0;
        for _ in 0..3 {
            let mut fired = wait_for(&mut sched, Duration::from_secs(2));
            assert_eq!(fired.len(), 1, "ticks coalesce while in flight");
            let mut task = fired.remove(0);
            task.payload += 1;
            total = task.payload;
            sched.finish(task);
        }
        assert_eq!(total, 3);
        assert!(sched.cancel(id));
    }

    #[test]
    fn cancel_stops_pending_task() {
        let mut sched = Scheduler::new();
        let id = sched.after(Duration::from_millis(5), ());
        assert!(sched.cancel(id));
        assert!(!sched.cancel(id));
        thread::sleep(Duration::from_millis(30));
        assert!(sched.take_fired().is_empty());
    }

    #[test]
    fn finish_after_cancel_drops_payload() {
        let mut sched = Scheduler::new();
        let id = sched.every(Duration::from_millis(5), "tick");
        let mut fired = wait_for(&mut sched, Duration::from_secs(2));
        let task = fired.remove(0);
        sched.cancel(id);
        sched.finish(task);
        assert!(!sched.is_scheduled(id));
    }

    #[test]
    fn cancel_returns_without_waiting_out_the_delay() {
        let mut sched = Scheduler::new();
        let once = sched.after(Duration::from_secs(60), ());
        let repeat = sched.every(Duration::from_secs(60), ());
        let started = Instant::now();
        assert!(sched.cancel(once));
        assert!(sched.cancel(repeat));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn drop_joins_timer_threads() {
        let mut sched = Scheduler::new();
        sched.after(Duration::from_secs(60), 1);
        sched.every(Duration::from_secs(60), 2);
        let started = Instant::now();
        drop(sched);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn ids_are_unique() {
        let mut sched = Scheduler::new();
        let a = sched.after(Duration::from_secs(10), ());
        let b = sched.every(Duration::from_secs(10), ());
        assert_ne!(a, b);
        sched.cancel_all();
        assert!(sched.is_empty());
    }
}
