//! Virtual-clock timer queue.
//!
//! The queue does not use internal threads or wall time. The owner advances
//! the clock and receives every task that has come due, in due-time order,
//! FIFO among tasks due at the same instant.
//!
//! Tasks are plain data and cannot be cancelled; their targets are looked
//! up by id when they fire, so a task whose target is gone is a no-op.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;

use super::balloons::BalloonId;
use super::particles::ParticleId;

/// Deferred work queued against the clock.
#[derive(Debug, Clone, PartialEq)]
pub enum TimerTask {
    ExpireParticle(ParticleId),
    PopBalloon(BalloonId),
    RemoveBalloon(BalloonId),
    /// Continue a paced balloon batch.
    SpawnBalloon { remaining: u32, pause: Duration },
}

#[derive(Debug)]
struct Scheduled {
    due: Duration,
    seq: u64,
    task: TimerTask,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    // Reversed so the max-heap yields the earliest (due, seq) first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Pending timers plus the current virtual time.
#[derive(Debug, Default)]
pub struct TimerQueue {
    now: Duration,
    next_seq: u64,
    heap: BinaryHeap<Scheduled>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time since the queue was created.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn pending(&self) -> usize {
        self.heap.len()
    }

    /// Due time of the earliest pending task.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.heap.peek().map(|s| s.due)
    }

    /// Queue `task` to fire `delay` after the current time.
    pub fn schedule_after(&mut self, delay: Duration, task: TimerTask) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Scheduled {
            due: self.now + delay,
            seq,
            task,
        });
    }

    /// Pop the next task due at or before `until`, moving the clock to its
    /// due time. Returns `None` once nothing else is due.
    pub fn pop_due(&mut self, until: Duration) -> Option<TimerTask> {
        if self.heap.peek()?.due > until {
            return None;
        }
        let scheduled = self.heap.pop()?;
        self.now = self.now.max(scheduled.due);
        Some(scheduled.task)
    }

    /// Move the clock forward to `t`. Never moves it backwards.
    pub fn settle_at(&mut self, t: Duration) {
        self.now = self.now.max(t);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn fires_in_due_order_then_fifo() {
        let mut q = TimerQueue::new();
        q.schedule_after(ms(300), TimerTask::PopBalloon(BalloonId(1)));
        q.schedule_after(ms(100), TimerTask::PopBalloon(BalloonId(2)));
        q.schedule_after(ms(100), TimerTask::PopBalloon(BalloonId(3)));

        let mut fired = Vec::new();
        while let Some(task) = q.pop_due(ms(1000)) {
            fired.push((q.now(), task));
        }
        assert_eq!(
            fired,
            vec![
                (ms(100), TimerTask::PopBalloon(BalloonId(2))),
                (ms(100), TimerTask::PopBalloon(BalloonId(3))),
                (ms(300), TimerTask::PopBalloon(BalloonId(1))),
            ]
        );
    }

    #[test]
    fn pop_due_respects_horizon() {
        let mut q = TimerQueue::new();
        q.schedule_after(ms(500), TimerTask::RemoveBalloon(BalloonId(1)));
        assert!(q.pop_due(ms(499)).is_none());
        assert_eq!(q.now(), Duration::ZERO);
        assert_eq!(q.next_deadline(), Some(ms(500)));
        assert!(q.pop_due(ms(500)).is_some());
        assert_eq!(q.pending(), 0);
    }

    #[test]
    fn schedule_is_relative_to_now() {
        let mut q = TimerQueue::new();
        q.settle_at(ms(1000));
        q.schedule_after(ms(50), TimerTask::ExpireParticle(ParticleId(9)));
        assert_eq!(q.next_deadline(), Some(ms(1050)));
        q.settle_at(ms(10));
        assert_eq!(q.now(), ms(1000));
    }
}
