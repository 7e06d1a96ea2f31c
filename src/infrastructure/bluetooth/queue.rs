//! Serialized command output
//!
//! The hubs accept one write at a time; the next write may only start once
//! the previous one was acknowledged by the stack. The queue tracks that slot
//! and tells the caller which write to transmit next. It performs no I/O.

use crate::domain::models::QueuePolicy;
use crate::infrastructure::bluetooth::protocol::PendingWrite;
use std::collections::VecDeque;

#[derive(Debug, Default)]
pub struct OutputQueue {
    policy: QueuePolicy,
    in_flight: Option<PendingWrite>,
    pending: VecDeque<PendingWrite>,
}

impl OutputQueue {
    pub fn new(policy: QueuePolicy) -> Self {
        Self {
            policy,
            in_flight: None,
            pending: VecDeque::new(),
        }
    }

    /// Returns the write to transmit right away, if the slot was free
    pub fn submit(&mut self, write: PendingWrite) -> Option<PendingWrite> {
        if self.in_flight.is_none() {
            self.in_flight = Some(write.clone());
            return Some(write);
        }

        if let (QueuePolicy::Coalesce, Some(key)) = (self.policy, write.key()) {
            if let Some(queued) = self.pending.iter_mut().find(|p| p.key() == Some(key)) {
                *queued = write;
                return None;
            }
        }
        self.pending.push_back(write);
        None
    }

    /// Frees the slot and hands out the oldest pending write, if any
    pub fn on_write_ack(&mut self) -> Option<PendingWrite> {
        self.in_flight = self.pending.pop_front();
        self.in_flight.clone()
    }

    /// The failed write is dropped; the queue advances as on an ack.
    /// Returns the dropped write alongside the next one to transmit.
    pub fn on_write_failed(&mut self) -> (Option<PendingWrite>, Option<PendingWrite>) {
        let failed = self.in_flight.take();
        (failed, self.on_write_ack())
    }

    pub fn in_flight(&self) -> Option<&PendingWrite> {
        self.in_flight.as_ref()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn clear(&mut self) {
        self.in_flight = None;
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::commands::Command;
    use crate::infrastructure::bluetooth::protocol::CharacteristicRole;

    /// Speed level for an output; replaceable under coalescing
    fn write(port: u8, value: u8) -> PendingWrite {
        PendingWrite::new(CharacteristicRole::Output(port), Some(port), vec![value]).for_command(
            &Command::MotorRun {
                port,
                speed: value as i8,
            },
        )
    }

    /// Mode change on the same output; never replaced
    fn one_shot(port: u8, value: u8) -> PendingWrite {
        PendingWrite::new(CharacteristicRole::Output(port), Some(port), vec![value])
            .for_command(&Command::set_mode(port, value))
    }

    /// Acks everything and returns the payloads in transmission order
    fn drain(queue: &mut OutputQueue, first: Option<PendingWrite>) -> Vec<u8> {
        let mut sent: Vec<u8> = first.into_iter().map(|w| w.payload[0]).collect();
        while let Some(next) = queue.on_write_ack() {
            sent.push(next.payload[0]);
        }
        sent
    }

    #[test]
    fn test_fifo_preserves_order_one_at_a_time() {
        let mut queue = OutputQueue::new(QueuePolicy::Fifo);
        let first = queue.submit(write(1, 10));
        assert!(first.is_some());
        for value in 11..15 {
            assert_eq!(queue.submit(write(1, value)), None);
            assert!(queue.is_in_flight());
        }
        assert_eq!(queue.pending_len(), 4);

        assert_eq!(drain(&mut queue, first), vec![10, 11, 12, 13, 14]);
        assert!(!queue.is_in_flight());
    }

    #[test]
    fn test_coalesce_keeps_latest_per_target() {
        let mut queue = OutputQueue::new(QueuePolicy::Coalesce);
        let first = queue.submit(write(1, 1));
        queue.submit(write(1, 2));
        queue.submit(write(4, 50));
        queue.submit(write(1, 3));
        queue.submit(write(4, 60));

        // most recent value per output wins, original position kept
        assert_eq!(queue.pending_len(), 2);
        assert_eq!(drain(&mut queue, first), vec![1, 3, 60]);
    }

    #[test]
    fn test_coalesce_leaves_one_shot_commands_alone() {
        let mut queue = OutputQueue::new(QueuePolicy::Coalesce);
        let first = queue.submit(write(1, 1));
        queue.submit(one_shot(1, 2));
        queue.submit(one_shot(1, 3));
        queue.submit(write(1, 4));
        queue.submit(write(1, 5));

        assert_eq!(queue.pending_len(), 3);
        assert_eq!(drain(&mut queue, first), vec![1, 2, 3, 5]);
    }

    #[test]
    fn test_interleaved_submits_and_acks_keep_order() {
        for policy in [QueuePolicy::Fifo, QueuePolicy::Coalesce] {
            let mut queue = OutputQueue::new(policy);
            let mut seed: u32 = 0x2545_f491;
            let mut submitted = 0u8;
            let mut sent = Vec::new();
            let mut outstanding = 0;

            for _ in 0..200 {
                seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                if (seed >> 16) % 3 != 0 && submitted < u8::MAX {
                    if let Some(w) = queue.submit(one_shot(1, submitted)) {
                        outstanding += 1;
                        sent.push(w.payload[0]);
                    }
                    submitted += 1;
                } else if outstanding > 0 {
                    outstanding -= 1;
                    if let Some(w) = queue.on_write_ack() {
                        outstanding += 1;
                        sent.push(w.payload[0]);
                    }
                }
                assert!(outstanding <= 1);
                assert_eq!(queue.is_in_flight(), outstanding == 1);
            }

            sent.extend(drain(&mut queue, None));
            let expected: Vec<u8> = (0..submitted).collect();
            assert_eq!(sent, expected);
        }
    }

    #[test]
    fn test_in_flight_write_is_never_replaced() {
        let mut queue = OutputQueue::new(QueuePolicy::Coalesce);
        let first = queue.submit(write(1, 1));
        queue.submit(write(1, 2));
        assert_eq!(queue.in_flight().map(|w| w.payload.clone()), Some(vec![1]));
        assert_eq!(drain(&mut queue, first), vec![1, 2]);
    }

    #[test]
    fn test_failure_drops_and_advances() {
        let mut queue = OutputQueue::new(QueuePolicy::Fifo);
        queue.submit(write(1, 1));
        queue.submit(write(1, 2));

        let (failed, next) = queue.on_write_failed();
        assert_eq!(failed, Some(write(1, 1)));
        assert_eq!(next, Some(write(1, 2)));

        let (failed, next) = queue.on_write_failed();
        assert_eq!(failed, Some(write(1, 2)));
        assert_eq!(next, None);
        assert!(!queue.is_in_flight());
    }

    #[test]
    fn test_clear_releases_slot() {
        let mut queue = OutputQueue::new(QueuePolicy::Fifo);
        queue.submit(write(1, 1));
        queue.submit(write(1, 2));
        queue.clear();
        assert!(!queue.is_in_flight());
        assert_eq!(queue.pending_len(), 0);
        assert!(queue.submit(write(1, 3)).is_some());
    }
}
