use std::collections::VecDeque;

use matsya_common::events::LiveEvent;

/// An event together with its position in the channel's stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Observed {
    /// Starts at 1 and increases by one per received frame, across reconnects.
    pub seq: u64,
    pub event: LiveEvent,
}

/// Append-only record of received events with optional oldest-first eviction.
#[derive(Debug)]
pub struct EventLog {
    entries: VecDeque<Observed>,
    capacity: Option<usize>,
    next_seq: u64,
}

impl EventLog {
    /// `None` (or `Some(0)`) keeps every event.
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.filter(|c| *c > 0),
            next_seq: 1,
        }
    }

    pub fn push(&mut self, event: LiveEvent) -> u64 {
        if let Some(capacity) = self.capacity {
            while self.entries.len() >= capacity {
                self.entries.pop_front();
            }
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push_back(Observed { seq, event });
        seq
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&Observed> {
        self.entries.back()
    }

    /// Sequence number of the last event ever pushed, 0 before the first.
    pub fn last_seq(&self) -> u64 {
        self.next_seq - 1
    }

    pub fn snapshot(&self) -> Vec<Observed> {
        self.entries.iter().cloned().collect()
    }

    /// Retained events with a sequence number greater than `seq`.
    pub fn since(&self, seq: u64) -> Vec<Observed> {
        let skip = self.entries.partition_point(|o| o.seq <= seq);
        self.entries.iter().skip(skip).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(data: &str) -> LiveEvent {
        LiveEvent::Raw { data: data.into() }
    }

    #[test]
    fn evicts_oldest_when_full() {
        let mut log = EventLog::new(Some(2));
        log.push(raw("a"));
        log.push(raw("b"));
        log.push(raw("c"));
        assert_eq!(log.len(), 2);
        let seqs: Vec<u64> = log.snapshot().iter().map(|o| o.seq).collect();
        assert_eq!(seqs, vec![2, 3]);
        assert_eq!(log.latest().map(|o| &o.event), Some(&raw("c")));
        assert_eq!(log.last_seq(), 3);
    }

    #[test]
    fn zero_capacity_is_unbounded() {
        let mut log = EventLog::new(Some(0));
        for i in 0..1000 {
            log.push(raw(&i.to_string()));
        }
        assert_eq!(log.len(), 1000);
    }

    #[test]
    fn since_returns_only_newer_events() {
        let mut log = EventLog::new(None);
        assert!(log.since(0).is_empty());
        for data in ["a", "b", "c"] {
            log.push(raw(data));
        }
        let newer: Vec<u64> = log.since(1).iter().map(|o| o.seq).collect();
        assert_eq!(newer, vec![2, 3]);
        assert!(log.since(3).is_empty());
    }
}
