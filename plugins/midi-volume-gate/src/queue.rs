//! MIDI hand-off between the audio thread and the editor.
//!
//! Each queue is a lock-free ring buffer split into a producer and a
//! consumer half. Both halves sit behind a `parking_lot` mutex so several
//! editor handles can share one side; the audio thread only ever uses
//! `try_lock` and skips its turn instead of waiting.

use std::sync::atomic::{AtomicUsize, Ordering};

use notegate::prelude::*;
use parking_lot::Mutex;
use ringbuf::{traits::*, HeapCons, HeapProd, HeapRb};

/// Capacity of the editor -> processor queue for synthetic notes.
pub const INJECTION_CAPACITY: usize = 256;

/// Capacity of the processor -> editor queue of forwarded MIDI.
pub const MONITOR_CAPACITY: usize = 1024;

/// Bounded single-producer/single-consumer MIDI event queue.
pub struct MidiQueue {
    producer: Mutex<HeapProd<MidiEvent>>,
    consumer: Mutex<HeapCons<MidiEvent>>,
    dropped: AtomicUsize,
    capacity: usize,
}

impl MidiQueue {
    pub fn new(capacity: usize) -> Self {
        let (producer, consumer) = HeapRb::new(capacity).split();
        Self {
            producer: Mutex::new(producer),
            consumer: Mutex::new(consumer),
            dropped: AtomicUsize::new(0),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Events dropped because the queue was full or contended.
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Push from a non-real-time thread.
    ///
    /// Waits for other producers but never for the consumer. Returns
    /// `false` if the queue is full.
    pub fn push(&self, event: MidiEvent) -> bool {
        if self.producer.lock().try_push(event).is_ok() {
            return true;
        }
        self.dropped.fetch_add(1, Ordering::Relaxed);
        log::debug!("MIDI queue full (capacity: {}), event dropped", self.capacity);
        false
    }

    /// Push from the audio thread. Never blocks and never logs.
    #[inline]
    pub fn try_push(&self, event: MidiEvent) -> bool {
        let pushed = match self.producer.try_lock() {
            Some(mut producer) => producer.try_push(event).is_ok(),
            None => false,
        };
        if !pushed {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        pushed
    }

    /// Pop up to `max` pending events on the audio thread.
    ///
    /// Returns immediately if another thread holds the consumer. Events past
    /// `max` or behind a held consumer are picked up on the next block.
    /// `sink` returns `false` when it can't take more, which counts the
    /// rejected event as dropped and stops.
    #[inline]
    pub fn try_drain(&self, max: usize, mut sink: impl FnMut(MidiEvent) -> bool) -> usize {
        let Some(mut consumer) = self.consumer.try_lock() else {
            return 0;
        };
        let mut count = 0;
        while count < max {
            let Some(event) = consumer.try_pop() else {
                break;
            };
            if !sink(event) {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                break;
            }
            count += 1;
        }
        count
    }

    /// Drain everything pending on a non-real-time thread.
    pub fn drain(&self, mut sink: impl FnMut(MidiEvent)) -> usize {
        let mut consumer = self.consumer.lock();
        let mut count = 0;
        while let Some(event) = consumer.try_pop() {
            sink(event);
            count += 1;
        }
        count
    }

    /// Events currently waiting.
    pub fn len(&self) -> usize {
        self.consumer.lock().occupied_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(pitch: MidiNote) -> MidiEvent {
        MidiEvent::note_on(0, 0, pitch, 1.0)
    }

    #[test]
    fn drains_in_push_order() {
        let queue = MidiQueue::new(8);
        for pitch in [60, 62, 64] {
            assert!(queue.push(note(pitch)));
        }
        assert_eq!(queue.len(), 3);

        let mut pitches = Vec::new();
        let drained = queue.drain(|event| {
            if let MidiEventKind::NoteOn(n) = event.event {
                pitches.push(n.pitch);
            }
        });
        assert_eq!(drained, 3);
        assert_eq!(pitches, vec![60, 62, 64]);
        assert!(queue.is_empty());
    }

    #[test]
    fn full_queue_drops_and_counts() {
        let queue = MidiQueue::new(2);
        assert!(queue.push(note(60)));
        assert!(queue.try_push(note(61)));
        assert!(!queue.push(note(62)));
        assert!(!queue.try_push(note(63)));
        assert_eq!(queue.dropped(), 2);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn try_drain_stops_when_sink_is_full() {
        let queue = MidiQueue::new(4);
        for pitch in 60..64 {
            queue.push(note(pitch));
        }

        let mut taken = Vec::new();
        let count = queue.try_drain(usize::MAX, |event| {
            if taken.len() == 2 {
                return false;
            }
            taken.push(event);
            true
        });
        assert_eq!(count, 2);
        assert_eq!(queue.dropped(), 1);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn try_push_skips_while_producer_is_held() {
        let queue = MidiQueue::new(4);
        let _guard = queue.producer.lock();
        assert!(!queue.try_push(note(60)));
        assert_eq!(queue.dropped(), 1);
    }

    #[test]
    fn try_drain_skips_while_consumer_is_held() {
        let queue = MidiQueue::new(4);
        queue.push(note(60));
        let guard = queue.consumer.lock();
        assert_eq!(queue.try_drain(usize::MAX, |_| true), 0);
        drop(guard);
        assert_eq!(queue.try_drain(usize::MAX, |_| true), 1);
    }

    #[test]
    fn try_drain_leaves_events_past_max_queued() {
        let queue = MidiQueue::new(4);
        for pitch in 60..63 {
            queue.push(note(pitch));
        }

        let mut taken = Vec::new();
        assert_eq!(queue.try_drain(2, |event| {
            taken.push(event);
            true
        }), 2);
        assert_eq!(taken, vec![note(60), note(61)]);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.dropped(), 0);

        assert_eq!(queue.try_drain(0, |_| true), 0);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn handles_cross_thread_traffic() {
        use std::sync::Arc;

        const TOTAL: usize = 2000;

        let queue = Arc::new(MidiQueue::new(64));
        let producer = {
            let queue = Arc::clone(&queue);
            std::thread::spawn(move || {
                for seq in 0..TOTAL {
                    while !queue.try_push(MidiEvent::control_change(0, (seq / 128) as u8, (seq % 128) as u8, 0.0)) {
                        std::thread::yield_now();
                    }
                }
            })
        };

        let mut received = Vec::with_capacity(TOTAL);
        while received.len() < TOTAL {
            queue.drain(|event| {
                if let MidiEventKind::ControlChange(cc) = event.event {
                    received.push(cc.channel as usize * 128 + cc.controller as usize);
                }
            });
            std::thread::yield_now();
        }
        producer.join().unwrap();

        assert_eq!(received, (0..TOTAL).collect::<Vec<_>>());
        assert!(queue.is_empty());
    }
}
