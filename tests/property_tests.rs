//! Property-based tests for ordering guarantees

mod common;

use common::builders::MessageBuilder;
use common::recorders::Recorder;
use pipeworks::pipeline::{
    same_fitting, Fitting, FittingRef, Message, Pipe, PipeMessage, Queue, QueueControl, QueueMode,
    TeeSplit,
};
use proptest::prelude::*;

proptest! {
    #[test]
    fn test_split_disconnects_in_reverse(count in 0usize..16) {
        let outputs: Vec<FittingRef> = (0..count).map(|_| Pipe::shared() as FittingRef).collect();
        let split = TeeSplit::new();
        for output in &outputs {
            split.connect(output.clone()).unwrap();
        }

        // Property: disconnect hands back outputs newest first, then nothing
        for expected in outputs.iter().rev() {
            let removed = split.disconnect();
            prop_assert!(removed.is_some());
            prop_assert!(same_fitting(&removed.unwrap(), expected));
        }
        prop_assert!(split.disconnect().is_none());
    }

    #[test]
    fn test_sorted_flush_is_stable(priorities in prop::collection::vec(1i32..=10, 0..40)) {
        let recorder = Recorder::new();
        let queue = Queue::new().with_mode(QueueMode::Sort);
        queue.connect(recorder.shared_listener()).unwrap();

        let sent: Vec<Message> = priorities
            .iter()
            .map(|&p| MessageBuilder::new().priority(p).build())
            .collect();
        for m in &sent {
            queue.write(PipeMessage::from(m.clone())).unwrap();
        }
        queue.write(QueueControl::flush().into()).unwrap();

        let delivered = recorder.normal();
        prop_assert_eq!(delivered.len(), sent.len());

        // Property: non-decreasing priority
        for pair in delivered.windows(2) {
            prop_assert!(pair[0].priority() <= pair[1].priority());
        }

        // Property: equal priorities keep insertion order
        let index_of = |m: &Message| sent.iter().position(|s| s.ptr_eq(m)).unwrap();
        for pair in delivered.windows(2) {
            if pair[0].priority() == pair[1].priority() {
                prop_assert!(index_of(&pair[0]) < index_of(&pair[1]));
            }
        }
    }

    #[test]
    fn test_fifo_flush_keeps_order(priorities in prop::collection::vec(1i32..=10, 0..40)) {
        let recorder = Recorder::new();
        let queue = Queue::new();
        queue.connect(recorder.shared_listener()).unwrap();

        for &p in &priorities {
            queue.write(MessageBuilder::new().priority(p).build().into()).unwrap();
        }
        queue.write(QueueControl::flush().into()).unwrap();

        prop_assert_eq!(recorder.priorities(), priorities);
    }
}
