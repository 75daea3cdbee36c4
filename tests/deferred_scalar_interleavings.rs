//! Property tests for the deferred scalar subscription.
//!
//! Random sequences of producer and consumer calls are replayed against the
//! subscription and against a small reference model; the recorded signals
//! must match the model exactly.

use backflow::protocol::{FusionMode, QueueSubscription, Subscription};
use backflow::subscription::DeferredScalarSubscription;
use backflow::test_utils::{RecordingSubscriber, Signal, init_test_logging};
use backflow::StreamError;
use proptest::collection;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Complete(i32),
    Request(i64),
    Cancel,
    Error,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<i32>().prop_map(Op::Complete),
        (1i64..=4).prop_map(Op::Request),
        Just(Op::Cancel),
        Just(Op::Error),
    ]
}

/// Reference model of the push track.
#[derive(Default)]
struct Model {
    requested: bool,
    parked: Option<i32>,
    supplied: bool,
    terminated: bool,
    cancelled: bool,
}

impl Model {
    fn apply(
        &mut self,
        op: &Op,
        error: &StreamError,
        cancel_on_next: bool,
        out: &mut Vec<Signal<i32>>,
    ) {
        match op {
            Op::Complete(v) => {
                if self.cancelled || self.terminated || self.supplied {
                    return;
                }
                self.supplied = true;
                if self.requested {
                    self.emit(*v, cancel_on_next, out);
                } else {
                    self.parked = Some(*v);
                }
            }
            Op::Request(_) => {
                if self.cancelled || self.terminated {
                    return;
                }
                match self.parked.take() {
                    Some(v) => self.emit(v, cancel_on_next, out),
                    None => self.requested = true,
                }
            }
            Op::Cancel => {
                self.cancelled = true;
                self.parked = None;
            }
            Op::Error => {
                if self.cancelled || self.terminated || self.supplied {
                    return;
                }
                self.terminated = true;
                out.push(Signal::Error(error.clone()));
            }
        }
    }

    fn emit(&mut self, v: i32, cancel_on_next: bool, out: &mut Vec<Signal<i32>>) {
        self.terminated = true;
        out.push(Signal::Next(v));
        if cancel_on_next {
            self.cancelled = true;
        } else {
            out.push(Signal::Complete);
        }
    }
}

fn replay(ops: &[Op], cancel_on_next: bool) -> (Vec<Signal<i32>>, Vec<Signal<i32>>) {
    let error = StreamError::msg("producer failed");
    let mut builder = RecordingSubscriber::new();
    if cancel_on_next {
        builder = builder.on_next_hook(|s| s.cancel());
    }
    let sub = builder.into_arc();
    let deferred = DeferredScalarSubscription::subscribe(sub.clone());

    let mut model = Model::default();
    let mut expected = vec![Signal::Subscribe { fuseable: true }];
    for op in ops {
        match op {
            Op::Complete(v) => deferred.complete(*v),
            Op::Request(n) => deferred.request(*n).expect("positive demand"),
            Op::Cancel => deferred.cancel(),
            Op::Error => deferred.error(error.clone()),
        }
        model.apply(op, &error, cancel_on_next, &mut expected);
    }
    (sub.signals(), expected)
}

proptest! {
    /// Any interleaving produces exactly the signals the model predicts.
    #[test]
    fn push_track_matches_model(
        ops in collection::vec(op(), 0..12),
        cancel_on_next in any::<bool>(),
    ) {
        init_test_logging();
        let (actual, expected) = replay(&ops, cancel_on_next);
        prop_assert_eq!(actual, expected);
    }

    /// At most one value and at most one terminal signal, terminal last.
    #[test]
    fn at_most_one_terminal(ops in collection::vec(op(), 0..16)) {
        let (actual, _) = replay(&ops, false);
        let values = actual.iter().filter(|s| matches!(s, Signal::Next(_))).count();
        let terminals = actual
            .iter()
            .filter(|s| matches!(s, Signal::Complete | Signal::Error(_)))
            .count();
        prop_assert!(values <= 1);
        prop_assert!(terminals <= 1);
        if terminals == 1 {
            prop_assert!(matches!(
                actual.last(),
                Some(Signal::Complete | Signal::Error(_))
            ));
        }
    }

    /// Once cancelled, nothing else reaches the subscriber.
    #[test]
    fn nothing_after_cancel(
        before in collection::vec(op(), 0..6),
        after in collection::vec(op(), 0..6),
    ) {
        let sub = RecordingSubscriber::new().into_arc();
        let deferred = DeferredScalarSubscription::subscribe(sub.clone());
        let error = StreamError::msg("late");
        let run = |ops: &[Op]| {
            for op in ops {
                match op {
                    Op::Complete(v) => deferred.complete(*v),
                    Op::Request(n) => deferred.request(*n).expect("positive demand"),
                    Op::Cancel => deferred.cancel(),
                    Op::Error => deferred.error(error.clone()),
                }
            }
        };
        run(&before);
        deferred.cancel();
        let seen = sub.signal_count();
        run(&after);
        prop_assert_eq!(sub.signal_count(), seen);
        prop_assert!(deferred.is_cancelled());
    }

    /// Both orders of one value and one request deliver `v` then complete.
    #[test]
    fn value_and_request_in_either_order(v in any::<i32>(), n in 1i64..100, value_first in any::<bool>()) {
        let sub = RecordingSubscriber::new().into_arc();
        let deferred = DeferredScalarSubscription::subscribe(sub.clone());
        if value_first {
            deferred.complete(v);
            deferred.request(n).expect("positive demand");
        } else {
            deferred.request(n).expect("positive demand");
            deferred.complete(v);
        }
        prop_assert_eq!(
            sub.signals(),
            vec![Signal::Subscribe { fuseable: true }, Signal::Next(v), Signal::Complete]
        );
    }

    /// Fused: empty until the value lands, then exactly one poll yields it.
    #[test]
    fn fused_track_polls_once(v in any::<i32>(), polls_before in 0usize..4, polls_after in 1usize..4) {
        let sub = RecordingSubscriber::new()
            .with_fusion(FusionMode::ASYNC)
            .into_arc();
        let deferred = DeferredScalarSubscription::subscribe(sub.clone());
        prop_assert_eq!(sub.granted(), FusionMode::ASYNC);

        for _ in 0..polls_before {
            prop_assert_eq!(deferred.poll(), None);
            prop_assert!(deferred.is_empty());
        }
        deferred.complete(v);
        prop_assert_eq!(deferred.len(), 1);

        let mut yielded = Vec::new();
        for _ in 0..polls_after {
            if let Some(x) = deferred.poll() {
                yielded.push(x);
            }
        }
        prop_assert_eq!(yielded, vec![v]);
        prop_assert!(sub.values().is_empty());
    }
}
