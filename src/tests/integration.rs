#[cfg(test)]
mod integration_tests {

    use crate::{
        CancelToken, Context, Pipeline, PipelineBuilder, PipelineError, Recorder, Sink, Stage,
        StageInfo, StageKind,
    };
    use std::{cell::Cell, fmt};

    #[derive(Debug)]
    struct Rejected(u32);

    impl fmt::Display for Rejected {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "element {} rejected", self.0)
        }
    }

    impl std::error::Error for Rejected {}

    #[test]
    fn peek_interleaves_until_sort_then_sorted_order() {
        let rec = Recorder::new();
        Pipeline::new(["a1", "a2", "b1", "c2", "c1"])
            .filter(|s| s.starts_with('c'))
            .peek(rec.observer::<&str>())
            .map(str::to_uppercase)
            .peek(rec.observer::<String>())
            .sorted()
            .map(|s| s + "Hai")
            .for_each(rec.consumer::<String>())
            .unwrap();

        assert_eq!(rec.lines(), ["c2", "C2", "c1", "C1", "C1Hai", "C2Hai"]);
    }

    #[test]
    fn barrier_free_pipeline_runs_each_element_to_the_end() {
        let rec = Recorder::new();
        let log = rec.clone();
        Pipeline::new(vec![1, 2, 3, 4])
            .peek(move |n| log.record(format!("saw {n}")))
            .filter(|n| n % 2 == 0)
            .map(|n| n * 100)
            .for_each(rec.consumer::<i32>())
            .unwrap();

        assert_eq!(
            rec.lines(),
            ["saw 1", "saw 2", "200", "saw 3", "saw 4", "400"]
        );
    }

    #[test]
    fn sort_buffers_everything_before_releasing() {
        let rec = Recorder::new();
        let before = rec.clone();
        let after = rec.clone();
        Pipeline::new(vec![3, 1, 2])
            .peek(move |n| before.record(format!("in {n}")))
            .sorted()
            .peek(move |n| after.record(format!("out {n}")))
            .for_each(rec.consumer::<i32>())
            .unwrap();

        assert_eq!(
            rec.lines(),
            ["in 3", "in 1", "in 2", "out 1", "1", "out 2", "2", "out 3", "3"]
        );
    }

    #[test]
    fn every_sort_is_its_own_barrier() {
        let mut out = Vec::new();
        Pipeline::new(vec![5, 3, 9, 1])
            .sorted()
            .map(|n| n * 2)
            .sorted_by(|a, b| b.cmp(a))
            .for_each(|n| out.push(n))
            .unwrap();
        assert_eq!(out, [18, 10, 6, 2]);
    }

    #[test]
    fn empty_source_never_reaches_terminal() {
        let rec = Recorder::new();
        Pipeline::new(Vec::<String>::new())
            .filter(|s| !s.is_empty())
            .peek(rec.observer::<String>())
            .sorted()
            .map(|s| s.len())
            .sorted_partial()
            .for_each(rec.consumer::<usize>())
            .unwrap();
        assert!(rec.is_empty());

        let mut calls = 0;
        Pipeline::new(Vec::<u8>::new())
            .for_each(|_| calls += 1)
            .unwrap();
        assert_eq!(calls, 0);
    }

    #[test]
    fn failing_map_stops_after_two_complete_elements() {
        let rec = Recorder::new();
        let upstream = rec.clone();
        let mut survivors = 0;
        let err = Pipeline::new(vec![1u32, 2, 3, 4, 5, 6])
            .peek(move |n| upstream.record(format!("peek {n}")))
            .try_map(move |n| {
                survivors += 1;
                if survivors == 3 { Err(Rejected(n)) } else { Ok(n * 10) }
            })
            .for_each(rec.consumer::<u32>())
            .unwrap_err();

        assert_eq!(
            rec.lines(),
            ["peek 1", "10", "peek 2", "20", "peek 3"]
        );
        match err {
            PipelineError::Callback { stage, source } => {
                assert_eq!(stage, StageInfo::new(StageKind::Map, 1));
                assert_eq!(source.to_string(), "element 3 rejected");
            }
            other => panic!("expected a callback error, got {other:?}"),
        }
    }

    #[test]
    fn failing_filter_and_terminal_are_wrapped() {
        let err = Pipeline::new(vec!["1", "x", "3"])
            .try_filter(|s| s.parse::<i32>().map(|n| n > 0))
            .for_each(|_| {})
            .unwrap_err();
        assert_eq!(err.stage(), Some(StageInfo::new(StageKind::Filter, 0)));

        let mut delivered = 0;
        let err = Pipeline::new(vec![1, 2, 3])
            .map(|n| n + 1)
            .try_for_each(|n| {
                delivered += 1;
                if n == 3 { Err("no threes") } else { Ok(()) }
            })
            .unwrap_err();
        assert_eq!(err.stage(), Some(StageInfo::new(StageKind::ForEach, 1)));
        assert_eq!(delivered, 2);
    }

    #[test]
    fn failing_peek_aborts_before_downstream() {
        let rec = Recorder::new();
        let err = Pipeline::new(vec![1, 2])
            .try_peek(|n| if *n == 2 { Err(Rejected(2)) } else { Ok(()) })
            .for_each(rec.consumer::<i32>())
            .unwrap_err();
        assert!(matches!(err, PipelineError::Callback { .. }));
        assert_eq!(rec.lines(), ["1"]);
    }

    #[test]
    fn second_terminal_call_is_rejected() {
        let rec = Recorder::new();
        let mut pipeline = Pipeline::new(vec!["x", "y"]).map(|s| s.to_uppercase());
        pipeline.for_each(rec.consumer::<String>()).unwrap();
        assert!(pipeline.is_consumed());

        let err = pipeline.for_each(rec.consumer::<String>()).unwrap_err();
        assert!(matches!(err, PipelineError::IllegalState(_)));
        assert_eq!(rec.lines(), ["X", "Y"]);
    }

    #[test]
    fn appending_after_terminal_is_rejected() {
        let mut pipeline = Pipeline::new(vec![1, 2, 3]);
        pipeline.for_each(|_| {}).unwrap();

        let calls = Cell::new(0);
        let mut extended = pipeline.map(|n| n * 2);
        assert!(extended.is_consumed());
        let err = extended.for_each(|_| calls.set(calls.get() + 1)).unwrap_err();
        assert!(
            matches!(err, PipelineError::IllegalState(reason) if reason.contains("appended"))
        );
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn partial_sort_rejects_incomparable_values() {
        let mut out = Vec::new();
        let err = Pipeline::new(vec![1.5, f64::NAN, 0.5])
            .map(|x| x * 2.0)
            .sorted_partial()
            .for_each(|x| out.push(x))
            .unwrap_err();
        match err {
            PipelineError::Type { stage, .. } => {
                assert_eq!(stage, StageInfo::new(StageKind::Sort, 1));
            }
            other => panic!("expected a type error, got {other:?}"),
        }
        assert!(out.is_empty());
    }

    #[test]
    fn partial_sort_orders_comparable_values() {
        let mut out = Vec::new();
        Pipeline::new(vec![2.5, -1.0, 0.0])
            .sorted_partial()
            .for_each(|x| out.push(x))
            .unwrap();
        assert_eq!(out, [-1.0, 0.0, 2.5]);
    }

    #[test]
    fn failing_comparator_is_a_callback_error() {
        let err = Pipeline::new(vec![2, 1])
            .try_sorted_by(|_, _| Err::<std::cmp::Ordering, _>("cannot compare"))
            .for_each(|_| {})
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Callback { stage, .. } if stage.kind == StageKind::Sort
        ));
    }

    #[test]
    fn sort_by_key_is_stable() {
        let mut out = Vec::new();
        Pipeline::new(["pear", "fig", "kiwi", "apple", "yam", "plum"])
            .sorted_by_key(|s| s.len())
            .for_each(|s| out.push(s))
            .unwrap();
        assert_eq!(out, ["fig", "yam", "pear", "kiwi", "plum", "apple"]);
    }

    #[test]
    fn borrowed_source_is_left_untouched() {
        let words = vec!["beta".to_string(), "alpha".to_string()];
        let mut lengths = Vec::new();
        Pipeline::new(&words)
            .sorted()
            .map(|w| w.len())
            .for_each(|n| lengths.push(n))
            .unwrap();
        assert_eq!(lengths, [5, 4]);
        assert_eq!(words, ["beta", "alpha"]);
    }

    #[test]
    fn cancellation_between_source_elements() {
        let token = CancelToken::new();
        let trigger = token.clone();
        let seen = Cell::new(0);
        let mut delivered = Vec::new();

        let err = PipelineBuilder::new()
            .name("cancellable")
            .cancel_token(token)
            .source(vec![10, 20, 30, 40])
            .peek(|_| {
                seen.set(seen.get() + 1);
                if seen.get() == 2 {
                    trigger.cancel();
                }
            })
            .for_each(|n| delivered.push(n))
            .unwrap_err();

        assert!(matches!(err, PipelineError::Cancelled("cancellable")));
        assert_eq!(delivered, [10, 20]);
    }

    #[test]
    fn cancellation_while_releasing_sorted_elements() {
        let token = CancelToken::new();
        let trigger = token.clone();
        let mut delivered = Vec::new();

        let err = PipelineBuilder::new()
            .cancel_token(token)
            .source(vec![3, 2, 1])
            .sorted()
            .peek(move |_| trigger.cancel())
            .for_each(|n| delivered.push(n))
            .unwrap_err();

        assert!(matches!(err, PipelineError::Cancelled(_)));
        assert_eq!(delivered, [1]);
    }

    #[test]
    fn builder_names_the_context() {
        let pipeline = PipelineBuilder::new().name("orders").source(vec![1]);
        assert_eq!(pipeline.context().name(), "orders");
        assert!(pipeline.context().cancel_token().is_none());
        assert_eq!(Pipeline::new(vec![1]).context().name(), "pipeline");
    }

    /// Emits every element twice.
    struct Twice;

    impl<T: Clone> Stage<T> for Twice {
        type Out = T;

        fn kind(&self) -> StageKind {
            StageKind::Map
        }

        fn accept(
            &mut self,
            item: T,
            _info: StageInfo,
            down: &mut dyn Sink<T>,
            ctx: &Context,
        ) -> Result<(), PipelineError> {
            down.accept(item.clone(), ctx)?;
            down.accept(item, ctx)
        }
    }

    #[test]
    fn custom_stage_plugs_into_the_chain() {
        let rec = Recorder::new();
        let mut pipeline = Pipeline::new(vec!['b', 'a'])
            .add_stage(Twice)
            .sorted();
        assert_eq!(pipeline.stages()[0], StageInfo::new(StageKind::Map, 0));
        pipeline.for_each(rec.consumer::<char>()).unwrap();
        assert_eq!(rec.lines(), ["a", "a", "b", "b"]);
    }
}
