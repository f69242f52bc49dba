//! Propiedades generales del engine: determinismo, secuenciación,
//! composición y round trip de paths.

use pipeflow_core::path::{get, set};
use pipeflow_core::{bindings, make, run, Inspect, Item, Path, RunOptions, Segment, Step, StepError, StepFn,
                    StepStatus, Value};
use proptest::prelude::*;

fn add(name: &str, input: &str, output: &str, n: i64) -> Step {
    Step::transformation(name, StepFn::unary(move |v| Ok(Value::from(v.try_i64()? + n))), [input]).with_output(output)
}

fn chain(len: usize, fail_at: Option<usize>) -> Vec<Step> {
    (0..len).map(|i| {
                let name = format!("s{i}");
                if Some(i) == fail_at {
                    Step::action(name, StepFn::unary(|_| Err(StepError::new("boom"))), ["acc"])
                } else {
                    add(&name, "acc", "acc", 1)
                }
            })
            .collect()
}

fn segment() -> impl Strategy<Value = Segment> {
    prop_oneof!["[a-c]{1,2}".prop_map(Segment::Key), (0usize..4).prop_map(Segment::Index)]
}

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![any::<i64>().prop_map(Value::from), "[a-z]{0,6}".prop_map(Value::from), any::<bool>().prop_map(Value::from)]
}

proptest! {
    /// Dos runs de la misma plantilla con los mismos args producen
    /// pipelines terminados iguales (sin contar tiempos).
    #[test]
    fn runs_are_deterministic(len in 0usize..6, start in -1000i64..1000, fail_at in proptest::option::of(0usize..6)) {
        let p = make(bindings! {}, chain(len, fail_at)).unwrap();
        let first = run(&p, bindings! { "acc" => start }, &RunOptions::default()).unwrap();
        let second = run(&p, bindings! { "acc" => start }, &RunOptions::default()).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.trace_fingerprint(), second.trace_fingerprint());
    }

    /// Tras un step fallido, todos los siguientes quedan sin ejecutar.
    #[test]
    fn failure_stops_the_sequence(len in 1usize..8, fail_at in 0usize..8) {
        let p = make(bindings! {}, chain(len, Some(fail_at))).unwrap();
        let done = run(&p, bindings! { "acc" => 0 }, &RunOptions::default()).unwrap();
        let steps = done.steps();
        for (i, step) in steps.iter().enumerate() {
            if step.is_failed() {
                prop_assert!(steps[i + 1..].iter().all(Inspect::is_not_started));
            }
        }
        if fail_at < len {
            prop_assert_eq!(done.status(), StepStatus::Failed);
            prop_assert_eq!(done.failed_step().and_then(Step::sequence_index), Some(fail_at));
        } else {
            prop_assert_eq!(done.result(), Ok(&Value::from(len as i64)));
        }
    }

    /// `get(set(state, path, v), path) == v` para cualquier path no vacío.
    #[test]
    fn path_round_trip(segments in proptest::collection::vec(segment(), 1..5), v in leaf(), existing in leaf()) {
        let path = Path::new(segments);
        let state = bindings! { "a" => existing.clone(), "b" => vec![existing] };
        let next = set(&state, &path, v.clone()).unwrap();
        prop_assert_eq!(get(&next, &path, false).unwrap(), Some(v));
    }
}

#[test]
fn composition_is_idempotent() {
    let b = || bindings! { "url" => "A" };
    let s1 = add("s1", "x", "x", 1);
    let s2 = add("s2", "x", "x", 2).with_binding("url", "B");
    let s3 = add("s3", "x", "x", 3);
    let s4 = add("s4", "x", "y", 4);

    let nested = make(b(),
                      vec![Item::from(make(b(), vec![s1.clone(), s2.clone()]).unwrap()),
                           Item::from(make(b(), vec![s3.clone(), s4.clone()]).unwrap())]).unwrap();
    let loose = make(b(), vec![s1.clone(), s2.clone(), s3.clone(), s4.clone()]).unwrap();
    let listed = make(b(), [vec![s1, s2, s3, s4]]).unwrap();

    assert_eq!(nested, loose);
    assert_eq!(loose, listed);

    let args = bindings! { "x" => 0 };
    let a = run(&nested, args.clone(), &RunOptions::default()).unwrap();
    let c = run(&listed, args, &RunOptions::default()).unwrap();
    assert_eq!(a, c);
    assert_eq!(a.result(), Ok(&Value::from(10)));
}

#[test]
fn step_binding_overrides_value_written_by_earlier_step() {
    let write = Step::action("write", StepFn::nullary(|| Ok(Value::from("from-state"))), Vec::<Path>::new())
        .with_output("url");
    let read = Step::action("read", StepFn::unary(|v| Ok(v.clone())), ["url"]).with_binding("url", "bound");
    let p = make(bindings! {}, vec![write, read]).unwrap();

    let done = run(&p, bindings! { "url" => "from-args" }, &RunOptions::default()).unwrap();

    assert_eq!(done.result(), Ok(&Value::from("bound")));
}
