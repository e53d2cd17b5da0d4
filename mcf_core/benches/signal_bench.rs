//! Signal round-trip benchmarks.
//!
//! Measures the raw trigger → handle → collect cycle on the signal table and
//! the same cycle through the typed wrappers, plus dot-path resolution.

use criterion::{Criterion, criterion_group, criterion_main};
use mcf_core::prelude::*;
use std::hint::black_box;
use std::sync::Arc;

fn start_job_handler() -> Arc<StateSignalHandler> {
    let signals = Arc::new(StateSignalHandler::new());
    signals
        .add_signal_definition(
            "laser1",
            "StartJob",
            vec![SignalParameterDef::new("jobId", ParameterType::String)],
            vec![SignalParameterDef::new("accepted", ParameterType::Bool)],
        )
        .unwrap();
    signals
}

fn bench_raw_cycle(c: &mut Criterion) {
    let signals = start_job_handler();

    c.bench_function("signal_trigger_handle_collect", |b| {
        b.iter(|| {
            let uuid = signals
                .trigger_signal("laser1", "StartJob", black_box(r#"{"jobId":"42"}"#))
                .unwrap()
                .unwrap();
            signals.mark_signal_as_handled(&uuid, r#"{"accepted":"1"}"#).unwrap();
            black_box(signals.signal_has_been_handled(&uuid, true).unwrap());
        });
    });
}

fn bench_wrapper_cycle(c: &mut Criterion) {
    let signals = start_job_handler();

    c.bench_function("signal_wrapper_cycle", |b| {
        b.iter(|| {
            let mut trigger = SignalTrigger::new(Arc::clone(&signals), "laser1", "StartJob").unwrap();
            trigger.parameters().set_value_by_name("jobId", "42").unwrap();
            let uuid = trigger.trigger().unwrap();

            let handle = SignalHandle::from_uuid(Arc::clone(&signals), uuid)
                .unwrap()
                .unwrap();
            handle.results().set_bool_value_by_name("accepted", true).unwrap();
            handle.finish().unwrap();

            black_box(trigger.wait_for_handling(std::time::Duration::ZERO).unwrap());
        });
    });
}

fn bench_resolve_value(c: &mut Criterion) {
    let registry = StateMachineRegistry::new();
    let handler = ParameterHandler::new("axis1");
    let motion = handler.add_group("motion", "").unwrap();
    motion.add_double_parameter("speed", "", 25.0).unwrap();
    registry.register_instance("axis1", Arc::new(handler)).unwrap();

    c.bench_function("registry_resolve_value", |b| {
        b.iter(|| black_box(registry.resolve_value(black_box("axis1.motion.speed")).unwrap()));
    });
}

criterion_group!(benches, bench_raw_cycle, bench_wrapper_cycle, bench_resolve_value);
criterion_main!(benches);
