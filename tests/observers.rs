mod util;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use svtk_pipeline::prelude::*;
use util::*;

#[test]
fn start_observers_run_by_priority() {
    let pipeline = Pipeline::new();
    let src = pipeline.add(CountingSource::new([2, 2, 2]));
    let order = Arc::new(Mutex::new(Vec::new()));
    for (index, priority) in [0.0f32, 1.0, -1.0].into_iter().enumerate() {
        let order = order.clone();
        pipeline
            .add_observer_with(src, EventKind::Start, priority, CallDataType::Any, move |_| {
                order.lock().push(index)
            })
            .unwrap();
    }
    pipeline.update(src).unwrap();
    assert_eq!(*order.lock(), vec![1, 0, 2]);
}

#[test]
fn any_observer_sees_the_whole_execution() {
    let pipeline = Pipeline::new();
    let src = pipeline.add(CountingSource::new([2, 2, 2]));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    pipeline
        .add_observer(src, EventKind::Any, move |ctx| {
            sink.lock().push(ctx.event().name().to_owned())
        })
        .unwrap();
    pipeline.update(src).unwrap();
    let seen = seen.lock();
    assert_eq!(seen.first().map(String::as_str), Some("StartEvent"));
    assert_eq!(seen.last().map(String::as_str), Some("EndEvent"));
    assert!(seen.iter().any(|e| e == "ProgressEvent"));
}

#[test]
fn progress_is_reported_from_zero_to_one() {
    let pipeline = Pipeline::new();
    let src = pipeline.add(SampleFunction::new(
        Sphere::new([0.0; 3], 1.0),
        [8, 8, 8],
        [-1.0, 1.0, -1.0, 1.0, -1.0, 1.0],
    ));
    let fractions = Arc::new(Mutex::new(Vec::new()));
    let sink = fractions.clone();
    pipeline
        .add_observer_with(src, EventKind::Progress, 0.0, CallDataType::Double, move |ctx| {
            if let Some(f) = ctx.call_data().as_f64() {
                sink.lock().push(f);
            }
        })
        .unwrap();
    pipeline.update(src).unwrap();
    let fractions = fractions.lock();
    assert_eq!(fractions.first(), Some(&0.0));
    assert_eq!(fractions.last(), Some(&1.0));
    assert!(fractions.iter().all(|f| (0.0..=1.0).contains(f)));
}

#[test]
fn observers_cannot_register_during_dispatch() {
    let pipeline = Arc::new(Pipeline::new());
    let src = pipeline.add(CountingSource::new([2, 2, 2]));
    let result = Arc::new(Mutex::new(None));
    let (p, slot) = (pipeline.clone(), result.clone());
    pipeline
        .add_observer(src, EventKind::Start, move |_| {
            let attempt = p.add_observer(src, EventKind::End, |_| {});
            *slot.lock() = Some(attempt.map(|_| ()).map_err(|e| e.kind()));
        })
        .unwrap();
    pipeline.update(src).unwrap();
    assert_eq!(*result.lock(), Some(Err(ErrorKind::ContractViolation)));
}

#[test]
fn removed_observers_stay_silent() {
    let pipeline = Pipeline::new();
    let src = pipeline.add(CountingSource::new([2, 2, 2]));
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let tag = pipeline
        .add_observer(src, EventKind::Modified, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    pipeline.modified(src).unwrap();
    assert!(pipeline.remove_observer(src, tag).unwrap());
    pipeline.modified(src).unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn abort_on_third_check_leaves_an_empty_output() {
    let pipeline = Pipeline::new();
    let src = pipeline.add(SampleFunction::new(
        Sphere::new([0.0; 3], 4.0),
        [16, 16, 16],
        [-8.0, 8.0, -8.0, 8.0, -8.0, 8.0],
    ));
    let checks = Arc::new(AtomicUsize::new(0));
    let counter = checks.clone();
    pipeline
        .add_observer(src, EventKind::AbortCheck, move |ctx| {
            if counter.fetch_add(1, Ordering::SeqCst) + 1 == 3 {
                ctx.abort_execute();
            }
        })
        .unwrap();
    let ended = Arc::new(AtomicUsize::new(0));
    let end_counter = ended.clone();
    pipeline
        .add_observer(src, EventKind::End, move |_| {
            end_counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    let port = pipeline.output_port(src, 0).unwrap();
    let out = pipeline.output(port).unwrap();
    assert_eq!(ended.load(Ordering::SeqCst), 1);
    assert_eq!(out.data_type(), DataObjectType::ImageData);
    assert_eq!(out.number_of_points(), 0);
    assert_eq!(pipeline.execution_status(src).unwrap(), ExecutionStatus::Aborted);

    let again = pipeline.output(port).unwrap();
    assert_eq!(again.number_of_points(), 16 * 16 * 16);
    assert_eq!(pipeline.execution_status(src).unwrap(), ExecutionStatus::Executed);
}

#[test]
fn aborted_contour_returns_empty_poly_data() {
    let pipeline = Pipeline::new();
    let sample = pipeline.add(SampleFunction::new(
        Sphere::new([0.0; 3], 4.0),
        [16, 16, 16],
        [-8.0, 8.0, -8.0, 8.0, -8.0, 8.0],
    ));
    let mut filter = ContourFilter::new(0.0);
    filter.set_abort_check_interval(100);
    let contour = pipeline.add(filter);
    pipeline
        .set_input_connection(contour, 0, pipeline.output_port(sample, 0).unwrap())
        .unwrap();
    let checks = Arc::new(AtomicUsize::new(0));
    let counter = checks.clone();
    pipeline
        .add_observer(contour, EventKind::AbortCheck, move |ctx| {
            if counter.fetch_add(1, Ordering::SeqCst) + 1 == 3 {
                ctx.abort_execute();
            }
        })
        .unwrap();
    let out = pipeline
        .output(pipeline.output_port(contour, 0).unwrap())
        .unwrap();
    assert_eq!(checks.load(Ordering::SeqCst), 3);
    assert_eq!(out.data_type(), DataObjectType::PolyData);
    assert_eq!(out.number_of_cells(), 0);
    assert_eq!(pipeline.execution_status(sample).unwrap(), ExecutionStatus::Executed);
}

#[test]
fn consumers_of_an_aborted_producer_are_discarded() {
    let pipeline = Pipeline::new();
    let src = pipeline.add(CountingSource::new([4, 4, 4]));
    let filter = PassThrough::new();
    let runs = filter.counter();
    let pass = pipeline.add(filter);
    pipeline
        .set_input_connection(pass, 0, pipeline.output_port(src, 0).unwrap())
        .unwrap();
    pipeline
        .add_observer(src, EventKind::Start, |ctx| {
            ctx.abort_execute();
        })
        .unwrap();
    let out = pipeline
        .output(pipeline.output_port(pass, 0).unwrap())
        .unwrap();
    assert_eq!(count(&runs), 0);
    assert_eq!(out.number_of_points(), 0);
    assert_eq!(pipeline.execution_status(pass).unwrap(), ExecutionStatus::Aborted);
}
