mod util;

use std::sync::Arc;

use parking_lot::Mutex;
use svtk_pipeline::prelude::*;
use util::*;

#[test]
fn second_update_is_a_cache_hit() {
    let pipeline = Pipeline::new();
    let source = CountingSource::new([4, 4, 4]);
    let runs = source.counter();
    let src = pipeline.add(source);

    pipeline.update(src).unwrap();
    assert_eq!(count(&runs), 1);
    pipeline.update(src).unwrap();
    assert_eq!(count(&runs), 1);

    pipeline
        .configure::<CountingSource, _>(src, |s| s.value = 2.0)
        .unwrap();
    pipeline.update(src).unwrap();
    assert_eq!(count(&runs), 2);
    assert_eq!(pipeline.execution_status(src).unwrap(), ExecutionStatus::Executed);
}

#[test]
fn modifying_a_producer_reruns_the_chain_in_order() {
    let log: ExecutionLog = Arc::new(Mutex::new(Vec::new()));
    let pipeline = Pipeline::new();
    let source = CountingSource::new([3, 3, 3]).logging(&log);
    let filter = PassThrough::new().logging(&log);
    let filter_runs = filter.counter();
    let src = pipeline.add(source);
    let pass = pipeline.add(filter);
    pipeline
        .set_input_connection(pass, 0, pipeline.output_port(src, 0).unwrap())
        .unwrap();

    pipeline.update(pass).unwrap();
    pipeline.update(pass).unwrap();
    assert_eq!(count(&filter_runs), 1);

    log.lock().clear();
    pipeline.modified(src).unwrap();
    pipeline.update(pass).unwrap();
    assert_eq!(*log.lock(), vec!["CountingSource", "PassThrough"]);
}

#[test]
fn modifying_a_consumer_keeps_the_producer_cached() {
    let pipeline = Pipeline::new();
    let source = CountingSource::new([3, 3, 3]);
    let source_runs = source.counter();
    let filter = PassThrough::new();
    let filter_runs = filter.counter();
    let src = pipeline.add(source);
    let pass = pipeline.add(filter);
    pipeline
        .set_input_connection(pass, 0, pipeline.output_port(src, 0).unwrap())
        .unwrap();

    pipeline.update(pass).unwrap();
    pipeline.modified(pass).unwrap();
    pipeline.update(pass).unwrap();
    assert_eq!(count(&source_runs), 1);
    assert_eq!(count(&filter_runs), 2);
}

#[test]
fn update_information_runs_no_request_data() {
    let pipeline = Pipeline::new();
    let source = CountingSource::new([5, 6, 7]);
    let runs = source.counter();
    let src = pipeline.add(source);
    let pass = pipeline.add(PassThrough::new());
    pipeline
        .set_input_connection(pass, 0, pipeline.output_port(src, 0).unwrap())
        .unwrap();

    pipeline.update_information(pass).unwrap();
    assert_eq!(count(&runs), 0);
    let info = pipeline
        .output_information(pipeline.output_port(pass, 0).unwrap())
        .unwrap();
    assert_eq!(info.get(keys::WHOLE_EXTENT), Some(Extent::new(0, 4, 0, 5, 0, 6)));
    assert_eq!(info.get(keys::SPACING), Some([1.0; 3]));
}

#[test]
fn sub_extent_of_cached_whole_is_a_hit_but_growing_is_not() {
    let pipeline = Pipeline::new();
    let source = CountingSource::new([8, 8, 8]);
    let runs = source.counter();
    let src = pipeline.add(source);
    let port = pipeline.output_port(src, 0).unwrap();

    pipeline.update_extent(port, Extent::new(0, 3, 0, 3, 0, 3)).unwrap();
    assert_eq!(count(&runs), 1);
    let sub = pipeline.cached_output(port).unwrap().unwrap();
    assert_eq!(sub.number_of_points(), 64);

    pipeline.update_port(port).unwrap();
    assert_eq!(count(&runs), 2);
    assert_eq!(pipeline.cached_output(port).unwrap().unwrap().number_of_points(), 512);

    pipeline.update_extent(port, Extent::new(2, 5, 2, 5, 2, 5)).unwrap();
    assert_eq!(count(&runs), 2);
}

#[test]
fn time_requests_rerun_temporal_sources_only() {
    let pipeline = Pipeline::new();
    let temporal = CountingSource::new([2, 2, 2]).temporal(vec![0.0, 1.0, 2.0]);
    let temporal_runs = temporal.counter();
    let plain = CountingSource::new([2, 2, 2]);
    let plain_runs = plain.counter();
    let t = pipeline.output_port(pipeline.add(temporal), 0).unwrap();
    let p = pipeline.output_port(pipeline.add(plain), 0).unwrap();

    pipeline.update_time_step(t, 1.0).unwrap();
    pipeline.update_time_step(t, 1.0).unwrap();
    assert_eq!(count(&temporal_runs), 1);
    pipeline.update_time_step(t, 2.0).unwrap();
    assert_eq!(count(&temporal_runs), 2);
    let info = pipeline.output_information(t).unwrap();
    assert_eq!(info.get(keys::DATA_TIME_STEP), Some(2.0));
    assert_eq!(info.get(keys::TIME_RANGE), Some(vec![0.0, 2.0]));

    pipeline.update_time_step(p, 1.0).unwrap();
    pipeline.update_time_step(p, 2.0).unwrap();
    assert_eq!(count(&plain_runs), 1);
}

#[test]
fn time_steps_flow_downstream() {
    let pipeline = Pipeline::new();
    let src = pipeline.add(CountingSource::new([2, 2, 2]).temporal(vec![0.5, 1.5]));
    let pass = pipeline.add(PassThrough::new());
    pipeline
        .set_input_connection(pass, 0, pipeline.output_port(src, 0).unwrap())
        .unwrap();
    let out = pipeline.output_port(pass, 0).unwrap();
    pipeline.update_time_step(out, 1.5).unwrap();
    let info = pipeline.output_information(out).unwrap();
    assert_eq!(info.get(keys::TIME_STEPS), Some(vec![0.5, 1.5]));
    let data = pipeline.cached_output(out).unwrap().unwrap();
    let scalars = data.point_data().unwrap().scalars().unwrap();
    assert_eq!(scalars.component(0, 0), Some(1.5));
}

#[test]
fn set_input_data_reuses_its_producer() {
    let pipeline = Pipeline::new();
    let pass = pipeline.add(PassThrough::new());
    let first = pipeline
        .set_input_data(pass, 0, ImageData::with_dimensions([2, 2, 2]))
        .unwrap();
    let out = pipeline.output_port(pass, 0).unwrap();
    assert_eq!(pipeline.output(out).unwrap().number_of_points(), 8);

    let second = pipeline
        .set_input_data(pass, 0, ImageData::with_dimensions([3, 3, 3]))
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(pipeline.output(out).unwrap().number_of_points(), 27);
    assert_eq!(pipeline.len(), 2);
}
