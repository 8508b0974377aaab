mod util;

use std::sync::Arc;

use svtk_pipeline::prelude::*;
use util::*;

/// Filter whose `RequestData` always fails, either with its own message or
/// with a malformed array.
struct Failing {
    malformed: bool,
}

impl Algorithm for Failing {
    fn class_name(&self) -> &'static str {
        "Failing"
    }

    fn request_data(&mut self, ctx: &mut RequestContext) -> PipelineResult<()> {
        if self.malformed {
            DataArray::new("broken", 0, vec![1.0f64])?;
            return Ok(());
        }
        Err(ctx.fail("boom"))
    }
}

#[test]
fn poly_data_into_contour_is_a_configuration_error() {
    let pipeline = Pipeline::new();
    let plane = pipeline.add(PlaneSource::new());
    let contour = pipeline.add(ContourFilter::new(0.0));
    pipeline
        .set_input_connection(contour, 0, pipeline.output_port(plane, 0).unwrap())
        .unwrap();
    let errors = error_recorder(&pipeline, contour);

    let err = pipeline.update(contour).unwrap_err();
    assert!(matches!(err, PipelineError::IncompatibleInput { .. }));
    let errors = errors.lock();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, ErrorKind::Configuration);
    assert!(errors[0].1.contains("ImageData"), "{}", errors[0].1);
    assert_eq!(
        pipeline.execution_status(contour).unwrap(),
        ExecutionStatus::Failed(ErrorKind::Configuration)
    );
}

#[test]
fn unconnected_required_input_fails() {
    let pipeline = Pipeline::new();
    let contour = pipeline.add(ContourFilter::new(0.0));
    let err = pipeline.update(contour).unwrap_err();
    assert!(matches!(err, PipelineError::UnconnectedInput { port: 0, .. }));
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn cycles_are_rejected_at_connect_time() {
    let pipeline = Pipeline::new();
    let a = pipeline.add(PassThrough::new());
    let b = pipeline.add(PassThrough::new());
    pipeline
        .set_input_connection(b, 0, pipeline.output_port(a, 0).unwrap())
        .unwrap();
    let err = pipeline
        .set_input_connection(a, 0, pipeline.output_port(b, 0).unwrap())
        .unwrap_err();
    assert!(matches!(err, PipelineError::CyclicConnection { .. }));
    let err = pipeline
        .set_input_connection(a, 0, pipeline.output_port(a, 0).unwrap())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!(pipeline.number_of_input_connections(a, 0).unwrap(), 0);
}

#[test]
fn non_repeatable_ports_take_one_connection() {
    let pipeline = Pipeline::new();
    let s1 = pipeline.add(CountingSource::new([2, 2, 2]));
    let s2 = pipeline.add(CountingSource::new([2, 2, 2]));
    let pass = pipeline.add(PassThrough::new());
    pipeline
        .add_input_connection(pass, 0, pipeline.output_port(s1, 0).unwrap())
        .unwrap();
    let err = pipeline
        .add_input_connection(pass, 0, pipeline.output_port(s2, 0).unwrap())
        .unwrap_err();
    assert!(matches!(err, PipelineError::PortNotRepeatable { port: 0, .. }));

    let group = pipeline.add(GroupDataSets::new());
    for src in [s1, s2] {
        pipeline
            .add_input_connection(group, 0, pipeline.output_port(src, 0).unwrap())
            .unwrap();
    }
    assert_eq!(pipeline.number_of_input_connections(group, 0).unwrap(), 2);
}

#[test]
fn recursive_update_is_a_contract_violation() {
    let pipeline = Arc::new(Pipeline::new());
    let id = pipeline.add(Reentrant {
        pipeline: None,
        target: None,
    });
    let handle = pipeline.clone();
    pipeline
        .configure::<Reentrant, _>(id, |r| {
            r.pipeline = Some(handle);
            r.target = Some(id);
        })
        .unwrap();
    let err = pipeline.update(id).unwrap_err();
    assert!(matches!(err, PipelineError::RecursiveUpdate(_)));
    assert_eq!(err.kind(), ErrorKind::ContractViolation);

    pipeline
        .configure::<Reentrant, _>(id, |r| r.pipeline = None)
        .unwrap();
    pipeline.update(id).unwrap();
}

#[test]
fn handler_failures_mark_the_algorithm_failed() {
    let pipeline = Pipeline::new();
    let src = pipeline.add(CountingSource::new([2, 2, 2]));
    let failing = pipeline.add(Failing { malformed: false });
    pipeline
        .set_input_connection(failing, 0, pipeline.output_port(src, 0).unwrap())
        .unwrap();
    let errors = error_recorder(&pipeline, failing);
    let err = pipeline.update(failing).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::RequestFailed { pass: RequestPass::Data, .. }
    ));
    assert_eq!(errors.lock()[0].0, ErrorKind::Execution);
    assert_eq!(
        pipeline.execution_status(failing).unwrap(),
        ExecutionStatus::Failed(ErrorKind::Execution)
    );
    assert_eq!(pipeline.execution_status(src).unwrap(), ExecutionStatus::Executed);
}

#[test]
fn data_errors_inside_handlers_become_execution_errors() {
    let pipeline = Pipeline::new();
    let failing = pipeline.add(Failing { malformed: true });
    pipeline
        .set_input_data(failing, 0, ImageData::with_dimensions([2, 2, 2]))
        .unwrap();
    let err = pipeline.update(failing).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Execution);
}

#[test]
fn configuring_with_the_wrong_type_is_rejected() {
    let pipeline = Pipeline::new();
    let src = pipeline.add(CountingSource::new([2, 2, 2]));
    let err = pipeline
        .configure::<ContourFilter, _>(src, |c| c.set_value(1.0))
        .unwrap_err();
    assert!(matches!(err, PipelineError::AlgorithmTypeMismatch(_)));
    assert!(pipeline.output_port(src, 1).is_err());
}

#[test]
#[should_panic(expected = "out of range")]
fn contract_violations_can_abort() {
    let config = PipelineConfig {
        abort_on_contract_violation: true,
        ..PipelineConfig::default()
    };
    let pipeline = Pipeline::with_config(config);
    let src = pipeline.add(CountingSource::new([2, 2, 2]));
    let _ = pipeline.output_port(src, 3);
}

#[test]
fn producers_in_use_cannot_be_removed() {
    let pipeline = Pipeline::new();
    let src = pipeline.add(CountingSource::new([2, 2, 2]));
    let pass = pipeline.add(PassThrough::new());
    pipeline
        .set_input_connection(pass, 0, pipeline.output_port(src, 0).unwrap())
        .unwrap();
    assert!(matches!(
        pipeline.remove(src),
        Err(PipelineError::AlgorithmInUse { .. })
    ));
    pipeline.remove(pass).unwrap();
    pipeline.remove(src).unwrap();
    assert!(pipeline.is_empty());
}
