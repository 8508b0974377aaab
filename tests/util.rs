#![allow(dead_code)]
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use svtk_pipeline::prelude::*;

/// Shared record of which algorithms ran `RequestData`, in order.
pub type ExecutionLog = Arc<Mutex<Vec<String>>>;

/// Image source counting its executions. Point scalars hold
/// `value + global point index (+ time)`, so pieces can be compared
/// against the whole-extent result.
#[derive(Debug)]
pub struct CountingSource {
    pub dimensions: [usize; 3],
    pub value: f64,
    pub time_steps: Option<Vec<f64>>,
    executions: Arc<AtomicUsize>,
    log: Option<ExecutionLog>,
}

impl CountingSource {
    pub fn new(dimensions: [usize; 3]) -> Self {
        Self {
            dimensions,
            value: 0.0,
            time_steps: None,
            executions: Arc::new(AtomicUsize::new(0)),
            log: None,
        }
    }

    pub fn logging(mut self, log: &ExecutionLog) -> Self {
        self.log = Some(log.clone());
        self
    }

    pub fn temporal(mut self, steps: Vec<f64>) -> Self {
        self.time_steps = Some(steps);
        self
    }

    /// Handle that keeps counting after the source moves into a pipeline.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        self.executions.clone()
    }

    fn whole_extent(&self) -> Extent {
        Extent::from_dimensions(self.dimensions)
    }
}

impl Algorithm for CountingSource {
    fn class_name(&self) -> &'static str {
        "CountingSource"
    }

    fn number_of_input_ports(&self) -> usize {
        0
    }

    fn fill_output_port_information(&self, _port: usize, info: &mut Information) {
        info.set(keys::DATA_TYPE_NAME, DataObjectType::ImageData);
    }

    fn request_information(&mut self, ctx: &mut RequestContext) -> PipelineResult<()> {
        let whole = self.whole_extent();
        let out = ctx.output(0)?;
        out.set(keys::WHOLE_EXTENT, whole);
        out.set(keys::SPACING, [1.0; 3]);
        out.set(keys::ORIGIN, [0.0; 3]);
        out.set(keys::CAN_PRODUCE_SUB_EXTENT, true);
        match &self.time_steps {
            Some(steps) => {
                out.set(keys::TIME_STEPS, steps.clone());
                if let (Some(lo), Some(hi)) = (steps.first(), steps.last()) {
                    out.set(keys::TIME_RANGE, vec![*lo, *hi]);
                }
            }
            None => {
                out.remove(keys::TIME_STEPS);
                out.remove(keys::TIME_RANGE);
            }
        }
        Ok(())
    }

    fn request_data(&mut self, ctx: &mut RequestContext) -> PipelineResult<()> {
        self.executions.fetch_add(1, Ordering::SeqCst);
        if let Some(log) = &self.log {
            log.lock().push("CountingSource".to_owned());
        }
        let whole = self.whole_extent();
        let info = ctx.output(0)?;
        let extent = info.get(keys::UPDATE_EXTENT).unwrap_or(whole);
        let time = info.get(keys::UPDATE_TIME_STEP).unwrap_or(0.0);
        let mut image = ImageData::new();
        image.set_extent(extent)?;
        let values: Vec<f64> = (0..extent.number_of_points())
            .map(|i| self.value + whole.point_index(extent.point_ijk(i)) as f64 + time)
            .collect();
        image
            .point_data_mut()
            .add_active(AttributeRole::Scalars, DataArray::new("scalars", 1, values)?)?;
        ctx.set_output(0, image.into());
        Ok(())
    }
}

/// Filter passing its input through unchanged, counting executions.
#[derive(Debug)]
pub struct PassThrough {
    executions: Arc<AtomicUsize>,
    log: Option<ExecutionLog>,
}

impl PassThrough {
    pub fn new() -> Self {
        Self {
            executions: Arc::new(AtomicUsize::new(0)),
            log: None,
        }
    }

    pub fn logging(mut self, log: &ExecutionLog) -> Self {
        self.log = Some(log.clone());
        self
    }

    pub fn counter(&self) -> Arc<AtomicUsize> {
        self.executions.clone()
    }
}

impl Algorithm for PassThrough {
    fn class_name(&self) -> &'static str {
        "PassThrough"
    }

    fn request_data(&mut self, ctx: &mut RequestContext) -> PipelineResult<()> {
        self.executions.fetch_add(1, Ordering::SeqCst);
        if let Some(log) = &self.log {
            log.lock().push("PassThrough".to_owned());
        }
        let input = ctx.require_input(0)?;
        ctx.set_output_object(0, input);
        Ok(())
    }
}

/// Filter that re-enters `Pipeline::update` on itself from `RequestData`.
pub struct Reentrant {
    pub pipeline: Option<Arc<Pipeline>>,
    pub target: Option<AlgorithmId>,
}

impl Algorithm for Reentrant {
    fn class_name(&self) -> &'static str {
        "Reentrant"
    }

    fn number_of_input_ports(&self) -> usize {
        0
    }

    fn fill_output_port_information(&self, _port: usize, info: &mut Information) {
        info.set(keys::DATA_TYPE_NAME, DataObjectType::PolyData);
    }

    fn request_data(&mut self, _ctx: &mut RequestContext) -> PipelineResult<()> {
        match (&self.pipeline, self.target) {
            (Some(pipeline), Some(target)) => pipeline.update(target),
            _ => Ok(()),
        }
    }
}

/// Collect every `ErrorEvent` payload fired on `id`.
pub fn error_recorder(
    pipeline: &Pipeline,
    id: AlgorithmId,
) -> Arc<Mutex<Vec<(ErrorKind, String)>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    pipeline
        .add_observer(id, EventKind::Error, move |ctx| {
            if let Some(payload) = ctx.call_data().as_error() {
                sink.lock().push((payload.kind, payload.message.clone()));
            }
        })
        .unwrap();
    seen
}

pub fn count(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}
