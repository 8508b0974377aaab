//! The `Algorithm` trait and the context its request handlers receive.
//!
//! An algorithm declares its ports and implements up to four request
//! handlers. All handlers have defaults, so a source only overrides
//! `request_information` and `request_data`, and a simple filter only
//! `request_data`.

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::data::object::{DataObject, DataObjectType};
use crate::event::{CallData, EventKind, Subject};
use crate::information::{Information, keys};
use crate::pipeline::executive::RequestPass;
use crate::pipeline_error::{PipelineError, PipelineResult, PortDirection};

/// Upcast to [`Any`] so the pipeline can hand out typed access.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A processing step in the pipeline graph.
pub trait Algorithm: AsAny + Send {
    /// Class name used in diagnostics; node names are `ClassName#id`.
    fn class_name(&self) -> &'static str;

    fn number_of_input_ports(&self) -> usize {
        1
    }

    fn number_of_output_ports(&self) -> usize {
        1
    }

    /// Declare acceptance constraints for input `port`. Accepts any data
    /// object by default.
    fn fill_input_port_information(&self, _port: usize, info: &mut Information) {
        info.set(keys::INPUT_REQUIRED_DATA_TYPE, vec![DataObjectType::DataObject]);
    }

    /// Declare the output type of `port` through `DATA_TYPE_NAME`.
    fn fill_output_port_information(&self, _port: usize, _info: &mut Information) {}

    fn request_data_object(&mut self, ctx: &mut RequestContext) -> PipelineResult<()> {
        default_request_data_object(ctx)
    }

    fn request_information(&mut self, _ctx: &mut RequestContext) -> PipelineResult<()> {
        Ok(())
    }

    fn request_update_extent(&mut self, _ctx: &mut RequestContext) -> PipelineResult<()> {
        Ok(())
    }

    fn request_data(&mut self, _ctx: &mut RequestContext) -> PipelineResult<()> {
        Ok(())
    }
}

/// Give every output an instance of its declared concrete type, or of the
/// type of the first input when the declaration is missing or abstract.
/// Existing outputs of the right type are kept.
pub fn default_request_data_object(ctx: &mut RequestContext) -> PipelineResult<()> {
    let fallback = ctx.input_data(0, 0).map(DataObject::data_type);
    for port in 0..ctx.number_of_output_ports() {
        let declared = ctx
            .output_information(port)
            .and_then(|info| info.get(keys::DATA_TYPE_NAME))
            .filter(|t| !t.is_abstract());
        let Some(ty) = declared.or(fallback) else {
            continue;
        };
        if ctx.output_data(port).map(DataObject::data_type) != Some(ty) {
            ctx.set_output(port, DataObject::new_instance(ty)?);
        }
    }
    Ok(())
}

/// Progress, abort and diagnostics channel of the executing node.
pub(crate) struct Monitor {
    pub(crate) name: String,
    pub(crate) subject: Arc<Subject>,
    pub(crate) abort: Arc<AtomicBool>,
}

/// Information vectors handed to a request handler.
///
/// `inputs[port][connection]` are copies of the connected producers'
/// output information; `outputs[port]` is this algorithm's own output
/// information. The executive writes both back after the handler returns.
pub struct RequestContext {
    pass: RequestPass,
    request: Information,
    pub(crate) inputs: Vec<Vec<Information>>,
    pub(crate) outputs: Vec<Information>,
    monitor: Monitor,
}

impl RequestContext {
    pub(crate) fn new(
        pass: RequestPass,
        request: Information,
        inputs: Vec<Vec<Information>>,
        outputs: Vec<Information>,
        monitor: Monitor,
    ) -> Self {
        Self {
            pass,
            request,
            inputs,
            outputs,
            monitor,
        }
    }

    pub fn pass(&self) -> RequestPass {
        self.pass
    }

    pub fn request(&self) -> &Information {
        &self.request
    }

    pub fn algorithm_name(&self) -> &str {
        &self.monitor.name
    }

    pub fn number_of_input_ports(&self) -> usize {
        self.inputs.len()
    }

    pub fn number_of_connections(&self, port: usize) -> usize {
        self.inputs.get(port).map_or(0, Vec::len)
    }

    pub fn number_of_output_ports(&self) -> usize {
        self.outputs.len()
    }

    pub fn input_information(&self, port: usize, connection: usize) -> Option<&Information> {
        self.inputs.get(port)?.get(connection)
    }

    pub fn input_information_mut(
        &mut self,
        port: usize,
        connection: usize,
    ) -> Option<&mut Information> {
        self.inputs.get_mut(port)?.get_mut(connection)
    }

    pub fn input_data(&self, port: usize, connection: usize) -> Option<&DataObject> {
        self.input_information(port, connection)?
            .data_object()
            .map(|obj| &**obj)
    }

    /// Shared handle to an input data object, detached from the borrow of `self`.
    pub fn input_object(&self, port: usize, connection: usize) -> Option<Arc<DataObject>> {
        self.input_information(port, connection)?.data_object().cloned()
    }

    /// First input data object, or an `UnconnectedInput` error.
    pub fn require_input(&self, port: usize) -> PipelineResult<Arc<DataObject>> {
        self.input_object(port, 0)
            .ok_or_else(|| PipelineError::UnconnectedInput {
                algorithm: self.monitor.name.clone(),
                port,
            })
    }

    pub fn output_information(&self, port: usize) -> Option<&Information> {
        self.outputs.get(port)
    }

    pub fn output_information_mut(&mut self, port: usize) -> Option<&mut Information> {
        self.outputs.get_mut(port)
    }

    pub fn output_data(&self, port: usize) -> Option<&DataObject> {
        self.outputs.get(port)?.data_object().map(|obj| &**obj)
    }

    pub fn output_data_mut(&mut self, port: usize) -> Option<&mut DataObject> {
        self.outputs.get_mut(port)?.data_object_mut()
    }

    /// Replace the data object of output `port`.
    pub fn set_output(&mut self, port: usize, data: DataObject) {
        self.set_output_object(port, Arc::new(data));
    }

    pub fn set_output_object(&mut self, port: usize, data: Arc<DataObject>) {
        if let Some(info) = self.outputs.get_mut(port) {
            info.set(keys::DATA_OBJECT, data);
        }
    }

    /// Output information of `port`, or a `PortOutOfRange` error.
    pub fn output(&mut self, port: usize) -> PipelineResult<&mut Information> {
        let count = self.outputs.len();
        let name = &self.monitor.name;
        self.outputs
            .get_mut(port)
            .ok_or_else(|| PipelineError::PortOutOfRange {
                algorithm: name.clone(),
                direction: PortDirection::Output,
                index: port,
                count,
            })
    }

    /// Fire `ProgressEvent` with `fraction` in `[0, 1]`.
    pub fn update_progress(&self, fraction: f64) {
        self.monitor.subject.invoke(
            &EventKind::Progress,
            &CallData::Double(fraction.clamp(0.0, 1.0)),
            Some(&self.monitor.abort),
        );
    }

    /// Fire `AbortCheckEvent` and report whether execution should stop.
    pub fn check_abort(&self) -> bool {
        self.monitor
            .subject
            .invoke(&EventKind::AbortCheck, &CallData::None, Some(&self.monitor.abort));
        self.abort_requested()
    }

    pub fn abort_requested(&self) -> bool {
        self.monitor.abort.load(Ordering::SeqCst)
    }

    /// Log a recoverable problem and fire `WarningEvent`.
    pub fn warning(&self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{}: {}", self.monitor.name, message);
        self.monitor.subject.invoke(
            &EventKind::Warning,
            &CallData::String(message),
            Some(&self.monitor.abort),
        );
    }

    /// Execution error attributed to this algorithm and pass.
    pub fn fail(&self, message: impl Into<String>) -> PipelineError {
        PipelineError::request_failed(self.monitor.name.clone(), self.pass, message)
    }
}
