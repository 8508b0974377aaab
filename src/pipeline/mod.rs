//! Pipeline: the engine context owning algorithms and their connections.
//!
//! Algorithms live in an arena and are addressed by [`AlgorithmId`]; an
//! edge is an [`OutputPort`] recorded on the consumer's input port. Each
//! node keeps its algorithm and its executive state behind separate
//! mutexes, so parameters can be inspected between updates while the
//! executive owns the port information.
//!
//! # Example
//! ```
//! use svtk_pipeline::prelude::*;
//!
//! let pipeline = Pipeline::new();
//! let sphere = Sphere::new([0.0; 3], 2.0);
//! let bounds = [-3.0, 3.0, -3.0, 3.0, -3.0, 3.0];
//! let src = pipeline.add(SampleFunction::new(sphere, [8, 8, 8], bounds));
//! let contour = pipeline.add(ContourFilter::new(0.0));
//! pipeline
//!     .set_input_connection(contour, 0, pipeline.output_port(src, 0).unwrap())
//!     .unwrap();
//! let surface = pipeline.output(pipeline.output_port(contour, 0).unwrap()).unwrap();
//! assert!(surface.number_of_cells() > 0);
//! ```

pub mod algorithm;
pub mod executive;
pub mod extent_translator;
pub mod trivial_producer;

use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use hashbrown::HashSet;
use parking_lot::{Mutex, ReentrantMutex, RwLock};

use crate::config::PipelineConfig;
use crate::data::object::DataObject;
use crate::event::{CallData, CallDataType, EventContext, EventKind, ObserverTag, Subject};
use crate::information::{Information, keys};
use crate::pipeline_error::{ErrorKind, PipelineError, PipelineResult, PortDirection};

pub use algorithm::{Algorithm, AsAny, RequestContext, default_request_data_object};
pub use executive::{ExecutionStatus, RequestPass};
pub use extent_translator::{SplitMode, piece_extent, piece_extent_with_ghosts};
pub use trivial_producer::TrivialProducer;

use executive::ExecutiveState;

/// Handle of an algorithm inside a [`Pipeline`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct AlgorithmId(pub usize);

impl fmt::Display for AlgorithmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An output port of an algorithm; the unit of connection.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct OutputPort {
    pub algorithm: AlgorithmId,
    pub index: usize,
}

pub(crate) struct Node {
    pub(crate) id: AlgorithmId,
    pub(crate) name: String,
    pub(crate) algorithm: Mutex<Box<dyn Algorithm>>,
    pub(crate) state: Mutex<ExecutiveState>,
    pub(crate) subject: Arc<Subject>,
    pub(crate) abort: Arc<AtomicBool>,
    pub(crate) mtime: AtomicU64,
}

impl Node {
    pub(crate) fn fire(&self, event: EventKind, data: CallData) -> bool {
        self.subject.invoke(&event, &data, Some(&self.abort))
    }
}

/// Engine context: algorithm arena, global modification clock and the
/// re-entrancy guard of `update`.
pub struct Pipeline {
    pub(crate) config: PipelineConfig,
    pub(crate) nodes: RwLock<Vec<Option<Arc<Node>>>>,
    clock: AtomicU64,
    pub(crate) update_guard: ReentrantMutex<Cell<bool>>,
}

static_assertions::assert_impl_all!(Pipeline: Send, Sync);

impl Default for Pipeline {
    fn default() -> Self {
        Self::with_config(PipelineConfig::default())
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nodes = self.nodes.read();
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field(
                "algorithms",
                &nodes.iter().flatten().map(|n| n.name.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PipelineConfig) -> Self {
        Self {
            config,
            nodes: RwLock::new(Vec::new()),
            clock: AtomicU64::new(0),
            update_guard: ReentrantMutex::new(Cell::new(false)),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Advance the modification clock and return the new time.
    pub(crate) fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn node(&self, id: AlgorithmId) -> PipelineResult<Arc<Node>> {
        self.nodes
            .read()
            .get(id.0)
            .and_then(Option::clone)
            .ok_or(PipelineError::UnknownAlgorithm(id.0))
    }

    /// Add an algorithm and initialize its ports.
    pub fn add<A: Algorithm + 'static>(&self, algorithm: A) -> AlgorithmId {
        let boxed: Box<dyn Algorithm> = Box::new(algorithm);
        let mut nodes = self.nodes.write();
        let id = AlgorithmId(nodes.len());
        let name = format!("{}#{}", boxed.class_name(), id.0);
        let state = ExecutiveState::new(&*boxed, self.config.release_data);
        log::debug!("added {name}");
        nodes.push(Some(Arc::new(Node {
            id,
            subject: Arc::new(Subject::new(name.clone())),
            name,
            algorithm: Mutex::new(boxed),
            state: Mutex::new(state),
            abort: Arc::new(AtomicBool::new(false)),
            mtime: AtomicU64::new(self.tick()),
        })));
        id
    }

    /// Remove an algorithm that feeds no other algorithm. Implicit producers
    /// created by [`Pipeline::set_input_data`] go with it.
    pub fn remove(&self, id: AlgorithmId) -> PipelineResult<()> {
        let node = self.node(id)?;
        for other in self.nodes.read().iter().flatten() {
            if other.id == id {
                continue;
            }
            let st = other.state.lock();
            if st.producers().any(|p| p.algorithm == id) {
                return Err(PipelineError::AlgorithmInUse {
                    algorithm: node.name.clone(),
                    consumer: other.name.clone(),
                });
            }
        }
        let implicit: Vec<AlgorithmId> = node
            .state
            .lock()
            .implicit_producers
            .iter()
            .flatten()
            .copied()
            .collect();
        let mut nodes = self.nodes.write();
        nodes[id.0] = None;
        for tp in implicit {
            if let Some(slot) = nodes.get_mut(tp.0) {
                *slot = None;
            }
        }
        log::debug!("removed {}", node.name);
        Ok(())
    }

    /// Live algorithm ids in insertion order.
    pub fn algorithms(&self) -> Vec<AlgorithmId> {
        self.nodes.read().iter().flatten().map(|n| n.id).collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.read().iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Diagnostic name, `ClassName#id`.
    pub fn name(&self, id: AlgorithmId) -> PipelineResult<String> {
        Ok(self.node(id)?.name.clone())
    }

    pub fn number_of_input_ports(&self, id: AlgorithmId) -> PipelineResult<usize> {
        Ok(self.node(id)?.state.lock().inputs.len())
    }

    pub fn number_of_output_ports(&self, id: AlgorithmId) -> PipelineResult<usize> {
        Ok(self.node(id)?.state.lock().outputs.len())
    }

    /// Handle to output `index` of `id`, usable in connections.
    pub fn output_port(&self, id: AlgorithmId, index: usize) -> PipelineResult<OutputPort> {
        let node = self.node(id)?;
        let count = node.state.lock().outputs.len();
        if index >= count {
            return Err(self.report(
                &node,
                PipelineError::PortOutOfRange {
                    algorithm: node.name.clone(),
                    direction: PortDirection::Output,
                    index,
                    count,
                },
            ));
        }
        Ok(OutputPort { algorithm: id, index })
    }

    // --- connections -----------------------------------------------------------

    fn check_connection(
        &self,
        consumer: &Node,
        port: usize,
        producer: OutputPort,
    ) -> PipelineResult<()> {
        let inputs = consumer.state.lock().inputs.len();
        if port >= inputs {
            return Err(PipelineError::PortOutOfRange {
                algorithm: consumer.name.clone(),
                direction: PortDirection::Input,
                index: port,
                count: inputs,
            });
        }
        let upstream = self.node(producer.algorithm)?;
        let outputs = upstream.state.lock().outputs.len();
        if producer.index >= outputs {
            return Err(PipelineError::PortOutOfRange {
                algorithm: upstream.name.clone(),
                direction: PortDirection::Output,
                index: producer.index,
                count: outputs,
            });
        }
        if producer.algorithm == consumer.id || self.reaches(producer.algorithm, consumer.id)? {
            return Err(PipelineError::CyclicConnection {
                upstream: upstream.name.clone(),
                downstream: consumer.name.clone(),
            });
        }
        Ok(())
    }

    /// Whether `target` is upstream of (or equal to) `from`.
    fn reaches(&self, from: AlgorithmId, target: AlgorithmId) -> PipelineResult<bool> {
        let mut seen = HashSet::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            if id == target {
                return Ok(true);
            }
            if !seen.insert(id) {
                continue;
            }
            let node = self.node(id)?;
            stack.extend(node.state.lock().producers().map(|p| p.algorithm));
        }
        Ok(false)
    }

    fn connect(
        &self,
        consumer: AlgorithmId,
        port: usize,
        producer: OutputPort,
        replace: bool,
    ) -> PipelineResult<()> {
        let node = self.node(consumer)?;
        self.check_connection(&node, port, producer)
            .map_err(|e| self.report(&node, e))?;
        let dropped_implicit = {
            let mut st = node.state.lock();
            let input = &st.inputs[port];
            if !replace
                && !input.connections.is_empty()
                && !input.info.flag(keys::INPUT_IS_REPEATABLE)
            {
                drop(st);
                log::warn!("{}: input port {port} is not repeatable", node.name);
                return Err(self.report(
                    &node,
                    PipelineError::PortNotRepeatable {
                        algorithm: node.name.clone(),
                        port,
                    },
                ));
            }
            if replace {
                st.inputs[port].connections.clear();
            }
            st.inputs[port].connections.push(producer);
            let implicit = st.implicit_producers[port];
            match implicit {
                Some(tp) if tp != producer.algorithm => {
                    st.implicit_producers[port] = None;
                    Some(tp)
                }
                _ => None,
            }
        };
        if let Some(tp) = dropped_implicit {
            self.drop_implicit(tp);
        }
        log::trace!("{} input {port} <- {}:{}", node.name, producer.algorithm, producer.index);
        self.touch(&node);
        Ok(())
    }

    fn drop_implicit(&self, tp: AlgorithmId) {
        if let Some(slot) = self.nodes.write().get_mut(tp.0) {
            *slot = None;
        }
    }

    /// Make `producer` the only connection of input `port`.
    pub fn set_input_connection(
        &self,
        consumer: AlgorithmId,
        port: usize,
        producer: OutputPort,
    ) -> PipelineResult<()> {
        self.connect(consumer, port, producer, true)
    }

    /// Append `producer` to input `port`; the port must be repeatable unless empty.
    pub fn add_input_connection(
        &self,
        consumer: AlgorithmId,
        port: usize,
        producer: OutputPort,
    ) -> PipelineResult<()> {
        self.connect(consumer, port, producer, false)
    }

    /// Remove one connection; returns whether it existed.
    pub fn remove_input_connection(
        &self,
        consumer: AlgorithmId,
        port: usize,
        producer: OutputPort,
    ) -> PipelineResult<bool> {
        let node = self.node(consumer)?;
        let removed = {
            let mut st = node.state.lock();
            let Some(input) = st.inputs.get_mut(port) else {
                let count = st.inputs.len();
                drop(st);
                return Err(self.report(
                    &node,
                    PipelineError::PortOutOfRange {
                        algorithm: node.name.clone(),
                        direction: PortDirection::Input,
                        index: port,
                        count,
                    },
                ));
            };
            let before = input.connections.len();
            input.connections.retain(|c| *c != producer);
            input.connections.len() != before
        };
        if removed {
            self.touch(&node);
        }
        Ok(removed)
    }

    pub fn number_of_input_connections(
        &self,
        consumer: AlgorithmId,
        port: usize,
    ) -> PipelineResult<usize> {
        let node = self.node(consumer)?;
        let st = node.state.lock();
        Ok(st.inputs.get(port).map_or(0, |p| p.connections.len()))
    }

    pub fn input_connection(
        &self,
        consumer: AlgorithmId,
        port: usize,
        index: usize,
    ) -> PipelineResult<Option<OutputPort>> {
        let node = self.node(consumer)?;
        let st = node.state.lock();
        Ok(st.inputs.get(port).and_then(|p| p.connections.get(index)).copied())
    }

    /// Feed `data` into input `port` through an implicit [`TrivialProducer`].
    ///
    /// Repeated calls on the same port reuse the producer and mark it
    /// modified. Returns the producer's id.
    pub fn set_input_data(
        &self,
        consumer: AlgorithmId,
        port: usize,
        data: impl Into<DataObject>,
    ) -> PipelineResult<AlgorithmId> {
        let node = self.node(consumer)?;
        let existing = node.state.lock().implicit_producers.get(port).copied().flatten();
        let data = data.into();
        if let Some(tp) = existing {
            self.configure::<TrivialProducer, _>(tp, |p| p.set_data(data))?;
            return Ok(tp);
        }
        let tp = self.add(TrivialProducer::new(data));
        let producer = OutputPort {
            algorithm: tp,
            index: 0,
        };
        if let Err(e) = self.set_input_connection(consumer, port, producer) {
            self.drop_implicit(tp);
            return Err(e);
        }
        node.state.lock().implicit_producers[port] = Some(tp);
        Ok(tp)
    }

    // --- parameters ------------------------------------------------------------

    /// Mutate the parameters of algorithm `id` and mark it modified.
    ///
    /// Fails with `AlgorithmBusy` while the algorithm executes and with
    /// `AlgorithmTypeMismatch` when `A` is not its concrete type.
    pub fn configure<A, R>(&self, id: AlgorithmId, f: impl FnOnce(&mut A) -> R) -> PipelineResult<R>
    where
        A: Algorithm + Any,
    {
        let node = self.node(id)?;
        let result = {
            let Some(mut guard) = node.algorithm.try_lock() else {
                return Err(self.report(&node, PipelineError::AlgorithmBusy(node.name.clone())));
            };
            let algorithm: &mut dyn Algorithm = &mut **guard;
            let Some(typed) = algorithm.as_any_mut().downcast_mut::<A>() else {
                drop(guard);
                let err = PipelineError::AlgorithmTypeMismatch(node.name.clone());
                return Err(self.report(&node, err));
            };
            f(typed)
        };
        self.touch(&node);
        Ok(result)
    }

    /// Read the parameters of algorithm `id` without marking it modified.
    pub fn inspect<A, R>(&self, id: AlgorithmId, f: impl FnOnce(&A) -> R) -> PipelineResult<R>
    where
        A: Algorithm + Any,
    {
        let node = self.node(id)?;
        let Some(guard) = node.algorithm.try_lock() else {
            return Err(PipelineError::AlgorithmBusy(node.name.clone()));
        };
        let algorithm: &dyn Algorithm = &**guard;
        algorithm
            .as_any()
            .downcast_ref::<A>()
            .map(f)
            .ok_or_else(|| PipelineError::AlgorithmTypeMismatch(node.name.clone()))
    }

    /// Bump the modification time of `id`, invalidating its cached outputs.
    pub fn modified(&self, id: AlgorithmId) -> PipelineResult<()> {
        let node = self.node(id)?;
        self.touch(&node);
        Ok(())
    }

    fn touch(&self, node: &Node) {
        node.mtime.store(self.tick(), Ordering::SeqCst);
        node.fire(EventKind::Modified, CallData::None);
    }

    pub fn mtime(&self, id: AlgorithmId) -> PipelineResult<u64> {
        Ok(self.node(id)?.mtime.load(Ordering::SeqCst))
    }

    // --- observers -------------------------------------------------------------

    /// Observe `event` on `id` with priority 0 and the payload as sent.
    pub fn add_observer<F>(
        &self,
        id: AlgorithmId,
        event: EventKind,
        callback: F,
    ) -> PipelineResult<ObserverTag>
    where
        F: Fn(&mut EventContext) + Send + Sync + 'static,
    {
        self.add_observer_with(id, event, 0.0, CallDataType::Any, callback)
    }

    pub fn add_observer_with<F>(
        &self,
        id: AlgorithmId,
        event: EventKind,
        priority: f32,
        data_type: CallDataType,
        callback: F,
    ) -> PipelineResult<ObserverTag>
    where
        F: Fn(&mut EventContext) + Send + Sync + 'static,
    {
        let node = self.node(id)?;
        node.subject
            .add_observer(event, priority, data_type, Arc::new(callback))
            .map_err(|e| self.report(&node, e))
    }

    pub fn remove_observer(&self, id: AlgorithmId, tag: ObserverTag) -> PipelineResult<bool> {
        let node = self.node(id)?;
        node.subject.remove_observer(tag).map_err(|e| self.report(&node, e))
    }

    /// Fire `event` on `id`; returns whether an observer stopped propagation.
    pub fn invoke_event(
        &self,
        id: AlgorithmId,
        event: EventKind,
        data: CallData,
    ) -> PipelineResult<bool> {
        Ok(self.node(id)?.fire(event, data))
    }

    // --- execution control -----------------------------------------------------

    pub fn set_abort_execute(&self, id: AlgorithmId, abort: bool) -> PipelineResult<()> {
        self.node(id)?.abort.store(abort, Ordering::SeqCst);
        Ok(())
    }

    pub fn abort_execute(&self, id: AlgorithmId) -> PipelineResult<bool> {
        Ok(self.node(id)?.abort.load(Ordering::SeqCst))
    }

    /// Release the data of `port` once its consumers have executed.
    pub fn set_release_data_flag(&self, port: OutputPort, release: bool) -> PipelineResult<()> {
        let node = self.node(port.algorithm)?;
        let mut st = node.state.lock();
        let count = st.outputs.len();
        match st.outputs.get_mut(port.index) {
            Some(out) => {
                out.release = release;
                Ok(())
            }
            None => Err(PipelineError::PortOutOfRange {
                algorithm: node.name.clone(),
                direction: PortDirection::Output,
                index: port.index,
                count,
            }),
        }
    }

    pub fn release_data_flag(&self, port: OutputPort) -> PipelineResult<bool> {
        let node = self.node(port.algorithm)?;
        let st = node.state.lock();
        Ok(st.outputs.get(port.index).is_some_and(|o| o.release))
    }

    pub fn execution_status(&self, id: AlgorithmId) -> PipelineResult<ExecutionStatus> {
        Ok(self.node(id)?.state.lock().status)
    }

    // --- outputs ---------------------------------------------------------------

    /// Update `port` and return its data object.
    pub fn output(&self, port: OutputPort) -> PipelineResult<Arc<DataObject>> {
        self.update_port(port)?;
        self.cached_output(port)?
            .ok_or_else(|| PipelineError::MissingOutputDataObject {
                algorithm: self.name(port.algorithm).unwrap_or_default(),
                port: port.index,
            })
    }

    /// The data object currently cached on `port`, without updating.
    pub fn cached_output(&self, port: OutputPort) -> PipelineResult<Option<Arc<DataObject>>> {
        Ok(self.output_information(port)?.data_object().cloned())
    }

    /// Snapshot of the information of `port`.
    pub fn output_information(&self, port: OutputPort) -> PipelineResult<Information> {
        let node = self.node(port.algorithm)?;
        let st = node.state.lock();
        let count = st.outputs.len();
        st.outputs
            .get(port.index)
            .map(|o| o.info.clone())
            .ok_or_else(|| PipelineError::PortOutOfRange {
                algorithm: node.name.clone(),
                direction: PortDirection::Output,
                index: port.index,
                count,
            })
    }

    /// Snapshot of the port information of input `port` of `id`.
    pub fn input_port_information(
        &self,
        id: AlgorithmId,
        port: usize,
    ) -> PipelineResult<Information> {
        let node = self.node(id)?;
        let st = node.state.lock();
        let count = st.inputs.len();
        st.inputs
            .get(port)
            .map(|p| p.info.clone())
            .ok_or_else(|| PipelineError::PortOutOfRange {
                algorithm: node.name.clone(),
                direction: PortDirection::Input,
                index: port,
                count,
            })
    }

    // --- diagnostics -----------------------------------------------------------

    /// Log `error`, fire `ErrorEvent` on `node` and hand the error back.
    pub(crate) fn report(&self, node: &Node, error: PipelineError) -> PipelineError {
        log::error!("{}: {}", node.name, error);
        node.fire(EventKind::Error, CallData::Error((&error).into()));
        if error.kind() == ErrorKind::ContractViolation && self.config.abort_on_contract_violation {
            panic!("{}: {}", node.name, error);
        }
        error
    }

    /// [`Pipeline::report`], also marking the node failed unless the error
    /// is a contract violation.
    pub(crate) fn fail(&self, node: &Node, error: PipelineError) -> PipelineError {
        if error.kind() != ErrorKind::ContractViolation {
            node.state.lock().status = ExecutionStatus::Failed(error.kind());
        }
        self.report(node, error)
    }
}
