//! Executive: drives algorithms through the request passes.
//!
//! One update runs four passes, each over the upstream graph of the
//! target algorithm:
//!
//! 1. `REQUEST_DATA_OBJECT`, upstream first: validate inputs and make sure
//!    every output holds a data object of the declared type.
//! 2. `REQUEST_INFORMATION`, upstream first: re-run metadata handlers whose
//!    pipeline modification time is newer than their last information.
//! 3. `REQUEST_UPDATE_EXTENT`, downstream first: copy the request to every
//!    input, let the algorithm rewrite it and forward it to the producers.
//! 4. `REQUEST_DATA`, upstream first: execute every algorithm whose cached
//!    output does not satisfy the request.
//!
//! A failure stops the update, fires `ErrorEvent` on the algorithm where it
//! was detected and leaves that algorithm marked failed so the next update
//! retries it.

use std::cell::Cell;
use std::fmt;
use std::sync::atomic::Ordering;

use hashbrown::{HashMap, HashSet};
use itertools::Itertools;
use parking_lot::ReentrantMutexGuard;

use super::algorithm::{Algorithm, Monitor, RequestContext};
use super::extent_translator::piece_extent;
use super::{AlgorithmId, Node, OutputPort, Pipeline};
use crate::data::extent::Extent;
use crate::data::object::DataObject;
use crate::consistency::Consistent;
use crate::event::{CallData, EventKind};
use crate::information::{Information, Marker, keys};
use crate::pipeline_error::{ErrorKind, PipelineError, PipelineResult, PortDirection};

/// The four request passes, in execution order.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum RequestPass {
    DataObject,
    Information,
    UpdateExtent,
    Data,
}

impl RequestPass {
    /// Request information carrying this pass's marker.
    pub(crate) fn request(self, from_port: Option<usize>) -> Information {
        let mut request = Information::new();
        match self {
            RequestPass::DataObject => request.set(keys::REQUEST_DATA_OBJECT, Marker),
            RequestPass::Information => request.set(keys::REQUEST_INFORMATION, Marker),
            RequestPass::UpdateExtent => request.set(keys::REQUEST_UPDATE_EXTENT, Marker),
            RequestPass::Data => request.set(keys::REQUEST_DATA, Marker),
        }
        if let Some(port) = from_port {
            request.set(keys::FROM_OUTPUT_PORT, port as i32);
        }
        request
    }
}

impl fmt::Display for RequestPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RequestPass::DataObject => "REQUEST_DATA_OBJECT",
            RequestPass::Information => "REQUEST_INFORMATION",
            RequestPass::UpdateExtent => "REQUEST_UPDATE_EXTENT",
            RequestPass::Data => "REQUEST_DATA",
        })
    }
}

/// Outcome of the last execution of an algorithm.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum ExecutionStatus {
    #[default]
    NotExecuted,
    Executed,
    /// The abort flag was raised; outputs were replaced by empty instances.
    Aborted,
    Failed(ErrorKind),
}

pub(crate) struct InputPortState {
    pub(crate) info: Information,
    pub(crate) connections: Vec<OutputPort>,
}

pub(crate) struct OutputPortState {
    pub(crate) info: Information,
    pub(crate) release: bool,
    pub(crate) released: bool,
}

/// Per-algorithm executive bookkeeping.
pub(crate) struct ExecutiveState {
    pub(crate) inputs: Vec<InputPortState>,
    pub(crate) outputs: Vec<OutputPortState>,
    /// Trivial producer created by `set_input_data`, per input port.
    pub(crate) implicit_producers: Vec<Option<AlgorithmId>>,
    pub(crate) status: ExecutionStatus,
    information_time: u64,
    pipeline_mtime: u64,
    execute_time: u64,
    executed_once: bool,
    release_default: bool,
}

impl ExecutiveState {
    pub(crate) fn new(algorithm: &dyn Algorithm, release_default: bool) -> Self {
        let mut state = Self {
            inputs: Vec::new(),
            outputs: Vec::new(),
            implicit_producers: Vec::new(),
            status: ExecutionStatus::NotExecuted,
            information_time: 0,
            pipeline_mtime: 0,
            execute_time: 0,
            executed_once: false,
            release_default,
        };
        state.resize_ports(algorithm);
        state
    }

    fn resize_ports(&mut self, algorithm: &dyn Algorithm) {
        let inputs = algorithm.number_of_input_ports();
        let outputs = algorithm.number_of_output_ports();
        self.inputs.truncate(inputs);
        while self.inputs.len() < inputs {
            let mut info = Information::new();
            algorithm.fill_input_port_information(self.inputs.len(), &mut info);
            self.inputs.push(InputPortState {
                info,
                connections: Vec::new(),
            });
        }
        self.implicit_producers.resize(inputs, None);
        self.outputs.truncate(outputs);
        while self.outputs.len() < outputs {
            let mut info = Information::new();
            algorithm.fill_output_port_information(self.outputs.len(), &mut info);
            self.outputs.push(OutputPortState {
                info,
                release: self.release_default,
                released: false,
            });
        }
    }

    pub(crate) fn producers(&self) -> impl Iterator<Item = OutputPort> + '_ {
        self.inputs.iter().flat_map(|p| p.connections.iter().copied())
    }

    fn connections(&self) -> Vec<Vec<OutputPort>> {
        self.inputs.iter().map(|p| p.connections.clone()).collect()
    }
}

/// Downstream request applied to the target output port.
#[derive(Clone, Copy, Debug)]
struct UpdateRequest {
    extent: Option<Extent>,
    piece: i32,
    pieces: i32,
    ghost_levels: i32,
    time: Option<f64>,
}

impl Default for UpdateRequest {
    fn default() -> Self {
        Self {
            extent: None,
            piece: 0,
            pieces: 1,
            ghost_levels: 0,
            time: None,
        }
    }
}

impl UpdateRequest {
    fn apply(&self, info: &mut Information) {
        match self.extent.or_else(|| info.get(keys::WHOLE_EXTENT)) {
            Some(extent) => info.set(keys::UPDATE_EXTENT, extent),
            None => {
                info.remove(keys::UPDATE_EXTENT);
            }
        }
        info.set(keys::UPDATE_PIECE_NUMBER, self.piece);
        info.set(keys::UPDATE_NUMBER_OF_PIECES, self.pieces);
        info.set(keys::UPDATE_NUMBER_OF_GHOST_LEVELS, self.ghost_levels);
        match self.time {
            Some(t) => info.set(keys::UPDATE_TIME_STEP, t),
            None => {
                info.remove(keys::UPDATE_TIME_STEP);
            }
        }
    }
}

/// Piece translation applied to one output during `REQUEST_DATA`.
#[derive(Clone, Copy, Debug)]
struct Translation {
    all: Extent,
    owned: Extent,
}

/// Clears the re-entrancy flag when an update ends, including by panic.
struct UpdateScope<'a> {
    guard: ReentrantMutexGuard<'a, Cell<bool>>,
}

impl Drop for UpdateScope<'_> {
    fn drop(&mut self) {
        self.guard.set(false);
    }
}

fn piece_request(info: &Information) -> (i32, i32, i32) {
    (
        info.get(keys::UPDATE_PIECE_NUMBER).unwrap_or(0),
        info.get(keys::UPDATE_NUMBER_OF_PIECES).unwrap_or(1),
        info.get(keys::UPDATE_NUMBER_OF_GHOST_LEVELS).unwrap_or(0),
    )
}

/// Requested extent, defaulting to the whole extent.
fn requested_extent(info: &Information) -> Option<Extent> {
    info.get(keys::UPDATE_EXTENT)
        .or_else(|| info.get(keys::WHOLE_EXTENT))
}

fn copy_request(dst: &mut Information, src: &Information) {
    dst.copy_entry(src, keys::UPDATE_EXTENT);
    dst.copy_entry(src, keys::UPDATE_PIECE_NUMBER);
    dst.copy_entry(src, keys::UPDATE_NUMBER_OF_PIECES);
    dst.copy_entry(src, keys::UPDATE_NUMBER_OF_GHOST_LEVELS);
    dst.copy_entry(src, keys::UPDATE_TIME_STEP);
}

/// Widen `merged` so that data satisfying it also satisfies `other`.
///
/// Extents are joined into their bounding box. Differing piece requests
/// fall back to the whole data set. The deepest ghost request wins.
fn merge_request(merged: &mut Information, other: &Information) {
    match (merged.get(keys::UPDATE_EXTENT), other.get(keys::UPDATE_EXTENT)) {
        (Some(a), Some(b)) => merged.set(keys::UPDATE_EXTENT, a.union(&b)),
        _ => {
            merged.remove(keys::UPDATE_EXTENT);
        }
    }
    let (piece, pieces, ghosts) = piece_request(merged);
    let (other_piece, other_pieces, other_ghosts) = piece_request(other);
    if (piece, pieces) != (other_piece, other_pieces) {
        merged.set(keys::UPDATE_PIECE_NUMBER, 0);
        merged.set(keys::UPDATE_NUMBER_OF_PIECES, 1);
    }
    merged.set(keys::UPDATE_NUMBER_OF_GHOST_LEVELS, ghosts.max(other_ghosts));
    match (merged.get(keys::UPDATE_TIME_STEP), other.get(keys::UPDATE_TIME_STEP)) {
        (None, Some(t)) => merged.set(keys::UPDATE_TIME_STEP, t),
        (Some(a), Some(b)) if a != b => {
            log::warn!("conflicting time requests {a} and {b}, keeping {a}")
        }
        _ => {}
    }
}

fn copy_default_information(dst: &mut Information, src: &Information) {
    dst.copy_entry(src, keys::WHOLE_EXTENT);
    dst.copy_entry(src, keys::SPACING);
    dst.copy_entry(src, keys::ORIGIN);
    dst.copy_entry(src, keys::TIME_STEPS);
    dst.copy_entry(src, keys::TIME_RANGE);
}

/// Entries that survive a re-run of `REQUEST_INFORMATION`.
fn survives_information(name: &str) -> bool {
    name.starts_with("DATA_")
        || name.starts_with("UPDATE_")
        || name == keys::ALL_PIECES_EXTENT.name()
}

/// Whether the cached data described by `info` satisfies the request in it.
fn request_satisfied(info: &Information) -> bool {
    let (piece, pieces, ghosts) = piece_request(info);
    if info.get(keys::DATA_NUMBER_OF_PIECES) != Some(pieces) {
        return false;
    }
    if pieces > 1 && info.get(keys::DATA_PIECE_NUMBER) != Some(piece) {
        return false;
    }
    if ghosts > info.get(keys::DATA_NUMBER_OF_GHOST_LEVELS).unwrap_or(0) {
        return false;
    }
    if let Some(requested) = requested_extent(info) {
        let have = match info.get(keys::ALL_PIECES_EXTENT) {
            Some(all) => Some(all),
            None if pieces == 1 => info.get(keys::DATA_EXTENT),
            None => None,
        };
        if have.is_some_and(|have| !have.contains(&requested)) {
            return false;
        }
    }
    if info.has(keys::TIME_STEPS)
        && info.get(keys::UPDATE_TIME_STEP) != info.get(keys::DATA_TIME_STEP)
    {
        return false;
    }
    true
}

fn empty_instance(info: &Information) -> Option<DataObject> {
    info.data_object()
        .and_then(|d| DataObject::new_instance(d.data_type()).ok())
}

impl Pipeline {
    /// Bring output 0 of `id` up to date with a whole-extent request, or run
    /// a sink (an algorithm without outputs).
    pub fn update(&self, id: AlgorithmId) -> PipelineResult<()> {
        let port = (self.number_of_output_ports(id)? > 0).then_some(0);
        self.update_with(id, port, UpdateRequest::default())
    }

    pub fn update_port(&self, port: OutputPort) -> PipelineResult<()> {
        self.update_with(port.algorithm, Some(port.index), UpdateRequest::default())
    }

    /// Request piece `piece` of `pieces` with `ghost_levels` ghost layers.
    pub fn update_piece(
        &self,
        port: OutputPort,
        piece: i32,
        pieces: i32,
        ghost_levels: i32,
    ) -> PipelineResult<()> {
        self.update_with(
            port.algorithm,
            Some(port.index),
            UpdateRequest {
                piece,
                pieces,
                ghost_levels,
                ..UpdateRequest::default()
            },
        )
    }

    /// Request a structured sub-extent.
    pub fn update_extent(&self, port: OutputPort, extent: Extent) -> PipelineResult<()> {
        self.update_with(
            port.algorithm,
            Some(port.index),
            UpdateRequest {
                extent: Some(extent),
                ..UpdateRequest::default()
            },
        )
    }

    /// Request the data at time `time`.
    pub fn update_time_step(&self, port: OutputPort, time: f64) -> PipelineResult<()> {
        self.update_with(
            port.algorithm,
            Some(port.index),
            UpdateRequest {
                time: Some(time),
                ..UpdateRequest::default()
            },
        )
    }

    /// Run only the data-object and information passes.
    pub fn update_information(&self, id: AlgorithmId) -> PipelineResult<()> {
        let _scope = self.enter(id)?;
        self.data_object_pass(id, &mut HashSet::new())?;
        self.information_pass(id, &mut HashSet::new())?;
        Ok(())
    }

    fn enter(&self, id: AlgorithmId) -> PipelineResult<UpdateScope<'_>> {
        let node = self.node(id)?;
        let guard = self.update_guard.lock();
        if guard.get() {
            drop(guard);
            return Err(self.report(&node, PipelineError::RecursiveUpdate(node.name.clone())));
        }
        guard.set(true);
        Ok(UpdateScope { guard })
    }

    fn update_with(
        &self,
        id: AlgorithmId,
        port: Option<usize>,
        request: UpdateRequest,
    ) -> PipelineResult<()> {
        let _scope = self.enter(id)?;
        let node = self.node(id)?;
        if let Some(index) = port {
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
        }
        log::debug!("update {} ({:?})", node.name, request);
        self.data_object_pass(id, &mut HashSet::new())?;
        self.information_pass(id, &mut HashSet::new())?;

        let mut sink_request = Information::new();
        match port {
            Some(index) => {
                if let Some(out) = node.state.lock().outputs.get_mut(index) {
                    request.apply(&mut out.info);
                }
                self.validate_request(&node, index)?;
            }
            None => request.apply(&mut sink_request),
        }
        self.update_extent_pass(id, port, &sink_request)?;

        let mut consumed = HashSet::new();
        self.data_pass(id, &mut HashSet::new(), &mut consumed)?;
        self.release_consumed(&consumed);
        Ok(())
    }

    fn context(
        &self,
        node: &Node,
        pass: RequestPass,
        from_port: Option<usize>,
    ) -> PipelineResult<RequestContext> {
        let (connections, outputs) = {
            let st = node.state.lock();
            let outputs: Vec<Information> = st.outputs.iter().map(|o| o.info.clone()).collect();
            (st.connections(), outputs)
        };
        let inputs = connections
            .iter()
            .map(|conns| {
                conns
                    .iter()
                    .map(|c| self.output_information(*c))
                    .collect::<PipelineResult<Vec<_>>>()
            })
            .collect::<PipelineResult<Vec<_>>>()?;
        Ok(RequestContext::new(
            pass,
            pass.request(from_port),
            inputs,
            outputs,
            Monitor {
                name: node.name.clone(),
                subject: node.subject.clone(),
                abort: node.abort.clone(),
            },
        ))
    }

    fn store_outputs(&self, node: &Node, outputs: Vec<Information>) {
        let mut st = node.state.lock();
        for (slot, info) in st.outputs.iter_mut().zip(outputs) {
            slot.info = info;
        }
    }

    /// Call one handler with the algorithm locked. Data errors raised by a
    /// handler become execution errors of this algorithm.
    fn run_handler(
        &self,
        node: &Node,
        ctx: &mut RequestContext,
        handler: impl FnOnce(&mut dyn Algorithm, &mut RequestContext) -> PipelineResult<()>,
    ) -> PipelineResult<()> {
        let result = match node.algorithm.try_lock() {
            Some(mut algorithm) => handler(&mut **algorithm, ctx),
            None => Err(PipelineError::AlgorithmBusy(node.name.clone())),
        };
        result.map_err(|e| {
            let e = match e.kind() {
                ErrorKind::Data => {
                    PipelineError::request_failed(node.name.clone(), ctx.pass(), e.to_string())
                }
                _ => e,
            };
            self.fail(node, e)
        })
    }

    fn sync_ports(&self, node: &Node) -> PipelineResult<()> {
        let Some(algorithm) = node.algorithm.try_lock() else {
            return Err(self.report(node, PipelineError::AlgorithmBusy(node.name.clone())));
        };
        let mut st = node.state.lock();
        if st.inputs.len() == algorithm.number_of_input_ports()
            && st.outputs.len() == algorithm.number_of_output_ports()
        {
            return Ok(());
        }
        if st.executed_once {
            drop(st);
            drop(algorithm);
            return Err(self.report(node, PipelineError::PortLayoutFrozen(node.name.clone())));
        }
        st.resize_ports(&**algorithm);
        Ok(())
    }

    fn check_inputs(&self, node: &Node) -> PipelineResult<()> {
        let ports: Vec<(Information, Vec<OutputPort>)> = node
            .state
            .lock()
            .inputs
            .iter()
            .map(|p| (p.info.clone(), p.connections.clone()))
            .collect();
        for (port, (info, connections)) in ports.iter().enumerate() {
            if connections.is_empty() {
                if info.flag(keys::INPUT_IS_OPTIONAL) {
                    continue;
                }
                return Err(self.fail(
                    node,
                    PipelineError::UnconnectedInput {
                        algorithm: node.name.clone(),
                        port,
                    },
                ));
            }
            let required = info.get(keys::INPUT_REQUIRED_DATA_TYPE).unwrap_or_default();
            if required.is_empty() {
                continue;
            }
            for connection in connections {
                let found = self
                    .output_information(*connection)?
                    .data_object()
                    .map(|d| d.data_type());
                let Some(found) = found else { continue };
                if !required.iter().any(|r| found.is_a(*r)) {
                    return Err(self.fail(
                        node,
                        PipelineError::IncompatibleInput {
                            algorithm: node.name.clone(),
                            port,
                            expected: required.iter().map(|t| t.name()).join(" or "),
                            found,
                        },
                    ));
                }
            }
        }
        Ok(())
    }

    fn data_object_pass(
        &self,
        id: AlgorithmId,
        visited: &mut HashSet<AlgorithmId>,
    ) -> PipelineResult<()> {
        if !visited.insert(id) {
            return Ok(());
        }
        let node = self.node(id)?;
        self.sync_ports(&node)?;
        let producers: Vec<OutputPort> = node.state.lock().producers().collect();
        for p in &producers {
            self.data_object_pass(p.algorithm, visited)?;
        }
        self.check_inputs(&node)?;
        let mut ctx = self.context(&node, RequestPass::DataObject, None)?;
        self.run_handler(&node, &mut ctx, |a, c| a.request_data_object(c))?;
        let missing = ctx.outputs.iter().position(|o| o.data_object().is_none());
        self.store_outputs(&node, ctx.outputs);
        if let Some(port) = missing {
            return Err(self.fail(
                &node,
                PipelineError::MissingOutputDataObject {
                    algorithm: node.name.clone(),
                    port,
                },
            ));
        }
        Ok(())
    }

    /// Returns the pipeline modification time of `id`.
    fn information_pass(
        &self,
        id: AlgorithmId,
        visited: &mut HashSet<AlgorithmId>,
    ) -> PipelineResult<u64> {
        let node = self.node(id)?;
        if !visited.insert(id) {
            return Ok(node.state.lock().pipeline_mtime);
        }
        let producers: Vec<OutputPort> = node.state.lock().producers().collect();
        let mut mtime = node.mtime.load(Ordering::SeqCst);
        for p in &producers {
            mtime = mtime.max(self.information_pass(p.algorithm, visited)?);
        }
        let stale = {
            let mut st = node.state.lock();
            st.pipeline_mtime = mtime;
            mtime > st.information_time
        };
        if !stale {
            return Ok(mtime);
        }
        log::debug!("{}: {}", node.name, RequestPass::Information);
        let mut ctx = self.context(&node, RequestPass::Information, None)?;
        let first_input = ctx.input_information(0, 0).cloned();
        for out in &mut ctx.outputs {
            out.retain(survives_information);
            if let Some(input) = &first_input {
                copy_default_information(out, input);
            }
        }
        self.run_handler(&node, &mut ctx, |a, c| a.request_information(c))?;
        self.store_outputs(&node, ctx.outputs);
        node.state.lock().information_time = self.tick();
        Ok(mtime)
    }

    fn validate_request(&self, node: &Node, port: usize) -> PipelineResult<()> {
        let Some(info) = node.state.lock().outputs.get(port).map(|o| o.info.clone()) else {
            return Ok(());
        };
        let (piece, pieces, _) = piece_request(&info);
        if pieces < 1 || piece < 0 || piece >= pieces {
            return Err(self.fail(
                node,
                PipelineError::InvalidPieceRequest {
                    algorithm: node.name.clone(),
                    port,
                    piece,
                    pieces,
                },
            ));
        }
        if let (Some(requested), Some(whole)) =
            (info.get(keys::UPDATE_EXTENT), info.get(keys::WHOLE_EXTENT))
        {
            if !requested.is_empty() && !whole.contains(&requested) {
                return Err(self.fail(
                    node,
                    PipelineError::ExtentOutsideWholeExtent {
                        algorithm: node.name.clone(),
                        port,
                        requested,
                        whole,
                    },
                ));
            }
        }
        Ok(())
    }

    /// Walk the upstream graph consumers-first, so every producer port sees
    /// the merged request of all its consumers before it forwards its own.
    fn update_extent_pass(
        &self,
        id: AlgorithmId,
        from_port: Option<usize>,
        sink_request: &Information,
    ) -> PipelineResult<()> {
        let mut pending: HashMap<OutputPort, Information> = HashMap::new();
        for (rank, current) in self.consumers_first(id)?.into_iter().enumerate() {
            let node = self.node(current)?;
            if rank == 0 {
                self.forward_request(&node, from_port, sink_request, &mut pending)?;
                continue;
            }
            let mut ports: Vec<OutputPort> =
                pending.keys().filter(|p| p.algorithm == current).copied().collect();
            ports.sort_unstable();
            for port in &ports {
                if let Some(request) = pending.remove(port) {
                    if let Some(out) = node.state.lock().outputs.get_mut(port.index) {
                        copy_request(&mut out.info, &request);
                    }
                }
                self.validate_request(&node, port.index)?;
            }
            for port in ports {
                self.forward_request(&node, Some(port.index), &Information::new(), &mut pending)?;
            }
        }
        Ok(())
    }

    /// `id` and everything upstream of it, each algorithm ahead of its
    /// producers.
    fn consumers_first(&self, id: AlgorithmId) -> PipelineResult<Vec<AlgorithmId>> {
        fn visit(
            pipeline: &Pipeline,
            id: AlgorithmId,
            seen: &mut HashSet<AlgorithmId>,
            order: &mut Vec<AlgorithmId>,
        ) -> PipelineResult<()> {
            if !seen.insert(id) {
                return Ok(());
            }
            let producers: Vec<OutputPort> = pipeline.node(id)?.state.lock().producers().collect();
            for p in producers {
                visit(pipeline, p.algorithm, seen, order)?;
            }
            order.push(id);
            Ok(())
        }
        let mut order = Vec::new();
        visit(self, id, &mut HashSet::new(), &mut order)?;
        order.reverse();
        Ok(order)
    }

    /// Run `RequestUpdateExtent` for one requested output and fold the input
    /// requests it produces into `pending`.
    fn forward_request(
        &self,
        node: &Node,
        from_port: Option<usize>,
        sink_request: &Information,
        pending: &mut HashMap<OutputPort, Information>,
    ) -> PipelineResult<()> {
        let mut ctx = self.context(node, RequestPass::UpdateExtent, from_port)?;
        let source = match from_port {
            Some(port) => ctx.outputs.get(port).cloned().unwrap_or_default(),
            None => sink_request.clone(),
        };
        for info in ctx.inputs.iter_mut().flatten() {
            copy_request(info, &source);
        }
        self.run_handler(node, &mut ctx, |a, c| a.request_update_extent(c))?;

        let connections = node.state.lock().connections();
        for (port, infos) in ctx.inputs.iter().enumerate() {
            for (index, info) in infos.iter().enumerate() {
                let Some(producer) = connections.get(port).and_then(|c| c.get(index)).copied()
                else {
                    continue;
                };
                log::trace!(
                    "{} input {port}:{index} -> {} output {}",
                    node.name,
                    self.node(producer.algorithm)?.name,
                    producer.index
                );
                match pending.get_mut(&producer) {
                    Some(merged) => merge_request(merged, info),
                    None => {
                        let mut request = Information::new();
                        copy_request(&mut request, info);
                        pending.insert(producer, request);
                    }
                }
            }
        }
        Ok(())
    }

    fn needs_execution(&self, node: &Node) -> PipelineResult<bool> {
        let producers: Vec<OutputPort> = {
            let st = node.state.lock();
            if st.status != ExecutionStatus::Executed || st.pipeline_mtime > st.execute_time {
                return Ok(true);
            }
            if st
                .outputs
                .iter()
                .any(|o| {
                    o.released || o.info.data_object().is_none() || !request_satisfied(&o.info)
                })
            {
                return Ok(true);
            }
            st.producers().collect()
        };
        for p in producers {
            if self.node(p.algorithm)?.state.lock().status != ExecutionStatus::Executed {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn data_pass(
        &self,
        id: AlgorithmId,
        visited: &mut HashSet<AlgorithmId>,
        consumed: &mut HashSet<OutputPort>,
    ) -> PipelineResult<()> {
        if !visited.insert(id) {
            return Ok(());
        }
        let node = self.node(id)?;
        if !self.needs_execution(&node)? {
            log::debug!("{}: cached output is current", node.name);
            return Ok(());
        }
        let producers: Vec<OutputPort> = node.state.lock().producers().collect();
        let mut upstream_aborted = false;
        for p in &producers {
            consumed.insert(*p);
            self.data_pass(p.algorithm, visited, consumed)?;
            let status = self.node(p.algorithm)?.state.lock().status;
            upstream_aborted |= status == ExecutionStatus::Aborted;
        }
        if upstream_aborted {
            self.discard(&node);
            return Ok(());
        }
        self.execute(&node)
    }

    /// Replace every output by an empty instance and mark the node aborted.
    fn discard(&self, node: &Node) {
        let mut st = node.state.lock();
        for out in &mut st.outputs {
            if let Some(empty) = empty_instance(&out.info) {
                out.info.set_data_object(empty);
            }
        }
        st.status = ExecutionStatus::Aborted;
        log::debug!("{}: upstream aborted, output discarded", node.name);
    }

    fn execute(&self, node: &Node) -> PipelineResult<()> {
        node.abort.store(false, Ordering::SeqCst);
        log::debug!("{}: {}", node.name, RequestPass::Data);
        node.fire(EventKind::Start, CallData::None);
        let mut ctx = self.context(node, RequestPass::Data, None)?;

        let is_source = ctx.number_of_input_ports() == 0;
        let mut translations: Vec<Option<Translation>> = vec![None; ctx.outputs.len()];
        let mut skip = false;
        for (port, out) in ctx.outputs.iter_mut().enumerate() {
            out.remove(keys::ALL_PIECES_EXTENT);
            let (piece, pieces, ghosts) = piece_request(out);
            if pieces <= 1 {
                continue;
            }
            if out.flag(keys::CAN_PRODUCE_SUB_EXTENT) {
                if let (Some(whole), Some(all)) =
                    (out.get(keys::WHOLE_EXTENT), requested_extent(out))
                {
                    let owned = piece_extent(&all, piece, pieces, self.config.split_mode);
                    let data = owned.dilate(ghosts, &whole);
                    log::trace!("{}: piece {piece}/{pieces} of {all} -> {data}", node.name);
                    out.set(keys::ALL_PIECES_EXTENT, all);
                    out.set(keys::UPDATE_EXTENT, data);
                    translations[port] = Some(Translation { all, owned });
                }
            } else if is_source && piece > 0 && !out.flag(keys::CAN_HANDLE_PIECE_REQUEST) {
                log::debug!("{}: piece {piece} of {pieces} is empty for this source", node.name);
                skip = true;
            }
        }

        for out in &mut ctx.outputs {
            if let Some(fresh) = empty_instance(out) {
                out.set_data_object(fresh);
            }
        }
        if !skip {
            ctx.update_progress(0.0);
            self.run_handler(node, &mut ctx, |a, c| a.request_data(c))?;
        }

        if node.abort.load(Ordering::SeqCst) {
            for (out, t) in ctx.outputs.iter_mut().zip(&translations) {
                if let Some(empty) = empty_instance(out) {
                    out.set_data_object(empty);
                }
                if let Some(t) = t {
                    out.set(keys::UPDATE_EXTENT, t.all);
                }
            }
            let outputs = std::mem::take(&mut ctx.outputs);
            self.store_outputs(node, outputs);
            node.state.lock().status = ExecutionStatus::Aborted;
            log::debug!("{}: execution aborted", node.name);
            node.fire(EventKind::End, CallData::None);
            return Ok(());
        }

        for (port, (out, t)) in ctx.outputs.iter_mut().zip(&translations).enumerate() {
            if let Some(t) = t {
                if let Some(data) = out.data_object_mut() {
                    data.tag_ghosts(&t.owned, &t.all).map_err(|e| {
                        self.fail(
                            node,
                            PipelineError::request_failed(
                                node.name.clone(),
                                RequestPass::Data,
                                format!("ghost tagging of output {port} failed: {e}"),
                            ),
                        )
                    })?;
                }
                out.set(keys::UPDATE_EXTENT, t.all);
            }
            let (piece, pieces, ghosts) = piece_request(out);
            match out.data_object().and_then(|d| d.extent()) {
                Some(extent) => out.set(keys::DATA_EXTENT, extent),
                None => {
                    out.remove(keys::DATA_EXTENT);
                }
            }
            out.set(keys::DATA_PIECE_NUMBER, piece);
            out.set(keys::DATA_NUMBER_OF_PIECES, pieces);
            out.set(keys::DATA_NUMBER_OF_GHOST_LEVELS, ghosts);
            match out.get(keys::UPDATE_TIME_STEP) {
                Some(t) => out.set(keys::DATA_TIME_STEP, t),
                None => {
                    out.remove(keys::DATA_TIME_STEP);
                }
            }
            if let Some(Err(e)) = out.data_object().map(|d| d.check_consistency()) {
                return Err(self.fail(
                    node,
                    PipelineError::request_failed(
                        node.name.clone(),
                        RequestPass::Data,
                        format!("output {port} is invalid: {e}"),
                    ),
                ));
            }
        }

        let outputs = std::mem::take(&mut ctx.outputs);
        {
            let now = self.tick();
            let mut st = node.state.lock();
            for (slot, info) in st.outputs.iter_mut().zip(outputs) {
                slot.info = info;
                slot.released = false;
            }
            st.execute_time = now;
            st.status = ExecutionStatus::Executed;
            st.executed_once = true;
        }
        ctx.update_progress(1.0);
        node.fire(EventKind::End, CallData::None);
        Ok(())
    }

    /// Empty the flagged outputs whose consumers ran in this update.
    fn release_consumed(&self, consumed: &HashSet<OutputPort>) {
        for port in consumed {
            let Ok(node) = self.node(port.algorithm) else {
                continue;
            };
            let mut st = node.state.lock();
            let Some(out) = st.outputs.get_mut(port.index) else {
                continue;
            };
            if !out.release || out.released {
                continue;
            }
            if let Some(empty) = empty_instance(&out.info) {
                out.info.set_data_object(empty);
            }
            out.released = true;
            log::debug!("{}: released output {}", node.name, port.index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn executed(extent: Extent) -> Information {
        let mut info = Information::new();
        info.set(keys::DATA_EXTENT, extent);
        info.set(keys::DATA_PIECE_NUMBER, 0);
        info.set(keys::DATA_NUMBER_OF_PIECES, 1);
        info.set(keys::DATA_NUMBER_OF_GHOST_LEVELS, 0);
        UpdateRequest::default().apply(&mut info);
        info
    }

    #[test]
    fn sub_extents_of_cached_data_are_satisfied() {
        let mut info = executed(Extent::new(0, 9, 0, 9, 0, 0));
        assert!(request_satisfied(&info));
        info.set(keys::UPDATE_EXTENT, Extent::new(2, 4, 0, 9, 0, 0));
        assert!(request_satisfied(&info));
        info.set(keys::UPDATE_EXTENT, Extent::new(2, 12, 0, 9, 0, 0));
        assert!(!request_satisfied(&info));
    }

    #[test]
    fn piece_and_ghost_changes_invalidate() {
        let mut info = executed(Extent::new(0, 9, 0, 9, 0, 0));
        info.set(keys::UPDATE_NUMBER_OF_PIECES, 2);
        assert!(!request_satisfied(&info));
        let mut info = executed(Extent::new(0, 9, 0, 9, 0, 0));
        info.set(keys::UPDATE_NUMBER_OF_GHOST_LEVELS, 1);
        assert!(!request_satisfied(&info));
    }

    #[test]
    fn time_matters_only_for_temporal_sources() {
        let mut info = executed(Extent::new(0, 1, 0, 1, 0, 0));
        info.set(keys::UPDATE_TIME_STEP, 0.5);
        assert!(request_satisfied(&info));
        info.set(keys::TIME_STEPS, vec![0.0, 0.5]);
        assert!(!request_satisfied(&info));
        info.set(keys::DATA_TIME_STEP, 0.5);
        assert!(request_satisfied(&info));
    }

    fn requested(extent: Option<Extent>, piece: i32, pieces: i32, ghosts: i32) -> Information {
        let mut info = Information::new();
        UpdateRequest {
            extent,
            piece,
            pieces,
            ghost_levels: ghosts,
            time: None,
        }
        .apply(&mut info);
        info
    }

    #[test]
    fn merged_requests_cover_every_consumer() {
        let mut merged = requested(Some(Extent::new(0, 3, 0, 3, 0, 3)), 0, 1, 0);
        merge_request(&mut merged, &requested(Some(Extent::new(2, 7, 1, 2, 0, 3)), 0, 1, 1));
        assert_eq!(merged.get(keys::UPDATE_EXTENT), Some(Extent::new(0, 7, 0, 3, 0, 3)));
        assert_eq!(merged.get(keys::UPDATE_NUMBER_OF_GHOST_LEVELS), Some(1));

        merge_request(&mut merged, &requested(None, 0, 1, 0));
        assert!(!merged.has(keys::UPDATE_EXTENT));
    }

    #[test]
    fn differing_pieces_merge_to_the_whole() {
        let mut merged = requested(None, 1, 4, 0);
        merge_request(&mut merged, &requested(None, 1, 4, 2));
        assert_eq!(piece_request(&merged), (1, 4, 2));
        merge_request(&mut merged, &requested(None, 0, 2, 0));
        assert_eq!(piece_request(&merged), (0, 1, 2));
    }

    #[test]
    fn pass_names() {
        assert_eq!(RequestPass::UpdateExtent.to_string(), "REQUEST_UPDATE_EXTENT");
        assert!(RequestPass::Data.request(Some(1)).has(keys::REQUEST_DATA));
    }
}
