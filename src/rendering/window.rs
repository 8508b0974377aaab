//! Render window and interactor.
//!
//! Both are event sources outside the pipeline graph. The window pulls its
//! mappers on `render`; the interactor only posts interaction events, which
//! user callbacks typically turn into parameter changes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::event::{CallData, CallDataType, EventContext, EventKind, ObserverTag, Subject};
use crate::pipeline::{AlgorithmId, Pipeline};
use crate::pipeline_error::PipelineResult;

/// How a call to [`RenderWindow::render`] ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RenderOutcome {
    Completed,
    /// An `AbortCheckEvent` observer raised the abort flag.
    Aborted,
}

#[derive(Debug)]
pub struct RenderWindow {
    subject: Arc<Subject>,
    abort: Arc<AtomicBool>,
    mappers: Vec<AlgorithmId>,
    frames: u64,
}

impl RenderWindow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            subject: Arc::new(Subject::new(name)),
            abort: Arc::new(AtomicBool::new(false)),
            mappers: Vec::new(),
            frames: 0,
        }
    }

    pub fn add_observer<F>(
        &self,
        event: EventKind,
        priority: f32,
        callback: F,
    ) -> PipelineResult<ObserverTag>
    where
        F: Fn(&mut EventContext) + Send + Sync + 'static,
    {
        self.subject
            .add_observer(event, priority, CallDataType::Any, Arc::new(callback))
    }

    pub fn remove_observer(&self, tag: ObserverTag) -> PipelineResult<bool> {
        self.subject.remove_observer(tag)
    }

    pub fn add_mapper(&mut self, mapper: AlgorithmId) {
        self.mappers.push(mapper);
    }

    pub fn mappers(&self) -> &[AlgorithmId] {
        &self.mappers
    }

    /// Completed frames.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn set_abort_render(&self, abort: bool) {
        self.abort.store(abort, Ordering::SeqCst);
    }

    fn fire(&self, event: EventKind) {
        self.subject.invoke(&event, &CallData::None, Some(&self.abort));
    }

    /// Update every mapper in order. `AbortCheckEvent` fires before each
    /// mapper; a raised abort flag ends the frame early.
    pub fn render(&mut self, pipeline: &Pipeline) -> PipelineResult<RenderOutcome> {
        self.abort.store(false, Ordering::SeqCst);
        self.fire(EventKind::Start);
        for &mapper in &self.mappers {
            self.fire(EventKind::AbortCheck);
            if self.abort.load(Ordering::SeqCst) {
                log::debug!("{}: render aborted before {}", self.subject.owner(), mapper);
                self.fire(EventKind::End);
                return Ok(RenderOutcome::Aborted);
            }
            pipeline.update(mapper)?;
        }
        self.frames += 1;
        self.fire(EventKind::End);
        Ok(RenderOutcome::Completed)
    }
}

/// Source of interaction and pick events.
#[derive(Debug)]
pub struct Interactor {
    subject: Arc<Subject>,
    interacting: bool,
}

impl Interactor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            subject: Arc::new(Subject::new(name)),
            interacting: false,
        }
    }

    pub fn add_observer<F>(
        &self,
        event: EventKind,
        priority: f32,
        data_type: CallDataType,
        callback: F,
    ) -> PipelineResult<ObserverTag>
    where
        F: Fn(&mut EventContext) + Send + Sync + 'static,
    {
        self.subject
            .add_observer(event, priority, data_type, Arc::new(callback))
    }

    pub fn remove_observer(&self, tag: ObserverTag) -> PipelineResult<bool> {
        self.subject.remove_observer(tag)
    }

    pub fn is_interacting(&self) -> bool {
        self.interacting
    }

    pub fn start_interaction(&mut self) {
        self.interacting = true;
        self.subject
            .invoke(&EventKind::StartInteraction, &CallData::None, None);
    }

    /// Post one `InteractionEvent`; returns `true` when an observer stopped it.
    pub fn interact(&self, data: CallData) -> bool {
        self.subject.invoke(&EventKind::Interaction, &data, None)
    }

    pub fn end_interaction(&mut self) {
        self.interacting = false;
        self.subject
            .invoke(&EventKind::EndInteraction, &CallData::None, None);
    }

    /// Post `EndPickEvent` carrying the picked world position.
    pub fn pick(&self, position: [f64; 3]) -> bool {
        self.subject
            .invoke(&EventKind::EndPick, &CallData::Object(Arc::new(position)), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn interaction_events_reach_observers_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut iren = Interactor::new("Interactor");
        let log = seen.clone();
        iren.add_observer(EventKind::Any, 0.0, CallDataType::Any, move |ctx| {
            log.lock().push(ctx.event().name().to_owned());
        })
        .unwrap();
        iren.start_interaction();
        assert!(iren.is_interacting());
        iren.interact(CallData::Int(3));
        iren.end_interaction();
        assert_eq!(
            *seen.lock(),
            vec!["StartInteractionEvent", "InteractionEvent", "EndInteractionEvent"]
        );
    }

    #[test]
    fn pick_payload_downcasts() {
        let iren = Interactor::new("Interactor");
        let picked = Arc::new(Mutex::new(None));
        let slot = picked.clone();
        iren.add_observer(EventKind::EndPick, 0.0, CallDataType::Object, move |ctx| {
            *slot.lock() = ctx.call_data().downcast::<[f64; 3]>().map(|p| *p);
        })
        .unwrap();
        iren.pick([1.0, 2.0, 3.0]);
        assert_eq!(*picked.lock(), Some([1.0, 2.0, 3.0]));
    }

    #[test]
    fn empty_window_renders_a_frame() {
        let pipeline = Pipeline::new();
        let mut window = RenderWindow::new("RenderWindow");
        assert_eq!(window.render(&pipeline).unwrap(), RenderOutcome::Completed);
        assert_eq!(window.frames(), 1);
    }
}
