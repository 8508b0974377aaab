//! Observer/event system.
//!
//! A [`Subject`] owns an [`ObserverRegistry`] and dispatches events to the
//! observers registered for them. Observers run in descending priority
//! order, ties in registration order. Each observer may declare the
//! [`CallDataType`] it wants; the payload is coerced before delivery and
//! becomes [`CallData::None`] when no conversion exists.
//!
//! Registering or removing observers on a subject while it dispatches an
//! event is rejected with
//! [`PipelineError::ObserverRegistrationDuringDispatch`].

use std::any::Any;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use num_traits::NumCast;
use parking_lot::Mutex;

use crate::pipeline_error::{ErrorKind, PipelineError, PipelineResult};

/// Event identifiers.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum EventKind {
    /// Matches every event when used for registration.
    Any,
    Start,
    End,
    Progress,
    Error,
    Warning,
    AbortCheck,
    Modified,
    StartInteraction,
    Interaction,
    EndInteraction,
    EndPick,
    /// Collaborator-defined event.
    Custom(String),
}

impl EventKind {
    pub fn name(&self) -> &str {
        match self {
            EventKind::Any => "AnyEvent",
            EventKind::Start => "StartEvent",
            EventKind::End => "EndEvent",
            EventKind::Progress => "ProgressEvent",
            EventKind::Error => "ErrorEvent",
            EventKind::Warning => "WarningEvent",
            EventKind::AbortCheck => "AbortCheckEvent",
            EventKind::Modified => "ModifiedEvent",
            EventKind::StartInteraction => "StartInteractionEvent",
            EventKind::Interaction => "InteractionEvent",
            EventKind::EndInteraction => "EndInteractionEvent",
            EventKind::EndPick => "EndPickEvent",
            EventKind::Custom(name) => name,
        }
    }

    /// Whether an observer registered for `self` receives `fired`.
    pub fn matches(&self, fired: &EventKind) -> bool {
        matches!(self, EventKind::Any) || self == fired
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EventKind {
    type Err = std::convert::Infallible;

    /// Unknown names become [`EventKind::Custom`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "AnyEvent" => EventKind::Any,
            "StartEvent" => EventKind::Start,
            "EndEvent" => EventKind::End,
            "ProgressEvent" => EventKind::Progress,
            "ErrorEvent" => EventKind::Error,
            "WarningEvent" => EventKind::Warning,
            "AbortCheckEvent" => EventKind::AbortCheck,
            "ModifiedEvent" => EventKind::Modified,
            "StartInteractionEvent" => EventKind::StartInteraction,
            "InteractionEvent" => EventKind::Interaction,
            "EndInteractionEvent" => EventKind::EndInteraction,
            "EndPickEvent" => EventKind::EndPick,
            other => EventKind::Custom(other.to_owned()),
        })
    }
}

/// Payload type an observer asks for.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum CallDataType {
    /// Deliver the payload as sent.
    #[default]
    Any,
    None,
    String,
    Object,
    Int,
    Long,
    Double,
    Float,
}

/// Payload of an `ErrorEvent`.
#[derive(Clone, Debug, PartialEq)]
pub struct ErrorPayload {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&PipelineError> for ErrorPayload {
    fn from(e: &PipelineError) -> Self {
        Self {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

/// Event payload.
#[derive(Clone)]
pub enum CallData {
    None,
    String(String),
    Int(i32),
    Long(i64),
    Double(f64),
    Float(f32),
    Object(Arc<dyn Any + Send + Sync>),
    Error(ErrorPayload),
}

impl fmt::Debug for CallData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallData::None => f.write_str("None"),
            CallData::String(s) => f.debug_tuple("String").field(s).finish(),
            CallData::Int(v) => f.debug_tuple("Int").field(v).finish(),
            CallData::Long(v) => f.debug_tuple("Long").field(v).finish(),
            CallData::Double(v) => f.debug_tuple("Double").field(v).finish(),
            CallData::Float(v) => f.debug_tuple("Float").field(v).finish(),
            CallData::Object(_) => f.write_str("Object(..)"),
            CallData::Error(p) => f.debug_tuple("Error").field(p).finish(),
        }
    }
}

impl CallData {
    pub fn is_none(&self) -> bool {
        matches!(self, CallData::None)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CallData::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CallData::Double(v) => Some(*v),
            CallData::Float(v) => Some(*v as f64),
            CallData::Int(v) => Some(*v as f64),
            CallData::Long(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&ErrorPayload> {
        match self {
            CallData::Error(p) => Some(p),
            _ => None,
        }
    }

    /// Downcast an object payload.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match self {
            CallData::Object(obj) => obj.clone().downcast::<T>().ok(),
            _ => None,
        }
    }

    fn numeric<T: NumCast>(&self) -> Option<T> {
        match self {
            CallData::Int(v) => <T as NumCast>::from(*v),
            CallData::Long(v) => <T as NumCast>::from(*v),
            CallData::Double(v) => <T as NumCast>::from(*v),
            CallData::Float(v) => <T as NumCast>::from(*v),
            CallData::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(|v| <T as NumCast>::from(v)),
            _ => None,
        }
    }

    /// Convert to the representation an observer declared.
    pub fn coerce(&self, ty: CallDataType) -> CallData {
        let converted = match ty {
            CallDataType::Any => Some(self.clone()),
            CallDataType::None => None,
            CallDataType::String => match self {
                CallData::String(s) => Some(CallData::String(s.clone())),
                CallData::Int(v) => Some(CallData::String(v.to_string())),
                CallData::Long(v) => Some(CallData::String(v.to_string())),
                CallData::Double(v) => Some(CallData::String(v.to_string())),
                CallData::Float(v) => Some(CallData::String(v.to_string())),
                CallData::Error(p) => Some(CallData::String(p.message.clone())),
                CallData::None | CallData::Object(_) => None,
            },
            CallDataType::Object => match self {
                CallData::Object(obj) => Some(CallData::Object(obj.clone())),
                _ => None,
            },
            CallDataType::Int => self.numeric().map(CallData::Int),
            CallDataType::Long => self.numeric().map(CallData::Long),
            CallDataType::Double => self.numeric().map(CallData::Double),
            CallDataType::Float => self.numeric().map(CallData::Float),
        };
        converted.unwrap_or(CallData::None)
    }
}

/// Stable handle returned by observer registration.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ObserverTag(pub u64);

/// Callback invoked on a matching event.
pub trait Observer: Send + Sync {
    fn execute(&self, ctx: &mut EventContext);
}

impl<F> Observer for F
where
    F: Fn(&mut EventContext) + Send + Sync,
{
    fn execute(&self, ctx: &mut EventContext) {
        self(ctx)
    }
}

/// What an observer sees of one event instance.
pub struct EventContext {
    event: EventKind,
    call_data: CallData,
    sender: String,
    tag: ObserverTag,
    stop: bool,
    abort: Option<Arc<AtomicBool>>,
}

impl EventContext {
    pub fn event(&self) -> &EventKind {
        &self.event
    }

    /// Payload, already coerced to the declared [`CallDataType`].
    pub fn call_data(&self) -> &CallData {
        &self.call_data
    }

    /// Name of the object that fired the event.
    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn tag(&self) -> ObserverTag {
        self.tag
    }

    /// Skip the remaining observers for this event instance.
    pub fn stop_propagation(&mut self) {
        self.stop = true;
    }

    /// Ask the sending algorithm to abandon its current execution.
    ///
    /// Returns `false` when the sender has no abort flag.
    pub fn abort_execute(&mut self) -> bool {
        match &self.abort {
            Some(flag) => {
                flag.store(true, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }
}

struct Entry {
    tag: ObserverTag,
    event: EventKind,
    priority: f32,
    data_type: CallDataType,
    observer: Arc<dyn Observer>,
}

/// Observers of one subject, kept in dispatch order.
#[derive(Default)]
pub struct ObserverRegistry {
    entries: Vec<Entry>,
    next_tag: u64,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert after every observer of higher or equal priority. Priorities
    /// are compared with `f32::total_cmp`, so a NaN priority sorts above
    /// every number instead of breaking the order.
    pub fn add(
        &mut self,
        event: EventKind,
        priority: f32,
        data_type: CallDataType,
        observer: Arc<dyn Observer>,
    ) -> ObserverTag {
        let tag = ObserverTag(self.next_tag);
        self.next_tag += 1;
        let at = self
            .entries
            .partition_point(|e| e.priority.total_cmp(&priority).is_ge());
        self.entries.insert(
            at,
            Entry {
                tag,
                event,
                priority,
                data_type,
                observer,
            },
        );
        tag
    }

    pub fn remove(&mut self, tag: ObserverTag) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.tag != tag);
        self.entries.len() != before
    }

    pub fn has_observer(&self, event: &EventKind) -> bool {
        self.entries.iter().any(|e| e.event.matches(event))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn matching(&self, event: &EventKind) -> Vec<(ObserverTag, CallDataType, Arc<dyn Observer>)> {
        self.entries
            .iter()
            .filter(|e| e.event.matches(event))
            .map(|e| (e.tag, e.data_type, e.observer.clone()))
            .collect()
    }
}

impl fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| (e.tag, e.event.name(), e.priority)))
            .finish()
    }
}

struct DispatchGuard<'a>(&'a AtomicUsize);

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Anything that fires events: algorithms, render windows, interactors.
#[derive(Debug)]
pub struct Subject {
    owner: String,
    registry: Mutex<ObserverRegistry>,
    dispatching: AtomicUsize,
}

impl Subject {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            registry: Mutex::new(ObserverRegistry::new()),
            dispatching: AtomicUsize::new(0),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    fn check_idle(&self) -> PipelineResult<()> {
        if self.dispatching.load(Ordering::SeqCst) > 0 {
            return Err(PipelineError::ObserverRegistrationDuringDispatch(
                self.owner.clone(),
            ));
        }
        Ok(())
    }

    pub fn add_observer(
        &self,
        event: EventKind,
        priority: f32,
        data_type: CallDataType,
        observer: Arc<dyn Observer>,
    ) -> PipelineResult<ObserverTag> {
        self.check_idle()?;
        Ok(self.registry.lock().add(event, priority, data_type, observer))
    }

    /// Remove by tag; unknown tags are ignored and reported as `false`.
    pub fn remove_observer(&self, tag: ObserverTag) -> PipelineResult<bool> {
        self.check_idle()?;
        Ok(self.registry.lock().remove(tag))
    }

    pub fn has_observer(&self, event: &EventKind) -> bool {
        self.registry.lock().has_observer(event)
    }

    pub fn number_of_observers(&self) -> usize {
        self.registry.lock().len()
    }

    /// Deliver `event` to every matching observer.
    ///
    /// Returns `true` when an observer stopped propagation. The registry
    /// lock is not held while observers run, so they may fire further
    /// events on this or any other subject.
    pub fn invoke(
        &self,
        event: &EventKind,
        data: &CallData,
        abort: Option<&Arc<AtomicBool>>,
    ) -> bool {
        let observers = self.registry.lock().matching(event);
        if observers.is_empty() {
            return false;
        }
        self.dispatching.fetch_add(1, Ordering::SeqCst);
        let _guard = DispatchGuard(&self.dispatching);
        for (tag, data_type, observer) in observers {
            let mut ctx = EventContext {
                event: event.clone(),
                call_data: data.coerce(data_type),
                sender: self.owner.clone(),
                tag,
                stop: false,
                abort: abort.cloned(),
            };
            observer.execute(&mut ctx);
            if ctx.stop {
                log::trace!("{} on {} stopped by observer {:?}", event, self.owner, tag);
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder(log: &Arc<Mutex<Vec<i32>>>, id: i32) -> Arc<dyn Observer> {
        let log = log.clone();
        Arc::new(move |_: &mut EventContext| log.lock().push(id))
    }

    #[test]
    fn priority_then_insertion_order() {
        let subject = Subject::new("src");
        let log = Arc::new(Mutex::new(Vec::new()));
        for (i, p) in [(0, 0.0), (1, 1.0), (2, -1.0), (3, 0.0)] {
            subject
                .add_observer(EventKind::Start, p, CallDataType::Any, recorder(&log, i))
                .unwrap();
        }
        subject.invoke(&EventKind::Start, &CallData::None, None);
        assert_eq!(*log.lock(), vec![1, 0, 3, 2]);
    }

    #[test]
    fn nan_priority_keeps_the_order_total() {
        let subject = Subject::new("src");
        let log = Arc::new(Mutex::new(Vec::new()));
        for (i, p) in [(0, 0.0), (1, f32::NAN), (2, 1.0), (3, -1.0)] {
            subject
                .add_observer(EventKind::Start, p, CallDataType::Any, recorder(&log, i))
                .unwrap();
        }
        subject.invoke(&EventKind::Start, &CallData::None, None);
        assert_eq!(*log.lock(), vec![1, 2, 0, 3]);
    }

    #[test]
    fn stop_propagation_is_per_instance() {
        let subject = Subject::new("src");
        let log = Arc::new(Mutex::new(Vec::new()));
        subject
            .add_observer(
                EventKind::End,
                1.0,
                CallDataType::Any,
                Arc::new(|ctx: &mut EventContext| ctx.stop_propagation()),
            )
            .unwrap();
        subject
            .add_observer(EventKind::End, 0.0, CallDataType::Any, recorder(&log, 7))
            .unwrap();
        assert!(subject.invoke(&EventKind::End, &CallData::None, None));
        assert!(subject.invoke(&EventKind::End, &CallData::None, None));
        assert!(log.lock().is_empty());
        assert!(!subject.invoke(&EventKind::Start, &CallData::None, None));
    }

    #[test]
    fn any_matches_everything() {
        let subject = Subject::new("src");
        let log = Arc::new(Mutex::new(Vec::new()));
        let tag = subject
            .add_observer(EventKind::Any, 0.0, CallDataType::Any, recorder(&log, 1))
            .unwrap();
        subject.invoke(&EventKind::Modified, &CallData::None, None);
        subject.invoke(&"UserEvent".parse().unwrap(), &CallData::None, None);
        assert_eq!(log.lock().len(), 2);
        assert!(subject.remove_observer(tag).unwrap());
        assert!(!subject.remove_observer(tag).unwrap());
    }

    #[test]
    fn payload_is_coerced() {
        assert!(matches!(
            CallData::Double(0.75).coerce(CallDataType::Float),
            CallData::Float(v) if v == 0.75
        ));
        assert!(matches!(
            CallData::String("42".into()).coerce(CallDataType::Int),
            CallData::Int(42)
        ));
        assert!(CallData::String("x".into()).coerce(CallDataType::Long).is_none());
        assert!(CallData::Int(3).coerce(CallDataType::None).is_none());
        assert_eq!(CallData::Int(3).coerce(CallDataType::String).as_str(), Some("3"));
        let obj = CallData::Object(Arc::new(5u8));
        assert_eq!(obj.coerce(CallDataType::Object).downcast::<u8>().as_deref(), Some(&5));
        assert!(obj.coerce(CallDataType::Double).is_none());
    }

    #[test]
    fn registration_during_dispatch_is_rejected() {
        let subject = Arc::new(Subject::new("src"));
        let result = Arc::new(Mutex::new(None));
        let (s, r) = (Arc::downgrade(&subject), result.clone());
        subject
            .add_observer(
                EventKind::Start,
                0.0,
                CallDataType::Any,
                Arc::new(move |_: &mut EventContext| {
                    if let Some(s) = s.upgrade() {
                        let noop: Arc<dyn Observer> = Arc::new(|_: &mut EventContext| {});
                        let attempt = s.add_observer(EventKind::End, 0.0, CallDataType::Any, noop);
                        *r.lock() = Some(attempt);
                    }
                }),
            )
            .unwrap();
        subject.invoke(&EventKind::Start, &CallData::None, None);
        assert!(matches!(
            result.lock().take(),
            Some(Err(PipelineError::ObserverRegistrationDuringDispatch(_)))
        ));
        assert_eq!(subject.number_of_observers(), 1);
    }

    #[test]
    fn observers_can_raise_the_abort_flag() {
        let subject = Subject::new("src");
        let flag = Arc::new(AtomicBool::new(false));
        subject
            .add_observer(
                EventKind::AbortCheck,
                0.0,
                CallDataType::Any,
                Arc::new(|ctx: &mut EventContext| {
                    ctx.abort_execute();
                }),
            )
            .unwrap();
        subject.invoke(&EventKind::AbortCheck, &CallData::None, Some(&flag));
        assert!(flag.load(Ordering::SeqCst));
    }
}
