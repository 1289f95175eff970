//! Session Lifecycle
//!
//! The single active photo session, the controller that moves it through
//! capture, selection and finalize, and the events emitted along the way.

pub mod controller;
pub mod events;
pub mod layout;
pub mod model;

pub use controller::{CaptureOutcome, Clock, Composite, SessionController};
pub use events::{EventBus, SessionEvent, SubscriberId, Subscription};
pub use layout::{Layout, Limits, Orientation};
pub use model::{Frame, Session, SessionPhase, SessionStatus};
