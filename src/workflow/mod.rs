pub mod controller;
pub mod form;

pub use controller::{
    ActiveTask, HandOff, LoadTicket, MeshView, SessionOptions, SubmitReport, Termination,
    TerminationReason, WorkflowController, WorkflowState,
};
pub use form::AnnotationForm;
