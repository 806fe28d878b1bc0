pub mod geometry;
pub mod quiz_gate;
pub mod schedule_codec;
pub mod submission;
pub mod task_source;

pub use geometry::{Geometry, GeometryBuilder};
pub use quiz_gate::{QuizFeedback, QuizGate, QuizPhase, QuizState};
pub use schedule_codec::ScheduleCodec;
pub use submission::SubmissionClient;
pub use task_source::{NextTask, TaskSource};
