pub mod loaders;
pub mod mesh;
pub mod quiz;
pub mod schedule;
pub mod task;

pub use loaders::{load_quiz_file, load_skeleton_file, TaskSkeleton};
pub use mesh::{MeshPayload, MeshSource};
pub use quiz::{QuizAnswer, QuizFile, QuizQuestion};
pub use schedule::Schedule;
pub use task::{AnnotationRecord, AnnotationTask};
