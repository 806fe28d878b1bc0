pub mod toml_loader;

pub use toml_loader::{load_quiz_file, load_skeleton_file, TaskSkeleton};
