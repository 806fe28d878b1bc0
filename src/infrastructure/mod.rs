pub mod backend;
pub mod http_backend;
pub mod local_store;
pub mod session_url;

pub use backend::AnnotationBackend;
pub use http_backend::HttpBackend;
pub use local_store::LocalStore;
pub use session_url::SessionUrl;
