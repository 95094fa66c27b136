pub mod config;
pub mod error;
pub mod identity;
pub mod module;
pub mod types;

pub use config::ServiceConfig;
pub use error::ServiceError;
pub use identity::{Caller, EmptyDirectory, Role, StaticDirectory, UserDirectory};
pub use module::Module;
pub use types::{ListResult, new_id, now_millis};
