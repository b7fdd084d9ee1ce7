pub mod authz;
pub mod errors;
pub mod signed_request;

pub use authz::{AuthzCache, GrantEntry};
pub use errors::ExecutorError;
