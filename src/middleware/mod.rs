pub mod access;
pub mod auth;
pub mod security;

pub use access::{authorize, ensure, Action, Decision, Target};
pub use auth::RequestContext;
