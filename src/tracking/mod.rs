pub mod lifecycle;
pub mod registry;
pub mod router;
pub mod store;
pub mod validator;
