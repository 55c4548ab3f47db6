pub mod booking;
pub mod diagnostics;
pub mod error;
pub mod health;
pub mod messages;
pub mod role;
pub mod session;
pub mod user;

pub use booking::*;
pub use diagnostics::*;
pub use error::*;
pub use health::*;
pub use messages::*;
pub use role::*;
pub use session::*;
pub use user::*;
