pub mod diagnostics;
pub mod health;
pub mod location;
pub mod session;

pub use diagnostics::*;
pub use health::*;
pub use location::*;
pub use session::*;
