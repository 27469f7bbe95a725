//! Request handlers.

pub mod applications;
pub mod companies;
pub mod health;
pub mod jobs;
pub mod users;

pub use applications::*;
pub use companies::*;
pub use health::*;
pub use jobs::*;
pub use users::*;
