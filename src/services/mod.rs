pub mod auth;
pub mod identity;
pub mod tasks;

pub use auth::{AuthService, Claims};
pub use identity::IdentityService;
pub use tasks::TaskService;
