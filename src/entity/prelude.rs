pub use super::task::Entity as TaskEntity;
pub use super::user::Entity as UserEntity;
