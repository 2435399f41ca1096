pub mod auth;
pub mod common;
pub mod tasks;
pub mod users;

pub use auth::{login, me, register, AuthResponse, LoginRequest, RegisterRequest};
pub use common::{
    created, health, ok, ok_list, route_fallback, validate_email, validate_optional,
    validate_required, ApiBody, ListMeta,
};
pub use tasks::{
    approve_task, complete_task, create_task, delete_task, get_task, list_tasks, reject_task,
    start_task, update_task, CreateTaskRequest, DeletedTask, TaskResponse, UpdateTaskRequest,
};
pub use users::{delete_user, list_users, update_user, DeletedUser, UpdateUserRequest};
