use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use taskhub::models::{NewTask, NewUser, Role, Task, TaskStatus, User};
use taskhub::services::AuthService;
use taskhub::state::AppState;
use taskhub::store::{TaskStore, UserStore};

/// Authentication info for tests
#[allow(dead_code)]
pub struct TestAuth {
    pub user_id: Uuid,
    pub email: String,
    pub token: String,
}

impl TestAuth {
    /// Get the Authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Factory for creating test data
pub struct Factory<'a> {
    state: &'a AppState,
}

#[allow(dead_code)]
impl<'a> Factory<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    async fn create_with_role(&self, role: Role) -> TestAuth {
        let unique_id = Uuid::new_v4();
        let email = format!("test-{}@example.com", unique_id);
        let password_hash = AuthService::hash_password("TestPassword123!").unwrap();

        let user = self
            .state
            .users
            .create(NewUser {
                name: format!("Test User {}", unique_id),
                email: email.clone(),
                password_hash,
                role,
            })
            .await
            .unwrap();

        let token = AuthService::generate_token(&user, &self.state.config).unwrap();

        TestAuth {
            user_id: user.id,
            email,
            token,
        }
    }

    /// Create a regular user and return auth info
    pub async fn create_user(&self) -> TestAuth {
        self.create_with_role(Role::User).await
    }

    /// Create an admin and return auth info
    pub async fn create_admin(&self) -> TestAuth {
        self.create_with_role(Role::Admin).await
    }

    /// Create a user with a specific email and password
    pub async fn create_user_with_email(&self, email: &str, password: &str) -> User {
        let password_hash = AuthService::hash_password(password).unwrap();
        self.state
            .users
            .create(NewUser {
                name: "Test User".to_string(),
                email: email.to_string(),
                password_hash,
                role: Role::User,
            })
            .await
            .unwrap()
    }

    /// Create a pending task, optionally assigned
    pub async fn create_task(&self, user_id: Option<Uuid>) -> Task {
        self.state
            .tasks
            .create(NewTask {
                title: format!("Test Task {}", Uuid::new_v4()),
                description: Some("Test task description".to_string()),
                status: TaskStatus::Pending,
                deadline: None,
                user_id,
            })
            .await
            .unwrap()
    }

    /// Put a task in progress with a start time `seconds_ago` in the past,
    /// so completing it over the API yields a deterministic time spent.
    pub async fn start_task_backdated(&self, task_id: Uuid, seconds_ago: i64) -> Task {
        let at = OffsetDateTime::now_utc() - Duration::seconds(seconds_ago);
        self.state.tasks.start(task_id, at).await.unwrap().unwrap()
    }
}
