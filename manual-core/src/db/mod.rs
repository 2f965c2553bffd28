use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

mod data;
pub use data::*;

mod memory;
pub use memory::*;

mod pg;
pub use pg::*;

pub type Result<T> = std::result::Result<T, DatabaseError>;
pub type BoxedDatabase = Arc<dyn Database>;

#[derive(Debug, Error)]
pub enum DatabaseError {
    /// An unknown or internal error happened with the database
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),
    /// A resource already exists
    #[error("{resource} with {field} of value {value} already exists")]
    Conflict {
        /// The resource in question
        resource: &'static str,
        /// The field that is conflicting
        field: &'static str,
        /// The conflicting value
        value: String,
    },
    /// A resource in the database doesn't exist
    #[error("{resource}:{identifier} doesn't exist")]
    NotFound {
        resource: &'static str,
        identifier: &'static str,
    },
}

/// Helper trait to reduce boilerplate
pub trait IntoDatabaseError {
    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError;
    fn any(self) -> DatabaseError;
}

/// Helper trait to reduce boilerplate
pub trait DatabaseResult {
    /// Turns the Result into a conflict error if it's Ok()
    fn conflict_or_ok(self, resource: &'static str, field: &'static str, value: &str)
        -> Result<()>;
}

impl<T> DatabaseResult for Result<T> {
    fn conflict_or_ok(
        self,
        resource: &'static str,
        field: &'static str,
        value: &str,
    ) -> Result<()> {
        match self {
            Ok(_) => Err(DatabaseError::Conflict {
                resource,
                field,
                value: value.to_string(),
            }),
            Err(e) => match e {
                DatabaseError::NotFound {
                    resource: _,
                    identifier: _,
                } => Ok(()),
                e => Err(e),
            },
        }
    }
}

/// Represents a type that can store and fetch manual data
#[async_trait]
pub trait Database: Send + Sync {
    /// Creates all tables if they don't exist and seeds the default topics
    async fn init_schema(&self) -> Result<()>;

    async fn list_topics(&self) -> Result<Vec<TopicData>>;
    async fn topic_by_slug(&self, slug: &str) -> Result<TopicData>;
    /// Deletes a topic along with every lab belonging to it
    async fn delete_topic(&self, topic_id: PrimaryKey) -> Result<()>;

    async fn labs_by_topic_slug(&self, topic_slug: &str) -> Result<Vec<LabData>>;
    async fn lab_by_slug(&self, topic_slug: &str, lab_slug: &str) -> Result<LabData>;
    async fn lab_by_id(&self, lab_id: PrimaryKey) -> Result<LabData>;
    async fn create_lab(&self, new_lab: NewLab) -> Result<LabData>;
    async fn update_lab(&self, updated_lab: UpdatedLab) -> Result<LabData>;
    async fn delete_lab(&self, lab_id: PrimaryKey) -> Result<()>;

    async fn user_by_id(&self, user_id: PrimaryKey) -> Result<UserData>;
    async fn user_by_username(&self, username: &str) -> Result<UserData>;
    async fn create_user(&self, new_user: NewUser) -> Result<UserData>;

    async fn append_log(&self, new_log: NewSystemLog) -> Result<SystemLogData>;
    async fn recent_logs(&self, limit: u32) -> Result<Vec<SystemLogData>>;
}

/// The fixed topics every fresh database starts with, as (title, slug, description)
pub const SEED_TOPICS: [(&str, &str, &str); 5] = [
    ("Docker", "docker", "Application containerization"),
    ("Kubernetes", "kubernetes", "Container orchestration"),
    ("CI/CD", "cicd", "Continuous integration and delivery"),
    ("Terraform", "terraform", "Infrastructure as code"),
    ("Monitoring", "monitoring", "Monitoring and logging"),
];

#[derive(Debug)]
pub struct NewLab {
    pub topic_id: PrimaryKey,
    /// The slug is derived from this when the lab is stored
    pub title: String,
    pub content: String,
    pub commands: Vec<String>,
    pub difficulty: String,
}

#[derive(Debug)]
pub struct UpdatedLab {
    pub id: PrimaryKey,
    pub title: String,
    pub content: String,
    pub commands: Vec<String>,
    pub difficulty: String,
}

#[derive(Debug)]
pub struct NewUser {
    pub username: String,
    /// Must already be hashed
    pub password: String,
    pub is_admin: bool,
}

#[derive(Debug)]
pub struct NewSystemLog {
    pub level: LogLevel,
    pub message: String,
    pub metrics: Value,
}
