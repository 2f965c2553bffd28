use chrono::{DateTime, Utc};
use serde_json::Value;

/// The type used for primary keys in the database.
pub type PrimaryKey = i32;

/// A subject category grouping labs, like "Docker" or "Terraform"
#[derive(Debug, Clone, PartialEq)]
pub struct TopicData {
    pub id: PrimaryKey,
    pub title: String,
    /// Unique, URL-safe identifier of the topic
    pub slug: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// A tutorial page with content and an ordered list of shell commands
#[derive(Debug, Clone, PartialEq)]
pub struct LabData {
    pub id: PrimaryKey,
    pub topic_id: PrimaryKey,
    pub title: String,
    /// Derived from the title when the lab is created.
    /// Note: `topic_id` and `slug` are unique together.
    pub slug: String,
    pub content: String,
    pub commands: Vec<String>,
    pub difficulty: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// The owning topic, present when the lab was fetched through a join
    pub topic: Option<TopicData>,
}

/// A manual account
#[derive(Debug, Clone)]
pub struct UserData {
    pub id: PrimaryKey,
    pub username: String,
    /// The argon2 hash of the password, never sent to clients
    pub password: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// An append-only record written by the resource monitor
#[derive(Debug, Clone)]
pub struct SystemLogData {
    pub id: PrimaryKey,
    pub level: LogLevel,
    pub message: String,
    /// Snapshot of the host metrics at the time of writing
    pub metrics: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Alert,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Alert => "ALERT",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "ALERT" => Self::Alert,
            _ => Self::Info,
        }
    }
}
