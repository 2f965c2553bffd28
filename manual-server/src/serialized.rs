//! All schemas that are exposed from endpoints are defined here
//! along with the ToSerialized impls

use chrono::{DateTime, Utc};
use manual_core::{LabData, Sample, TopicData, UserData};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct Topic {
    id: i32,
    title: String,
    slug: String,
    description: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Lab {
    id: i32,
    topic_id: i32,
    title: String,
    slug: String,
    content: String,
    commands: Vec<String>,
    difficulty: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    topic: Option<Topic>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Metrics {
    cpu_usage: f64,
    memory_usage: f64,
    disk_usage: f64,
    /// Unix timestamp in seconds
    timestamp: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResult {
    user: String,
    is_admin: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Message {
    message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Helper trait to convert any type into a serialized version
pub trait ToSerialized<T>
where
    T: Serialize,
{
    fn to_serialized(&self) -> T;
}

impl<I, O> ToSerialized<Vec<O>> for Vec<I>
where
    I: ToSerialized<O>,
    O: Serialize,
{
    fn to_serialized(&self) -> Vec<O> {
        self.iter().map(|x| x.to_serialized()).collect()
    }
}

impl ToSerialized<Topic> for TopicData {
    fn to_serialized(&self) -> Topic {
        Topic {
            id: self.id,
            title: self.title.clone(),
            slug: self.slug.clone(),
            description: self.description.clone(),
            created_at: self.created_at,
        }
    }
}

impl ToSerialized<Lab> for LabData {
    fn to_serialized(&self) -> Lab {
        Lab {
            id: self.id,
            topic_id: self.topic_id,
            title: self.title.clone(),
            slug: self.slug.clone(),
            content: self.content.clone(),
            commands: self.commands.clone(),
            difficulty: self.difficulty.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            topic: self.topic.as_ref().map(|t| t.to_serialized()),
        }
    }
}

impl ToSerialized<Metrics> for Sample {
    fn to_serialized(&self) -> Metrics {
        Metrics {
            cpu_usage: self.cpu_usage,
            memory_usage: self.memory_usage,
            disk_usage: self.disk_usage,
            timestamp: self.timestamp,
        }
    }
}

impl ToSerialized<LoginResult> for UserData {
    fn to_serialized(&self) -> LoginResult {
        LoginResult {
            user: self.username.clone(),
            is_admin: self.is_admin,
        }
    }
}
