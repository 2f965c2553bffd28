use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use crate::{
    util::slugify, Database, DatabaseError, LabData, NewLab, NewSystemLog, NewUser, PrimaryKey,
    Result, SystemLogData, TopicData, UpdatedLab, UserData, SEED_TOPICS,
};

/// A database kept entirely in memory, enforcing the same constraints as [crate::PgDatabase].
/// Everything is lost when it is dropped.
#[derive(Default)]
pub struct MemoryDatabase {
    tables: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    last_id: PrimaryKey,
    topics: Vec<TopicData>,
    labs: Vec<LabData>,
    users: Vec<UserData>,
    logs: Vec<SystemLogData>,
}

impl Tables {
    fn next_id(&mut self) -> PrimaryKey {
        self.last_id += 1;
        self.last_id
    }

    fn topic(&self, topic_id: PrimaryKey) -> Option<&TopicData> {
        self.topics.iter().find(|t| t.id == topic_id)
    }

    /// Returns the lab with its topic attached, like the join in postgres
    fn joined(&self, lab: &LabData) -> LabData {
        LabData {
            topic: self.topic(lab.topic_id).cloned(),
            ..lab.clone()
        }
    }
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

fn violation(message: String) -> DatabaseError {
    DatabaseError::Internal(message.into())
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn init_schema(&self) -> Result<()> {
        let mut tables = self.tables.lock();

        for (title, slug, description) in SEED_TOPICS {
            if tables.topics.iter().any(|t| t.slug == slug) {
                continue;
            }

            let id = tables.next_id();
            tables.topics.push(TopicData {
                id,
                title: title.to_string(),
                slug: slug.to_string(),
                description: description.to_string(),
                created_at: Utc::now(),
            });
        }

        Ok(())
    }

    async fn list_topics(&self) -> Result<Vec<TopicData>> {
        let mut topics = self.tables.lock().topics.clone();
        topics.sort_by(|a, b| a.title.cmp(&b.title));

        Ok(topics)
    }

    async fn topic_by_slug(&self, slug: &str) -> Result<TopicData> {
        self.tables
            .lock()
            .topics
            .iter()
            .find(|t| t.slug == slug)
            .cloned()
            .ok_or(DatabaseError::NotFound {
                resource: "topic",
                identifier: "slug",
            })
    }

    async fn delete_topic(&self, topic_id: PrimaryKey) -> Result<()> {
        let mut tables = self.tables.lock();

        if tables.topic(topic_id).is_none() {
            return Err(DatabaseError::NotFound {
                resource: "topic",
                identifier: "id",
            });
        }

        tables.topics.retain(|t| t.id != topic_id);
        tables.labs.retain(|l| l.topic_id != topic_id);

        Ok(())
    }

    async fn labs_by_topic_slug(&self, topic_slug: &str) -> Result<Vec<LabData>> {
        let tables = self.tables.lock();

        let mut labs: Vec<_> = tables
            .labs
            .iter()
            .map(|l| tables.joined(l))
            .filter(|l| l.topic.as_ref().is_some_and(|t| t.slug == topic_slug))
            .collect();

        labs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(labs)
    }

    async fn lab_by_slug(&self, topic_slug: &str, lab_slug: &str) -> Result<LabData> {
        let tables = self.tables.lock();

        tables
            .labs
            .iter()
            .map(|l| tables.joined(l))
            .find(|l| l.slug == lab_slug && l.topic.as_ref().is_some_and(|t| t.slug == topic_slug))
            .ok_or(DatabaseError::NotFound {
                resource: "lab",
                identifier: "slug",
            })
    }

    async fn lab_by_id(&self, lab_id: PrimaryKey) -> Result<LabData> {
        let tables = self.tables.lock();

        tables
            .labs
            .iter()
            .find(|l| l.id == lab_id)
            .map(|l| tables.joined(l))
            .ok_or(DatabaseError::NotFound {
                resource: "lab",
                identifier: "id",
            })
    }

    async fn create_lab(&self, new_lab: NewLab) -> Result<LabData> {
        let mut tables = self.tables.lock();
        let slug = slugify(&new_lab.title);

        if tables.topic(new_lab.topic_id).is_none() {
            return Err(violation(format!(
                "insert on table \"labs\" violates foreign key constraint: topic {} does not exist",
                new_lab.topic_id
            )));
        }

        let is_taken = tables
            .labs
            .iter()
            .any(|l| l.topic_id == new_lab.topic_id && l.slug == slug);

        if is_taken {
            return Err(violation(format!(
                "duplicate key value violates unique constraint: (topic_id, slug)=({}, {})",
                new_lab.topic_id, slug
            )));
        }

        let now = Utc::now();
        let lab = LabData {
            id: tables.next_id(),
            topic_id: new_lab.topic_id,
            title: new_lab.title,
            slug,
            content: new_lab.content,
            commands: new_lab.commands,
            difficulty: new_lab.difficulty,
            created_at: now,
            updated_at: now,
            topic: None,
        };

        let result = tables.joined(&lab);
        tables.labs.push(lab);

        Ok(result)
    }

    async fn update_lab(&self, updated_lab: UpdatedLab) -> Result<LabData> {
        let mut tables = self.tables.lock();

        let lab = tables
            .labs
            .iter_mut()
            .find(|l| l.id == updated_lab.id)
            .ok_or(DatabaseError::NotFound {
                resource: "lab",
                identifier: "id",
            })?;

        lab.title = updated_lab.title;
        lab.content = updated_lab.content;
        lab.commands = updated_lab.commands;
        lab.difficulty = updated_lab.difficulty;
        lab.updated_at = Utc::now();

        let lab = lab.clone();
        Ok(tables.joined(&lab))
    }

    async fn delete_lab(&self, lab_id: PrimaryKey) -> Result<()> {
        let mut tables = self.tables.lock();
        let before = tables.labs.len();

        tables.labs.retain(|l| l.id != lab_id);

        if tables.labs.len() == before {
            return Err(DatabaseError::NotFound {
                resource: "lab",
                identifier: "id",
            });
        }

        Ok(())
    }

    async fn user_by_id(&self, user_id: PrimaryKey) -> Result<UserData> {
        self.tables
            .lock()
            .users
            .iter()
            .find(|u| u.id == user_id)
            .cloned()
            .ok_or(DatabaseError::NotFound {
                resource: "user",
                identifier: "id",
            })
    }

    async fn user_by_username(&self, username: &str) -> Result<UserData> {
        self.tables
            .lock()
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned()
            .ok_or(DatabaseError::NotFound {
                resource: "user",
                identifier: "username",
            })
    }

    async fn create_user(&self, new_user: NewUser) -> Result<UserData> {
        let mut tables = self.tables.lock();

        if tables.users.iter().any(|u| u.username == new_user.username) {
            return Err(DatabaseError::Conflict {
                resource: "user",
                field: "username",
                value: new_user.username,
            });
        }

        let user = UserData {
            id: tables.next_id(),
            username: new_user.username,
            password: new_user.password,
            is_admin: new_user.is_admin,
            created_at: Utc::now(),
        };

        tables.users.push(user.clone());

        Ok(user)
    }

    async fn append_log(&self, new_log: NewSystemLog) -> Result<SystemLogData> {
        let mut tables = self.tables.lock();
        let log = SystemLogData {
            id: tables.next_id(),
            level: new_log.level,
            message: new_log.message,
            metrics: new_log.metrics,
            created_at: Utc::now(),
        };

        tables.logs.push(log.clone());

        Ok(log)
    }

    async fn recent_logs(&self, limit: u32) -> Result<Vec<SystemLogData>> {
        let tables = self.tables.lock();

        Ok(tables
            .logs
            .iter()
            .rev()
            .take(limit as usize)
            .cloned()
            .collect())
    }
}
