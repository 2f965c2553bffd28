use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, query, query_as, Error as SqlxError, FromRow, PgPool};

use crate::{
    util::slugify, Database, DatabaseError, DatabaseResult, IntoDatabaseError, LabData, LogLevel,
    NewLab, NewSystemLog, NewUser, PrimaryKey, Result, SystemLogData, TopicData, UpdatedLab,
    UserData, SEED_TOPICS,
};

const SCHEMA: [&str; 4] = [
    "CREATE TABLE IF NOT EXISTS topics (
        id SERIAL PRIMARY KEY,
        title VARCHAR(255) NOT NULL,
        slug VARCHAR(255) UNIQUE NOT NULL,
        description TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS labs (
        id SERIAL PRIMARY KEY,
        topic_id INTEGER NOT NULL REFERENCES topics(id) ON DELETE CASCADE,
        title VARCHAR(255) NOT NULL,
        slug VARCHAR(255) NOT NULL,
        content TEXT,
        commands TEXT[],
        difficulty VARCHAR(50),
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        UNIQUE(topic_id, slug)
    )",
    "CREATE TABLE IF NOT EXISTS users (
        id SERIAL PRIMARY KEY,
        username VARCHAR(255) UNIQUE NOT NULL,
        password VARCHAR(255) NOT NULL,
        is_admin BOOLEAN NOT NULL DEFAULT false,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS system_logs (
        id SERIAL PRIMARY KEY,
        level VARCHAR(50) NOT NULL,
        message TEXT NOT NULL,
        metrics JSONB,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
];

const SELECT_LABS: &str = "
    SELECT
        labs.id,
        labs.topic_id,
        labs.title,
        labs.slug,
        labs.content,
        labs.commands,
        labs.difficulty,
        labs.created_at,
        labs.updated_at,
        topics.title AS topic_title,
        topics.slug AS topic_slug,
        topics.description AS topic_description,
        topics.created_at AS topic_created_at
    FROM labs
        INNER JOIN topics ON labs.topic_id = topics.id";

/// A postgres database implementation for the manual
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    pub async fn new(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(|e| e.any())?;

        Ok(Self { pool })
    }
}

#[derive(FromRow)]
struct TopicRow {
    id: PrimaryKey,
    title: String,
    slug: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct LabRow {
    id: PrimaryKey,
    topic_id: PrimaryKey,
    title: String,
    slug: String,
    content: Option<String>,
    commands: Option<Vec<String>>,
    difficulty: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    topic_title: String,
    topic_slug: String,
    topic_description: Option<String>,
    topic_created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct UserRow {
    id: PrimaryKey,
    username: String,
    password: String,
    is_admin: bool,
    created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct SystemLogRow {
    id: PrimaryKey,
    level: String,
    message: String,
    metrics: Option<Value>,
    created_at: DateTime<Utc>,
}

impl From<TopicRow> for TopicData {
    fn from(r: TopicRow) -> Self {
        Self {
            id: r.id,
            title: r.title,
            slug: r.slug,
            description: r.description.unwrap_or_default(),
            created_at: r.created_at,
        }
    }
}

impl From<LabRow> for LabData {
    fn from(r: LabRow) -> Self {
        Self {
            id: r.id,
            topic_id: r.topic_id,
            title: r.title,
            slug: r.slug,
            content: r.content.unwrap_or_default(),
            commands: r.commands.unwrap_or_default(),
            difficulty: r.difficulty.unwrap_or_default(),
            created_at: r.created_at,
            updated_at: r.updated_at,
            topic: Some(TopicData {
                id: r.topic_id,
                title: r.topic_title,
                slug: r.topic_slug,
                description: r.topic_description.unwrap_or_default(),
                created_at: r.topic_created_at,
            }),
        }
    }
}

impl From<UserRow> for UserData {
    fn from(r: UserRow) -> Self {
        Self {
            id: r.id,
            username: r.username,
            password: r.password,
            is_admin: r.is_admin,
            created_at: r.created_at,
        }
    }
}

impl From<SystemLogRow> for SystemLogData {
    fn from(r: SystemLogRow) -> Self {
        Self {
            id: r.id,
            level: LogLevel::parse(&r.level),
            message: r.message,
            metrics: r.metrics.unwrap_or(Value::Null),
            created_at: r.created_at,
        }
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn init_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| e.any())?;
        }

        for (title, slug, description) in SEED_TOPICS {
            query(
                "INSERT INTO topics (title, slug, description) VALUES ($1, $2, $3)
                 ON CONFLICT DO NOTHING",
            )
            .bind(title)
            .bind(slug)
            .bind(description)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())?;
        }

        Ok(())
    }

    async fn list_topics(&self) -> Result<Vec<TopicData>> {
        let rows: Vec<TopicRow> = query_as("SELECT * FROM topics ORDER BY title")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn topic_by_slug(&self, slug: &str) -> Result<TopicData> {
        query_as::<_, TopicRow>("SELECT * FROM topics WHERE slug = $1")
            .bind(slug)
            .fetch_one(&self.pool)
            .await
            .map(Into::into)
            .map_err(|e| e.not_found_or("topic", "slug"))
    }

    async fn delete_topic(&self, topic_id: PrimaryKey) -> Result<()> {
        // Ensure topic exists
        query("SELECT id FROM topics WHERE id = $1")
            .bind(topic_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("topic", "id"))?;

        query("DELETE FROM topics WHERE id = $1")
            .bind(topic_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    async fn labs_by_topic_slug(&self, topic_slug: &str) -> Result<Vec<LabData>> {
        let sql = format!("{SELECT_LABS} WHERE topics.slug = $1 ORDER BY labs.created_at DESC");

        let rows: Vec<LabRow> = query_as(&sql)
            .bind(topic_slug)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn lab_by_slug(&self, topic_slug: &str, lab_slug: &str) -> Result<LabData> {
        let sql = format!("{SELECT_LABS} WHERE topics.slug = $1 AND labs.slug = $2");

        query_as::<_, LabRow>(&sql)
            .bind(topic_slug)
            .bind(lab_slug)
            .fetch_one(&self.pool)
            .await
            .map(Into::into)
            .map_err(|e| e.not_found_or("lab", "slug"))
    }

    async fn lab_by_id(&self, lab_id: PrimaryKey) -> Result<LabData> {
        let sql = format!("{SELECT_LABS} WHERE labs.id = $1");

        query_as::<_, LabRow>(&sql)
            .bind(lab_id)
            .fetch_one(&self.pool)
            .await
            .map(Into::into)
            .map_err(|e| e.not_found_or("lab", "id"))
    }

    async fn create_lab(&self, new_lab: NewLab) -> Result<LabData> {
        let slug = slugify(&new_lab.title);

        let (id,): (PrimaryKey,) = query_as(
            "INSERT INTO labs (topic_id, title, slug, content, commands, difficulty)
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(new_lab.topic_id)
        .bind(new_lab.title)
        .bind(slug)
        .bind(new_lab.content)
        .bind(new_lab.commands)
        .bind(new_lab.difficulty)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())?;

        self.lab_by_id(id).await
    }

    async fn update_lab(&self, updated_lab: UpdatedLab) -> Result<LabData> {
        let record: Option<(PrimaryKey,)> = query_as(
            "UPDATE labs
             SET title = $1, content = $2, commands = $3, difficulty = $4, updated_at = now()
             WHERE id = $5 RETURNING id",
        )
        .bind(updated_lab.title)
        .bind(updated_lab.content)
        .bind(updated_lab.commands)
        .bind(updated_lab.difficulty)
        .bind(updated_lab.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| e.any())?;

        let (id,) = record.ok_or(DatabaseError::NotFound {
            resource: "lab",
            identifier: "id",
        })?;

        self.lab_by_id(id).await
    }

    async fn delete_lab(&self, lab_id: PrimaryKey) -> Result<()> {
        // Ensure lab exists
        let _ = self.lab_by_id(lab_id).await?;

        query("DELETE FROM labs WHERE id = $1")
            .bind(lab_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    async fn user_by_id(&self, user_id: PrimaryKey) -> Result<UserData> {
        query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map(Into::into)
            .map_err(|e| e.not_found_or("user", "id"))
    }

    async fn user_by_username(&self, username: &str) -> Result<UserData> {
        query_as::<_, UserRow>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .map(Into::into)
            .map_err(|e| e.not_found_or("user", "username"))
    }

    async fn create_user(&self, new_user: NewUser) -> Result<UserData> {
        self.user_by_username(&new_user.username)
            .await
            .conflict_or_ok("user", "username", &new_user.username)?;

        query_as::<_, UserRow>(
            "INSERT INTO users (username, password, is_admin) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(new_user.username)
        .bind(new_user.password)
        .bind(new_user.is_admin)
        .fetch_one(&self.pool)
        .await
        .map(Into::into)
        .map_err(|e| e.any())
    }

    async fn append_log(&self, new_log: NewSystemLog) -> Result<SystemLogData> {
        query_as::<_, SystemLogRow>(
            "INSERT INTO system_logs (level, message, metrics) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(new_log.level.as_str())
        .bind(new_log.message)
        .bind(new_log.metrics)
        .fetch_one(&self.pool)
        .await
        .map(Into::into)
        .map_err(|e| e.any())
    }

    async fn recent_logs(&self, limit: u32) -> Result<Vec<SystemLogData>> {
        let rows: Vec<SystemLogRow> =
            query_as("SELECT * FROM system_logs ORDER BY created_at DESC, id DESC LIMIT $1")
                .bind(i64::from(limit))
                .fetch_all(&self.pool)
                .await
                .map_err(|e| e.any())?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

impl IntoDatabaseError for SqlxError {
    fn any(self) -> DatabaseError {
        DatabaseError::Internal(Box::new(self))
    }

    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError {
        match self {
            SqlxError::RowNotFound => DatabaseError::NotFound {
                resource,
                identifier,
            },
            e => Self::any(e),
        }
    }
}
