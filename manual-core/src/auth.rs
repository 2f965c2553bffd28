use argon2::{
    password_hash::{Encoding, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use log::info;
use rand::rngs::OsRng;
use thiserror::Error;

use crate::{BoxedDatabase, DatabaseError, NewUser, SessionData, SessionStore, UserData};

pub struct Auth {
    db: BoxedDatabase,
    sessions: SessionStore,
    argon: Argon2<'static>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Username or password is incorrect
    #[error("Invalid credentials")]
    InvalidCredentials,
    /// Something else went wrong with the database
    #[error(transparent)]
    Db(DatabaseError),
    #[error("HashError: {0}")]
    HashError(String),
}

impl Auth {
    pub fn new(db: &BoxedDatabase) -> Self {
        Self {
            db: db.clone(),
            sessions: SessionStore::new(),
            argon: Argon2::default(),
        }
    }

    /// Logs in a user, returning a new session
    pub async fn login(
        &self,
        credentials: Credentials,
    ) -> Result<(SessionData, UserData), AuthError> {
        self.sessions.clear_expired();

        let user = self
            .db
            .user_by_username(&credentials.username)
            .await
            .map_err(|e| match e {
                DatabaseError::NotFound {
                    resource: _,
                    identifier: _,
                } => AuthError::InvalidCredentials,
                err => AuthError::Db(err),
            })?;

        let stored_password = PasswordHash::parse(&user.password, Encoding::default())
            .map_err(|e| AuthError::HashError(e.to_string()))?;

        self.argon
            .verify_password(credentials.password.as_bytes(), &stored_password)
            .map_err(|_| AuthError::InvalidCredentials)?;

        let session = self.sessions.create(user.id);
        info!("{} logged in", user.username);

        Ok((session, user))
    }

    /// Deletes the associated session, if it exists
    pub fn logout(&self, token: &str) {
        self.sessions.delete(token)
    }

    /// Returns a session if it exists and hasn't expired
    pub fn session(&self, token: &str) -> Option<SessionData> {
        self.sessions.get(token)
    }

    /// Returns the user a session belongs to
    pub async fn user(&self, session: &SessionData) -> Result<UserData, DatabaseError> {
        self.db.user_by_id(session.user_id).await
    }

    /// Creates a regular user that can log in but not edit labs
    pub async fn register_basic(&self, credentials: Credentials) -> Result<UserData, AuthError> {
        self.create_user(credentials, false).await
    }

    /// Creates an admin user
    pub async fn register_admin(&self, credentials: Credentials) -> Result<UserData, AuthError> {
        self.create_user(credentials, true).await
    }

    async fn create_user(
        &self,
        credentials: Credentials,
        is_admin: bool,
    ) -> Result<UserData, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hashed_password = self
            .argon
            .hash_password(credentials.password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?
            .to_string();

        self.db
            .create_user(NewUser {
                username: credentials.username,
                password: hashed_password,
                is_admin,
            })
            .await
            .map_err(AuthError::Db)
    }
}

#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::MemoryDatabase;

    async fn auth_with_admin() -> Auth {
        let db: BoxedDatabase = Arc::new(MemoryDatabase::new());
        let auth = Auth::new(&db);

        auth.register_admin(Credentials::new("admin", "hunter22"))
            .await
            .unwrap();

        auth
    }

    #[tokio::test]
    async fn password_is_stored_hashed() {
        let db: BoxedDatabase = Arc::new(MemoryDatabase::new());
        let auth = Auth::new(&db);

        let user = auth
            .register_admin(Credentials::new("admin", "hunter22"))
            .await
            .unwrap();

        assert!(user.is_admin);
        assert_ne!(user.password, "hunter22");
        assert!(user.password.starts_with("$argon2"));
        assert_eq!(db.user_by_id(user.id).await.unwrap().username, "admin");
    }

    #[tokio::test]
    async fn login_creates_session() {
        let auth = auth_with_admin().await;

        let (session, user) = auth
            .login(Credentials::new("admin", "hunter22"))
            .await
            .unwrap();

        assert_eq!(session.user_id, user.id);
        assert_eq!(auth.session(&session.token), Some(session.clone()));

        auth.logout(&session.token);
        assert_eq!(auth.session(&session.token), None);
    }

    #[tokio::test]
    async fn wrong_credentials_are_rejected() {
        let auth = auth_with_admin().await;

        let wrong_password = auth.login(Credentials::new("admin", "hunter2")).await;
        let wrong_user = auth.login(Credentials::new("root", "hunter22")).await;

        assert!(matches!(wrong_password, Err(AuthError::InvalidCredentials)));
        assert!(matches!(wrong_user, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn admin_cannot_be_registered_twice() {
        let auth = auth_with_admin().await;
        let result = auth
            .register_admin(Credentials::new("admin", "other"))
            .await;

        assert!(matches!(
            result,
            Err(AuthError::Db(DatabaseError::Conflict { .. }))
        ));
    }
}
