use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

/// A bearer session. Only the SHA-256 digest of the opaque token is
/// stored; the token itself is handed to the client once at sign-in.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AuthSession {
    pub token_hash: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl AuthSession {
    pub async fn create(
        pool: &SqlitePool,
        token_hash: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, AuthSession>(
            r#"INSERT INTO sessions (token_hash, user_id, expires_at)
               VALUES ($1, $2, $3)
               RETURNING *"#,
        )
        .bind(token_hash)
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(pool)
        .await
    }

    /// Look up an unexpired session by token digest.
    pub async fn find_valid(
        pool: &SqlitePool,
        token_hash: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, AuthSession>(
            "SELECT * FROM sessions WHERE token_hash = $1 AND expires_at > $2",
        )
        .bind(token_hash)
        .bind(Utc::now())
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, token_hash: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(token_hash)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        DBService,
        models::user::{CreateUser, User},
    };
    use chrono::Duration;

    #[tokio::test]
    async fn expired_sessions_are_invisible() {
        let db = DBService::new_in_memory().await.unwrap();
        let user = User::create(
            &db.pool,
            Uuid::new_v4(),
            &CreateUser {
                name: None,
                email: "s@example.com".into(),
                password_hash: None,
            },
        )
        .await
        .unwrap();

        AuthSession::create(&db.pool, "live", user.id, Utc::now() + Duration::days(30))
            .await
            .unwrap();
        AuthSession::create(&db.pool, "stale", user.id, Utc::now() - Duration::hours(1))
            .await
            .unwrap();

        assert!(
            AuthSession::find_valid(&db.pool, "live")
                .await
                .unwrap()
                .is_some()
        );
        assert!(
            AuthSession::find_valid(&db.pool, "stale")
                .await
                .unwrap()
                .is_none()
        );
    }
}
