use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    /// Never serialized into responses.
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Display name for prompts and greetings: the stored name, or the
    /// local part of the email address.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.email.split('@').next().unwrap_or("User"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub name: Option<String>,
    pub email: String,
    pub password_hash: Option<String>,
}

impl User {
    pub async fn create(
        pool: &SqlitePool,
        id: Uuid,
        data: &CreateUser,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"INSERT INTO users (id, name, email, password_hash)
               VALUES ($1, $2, $3, $4)
               RETURNING *"#,
        )
        .bind(id)
        .bind(&data.name)
        .bind(&data.email)
        .bind(&data.password_hash)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_email(
        pool: &SqlitePool,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    pub async fn update_name(
        pool: &SqlitePool,
        id: Uuid,
        name: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET name = $2, updated_at = datetime('now', 'subsec') WHERE id = $1",
        )
        .bind(id)
        .bind(name)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Delete the account. Tasks, notes, sessions, preferences, and
    /// progress rows go with it via ON DELETE CASCADE.
    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DBService;

    #[tokio::test]
    async fn email_is_unique() {
        let db = DBService::new_in_memory().await.unwrap();
        let data = CreateUser {
            name: None,
            email: "dup@example.com".into(),
            password_hash: None,
        };
        User::create(&db.pool, Uuid::new_v4(), &data).await.unwrap();
        let second = User::create(&db.pool, Uuid::new_v4(), &data).await;
        assert!(second.is_err());
    }

    #[tokio::test]
    async fn display_name_falls_back_to_email_local_part() {
        let db = DBService::new_in_memory().await.unwrap();
        let user = User::create(
            &db.pool,
            Uuid::new_v4(),
            &CreateUser {
                name: None,
                email: "kai@example.com".into(),
                password_hash: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(user.display_name(), "kai");
    }

    #[tokio::test]
    async fn delete_cascades_to_owned_rows() {
        let db = DBService::new_in_memory().await.unwrap();
        let user = User::create(
            &db.pool,
            Uuid::new_v4(),
            &CreateUser {
                name: None,
                email: "bye@example.com".into(),
                password_hash: None,
            },
        )
        .await
        .unwrap();

        crate::models::note::Note::create(
            &db.pool,
            user.id,
            &crate::models::note::CreateNote {
                title: "note".into(),
                content: "body".into(),
                color: None,
                pinned: None,
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();

        assert_eq!(User::delete(&db.pool, user.id).await.unwrap(), 1);
        let notes = crate::models::note::Note::find_by_user_id(&db.pool, user.id)
            .await
            .unwrap();
        assert!(notes.is_empty());
    }
}
