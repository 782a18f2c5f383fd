use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub color: String,
    pub pinned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNote {
    pub title: String,
    pub content: String,
    pub color: Option<String>,
    pub pinned: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateNote {
    pub title: Option<String>,
    pub content: Option<String>,
    pub color: Option<String>,
    pub pinned: Option<bool>,
}

impl Note {
    /// Pinned notes first, most recently touched first within each group.
    pub async fn find_by_user_id(
        pool: &SqlitePool,
        user_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Note>(
            r#"SELECT * FROM notes
               WHERE user_id = $1
               ORDER BY pinned DESC, updated_at DESC"#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(
        pool: &SqlitePool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Note>("SELECT * FROM notes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(
        pool: &SqlitePool,
        user_id: Uuid,
        data: &CreateNote,
        note_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let color = data.color.as_deref().unwrap_or("#fbbf24");
        let pinned = data.pinned.unwrap_or(false);

        sqlx::query_as::<_, Note>(
            r#"INSERT INTO notes (id, user_id, title, content, color, pinned)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING *"#,
        )
        .bind(note_id)
        .bind(user_id)
        .bind(&data.title)
        .bind(&data.content)
        .bind(color)
        .bind(pinned)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        user_id: Uuid,
        data: &UpdateNote,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Note>(
            r#"UPDATE notes
               SET title      = COALESCE($3, title),
                   content    = COALESCE($4, content),
                   color      = COALESCE($5, color),
                   pinned     = COALESCE($6, pinned),
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1 AND user_id = $2
               RETURNING *"#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&data.title)
        .bind(&data.content)
        .bind(&data.color)
        .bind(data.pinned)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
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

    async fn seed_user(db: &DBService) -> User {
        User::create(
            &db.pool,
            Uuid::new_v4(),
            &CreateUser {
                name: None,
                email: "notes@example.com".into(),
                password_hash: None,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn pinned_notes_sort_first() {
        let db = DBService::new_in_memory().await.unwrap();
        let user = seed_user(&db).await;

        Note::create(
            &db.pool,
            user.id,
            &CreateNote {
                title: "plain".into(),
                content: String::new(),
                color: None,
                pinned: None,
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();
        let pinned = Note::create(
            &db.pool,
            user.id,
            &CreateNote {
                title: "keep on top".into(),
                content: String::new(),
                color: None,
                pinned: Some(true),
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();

        let notes = Note::find_by_user_id(&db.pool, user.id).await.unwrap();
        assert_eq!(notes[0].id, pinned.id);
    }

    #[tokio::test]
    async fn update_keeps_absent_fields() {
        let db = DBService::new_in_memory().await.unwrap();
        let user = seed_user(&db).await;
        let note = Note::create(
            &db.pool,
            user.id,
            &CreateNote {
                title: "groceries".into(),
                content: "milk".into(),
                color: None,
                pinned: None,
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();

        let updated = Note::update(
            &db.pool,
            note.id,
            user.id,
            &UpdateNote {
                title: None,
                content: Some("milk, eggs".into()),
                color: None,
                pinned: None,
            },
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(updated.title, "groceries");
        assert_eq!(updated.content, "milk, eggs");
        assert_eq!(updated.color, "#fbbf24");
    }
}
