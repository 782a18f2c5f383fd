use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, types::Json};
use uuid::Uuid;

/// Gamification state: XP, level, completion count, earned badges.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserProgress {
    pub user_id: Uuid,
    pub xp: i64,
    pub level: i64,
    pub tasks_completed: i64,
    pub badges: Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// XP granted for completing a task.
const TASK_XP: i64 = 10;

impl UserProgress {
    pub async fn find_by_user_id(
        pool: &SqlitePool,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, UserProgress>("SELECT * FROM user_progress WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn ensure_defaults(pool: &SqlitePool, user_id: Uuid) -> Result<Self, sqlx::Error> {
        sqlx::query("INSERT OR IGNORE INTO user_progress (user_id) VALUES ($1)")
            .bind(user_id)
            .execute(pool)
            .await?;
        sqlx::query_as::<_, UserProgress>("SELECT * FROM user_progress WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Award the completion bonus: +10 XP, recompute the level
    /// (`xp / 100 + 1`), bump the completion counter. Creates the row if
    /// the user has none yet.
    pub async fn award_task_completion(
        pool: &SqlitePool,
        user_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, UserProgress>(
            r#"INSERT INTO user_progress (user_id, xp, level, tasks_completed)
               VALUES ($1, $2, $2 / 100 + 1, 1)
               ON CONFLICT(user_id) DO UPDATE SET
                   xp              = xp + $2,
                   level           = (xp + $2) / 100 + 1,
                   tasks_completed = tasks_completed + 1,
                   updated_at      = datetime('now', 'subsec')
               RETURNING *"#,
        )
        .bind(user_id)
        .bind(TASK_XP)
        .fetch_one(pool)
        .await
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
                email: "xp@example.com".into(),
                password_hash: None,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn completion_awards_ten_xp() {
        let db = DBService::new_in_memory().await.unwrap();
        let user = seed_user(&db).await;
        UserProgress::ensure_defaults(&db.pool, user.id).await.unwrap();

        let progress = UserProgress::award_task_completion(&db.pool, user.id)
            .await
            .unwrap();
        assert_eq!(progress.xp, 10);
        assert_eq!(progress.level, 1);
        assert_eq!(progress.tasks_completed, 1);
    }

    #[tokio::test]
    async fn level_advances_every_hundred_xp() {
        let db = DBService::new_in_memory().await.unwrap();
        let user = seed_user(&db).await;

        let mut progress = UserProgress::ensure_defaults(&db.pool, user.id).await.unwrap();
        for _ in 0..10 {
            progress = UserProgress::award_task_completion(&db.pool, user.id)
                .await
                .unwrap();
        }
        assert_eq!(progress.xp, 100);
        assert_eq!(progress.level, 2);
        assert_eq!(progress.tasks_completed, 10);
    }

    #[tokio::test]
    async fn award_creates_missing_row() {
        let db = DBService::new_in_memory().await.unwrap();
        let user = seed_user(&db).await;

        let progress = UserProgress::award_task_completion(&db.pool, user.id)
            .await
            .unwrap();
        assert_eq!(progress.xp, 10);
        assert_eq!(progress.tasks_completed, 1);
        assert!(progress.badges.0.is_empty());
    }
}
