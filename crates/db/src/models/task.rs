use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool, Type, types::Json};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, EnumString, Display, Default,
)]
#[sqlx(type_name = "task_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, EnumString, Display, Default,
)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

/// One checklist entry inside a task. Stored as part of the `subtasks`
/// JSON column; never addressed individually by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subtask {
    pub title: String,
    #[serde(default)]
    pub done: bool,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub tags: Json<Vec<String>>,
    pub due_date: Option<DateTime<Utc>>,
    pub color_label: String,
    pub reminder_time: Option<DateTime<Utc>>,
    pub subtasks: Option<Json<Vec<Subtask>>>,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub tags: Option<Vec<String>>,
    pub due_date: Option<DateTime<Utc>>,
    pub color_label: Option<String>,
    pub reminder_time: Option<DateTime<Utc>>,
    pub subtasks: Option<Vec<Subtask>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
    pub tags: Option<Vec<String>>,
    pub due_date: Option<DateTime<Utc>>,
    pub color_label: Option<String>,
    pub reminder_time: Option<DateTime<Utc>>,
    pub subtasks: Option<Vec<Subtask>>,
}

/// One entry of a bulk reorder request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskOrder {
    pub id: Uuid,
    pub sort_order: i64,
}

impl Task {
    pub async fn find_by_user_id(
        pool: &SqlitePool,
        user_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"SELECT * FROM tasks
               WHERE user_id = $1
               ORDER BY sort_order ASC, created_at ASC"#,
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
        sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a new task at the end of the user's list.
    pub async fn create(
        pool: &SqlitePool,
        user_id: Uuid,
        data: &CreateTask,
        task_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let priority = data.priority.unwrap_or_default();
        let tags = Json(data.tags.clone().unwrap_or_default());
        let color_label = data.color_label.as_deref().unwrap_or("#3b82f6");
        let subtasks = data.subtasks.clone().map(Json);

        sqlx::query_as::<_, Task>(
            r#"INSERT INTO tasks (id, user_id, title, description, priority, status, tags,
                                  due_date, color_label, reminder_time, subtasks, sort_order)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                       (SELECT COALESCE(MAX(sort_order) + 1, 0) FROM tasks WHERE user_id = $2))
               RETURNING *"#,
        )
        .bind(task_id)
        .bind(user_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(priority)
        .bind(TaskStatus::Todo)
        .bind(tags)
        .bind(data.due_date)
        .bind(color_label)
        .bind(data.reminder_time)
        .bind(subtasks)
        .fetch_one(pool)
        .await
    }

    /// Partial update; absent fields keep their stored value.
    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        user_id: Uuid,
        data: &UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let tags = data.tags.clone().map(Json);
        let subtasks = data.subtasks.clone().map(Json);

        sqlx::query_as::<_, Task>(
            r#"UPDATE tasks
               SET title         = COALESCE($3, title),
                   description   = COALESCE($4, description),
                   priority      = COALESCE($5, priority),
                   status        = COALESCE($6, status),
                   tags          = COALESCE($7, tags),
                   due_date      = COALESCE($8, due_date),
                   color_label   = COALESCE($9, color_label),
                   reminder_time = COALESCE($10, reminder_time),
                   subtasks      = COALESCE($11, subtasks),
                   updated_at    = datetime('now', 'subsec')
               WHERE id = $1 AND user_id = $2
               RETURNING *"#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.priority)
        .bind(data.status)
        .bind(tags)
        .bind(data.due_date)
        .bind(&data.color_label)
        .bind(data.reminder_time)
        .bind(subtasks)
        .fetch_optional(pool)
        .await
    }

    /// Apply a bulk reorder in one transaction. Rows not owned by the user
    /// are silently skipped by the WHERE clause.
    pub async fn reorder(
        pool: &SqlitePool,
        user_id: Uuid,
        items: &[TaskOrder],
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;
        for item in items {
            sqlx::query(
                r#"UPDATE tasks
                   SET sort_order = $3, updated_at = datetime('now', 'subsec')
                   WHERE id = $1 AND user_id = $2"#,
            )
            .bind(item.id)
            .bind(user_id)
            .bind(item.sort_order)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await
    }

    pub async fn delete<'e, E>(executor: E, id: Uuid, user_id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(executor)
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
                name: Some("Sam".into()),
                email: "sam@example.com".into(),
                password_hash: None,
            },
        )
        .await
        .unwrap()
    }

    fn new_task(title: &str) -> CreateTask {
        CreateTask {
            title: title.into(),
            description: None,
            priority: None,
            tags: Some(vec!["school".into()]),
            due_date: None,
            color_label: None,
            reminder_time: None,
            subtasks: None,
        }
    }

    #[tokio::test]
    async fn create_appends_to_end_of_list() {
        let db = DBService::new_in_memory().await.unwrap();
        let user = seed_user(&db).await;

        let first = Task::create(&db.pool, user.id, &new_task("a"), Uuid::new_v4())
            .await
            .unwrap();
        let second = Task::create(&db.pool, user.id, &new_task("b"), Uuid::new_v4())
            .await
            .unwrap();

        assert_eq!(first.sort_order, 0);
        assert_eq!(second.sort_order, 1);
        assert_eq!(first.status, TaskStatus::Todo);
        assert_eq!(first.tags.0, vec!["school".to_string()]);
    }

    #[tokio::test]
    async fn update_is_partial() {
        let db = DBService::new_in_memory().await.unwrap();
        let user = seed_user(&db).await;
        let task = Task::create(&db.pool, user.id, &new_task("write essay"), Uuid::new_v4())
            .await
            .unwrap();

        let update = UpdateTask {
            title: None,
            description: None,
            priority: None,
            status: Some(TaskStatus::Done),
            tags: None,
            due_date: None,
            color_label: None,
            reminder_time: None,
            subtasks: Some(vec![Subtask {
                title: "outline".into(),
                done: true,
            }]),
        };
        let updated = Task::update(&db.pool, task.id, user.id, &update)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.title, "write essay");
        assert_eq!(updated.status, TaskStatus::Done);
        assert_eq!(updated.subtasks.unwrap().0[0].title, "outline");
    }

    #[tokio::test]
    async fn update_scoped_to_owner() {
        let db = DBService::new_in_memory().await.unwrap();
        let user = seed_user(&db).await;
        let task = Task::create(&db.pool, user.id, &new_task("mine"), Uuid::new_v4())
            .await
            .unwrap();

        let stranger = Uuid::new_v4();
        let update = UpdateTask {
            title: Some("stolen".into()),
            description: None,
            priority: None,
            status: None,
            tags: None,
            due_date: None,
            color_label: None,
            reminder_time: None,
            subtasks: None,
        };
        let result = Task::update(&db.pool, task.id, stranger, &update)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn reorder_swaps_positions() {
        let db = DBService::new_in_memory().await.unwrap();
        let user = seed_user(&db).await;
        let a = Task::create(&db.pool, user.id, &new_task("a"), Uuid::new_v4())
            .await
            .unwrap();
        let b = Task::create(&db.pool, user.id, &new_task("b"), Uuid::new_v4())
            .await
            .unwrap();

        Task::reorder(
            &db.pool,
            user.id,
            &[
                TaskOrder {
                    id: a.id,
                    sort_order: 1,
                },
                TaskOrder {
                    id: b.id,
                    sort_order: 0,
                },
            ],
        )
        .await
        .unwrap();

        let tasks = Task::find_by_user_id(&db.pool, user.id).await.unwrap();
        assert_eq!(tasks[0].id, b.id);
        assert_eq!(tasks[1].id, a.id);
    }

    #[tokio::test]
    async fn delete_returns_affected_rows() {
        let db = DBService::new_in_memory().await.unwrap();
        let user = seed_user(&db).await;
        let task = Task::create(&db.pool, user.id, &new_task("gone"), Uuid::new_v4())
            .await
            .unwrap();

        assert_eq!(Task::delete(&db.pool, task.id, user.id).await.unwrap(), 1);
        assert_eq!(Task::delete(&db.pool, task.id, user.id).await.unwrap(), 0);
    }
}
