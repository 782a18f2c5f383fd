use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

/// Which coaching voice the assistant answers with.
#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, EnumString, Display, Default,
)]
#[sqlx(type_name = "pom_personality", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum PomPersonality {
    StrictStructured,
    #[default]
    WarmAccountability,
    HyperFocused,
    MinimalistRobot,
    FlexibleProblemSolver,
    CalmMonk,
    CompassionateFirm,
    ChaosWrangler,
}

/// Per-user settings: Pomodoro timings, theme, accessibility toggles,
/// and the assistant personality. Exactly one row per user.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserPreferences {
    pub user_id: Uuid,
    pub language: String,
    pub focus_time: i64,
    pub break_time: i64,
    pub long_break_time: i64,
    pub sound_preference: Option<String>,
    pub notifications_enabled: bool,
    pub theme: String,
    pub dyslexia_font: bool,
    pub large_ui_mode: bool,
    pub high_contrast: bool,
    pub reminder_frequency: String,
    pub auto_start_next_cycle: bool,
    pub pom_personality: PomPersonality,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePreferences {
    pub language: Option<String>,
    pub focus_time: Option<i64>,
    pub break_time: Option<i64>,
    pub long_break_time: Option<i64>,
    pub sound_preference: Option<String>,
    pub notifications_enabled: Option<bool>,
    pub theme: Option<String>,
    pub dyslexia_font: Option<bool>,
    pub large_ui_mode: Option<bool>,
    pub high_contrast: Option<bool>,
    pub reminder_frequency: Option<String>,
    pub auto_start_next_cycle: Option<bool>,
    pub pom_personality: Option<PomPersonality>,
}

impl UserPreferences {
    pub async fn find_by_user_id(
        pool: &SqlitePool,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, UserPreferences>("SELECT * FROM user_preferences WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert the default row if the user has none yet.
    pub async fn ensure_defaults(pool: &SqlitePool, user_id: Uuid) -> Result<Self, sqlx::Error> {
        sqlx::query("INSERT OR IGNORE INTO user_preferences (user_id) VALUES ($1)")
            .bind(user_id)
            .execute(pool)
            .await?;
        sqlx::query_as::<_, UserPreferences>("SELECT * FROM user_preferences WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Create-or-update with partial semantics: absent fields keep their
    /// stored value on update and fall back to the defaults on insert.
    pub async fn upsert(
        pool: &SqlitePool,
        user_id: Uuid,
        data: &UpdatePreferences,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, UserPreferences>(
            r#"INSERT INTO user_preferences (
                   user_id, language, focus_time, break_time, long_break_time,
                   sound_preference, notifications_enabled, theme, dyslexia_font,
                   large_ui_mode, high_contrast, reminder_frequency,
                   auto_start_next_cycle, pom_personality
               ) VALUES (
                   $1,
                   COALESCE($2, 'EN'),
                   COALESCE($3, 25),
                   COALESCE($4, 5),
                   COALESCE($5, 15),
                   $6,
                   COALESCE($7, 1),
                   COALESCE($8, 'colorful'),
                   COALESCE($9, 0),
                   COALESCE($10, 0),
                   COALESCE($11, 0),
                   COALESCE($12, 'normal'),
                   COALESCE($13, 0),
                   COALESCE($14, 'warm-accountability')
               )
               ON CONFLICT(user_id) DO UPDATE SET
                   language              = COALESCE($2, language),
                   focus_time            = COALESCE($3, focus_time),
                   break_time            = COALESCE($4, break_time),
                   long_break_time       = COALESCE($5, long_break_time),
                   sound_preference      = COALESCE($6, sound_preference),
                   notifications_enabled = COALESCE($7, notifications_enabled),
                   theme                 = COALESCE($8, theme),
                   dyslexia_font         = COALESCE($9, dyslexia_font),
                   large_ui_mode         = COALESCE($10, large_ui_mode),
                   high_contrast         = COALESCE($11, high_contrast),
                   reminder_frequency    = COALESCE($12, reminder_frequency),
                   auto_start_next_cycle = COALESCE($13, auto_start_next_cycle),
                   pom_personality       = COALESCE($14, pom_personality),
                   updated_at            = datetime('now', 'subsec')
               RETURNING *"#,
        )
        .bind(user_id)
        .bind(&data.language)
        .bind(data.focus_time)
        .bind(data.break_time)
        .bind(data.long_break_time)
        .bind(&data.sound_preference)
        .bind(data.notifications_enabled)
        .bind(&data.theme)
        .bind(data.dyslexia_font)
        .bind(data.large_ui_mode)
        .bind(data.high_contrast)
        .bind(&data.reminder_frequency)
        .bind(data.auto_start_next_cycle)
        .bind(data.pom_personality)
        .fetch_one(pool)
        .await
    }
}
