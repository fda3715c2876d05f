//! Conversation queries against SQLite.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::{Conversation, ConversationRow, NewConversation};
use crate::Result;

const SELECT_COLUMNS: &str = r#"
    SELECT id, channel_id, channel_type, user_id, username, first_name, last_name,
           question, answer, message_type, language, timestamp, created_at, updated_at
    FROM conversations
"#;

/// Insert a conversation, stamping it with `now`. Returns the new row id.
pub async fn insert_conversation(
    pool: &SqlitePool,
    record: &NewConversation,
    now: DateTime<Utc>,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO conversations (
            channel_id, channel_type, user_id, username, first_name, last_name,
            question, answer, message_type, language, timestamp, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(record.channel_id)
    .bind(record.channel_type.as_str())
    .bind(record.user_id)
    .bind(&record.username)
    .bind(&record.first_name)
    .bind(&record.last_name)
    .bind(&record.question)
    .bind(&record.answer)
    .bind(record.message_type.as_str())
    .bind(record.language.code())
    .bind(now)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Most recent conversations in a channel.
pub async fn list_by_channel(
    pool: &SqlitePool,
    channel_id: i64,
    limit: u32,
) -> Result<Vec<Conversation>> {
    let sql = format!(
        "{} WHERE channel_id = ? ORDER BY timestamp DESC, id DESC LIMIT ?",
        SELECT_COLUMNS
    );
    let rows = sqlx::query_as::<_, ConversationRow>(&sql)
        .bind(channel_id)
        .bind(i64::from(limit))
        .fetch_all(pool)
        .await?;

    rows.into_iter().map(Conversation::try_from).collect()
}

/// Most recent conversations of a user across all channels.
pub async fn list_by_user(
    pool: &SqlitePool,
    user_id: i64,
    limit: u32,
) -> Result<Vec<Conversation>> {
    let sql = format!(
        "{} WHERE user_id = ? ORDER BY timestamp DESC, id DESC LIMIT ?",
        SELECT_COLUMNS
    );
    let rows = sqlx::query_as::<_, ConversationRow>(&sql)
        .bind(user_id)
        .bind(i64::from(limit))
        .fetch_all(pool)
        .await?;

    rows.into_iter().map(Conversation::try_from).collect()
}

/// All channel ids with at least one conversation.
pub async fn distinct_channel_ids(pool: &SqlitePool) -> Result<Vec<i64>> {
    let ids = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT DISTINCT channel_id
        FROM conversations
        ORDER BY channel_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(ids)
}
