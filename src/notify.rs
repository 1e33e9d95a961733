//! Notification rows for likes, comments and follows. Emission is
//! best-effort: a failed insert is logged and dropped so it can never
//! fail the action that triggered it.

use sqlx::SqlitePool;
use tracing::warn;
use uuid::Uuid;

use crate::db;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Like,
    Comment,
    Follow,
}

impl Kind {
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Like => "like",
            Kind::Comment => "comment",
            Kind::Follow => "follow",
        }
    }
}

/// Records that `actor_id` did `kind` to `recipient_id`. Acting on your
/// own content produces no row.
pub async fn emit(
    pool: &SqlitePool,
    kind: Kind,
    actor_id: &str,
    recipient_id: &str,
    tweet_id: Option<&str>,
) {
    if actor_id == recipient_id {
        return;
    }
    let result = sqlx::query(
        "INSERT INTO notifications (id, recipient_id, actor_id, kind, tweet_id, created_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(Uuid::now_v7().to_string())
    .bind(recipient_id)
    .bind(actor_id)
    .bind(kind.as_str())
    .bind(tweet_id)
    .bind(db::now())
    .execute(pool)
    .await;
    if let Err(err) = result {
        warn!("failed to record {} notification: {err}", kind.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn seed_user(pool: &SqlitePool, name: &str) -> String {
        let id = format!("user-{name}");
        sqlx::query("INSERT INTO users (id, username, password_hash, created_at) VALUES (?, ?, 'x', 0)")
            .bind(&id)
            .bind(name)
            .execute(pool)
            .await
            .unwrap();
        id
    }

    async fn rows(pool: &SqlitePool) -> Vec<(String, String, String, Option<String>)> {
        sqlx::query_as(
            "SELECT recipient_id, actor_id, kind, tweet_id FROM notifications ORDER BY created_at",
        )
        .fetch_all(pool)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn emits_one_row_per_event() {
        let pool = db::connect("sqlite::memory:", 1).await.unwrap();
        let alice = seed_user(&pool, "alice").await;
        let bob = seed_user(&pool, "bob").await;

        emit(&pool, Kind::Follow, &bob, &alice, None).await;
        let all = rows(&pool).await;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].0, alice);
        assert_eq!(all[0].1, bob);
        assert_eq!(all[0].2, "follow");
        assert_eq!(all[0].3, None);
    }

    #[tokio::test]
    async fn own_actions_are_not_recorded() {
        let pool = db::connect("sqlite::memory:", 1).await.unwrap();
        let alice = seed_user(&pool, "alice").await;

        emit(&pool, Kind::Like, &alice, &alice, None).await;
        assert!(rows(&pool).await.is_empty());
    }

    #[tokio::test]
    async fn failed_insert_is_swallowed() {
        let pool = db::connect("sqlite::memory:", 1).await.unwrap();
        let alice = seed_user(&pool, "alice").await;

        // Unknown actor violates the foreign key; the caller survives.
        emit(&pool, Kind::Like, "no-such-user", &alice, None).await;
        assert!(rows(&pool).await.is_empty());
    }

    #[tokio::test]
    async fn tweet_rows_cascade_their_notifications() {
        let pool = db::connect("sqlite::memory:", 1).await.unwrap();
        let alice = seed_user(&pool, "alice").await;
        let bob = seed_user(&pool, "bob").await;
        sqlx::query(
            "INSERT INTO tweets (id, user_id, text, created_at, updated_at) VALUES ('t1', ?, 'hi', 0, 0)",
        )
        .bind(&alice)
        .execute(&pool)
        .await
        .unwrap();

        emit(&pool, Kind::Like, &bob, &alice, Some("t1")).await;
        emit(&pool, Kind::Follow, &bob, &alice, None).await;
        assert_eq!(rows(&pool).await.len(), 2);

        sqlx::query("DELETE FROM tweets WHERE id = 't1'")
            .execute(&pool)
            .await
            .unwrap();
        let remaining = rows(&pool).await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].2, "follow");
    }
}
