//! Likes and follows. Both are toggles over uniqueness-constrained
//! tables: insert-if-absent first, delete when the insert found an
//! existing row. Concurrent toggles land on one of the two valid
//! outcomes instead of erroring.

use sqlx::SqlitePool;

use crate::db;

#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct LikeState {
    pub liked: bool,
    pub count: i64,
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct FollowState {
    pub following: bool,
    pub follower_count: i64,
    pub following_count: i64,
}

#[derive(Debug, Clone, Copy)]
pub enum FollowOutcome {
    SelfFollow,
    Toggled(FollowState),
}

pub async fn toggle_like(
    pool: &SqlitePool,
    user_id: &str,
    tweet_id: &str,
) -> sqlx::Result<LikeState> {
    let inserted = sqlx::query(
        "INSERT INTO likes (user_id, tweet_id) VALUES (?, ?) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(tweet_id)
    .execute(pool)
    .await?
    .rows_affected()
        > 0;
    if !inserted {
        sqlx::query("DELETE FROM likes WHERE user_id = ? AND tweet_id = ?")
            .bind(user_id)
            .bind(tweet_id)
            .execute(pool)
            .await?;
    }
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM likes WHERE tweet_id = ?")
        .bind(tweet_id)
        .fetch_one(pool)
        .await?;
    Ok(LikeState {
        liked: inserted,
        count,
    })
}

/// Follower/following totals for one user's profile header.
pub async fn follow_counts(pool: &SqlitePool, user_id: &str) -> sqlx::Result<(i64, i64)> {
    let (followers, following): (i64, i64) = sqlx::query_as(
        "SELECT (SELECT COUNT(*) FROM follows WHERE followee_id = ?), \
         (SELECT COUNT(*) FROM follows WHERE follower_id = ?)",
    )
    .bind(user_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok((followers, following))
}

pub async fn is_following(
    pool: &SqlitePool,
    follower_id: &str,
    followee_id: &str,
) -> sqlx::Result<bool> {
    let (found,): (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = ? AND followee_id = ?)",
    )
    .bind(follower_id)
    .bind(followee_id)
    .fetch_one(pool)
    .await?;
    Ok(found)
}

/// Self-follows are rejected before touching the table; the CHECK
/// constraint backs this up at the schema level.
pub async fn toggle_follow(
    pool: &SqlitePool,
    follower_id: &str,
    followee_id: &str,
) -> sqlx::Result<FollowOutcome> {
    if follower_id == followee_id {
        return Ok(FollowOutcome::SelfFollow);
    }
    let inserted = sqlx::query(
        "INSERT INTO follows (follower_id, followee_id, created_at) VALUES (?, ?, ?) \
         ON CONFLICT DO NOTHING",
    )
    .bind(follower_id)
    .bind(followee_id)
    .bind(db::now())
    .execute(pool)
    .await?
    .rows_affected()
        > 0;
    if !inserted {
        sqlx::query("DELETE FROM follows WHERE follower_id = ? AND followee_id = ?")
            .bind(follower_id)
            .bind(followee_id)
            .execute(pool)
            .await?;
    }
    let (follower_count, following_count) = follow_counts(pool, followee_id).await?;
    Ok(FollowOutcome::Toggled(FollowState {
        following: inserted,
        follower_count,
        following_count,
    }))
}
