mod login;
mod logout;
mod register;

use axum::{routing::get, Router};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{db, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", get(register::register_page).post(register::register))
        .route("/login", get(login::login_page).post(login::login))
        .route("/logout", get(logout::logout))
}

/// Inserts the user row and its empty profile together, in one
/// transaction. Returns the new user's id, or `None` when the username
/// is already taken.
pub(crate) async fn create_user(
    db_pool: &SqlitePool,
    username: &str,
    password_hash: &str,
) -> sqlx::Result<Option<String>> {
    let id = Uuid::now_v7().to_string();
    let mut tx = db_pool.begin().await?;
    let inserted = sqlx::query(
        "INSERT INTO users (id, username, password_hash, created_at) VALUES (?, ?, ?, ?) \
         ON CONFLICT(username) DO NOTHING",
    )
    .bind(&id)
    .bind(username)
    .bind(password_hash)
    .bind(db::now())
    .execute(&mut *tx)
    .await?
    .rows_affected()
        > 0;
    if !inserted {
        return Ok(None);
    }
    sqlx::query("INSERT INTO profiles (user_id) VALUES (?)")
        .bind(&id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(Some(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn user_and_profile_arrive_together() {
        let pool = db::connect("sqlite::memory:", 1).await.unwrap();

        let id = create_user(&pool, "alice", "hash").await.unwrap().unwrap();
        let (profiles,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM profiles WHERE user_id = ?")
                .bind(&id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(profiles, 1);
    }

    #[tokio::test]
    async fn duplicate_username_creates_nothing() {
        let pool = db::connect("sqlite::memory:", 1).await.unwrap();

        create_user(&pool, "alice", "hash").await.unwrap().unwrap();
        assert!(create_user(&pool, "alice", "hash2").await.unwrap().is_none());

        let (users,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&pool)
            .await
            .unwrap();
        let (profiles,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM profiles")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!((users, profiles), (1, 1));
    }
}
