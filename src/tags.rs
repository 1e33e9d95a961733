//! Hashtag index: derives tag names from tweet text and keeps the
//! tweet↔tag association table in sync with it.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::linkify::HASHTAG_RE;

/// Unique hashtag names in `text`, leading `#` stripped, original casing
/// preserved, in order of first appearance.
pub fn derive_tags(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for m in HASHTAG_RE.find_iter(text) {
        let name = &m.as_str()[1..];
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Canonical lookup form of a tag name: lowercased, runs of
/// non-alphanumeric characters collapsed to a single `-`, trimmed.
/// Deterministic, so uniqueness on the slug makes `#Rust` and `#rust`
/// the same tag.
pub fn slugify(name: &str) -> String {
    let mut slug = String::new();
    let mut gap = false;
    for c in name.chars() {
        if c.is_alphanumeric() {
            if gap && !slug.is_empty() {
                slug.push('-');
            }
            gap = false;
            for lc in c.to_lowercase() {
                slug.push(lc);
            }
        } else {
            gap = true;
        }
    }
    slug
}

/// Replaces the tweet's tag associations with exactly the hashtags in
/// `text`. Idempotent: running it again with the same text changes
/// nothing. Tag rows themselves are never deleted, only associations.
pub async fn sync_tweet_tags(pool: &SqlitePool, tweet_id: &str, text: &str) -> sqlx::Result<()> {
    let mut keep: Vec<String> = Vec::new();
    for name in derive_tags(text) {
        let slug = slugify(&name);
        if slug.is_empty() {
            continue;
        }
        let tag_id = tag_id_for(pool, &name, &slug).await?;
        sqlx::query("INSERT INTO tweet_tags (tweet_id, tag_id) VALUES (?, ?) ON CONFLICT DO NOTHING")
            .bind(tweet_id)
            .bind(&tag_id)
            .execute(pool)
            .await?;
        keep.push(tag_id);
    }

    if keep.is_empty() {
        sqlx::query("DELETE FROM tweet_tags WHERE tweet_id = ?")
            .bind(tweet_id)
            .execute(pool)
            .await?;
    } else {
        let placeholders = vec!["?"; keep.len()].join(",");
        let sql = format!("DELETE FROM tweet_tags WHERE tweet_id = ? AND tag_id NOT IN ({placeholders})");
        let mut q = sqlx::query(&sql).bind(tweet_id);
        for tag_id in &keep {
            q = q.bind(tag_id);
        }
        q.execute(pool).await?;
    }
    Ok(())
}

// Get-or-create keyed by the unique slug. Two writers racing on a new
// tag both insert; the loser's insert is a no-op and the re-select finds
// the winner's row, so the first writer's display casing sticks.
async fn tag_id_for(pool: &SqlitePool, name: &str, slug: &str) -> sqlx::Result<String> {
    sqlx::query("INSERT INTO tags (id, name, slug) VALUES (?, ?, ?) ON CONFLICT DO NOTHING")
        .bind(Uuid::now_v7().to_string())
        .bind(name)
        .bind(slug)
        .execute(pool)
        .await?;
    let (id,): (String,) = sqlx::query_as("SELECT id FROM tags WHERE slug = ?")
        .bind(slug)
        .fetch_one(pool)
        .await?;
    Ok(id)
}
