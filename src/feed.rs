//! Feed composition: which tweets a viewer sees, in what order, on which
//! page, plus the side-channel trending tags and follow suggestions.

use rand::seq::IndexedRandom;
use sqlx::SqlitePool;

use crate::tags;

pub const PAGE_SIZE: u32 = 10;

/// One access pattern per variant; `clause`/`arg` keep the filter
/// composition explicit instead of string-building in handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedFilter {
    All,
    Tag(String),
    Text(String),
    Author(String),
    Following(String),
}

impl FeedFilter {
    /// `#`-prefixed queries select by exact tag slug, anything else
    /// non-empty is a case-insensitive substring search.
    pub fn parse(q: Option<&str>) -> Self {
        let q = q.map(str::trim).unwrap_or("");
        if let Some(rest) = q.strip_prefix('#') {
            FeedFilter::Tag(tags::slugify(rest))
        } else if q.is_empty() {
            FeedFilter::All
        } else {
            FeedFilter::Text(q.to_string())
        }
    }

    pub fn by_author(user_id: &str) -> Self {
        FeedFilter::Author(user_id.to_string())
    }

    /// Tweets from users the given user follows.
    pub fn following(user_id: &str) -> Self {
        FeedFilter::Following(user_id.to_string())
    }

    fn clause(&self) -> &'static str {
        match self {
            FeedFilter::All => "",
            FeedFilter::Tag(_) => {
                "WHERE t.id IN (SELECT tt.tweet_id FROM tweet_tags tt \
                 JOIN tags g ON g.id = tt.tag_id WHERE g.slug = ?)"
            }
            // SQLite lower() is ASCII-only, which matches the backing
            // store's own LIKE case rules.
            FeedFilter::Text(_) => "WHERE instr(lower(t.text), lower(?)) > 0",
            FeedFilter::Author(_) => "WHERE t.user_id = ?",
            FeedFilter::Following(_) => {
                "WHERE t.user_id IN (SELECT followee_id FROM follows WHERE follower_id = ?)"
            }
        }
    }

    fn arg(&self) -> Option<&str> {
        match self {
            FeedFilter::All => None,
            FeedFilter::Tag(s)
            | FeedFilter::Text(s)
            | FeedFilter::Author(s)
            | FeedFilter::Following(s) => Some(s),
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TweetCard {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub text: String,
    pub image: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub like_count: i64,
    pub comment_count: i64,
    pub liked: bool,
}

#[derive(Debug, Clone)]
pub struct Page {
    pub items: Vec<TweetCard>,
    pub page: u32,
    pub last_page: u32,
    pub total: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TrendingTag {
    pub name: String,
    pub slug: String,
    pub uses: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Suggestion {
    pub user_id: String,
    pub username: String,
}

pub struct Feed {
    pub page: Page,
    pub trending: Vec<TrendingTag>,
    pub suggestions: Vec<Suggestion>,
}

/// The whole front page in one call: the requested slice plus trending
/// tags and who-to-follow picks.
pub async fn fetch_feed(
    pool: &SqlitePool,
    viewer: Option<&str>,
    filter: &FeedFilter,
    page: u32,
) -> sqlx::Result<Feed> {
    Ok(Feed {
        page: fetch_page(pool, viewer, filter, page).await?,
        trending: trending(pool).await?,
        suggestions: suggestions(pool, viewer).await?,
    })
}

/// One page of tweets, newest first (creation time, then id, both
/// descending, so pagination is deterministic). A page number past the
/// end degrades to the last valid page instead of failing.
pub async fn fetch_page(
    pool: &SqlitePool,
    viewer: Option<&str>,
    filter: &FeedFilter,
    page: u32,
) -> sqlx::Result<Page> {
    let total = count(pool, filter).await?;
    let last_page = (total as u64).div_ceil(PAGE_SIZE as u64).max(1) as u32;
    let page = page.clamp(1, last_page);
    let offset = (page as i64 - 1) * PAGE_SIZE as i64;

    let sql = format!(
        "SELECT t.id, t.user_id, u.username, t.text, t.image, t.created_at, t.updated_at, \
         (SELECT COUNT(*) FROM likes l WHERE l.tweet_id = t.id) AS like_count, \
         (SELECT COUNT(*) FROM comments c WHERE c.tweet_id = t.id) AS comment_count, \
         EXISTS(SELECT 1 FROM likes l WHERE l.tweet_id = t.id AND l.user_id = ?) AS liked \
         FROM tweets t JOIN users u ON u.id = t.user_id {} \
         ORDER BY t.created_at DESC, t.id DESC LIMIT ? OFFSET ?",
        filter.clause()
    );
    let mut q = sqlx::query_as::<_, TweetCard>(&sql).bind(viewer.unwrap_or(""));
    if let Some(arg) = filter.arg() {
        q = q.bind(arg);
    }
    let items = q
        .bind(PAGE_SIZE as i64)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    Ok(Page {
        items,
        page,
        last_page,
        total,
    })
}

/// One tweet rendered the same way the feed renders it.
pub async fn tweet_card(
    pool: &SqlitePool,
    viewer: Option<&str>,
    tweet_id: &str,
) -> sqlx::Result<Option<TweetCard>> {
    sqlx::query_as(
        "SELECT t.id, t.user_id, u.username, t.text, t.image, t.created_at, t.updated_at, \
         (SELECT COUNT(*) FROM likes l WHERE l.tweet_id = t.id) AS like_count, \
         (SELECT COUNT(*) FROM comments c WHERE c.tweet_id = t.id) AS comment_count, \
         EXISTS(SELECT 1 FROM likes l WHERE l.tweet_id = t.id AND l.user_id = ?) AS liked \
         FROM tweets t JOIN users u ON u.id = t.user_id WHERE t.id = ?",
    )
    .bind(viewer.unwrap_or(""))
    .bind(tweet_id)
    .fetch_optional(pool)
    .await
}

async fn count(pool: &SqlitePool, filter: &FeedFilter) -> sqlx::Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM tweets t {}", filter.clause());
    let mut q = sqlx::query_as::<_, (i64,)>(&sql);
    if let Some(arg) = filter.arg() {
        q = q.bind(arg);
    }
    let (total,) = q.fetch_one(pool).await?;
    Ok(total)
}

/// Top five tags by number of associated tweets; ties break by slug
/// ascending so the ranking is stable.
pub async fn trending(pool: &SqlitePool) -> sqlx::Result<Vec<TrendingTag>> {
    sqlx::query_as(
        "SELECT g.name, g.slug, COUNT(tt.tweet_id) AS uses \
         FROM tags g JOIN tweet_tags tt ON tt.tag_id = g.id \
         GROUP BY g.id ORDER BY uses DESC, g.slug ASC LIMIT 5",
    )
    .fetch_all(pool)
    .await
}

/// Up to three random profiles the viewer does not follow yet (and is
/// not). Anonymous viewers get none.
pub async fn suggestions(pool: &SqlitePool, viewer: Option<&str>) -> sqlx::Result<Vec<Suggestion>> {
    let Some(viewer) = viewer else {
        return Ok(Vec::new());
    };
    let candidates: Vec<Suggestion> = sqlx::query_as(
        "SELECT u.id AS user_id, u.username FROM users u \
         JOIN profiles p ON p.user_id = u.id \
         WHERE u.id <> ? AND u.id NOT IN \
         (SELECT followee_id FROM follows WHERE follower_id = ?)",
    )
    .bind(viewer)
    .bind(viewer)
    .fetch_all(pool)
    .await?;
    Ok(candidates
        .choose_multiple(&mut rand::rng(), 3)
        .cloned()
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db, tags::sync_tweet_tags};

    async fn seed_user(pool: &SqlitePool, name: &str) -> String {
        let id = format!("user-{name}");
        sqlx::query("INSERT INTO users (id, username, password_hash, created_at) VALUES (?, ?, 'x', 0)")
            .bind(&id)
            .bind(name)
            .execute(pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO profiles (user_id) VALUES (?)")
            .bind(&id)
            .execute(pool)
            .await
            .unwrap();
        id
    }

    async fn seed_tweet(pool: &SqlitePool, user_id: &str, text: &str, created_at: i64) -> String {
        let id = uuid::Uuid::now_v7().to_string();
        sqlx::query(
            "INSERT INTO tweets (id, user_id, text, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(user_id)
        .bind(text)
        .bind(created_at)
        .bind(created_at)
        .execute(pool)
        .await
        .unwrap();
        sync_tweet_tags(pool, &id, text).await.unwrap();
        id
    }

    #[test]
    fn filter_parse_routes_queries() {
        assert_eq!(FeedFilter::parse(None), FeedFilter::All);
        assert_eq!(FeedFilter::parse(Some("  ")), FeedFilter::All);
        assert_eq!(FeedFilter::parse(Some("#Rust")), FeedFilter::Tag("rust".into()));
        assert_eq!(FeedFilter::parse(Some("#")), FeedFilter::Tag(String::new()));
        assert_eq!(
            FeedFilter::parse(Some("hello")),
            FeedFilter::Text("hello".into())
        );
    }

    #[tokio::test]
    async fn newest_first_with_stable_tiebreak() {
        let pool = db::connect("sqlite::memory:", 1).await.unwrap();
        let alice = seed_user(&pool, "alice").await;
        let old = seed_tweet(&pool, &alice, "old", 100).await;
        // Same timestamp: the later id (UUIDv7, time-ordered) wins.
        let tie_a = seed_tweet(&pool, &alice, "tie a", 200).await;
        let tie_b = seed_tweet(&pool, &alice, "tie b", 200).await;

        let page = fetch_page(&pool, None, &FeedFilter::All, 1).await.unwrap();
        let ids: Vec<&str> = page.items.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec![tie_b.as_str(), tie_a.as_str(), old.as_str()]);
    }

    #[tokio::test]
    async fn pagination_clamps_to_last_page() {
        let pool = db::connect("sqlite::memory:", 1).await.unwrap();
        let alice = seed_user(&pool, "alice").await;
        for i in 0..23 {
            seed_tweet(&pool, &alice, &format!("tweet {i}"), i).await;
        }

        let first = fetch_page(&pool, None, &FeedFilter::All, 1).await.unwrap();
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.last_page, 3);
        assert_eq!(first.items[0].text, "tweet 22");

        let last = fetch_page(&pool, None, &FeedFilter::All, 3).await.unwrap();
        assert_eq!(last.items.len(), 3);
        assert_eq!(last.items.last().unwrap().text, "tweet 0");

        let beyond = fetch_page(&pool, None, &FeedFilter::All, 99).await.unwrap();
        assert_eq!(beyond.page, 3);
        let beyond_ids: Vec<&str> = beyond.items.iter().map(|t| t.id.as_str()).collect();
        let last_ids: Vec<&str> = last.items.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(beyond_ids, last_ids);

        let zero = fetch_page(&pool, None, &FeedFilter::All, 0).await.unwrap();
        assert_eq!(zero.page, 1);
    }

    #[tokio::test]
    async fn empty_store_yields_one_empty_page() {
        let pool = db::connect("sqlite::memory:", 1).await.unwrap();
        let page = fetch_page(&pool, None, &FeedFilter::All, 7).await.unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.last_page, 1);
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn tag_filter_is_exact_not_partial() {
        let pool = db::connect("sqlite::memory:", 1).await.unwrap();
        let alice = seed_user(&pool, "alice").await;
        seed_tweet(&pool, &alice, "about #rust", 1).await;
        seed_tweet(&pool, &alice, "about #rustacean", 2).await;

        let page = fetch_page(&pool, None, &FeedFilter::parse(Some("#rust")), 1)
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].text, "about #rust");
    }

    #[tokio::test]
    async fn text_filter_is_case_insensitive_substring() {
        let pool = db::connect("sqlite::memory:", 1).await.unwrap();
        let alice = seed_user(&pool, "alice").await;
        seed_tweet(&pool, &alice, "Hello World", 1).await;
        seed_tweet(&pool, &alice, "unrelated", 2).await;

        let page = fetch_page(&pool, None, &FeedFilter::parse(Some("hello w")), 1)
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].text, "Hello World");
    }

    #[tokio::test]
    async fn author_filter_limits_to_one_user() {
        let pool = db::connect("sqlite::memory:", 1).await.unwrap();
        let alice = seed_user(&pool, "alice").await;
        let bob = seed_user(&pool, "bob").await;
        seed_tweet(&pool, &alice, "mine", 1).await;
        seed_tweet(&pool, &bob, "theirs", 2).await;

        let page = fetch_page(&pool, None, &FeedFilter::by_author(&alice), 1)
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].text, "mine");
    }

    #[tokio::test]
    async fn following_filter_tracks_the_graph() {
        let pool = db::connect("sqlite::memory:", 1).await.unwrap();
        let alice = seed_user(&pool, "alice").await;
        let bob = seed_user(&pool, "bob").await;
        let carol = seed_user(&pool, "carol").await;
        seed_tweet(&pool, &bob, "from bob", 1).await;
        seed_tweet(&pool, &carol, "from carol", 2).await;
        seed_tweet(&pool, &alice, "from alice herself", 3).await;
        sqlx::query("INSERT INTO follows (follower_id, followee_id, created_at) VALUES (?, ?, 0)")
            .bind(&alice)
            .bind(&bob)
            .execute(&pool)
            .await
            .unwrap();

        let page = fetch_page(&pool, Some(&alice), &FeedFilter::following(&alice), 1)
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].text, "from bob");
    }

    #[tokio::test]
    async fn like_and_comment_counts_ride_along() {
        let pool = db::connect("sqlite::memory:", 1).await.unwrap();
        let alice = seed_user(&pool, "alice").await;
        let bob = seed_user(&pool, "bob").await;
        let tweet = seed_tweet(&pool, &alice, "popular", 1).await;
        sqlx::query("INSERT INTO likes (user_id, tweet_id) VALUES (?, ?)")
            .bind(&bob)
            .bind(&tweet)
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO comments (id, tweet_id, user_id, text, created_at) VALUES ('c1', ?, ?, 'hi', 0)",
        )
        .bind(&tweet)
        .bind(&bob)
        .execute(&pool)
        .await
        .unwrap();

        let card = tweet_card(&pool, Some(&bob), &tweet).await.unwrap().unwrap();
        assert_eq!(card.like_count, 1);
        assert_eq!(card.comment_count, 1);
        assert!(card.liked);

        let card = tweet_card(&pool, Some(&alice), &tweet).await.unwrap().unwrap();
        assert!(!card.liked);

        let card = tweet_card(&pool, None, &tweet).await.unwrap().unwrap();
        assert!(!card.liked);
    }

    #[tokio::test]
    async fn trending_ranks_by_count_then_slug() {
        let pool = db::connect("sqlite::memory:", 1).await.unwrap();
        let alice = seed_user(&pool, "alice").await;
        seed_tweet(&pool, &alice, "#big one", 1).await;
        seed_tweet(&pool, &alice, "#big two", 2).await;
        seed_tweet(&pool, &alice, "#beta", 3).await;
        seed_tweet(&pool, &alice, "#alpha", 4).await;
        for i in 0..6 {
            seed_tweet(&pool, &alice, &format!("#t{i} filler"), 10 + i).await;
        }

        let top = trending(&pool).await.unwrap();
        assert_eq!(top.len(), 5);
        assert_eq!(top[0].slug, "big");
        assert_eq!(top[0].uses, 2);
        // All remaining tags are used once; slug ascending decides.
        assert_eq!(top[1].slug, "alpha");
        assert_eq!(top[2].slug, "beta");
        assert_eq!(top[3].slug, "t0");
        assert_eq!(top[4].slug, "t1");
    }

    #[tokio::test]
    async fn suggestions_exclude_self_and_followed() {
        let pool = db::connect("sqlite::memory:", 1).await.unwrap();
        let alice = seed_user(&pool, "alice").await;
        let bob = seed_user(&pool, "bob").await;
        let carol = seed_user(&pool, "carol").await;
        sqlx::query("INSERT INTO follows (follower_id, followee_id, created_at) VALUES (?, ?, 0)")
            .bind(&alice)
            .bind(&bob)
            .execute(&pool)
            .await
            .unwrap();

        let picks = suggestions(&pool, Some(&alice)).await.unwrap();
        assert_eq!(picks.len(), 1);
        assert_eq!(picks[0].user_id, carol);

        assert!(suggestions(&pool, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn suggestions_cap_at_three() {
        let pool = db::connect("sqlite::memory:", 1).await.unwrap();
        let alice = seed_user(&pool, "alice").await;
        for name in ["b", "c", "d", "e", "f"] {
            seed_user(&pool, name).await;
        }

        let picks = suggestions(&pool, Some(&alice)).await.unwrap();
        assert_eq!(picks.len(), 3);
        assert!(picks.iter().all(|p| p.user_id != alice));
    }
}
