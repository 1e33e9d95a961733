use axum::{
    debug_handler,
    extract::{Query, State},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{
    feed::{self, Feed, FeedFilter, Suggestion, TrendingTag},
    include_res, linkify, res, session, AppResult,
};

use super::card;

#[derive(Debug, Deserialize)]
pub(crate) struct FeedQuery {
    q: Option<String>,
    #[serde(default, deserialize_with = "crate::lenient_page")]
    page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PageQuery {
    #[serde(default, deserialize_with = "crate::lenient_page")]
    page: Option<u32>,
}

#[debug_handler]
pub(crate) async fn feed_page(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Query(FeedQuery { q, page }): Query<FeedQuery>,
) -> AppResult<Response> {
    let viewer = session::current_viewer(&session, &db_pool).await?;
    let viewer_id = viewer.as_ref().map(|v| v.id.as_str());

    let filter = FeedFilter::parse(q.as_deref());
    let feed = feed::fetch_feed(&db_pool, viewer_id, &filter, page.unwrap_or(1)).await?;

    let heading = match &filter {
        FeedFilter::Tag(slug) => format!("Tweets tagged #{slug}"),
        FeedFilter::Text(text) => format!("Results for &quot;{}&quot;", linkify::safe_text(text)),
        _ => "Latest tweets".to_string(),
    };

    render(&session, viewer.as_ref(), &heading, "/", q.as_deref(), feed).await
}

#[debug_handler]
pub(crate) async fn home_page(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Query(PageQuery { page }): Query<PageQuery>,
) -> AppResult<Response> {
    let viewer = session::require_current(&session, &db_pool, "/home").await?;

    let filter = FeedFilter::following(&viewer.id);
    let feed = feed::fetch_feed(&db_pool, Some(&viewer.id), &filter, page.unwrap_or(1)).await?;

    render(&session, Some(&viewer), "Your home timeline", "/home", None, feed).await
}

#[debug_handler]
pub(crate) async fn my_tweets(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Query(PageQuery { page }): Query<PageQuery>,
) -> AppResult<Response> {
    let viewer = session::require_current(&session, &db_pool, "/my").await?;

    let filter = FeedFilter::by_author(&viewer.id);
    let feed = feed::fetch_feed(&db_pool, Some(&viewer.id), &filter, page.unwrap_or(1)).await?;

    render(&session, Some(&viewer), "My tweets", "/my", None, feed).await
}

async fn render(
    session: &Session,
    viewer: Option<&session::Viewer>,
    heading: &str,
    path: &str,
    q: Option<&str>,
    feed: Feed,
) -> AppResult<Response> {
    let viewer_id = viewer.map(|v| v.id.as_str());
    let body = include_res!(str, "/pages/feed.html")
        .replace("{title}", heading)
        .replace("{nav}", &res::nav(viewer.map(|v| v.username.as_str())))
        .replace("{flash}", &res::flash_banner(session::take_flash(session).await?))
        .replace("{search_q}", &linkify::safe_attr(q.unwrap_or("")))
        .replace("{tweets}", &card::tweet_list_html(&feed.page.items, viewer_id))
        .replace("{pager}", &res::pager(path, q, feed.page.page, feed.page.last_page))
        .replace("{trending}", &trending_html(&feed.trending))
        .replace("{suggestions}", &suggestions_html(&feed.suggestions))
        .replace("{heading}", heading);
    Ok(Html(body).into_response())
}

fn trending_html(tags: &[TrendingTag]) -> String {
    if tags.is_empty() {
        return String::new();
    }
    let mut items = String::new();
    for tag in tags {
        items += &format!(
            "<li><a href=\"/?q=%23{}\">#{}</a> <span class=\"count\">{}</span></li>",
            tag.slug, tag.name, tag.uses
        );
    }
    format!("<section class=\"trending\"><h2>Trending</h2><ol>{items}</ol></section>")
}

fn suggestions_html(picks: &[Suggestion]) -> String {
    if picks.is_empty() {
        return String::new();
    }
    let mut items = String::new();
    for pick in picks {
        items += &format!(
            "<li><a href=\"/profile/{u}\">@{u}</a></li>",
            u = pick.username
        );
    }
    format!("<section class=\"suggestions\"><h2>Who to follow</h2><ul>{items}</ul></section>")
}
