use axum::{
    debug_handler,
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{
    feed::{self, FeedFilter},
    include_res, linkify, res, session, social,
    tweets::card,
    AppError, AppResult,
};

#[derive(Debug, Deserialize)]
pub(crate) struct PageQuery {
    #[serde(default, deserialize_with = "crate::lenient_page")]
    page: Option<u32>,
}

#[debug_handler]
pub(crate) async fn profile(
    Path(username): Path<String>,
    State(db_pool): State<SqlitePool>,
    session: Session,
    Query(PageQuery { page }): Query<PageQuery>,
) -> AppResult<Response> {
    let viewer = session::current_viewer(&session, &db_pool).await?;
    let viewer_id = viewer.as_ref().map(|v| v.id.as_str());

    let Some((user_id, username, bio, image)): Option<(String, String, String, Option<String>)> =
        sqlx::query_as(
            "SELECT u.id, u.username, p.bio, p.image FROM users u \
             JOIN profiles p ON p.user_id = u.id WHERE u.username = ?",
        )
        .bind(&username)
        .fetch_optional(&db_pool)
        .await?
    else {
        return Err(AppError::NotFound("profile"));
    };

    let (follower_count, following_count) = social::follow_counts(&db_pool, &user_id).await?;
    let tweets = feed::fetch_page(
        &db_pool,
        viewer_id,
        &FeedFilter::by_author(&user_id),
        page.unwrap_or(1),
    )
    .await?;

    let follow_button = match &viewer {
        Some(v) if v.id == user_id => {
            "<a class=\"edit-profile\" href=\"/settings\">Edit profile</a>".to_string()
        }
        Some(v) => {
            let following = social::is_following(&db_pool, &v.id, &user_id).await?;
            format!(
                "<button class=\"js-toggle follow{}\" data-url=\"/follow/{username}\">{}</button>",
                if following { " following" } else { "" },
                if following { "Unfollow" } else { "Follow" },
            )
        }
        None => String::new(),
    };

    let avatar = match &image {
        Some(url) => format!(
            "<img class=\"avatar\" src=\"{}\" alt=\"\">",
            linkify::safe_attr(url)
        ),
        None => String::new(),
    };

    let body = include_res!(str, "/pages/profile.html")
        .replace("{username}", &username)
        .replace("{nav}", &res::nav(viewer.as_ref().map(|v| v.username.as_str())))
        .replace("{flash}", &res::flash_banner(session::take_flash(&session).await?))
        .replace("{avatar}", &avatar)
        .replace("{follower_count}", &follower_count.to_string())
        .replace("{following_count}", &following_count.to_string())
        .replace("{follow_button}", &follow_button)
        .replace("{tweets}", &card::tweet_list_html(&tweets.items, viewer_id))
        .replace(
            "{pager}",
            &res::pager(&format!("/profile/{username}"), None, tweets.page, tweets.last_page),
        )
        .replace("{bio}", &linkify::safe_text(&bio));

    Ok(Html(body).into_response())
}
