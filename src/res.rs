use axum::{debug_handler, http::header, response::IntoResponse};
use time::{format_description::BorrowedFormatItem, macros::format_description, OffsetDateTime};

use crate::linkify;

#[macro_export]
macro_rules! include_res {
    (bytes, $p:expr) => {
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
    (str, $p:expr) => {
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
}

#[debug_handler]
pub async fn style() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/css")],
        include_res!(str, "/style.css"),
    )
}

#[debug_handler]
pub async fn toggle_js() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/javascript")],
        include_res!(str, "/toggle.js"),
    )
}

/// Body of the 404 page. `what` names the thing that was missing.
pub fn sorry(what: &str) -> String {
    include_res!(str, "/pages/sorry.html").replace("{what}", what)
}

pub fn nav(viewer_name: Option<&str>) -> String {
    match viewer_name {
        Some(username) => include_res!(str, "/pages/nav_user.html").replace("{username}", username),
        None => include_res!(str, "/pages/nav_anon.html").to_string(),
    }
}

pub fn flash_banner(flash: Option<String>) -> String {
    match flash {
        Some(message) => {
            include_res!(str, "/pages/flash.html").replace("{message}", &linkify::safe_text(&message))
        }
        None => String::new(),
    }
}

/// Field-level validation messages above a form. The messages are fixed
/// strings from the handlers, never user input.
pub fn errors_html(errors: &[&str]) -> String {
    if errors.is_empty() {
        return String::new();
    }
    let mut items = String::new();
    for error in errors {
        items += &format!("<li>{error}</li>");
    }
    format!("<ul class=\"errors\">{items}</ul>")
}

/// Newer/older links under a feed. Page 1 is the newest slice, so
/// "older" walks toward higher page numbers.
pub fn pager(path: &str, q: Option<&str>, page: u32, last_page: u32) -> String {
    if last_page <= 1 {
        return String::new();
    }
    let href = |p: u32| match q {
        Some(q) if !q.is_empty() => format!("{path}?q={}&page={p}", urlencoding::encode(q)),
        _ => format!("{path}?page={p}"),
    };
    let mut out = String::from("<nav class=\"pager\">");
    if page > 1 {
        out += &format!("<a href=\"{}\">&laquo; newer</a> ", href(page - 1));
    }
    out += &format!("<span>page {page} of {last_page}</span>");
    if page < last_page {
        out += &format!(" <a href=\"{}\">older &raquo;</a>", href(page + 1));
    }
    out += "</nav>";
    out
}

const TIME_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[month repr:short] [day padding:none], [year] [hour]:[minute]");

pub fn page_time(unix: i64) -> String {
    OffsetDateTime::from_unix_timestamp(unix)
        .ok()
        .and_then(|t| t.format(TIME_FORMAT).ok())
        .unwrap_or_default()
}
