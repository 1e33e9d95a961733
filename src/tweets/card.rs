use crate::{feed::TweetCard, include_res, linkify, res};

/// One tweet as the feed and detail pages show it. Edit and delete
/// links appear only for the author.
pub(crate) fn tweet_card_html(card: &TweetCard, viewer: Option<&str>) -> String {
    let edited = if card.updated_at > card.created_at {
        " <span class=\"edited\">(edited)</span>"
    } else {
        ""
    };
    let image = match &card.image {
        Some(url) => format!(
            "<img class=\"attachment\" src=\"{}\" alt=\"\">",
            linkify::safe_attr(url)
        ),
        None => String::new(),
    };
    let owner_links = if viewer == Some(card.user_id.as_str()) {
        format!(
            "<a href=\"/{id}/edit\">edit</a> <a href=\"/{id}/delete\">delete</a>",
            id = card.id
        )
    } else {
        String::new()
    };

    include_res!(str, "/pages/tweet_card.html")
        .replace("{id}", &card.id)
        .replace("{username}", &card.username)
        .replace("{time}", &res::page_time(card.created_at))
        .replace("{edited}", edited)
        .replace("{liked_class}", if card.liked { " liked" } else { "" })
        .replace("{like_count}", &card.like_count.to_string())
        .replace("{comment_count}", &card.comment_count.to_string())
        .replace("{owner_links}", &owner_links)
        .replace("{image}", &image)
        .replace("{text_html}", &linkify::render_display_text(&card.text))
}

pub(crate) fn tweet_list_html(items: &[TweetCard], viewer: Option<&str>) -> String {
    if items.is_empty() {
        return "<p class=\"empty\">Nothing here yet.</p>".to_string();
    }
    let mut out = String::new();
    for card in items {
        out += &tweet_card_html(card, viewer);
    }
    out
}

pub(crate) fn comment_html(username: &str, created_at: i64, text: &str) -> String {
    include_res!(str, "/pages/comment.html")
        .replace("{username}", username)
        .replace("{time}", &res::page_time(created_at))
        .replace("{text_html}", &linkify::safe_text(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> TweetCard {
        TweetCard {
            id: "t1".to_string(),
            user_id: "u1".to_string(),
            username: "alice".to_string(),
            text: "hello #Rust".to_string(),
            image: None,
            created_at: 100,
            updated_at: 100,
            like_count: 2,
            comment_count: 1,
            liked: true,
        }
    }

    #[test]
    fn author_sees_owner_links_others_do_not() {
        let html = tweet_card_html(&card(), Some("u1"));
        assert!(html.contains("/t1/edit"));
        assert!(html.contains("/t1/delete"));

        let html = tweet_card_html(&card(), Some("u2"));
        assert!(!html.contains("/t1/edit"));

        let html = tweet_card_html(&card(), None);
        assert!(!html.contains("/t1/edit"));
    }

    #[test]
    fn liked_state_toggles_the_button_class() {
        let html = tweet_card_html(&card(), None);
        assert!(html.contains("class=\"js-toggle like liked\""));

        let mut unliked = card();
        unliked.liked = false;
        let html = tweet_card_html(&unliked, None);
        assert!(html.contains("class=\"js-toggle like\""));
    }

    #[test]
    fn edited_marker_appears_only_after_an_update() {
        assert!(!tweet_card_html(&card(), None).contains("(edited)"));

        let mut touched = card();
        touched.updated_at = 200;
        assert!(tweet_card_html(&touched, None).contains("(edited)"));
    }

    #[test]
    fn text_is_linkified_and_placeholders_all_filled() {
        let html = tweet_card_html(&card(), Some("u1"));
        assert!(html.contains("<a href=\"/?q=%23Rust\">#Rust</a>"));
        assert!(!html.contains('{'), "unfilled placeholder in {html}");
    }

    #[test]
    fn hostile_text_cannot_reopen_placeholders() {
        let mut hostile = card();
        hostile.text = "{id} <script>".to_string();
        let html = tweet_card_html(&hostile, None);
        assert!(html.contains("&#123;id&#125;"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn comment_renders_plain_escaped_text() {
        let html = comment_html("bob", 100, "<b>hi</b>");
        assert!(html.contains("/profile/bob"));
        assert!(html.contains("&lt;b&gt;hi&lt;/b&gt;"));
    }
}
