//! Tweet display-text rendering: escape everything, then turn hashtags and
//! mentions into anchors.
//!
//! The output is finished HTML. Callers embed it directly and must not
//! escape it again.

use std::sync::LazyLock;

use regex::{Captures, Regex};

pub(crate) static HASHTAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#\w+").expect("hashtag pattern"));
static MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@\w+").expect("mention pattern"));
static HANDLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w{1,30}$").expect("handle pattern"));
static IMAGE_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://[\w.~:/?#\[\]@!$&'()*+,;=%-]+$").expect("image url pattern")
});

/// Usernames double as path segments of the profile route, so the same
/// rule decides registration validity and mention resolution.
pub fn is_valid_handle(name: &str) -> bool {
    HANDLE_RE.is_match(name)
}

/// Path of the profile page for `username`, or `None` when no such route
/// exists (the username does not fit the route's segment rule).
pub fn profile_path(username: &str) -> Option<String> {
    is_valid_handle(username).then(|| format!("/profile/{username}"))
}

/// Image references are plain http(s) URLs over the unreserved and
/// reserved URL characters only. Quotes, whitespace and braces never
/// pass, so a stored reference can sit inside a src attribute as-is.
pub fn is_valid_image_url(url: &str) -> bool {
    IMAGE_URL_RE.is_match(url)
}

/// Plain user text made safe for element content. Braces are encoded
/// along with the usual suspects so rendered text can never collide with
/// an unfilled template placeholder.
pub fn safe_text(raw: &str) -> String {
    encode_braces(&html_escape::encode_text(raw))
}

/// User text made safe for a double-quoted attribute value.
pub fn safe_attr(raw: &str) -> String {
    encode_braces(&html_escape::encode_double_quoted_attribute(raw))
}

fn encode_braces(escaped: &str) -> String {
    escaped.replace('{', "&#123;").replace('}', "&#125;")
}

/// Escapes `raw` in full, then runs two independent substitution passes:
/// `#\w+` becomes a feed-search anchor (`#` percent-encoded so it stays a
/// query value), and `@\w+` becomes a profile anchor when the handle
/// resolves. An unresolvable mention is left as plain escaped text; this
/// never fails.
pub fn render_display_text(raw: &str) -> String {
    let escaped = html_escape::encode_text(raw);

    let tagged = HASHTAG_RE.replace_all(&escaped, |caps: &Captures| {
        let hashtag = &caps[0];
        format!(
            "<a href=\"/?q={}\">{hashtag}</a>",
            urlencoding::encode(hashtag)
        )
    });

    let mentioned = MENTION_RE.replace_all(&tagged, |caps: &Captures| {
        let mention = &caps[0];
        match profile_path(&mention[1..]) {
            Some(path) => format!("<a href=\"{path}\">{mention}</a>"),
            None => mention.to_string(),
        }
    });

    // Last so the entity's `#123` is not taken for a hashtag.
    encode_braces(&mentioned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_yields_empty_output() {
        assert_eq!(render_display_text(""), "");
    }

    #[test]
    fn plain_text_is_escaped_but_unchanged() {
        assert_eq!(render_display_text("just words"), "just words");
        assert_eq!(
            render_display_text("<script>alert(1)</script>"),
            "&lt;script&gt;alert(1)&lt;/script&gt;"
        );
    }

    #[test]
    fn hashtag_becomes_search_anchor_with_encoded_query() {
        let html = render_display_text("hello #Rust world");
        assert_eq!(
            html,
            "hello <a href=\"/?q=%23Rust\">#Rust</a> world"
        );
    }

    #[test]
    fn every_occurrence_gets_its_own_anchor() {
        let html = render_display_text("#a and #a");
        assert_eq!(html.matches("<a href=\"/?q=%23a\">#a</a>").count(), 2);
    }

    #[test]
    fn mention_links_to_profile() {
        let html = render_display_text("hi @bob");
        assert_eq!(html, "hi <a href=\"/profile/bob\">@bob</a>");
    }

    #[test]
    fn unresolvable_mention_stays_plain() {
        // 31 word characters: no profile route takes a segment that long.
        let long = "a".repeat(31);
        let html = render_display_text(&format!("hi @{long}"));
        assert_eq!(html, format!("hi @{long}"));
    }

    #[test]
    fn hash_at_collision_matches_disjoint_substrings() {
        let html = render_display_text("#@tag");
        assert_eq!(html, "#<a href=\"/profile/tag\">@tag</a>");

        let html = render_display_text("@#tag");
        assert_eq!(html, "@<a href=\"/?q=%23tag\">#tag</a>");
    }

    #[test]
    fn markup_in_tweet_cannot_smuggle_attributes() {
        let html = render_display_text("\"><img src=x> #x");
        assert!(html.starts_with("\"&gt;&lt;img src=x&gt; "));
        assert!(html.ends_with("<a href=\"/?q=%23x\">#x</a>"));
    }

    #[test]
    fn ampersand_entities_do_not_grow_anchors() {
        // `&` escapes to `&amp;`; neither pass may match inside it.
        let html = render_display_text("salt & pepper");
        assert_eq!(html, "salt &amp; pepper");
    }

    #[test]
    fn case_is_preserved_in_anchor_text_and_query() {
        let html = render_display_text("#RustLang");
        assert!(html.contains(">#RustLang</a>"));
        assert!(html.contains("/?q=%23RustLang"));
    }

    #[test]
    fn image_urls_are_plain_http_urls() {
        assert!(is_valid_image_url("https://example.com/cat.jpg"));
        assert!(is_valid_image_url("http://cdn.example.com/a/b.png?v=2&s=64"));
        assert!(!is_valid_image_url("ftp://example.com/cat.jpg"));
        assert!(!is_valid_image_url("javascript:alert(1)"));
        assert!(!is_valid_image_url("https://example.com/\"onerror=\"x"));
        assert!(!is_valid_image_url("https://example.com/{brace}"));
        assert!(!is_valid_image_url("https://example.com/a b"));
        assert!(!is_valid_image_url("https://"));
    }

    #[test]
    fn braces_render_as_entities() {
        assert_eq!(
            render_display_text("a {placeholder} b"),
            "a &#123;placeholder&#125; b"
        );
        assert_eq!(safe_text("{nav}"), "&#123;nav&#125;");
        assert_eq!(safe_attr("\"{q}\""), "&quot;&#123;q&#125;&quot;");
    }

    #[test]
    fn profile_path_rejects_what_the_route_rejects() {
        assert_eq!(profile_path("bob"), Some("/profile/bob".to_string()));
        assert_eq!(profile_path(&"x".repeat(31)), None);
        assert_eq!(profile_path(""), None);
        assert_eq!(profile_path("no spaces"), None);
    }
}
