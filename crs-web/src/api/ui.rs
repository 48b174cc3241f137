//! Page rendering
//!
//! The pages are static templates with a few placeholders; everything
//! inserted is HTML-escaped.

use crate::auth::Notice;
use axum::response::Html;

const REGISTER_HTML: &str = include_str!("../../ui/register.html");
const LOGIN_HTML: &str = include_str!("../../ui/login.html");
const INDEX_HTML: &str = include_str!("../../ui/index.html");

pub fn register_page(notices: &[Notice]) -> Html<String> {
    Html(REGISTER_HTML.replace("{{NOTICES}}", &render_notices(notices)))
}

pub fn login_page(notices: &[Notice]) -> Html<String> {
    Html(LOGIN_HTML.replace("{{NOTICES}}", &render_notices(notices)))
}

/// Prediction form, with the result sentence when there is one
pub fn index_page(user: &str, notices: &[Notice], result: Option<&str>) -> Html<String> {
    let result = result
        .map(|sentence| format!(r#"<div class="result">{}</div>"#, escape_html(sentence)))
        .unwrap_or_default();

    Html(
        INDEX_HTML
            .replace("{{USER}}", &escape_html(user))
            .replace("{{NOTICES}}", &render_notices(notices))
            .replace("{{RESULT}}", &result),
    )
}

fn render_notices(notices: &[Notice]) -> String {
    notices
        .iter()
        .map(|notice| {
            format!(
                r#"<div class="notice notice-{}">{}</div>"#,
                notice.level.as_str(),
                escape_html(&notice.message)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::NoticeLevel;

    #[test]
    fn test_notices_are_escaped() {
        let notices = vec![Notice {
            level: NoticeLevel::Danger,
            message: "Invalid input: pH must be a number (got \"<b>\")".to_string(),
        }];
        let Html(page) = login_page(&notices);
        assert!(page.contains("notice-danger"));
        assert!(page.contains("&lt;b&gt;"));
        assert!(!page.contains("<b>"));
        assert!(!page.contains("{{NOTICES}}"));
    }

    #[test]
    fn test_index_with_and_without_result() {
        let Html(empty) = index_page("asha", &[], None);
        assert!(!empty.contains(r#"class="result""#));
        assert!(!empty.contains("{{RESULT}}"));

        let Html(page) = index_page("asha", &[], Some("Rice is the best crop to be cultivated right there."));
        assert!(page.contains("Rice is the best crop"));
        assert!(page.contains("asha"));
    }
}
