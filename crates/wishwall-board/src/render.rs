use chrono::{DateTime, Utc};
use wishwall_types::Entry;

use crate::board::BoardSnapshot;

/// Display-ready card. Author-supplied text is HTML-escaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
    pub id: String,
    pub name: String,
    pub message: String,
    pub posted_at: String,
}

impl CardView {
    pub fn from_entry(entry: &Entry) -> Self {
        Self {
            id: entry.id.clone(),
            name: escape_html(&entry.wisher_name),
            message: escape_html(&entry.message),
            posted_at: format_timestamp(&entry.created_at),
        }
    }
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// e.g. `Jan 5, 2026, 03:04 PM`
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format("%b %-d, %Y, %I:%M %p").to_string()
}

/// HTML fragment for a whole board: the notice, if any, then one card per entry.
pub fn render_board_html(snapshot: &BoardSnapshot) -> String {
    let mut html = String::from("<div class=\"wishes-board\">\n");
    if let Some(notice) = &snapshot.notice {
        html.push_str(&format!("  <div class=\"loading-message\">{}</div>\n", escape_html(notice)));
    }
    for entry in &snapshot.entries {
        let card = CardView::from_entry(entry);
        html.push_str(&format!(
            "  <div class=\"wish-card\" data-wish-id=\"{}\">\n    \
             <div class=\"wish-card-name\">{}</div>\n    \
             <div class=\"wish-card-message\">{}</div>\n    \
             <div class=\"wish-card-time\">{}</div>\n  </div>\n",
            escape_html(&card.id),
            card.name,
            card.message,
            card.posted_at
        ));
    }
    html.push_str("</div>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_markup_is_escaped() {
        assert_eq!(
            escape_html(r#"<script>alert("x & 'y'")</script>"#),
            "&lt;script&gt;alert(&quot;x &amp; &#39;y&#39;&quot;)&lt;/script&gt;"
        );
        assert_eq!(escape_html("plain ✨"), "plain ✨");
    }

    #[test]
    fn test_card_view() {
        let entry = Entry {
            id: "a".into(),
            message: "<b>hi</b>".into(),
            wisher_name: "Tom & Jerry".into(),
            created_at: Utc.with_ymd_and_hms(2026, 1, 5, 15, 4, 0).unwrap(),
            room_id: None,
            origin: Default::default(),
        };

        let card = CardView::from_entry(&entry);
        assert_eq!(card.name, "Tom &amp; Jerry");
        assert_eq!(card.message, "&lt;b&gt;hi&lt;/b&gt;");
        assert_eq!(card.posted_at, "Jan 5, 2026, 03:04 PM");

        let html = render_board_html(&BoardSnapshot {
            mode: wishwall_types::RoomMode::Private,
            entries: vec![entry],
            notice: None,
        });
        assert!(html.contains(r#"data-wish-id="a""#));
        assert!(html.contains("&lt;b&gt;hi&lt;/b&gt;"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn test_empty_board_html_has_notice() {
        let html = render_board_html(&BoardSnapshot {
            mode: wishwall_types::RoomMode::Private,
            entries: vec![],
            notice: Some(crate::board::EMPTY_NOTICE.into()),
        });
        assert!(html.contains("No wishes yet"));
        assert!(!html.contains("wish-card"));
    }
}
