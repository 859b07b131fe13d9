//! HTML card rendering for push messages

/// Escape text for inclusion in HTML element content
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Render the notification card
///
/// Icon on top, title as heading, body paragraph, and a small signature line.
pub fn render_card(icon: &str, title: &str, body: &str, signature: &str) -> String {
    format!(
        concat!(
            "<div style=\"font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; ",
            "padding: 15px; background: linear-gradient(135deg, #fff5f5 0%, #fff8e1 100%); border-radius: 12px;\">",
            "<div style=\"font-size: 24px; margin-bottom: 10px;\">{icon}</div>",
            "<h2 style=\"color: #e65100; margin: 0 0 10px 0; font-size: 18px;\">{title}</h2>",
            "<p style=\"color: #333; margin: 0; font-size: 14px; line-height: 1.6;\">{body}</p>",
            "<p style=\"color: #999; font-size: 12px; margin-top: 15px;\">{signature}</p>",
            "</div>"
        ),
        icon = escape_html(icon),
        title = escape_html(title),
        body = escape_html(body),
        signature = escape_html(signature),
    )
}
