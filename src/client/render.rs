use pulldown_cmark::{html, Event, Options, Parser};
use pulldown_cmark_escape::escape_html;

use crate::models::{BookingDetails, Message, MessageContent, Sender};

/// Labels for the booking details block, always shown in this order.
pub const DETAIL_LABELS: [&str; 4] = ["Service ID", "Service", "Technician", "Date/Time"];

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    // writing into a String is infallible
    let _ = escape_html(&mut out, text);
    out
}

/// CommonMark to HTML. Raw HTML in the source (block or inline) is emitted
/// as escaped text, never as markup.
pub fn markdown_to_html(text: &str) -> String {
    let parser = Parser::new_ext(text, Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES).map(
        |event| match event {
            Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
            other => other,
        },
    );
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

/// Label/value rows for a booking. Missing fields render as empty values.
pub fn detail_rows(details: &BookingDetails) -> [(&'static str, String); 4] {
    [
        (DETAIL_LABELS[0], details.id.map(|id| id.to_string()).unwrap_or_default()),
        (DETAIL_LABELS[1], details.service.clone().unwrap_or_default()),
        (DETAIL_LABELS[2], details.technician.clone().unwrap_or_default()),
        (DETAIL_LABELS[3], details.datetime.clone().unwrap_or_default()),
    ]
}

fn sender_class(sender: Sender) -> &'static str {
    match sender {
        Sender::User => "user",
        Sender::System => "system",
    }
}

/// Renders one log entry as an HTML fragment.
///
/// Markdown is interpreted only when `supports_markdown` is set; otherwise it
/// is shown as escaped literal text.
pub fn render_html(message: &Message, supports_markdown: bool) -> String {
    let sender = sender_class(message.sender);

    match &message.content {
        MessageContent::Text { text } => {
            format!(r#"<div class="message {sender}"><p>{}</p></div>"#, escape(text))
        }
        MessageContent::Markdown { text } if supports_markdown => {
            format!(
                r#"<div class="message {sender} markdown">{}</div>"#,
                markdown_to_html(text)
            )
        }
        MessageContent::Markdown { text } => {
            format!(r#"<div class="message {sender}"><p>{}</p></div>"#, escape(text))
        }
        MessageContent::BookingDetails { text, details } => {
            let mut out = format!(r#"<div class="message {sender} booking-details">"#);
            if let Some(text) = text.as_deref().filter(|t| !t.is_empty()) {
                out.push_str(&format!("<p>{}</p>", escape(text)));
            }
            out.push_str("<dl>");
            for (label, value) in detail_rows(details) {
                out.push_str(&format!("<dt>{label}</dt><dd>{}</dd>", escape(&value)));
            }
            out.push_str("</dl></div>");
            out
        }
        MessageContent::Error { text } => {
            format!(
                r#"<div class="message {sender} error"><p class="error-text">{}</p></div>"#,
                escape(text)
            )
        }
    }
}

/// Plain-text rendering for terminals.
pub fn render_plain(content: &MessageContent) -> String {
    match content {
        MessageContent::Text { text } | MessageContent::Markdown { text } => text.clone(),
        MessageContent::BookingDetails { text, details } => {
            let mut lines = Vec::new();
            if let Some(text) = text.as_deref().filter(|t| !t.is_empty()) {
                lines.push(text.to_string());
            }
            for (label, value) in detail_rows(details) {
                lines.push(format!("{label}: {value}"));
            }
            lines.join("\n")
        }
        MessageContent::Error { text } => format!("Error: {text}"),
    }
}
