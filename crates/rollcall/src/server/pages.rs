//! Minimal HTML for the organizer's session form and the page-mode
//! submission form.

use std::fmt::Write;

use crate::record::SessionKey;

/// Outcome banner shown above the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Whether the outcome was a success.
    pub success: bool,
    /// Text of the banner.
    pub text: String,
}

impl Notice {
    /// A success banner.
    #[must_use]
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            success: true,
            text: text.into(),
        }
    }

    /// A failure banner.
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            success: false,
            text: text.into(),
        }
    }
}

/// Escape text for use in HTML content and attribute values.
#[must_use]
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

/// Render the organizer's form that opens a session with `POST /`.
#[must_use]
pub fn session_form() -> String {
    String::from(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Open session</title></head>\n<body>\n\
         <h1>Open an attendance session</h1>\n\
         <form method=\"post\" action=\"/\">\n\
         <label>Lecture <input type=\"text\" name=\"lecture_name\" required></label>\n\
         <label>Date <input type=\"date\" name=\"date\" required></label>\n\
         <label>Time <input type=\"time\" name=\"time\" required></label>\n\
         <button type=\"submit\">Open</button>\n\
         </form>\n</body>\n</html>\n",
    )
}

/// Render the submission form for `session`, pre-filled and with an
/// optional outcome banner.
#[must_use]
pub fn attendance_form(session: &SessionKey, notice: Option<&Notice>) -> String {
    let mut page = String::from(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Attendance</title></head>\n<body>\n",
    );

    let _ = writeln!(
        page,
        "<h1>{}</h1>\n<p>{} {}</p>",
        escape_html(&session.lecture_name),
        escape_html(&session.date),
        escape_html(&session.time)
    );

    if let Some(notice) = notice {
        let class = if notice.success { "success" } else { "error" };
        let _ = writeln!(
            page,
            "<p class=\"{class}\">{}</p>",
            escape_html(&notice.text)
        );
    }

    page.push_str(
        "<form method=\"post\" action=\"/attendance-form\" enctype=\"multipart/form-data\">\n",
    );
    for (name, value) in [
        ("lecture_name", &session.lecture_name),
        ("date", &session.date),
        ("time", &session.time),
    ] {
        let _ = writeln!(
            page,
            "<input type=\"hidden\" name=\"{name}\" value=\"{}\">",
            escape_html(value)
        );
    }
    page.push_str(
        "<label>Name <input type=\"text\" name=\"name\" required></label>\n\
         <label>Roll number <input type=\"text\" name=\"roll_no\" required></label>\n\
         <label>Photo <input type=\"file\" name=\"photo\" accept=\".png,.jpg,.jpeg\" required></label>\n\
         <button type=\"submit\">Submit</button>\n\
         </form>\n</body>\n</html>\n",
    );

    page
}
