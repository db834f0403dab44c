//! HTML digest rendering
//!
//! Renders the body of a notification: a greeting, the number of matches
//! and a table of title, company, location, apply link and score.

use crate::output::traits::Digest;

const STYLE: &str = "\
table { border-collapse: collapse; width: 100%; margin: 20px 0; }
th, td { padding: 12px; text-align: left; border-bottom: 1px solid #ddd; }
th { background-color: #f2f2f2; }
a { color: #0066cc; text-decoration: none; }";

/// Renders the full HTML message for one recipient
pub fn render_html(digest: &Digest, recipient_name: &str) -> String {
    let mut html = String::new();

    html.push_str("<html>\n<head>\n<style>\n");
    html.push_str(STYLE);
    html.push_str("\n</style>\n</head>\n<body>\n");
    html.push_str(&format!("<h2>Hello {},</h2>\n", escape_html(recipient_name)));
    html.push_str(&format!(
        "<p>We found {} new job matches for you:</p>\n",
        digest.matches.len()
    ));
    html.push_str(&render_table(digest));
    html.push_str("<p>Best regards,<br>Your Job Alert System</p>\n");
    html.push_str("</body>\n</html>\n");

    html
}

/// Renders the match table, one row per match in digest order
pub fn render_table(digest: &Digest) -> String {
    let mut table = String::from(
        "<table>\n<thead>\n<tr><th>title</th><th>company</th><th>location</th><th>url</th><th>match_score</th></tr>\n</thead>\n<tbody>\n",
    );

    for scored in &digest.matches {
        let record = &scored.record;
        table.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td><a href=\"{}\">Apply</a></td><td>{:.2}</td></tr>\n",
            escape_html(&record.title),
            escape_html(&record.source),
            escape_html(&record.location),
            escape_html(&record.url),
            scored.score
        ));
    }

    table.push_str("</tbody>\n</table>\n");
    table
}

/// Escapes text for use in HTML content and attribute values
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
