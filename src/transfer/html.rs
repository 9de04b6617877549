use chrono::{DateTime, Local};

use super::CaseDraft;

/// Escape text for HTML element content and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
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

pub fn render(title: &str, drafts: &[CaseDraft]) -> String {
    render_at(title, drafts, Local::now())
}

/// Render a standalone HTML page listing the cases.
pub fn render_at(title: &str, drafts: &[CaseDraft], generated: DateTime<Local>) -> String {
    let mut rows = String::new();
    for (i, draft) in drafts.iter().enumerate() {
        let assertions = draft
            .assertions
            .iter()
            .map(|a| escape(&a.to_string()))
            .collect::<Vec<_>>()
            .join("<br>");
        rows.push_str(&format!(
            "      <tr>\n        <td>{}</td>\n        <td>{}</td>\n        <td><span class=\"method\">{}</span></td>\n        <td><code>{}</code></td>\n        <td>{}</td>\n        <td>{}</td>\n        <td>{}</td>\n      </tr>\n",
            i + 1,
            escape(&draft.name),
            escape(&draft.method),
            escape(&draft.path),
            escape(draft.description.as_deref().unwrap_or("")),
            escape(&draft.tags.join(", ")),
            assertions,
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{title}</title>
  <style>
    body {{ font-family: -apple-system, "Segoe UI", Roboto, sans-serif; margin: 2rem; color: #222; }}
    table {{ border-collapse: collapse; width: 100%; }}
    th, td {{ border: 1px solid #ddd; padding: 6px 10px; text-align: left; vertical-align: top; }}
    th {{ background: #f5f5f5; }}
    .method {{ font-weight: bold; color: #1677ff; }}
    .meta {{ color: #888; font-size: 0.9em; }}
  </style>
</head>
<body>
  <h1>{title}</h1>
  <p class="meta">{count} test case(s), exported {date}</p>
  <table>
    <thead>
      <tr><th>#</th><th>Name</th><th>Method</th><th>Path</th><th>Description</th><th>Tags</th><th>Assertions</th></tr>
    </thead>
    <tbody>
{rows}    </tbody>
  </table>
</body>
</html>
"#,
        title = escape(title),
        count = drafts.len(),
        date = generated.format("%Y-%m-%d %H:%M:%S"),
        rows = rows,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertions::Assertion;
    use chrono::TimeZone;

    #[test]
    fn test_escape() {
        assert_eq!(escape("<a href=\"x\">&'</a>"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;&lt;/a&gt;");
    }

    #[test]
    fn test_render_lists_cases_escaped() {
        let mut draft = CaseDraft::new("GET", "/search?q=<script>");
        draft.name = "Search <b>bold</b>".into();
        draft.assertions.push(Assertion::StatusCode { expected: 200 });
        let generated = Local.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();

        let html = render_at("Shop & Co", &[draft], generated);
        assert!(html.contains("<title>Shop &amp; Co</title>"));
        assert!(html.contains("Search &lt;b&gt;bold&lt;/b&gt;"));
        assert!(html.contains("/search?q=&lt;script&gt;"));
        assert!(html.contains("status == 200"));
        assert!(html.contains("1 test case(s), exported 2026-03-01 09:30:00"));
        assert!(!html.contains("<script>"));
    }
}
