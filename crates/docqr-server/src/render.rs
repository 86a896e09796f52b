//! HTML pages
//!
//! Plain string rendering with one inline stylesheet. Every value taken
//! from a record goes through [`escape_html`].

use docqr_core::DocumentRecord;

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; background: #f4f5f7; color: #222; }
header { background: #1f3a5f; color: #fff; padding: 1rem 2rem; display: flex; justify-content: space-between; align-items: center; }
header a { color: #fff; }
main { padding: 2rem; }
.gallery { display: grid; grid-template-columns: repeat(auto-fill, minmax(240px, 1fr)); gap: 1.5rem; }
.card { background: #fff; border-radius: 8px; padding: 1rem; box-shadow: 0 1px 3px rgba(0,0,0,.15); text-align: center; }
.card h3 { font-size: 1rem; word-break: break-all; }
.card img { width: 180px; height: 180px; }
.meta, .hint { color: #666; font-size: .85rem; }
.button { display: inline-block; margin-top: .5rem; padding: .5rem 1rem; background: #1f3a5f; color: #fff; border-radius: 4px; text-decoration: none; border: 0; }
.empty, .notice { text-align: center; color: #666; padding: 3rem; }
"#;

/// One gallery entry and its rendered code, if any
#[derive(Debug, Clone, Copy)]
pub struct GalleryItem<'a> {
    pub record: &'a DocumentRecord,
    pub code: Option<&'a str>,
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

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
         <header><h1>{title}</h1><nav><a href=\"/api/pdf/list\">Library</a> | \
         <a href=\"/api/pdf/upload\">Upload</a></nav></header>\n<main>\n{body}\n</main>\n</body>\n</html>\n",
        title = escape_html(title),
    )
}

fn card(item: &GalleryItem<'_>) -> String {
    let record = item.record;
    let id = escape_html(record.id.as_str());
    let name = escape_html(&record.original_file_name);
    let uploaded = record.uploaded_at.format("%Y-%m-%d %H:%M UTC");

    let code = match item.code {
        Some(code) => format!(
            "<img src=\"{}\" alt=\"Download code for {name}\">\n<p class=\"hint\">Scan to download</p>",
            escape_html(code)
        ),
        None => "<p class=\"hint\">Code not available</p>".to_string(),
    };

    format!(
        "<div class=\"card\">\n<h3>{name}</h3>\n<p class=\"meta\">Uploaded on: {uploaded}</p>\n{code}\n\
         <a class=\"button\" href=\"/api/pdf/download/{id}\">Download</a>\n</div>"
    )
}

/// Document gallery, in the order given
pub fn gallery_page(items: &[GalleryItem<'_>]) -> String {
    if items.is_empty() {
        return page(
            "PDF Library",
            "<p class=\"empty\">No PDF documents available</p>",
        );
    }

    let cards: Vec<String> = items.iter().map(card).collect();
    page(
        "PDF Library",
        &format!("<div class=\"gallery\">\n{}\n</div>", cards.join("\n")),
    )
}

pub fn upload_page(max_upload_bytes: usize) -> String {
    let limit_mib = max_upload_bytes as f64 / (1024.0 * 1024.0);
    page(
        "Upload PDF",
        &format!(
            "<form action=\"/api/pdf/upload\" method=\"post\" enctype=\"multipart/form-data\">\n\
             <input type=\"file\" name=\"pdf\" accept=\"application/pdf\" required>\n\
             <button class=\"button\" type=\"submit\">Upload</button>\n\
             <p class=\"hint\">PDF files up to {limit_mib:.1} MiB</p>\n</form>"
        ),
    )
}

/// Shown instead of the gallery while the database is unreachable
pub fn unavailable_page() -> String {
    page(
        "PDF Library",
        &format!(
            "<div class=\"notice\">\n<h2>Database connection unavailable</h2>\n<p>{}</p>\n</div>",
            escape_html(crate::error::UNAVAILABLE_MESSAGE)
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use docqr_core::DocumentId;

    fn record(name: &str) -> DocumentRecord {
        DocumentRecord {
            id: DocumentId::new("abc123"),
            stored_file_name: format!("1-{name}"),
            original_file_name: name.to_string(),
            uploaded_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap(),
            code_data: None,
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_empty_gallery() {
        assert!(gallery_page(&[]).contains("No PDF documents available"));
    }

    #[test]
    fn test_gallery_card() {
        let record = record("guide.pdf");
        let html = gallery_page(&[GalleryItem {
            record: &record,
            code: Some("data:image/png;base64,AAAA"),
        }]);

        assert!(html.contains("<h3>guide.pdf</h3>"));
        assert!(html.contains("Uploaded on: 2024-03-01 12:30 UTC"));
        assert!(html.contains("src=\"data:image/png;base64,AAAA\""));
        assert!(html.contains("Scan to download"));
        assert!(html.contains("href=\"/api/pdf/download/abc123\""));
    }

    #[test]
    fn test_file_names_are_escaped() {
        let record = record("<script>alert(1)</script>.pdf");
        let html = gallery_page(&[GalleryItem {
            record: &record,
            code: None,
        }]);

        assert!(!html.contains("<script>"));
        assert!(html.contains("Code not available"));
    }

    #[test]
    fn test_upload_page_mentions_limit() {
        let html = upload_page(10 * 1024 * 1024);
        assert!(html.contains("name=\"pdf\""));
        assert!(html.contains("10.0 MiB"));
    }
}
