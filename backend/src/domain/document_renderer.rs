//! Document rendering collaborator.
//!
//! The notifier hands a JSON data bag to a [`DocumentRenderer`] and gets back
//! bytes it can attach to an email or serve for download. The built-in
//! [`HtmlDocumentRenderer`] produces a self-contained HTML page with the
//! signature images inlined; a PDF engine can be plugged in behind the same
//! trait.

use anyhow::{anyhow, Result};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// CRA carrying all three signatures
    SignedCra,
    /// Figures only, for review before signing
    MonthlyReport,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDocument {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

pub trait DocumentRenderer: Send + Sync {
    fn render(&self, kind: DocumentKind, data: &Value) -> Result<RenderedDocument>;
}

#[derive(Debug, Clone, Default)]
pub struct HtmlDocumentRenderer;

impl HtmlDocumentRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentRenderer for HtmlDocumentRenderer {
    fn render(&self, kind: DocumentKind, data: &Value) -> Result<RenderedDocument> {
        let consultant = &data["consultant"];
        let period = &data["period"];
        let summary = &data["summary"];

        let consultant_name = text(consultant, "name");
        if consultant_name.is_empty() {
            return Err(anyhow!("Document data has no consultant name"));
        }
        let month = period["month"].as_u64().ok_or_else(|| anyhow!("Document data has no month"))?;
        let year = period["year"].as_i64().ok_or_else(|| anyhow!("Document data has no year"))?;

        let title = match kind {
            DocumentKind::SignedCra => "Compte rendu d'activité signé",
            DocumentKind::MonthlyReport => "Compte rendu d'activité",
        };

        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html lang=\"fr\">\n<head>\n<meta charset=\"utf-8\">\n");
        html.push_str(&format!(
            "<title>{} - {} - {}</title>\n</head>\n<body>\n",
            title,
            escape(&consultant_name),
            escape(&text(period, "label"))
        ));
        html.push_str(&format!("<h1>{}</h1>\n", title));
        html.push_str(&format!("<h2>{}</h2>\n", escape(&text(period, "label"))));

        html.push_str("<table class=\"parties\">\n");
        push_row(&mut html, "Consultant", &consultant_name);
        push_row(&mut html, "Projet", &text(consultant, "project_name"));
        push_row(&mut html, "Client", &text(&data["client"], "name"));
        push_row(&mut html, "Manager", &text(&data["manager"], "name"));
        html.push_str("</table>\n");

        html.push_str("<table class=\"figures\">\n");
        push_row(&mut html, "Jours travaillés", &number(summary, "days_worked"));
        push_row(&mut html, "Jours week-end", &number(summary, "weekend_worked"));
        push_row(&mut html, "Jours d'absence", &number(summary, "absence_days"));
        push_row(&mut html, "Types d'absence", &text(summary, "absence_types"));
        push_row(&mut html, "Jours par type", &number(summary, "work_type_days"));
        push_row(&mut html, "Types de travail", &text(summary, "work_types"));
        html.push_str("</table>\n");

        if kind == DocumentKind::SignedCra {
            let signatures = data["signatures"]
                .as_array()
                .ok_or_else(|| anyhow!("Signed CRA data has no signatures"))?;
            html.push_str("<div class=\"signatures\">\n");
            for signature in signatures {
                let image = text(signature, "image");
                if !image.starts_with("data:image/") {
                    return Err(anyhow!("Signature image for {} is not an inline image", text(signature, "role")));
                }
                html.push_str(&format!(
                    "<figure><img alt=\"{role}\" src=\"{image}\"><figcaption>{role} - {at}</figcaption></figure>\n",
                    role = escape(&text(signature, "role")),
                    image = escape(&image),
                    at = escape(&text(signature, "signed_at")),
                ));
            }
            html.push_str("</div>\n");
        }
        html.push_str("</body>\n</html>\n");

        let slug: String = consultant_name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
            .collect();
        let prefix = match kind {
            DocumentKind::SignedCra => "cra-signe",
            DocumentKind::MonthlyReport => "cra",
        };

        Ok(RenderedDocument {
            file_name: format!("{}-{}-{:04}-{:02}.html", prefix, slug, year, month),
            content_type: "text/html; charset=utf-8",
            bytes: html.into_bytes(),
        })
    }
}

fn push_row(html: &mut String, label: &str, value: &str) {
    html.push_str(&format!("<tr><th>{}</th><td>{}</td></tr>\n", label, escape(value)));
}

fn text(value: &Value, field: &str) -> String {
    value[field].as_str().unwrap_or_default().to_string()
}

fn number(value: &Value, field: &str) -> String {
    value[field].as_f64().map(|n| format!("{}", n)).unwrap_or_default()
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
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
    use serde_json::json;

    fn data_bag() -> Value {
        json!({
            "consultant": { "id": 10, "name": "Alice <Martin>", "email": "alice@firm.test", "project_name": "Migration" },
            "client": { "id": 3, "name": "Acme", "email": "acme@test" },
            "manager": { "id": 7, "name": "Bea", "email": "bea@firm.test" },
            "period": { "month": 1, "year": 2026, "label": "janvier 2026" },
            "summary": {
                "days_worked": 18.0, "weekend_worked": 2.0, "absence_days": 1.0,
                "work_type_days": 0.0, "absence_types": "Sick", "work_types": ""
            },
            "signatures": [
                { "role": "consultant", "signer_id": 10, "signed_at": "2026-02-01T10:00:00Z", "image": "data:image/png;base64,AAAA" },
                { "role": "client", "signer_id": 3, "signed_at": "2026-02-02T10:00:00Z", "image": "data:image/png;base64,BBBB" },
                { "role": "manager", "signer_id": 7, "signed_at": "2026-02-03T10:00:00Z", "image": "data:image/png;base64,CCCC" }
            ]
        })
    }

    #[test]
    fn test_signed_cra_embeds_all_signatures() {
        let doc = HtmlDocumentRenderer::new()
            .render(DocumentKind::SignedCra, &data_bag())
            .expect("Failed to render");
        let html = String::from_utf8(doc.bytes).expect("utf8");

        assert_eq!(doc.file_name, "cra-signe-alice--martin--2026-01.html");
        assert_eq!(html.matches("<img").count(), 3);
        assert!(html.contains("Alice &lt;Martin&gt;"));
        assert!(html.contains("<td>18</td>"));
        assert!(html.contains("janvier 2026"));
    }

    #[test]
    fn test_monthly_report_has_no_signatures() {
        let mut data = data_bag();
        data["signatures"] = Value::Null;
        let doc = HtmlDocumentRenderer::new()
            .render(DocumentKind::MonthlyReport, &data)
            .expect("Failed to render");
        let html = String::from_utf8(doc.bytes).expect("utf8");
        assert!(!html.contains("<img"));
        assert!(doc.file_name.starts_with("cra-alice"));
    }

    #[test]
    fn test_rejects_incomplete_data() {
        let renderer = HtmlDocumentRenderer::new();
        assert!(renderer.render(DocumentKind::MonthlyReport, &json!({})).is_err());

        let mut data = data_bag();
        data["signatures"][0]["image"] = json!("javascript:alert(1)");
        assert!(renderer.render(DocumentKind::SignedCra, &data).is_err());
    }
}
