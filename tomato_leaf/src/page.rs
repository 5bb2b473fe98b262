//! HTML rendering for the upload page and the inspection report.

use crate::pipeline::{Finding, Inspection};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt::Write;

const TITLE: &str = "Tomato Leaf Disease Detection";

const STYLE: &str = "\
body { font-family: sans-serif; max-width: 860px; margin: 2rem auto; padding: 0 1rem; }
img { max-width: 100%; border-radius: 5px; }
.notice { padding: 10px; border-radius: 5px; }
.error { background-color: #f8d7da; color: #721c24; }
.healthy { color: green; font-weight: bold; }
.results { background-color: #f0f0f0; padding: 10px; border-radius: 5px; }
.results h2 { color: black; }
.label { background-color: #ffcccb; padding: 10px; border-radius: 5px; font-size: 20px; color: black; margin-top: 10px; }
.advice { background-color: #e0e0e0; padding: 10px; border-radius: 5px; font-size: 16px; color: black; white-space: pre-line; }";

pub const NO_DISEASES: &str = "No diseases detected.";
pub const DETECTION_FAILED: &str = "Detection failed. Please try again later.";

/// An image embedded into the page as a data URI.
pub struct EmbeddedImage<'a> {
    pub mime: &'a str,
    pub bytes: &'a [u8],
}

impl EmbeddedImage<'_> {
    fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(self.bytes))
    }
}

/// Escapes text for use inside HTML element content and attribute values.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn layout(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{TITLE}</title>\n<style>\n{STYLE}\n</style>\n</head>\n<body>\n{body}</body>\n</html>\n"
    )
}

fn upload_form() -> String {
    format!(
        "<h1>🍃 {TITLE} App</h1>\n\
         <p>This app detects tomato leaf diseases using a pre-trained model. Upload an image to get started! 📷</p>\n\
         <form action=\"/detect\" method=\"post\" enctype=\"multipart/form-data\">\n\
         <label for=\"image\">Choose an image...</label>\n\
         <input id=\"image\" name=\"image\" type=\"file\" accept=\".jpg,.jpeg,.png,image/jpeg,image/png\" required>\n\
         <button type=\"submit\">Detect</button>\n\
         </form>\n"
    )
}

pub fn index_page() -> String {
    layout(&upload_form())
}

/// Upload page with an error notice, for uploads that could not be processed.
pub fn error_page(message: &str) -> String {
    let mut body = upload_form();
    let _ = writeln!(
        body,
        "<p class=\"notice error\">{}</p>",
        escape(message)
    );
    layout(&body)
}

fn original_section(body: &mut String, original: &EmbeddedImage<'_>) {
    let _ = writeln!(
        body,
        "<h2>Uploaded Image</h2>\n<img src=\"{}\" alt=\"Uploaded Image\">",
        original.data_uri()
    );
}

/// Report for a failed detection call. The original image is still shown.
pub fn failure_page(original: &EmbeddedImage<'_>) -> String {
    let mut body = upload_form();
    original_section(&mut body, original);
    let _ = writeln!(body, "<p class=\"notice error\">{DETECTION_FAILED}</p>");
    layout(&body)
}

pub fn report_page(
    original: &EmbeddedImage<'_>,
    inspection: &Inspection,
    annotated: Option<&EmbeddedImage<'_>>,
) -> String {
    let mut body = upload_form();
    original_section(&mut body, original);

    match inspection {
        Inspection::NoDiseases => {
            let _ = writeln!(body, "<p class=\"healthy\">{NO_DISEASES} 😔</p>");
        }
        Inspection::Diseased {
            count, findings, ..
        } => {
            if let Some(annotated) = annotated {
                let _ = writeln!(
                    body,
                    "<h2>🖼️ Annotated Image with Bounding Boxes</h2>\n<img src=\"{}\" alt=\"Annotated Image\">",
                    annotated.data_uri()
                );
            }
            let _ = writeln!(body, "<h2>Number of Diseases Detected: {count}</h2>");
            findings_section(&mut body, findings);
        }
    }

    layout(&body)
}

fn findings_section(body: &mut String, findings: &[Finding]) {
    let _ = writeln!(
        body,
        "<div class=\"results\">\n<h2>🔍 Disease Detection Results</h2>"
    );
    for finding in findings {
        let _ = writeln!(
            body,
            "<div class=\"label\">DISEASE: {}</div>\n<div class=\"advice\">ADVICE: {}</div>",
            escape(&finding.label),
            escape(finding.advice)
        );
    }
    let _ = writeln!(body, "</div>");
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    const PNG_STUB: &[u8] = b"\x89PNG\r\n\x1a\n";

    fn original() -> EmbeddedImage<'static> {
        EmbeddedImage {
            mime: "image/png",
            bytes: PNG_STUB,
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape("<b>\"Leaf\" & 'Mold'</b>"),
            "&lt;b&gt;&quot;Leaf&quot; &amp; &#x27;Mold&#x27;&lt;/b&gt;"
        );
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_index_page_has_upload_form() {
        let page = index_page();
        assert!(page.contains("enctype=\"multipart/form-data\""));
        assert!(page.contains("name=\"image\""));
        assert!(page.contains(".jpeg"));
    }

    #[test]
    fn test_no_disease_report() {
        let page = report_page(&original(), &Inspection::NoDiseases, None);
        assert!(page.contains(NO_DISEASES));
        assert!(page.contains("data:image/png;base64,"));
        assert!(!page.contains("Annotated Image"));
        assert!(!page.contains("Number of Diseases Detected"));
    }

    #[test]
    fn test_report_lists_findings_in_order() {
        let inspection = Inspection::Diseased {
            annotated: RgbImage::new(1, 1),
            count: 2,
            findings: vec![
                Finding {
                    label: "LEAF MOLD".to_string(),
                    advice: "1. Ventilate.\n2. Prune.",
                },
                Finding {
                    label: "<SCRIPT>".to_string(),
                    advice: "No specific advice available.",
                },
            ],
        };
        let annotated = EmbeddedImage {
            mime: "image/jpeg",
            bytes: b"\xff\xd8\xff",
        };

        let page = report_page(&original(), &inspection, Some(&annotated));

        assert!(page.contains("Number of Diseases Detected: 2"));
        assert!(page.contains("data:image/jpeg;base64,"));
        let first = page.find("DISEASE: LEAF MOLD").unwrap();
        let second = page.find("DISEASE: &lt;SCRIPT&gt;").unwrap();
        assert!(first < second);
        assert!(page.contains("ADVICE: 1. Ventilate.\n2. Prune."));
        assert!(!page.contains("<SCRIPT>"));
    }

    #[test]
    fn test_failure_page_shows_notice_and_original() {
        let page = failure_page(&original());
        assert!(page.contains(DETECTION_FAILED));
        assert!(page.contains("Uploaded Image"));
    }

    #[test]
    fn test_error_page_escapes_message() {
        let page = error_page("bad <image>");
        assert!(page.contains("bad &lt;image&gt;"));
    }
}
