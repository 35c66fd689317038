//! HTML for the web UI.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use html_escape::{encode_double_quoted_attribute, encode_text};

use pdf2cursive::{Deliverable, FontChoice, FontSize};

pub const TITLE: &str = "PDF to Cursive Converter";
pub const HEADING: &str = "📝 PDF to Cursive Word Doc";
pub const DOWNLOAD_LABEL: &str = "Download Word Doc";

const DESCRIPTION: &str = "Upload a PDF worksheet. It is converted to an editable Word document \
and every word is set in the font and size you pick.";

const STYLE: &str = "body{font-family:system-ui,sans-serif;max-width:42rem;margin:2rem auto;padding:0 1rem;color:#222}\
label{display:block;margin-top:1rem;font-weight:600}\
select,input{margin-top:.25rem}\
button,.download{display:inline-block;margin-top:1.5rem;padding:.5rem 1rem;border-radius:.4rem;border:0;background:#3b6fd8;color:#fff;text-decoration:none;font-size:1rem}\
.success{background:#e6f4ea;padding:.75rem;border-radius:.4rem}\
.error{background:#fde8e8;padding:.75rem;border-radius:.4rem}\
.note{background:#fff8e1;padding:.75rem;border-radius:.4rem;margin-top:1rem}";

/// What to show below the form.
pub enum Outcome<'a> {
    /// Nothing submitted yet.
    Idle,
    /// A conversion finished.
    Converted(&'a Deliverable),
    /// The submission was rejected or the pipeline failed.
    Failed(&'a str),
}

/// The whole page: the upload form and, after a submission, its outcome.
pub fn render(outcome: Outcome<'_>) -> String {
    let result = match outcome {
        Outcome::Idle => String::new(),
        Outcome::Converted(deliverable) => converted(deliverable),
        Outcome::Failed(message) => format!(
            "<p class=\"error\" role=\"alert\">{}</p>",
            encode_text(message)
        ),
    };

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
<title>{TITLE}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
<h1>{HEADING}</h1>\n<p>{DESCRIPTION}</p>\n{form}\n{result}\n</body>\n</html>\n",
        form = form(),
    )
}

fn form() -> String {
    let options: String = FontChoice::ALL
        .iter()
        .enumerate()
        .map(|(i, font)| {
            let name = encode_double_quoted_attribute(font.name());
            let selected = if i == 0 { " selected" } else { "" };
            format!("<option value=\"{name}\"{selected}>{name}</option>")
        })
        .collect();

    format!(
        "<form action=\"/convert\" method=\"post\" enctype=\"multipart/form-data\">\n\
<label for=\"file\">PDF file</label>\n\
<input id=\"file\" name=\"file\" type=\"file\" accept=\"application/pdf,.pdf\" required>\n\
<label for=\"font\">Font</label>\n\
<select id=\"font\" name=\"font\">{options}</select>\n\
<label for=\"size\">Font size (pt)</label>\n\
<input id=\"size\" name=\"size\" type=\"number\" min=\"{min}\" max=\"{max}\" value=\"{value}\" step=\"1\">\n\
<div><button type=\"submit\">Convert to Word</button></div>\n</form>",
        min = FontSize::MIN,
        max = FontSize::MAX,
        value = FontSize::DEFAULT,
    )
}

fn converted(deliverable: &Deliverable) -> String {
    format!(
        "<p class=\"success\">{message}</p>\n\
<a class=\"download\" download=\"{file}\" href=\"data:{mime};base64,{data}\">{DOWNLOAD_LABEL}</a>\n\
<p class=\"note\">{note}</p>",
        message = encode_text(&deliverable.success_message()),
        file = deliverable.file_name,
        mime = deliverable.mime_type,
        data = BASE64.encode(&deliverable.data),
        note = encode_text(&deliverable.install_note()),
    )
}
