// ============================================================
// Web — HTML Pages
// ============================================================
// The two pages the frontend serves, rendered with format!.
// Anything that came from a request (submitted values, error
// details) goes through escape_html before it is written into
// the page.

use std::collections::HashMap;

use crate::domain::schema::FeatureSchema;

const STYLE: &str = "\
body{font-family:sans-serif;max-width:40rem;margin:2rem auto;padding:0 1rem;color:#222}\
label{display:block;margin-top:.6rem}\
input{width:100%;padding:.3rem}\
button{margin-top:1rem;padding:.5rem 1.5rem}\
.result{margin-top:1.5rem;font-size:1.2rem;font-weight:bold}";

/// Escape the five characters that matter in HTML text and
/// attribute values.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&'  => out.push_str("&amp;"),
            '<'  => out.push_str("&lt;"),
            '>'  => out.push_str("&gt;"),
            '"'  => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _    => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n{body}\n</body>\n</html>\n"
    )
}

pub fn landing_page() -> String {
    layout(
        "Ames House Price Prediction",
        "<h1>Ames House Price Prediction</h1>\n\
         <p>Estimate the sale price of a house in Ames, Iowa from ten of its characteristics.</p>\n\
         <p><a href=\"/predictdata\">Go to the prediction form</a></p>",
    )
}

/// The prediction form. `values` refills the inputs after a
/// submission; `results` is shown under the form when present.
pub fn form_page(values: Option<&HashMap<String, String>>, results: Option<&str>) -> String {
    let schema = FeatureSchema::ames();

    let mut fields = String::new();
    for field in &schema.fields {
        let value = values
            .and_then(|v| v.get(&field.form_name))
            .map(|v| escape_html(v))
            .unwrap_or_default();
        fields.push_str(&format!(
            "<label for=\"{name}\">{label}</label>\n\
             <input type=\"number\" step=\"any\" id=\"{name}\" name=\"{name}\" value=\"{value}\" required>\n",
            name  = field.form_name,
            label = escape_html(&field.column),
        ));
    }

    let result = results
        .map(|r| format!("<div class=\"result\" id=\"results\">{}</div>\n", escape_html(r)))
        .unwrap_or_default();

    layout(
        "Predict a House Price",
        &format!(
            "<h1>Predict a House Price</h1>\n\
             <form id=\"predictionForm\" action=\"/predictdata\" method=\"post\">\n\
             {fields}<button type=\"submit\">Predict</button>\n</form>\n{result}\
             <p><a href=\"/\">Back</a></p>"
        ),
    )
}
