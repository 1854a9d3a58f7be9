use serde_json::Value;

use intrinsic_core::export::html_snapshot;

use super::valuation_parts;

/// Print a valuation as a printable HTML page.
///
/// Non-valuation results fall back to a single field/value table.
pub fn print_html(value: &Value) {
    if let Some((inputs, outputs)) = valuation_parts(value) {
        print!("{}", html_snapshot(&inputs, &outputs));
        return;
    }

    let body = value.get("result").unwrap_or(value);
    println!("<!DOCTYPE html>\n<html>\n<body>\n<table>");
    if let Value::Object(map) = body {
        for (key, val) in map {
            let text = match val {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            println!("<tr><th>{}</th><td>{}</td></tr>", escape(key), escape(&text));
        }
    } else {
        println!("<tr><td>{}</td></tr>", escape(&body.to_string()));
    }
    println!("</table>\n</body>\n</html>");
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
