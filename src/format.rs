use serde_json::Value;

/// Escapes text for a double-quoted Turtle string literal.
pub fn escape_literal(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}

/// Accepts JSON integers and strings holding an optionally negative run of
/// digits. Everything else, floats included, is `None` and must be omitted
/// rather than read as zero.
pub fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => parse_integer(text),
        _ => None,
    }
}

fn parse_integer(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    let digits = trimmed.strip_prefix('-').unwrap_or(trimmed);
    if digits.is_empty() || !digits.chars().all(|ch| ch.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}

/// `chr1` -> `1`, `chrM` -> `MT`.
pub fn normalize_chromosome(chrom: &str) -> String {
    let stripped = match chrom.get(..3) {
        Some(prefix) if prefix.eq_ignore_ascii_case("chr") => &chrom[3..],
        _ => chrom,
    };
    if stripped.eq_ignore_ascii_case("m") {
        "MT".to_string()
    } else {
        stripped.to_string()
    }
}
