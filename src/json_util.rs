use serde_json::Number;

/// How many bytes of context to show on each side of a JSON syntax error.
const SNIPPET_RADIUS: usize = 50;

pub fn improve_json_error(err: &serde_json::Error, json_string: &str) -> String {
    if err.line() != 1 {
        // Multi-line payloads already point at a useful line
        return err.to_string();
    }

    let col = err.column();
    let start = floor_char_boundary(json_string, col.saturating_sub(SNIPPET_RADIUS));
    let end = floor_char_boundary(json_string, (col + SNIPPET_RADIUS).min(json_string.len()));
    let start_ell = if start == 0 { "" } else { "..." };
    let end_ell = if end == json_string.len() { "" } else { "..." };

    let snippet = &json_string[start..end];
    format!("{err} | {start_ell}{snippet}{end_ell}")
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Renders a JSON number as decimal text.
///
/// Integral values never get a decimal point, even when they were written as `1.0`.
pub fn render_number(number: &Number) -> String {
    if let Some(int) = number.as_i64() {
        return int.to_string();
    }
    if let Some(uint) = number.as_u64() {
        return uint.to_string();
    }
    match number.as_f64() {
        #[allow(clippy::cast_possible_truncation)]
        Some(float) if float.fract() == 0.0 && float.abs() < 9.0e15 => (float as i64).to_string(),
        Some(float) => float.to_string(),
        None => number.to_string(),
    }
}
