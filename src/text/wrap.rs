use crate::text::measure::TextMeasure;

/// Greedy word wrap.
///
/// Explicit newlines start a new line; runs of whitespace collapse to one space. A word wider than
/// `max_width` on its own is placed alone on a line and never broken.
pub fn wrap(
    text: &str,
    max_width: f64,
    font_size: f64,
    measurer: &mut dyn TextMeasure,
) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }
            let candidate = format!("{current} {word}");
            if measurer.measure(&candidate, font_size) <= max_width {
                current = candidate;
            } else {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
            }
        }
        lines.push(current);
    }
    lines
}

/// Width of the widest line.
pub fn widest_line(lines: &[String], font_size: f64, measurer: &mut dyn TextMeasure) -> f64 {
    lines
        .iter()
        .map(|l| measurer.measure(l, font_size))
        .fold(0.0, f64::max)
}

#[cfg(test)]
#[path = "../../tests/unit/text/wrap.rs"]
mod tests;
