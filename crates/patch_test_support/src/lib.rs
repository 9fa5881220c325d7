use patch::{Component, Control, JsImport};
use std::rc::Rc;

pub mod fixture;

/// Splits rendered markup at command boundaries so diffs point at a single
/// command or header entry.
pub fn markup_lines(markup: &str) -> Vec<String> {
    markup.lines().map(|line| line.trim_end().to_string()).collect()
}

pub fn diff_lines(expected: &[String], actual: &[String]) -> String {
    use std::fmt::Write;

    let missing = "<missing>";
    let line = |lines: &[String], i: usize| {
        lines.get(i).map(String::as_str).unwrap_or(missing).to_string()
    };
    let max = expected.len().max(actual.len());
    let mismatch = (0..max).find(|&i| line(expected, i) != line(actual, i));

    let mut out = String::new();
    match mismatch {
        Some(i) => {
            let start = i.saturating_sub(2);
            let end = (i + 3).min(max);
            let _ = writeln!(
                &mut out,
                "first mismatch at line {} (showing {}..={}):",
                i + 1,
                start + 1,
                end
            );
            for idx in start..end {
                let marker = if idx == i { ">" } else { " " };
                let expected_line = line(expected, idx);
                let actual_line = line(actual, idx);
                let _ = writeln!(&mut out, "{marker} {:>4}  expected: {expected_line}", idx + 1);
                let _ = writeln!(&mut out, "{marker} {:>4}    actual: {actual_line}", idx + 1);
            }
        }
        None if expected.len() != actual.len() => {
            let _ = writeln!(&mut out, "prefix matched but line counts differ");
        }
        None => {}
    }
    let _ = writeln!(&mut out, "expected {} lines, actual {} lines", expected.len(), actual.len());
    out
}

/// Panics with a line diff when the two renderings differ.
pub fn assert_markup_eq(expected: &str, actual: &str) {
    if expected == actual {
        return;
    }
    let diff = diff_lines(&markup_lines(expected), &markup_lines(actual));
    panic!("rendered markup differs\n{diff}");
}

/// `<div id=..>` importing each of `scripts`.
pub fn widget(id: &str, scripts: &[&str]) -> Rc<dyn Component> {
    let mut control = Control::new("div").with_id(id);
    for src in scripts {
        control = control.with_head_element(JsImport::new(*src));
    }
    Rc::new(control)
}

/// A component with neither id nor name, so no selector can be derived.
pub fn anonymous(tag: &str) -> Rc<dyn Component> {
    Rc::new(Control::new(tag))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_points_at_first_mismatch() {
        let expected = markup_lines("<taconite>\n<show select=\"#a\"/>\n</taconite>");
        let actual = markup_lines("<taconite>\n<hide select=\"#a\"/>\n</taconite>");
        let diff = diff_lines(&expected, &actual);
        assert!(diff.starts_with("first mismatch at line 2"));
        assert!(diff.contains("actual: <hide select=\"#a\"/>"));
    }

    #[test]
    fn diff_reports_length_only_differences() {
        let expected = markup_lines("a\nb");
        let actual = markup_lines("a");
        let diff = diff_lines(&expected, &actual);
        assert!(diff.contains("line counts differ") || diff.contains("<missing>"));
    }
}
