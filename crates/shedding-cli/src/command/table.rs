//! Fixed-width table helpers shared by the commands

use std::io::{self, Write};

/// Formats an optional number, `N/A` when absent.
pub(super) fn opt(value: Option<f64>, precision: usize) -> String {
    value.map_or("N/A".to_string(), |v| format!("{v:.precision$}"))
}

/// Formats an optional string, `N/A` when absent.
pub(super) fn opt_str(value: Option<&str>) -> &str {
    value.unwrap_or("N/A")
}

/// Writes a header line followed by a dashed separator of the same width.
pub(super) fn header(out: &mut impl Write, header: &str) -> io::Result<()> {
    writeln!(out, "  {header}")?;
    writeln!(out, "  {}", "-".repeat(header.trim_end().len()))
}

pub(super) fn title(out: &mut impl Write, title: &str) -> io::Result<()> {
    writeln!(out, "{title}")?;
    writeln!(out, "{}", "=".repeat(title.len()))?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_separator_width() {
        let mut buf = vec![];
        header(&mut buf, &format!("{:<6} {:>8}", "Time", "N")).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "  Time          N");
        assert_eq!(lines[1], format!("  {}", "-".repeat(15)));
    }

    #[test]
    fn test_opt() {
        assert_eq!(opt(Some(1.26), 1), "1.3");
        assert_eq!(opt(None, 3), "N/A");
    }
}
