//! Utility functions for the test harness.

use anyhow::Result;

/// Writes a colored line diff between two line sequences to a writer.
///
/// Lines only in `left` are prefixed with `-`, lines only in `right` with `+`.
pub fn write_diff(
    writer: &mut impl std::io::Write,
    indent: usize,
    left: &[String],
    right: &[String],
) -> Result<()> {
    use colored::Colorize;

    let indent_str = " ".repeat(indent);

    for d in diff::slice(left, right) {
        let formatted = match d {
            diff::Result::Left(l) => std::format!("{indent_str}- {l}").red(),
            diff::Result::Both(l, _) => std::format!("{indent_str}  {l}").bright_black(),
            diff::Result::Right(r) => std::format!("{indent_str}+ {r}").green(),
        };

        writeln!(writer, "{formatted}")?;
    }

    Ok(())
}

/// Decodes captured output for display, replacing invalid UTF-8.
pub fn display_output(output: &[u8]) -> String {
    String::from_utf8_lossy(output).to_string()
}
