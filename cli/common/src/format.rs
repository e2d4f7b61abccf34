//! Formatting utilities for CLI output.

/// Format a large number with commas for readability.
///
/// # Examples
///
/// ```
/// use cs_cli_common::format_number;
///
/// assert_eq!(format_number(0), "0");
/// assert_eq!(format_number(1234), "1,234");
/// assert_eq!(format_number(1234567), "1,234,567");
/// ```
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();

    for (count, c) in s.chars().rev().enumerate() {
        if count > 0 && count % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    result.chars().rev().collect()
}

/// Render a boxed, left-aligned text table.
///
/// # Examples
///
/// ```
/// use cs_cli_common::render_table;
///
/// let table = render_table(&["Service", "Action"], &[vec!["s3".to_string(), "GetObject".to_string()]]);
///
/// assert_eq!(
///     table,
///     "+---------+-----------+\n\
///      | Service | Action    |\n\
///      +---------+-----------+\n\
///      | s3      | GetObject |\n\
///      +---------+-----------+\n"
/// );
/// ```
pub fn render_table<S: AsRef<str>>(headers: &[&str], rows: &[Vec<S>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.as_ref().chars().count());
        }
    }

    let border: String = widths
        .iter()
        .map(|w| format!("+{}", "-".repeat(w + 2)))
        .collect::<String>()
        + "+\n";

    let line = |cells: Vec<&str>| -> String {
        let mut out = String::new();
        for (i, width) in widths.iter().enumerate() {
            let cell = cells.get(i).copied().unwrap_or("");
            let pad = width - cell.chars().count();
            out.push_str(&format!("| {}{} ", cell, " ".repeat(pad)));
        }
        out.push_str("|\n");
        out
    };

    let mut table = border.clone();
    table.push_str(&line(headers.to_vec()));
    table.push_str(&border);
    for row in rows {
        table.push_str(&line(row.iter().map(|c| c.as_ref()).collect()));
    }
    table.push_str(&border);
    table
}

/// Render values as a numbered two-column table, sorted and without
/// duplicates.
pub fn render_numbered(heading: &str, values: &[String]) -> String {
    let mut values: Vec<&str> = values.iter().map(String::as_str).collect();
    values.sort_unstable();
    values.dedup();

    let rows: Vec<Vec<String>> = values
        .iter()
        .enumerate()
        .map(|(i, value)| vec![(i + 1).to_string(), value.to_string()])
        .collect();

    render_table(&["No.", heading], &rows)
}
