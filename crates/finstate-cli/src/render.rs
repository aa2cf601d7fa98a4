//! Plain text rendering of report tables.

use finstate::Table;

/// Terminal column width of `c`; Hangul and other wide CJK characters take two.
fn char_width(c: char) -> usize {
    match c {
        '\u{1100}'..='\u{115F}'
        | '\u{2E80}'..='\u{A4CF}'
        | '\u{AC00}'..='\u{D7A3}'
        | '\u{F900}'..='\u{FAFF}'
        | '\u{FF00}'..='\u{FF60}' => 2,
        _ => 1,
    }
}

fn display_width(s: &str) -> usize {
    s.chars().map(char_width).sum()
}

fn pad_left(s: &str, width: usize) -> String {
    let fill = width.saturating_sub(display_width(s));
    format!("{}{}", " ".repeat(fill), s)
}

/// Renders `table` with one line per period and right-aligned columns.
pub(crate) fn render_table(table: &Table) -> String {
    let mut header = vec!["period".to_string()];
    header.extend(table.columns().iter().cloned());

    let rows: Vec<Vec<String>> = table
        .keys()
        .map(|key| {
            let mut line = vec![key.to_string()];
            line.extend(
                table
                    .columns()
                    .iter()
                    .map(|column| table.get(&key, column).map(ToString::to_string).unwrap_or_default()),
            );
            line
        })
        .collect();

    let widths: Vec<usize> = (0..header.len())
        .map(|i| {
            rows.iter()
                .map(|row| display_width(&row[i]))
                .chain(std::iter::once(display_width(&header[i])))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    for line in std::iter::once(&header).chain(rows.iter()) {
        let cells: Vec<String> = line
            .iter()
            .zip(&widths)
            .map(|(cell, width)| pad_left(cell, *width))
            .collect();
        out.push_str(cells.join("  ").trim_end());
        out.push('\n');
    }
    out
}
