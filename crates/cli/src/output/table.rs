/// Minimal aligned-column table for human output. Column widths ignore
/// ANSI color codes well enough for the short values printed here.
pub struct Table {
    headers: Vec<&'static str>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<&'static str>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn print(&self) {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.len()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(visible_len(cell));
                }
            }
        }

        let header_line: Vec<String> = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, h)| format!("{h:<w$}", w = widths[i]))
            .collect();
        println!("{}", header_line.join("  "));

        for row in &self.rows {
            let line: Vec<String> = row
                .iter()
                .enumerate()
                .map(|(i, cell)| {
                    let pad = widths.get(i).copied().unwrap_or(0).saturating_sub(visible_len(cell));
                    format!("{cell}{}", " ".repeat(pad))
                })
                .collect();
            println!("{}", line.join("  "));
        }
    }
}

fn visible_len(s: &str) -> usize {
    let mut len = 0;
    let mut in_escape = false;
    for c in s.chars() {
        if in_escape {
            if c == 'm' {
                in_escape = false;
            }
        } else if c == '\u{1b}' {
            in_escape = true;
        } else {
            len += 1;
        }
    }
    len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visible_len_ignores_ansi() {
        assert_eq!(visible_len("plain"), 5);
        assert_eq!(visible_len("\u{1b}[32mgreen\u{1b}[0m"), 5);
    }

    #[test]
    fn table_accepts_rows() {
        let mut t = Table::new(vec!["A", "LONGER"]);
        t.add_row(vec!["x".into(), "y".into()]);
        t.add_row(vec!["wide-cell".into(), "z".into()]);
        assert_eq!(t.rows.len(), 2);
        t.print();
    }
}
