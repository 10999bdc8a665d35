use crate::source::Span;
use std::sync::Arc;

/// 1-based line and column of a byte offset. Columns count unicode scalar
/// values, not bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineCol {
    pub line: usize,
    pub col: usize,
}

/// Maps byte offsets within a single source file back to lines and columns
/// and renders caret diagnostics.
#[derive(Clone, Debug)]
pub struct SourceMap {
    name: String,
    src: Arc<str>,
    line_starts: Vec<usize>,
}

impl SourceMap {
    pub fn new(name: impl Into<String>, src: impl Into<Arc<str>>) -> Self {
        let src = src.into();
        let line_starts = compute_line_starts(&src);
        Self {
            name: name.into(),
            src,
            line_starts,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn lookup(&self, offset: usize) -> LineCol {
        let offset = offset.min(self.src.len());
        let line_idx = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let line_start = self.line_starts.get(line_idx).copied().unwrap_or(0);

        let col = match self.src.get(line_start..offset) {
            Some(prefix) => prefix.chars().count() + 1,
            None => offset.saturating_sub(line_start) + 1,
        };

        LineCol {
            line: line_idx + 1,
            col,
        }
    }

    /// The text of a 1-based line, without its terminator.
    pub fn line_text(&self, line: usize) -> &str {
        let Some(&start) = self.line_starts.get(line.saturating_sub(1)) else {
            return "";
        };
        let end = self
            .line_starts
            .get(line)
            .map_or(self.src.len(), |&next| next);
        self.src[start..end].trim_end_matches(['\n', '\r'])
    }

    /// Renders a rustc-style diagnostic for `span`:
    ///
    /// ```text
    /// error[parse]: expected `)`
    ///   --> src/main.rive:3:12
    ///    |
    ///  3 | fun main( {
    ///    |           ^
    /// ```
    pub fn render_diagnostic(&self, stage: &str, message: &str, span: Span) -> String {
        let start = self.lookup(span.start);
        let end = self.lookup(span.end.max(span.start));

        let mut out = String::new();
        out.push_str(&format!("error[{stage}]: {message}\n"));
        out.push_str(&format!(
            "  --> {}:{}:{}\n",
            self.name, start.line, start.col
        ));

        let gutter = start.line.to_string().len().max(2);
        out.push_str(&format!("{:>gutter$} |\n", ""));
        out.push_str(&format!(
            "{:>gutter$} | {}\n",
            start.line,
            self.line_text(start.line)
        ));

        // Caret width: underline within the start line only.
        let width = if end.line == start.line && end.col > start.col {
            end.col - start.col
        } else {
            1
        };
        out.push_str(&format!(
            "{:>gutter$} | {}{}\n",
            "",
            " ".repeat(start.col.saturating_sub(1)),
            "^".repeat(width)
        ));

        out
    }
}

fn compute_line_starts(src: &str) -> Vec<usize> {
    let bytes = src.as_bytes();
    let mut line_starts = vec![0];
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                line_starts.push(i + 1);
                i += 1;
            }
            b'\r' => {
                if bytes.get(i + 1) == Some(&b'\n') {
                    line_starts.push(i + 2);
                    i += 2;
                } else {
                    line_starts.push(i + 1);
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }
    line_starts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_maps_lf_lines_and_columns() {
        let map = SourceMap::new("<string>", "a\nbc\ndef");
        assert_eq!(map.lookup(0), LineCol { line: 1, col: 1 });
        assert_eq!(map.lookup(2), LineCol { line: 2, col: 1 });
        assert_eq!(map.lookup(4), LineCol { line: 2, col: 3 });
        assert_eq!(map.lookup(5), LineCol { line: 3, col: 1 });
    }

    #[test]
    fn lookup_maps_crlf_lines() {
        let map = SourceMap::new("<string>", "a\r\nb\r\nc");
        assert_eq!(map.lookup(3), LineCol { line: 2, col: 1 });
        assert_eq!(map.lookup(6), LineCol { line: 3, col: 1 });
    }

    #[test]
    fn lookup_counts_unicode_scalar_columns() {
        let map = SourceMap::new("<string>", "αβ\nγ");
        let alpha = "α".len();
        let beta = "β".len();
        assert_eq!(map.lookup(alpha), LineCol { line: 1, col: 2 });
        assert_eq!(map.lookup(alpha + beta), LineCol { line: 1, col: 3 });
    }

    #[test]
    fn lookup_clamps_past_eof() {
        let map = SourceMap::new("<string>", "abc");
        assert_eq!(map.lookup(99), LineCol { line: 1, col: 4 });
    }

    #[test]
    fn line_text_strips_terminators() {
        let map = SourceMap::new("<string>", "one\r\ntwo\nthree");
        assert_eq!(map.line_text(1), "one");
        assert_eq!(map.line_text(2), "two");
        assert_eq!(map.line_text(3), "three");
        assert_eq!(map.line_text(9), "");
    }

    #[test]
    fn diagnostic_points_at_span() {
        let map = SourceMap::new("main.rive", "fun main() {\n    let x = )\n}\n");
        let rendered = map.render_diagnostic("parse", "unexpected token `)`", Span::new(25, 26));
        assert!(rendered.contains("error[parse]: unexpected token `)`"));
        assert!(rendered.contains("--> main.rive:2:13"));
        assert!(rendered.contains("let x = )"));
        assert!(rendered.lines().last().unwrap().trim_end().ends_with('^'));
    }
}
