use owo_colors::OwoColorize;

/// Byte range in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelStyle {
    Primary,
    Secondary,
}

/// A message attached to a span of the source.
#[derive(Debug, Clone)]
pub struct Label {
    pub span: Span,
    pub message: String,
    pub style: LabelStyle,
}

impl Label {
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            style: LabelStyle::Primary,
        }
    }

    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            style: LabelStyle::Secondary,
        }
    }
}

/// An error reported before a program runs: a parse error or a failed
/// macro expansion.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: Option<String>,
    pub message: String,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            labels: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.notes.push(format!("help: {}", help.into()));
        self
    }
}

/// 1-based line and column of a byte offset. Columns count characters.
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let before = &source[..floor_char_boundary(source, offset)];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    (line, before[line_start..].chars().count() + 1)
}

fn floor_char_boundary(source: &str, offset: usize) -> usize {
    let mut offset = offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

fn line_text(source: &str, line: usize) -> Option<&str> {
    source.split('\n').nth(line - 1)
}

/// Renders diagnostics in the familiar `error[CODE]: message` layout with
/// the offending source lines underlined.
pub struct DiagnosticRenderer<'a> {
    source: &'a str,
    file_name: &'a str,
    use_color: bool,
}

impl<'a> DiagnosticRenderer<'a> {
    pub fn new(source: &'a str, file_name: &'a str, use_color: bool) -> Self {
        Self {
            source,
            file_name,
            use_color,
        }
    }

    pub fn render(&self, diagnostic: &Diagnostic) -> String {
        let mut output = String::new();
        self.render_header(&mut output, diagnostic);

        // A zero-width span (EOF) still occupies the line it sits on.
        let mut lines: Vec<usize> = diagnostic
            .labels
            .iter()
            .flat_map(|label| {
                let (first, _) = line_col(self.source, label.span.start);
                let (last, _) = line_col(self.source, last_offset(label.span));
                first..=last
            })
            .collect();
        lines.sort_unstable();
        lines.dedup();

        if let Some(label) = diagnostic.labels.first() {
            let (line, col) = line_col(self.source, label.span.start);
            let width = lines.last().copied().unwrap_or(1).to_string().len();
            let gutter = " ".repeat(width + 1);

            output.push_str(&format!("{}{} {}:{}:{}\n", &gutter[1..], self.blue("-->"), self.file_name, line, col));
            output.push_str(&format!("{}{}\n", gutter, self.blue("|")));
            for &line in &lines {
                self.render_line(&mut output, diagnostic, line, width);
            }
            output.push_str(&format!("{}{}\n", gutter, self.blue("|")));
        }

        for note in &diagnostic.notes {
            output.push_str(&format!("  {} {}\n", self.blue("="), note));
        }
        output
    }

    fn render_header(&self, output: &mut String, diagnostic: &Diagnostic) {
        let severity = match &diagnostic.code {
            Some(code) => format!("error[{}]", code),
            None => "error".to_string(),
        };
        let severity = if self.use_color {
            severity.red().bold().to_string()
        } else {
            severity
        };
        output.push_str(&format!("{}: {}\n", severity, self.bold(&diagnostic.message)));
    }

    fn render_line(&self, output: &mut String, diagnostic: &Diagnostic, line: usize, width: usize) {
        let Some(text) = line_text(self.source, line) else {
            return;
        };
        output.push_str(&format!(
            "{} {} {}\n",
            self.blue(&format!("{:>width$}", line, width = width)),
            self.blue("|"),
            text
        ));

        let mut marks: Vec<(usize, usize, &Label)> = diagnostic
            .labels
            .iter()
            .filter_map(|label| {
                let (first, start_col) = line_col(self.source, label.span.start);
                let (last, end_col) = line_col(self.source, last_offset(label.span));
                if line < first || line > last {
                    return None;
                }
                let start = if first == line { start_col } else { 1 };
                let end = if last == line {
                    end_col + 1
                } else {
                    text.chars().count() + 1
                };
                Some((start, end.max(start + 1), label))
            })
            .collect();
        if marks.is_empty() {
            return;
        }
        marks.sort_by_key(|(start, _, _)| *start);

        let gutter = format!("{} {}", " ".repeat(width), self.blue("|"));
        let mut underline = String::new();
        let mut column = 1;
        for (start, end, label) in &marks {
            let mark = match label.style {
                LabelStyle::Primary => '^',
                LabelStyle::Secondary => '-',
            };
            while column < *start {
                underline.push(' ');
                column += 1;
            }
            while column < *end {
                underline.push(mark);
                column += 1;
            }
        }
        output.push_str(&format!("{} {}\n", gutter, self.red(&underline)));

        for (start, _, label) in marks.iter().filter(|(_, _, label)| !label.message.is_empty()) {
            let message = match label.style {
                LabelStyle::Primary => self.red(&label.message),
                LabelStyle::Secondary => self.blue(&label.message),
            };
            output.push_str(&format!("{} {}{}\n", gutter, " ".repeat(start - 1), message));
        }
    }

    fn red(&self, text: &str) -> String {
        if self.use_color {
            text.red().to_string()
        } else {
            text.to_string()
        }
    }

    fn blue(&self, text: &str) -> String {
        if self.use_color {
            text.blue().to_string()
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        if self.use_color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }
}

fn last_offset(span: Span) -> usize {
    span.end.saturating_sub(1).max(span.start)
}

/// Renders every diagnostic followed by an `aborting` summary line.
pub fn render_diagnostics(source: &str, file_name: &str, diagnostics: &[Diagnostic], use_color: bool) -> String {
    let renderer = DiagnosticRenderer::new(source, file_name, use_color);
    let mut output = String::new();
    for diagnostic in diagnostics {
        output.push_str(&renderer.render(diagnostic));
        output.push('\n');
    }
    match diagnostics.len() {
        0 => {}
        1 => output.push_str("error: aborting due to 1 previous error\n"),
        n => output.push_str(&format!("error: aborting due to {} previous errors\n", n)),
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col() {
        let source = "let x = 5;\nlet y = 10;";
        assert_eq!(line_col(source, 0), (1, 1));
        assert_eq!(line_col(source, 4), (1, 5));
        assert_eq!(line_col(source, 11), (2, 1));
        assert_eq!(line_col(source, 15), (2, 5));
        assert_eq!(line_col(source, source.len()), (2, 12));
    }

    #[test]
    fn test_line_col_counts_characters() {
        assert_eq!(line_col("\"é\" + x", 7), (1, 7));
    }

    #[test]
    fn test_empty_span() {
        assert!(Span::new(3, 3).is_empty());
        assert!(!Span::new(3, 4).is_empty());
    }

    #[test]
    fn test_secondary_label_across_lines() {
        let source = "let f = fn(x) {\n  x";
        let diagnostic = Diagnostic::error("expected next token to be }, got EOF instead")
            .with_label(Label::primary(Span::new(19, 19), "expected `}` here"))
            .with_label(Label::secondary(Span::new(14, 15), "unclosed block starts here"));

        let output = DiagnosticRenderer::new(source, "<eval>", false).render(&diagnostic);

        assert!(output.contains("--> <eval>:2:4"));
        let opening = format!(
            "1 | let f = fn(x) {{\n  |{pad}-\n  |{pad}unclosed block starts here\n",
            pad = " ".repeat(15)
        );
        assert!(output.contains(&opening), "got:\n{}", output);
        assert!(output.contains("2 |   x\n  |    ^\n  |    expected `}` here\n"), "got:\n{}", output);
    }

    #[test]
    fn test_diagnostic_rendering() {
        let source = "let x 5;\n";
        let diagnostic = Diagnostic::error("expected next token to be =, got INT instead")
            .with_code("E0101")
            .with_label(Label::primary(Span::new(6, 7), "expected `=` here"))
            .with_help("bindings are written `let name = value;`");

        let output = DiagnosticRenderer::new(source, "input.monkey", false).render(&diagnostic);

        assert!(output.starts_with("error[E0101]: expected next token to be =, got INT instead\n"));
        assert!(output.contains("--> input.monkey:1:7"));
        assert!(output.contains("1 | let x 5;"));
        assert!(output.contains("|       ^"));
        assert!(output.contains("= help: bindings are written"));
    }

    #[test]
    fn test_diagnostic_without_labels() {
        let diagnostic = Diagnostic::error("macro `m` failed").with_code("E0303");
        let output = DiagnosticRenderer::new("m()", "<eval>", false).render(&diagnostic);
        assert_eq!(output, "error[E0303]: macro `m` failed\n");
    }

    #[test]
    fn test_eof_label_is_rendered() {
        let source = "let x =";
        let diagnostic = Diagnostic::error("no prefix parse function for EOF found")
            .with_label(Label::primary(Span::new(7, 7), "cannot start an expression"));
        let output = DiagnosticRenderer::new(source, "<eval>", false).render(&diagnostic);
        assert!(output.contains("--> <eval>:1:8"));
        assert!(output.contains("1 | let x ="));
    }

    #[test]
    fn test_summary_line() {
        let diagnostics = vec![Diagnostic::error("a"), Diagnostic::error("b")];
        let output = render_diagnostics("", "<eval>", &diagnostics, false);
        assert!(output.ends_with("error: aborting due to 2 previous errors\n"));
    }
}
