//! Line-addressable shader compiler diagnostics.

use std::fmt;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl Severity {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" | "fatal error" => Some(Self::Error),
            "warning" => Some(Self::Warning),
            "note" | "info" => Some(Self::Note),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Note => "note",
        })
    }
}

/// One compiler message, optionally pinned to a 1-based line/column.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// File name or library label the message refers to.
    pub source: String,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn unlocated(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            line: None,
            column: None,
            severity: Severity::Error,
            message: message.into(),
        }
    }

    fn located(source: &str, loc: Option<naga::SourceLocation>, message: String) -> Self {
        Self {
            source: source.to_string(),
            line: loc.map(|l| l.line_number),
            column: loc.map(|l| l.line_position),
            severity: Severity::Error,
            message,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (source, severity, message) = (&self.source, self.severity, &self.message);
        match (self.line, self.column) {
            (Some(l), Some(c)) => write!(f, "{source}:{l}:{c}: {severity}: {message}"),
            (Some(l), None) => write!(f, "{source}:{l}: {severity}: {message}"),
            _ => write!(f, "{source}: {severity}: {message}"),
        }
    }
}

/// Ordered list of diagnostics from one compilation attempt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    pub items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn single(d: Diagnostic) -> Self {
        Self { items: vec![d] }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| d.severity == Severity::Error)
    }

    /// From a WGSL front-end error.
    pub fn from_parse_error(label: &str, code: &str, err: &naga::front::wgsl::ParseError) -> Self {
        Self::single(Diagnostic::located(
            label,
            err.location(code),
            err.message().to_string(),
        ))
    }

    /// From a module validation error.
    pub fn from_validation_error(
        label: &str,
        code: &str,
        err: &naga::WithSpan<naga::valid::ValidationError>,
    ) -> Self {
        let loc = err.location(code);
        if loc.is_none() {
            // No span: fall back to whatever the rendered report carries.
            let parsed = Self::parse_raw(label, &err.emit_to_string(code));
            if parsed.items.iter().any(|d| d.line.is_some()) {
                return parsed;
            }
        }
        Self::single(Diagnostic::located(label, loc, err.as_inner().to_string()))
    }

    /// Parses raw compiler output into diagnostics.
    ///
    /// Understands `file:line:col: severity: message` lines (clang-style) and
    /// codespan reports where `severity: message` precedes a `┌─ file:line:col`
    /// pointer. Anything unrecognized becomes a single unlocated diagnostic
    /// holding the raw text.
    pub fn parse_raw(label: &str, raw: &str) -> Self {
        let mut items = Vec::new();
        let mut pending: Option<(Severity, String)> = None;

        for line in raw.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            if let Some((sev, msg)) = split_severity(trimmed) {
                pending = Some((sev, msg.to_string()));
                continue;
            }

            let Some(loc) = parse_location(trimmed) else { continue };
            let (severity, message) = match loc.rest {
                Some(rest) => split_severity(rest)
                    .map(|(s, m)| (s, m.to_string()))
                    .unwrap_or((Severity::Error, rest.to_string())),
                None => match pending.take() {
                    Some(p) => p,
                    None => continue,
                },
            };

            items.push(Diagnostic {
                source: loc.file.to_string(),
                line: Some(loc.line),
                column: loc.column,
                severity,
                message,
            });
        }

        if items.is_empty() {
            let message = match pending {
                Some((_, m)) => m,
                None => raw.trim().to_string(),
            };
            items.push(Diagnostic::unlocated(label, message));
        }

        Self { items }
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, d) in self.items.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{d}")?;
        }
        Ok(())
    }
}

struct Location<'a> {
    file: &'a str,
    line: u32,
    column: Option<u32>,
    rest: Option<&'a str>,
}

fn split_severity(s: &str) -> Option<(Severity, &str)> {
    let (head, tail) = s.split_once(':')?;
    let sev = Severity::parse(head)?;
    Some((sev, tail.trim()))
}

fn parse_location(s: &str) -> Option<Location<'_>> {
    // Strip codespan gutter glyphs ("┌─ ", "--> ").
    let s = s.trim_start_matches(|c: char| {
        !(c.is_alphanumeric() || matches!(c, '/' | '.' | '_' | '<'))
    });

    let mut parts = s.splitn(4, ':');
    let file = parts.next()?.trim();
    let line = parts.next()?.trim().parse::<u32>().ok()?;
    let (column, rest) = match parts.next() {
        Some(c) => match c.trim().parse::<u32>() {
            Ok(col) => (Some(col), parts.next().map(str::trim)),
            Err(_) => (None, Some(c.trim())),
        },
        None => (None, None),
    };

    if file.is_empty() {
        return None;
    }

    Some(Location {
        file,
        line,
        column,
        rest: rest.filter(|r| !r.is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_clang_style_lines() {
        let raw = "program_source:12:5: error: use of undeclared identifier 'uv'\n\
                   program_source:20:1: warning: unused variable 'k'";
        let d = Diagnostics::parse_raw("toy", raw);

        assert_eq!(d.items.len(), 2);
        assert_eq!(d.items[0].source, "program_source");
        assert_eq!(d.items[0].line, Some(12));
        assert_eq!(d.items[0].column, Some(5));
        assert_eq!(d.items[0].severity, Severity::Error);
        assert_eq!(d.items[0].message, "use of undeclared identifier 'uv'");
        assert_eq!(d.items[1].severity, Severity::Warning);
        assert_eq!(d.errors().count(), 1);
    }

    #[test]
    fn parses_codespan_reports() {
        let raw = "error: expected ';', found '}'\n  ┌─ grayscale.wgsl:7:3\n  │\n7 │   }\n";
        let d = Diagnostics::parse_raw("grayscale", raw);

        assert_eq!(d.items.len(), 1);
        assert_eq!(d.items[0].source, "grayscale.wgsl");
        assert_eq!(d.items[0].line, Some(7));
        assert_eq!(d.items[0].column, Some(3));
        assert_eq!(d.items[0].message, "expected ';', found '}'");
    }

    #[test]
    fn unparseable_output_is_passed_through() {
        let d = Diagnostics::parse_raw("toy", "  backend exploded  ");
        assert_eq!(d.items, vec![Diagnostic::unlocated("toy", "backend exploded")]);
    }

    #[test]
    fn display_is_line_addressable() {
        let d = Diagnostics::parse_raw("toy", "a.wgsl:3:9: error: bad");
        assert_eq!(d.to_string(), "a.wgsl:3:9: error: bad");
    }

    #[test]
    fn wgsl_parse_error_carries_location() {
        let code = "@compute @workgroup_size(8, 8)\nfn main() {\n  let x = ;\n}\n";
        let err = naga::front::wgsl::parse_str(code).unwrap_err();
        let d = Diagnostics::from_parse_error("broken", code, &err);

        assert_eq!(d.items.len(), 1);
        assert_eq!(d.items[0].source, "broken");
        assert_eq!(d.items[0].line, Some(3));
        assert!(!d.items[0].message.is_empty());
    }
}
