use serde::Serialize;

/// Severity of one parsed compiler line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// One parsed error or warning line from compiler output. Never mutated
/// after creation; ordered by appearance in the output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub file: String,
    pub line: u32,
    pub message: String,
    pub severity: Severity,
}

impl Diagnostic {
    /// A build-level failure that did not come from the compiler (missing
    /// source directory, missing compiler binary).
    pub fn synthetic(message: impl Into<String>) -> Self {
        Diagnostic {
            file: String::new(),
            line: 0,
            message: message.into(),
            severity: Severity::Error,
        }
    }
}

/// Compiler output partitioned into errors and warnings, each in
/// first-seen order.
#[derive(Clone, Debug, Default)]
pub struct ParsedOutput {
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

/// Splits captured compiler text into diagnostic records.
///
/// Lines matching `<path>:<line>:<whitespace><message>` become records;
/// everything else is dropped without failing the parse. A message
/// containing "warning" (case-insensitive) is classified as a warning,
/// the same substring heuristic `pdc` output has always been read with.
pub fn parse_output(text: &str) -> ParsedOutput {
    let mut parsed = ParsedOutput::default();
    for line in text.lines() {
        if let Some(diagnostic) = match_line(line) {
            match diagnostic.severity {
                Severity::Warning => parsed.warnings.push(diagnostic),
                Severity::Error => parsed.errors.push(diagnostic),
            }
        }
    }
    parsed
}

/// Matches one `<path>:<line>:<whitespace><message>` line.
///
/// The path match is greedy: the last `:<digits>:<ws>` group in the line
/// wins, so Windows drive letters (`C:\...`) stay inside the path.
fn match_line(line: &str) -> Option<Diagnostic> {
    let bytes = line.as_bytes();
    let mut split = None;

    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b':' {
            let mut j = i + 1;
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            let digits_found = j > i + 1;
            let colon_then_space = j < bytes.len()
                && bytes[j] == b':'
                && matches!(bytes.get(j + 1), Some(c) if c.is_ascii_whitespace());
            if digits_found && colon_then_space {
                split = Some((i, j));
            }
        }
        i += 1;
    }

    let (i, j) = split?;
    if i == 0 {
        return None; // empty path
    }

    let line_number: u32 = line[i + 1..j].parse().ok()?;
    let message = line[j + 1..].trim().to_string();
    let severity = if message.to_lowercase().contains("warning") {
        Severity::Warning
    } else {
        Severity::Error
    };

    Some(Diagnostic {
        file: line[..i].to_string(),
        line: line_number,
        message,
        severity,
    })
}
