//! Heuristic extraction of lint issues from free-form tool output.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintIssue {
    pub file: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for LintIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, self.line, self.column) {
            (Some(file), Some(line), Some(col)) => write!(f, "{file}:{line}:{col}: ")?,
            (Some(file), Some(line), None) => write!(f, "{file}:{line}: ")?,
            _ => {}
        }
        if self.severity != Severity::Info {
            write!(f, "{}: ", self.severity.as_str())?;
        }
        f.write_str(&self.message)
    }
}

/// Strip a leading `error:`/`warning:` style tag, case-insensitively
fn strip_tag<'a>(text: &'a str, tag: &str) -> Option<&'a str> {
    let head = text.get(..tag.len())?;
    if !head.eq_ignore_ascii_case(tag) {
        return None;
    }
    let rest = &text[tag.len()..];
    // `error[E0308]: msg` (rustc style)
    let rest = match rest.strip_prefix('[') {
        Some(r) => &r[r.find(']')? + 1..],
        None => rest,
    };
    Some(rest.strip_prefix(':')?.trim())
}

fn severity_of(message: &str) -> (Severity, &str) {
    if let Some(rest) = strip_tag(message, "error") {
        return (Severity::Error, rest);
    }
    if let Some(rest) = strip_tag(message, "warning") {
        return (Severity::Warning, rest);
    }
    let lower = message.to_lowercase();
    if lower.contains("error") {
        (Severity::Error, message)
    } else {
        (Severity::Warning, message)
    }
}

fn leading_number(s: &str) -> Option<(u32, &str)> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    Some((s[..end].parse().ok()?, &s[end..]))
}

/// `file:line:col: message` (column optional)
fn parse_location(line: &str) -> Option<LintIssue> {
    for (idx, _) in line.match_indices(':') {
        if idx == 0 {
            continue;
        }
        let Some((line_no, rest)) = leading_number(&line[idx + 1..]) else {
            continue;
        };
        let Some(rest) = rest.strip_prefix(':') else {
            continue;
        };
        let (column, rest) = match leading_number(rest) {
            Some((col, after)) => match after.strip_prefix(':') {
                Some(after) => (Some(col), after),
                None => continue,
            },
            None => (None, rest),
        };
        let message = rest.trim();
        if message.is_empty() {
            continue;
        }
        let (severity, message) = severity_of(message);
        return Some(LintIssue {
            file: Some(line[..idx].trim().to_string()),
            line: Some(line_no),
            column,
            severity,
            message: message.to_string(),
        });
    }
    None
}

/// Structured issue from one output line, without the raw fallback
fn parse_structured(line: &str) -> Option<LintIssue> {
    if let Some(issue) = parse_location(line) {
        return Some(issue);
    }
    for (tag, severity) in [("error", Severity::Error), ("warning", Severity::Warning)] {
        if let Some(message) = strip_tag(line, tag) {
            return Some(LintIssue {
                file: None,
                line: None,
                column: None,
                severity,
                message: message.to_string(),
            });
        }
    }
    None
}

/// Extract up to `max` issues, trying in order: location prefix,
/// `error:` prefix, `warning:` prefix, then the raw line.
///
/// Raw lines are only kept when nothing structured was found, so tool
/// banners never crowd out real diagnostics.
pub fn parse_issues(output: &str, max: usize) -> Vec<LintIssue> {
    let lines: Vec<&str> = output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let structured: Vec<LintIssue> = lines
        .iter()
        .filter_map(|l| parse_structured(l))
        .take(max)
        .collect();
    if !structured.is_empty() {
        return structured;
    }

    lines
        .into_iter()
        .map(|line| LintIssue {
            file: None,
            line: None,
            column: None,
            severity: Severity::Info,
            message: line.to_string(),
        })
        .take(max)
        .collect()
}

/// Number of lines that look like a real diagnostic (raw lines excluded)
pub fn count_issues(output: &str) -> usize {
    output
        .lines()
        .map(str::trim)
        .filter(|l| parse_structured(l).is_some())
        .count()
}

/// Tools like ruff report `(3 fixed, 1 remaining)`; pick out the fixed count
pub fn parse_fixed_count(output: &str) -> Option<usize> {
    let tokens: Vec<&str> = output.split_whitespace().collect();
    tokens.windows(2).find_map(|w| {
        let word = w[1].trim_matches(|c: char| !c.is_alphanumeric());
        if word.eq_ignore_ascii_case("fixed") {
            w[0].trim_matches(|c: char| !c.is_ascii_digit()).parse().ok()
        } else {
            None
        }
    })
}

/// Short human summary: the first `shown` issues and a `+N more` tail
pub fn summarize(tool: &str, file: &str, issues: &[LintIssue], total: usize, shown: usize) -> String {
    let total = total.max(issues.len());
    let mut out = format!("{tool} reported {total} issue(s) in {file}:");
    for issue in issues.iter().take(shown) {
        out.push_str("\n  - ");
        out.push_str(&issue.to_string());
    }
    let hidden = total.saturating_sub(shown.min(issues.len()));
    if hidden > 0 {
        out.push_str(&format!("\n  (+{hidden} more)"));
    }
    out
}
