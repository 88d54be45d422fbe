//! Line-numbered summary of a unified diff.
//!
//! Turns `git diff -U0` output (colored or not) into one short line per
//! changed line, prefixed with `path:line: `, suitable as a commit message.

use std::fmt;
use std::sync::LazyLock;

use regex_lite::Regex;

/// Maximum characters of raw diff content kept per summary line.
///
/// ANSI escape sequences count toward this budget.
pub const MAX_LINE_WIDTH: usize = 150;

/// Optional leading ANSI color codes.
const ANSI_PREFIX: &str = r"^(?:\x1b\[[0-9;]*m)*";

static FILE_HEADER_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("{ANSI_PREFIX}diff ")).expect("Invalid regex"));

static OLD_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"{ANSI_PREFIX}--- (?:a/)?([^\s\x1b]+)")).expect("Invalid regex")
});

static NEW_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"{ANSI_PREFIX}\+\+\+ (?:b/)?([^\s\x1b]+)")).expect("Invalid regex")
});

static HUNK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"{ANSI_PREFIX}@@ -[0-9]+(?:,[0-9]+)? \+([0-9]+)(?:,[0-9]+)? @@"
    ))
    .expect("Invalid regex")
});

static CONTENT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("{ANSI_PREFIX}([ +-])")).expect("Invalid regex"));

/// One rendered summary line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffLine {
    /// A context, added, or removed line of a file that still exists.
    Content {
        path: String,
        line: u32,
        /// Raw diff line (including its `+`/`-`/space marker), truncated.
        text: String,
    },
    /// The file's new side is `/dev/null`; its hunks are not listed.
    FileRemoved { previous_path: String },
}

impl fmt::Display for DiffLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffLine::Content { path, line, text } => write!(f, "{}:{}: {}", path, line, text),
            DiffLine::FileRemoved { previous_path } => {
                write!(f, "File {} deleted or moved.", previous_path)
            }
        }
    }
}

/// Summarize a unified diff in a single forward pass.
///
/// Header lines (`---`/`+++`) are only recognized between a `diff ...` line
/// (or the start of input) and the first hunk, so removed lines whose text
/// starts with `-- ` are reported as content.
pub fn summarize_diff(diff: &str) -> Vec<DiffLine> {
    let mut out = Vec::new();
    let mut previous_path = String::new();
    let mut path = String::new();
    let mut line: u32 = 0;
    let mut in_header = true;
    let mut removed_reported = false;

    for raw in diff.lines() {
        if FILE_HEADER_START.is_match(raw) {
            in_header = true;
            continue;
        }

        if in_header {
            if let Some(caps) = OLD_FILE.captures(raw) {
                previous_path = caps[1].to_string();
                continue;
            }
            if let Some(caps) = NEW_FILE.captures(raw) {
                path = caps[1].to_string();
                removed_reported = false;
                continue;
            }
        }

        if let Some(caps) = HUNK_HEADER.captures(raw) {
            in_header = false;
            line = caps[1].parse().unwrap_or(0);
            continue;
        }

        if in_header {
            continue;
        }

        let Some(caps) = CONTENT_LINE.captures(raw) else {
            continue;
        };

        if path == "/dev/null" {
            if !removed_reported {
                out.push(DiffLine::FileRemoved {
                    previous_path: previous_path.clone(),
                });
                removed_reported = true;
            }
            continue;
        }

        out.push(DiffLine::Content {
            path: path.clone(),
            line,
            text: raw.chars().take(MAX_LINE_WIDTH).collect(),
        });

        if &caps[1] != "-" {
            line += 1;
        }
    }

    out
}

/// Render summary lines as a newline-joined message body.
pub fn render(lines: &[DiffLine]) -> String {
    lines
        .iter()
        .map(|l| l.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
