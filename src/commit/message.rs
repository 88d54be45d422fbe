//! Commit message synthesis: timestamp splicing and diff-based summaries.

use std::fmt::Display;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, TimeZone};

use crate::error::ConfigError;

use super::diff_lines::{render, summarize_diff};

/// Placeholder in the message template replaced by the timestamp.
pub const TIMESTAMP_PLACEHOLDER: &str = "%d";

/// Default commit message template.
pub const DEFAULT_TEMPLATE: &str = "Scripted auto-commit on change (%d) by gitwatch";

/// Default timestamp format, in `date(1)` style.
pub const DEFAULT_DATE_FORMAT: &str = "+%Y-%m-%d %H:%M:%S";

/// A validated strftime format string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormat(String);

impl DateFormat {
    /// Validate a format string. Empty disables timestamps (`Ok(None)`).
    ///
    /// A leading `+`, as `date(1)` expects, is accepted and stripped.
    pub fn parse(raw: &str) -> Result<Option<Self>, ConfigError> {
        let fmt = raw.strip_prefix('+').unwrap_or(raw);
        if fmt.is_empty() {
            return Ok(None);
        }
        if StrftimeItems::new(fmt).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigError::InvalidDateFormat(raw.to_string()));
        }
        Ok(Some(Self(fmt.to_string())))
    }

    pub fn format<Tz>(&self, now: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        now.format(&self.0).to_string()
    }
}

/// Diff-summary policy (`-l`/`-L`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListChanges {
    /// Largest summary (in lines) used verbatim as the message.
    pub threshold: usize,
    /// Keep ANSI colors in the diff (`-l`) or not (`-L`).
    pub color: bool,
}

/// Working-tree state gathered for one batch when diff summaries are enabled.
#[derive(Debug, Clone, Default)]
pub struct ChangeReport {
    /// `git diff -U0` output.
    pub diff: String,
    /// `git diff --stat` output.
    pub stat: String,
    /// `git status --porcelain` output.
    pub status: String,
}

/// Builds the commit message for one settled batch.
#[derive(Debug, Clone)]
pub struct CommitMessageBuilder {
    template: String,
    date_format: Option<DateFormat>,
    list_changes: Option<ListChanges>,
}

impl CommitMessageBuilder {
    pub fn new(
        template: impl Into<String>,
        date_format: Option<DateFormat>,
        list_changes: Option<ListChanges>,
    ) -> Self {
        Self {
            template: template.into(),
            date_format,
            list_changes,
        }
    }

    pub fn list_changes(&self) -> Option<ListChanges> {
        self.list_changes
    }

    /// Produce the message.
    ///
    /// Without a diff policy (or without a report) this is the template with
    /// its first `%d` replaced by the timestamp. With a policy:
    /// - a summary of at most `threshold` lines is the whole message;
    /// - an empty summary lists the newly added paths;
    /// - a longer summary is replaced by the `--stat` lines.
    ///
    /// Never returns an empty string.
    pub fn build<Tz>(&self, now: &DateTime<Tz>, report: Option<&ChangeReport>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let (Some(policy), Some(report)) = (self.list_changes, report) else {
            return self.from_template(now);
        };

        let summary = summarize_diff(&report.diff);
        let message = if summary.is_empty() {
            new_files_summary(&report.status)
        } else if summary.len() <= policy.threshold {
            render(&summary)
        } else {
            stat_summary(&report.stat)
        };

        if message.trim().is_empty() {
            self.from_template(now)
        } else {
            message
        }
    }

    fn from_template<Tz>(&self, now: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let stamp = self
            .date_format
            .as_ref()
            .map(|f| f.format(now))
            .unwrap_or_default();
        self.template.replacen(TIMESTAMP_PLACEHOLDER, &stamp, 1)
    }
}

/// One line per file from `git diff --stat`, without the totals line.
fn stat_summary(stat: &str) -> String {
    stat.lines()
        .filter(|l| l.contains('|'))
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
}

/// List paths that are new according to porcelain status (`??` or `A`).
///
/// Falls back to the raw status lines when nothing was added.
fn new_files_summary(status: &str) -> String {
    let added: Vec<&str> = status
        .lines()
        .filter(|l| l.starts_with("??") || l.starts_with('A'))
        .filter_map(|l| l.get(3..))
        .collect();

    if added.is_empty() {
        let raw: Vec<&str> = status.lines().map(str::trim_end).filter(|l| !l.is_empty()).collect();
        return raw.join("\n");
    }

    let mut lines = vec!["New files added:".to_string()];
    lines.extend(added.iter().map(|p| format!("  {}", p)));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    const ONE_LINE_DIFF: &str = "--- a/a.txt\n+++ b/a.txt\n@@ -1 +1 @@\n-x\n+y\n";

    const STAT: &str = " a.txt | 2 +-\n b.txt | 10 ++++++++++\n 2 files changed, 11 insertions(+), 1 deletion(-)\n";

    #[test]
    fn test_empty_date_format_splices_empty_string() {
        let builder = CommitMessageBuilder::new("Auto-commit (%d)", DateFormat::parse("").unwrap(), None);
        assert_eq!(builder.build(&fixed_now(), None), "Auto-commit ()");
    }

    #[test]
    fn test_default_date_format_splices_timestamp() {
        let fmt = DateFormat::parse(DEFAULT_DATE_FORMAT).unwrap();
        let builder = CommitMessageBuilder::new(DEFAULT_TEMPLATE, fmt, None);
        assert_eq!(
            builder.build(&fixed_now(), None),
            "Scripted auto-commit on change (2024-03-09 14:05:07) by gitwatch"
        );
    }

    #[test]
    fn test_only_first_placeholder_replaced() {
        let fmt = DateFormat::parse("%Y").unwrap();
        let builder = CommitMessageBuilder::new("%d and %d", fmt, None);
        assert_eq!(builder.build(&fixed_now(), None), "2024 and %d");
    }

    #[test]
    fn test_template_without_placeholder_is_verbatim() {
        let fmt = DateFormat::parse("%Y").unwrap();
        let builder = CommitMessageBuilder::new("wip", fmt, None);
        assert_eq!(builder.build(&fixed_now(), None), "wip");
    }

    #[test]
    fn test_invalid_date_format_rejected() {
        assert!(matches!(
            DateFormat::parse("%Q"),
            Err(ConfigError::InvalidDateFormat(_))
        ));
    }

    #[test]
    fn test_plus_only_date_format_disables_timestamp() {
        assert_eq!(DateFormat::parse("+").unwrap(), None);
    }

    #[test]
    fn test_small_diff_becomes_message() {
        let policy = ListChanges { threshold: 5, color: false };
        let builder = CommitMessageBuilder::new(DEFAULT_TEMPLATE, None, Some(policy));
        let report = ChangeReport {
            diff: ONE_LINE_DIFF.to_string(),
            stat: STAT.to_string(),
            status: " M a.txt\n".to_string(),
        };
        assert_eq!(
            builder.build(&fixed_now(), Some(&report)),
            "a.txt:1: -x\na.txt:1: +y"
        );
    }

    #[test]
    fn test_summary_at_threshold_is_still_used() {
        let policy = ListChanges { threshold: 2, color: false };
        let builder = CommitMessageBuilder::new(DEFAULT_TEMPLATE, None, Some(policy));
        let report = ChangeReport {
            diff: ONE_LINE_DIFF.to_string(),
            stat: STAT.to_string(),
            status: String::new(),
        };
        assert_eq!(builder.build(&fixed_now(), Some(&report)).lines().count(), 2);
    }

    #[test]
    fn test_large_diff_falls_back_to_stat() {
        let policy = ListChanges { threshold: 1, color: false };
        let builder = CommitMessageBuilder::new(DEFAULT_TEMPLATE, None, Some(policy));
        let report = ChangeReport {
            diff: ONE_LINE_DIFF.to_string(),
            stat: STAT.to_string(),
            status: String::new(),
        };
        assert_eq!(
            builder.build(&fixed_now(), Some(&report)),
            "a.txt | 2 +-\nb.txt | 10 ++++++++++"
        );
    }

    #[test]
    fn test_zero_threshold_uses_stat_for_any_diff() {
        let policy = ListChanges { threshold: 0, color: true };
        let builder = CommitMessageBuilder::new(DEFAULT_TEMPLATE, None, Some(policy));
        let report = ChangeReport {
            diff: ONE_LINE_DIFF.to_string(),
            stat: STAT.to_string(),
            status: String::new(),
        };
        assert!(builder.build(&fixed_now(), Some(&report)).starts_with("a.txt | 2"));
    }

    #[test]
    fn test_empty_diff_lists_new_files() {
        let policy = ListChanges { threshold: 0, color: false };
        let builder = CommitMessageBuilder::new(DEFAULT_TEMPLATE, None, Some(policy));
        let report = ChangeReport {
            diff: String::new(),
            stat: String::new(),
            status: "?? new.txt\nA  staged.txt\n".to_string(),
        };
        assert_eq!(
            builder.build(&fixed_now(), Some(&report)),
            "New files added:\n  new.txt\n  staged.txt"
        );
    }

    #[test]
    fn test_empty_diff_without_additions_uses_status() {
        let policy = ListChanges { threshold: 3, color: false };
        let builder = CommitMessageBuilder::new(DEFAULT_TEMPLATE, None, Some(policy));
        let report = ChangeReport {
            diff: String::new(),
            stat: String::new(),
            status: " T link\n".to_string(),
        };
        assert_eq!(builder.build(&fixed_now(), Some(&report)), " T link");
    }

    #[test]
    fn test_nothing_to_describe_falls_back_to_template() {
        let policy = ListChanges { threshold: 3, color: false };
        let builder = CommitMessageBuilder::new("fallback (%d)", None, Some(policy));
        let report = ChangeReport::default();
        assert_eq!(builder.build(&fixed_now(), Some(&report)), "fallback ()");
    }
}
