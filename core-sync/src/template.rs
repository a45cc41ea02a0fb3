//! # Destination Path Templates
//!
//! Resolves where a source file lands on a target.
//!
//! ## Overview
//!
//! A target pattern is a Go `text/template` rendered with `gtmpl`, so trim
//! markers, comments, conditionals and pipelines behave as they do in Go.
//! The data is an object holding only the fields derived from the source
//! file:
//!
//! | Field | Value for `reports/q1.csv` modified 2024-03-05 09:30:00 UTC |
//! |-------|------|
//! | `Dir` | `reports` |
//! | `Name` | `q1` |
//! | `Extension` | `csv` |
//! | `Date` | modification time formatted with the target's `dateFormat` |
//! | `Time` | modification time formatted with the target's `timeFormat` |
//!
//! Date and time formats use reference-time layouts (`2006-01-02`,
//! `15:04:05`). A format containing `%` is taken as a strftime string instead.
//! Times are rendered in UTC so the same input resolves to the same path on
//! every host.

use crate::error::{Result, SyncError};
use crate::job::{JobTarget, TransferFile};
use bridge_traits::path;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use gtmpl::{Template, Value};
use std::collections::HashMap;

/// Values bound to the template fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathFields {
    pub dir: String,
    pub name: String,
    pub extension: String,
    pub date: String,
    pub time: String,
}

impl PathFields {
    /// Template data exposing exactly `Dir`, `Name`, `Extension`, `Date`, `Time`
    fn to_value(&self) -> Value {
        let fields: HashMap<String, Value> = [
            ("Dir", &self.dir),
            ("Name", &self.name),
            ("Extension", &self.extension),
            ("Date", &self.date),
            ("Time", &self.time),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), Value::String(value.clone())))
        .collect();
        Value::Object(fields)
    }
}

/// A destination pattern that parsed as a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    source: String,
}

impl PathTemplate {
    /// Check that `source` parses as a template
    ///
    /// # Errors
    ///
    /// Returns `SyncError::InvalidTemplate` with the parser's message.
    pub fn parse(source: &str) -> Result<Self> {
        let mut template = Template::default();
        template
            .parse(source)
            .map_err(|e| invalid_template(source, e.to_string()))?;
        Ok(Self {
            source: source.to_string(),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render with `fields` as the data
    ///
    /// # Errors
    ///
    /// Returns `SyncError::InvalidTemplate` when execution fails, for example
    /// on a reference to a field other than the five above.
    pub fn render(&self, fields: &PathFields) -> Result<String> {
        gtmpl::template(&self.source, fields.to_value())
            .map_err(|e| invalid_template(&self.source, e.to_string()))
    }
}

fn invalid_template(template: &str, reason: String) -> SyncError {
    SyncError::InvalidTemplate {
        template: template.to_string(),
        reason,
    }
}

// ============================================================================
// Time formatting
// ============================================================================

/// Reference-time tokens, longest first where one is a prefix of another
const LAYOUT_TOKENS: &[(&str, &str)] = &[
    ("January", "%B"),
    ("Monday", "%A"),
    ("2006", "%Y"),
    ("Z07:00", "Z"),
    ("Z0700", "Z"),
    ("-07:00", "%:z"),
    ("-0700", "%z"),
    (".000000000", "%.9f"),
    (".000000", "%.6f"),
    (".000", "%.3f"),
    ("Jan", "%b"),
    ("Mon", "%a"),
    ("MST", "%Z"),
    ("002", "%j"),
    ("01", "%m"),
    ("02", "%d"),
    ("03", "%I"),
    ("04", "%M"),
    ("05", "%S"),
    ("06", "%y"),
    ("_2", "%e"),
    ("15", "%H"),
    ("PM", "%p"),
    ("pm", "%P"),
    ("1", "%-m"),
    ("2", "%-d"),
    ("3", "%-I"),
    ("4", "%-M"),
    ("5", "%-S"),
];

/// Translate a reference-time layout into a strftime string
fn layout_to_strftime(layout: &str) -> String {
    let mut out = String::with_capacity(layout.len() * 2);
    let mut rest = layout;

    'outer: while let Some(c) = rest.chars().next() {
        for (token, spec) in LAYOUT_TOKENS {
            if let Some(tail) = rest.strip_prefix(token) {
                out.push_str(spec);
                rest = tail;
                continue 'outer;
            }
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    out
}

/// Format a Unix timestamp (seconds, UTC) with `format`
///
/// # Errors
///
/// Returns `SyncError::InvalidTimeFormat` if the format has an unknown
/// specifier or the timestamp is out of range.
pub fn format_timestamp(timestamp: i64, format: &str) -> Result<String> {
    let spec = if format.contains('%') {
        format.to_string()
    } else {
        layout_to_strftime(format)
    };

    let items: Vec<Item<'_>> = StrftimeItems::new(&spec).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(SyncError::InvalidTimeFormat {
            format: format.to_string(),
            reason: "unrecognized format specifier".to_string(),
        });
    }

    let datetime: DateTime<Utc> =
        DateTime::from_timestamp(timestamp, 0).ok_or_else(|| SyncError::InvalidTimeFormat {
            format: format.to_string(),
            reason: format!("timestamp {} is out of range", timestamp),
        })?;

    Ok(datetime.format_with_items(items.into_iter()).to_string())
}

// ============================================================================
// Destination resolution
// ============================================================================

/// Derive the template fields for `file` under `target`'s formats
pub fn path_fields(file: &TransferFile, target: &JobTarget) -> Result<PathFields> {
    let extension = path::ext(&file.name);
    let base = path::base(&file.name);
    let name = base.strip_suffix(extension).unwrap_or(&base).to_string();

    Ok(PathFields {
        dir: path::dir(&file.name),
        name,
        extension: extension.trim_start_matches('.').to_string(),
        date: format_timestamp(file.last_modified, &target.date_format)?,
        time: format_timestamp(file.last_modified, &target.time_format)?,
    })
}

/// Full destination path of `file` on `target.remote`
///
/// Deterministic: the same file and target always resolve to the same path.
pub fn target_path(file: &TransferFile, target: &JobTarget) -> Result<String> {
    let template = PathTemplate::parse(&target.pattern)?;
    let fields = path_fields(file, target)?;
    let rendered = template.render(&fields)?;
    Ok(path::clean(&path::join([
        target.root.as_str(),
        rendered.as_str(),
    ])))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn file(name: &str, last_modified: i64) -> TransferFile {
        TransferFile {
            name: name.to_string(),
            size: 0,
            last_modified,
        }
    }

    fn target(root: &str, pattern: &str, date_format: &str, time_format: &str) -> JobTarget {
        JobTarget {
            remote: "archive".to_string(),
            root: root.to_string(),
            pattern: pattern.to_string(),
            date_format: date_format.to_string(),
            time_format: time_format.to_string(),
        }
    }

    fn march_fifth() -> i64 {
        Utc.with_ymd_and_hms(2024, 3, 5, 9, 30, 7).unwrap().timestamp()
    }

    #[test]
    fn test_dated_report_name() {
        let resolved = target_path(
            &file("reports/q1.csv", march_fifth()),
            &target("out", "{{.Name}}-{{.Date}}.{{.Extension}}", "2006-01-02", ""),
        )
        .unwrap();

        assert_eq!(resolved, "out/q1-2024-03-05.csv");
    }

    #[test]
    fn test_all_fields() {
        let resolved = target_path(
            &file("reports/2024/q1.tar.gz", march_fifth()),
            &target(
                "archive/",
                "{{ .Dir }}/{{.Date}}/{{.Time}}_{{.Name}}.{{.Extension}}",
                "20060102",
                "150405",
            ),
        )
        .unwrap();

        assert_eq!(resolved, "archive/reports/2024/20240305/093007_q1.tar.gz");
    }

    #[test]
    fn test_file_without_directory_or_extension() {
        let fields = path_fields(&file("README", 0), &target("", "", "", "")).unwrap();
        assert_eq!(fields.dir, ".");
        assert_eq!(fields.name, "README");
        assert_eq!(fields.extension, "");
        assert_eq!(fields.date, "");
    }

    #[test]
    fn test_deterministic() {
        let f = file("a/b.txt", 1_700_000_000);
        let t = target("x", "{{.Dir}}/{{.Date}}-{{.Name}}", "Jan _2 2006", "3:04PM");
        assert_eq!(target_path(&f, &t).unwrap(), target_path(&f, &t).unwrap());
    }

    #[test]
    fn test_layout_translation() {
        let ts = march_fifth();
        assert_eq!(format_timestamp(ts, "2006-01-02").unwrap(), "2024-03-05");
        assert_eq!(format_timestamp(ts, "15:04:05").unwrap(), "09:30:07");
        assert_eq!(format_timestamp(ts, "Jan 2, 2006").unwrap(), "Mar 5, 2024");
        assert_eq!(format_timestamp(ts, "Monday 3PM").unwrap(), "Tuesday 9AM");
        assert_eq!(format_timestamp(ts, "002").unwrap(), "065");
        assert_eq!(format_timestamp(ts, "%Y/%m").unwrap(), "2024/03");
    }

    #[test]
    fn test_invalid_strftime_is_rejected() {
        assert!(matches!(
            format_timestamp(0, "%Q"),
            Err(SyncError::InvalidTimeFormat { .. })
        ));
    }

    #[test]
    fn test_template_parse_errors() {
        for bad in ["{{.Name", "{{end}}", "{{if .Dir}}open"] {
            assert!(
                matches!(PathTemplate::parse(bad), Err(SyncError::InvalidTemplate { .. })),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_go_template_syntax() {
        let f = file("reports/q1.csv", march_fifth());
        let cases = [
            ("{{- .Name}}.{{.Extension}}", "out/q1.csv"),
            ("{{/* dated copy */}}{{.Name}}.{{.Extension}}", "out/q1.csv"),
            ("{{if .Dir}}{{.Dir}}/{{end}}{{.Name}}", "out/reports/q1"),
            ("{{.Name | printf \"%s-final\"}}.{{.Extension}}", "out/q1-final.csv"),
        ];

        for (pattern, expected) in cases {
            let resolved = target_path(&f, &target("out", pattern, "", "")).unwrap();
            assert_eq!(resolved, expected, "pattern {}", pattern);
        }
    }

    #[test]
    fn test_literal_only_template() {
        let template = PathTemplate::parse("static/name.txt").unwrap();
        let fields = path_fields(&file("x.y", 0), &target("", "", "", "")).unwrap();
        assert_eq!(template.render(&fields).unwrap(), "static/name.txt");
    }
}
