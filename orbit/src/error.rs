//! Error types produced by the reactor.
//!
//! Rule parsing is the only validated path that can fail at registration
//! time. Everything else is infallible or reports unsupported operations
//! through a `bool`.

use std::fmt;
use thiserror::Error;

/// One of the five positional crontab fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Minute of the hour, `0..=59`.
    Minute,
    /// Hour of the day, `0..=23`.
    Hour,
    /// Day of the month, `1..=31`.
    DayOfMonth,
    /// Month of the year, `1..=12`.
    Month,
    /// Day of the week, `0..=6` with Sunday as `0`.
    DayOfWeek,
}

impl FieldKind {
    /// All fields in rule order.
    pub const ALL: [FieldKind; 5] = [
        FieldKind::Minute,
        FieldKind::Hour,
        FieldKind::DayOfMonth,
        FieldKind::Month,
        FieldKind::DayOfWeek,
    ];

    /// Inclusive `(min, max)` bounds of legal values.
    pub const fn bounds(self) -> (u8, u8) {
        match self {
            FieldKind::Minute => (0, 59),
            FieldKind::Hour => (0, 23),
            FieldKind::DayOfMonth => (1, 31),
            FieldKind::Month => (1, 12),
            FieldKind::DayOfWeek => (0, 6),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Minute => "minute",
            FieldKind::Hour => "hour",
            FieldKind::DayOfMonth => "day-of-month",
            FieldKind::Month => "month",
            FieldKind::DayOfWeek => "day-of-week",
        };
        f.write_str(name)
    }
}

/// # Errors produced while parsing a crontab rule.
///
/// Registration is atomic: when any field fails, no crontab is created.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CrontabError {
    /// The text does not match the rule grammar.
    #[error("invalid {field} rule {rule:?}: syntax error")]
    Syntax {
        /// Field in which the error occurred.
        field: FieldKind,
        /// The offending rule text.
        rule: String,
    },

    /// A start, end or step value lies outside the field bounds.
    #[error("invalid {field} rule {rule:?}: value out of range")]
    Range {
        /// Field in which the error occurred.
        field: FieldKind,
        /// The offending rule text.
        rule: String,
    },
}

impl CrontabError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use orbit::{CrontabError, FieldKind};
    ///
    /// let err = CrontabError::Range { field: FieldKind::Hour, rule: "99".into() };
    /// assert_eq!(err.as_label(), "crontab_range");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            CrontabError::Syntax { .. } => "crontab_syntax",
            CrontabError::Range { .. } => "crontab_range",
        }
    }

    /// The field the error was raised for.
    pub fn field(&self) -> FieldKind {
        match self {
            CrontabError::Syntax { field, .. } | CrontabError::Range { field, .. } => *field,
        }
    }

    pub(crate) fn syntax(field: FieldKind, rule: &str) -> Self {
        CrontabError::Syntax {
            field,
            rule: rule.to_string(),
        }
    }

    pub(crate) fn range(field: FieldKind, rule: &str) -> Self {
        CrontabError::Range {
            field,
            rule: rule.to_string(),
        }
    }
}
