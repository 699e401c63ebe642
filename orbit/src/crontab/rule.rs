use super::sample::TimeSample;
use crate::error::{CrontabError, FieldKind};

use std::fmt;
use std::str::FromStr;

/// A parsed crontab field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Matches any value.
    Wildcard,

    /// Matches the values whose bits are set.
    ///
    /// Every field value fits below 64, so bit `n` stands for value `n`.
    Set(u64),
}

/// Result of parsing one comma-separated item.
enum Item {
    Wildcard,
    Mask(u64),
}

impl Field {
    /// Parses the rule text of one field.
    ///
    /// A list whose values cover the whole range of the field is
    /// normalized to [`Field::Wildcard`].
    pub fn parse(kind: FieldKind, rule: &str) -> Result<Self, CrontabError> {
        let mut mask = 0u64;
        let mut wildcard = false;

        // Every item is validated even once a wildcard has been seen.
        for item in rule.split(',') {
            match parse_item(kind, item, rule)? {
                Item::Wildcard => wildcard = true,
                Item::Mask(bits) => mask |= bits,
            }
        }

        let (min, max) = kind.bounds();

        if wildcard || mask == span(min, max, 1) {
            Ok(Field::Wildcard)
        } else {
            Ok(Field::Set(mask))
        }
    }

    /// Returns `true` if `value` satisfies this field.
    pub fn matches(&self, value: u8) -> bool {
        match self {
            Field::Wildcard => true,
            Field::Set(mask) => value < 64 && mask & (1u64 << value) != 0,
        }
    }

    /// The explicit values of the field, ascending, or `None` for a wildcard.
    pub fn values(&self) -> Option<Vec<u8>> {
        match self {
            Field::Wildcard => None,
            Field::Set(mask) => Some((0u8..64).filter(|v| mask & (1u64 << v) != 0).collect()),
        }
    }
}

/// Parses one list item into a bit mask.
fn parse_item(kind: FieldKind, item: &str, rule: &str) -> Result<Item, CrontabError> {
    let (min, max) = kind.bounds();

    if item == "*" || item == "*/1" {
        return Ok(Item::Wildcard);
    }

    let (start, end, step) = if let Some(step) = item.strip_prefix("*/") {
        (u32::from(min), u32::from(max), parse_step(kind, step, rule)?)
    } else {
        let (range, step) = match item.split_once('/') {
            Some((range, step)) => (range, Some(parse_step(kind, step, rule)?)),
            None => (item, None),
        };

        match (range.split_once('-'), step) {
            (Some((start, end)), step) => (
                parse_value(kind, start, rule)?,
                parse_value(kind, end, rule)?,
                step.unwrap_or(1),
            ),
            // A step needs an explicit range.
            (None, Some(_)) => return Err(CrontabError::syntax(kind, rule)),
            (None, None) => {
                let value = parse_value(kind, range, rule)?;
                (value, value, 1)
            }
        }
    };

    if start < u32::from(min) || end > u32::from(max) || step > u32::from(max) || start > end {
        return Err(CrontabError::range(kind, rule));
    }

    if step == 1 && start == u32::from(min) && end == u32::from(max) {
        return Ok(Item::Wildcard);
    }

    Ok(Item::Mask(span(start as u8, end as u8, step as usize)))
}

/// One or two decimal digits.
fn parse_value(kind: FieldKind, text: &str, rule: &str) -> Result<u32, CrontabError> {
    if text.is_empty() || text.len() > 2 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CrontabError::syntax(kind, rule));
    }

    text.parse().map_err(|_| CrontabError::syntax(kind, rule))
}

/// A positive decimal without a leading zero.
fn parse_step(kind: FieldKind, text: &str, rule: &str) -> Result<u32, CrontabError> {
    if text.is_empty() || text.starts_with('0') || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CrontabError::syntax(kind, rule));
    }

    // Syntactically valid but too long for u32 is still out of range.
    text.parse().map_err(|_| CrontabError::range(kind, rule))
}

/// Bit mask of `start..=end` stepping by `step`.
fn span(start: u8, end: u8, step: usize) -> u64 {
    (start..=end)
        .step_by(step)
        .fold(0u64, |mask, value| mask | (1u64 << value))
}

/// A complete five-field crontab rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    fields: [Field; 5],
}

impl Rule {
    /// Rule matching every minute.
    pub const EVERY_MINUTE: Rule = Rule {
        fields: [Field::Wildcard; 5],
    };

    /// Parses the fields in the order minute, hour, day of month, month,
    /// day of week.
    ///
    /// Missing trailing fields default to `*`. More than five fields is
    /// a syntax error. Parsing stops at the first invalid field.
    pub fn parse(rules: &[&str]) -> Result<Self, CrontabError> {
        if rules.len() > FieldKind::ALL.len() {
            return Err(CrontabError::syntax(FieldKind::DayOfWeek, &rules[4..].join(" ")));
        }

        let mut fields = [Field::Wildcard; 5];

        for (index, kind) in FieldKind::ALL.into_iter().enumerate() {
            if let Some(rule) = rules.get(index) {
                fields[index] = Field::parse(kind, rule)?;
            }
        }

        Ok(Self { fields })
    }

    /// The parsed field of the given kind.
    pub fn field(&self, kind: FieldKind) -> Field {
        self.fields[kind as usize]
    }

    /// Returns `true` if every field is a wildcard or contains the
    /// sample's value.
    pub fn matches(&self, sample: &TimeSample) -> bool {
        FieldKind::ALL
            .into_iter()
            .all(|kind| self.field(kind).matches(sample.value(kind)))
    }
}

impl FromStr for Rule {
    type Err = CrontabError;

    /// Parses a whitespace-separated expression such as `"*/15 9-17 * * 1-5"`.
    fn from_str(expr: &str) -> Result<Self, Self::Err> {
        let rules: Vec<&str> = expr.split_whitespace().collect();
        Rule::parse(&rules)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.values() {
            None => f.write_str("*"),
            Some(values) => {
                let list: Vec<String> = values.iter().map(u8::to_string).collect();
                f.write_str(&list.join(","))
            }
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [minute, hour, dom, month, dow] = &self.fields;
        write!(f, "{minute} {hour} {dom} {month} {dow}")
    }
}
