use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{DEFAULT_PROVINCE, DEFAULT_SUBJECT};

/// Cache key for one distribution table: a province and a subject track
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableKey {
    pub province: String,
    pub subject: String,
}

impl TableKey {
    pub fn new(province: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            province: province.into(),
            subject: subject.into(),
        }
    }
}

impl Default for TableKey {
    fn default() -> Self {
        Self::new(DEFAULT_PROVINCE, DEFAULT_SUBJECT)
    }
}

impl fmt::Display for TableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.province, self.subject)
    }
}

/// Score column of a distribution file. Usually a single score ("694"),
/// but the top bucket is published as a range ("695-750").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScoreLabel {
    Number(f64),
    Text(String),
}

impl ScoreLabel {
    /// Numeric position of this label. Ranges sit at their midpoint, and
    /// labels with trailing text ("120以下") use their leading number.
    pub fn value(&self) -> Option<f64> {
        match self {
            ScoreLabel::Number(n) if n.is_finite() => Some(*n),
            ScoreLabel::Number(_) => None,
            ScoreLabel::Text(s) => {
                let s = s.trim();
                if let Ok(n) = s.parse::<f64>() {
                    return n.is_finite().then_some(n);
                }
                if let Some((low, high)) = s.split_once('-') {
                    if let (Some(low), Some(high)) = (leading_number(low), leading_number(high)) {
                        return Some((low + high) / 2.0);
                    }
                }
                leading_number(s)
            }
        }
    }
}

/// Digits (with at most one decimal point) at the start of `s`
fn leading_number(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let mut end = 0;
    let mut seen_dot = false;
    for (i, c) in s.char_indices() {
        match c {
            '0'..='9' => end = i + 1,
            '.' if !seen_dot && end > 0 => seen_dot = true,
            _ => break,
        }
    }
    if end == 0 {
        return None;
    }
    s[..end].parse().ok()
}

impl fmt::Display for ScoreLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreLabel::Number(n) => write!(f, "{}", n),
            ScoreLabel::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One row as stored in a distribution file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEntry {
    pub score: ScoreLabel,
    pub num: u64,
    pub accumulate: u64,
}

/// Body of a distribution file or of the data endpoint.
/// The endpoint reports failures through `error`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDistribution {
    #[serde(default)]
    pub data: Vec<RawEntry>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

/// A table row with its score resolved to a number
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionEntry {
    pub label: String,
    pub score: f64,
    pub num: u64,
    pub accumulate: u64,
}

/// Result of a conversion. `approximate` is set when the table could not be
/// loaded and the linear fallback formula produced the value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Conversion<T> {
    pub value: T,
    pub approximate: bool,
}

/// A selectable option with its code and display name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub code: &'static str,
    pub name: &'static str,
}

pub const SUPPORTED_PROVINCES: &[Choice] = &[Choice {
    code: "hubei",
    name: "湖北",
}];

pub const SUPPORTED_SUBJECTS: &[Choice] = &[
    Choice {
        code: "physics",
        name: "首选物理",
    },
    Choice {
        code: "history",
        name: "首选历史",
    },
];
