use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Admission-risk tier requested by the student
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// 冲: unlikely admission, aim high
    Reach,
    /// 稳: balanced
    #[default]
    Match,
    /// 保: safe fallback
    Safety,
}

impl Strategy {
    pub fn code(self) -> u8 {
        match self {
            Strategy::Reach => 0,
            Strategy::Match => 1,
            Strategy::Safety => 2,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Strategy::Reach),
            1 => Some(Strategy::Match),
            2 => Some(Strategy::Safety),
            _ => None,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl Serialize for Strategy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for Strategy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = flexible_int(deserializer)?;
        Strategy::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid strategy {}, expected 0, 1 or 2", code)))
    }
}

/// Integer that may arrive as a JSON number or as a string ("20"),
/// which is how query strings and some form clients send it.
fn flexible_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| serde::de::Error::custom(format!("expected an integer, got {}", n))),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("expected an integer, got '{}'", s))),
        other => Err(serde::de::Error::custom(format!(
            "expected an integer, got {}",
            other
        ))),
    }
}

fn flexible_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let n = flexible_int(deserializer)?;
    u32::try_from(n).map_err(|_| serde::de::Error::custom(format!("{} is out of range", n)))
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    20
}

/// Render a loosely typed value as one query/form parameter.
/// Null and empty strings are dropped; arrays are comma-joined.
pub fn param_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => {
            let joined = items
                .iter()
                .filter_map(param_value)
                .collect::<Vec<_>>()
                .join(",");
            (!joined.is_empty()).then_some(joined)
        }
        Value::Object(_) => Some(value.to_string()),
    }
}

/// Admission-report query. Used by the report route (query string or JSON
/// body) and the major-priority route (JSON body).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_first_choise: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_optional_choise: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub province: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub college_location: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest: Option<Value>,
    #[serde(default)]
    pub strategy: Strategy,
    #[serde(default = "default_page", deserialize_with = "flexible_u32")]
    pub page: u32,
    #[serde(default = "default_page_size", deserialize_with = "flexible_u32")]
    pub page_size: u32,
}

impl Default for ReportQuery {
    fn default() -> Self {
        Self {
            class_first_choise: None,
            class_optional_choise: None,
            province: None,
            rank: None,
            college_location: None,
            interest: None,
            strategy: Strategy::default(),
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

impl ReportQuery {
    /// Query parameters for the backend GET; empty filters are omitted,
    /// strategy and pagination are always sent
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let optional = [
            ("class_first_choise", &self.class_first_choise),
            ("class_optional_choise", &self.class_optional_choise),
            ("province", &self.province),
            ("rank", &self.rank),
            ("college_location", &self.college_location),
            ("interest", &self.interest),
        ];

        let mut params: Vec<(&'static str, String)> = optional
            .into_iter()
            .filter_map(|(name, value)| value.as_ref().and_then(param_value).map(|v| (name, v)))
            .collect();
        params.push(("strategy", self.strategy.to_string()));
        params.push(("page", self.page.to_string()));
        params.push(("page_size", self.page_size.to_string()));
        params
    }
}

/// Major-group detail query, relayed as JSON with exactly these fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MajorGroupQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_code: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub province: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_code: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subjects: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<Value>,
}

/// University-priority query as the web form submits it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniversityQuery {
    #[serde(default)]
    pub province: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub rank: Option<u64>,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub strategy: Strategy,
    #[serde(default)]
    pub college_types: Option<Vec<String>>,
    #[serde(default)]
    pub citys: Option<Vec<String>>,
    #[serde(default)]
    pub min_score: Option<f64>,
    #[serde(default)]
    pub max_score: Option<f64>,
    #[serde(default)]
    pub enrollment_plan: Option<String>,
    #[serde(default)]
    pub profile_id: Option<String>,
}

impl UniversityQuery {
    /// Backend form fields. Lists are comma-joined; absent and empty values
    /// are left out.
    pub fn to_form(&self) -> Vec<(&'static str, String)> {
        let fields: [(&'static str, Option<String>); 11] = [
            ("province", Some(self.province.clone())),
            ("score", Some(self.score.to_string())),
            ("rank", self.rank.map(|r| r.to_string())),
            ("subjects", Some(self.subjects.join(","))),
            ("strategy", Some(self.strategy.to_string())),
            ("college_type", self.college_types.as_ref().map(|t| t.join(","))),
            ("citys", self.citys.as_ref().map(|c| c.join(","))),
            ("min_score", self.min_score.map(|s| s.to_string())),
            ("max_score", self.max_score.map(|s| s.to_string())),
            ("enrollment_plan", self.enrollment_plan.clone()),
            ("profile_id", self.profile_id.clone()),
        ];

        fields
            .into_iter()
            .filter_map(|(name, value)| value.filter(|v| !v.is_empty()).map(|v| (name, v)))
            .collect()
    }
}
