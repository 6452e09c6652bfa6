use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::QueryError;
use crate::geometry::Geometry;

/// External feature record: geometry plus GIS attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Optional feature class name, e.g. the dataset or layer it came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
    pub geometry: Geometry,
}

impl Feature {
    /// Creates a new feature with empty attributes.
    pub fn new(geometry: Geometry) -> Self {
        Self {
            class: None,
            attributes: BTreeMap::new(),
            geometry,
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

static AND_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+AND\s+").expect("AND pattern compiles"));
static TERM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_]*)\s*=\s*(?:'([^']*)'|(-?\d+(?:\.\d+)?))\s*$")
        .expect("term pattern compiles")
});

#[derive(Debug, Clone, PartialEq)]
enum Expected {
    Text(String),
    Number(f64),
}

/// Attribute filter of the form `name = 'text' AND code = 12`.
///
/// An empty clause and the tautology `1=1` match everything.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttributeFilter {
    terms: Vec<(String, Expected)>,
}

impl AttributeFilter {
    pub fn parse(clause: &str) -> Result<Self, QueryError> {
        let trimmed = clause.trim();
        if trimmed.is_empty() || trimmed.replace(' ', "") == "1=1" {
            return Ok(Self::default());
        }
        let terms = AND_RE
            .split(trimmed)
            .map(|term| {
                let caps = TERM_RE
                    .captures(term)
                    .ok_or_else(|| QueryError::InvalidWhereClause(clause.to_string()))?;
                let name = caps[1].to_string();
                let expected = match (caps.get(2), caps.get(3)) {
                    (Some(text), _) => Expected::Text(text.as_str().to_string()),
                    (None, Some(num)) => Expected::Number(
                        num.as_str()
                            .parse()
                            .map_err(|_| QueryError::InvalidWhereClause(clause.to_string()))?,
                    ),
                    (None, None) => return Err(QueryError::InvalidWhereClause(clause.to_string())),
                };
                Ok((name, expected))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { terms })
    }

    pub fn matches(&self, feature: &Feature) -> bool {
        self.terms.iter().all(|(name, expected)| {
            match (feature.attributes.get(name), expected) {
                (Some(Value::String(s)), Expected::Text(t)) => s == t,
                (Some(Value::Number(n)), Expected::Number(x)) => {
                    n.as_f64().map_or(false, |v| (v - x).abs() < 1e-9)
                }
                (Some(Value::Number(n)), Expected::Text(t)) => n.to_string() == *t,
                (Some(Value::String(s)), Expected::Number(x)) => {
                    s.parse::<f64>().map_or(false, |v| (v - x).abs() < 1e-9)
                }
                _ => false,
            }
        })
    }
}
