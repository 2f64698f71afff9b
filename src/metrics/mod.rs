use crate::attribute::{lookup, Attribute, AttributeTree};
use crate::point::{FieldSet, FieldValue};
use std::fmt;

mod schema;

pub use schema::{HEATER_MEASUREMENT, HEATER_SCHEMA, SCHEMA_VERSION};

/// Expected value kind of a metric.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricKind {
    Text,
    /// Non-negative integer, written as an unsigned field
    Integer,
    /// Any number; rounded to `Some(decimals)` places when set
    Float(Option<u32>),
    Boolean,
    /// Length of the referenced list
    ListCount,
}

/// One schema entry: reporting name, attribute path, expected kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MetricSpec {
    pub name: &'static str,
    pub path: &'static str,
    pub kind: MetricKind,
}

impl MetricSpec {
    pub const fn text(name: &'static str, path: &'static str) -> Self {
        Self { name, path, kind: MetricKind::Text }
    }

    pub const fn integer(name: &'static str, path: &'static str) -> Self {
        Self { name, path, kind: MetricKind::Integer }
    }

    pub const fn float(name: &'static str, path: &'static str) -> Self {
        Self { name, path, kind: MetricKind::Float(None) }
    }

    pub const fn rounded(name: &'static str, path: &'static str, decimals: u32) -> Self {
        Self { name, path, kind: MetricKind::Float(Some(decimals)) }
    }

    pub const fn boolean(name: &'static str, path: &'static str) -> Self {
        Self { name, path, kind: MetricKind::Boolean }
    }

    pub const fn count(name: &'static str, path: &'static str) -> Self {
        Self { name, path, kind: MetricKind::ListCount }
    }

    /// Resolve this metric against the attribute tree.
    pub fn resolve(&self, tree: &AttributeTree) -> Result<FieldValue, MetricError> {
        let attr = lookup(tree, self.path).ok_or_else(|| MetricError::Missing {
            metric: self.name.to_string(),
            path: self.path.to_string(),
        })?;

        let value = match (self.kind, attr) {
            (MetricKind::Text, Attribute::Text(s)) => Some(FieldValue::Text(s.clone())),
            (MetricKind::Boolean, Attribute::Bool(b)) => Some(FieldValue::Boolean(*b)),
            (MetricKind::Integer, Attribute::Integer(i)) => {
                u64::try_from(*i).ok().map(FieldValue::UInteger)
            }
            (MetricKind::Integer, Attribute::Float(f)) if f.fract() == 0.0 && *f >= 0.0 => {
                Some(FieldValue::UInteger(*f as u64))
            }
            (MetricKind::Float(decimals), attr) => attr
                .as_f64()
                .map(|v| FieldValue::Float(decimals.map_or(v, |d| round_to(v, d)))),
            (MetricKind::ListCount, Attribute::List(items)) => {
                Some(FieldValue::UInteger(items.len() as u64))
            }
            _ => None,
        };

        value.ok_or_else(|| MetricError::WrongKind {
            metric: self.name.to_string(),
            path: self.path.to_string(),
            expected: self.kind,
            found: attr.kind_name(),
        })
    }
}

/// Metric lookup errors
#[derive(Debug, Clone, PartialEq)]
pub enum MetricError {
    /// Path does not resolve in the attribute tree
    Missing { metric: String, path: String },
    /// Path resolves to a value of the wrong kind (or to a sub-tree)
    WrongKind {
        metric: String,
        path: String,
        expected: MetricKind,
        found: &'static str,
    },
}

impl fmt::Display for MetricError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricError::Missing { metric, path } => {
                write!(f, "metric '{}': path '{}' not found", metric, path)
            }
            MetricError::WrongKind {
                metric,
                path,
                expected,
                found,
            } => write!(
                f,
                "metric '{}': expected {:?} at '{}', found {}",
                metric, expected, path, found
            ),
        }
    }
}

impl std::error::Error for MetricError {}

/// Map the attribute tree onto a metric schema.
///
/// Fields come out in schema order. The first metric that fails to resolve
/// fails the whole mapping; there is no partial field set.
pub fn map_to_metrics(tree: &AttributeTree, schema: &[MetricSpec]) -> Result<FieldSet, MetricError> {
    let mut fields = FieldSet::new();
    for spec in schema {
        fields.insert(spec.name, spec.resolve(tree)?);
    }
    Ok(fields)
}

/// Round the exact binary value to `decimals` places; exact ties go to the
/// even digit, so 4120.45 (stored as 4120.4499...) becomes 4120.4.
fn round_to(value: f64, decimals: u32) -> f64 {
    format!("{:.*}", decimals as usize, value)
        .parse()
        .unwrap_or(value)
}
