use crate::attribute::{self, Attribute, AttributeTree};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;


/// Class marker identifying feature entities.
pub const FEATURE_MARKER: &str = "feature";

/// Key of the entity collection in a device status response.
pub const ENTITIES_KEY: &str = "entities";

/// A node of the device status tree.
///
/// `class_path[0]` is the dotted class identifier (e.g.
/// `"heating.circuits.0.operating.modes.active"`), `class_path[1]` the kind
/// marker.
#[derive(Clone, Debug, Deserialize)]
pub struct Entity {
    #[serde(rename = "class", default)]
    pub class_path: Vec<String>,

    #[serde(default)]
    pub properties: Option<HashMap<String, Property>>,
}

/// A typed entity property, e.g. `{"type": "number", "value": 47.1}`.
#[derive(Clone, Debug, Deserialize)]
pub struct Property {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    #[serde(default)]
    pub value: Option<Value>,
}

impl Entity {
    /// Dotted identifier split into path segments, if the entity is a
    /// feature with at least one property.
    fn feature_path(&self) -> Option<Vec<&str>> {
        if self.class_path.len() < 2 || self.class_path[1] != FEATURE_MARKER {
            return None;
        }
        if self.properties.as_ref().map_or(true, |p| p.is_empty()) {
            return None;
        }

        let segments: Vec<&str> = self.class_path[0].split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return None;
        }
        Some(segments)
    }
}

/// Flattening errors
#[derive(Debug, Clone, PartialEq)]
pub enum FlattenError {
    /// Top-level payload has no entity collection
    MalformedResponse(String),
}

impl fmt::Display for FlattenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlattenError::MalformedResponse(reason) => {
                write!(f, "malformed status response: {}", reason)
            }
        }
    }
}

impl std::error::Error for FlattenError {}

/// Build the attribute tree for a list of entities.
///
/// Each feature entity's class identifier is walked as a key path and its
/// properties are deposited at the node reached. Entities sharing a prefix
/// share sub-trees. Entities that are not features or carry no properties
/// are skipped. If the same property path repeats, the last one wins.
pub fn flatten(entities: &[Entity]) -> AttributeTree {
    let mut tree = AttributeTree::new();

    for entity in entities {
        let Some(path) = entity.feature_path() else {
            debug!(class = ?entity.class_path, "Skipping non-feature or empty entity");
            continue;
        };

        let node = attribute::descend(&mut tree, path);
        for (name, property) in entity.properties.iter().flatten() {
            match property.value.as_ref().and_then(Attribute::from_json) {
                Some(value) => attribute::merge_insert(node, name.clone(), value),
                None => debug!(
                    class = %entity.class_path[0],
                    property = %name,
                    kind = ?property.kind,
                    "Skipping property without value"
                ),
            }
        }
    }

    tree
}

/// Extract the entity collection from a raw status response.
///
/// Elements that do not deserialize as entities are skipped; a response
/// without an `entities` array is malformed.
pub fn parse_entities(response: &Value) -> Result<Vec<Entity>, FlattenError> {
    let items = match response.get(ENTITIES_KEY) {
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(FlattenError::MalformedResponse(format!(
                "'{}' is not an array",
                ENTITIES_KEY
            )))
        }
        None => {
            return Err(FlattenError::MalformedResponse(format!(
                "'{}' missing",
                ENTITIES_KEY
            )))
        }
    };

    let entities = items
        .iter()
        .filter_map(|item| match Entity::deserialize(item) {
            Ok(entity) => Some(entity),
            Err(e) => {
                debug!(error = %e, "Skipping undecodable entity");
                None
            }
        })
        .collect();

    Ok(entities)
}

/// Parse and flatten a raw status response in one step.
pub fn flatten_response(response: &Value) -> Result<AttributeTree, FlattenError> {
    let entities = parse_entities(response)?;
    Ok(flatten(&entities))
}
