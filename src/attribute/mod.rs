use serde_json::Value;
use std::collections::BTreeMap;


/// Nested attribute map keyed by class path segment.
pub type AttributeTree = BTreeMap<String, Attribute>;

/// A node of the attribute tree: either a nested tree or a typed leaf.
#[derive(Clone, Debug, PartialEq)]
pub enum Attribute {
    Tree(AttributeTree),
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<Attribute>),
}

impl Attribute {
    /// Convert a JSON property value into an attribute.
    ///
    /// Objects become nested trees, arrays become lists. `null` is treated
    /// as absent and yields `None`; null list elements are dropped.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(Attribute::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Attribute::Integer(i)),
                None => n.as_f64().map(Attribute::Float),
            },
            Value::String(s) => Some(Attribute::Text(s.clone())),
            Value::Array(items) => Some(Attribute::List(
                items.iter().filter_map(Attribute::from_json).collect(),
            )),
            Value::Object(map) => Some(Attribute::Tree(
                map.iter()
                    .filter_map(|(k, v)| Attribute::from_json(v).map(|a| (k.clone(), a)))
                    .collect(),
            )),
        }
    }

    /// Short name of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Attribute::Tree(_) => "tree",
            Attribute::Bool(_) => "boolean",
            Attribute::Integer(_) => "integer",
            Attribute::Float(_) => "float",
            Attribute::Text(_) => "text",
            Attribute::List(_) => "list",
        }
    }

    /// Numeric value of an integer or float leaf.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Attribute::Integer(i) => Some(*i as f64),
            Attribute::Float(f) => Some(*f),
            _ => None,
        }
    }
}

/// Resolve a dotted path against the tree.
///
/// Segments address tree keys; a numeric segment applied to a list indexes
/// into it, so `heating.gas.consumption.total.year.0` reaches the first
/// element of the `year` list.
pub fn lookup<'a>(tree: &'a AttributeTree, path: &str) -> Option<&'a Attribute> {
    let mut segments = path.split('.');
    let mut node = tree.get(segments.next()?)?;

    for segment in segments {
        node = match node {
            Attribute::Tree(children) => children.get(segment)?,
            Attribute::List(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(node)
}

/// Walk `path` from `tree`, creating tree nodes as needed, and return the
/// tree at its end.
///
/// A leaf found where a tree is needed is replaced by an empty tree.
pub(crate) fn descend<'a, I, S>(tree: &'a mut AttributeTree, path: I) -> &'a mut AttributeTree
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut node = tree;
    for segment in path {
        let slot = node
            .entry(segment.into())
            .or_insert_with(|| Attribute::Tree(AttributeTree::new()));
        if !matches!(slot, Attribute::Tree(_)) {
            *slot = Attribute::Tree(AttributeTree::new());
        }
        node = match slot {
            Attribute::Tree(children) => children,
            _ => unreachable!("slot was just set to a tree"),
        };
    }
    node
}

/// Insert `value` under `key`, merging into an existing tree when both the
/// existing and the new node are trees. Anything else is last-writer-wins.
pub(crate) fn merge_insert(tree: &mut AttributeTree, key: String, value: Attribute) {
    match (tree.get_mut(&key), value) {
        (Some(Attribute::Tree(existing)), Attribute::Tree(incoming)) => {
            for (k, v) in incoming {
                merge_insert(existing, k, v);
            }
        }
        (_, value) => {
            tree.insert(key, value);
        }
    }
}
