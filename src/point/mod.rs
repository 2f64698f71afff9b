use influxdb_line_protocol::LineProtocolBuilder;

/// Typed field value of a time-series point.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Float(f64),
    UInteger(u64),
    Boolean(bool),
    Text(String),
}

/// Ordered field name -> value mapping.
///
/// Fields keep insertion order; inserting an existing name replaces its value
/// in place.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldSet {
    fields: Vec<(String, FieldValue)>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// Builder stages are distinct types; the macro serves both the first field
// and the rest.
macro_rules! add_field {
    ($builder:expr, $name:expr, $value:expr) => {
        match $value {
            FieldValue::Float(f) => $builder.field($name, *f),
            FieldValue::UInteger(u) => $builder.field($name, *u),
            FieldValue::Boolean(b) => $builder.field($name, *b),
            FieldValue::Text(s) => $builder.field($name, s.as_str()),
        }
    };
}

/// A single time-series point: measurement name plus fields, no tags.
///
/// The timestamp is left to the storage server (write time).
#[derive(Clone, Debug, PartialEq)]
pub struct Point {
    pub measurement: String,
    pub fields: FieldSet,
}

impl Point {
    pub fn new(measurement: impl Into<String>, fields: FieldSet) -> Self {
        Self {
            measurement: measurement.into(),
            fields,
        }
    }

    /// Encode as one line of InfluxDB line protocol, without the trailing
    /// newline. Quoting, escaping and the `u` suffix of unsigned integers are
    /// left to the line protocol builder.
    ///
    /// Returns `None` for a point without fields, which the protocol cannot
    /// represent.
    pub fn to_line_protocol(&self) -> Option<String> {
        let mut fields = self.fields.iter();
        let (name, value) = fields.next()?;

        let mut builder = add_field!(
            LineProtocolBuilder::new().measurement(&self.measurement),
            name,
            value
        );
        for (name, value) in fields {
            builder = add_field!(builder, name, value);
        }

        let bytes = builder.close_line().build();
        Some(String::from_utf8_lossy(&bytes).trim_end_matches('\n').to_string())
    }
}
