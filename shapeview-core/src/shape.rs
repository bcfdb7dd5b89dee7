/// Shape records: the single persisted entity of the catalog
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum number of characters accepted for a shape name
pub const NAME_MAX_CHARS: usize = 16;

/// Identifier of a shape record (milliseconds timestamp at creation)
pub type ShapeId = u64;

/// The four primitive kinds a shape can take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum ShapeKind {
    Sphere,
    Cylinder,
    /// Also the fallback for unrecognized stored types
    #[default]
    Cube,
    Cone,
}

impl ShapeKind {
    /// Selector order used by the creation form
    pub const ALL: [ShapeKind; 4] = [
        ShapeKind::Sphere,
        ShapeKind::Cylinder,
        ShapeKind::Cube,
        ShapeKind::Cone,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ShapeKind::Sphere => "Sphere",
            ShapeKind::Cylinder => "Cylinder",
            ShapeKind::Cube => "Cube",
            ShapeKind::Cone => "Cone",
        }
    }

    /// Decode a stored type string, falling back to `Cube` for anything
    /// outside the four known kinds.
    pub fn parse_lenient(value: &str) -> ShapeKind {
        value.parse().unwrap_or_else(|_| {
            log::warn!("unknown shape type {:?}, rendering as {}", value, ShapeKind::default());
            ShapeKind::default()
        })
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownShapeKind(pub String);

impl fmt::Display for UnknownShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown shape type: {}", self.0)
    }
}

impl std::error::Error for UnknownShapeKind {}

impl FromStr for ShapeKind {
    type Err = UnknownShapeKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShapeKind::ALL
            .into_iter()
            .find(|kind| kind.label() == s)
            .ok_or_else(|| UnknownShapeKind(s.to_string()))
    }
}

impl<'de> Deserialize<'de> for ShapeKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(ShapeKind::parse_lenient(&raw))
    }
}

/// A persisted shape: `{"id": number, "name": string, "type": string}`
///
/// A stored `type` outside the known kinds is kept as written so a later save
/// does not rewrite it; `kind` then holds the Cube fallback used for geometry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredShape", into = "StoredShape")]
pub struct ShapeRecord {
    pub id: ShapeId,
    pub name: String,
    pub kind: ShapeKind,
    unknown_type: Option<String>,
}

impl ShapeRecord {
    pub fn new(id: ShapeId, name: impl Into<String>, kind: ShapeKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            unknown_type: None,
        }
    }

    /// The `type` string as stored
    pub fn type_label(&self) -> &str {
        self.unknown_type.as_deref().unwrap_or(self.kind.label())
    }
}

#[derive(Clone, Serialize, Deserialize)]
struct StoredShape {
    id: ShapeId,
    name: String,
    #[serde(rename = "type")]
    kind: String,
}

impl From<StoredShape> for ShapeRecord {
    fn from(stored: StoredShape) -> Self {
        match stored.kind.parse::<ShapeKind>() {
            Ok(kind) => ShapeRecord::new(stored.id, stored.name, kind),
            Err(_) => ShapeRecord {
                kind: ShapeKind::parse_lenient(&stored.kind),
                unknown_type: Some(stored.kind),
                ..ShapeRecord::new(stored.id, stored.name, ShapeKind::default())
            },
        }
    }
}

impl From<ShapeRecord> for StoredShape {
    fn from(record: ShapeRecord) -> Self {
        StoredShape {
            kind: record.type_label().to_string(),
            id: record.id,
            name: record.name,
        }
    }
}

/// Validated creation input, before an id has been assigned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeDraft {
    pub name: String,
    pub kind: ShapeKind,
}

/// Truncate a name to at most `NAME_MAX_CHARS` characters
pub fn clamp_name(input: &str) -> String {
    input.chars().take(NAME_MAX_CHARS).collect()
}
