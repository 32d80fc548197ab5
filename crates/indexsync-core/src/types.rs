//! Index-side types shared by the mapper, the store and the indexers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the unique-key field every kind carries.
pub const KEY_FIELD: &str = "uuid";

/// Identifies which physical index an entity's documents live in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    License,
    Project,
}

const LICENSE_SCHEMA: &[FieldDef] = &[
    FieldDef::key(),
    FieldDef::text("licenseid"),
    FieldDef::text("name"),
];

const PROJECT_SCHEMA: &[FieldDef] = &[
    FieldDef::key(),
    FieldDef::text("name"),
    FieldDef::text("version"),
    FieldDef::text("description"),
];

impl IndexKind {
    pub const ALL: [IndexKind; 2] = [IndexKind::License, IndexKind::Project];

    /// Ordered field schema; the key field always comes first.
    pub fn schema(self) -> &'static [FieldDef] {
        match self {
            IndexKind::License => LICENSE_SCHEMA,
            IndexKind::Project => PROJECT_SCHEMA,
        }
    }

    /// Fields a free-text query is run against.
    pub fn search_fields(self) -> &'static [&'static str] {
        match self {
            IndexKind::License => &["licenseid", "name"],
            IndexKind::Project => &["name", "version", "description"],
        }
    }

    /// Directory name of this kind below the index root.
    pub fn dir_name(self) -> &'static str {
        match self {
            IndexKind::License => "license",
            IndexKind::Project => "project",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.dir_name().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// One entry of a kind's field schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub stored: bool,
    pub analyzed: bool,
}

impl FieldDef {
    /// The unique-key field: stored, indexed untokenized.
    pub const fn key() -> Self {
        Self { name: KEY_FIELD, stored: true, analyzed: false }
    }

    /// A stored, analyzed free-text field.
    pub const fn text(name: &'static str) -> Self {
        Self { name, stored: true, analyzed: true }
    }

    pub fn is_key(&self) -> bool {
        self.name == KEY_FIELD
    }
}

/// A named value with its storage and analysis flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub value: Option<String>,
    pub stored: bool,
    pub analyzed: bool,
}

/// Flat field set for one entity instance.
///
/// Built fresh for every mutation and discarded after commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    fields: Vec<FieldSpec>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `value` under the schema entry `def`. A later value for the same
    /// name replaces the earlier one so a document never holds a field twice.
    pub fn push(&mut self, def: FieldDef, value: Option<String>) {
        let spec = FieldSpec { name: def.name, value, stored: def.stored, analyzed: def.analyzed };
        match self.fields.iter_mut().find(|f| f.name == def.name) {
            Some(existing) => *existing = spec,
            None => self.fields.push(spec),
        }
    }

    /// One field per entry of `kind`'s schema, in schema order, valued by `value_of`.
    pub fn for_kind<F>(kind: IndexKind, mut value_of: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut doc = Self::new();
        for def in kind.schema() {
            doc.push(*def, value_of(def.name));
        }
        doc
    }

    pub fn with(mut self, def: FieldDef, value: Option<String>) -> Self {
        self.push(def, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.iter().find(|f| f.name == name).and_then(|f| f.value.as_deref())
    }

    pub fn key(&self) -> Option<&str> {
        self.get(KEY_FIELD)
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// What the registry does with a failed index mutation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log the failure and report success; the index is reconciled later.
    #[default]
    Suppress,
    /// Hand the typed error back to the caller.
    Propagate,
}

/// The minimal surface returned by searches.
///
/// `id` is the document's unique key. Higher `score` is better.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub score: f32,
}
