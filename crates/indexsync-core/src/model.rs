//! Domain entities mirrored into the search index.

use serde::{Deserialize, Serialize};

use crate::traits::IndexedEntity;
use crate::types::{Document, IndexKind, KEY_FIELD};

/// A software license as persisted by the relational store.
///
/// - `uuid`: stable identity, used as the index key
/// - `license_id`: SPDX-style code, e.g. "MIT"
/// - `name`: display name
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct License {
    pub uuid: String,
    #[serde(default, alias = "licenseId")]
    pub license_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl License {
    pub fn new(uuid: impl Into<String>, license_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { uuid: uuid.into(), license_id: Some(license_id.into()), name: Some(name.into()) }
    }
}

impl IndexedEntity for License {
    fn kind(&self) -> IndexKind { IndexKind::License }

    fn uuid(&self) -> &str { &self.uuid }

    fn to_document(&self) -> Document {
        Document::for_kind(self.kind(), |field| match field {
            KEY_FIELD => Some(self.uuid.clone()),
            "licenseid" => self.license_id.clone(),
            "name" => self.name.clone(),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Project {
    pub uuid: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Project {
    pub fn new(uuid: impl Into<String>, name: impl Into<String>) -> Self {
        Self { uuid: uuid.into(), name: Some(name.into()), ..Self::default() }
    }
}

impl IndexedEntity for Project {
    fn kind(&self) -> IndexKind { IndexKind::Project }

    fn uuid(&self) -> &str { &self.uuid }

    fn to_document(&self) -> Document {
        Document::for_kind(self.kind(), |field| match field {
            KEY_FIELD => Some(self.uuid.clone()),
            "name" => self.name.clone(),
            "version" => self.version.clone(),
            "description" => self.description.clone(),
            _ => None,
        })
    }
}
