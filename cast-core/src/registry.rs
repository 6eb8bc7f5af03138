//! Stable numeric identities and the compact persisted record format.
//!
//! Each novel gets its own identity space. An identity is assigned the first
//! time a name is synced and is never reassigned or reused afterwards, even
//! if the name stops appearing.
//!
//! Stored data is read leniently: older writers used a name-indexed layout
//! and stored numbers as strings, so every field falls back to a sane
//! default instead of failing the whole load.

use crate::character::{CharacterMap, CharacterRecord};
use crate::gender::Gender;
use crate::persist::{StoreClient, SyncError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// Shortest name that gets an identity, in characters.
pub const MIN_NAME_CHARS: usize = 2;

/// Longest name that gets an identity, in characters.
pub const MAX_NAME_CHARS: usize = 50;

/// Default number of evidence strings written per record.
pub const DEFAULT_EVIDENCE_CAP: usize = 5;

// ============================================================================
// Lenient field parsing
// ============================================================================

fn number_from(value: &Value) -> Option<f64> {
    let number: Option<f64> = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

fn de_gender<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Gender, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_str().map(Gender::from_code).unwrap_or_default())
}

fn ser_gender<S: Serializer>(gender: &Gender, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(gender.code())
}

fn de_confidence<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(number_from(&value)
        .filter(|n| (0.0..=1.0).contains(n))
        .unwrap_or(0.0))
}

fn de_appearances<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(number_from(&value)
        .filter(|n| *n >= 1.0)
        .map(|n| n.min(f64::from(u32::MAX)) as u32)
        .unwrap_or(1))
}

fn de_evidence<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.is_empty() => Some(s),
                _ => None,
            })
            .collect(),
        Value::String(s) if !s.is_empty() => vec![s],
        _ => Vec::new(),
    })
}

fn de_name<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_str().map(str::trim).unwrap_or_default().to_string())
}

fn de_identity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(number_from(&value)
        .filter(|n| *n >= 0.0 && n.fract() == 0.0 && *n <= f64::from(u32::MAX))
        .map(|n| n as u32))
}

fn one() -> u32 {
    1
}

// ============================================================================
// Record formats
// ============================================================================

/// One character as written to the store, keyed by identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompactRecord {
    #[serde(default, deserialize_with = "de_name")]
    pub name: String,

    /// `m`, `f` or `u` on the wire.
    #[serde(default, serialize_with = "ser_gender", deserialize_with = "de_gender")]
    pub gender: Gender,

    #[serde(default, deserialize_with = "de_confidence")]
    pub confidence: f64,

    #[serde(default = "one", deserialize_with = "de_appearances")]
    pub appearances: u32,

    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "de_evidence")]
    pub evidence: Vec<String>,
}

impl CompactRecord {
    /// Compact a record, keeping at most `evidence_cap` evidence strings.
    pub fn from_record(record: &CharacterRecord, evidence_cap: usize) -> Self {
        Self {
            name: record.name.clone(),
            gender: record.gender,
            confidence: if record.confidence.is_finite() {
                record.confidence.clamp(0.0, 1.0)
            } else {
                0.0
            },
            appearances: record.appearances.max(1),
            evidence: record.evidence.iter().take(evidence_cap).cloned().collect(),
        }
    }

    /// Expand back into a full record carrying `identity`.
    pub fn to_record(&self, identity: u32) -> CharacterRecord {
        CharacterRecord {
            name: self.name.clone(),
            gender: self.gender,
            confidence: self.confidence,
            appearances: self.appearances,
            evidence: self.evidence.clone(),
            identity: Some(identity),
        }
    }
}

/// A record in the older name-indexed layout. The name is the map key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedRecord {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "de_identity")]
    pub id: Option<u32>,

    #[serde(default, serialize_with = "ser_gender", deserialize_with = "de_gender")]
    pub gender: Gender,

    #[serde(default, deserialize_with = "de_confidence")]
    pub confidence: f64,

    #[serde(default = "one", deserialize_with = "de_appearances")]
    pub appearances: u32,

    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "de_evidence")]
    pub evidence: Vec<String>,
}

impl NamedRecord {
    fn to_record(&self, name: &str) -> CharacterRecord {
        CharacterRecord {
            name: name.trim().to_string(),
            gender: self.gender,
            confidence: self.confidence,
            appearances: self.appearances,
            evidence: self.evidence.clone(),
            identity: self.id,
        }
    }
}

/// Character data as found in the store.
///
/// Serialized untagged. Deserialization goes through
/// [`StoredCharacters::from_value`] and never fails.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StoredCharacters {
    /// `identity → record`, the current layout.
    Compact(BTreeMap<u32, CompactRecord>),
    /// `name → record`, identity optional.
    Named(BTreeMap<String, NamedRecord>),
}

impl Default for StoredCharacters {
    fn default() -> Self {
        StoredCharacters::Compact(BTreeMap::new())
    }
}

impl<'de> Deserialize<'de> for StoredCharacters {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}

impl StoredCharacters {
    /// Parse whatever the store returned.
    ///
    /// An object whose keys are all integers is the compact layout; any
    /// other object is name-indexed. A JSON string containing either is
    /// parsed first. Anything else is logged and treated as empty, as are
    /// individual entries that are not objects.
    pub fn from_value(value: Value) -> Self {
        let value = match value {
            Value::Null => return Self::default(),
            Value::String(raw) => match serde_json::from_str(&raw) {
                Ok(parsed) => parsed,
                Err(e) => {
                    log::warn!("Ignoring unparseable stored character data: {e}");
                    return Self::default();
                }
            },
            other => other,
        };

        let Value::Object(entries) = value else {
            log::warn!("Ignoring stored character data that is not an object");
            return Self::default();
        };

        if entries.keys().all(|key| key.trim().parse::<u32>().is_ok()) {
            StoredCharacters::Compact(
                entries
                    .into_iter()
                    .filter_map(|(key, entry)| {
                        let identity = key.trim().parse().ok()?;
                        let record = serde_json::from_value(entry).ok()?;
                        Some((identity, record))
                    })
                    .collect(),
            )
        } else {
            StoredCharacters::Named(
                entries
                    .into_iter()
                    .filter_map(|(name, entry)| Some((name, serde_json::from_value(entry).ok()?)))
                    .collect(),
            )
        }
    }

    pub fn len(&self) -> usize {
        match self {
            StoredCharacters::Compact(map) => map.len(),
            StoredCharacters::Named(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Full records with whatever identity was stored.
    pub fn records(&self) -> Vec<CharacterRecord> {
        match self {
            StoredCharacters::Compact(map) => map
                .iter()
                .map(|(&identity, record)| record.to_record(identity))
                .collect(),
            StoredCharacters::Named(map) => map
                .iter()
                .map(|(name, record)| record.to_record(name))
                .collect(),
        }
    }
}

// ============================================================================
// Registry
// ============================================================================

fn is_registrable(name: &str) -> bool {
    let chars = name.chars().count();
    (MIN_NAME_CHARS..=MAX_NAME_CHARS).contains(&chars)
}

/// Name → identity mapping for one novel.
#[derive(Debug, Clone)]
pub struct IdentityRegistry {
    novel_id: String,
    identities: BTreeMap<String, u32>,
    /// Always greater than every assigned or stored identity.
    next_id: u32,
    evidence_cap: usize,
}

impl IdentityRegistry {
    pub fn new(novel_id: impl Into<String>) -> Self {
        Self {
            novel_id: novel_id.into(),
            identities: BTreeMap::new(),
            next_id: 0,
            evidence_cap: DEFAULT_EVIDENCE_CAP,
        }
    }

    /// Set how many evidence strings are written per record.
    pub fn with_evidence_cap(mut self, cap: usize) -> Self {
        self.evidence_cap = cap;
        self
    }

    /// Rebuild a registry from stored data.
    ///
    /// Returns the registry and the stored records as a character map.
    pub fn from_stored(novel_id: impl Into<String>, stored: &StoredCharacters) -> (Self, CharacterMap) {
        let mut registry = Self::new(novel_id);
        let map = registry.absorb(stored);
        (registry, map)
    }

    pub fn novel_id(&self) -> &str {
        &self.novel_id
    }

    pub fn identity_of(&self, name: &str) -> Option<u32> {
        self.identities.get(name).copied()
    }

    /// The identity the next new name will get.
    pub fn next_identity(&self) -> u32 {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    /// Move the counter past `identity`, whether or not it was accepted.
    fn reserve(&mut self, identity: u32) {
        if let Some(next) = identity.checked_add(1) {
            self.next_id = self.next_id.max(next);
        }
    }

    /// Record an existing identity. Conflicting claims and the reserved
    /// `u32::MAX` are dropped.
    fn register(&mut self, name: &str, identity: u32) -> bool {
        self.reserve(identity);
        if identity == u32::MAX
            || self.identities.contains_key(name)
            || self.identities.values().any(|&id| id == identity)
        {
            return false;
        }
        self.identities.insert(name.to_string(), identity);
        true
    }

    /// Hand out the next identity, or `None` once the space is exhausted.
    fn allocate(&mut self, name: &str) -> Option<u32> {
        let identity = self.next_id;
        if identity == u32::MAX {
            return None;
        }
        self.identities.insert(name.to_string(), identity);
        self.next_id = identity + 1;
        Some(identity)
    }

    /// Learn identities from stored data and return its records.
    ///
    /// Records with unusable names are skipped. When two stored entries
    /// claim the same name or identity, the first one (in key order) wins.
    pub fn absorb(&mut self, stored: &StoredCharacters) -> CharacterMap {
        let mut map = CharacterMap::new();
        for mut record in stored.records() {
            if !is_registrable(&record.name) {
                log::debug!("Skipping stored record with unusable name {:?}", record.name);
                continue;
            }
            if let Some(identity) = record.identity {
                if !self.register(&record.name, identity) {
                    record.identity = self.identity_of(&record.name);
                }
            }
            match map.get_mut(&record.name) {
                Some(existing) => existing.merge(&record),
                None => {
                    map.insert(record.name.clone(), record);
                }
            }
        }
        map
    }

    /// Give every registrable name in `map` an identity and build the
    /// compact map to persist.
    ///
    /// Known names keep their identity. New names are numbered in name
    /// order starting at [`IdentityRegistry::next_identity`].
    pub fn assign_identities(&mut self, map: &CharacterMap) -> BTreeMap<u32, CompactRecord> {
        let mut compact = BTreeMap::new();
        for (name, record) in map {
            if !is_registrable(name) {
                log::debug!("Not assigning an identity to {name:?}");
                continue;
            }

            let identity = match self.identity_of(name) {
                Some(identity) => Some(identity),
                None => match record.identity {
                    Some(stored) if self.register(name, stored) => Some(stored),
                    _ => self.allocate(name),
                },
            };
            let Some(identity) = identity else {
                log::warn!("Identity space exhausted, not storing {name:?}");
                continue;
            };
            compact.insert(identity, CompactRecord::from_record(record, self.evidence_cap));
        }
        compact
    }

    /// Merge stored records into `map`, assign identities and write the
    /// compact map back.
    ///
    /// Returns the number of records written. On failure `map` may already
    /// contain the merged stored records but nothing is lost.
    pub async fn sync(&mut self, client: &StoreClient, map: &mut CharacterMap) -> Result<usize, SyncError> {
        let stored = client.load_characters(&self.novel_id).await?;
        for (name, record) in self.absorb(&stored) {
            match map.get_mut(&name) {
                Some(existing) => existing.merge(&record),
                None => {
                    map.insert(name, record);
                }
            }
        }

        let compact = self.assign_identities(map);
        for (&identity, record) in &compact {
            if let Some(entry) = map.get_mut(&record.name) {
                entry.identity = Some(identity);
            }
        }

        let written = compact.len();
        client.save_characters(&self.novel_id, compact).await?;
        log::info!("Synced {written} characters for novel {}", self.novel_id);
        Ok(written)
    }
}
