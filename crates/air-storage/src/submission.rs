//! Registration records and the append-only submission list.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::storage::{Clock, KeyValueStore, StorageError};

/// How the registrant wants to contribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "forma")]
pub enum Contribution {
    /// Volunteer work in the checked areas.
    #[serde(rename = "voluntario")]
    Volunteer { areas: Vec<String> },
    /// Donation through the chosen method.
    #[serde(rename = "doador")]
    Donor {
        #[serde(rename = "metodo")]
        method: String,
    },
}

impl Contribution {
    /// The `forma` tag.
    #[must_use]
    pub fn mode(&self) -> &'static str {
        match self {
            Self::Volunteer { .. } => "voluntario",
            Self::Donor { .. } => "doador",
        }
    }
}

/// A validated registration form payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
    #[serde(rename = "contato")]
    pub contact: String,
    /// Date of birth as entered (`YYYY-MM-DD`).
    #[serde(rename = "nascimento")]
    pub birth_date: String,
    /// Region (state) code.
    #[serde(rename = "uf")]
    pub region: String,
    #[serde(flatten)]
    pub contribution: Contribution,
}

/// A stored registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    #[serde(rename = "createdAt", with = "iso_millis")]
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub registration: Registration,
}

/// `toISOString()`-compatible timestamps: millisecond precision, `Z` suffix.
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let text = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&text)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// Append-only submission list stored as one JSON array.
///
/// Every save reads the whole list, appends, and writes it back. Concurrent
/// writers (other tabs) are not coordinated: the last write wins.
#[derive(Debug)]
pub struct SubmissionStore<S, C> {
    store: S,
    clock: C,
    key: String,
}

impl<S: KeyValueStore, C: Clock> SubmissionStore<S, C> {
    pub fn new(store: S, clock: C, key: impl Into<String>) -> Self {
        Self {
            store,
            clock,
            key: key.into(),
        }
    }

    /// Clock used to stamp submissions.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Storage key holding the list.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Append `registration` stamped with the current time.
    ///
    /// Existing entries are preserved as stored, including ones this
    /// version cannot interpret. A list that is not valid JSON is replaced.
    ///
    /// # Errors
    ///
    /// Returns the backend error if the list cannot be read or written.
    pub fn save(&self, registration: Registration) -> Result<Submission, StorageError> {
        let raw = self.store.get(&self.key)?;
        let mut entries = raw.as_deref().map(|text| self.parse_entries(text)).unwrap_or_default();

        let submission = Submission {
            created_at: self.clock.now(),
            registration,
        };
        entries.push(serde_json::to_value(&submission).map_err(|e| self.encode_error(&e))?);

        let text = serde_json::to_string(&entries).map_err(|e| self.encode_error(&e))?;
        self.store.set(&self.key, &text)?;

        tracing::debug!(
            key = %self.key,
            count = entries.len(),
            created_at = %submission.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            "Saved submission"
        );
        Ok(submission)
    }

    /// Stored submissions in insertion order.
    ///
    /// Returns an empty list if nothing is stored, the stored text is not a
    /// JSON array, or the backend cannot be read. Entries that do not
    /// describe a registration are skipped.
    #[must_use]
    pub fn list(&self) -> Vec<Submission> {
        self.entries()
            .into_iter()
            .filter_map(|entry| match serde_json::from_value(entry) {
                Ok(submission) => Some(submission),
                Err(e) => {
                    tracing::warn!(key = %self.key, error = %e, "Skipping unreadable submission");
                    None
                }
            })
            .collect()
    }

    /// Stored entries as raw JSON, in insertion order.
    ///
    /// Same fallbacks as [`list`](Self::list), but entries are returned
    /// untouched.
    #[must_use]
    pub fn entries(&self) -> Vec<Value> {
        match self.store.get(&self.key) {
            Ok(Some(text)) => self.parse_entries(&text),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read submissions");
                Vec::new()
            }
        }
    }

    fn parse_entries(&self, text: &str) -> Vec<Value> {
        match serde_json::from_str::<Vec<Value>>(text) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(
                    key = %self.key,
                    error = %e,
                    "Stored submissions are corrupt, starting over"
                );
                Vec::new()
            }
        }
    }

    fn encode_error(&self, err: &serde_json::Error) -> StorageError {
        StorageError::new(crate::StorageErrorKind::Other)
            .with_key(self.key.clone())
            .with_message(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::mock::{FixedClock, MemoryStore};

    const KEY: &str = "projetoAir_submissions_v1";

    fn clock() -> FixedClock {
        FixedClock::new(Utc.with_ymd_and_hms(2024, 3, 15, 12, 30, 0).unwrap())
    }

    fn volunteer() -> Registration {
        Registration {
            name: "Maria Silva".to_owned(),
            email: "maria@example.com".to_owned(),
            contact: "(11) 98765-4321".to_owned(),
            birth_date: "2000-05-20".to_owned(),
            region: "SP".to_owned(),
            contribution: Contribution::Volunteer {
                areas: vec!["educacao".to_owned(), "eventos".to_owned()],
            },
        }
    }

    fn donor() -> Registration {
        Registration {
            contribution: Contribution::Donor {
                method: "pix".to_owned(),
            },
            ..volunteer()
        }
    }

    #[test]
    fn test_save_writes_compatible_json() {
        let store = SubmissionStore::new(MemoryStore::new(), clock(), KEY);
        store.save(volunteer()).unwrap();

        let stored: Value = serde_json::from_str(&store.store.raw(KEY).unwrap()).unwrap();
        assert_eq!(
            stored,
            json!([{
                "createdAt": "2024-03-15T12:30:00.000Z",
                "nome": "Maria Silva",
                "email": "maria@example.com",
                "contato": "(11) 98765-4321",
                "nascimento": "2000-05-20",
                "uf": "SP",
                "forma": "voluntario",
                "areas": ["educacao", "eventos"]
            }])
        );
    }

    #[test]
    fn test_save_appends_in_order() {
        let store = SubmissionStore::new(MemoryStore::new(), clock(), KEY);
        let first = store.save(volunteer()).unwrap();
        store
            .clock
            .set(Utc.with_ymd_and_hms(2024, 3, 16, 9, 0, 0).unwrap());
        let second = store.save(donor()).unwrap();

        assert_eq!(store.list(), vec![first, second]);
        assert_eq!(store.store.writes(), 2);
    }

    #[test]
    fn test_donor_round_trips_method() {
        let store = SubmissionStore::new(MemoryStore::new(), clock(), KEY);
        store.save(donor()).unwrap();
        let entries = store.entries();
        assert_eq!(entries[0]["forma"], "doador");
        assert_eq!(entries[0]["metodo"], "pix");
        assert_eq!(store.list()[0].registration, donor());
    }

    #[test]
    fn test_list_empty_when_absent() {
        let store = SubmissionStore::new(MemoryStore::new(), clock(), KEY);
        assert_eq!(store.list(), vec![]);
    }

    #[test]
    fn test_corrupt_list_reads_empty_and_is_replaced() {
        let backend = MemoryStore::new().with_entry(KEY, "{not json");
        let store = SubmissionStore::new(backend, clock(), KEY);
        assert_eq!(store.list(), vec![]);

        store.save(volunteer()).unwrap();
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn test_save_preserves_foreign_entries() {
        let backend = MemoryStore::new().with_entry(KEY, r#"[{"nota": "legado"}]"#);
        let store = SubmissionStore::new(backend, clock(), KEY);

        store.save(volunteer()).unwrap();

        let entries = store.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], json!({"nota": "legado"}));
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn test_write_failure_propagates() {
        let backend = MemoryStore::new().with_failing_writes();
        let store = SubmissionStore::new(backend, clock(), KEY);
        let err = store.save(volunteer()).unwrap_err();
        assert_eq!(err.kind, crate::StorageErrorKind::QuotaExceeded);
        assert_eq!(store.store.raw(KEY), None);
    }

    #[test]
    fn test_read_failure_lists_empty() {
        let backend = MemoryStore::new()
            .with_entry(KEY, "[]")
            .with_failing_reads();
        let store = SubmissionStore::new(backend, clock(), KEY);
        assert_eq!(store.list(), vec![]);
        assert!(store.save(volunteer()).is_err());
    }

    #[test]
    fn test_reads_timestamps_without_millis() {
        let backend = MemoryStore::new().with_entry(
            KEY,
            r#"[{"createdAt":"2023-01-02T03:04:05Z","nome":"Ana","email":"a@b.co",
                "contato":"1199999999","nascimento":"1990-01-01","uf":"RJ",
                "forma":"doador","metodo":"boleto"}]"#,
        );
        let store = SubmissionStore::new(backend, clock(), KEY);
        let list = store.list();
        assert_eq!(
            list[0].created_at,
            Utc.with_ymd_and_hms(2023, 1, 2, 3, 4, 5).unwrap()
        );
        assert_eq!(list[0].registration.contribution.mode(), "doador");
    }

    #[test]
    fn test_key() {
        let store = SubmissionStore::new(MemoryStore::new(), clock(), "outra");
        assert_eq!(store.key(), "outra");
    }
}
