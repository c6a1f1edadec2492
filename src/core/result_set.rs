use super::error::{Result, ScoutError};
use super::types::{EnrichMode, Record};
use std::collections::HashSet;
use std::path::Path;

/// Caller-owned accumulator of records, threaded through every pipeline stage.
///
/// Persistence between runs happens only through [`ResultSet::load`] and
/// [`ResultSet::save_json`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    records: Vec<Record>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// Append records that pass the identity check.
    pub fn extend(&mut self, records: impl IntoIterator<Item = Record>) {
        self.records
            .extend(records.into_iter().filter(Record::has_identity));
    }

    /// Drop repeated `url + denomination` keys; the first occurrence wins.
    pub fn dedup(&mut self) {
        self.records = dedup_records(std::mem::take(&mut self.records));
    }

    /// Combine `incoming` with the accumulated set.
    ///
    /// In [`EnrichMode::Append`] an incoming record whose `url` already exists
    /// is dropped, leaving the existing record untouched. Returns how many
    /// records were added.
    pub fn absorb(&mut self, incoming: Vec<Record>, mode: EnrichMode) -> usize {
        match mode {
            EnrichMode::Replace => {
                self.records = incoming;
                self.records.len()
            }
            EnrichMode::Append => {
                let mut known: HashSet<String> =
                    self.records.iter().map(|r| r.url.clone()).collect();
                let mut added = 0;
                for record in incoming {
                    if known.insert(record.url.clone()) {
                        self.records.push(record);
                        added += 1;
                    }
                }
                added
            }
        }
    }

    /// Load a previously exported JSON array.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ScoutError::InputNotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        let records: Vec<Record> =
            serde_json::from_str(&text).map_err(|source| ScoutError::InvalidInput {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::from(records))
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        crate::features::export::write_json(path, &self.records)
    }
}

impl From<Vec<Record>> for ResultSet {
    fn from(records: Vec<Record>) -> Self {
        Self { records }
    }
}

/// Order-preserving deduplication by `url + denomination`.
pub fn dedup_records(records: Vec<Record>) -> Vec<Record> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(r.dedup_key()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(name: &str, url: &str) -> Record {
        Record {
            denomination: name.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_dedup_first_wins_and_is_idempotent() {
        let mut a = rec("A", "https://x/pros/1");
        a.ville = "Paris".into();
        let mut set = ResultSet::from(vec![
            a.clone(),
            rec("B", "https://x/pros/2"),
            rec("A", "https://x/pros/1"),
            rec("A bis", "https://x/pros/1"),
        ]);
        set.dedup();
        assert_eq!(set.len(), 3);
        assert_eq!(set.records()[0], a);

        let once = set.clone();
        set.dedup();
        assert_eq!(set, once);
    }

    #[test]
    fn test_append_skips_known_urls() {
        let mut existing = rec("A", "https://x/pros/1");
        existing.telephone = "01 23 45 67 89".into();
        let mut set = ResultSet::from(vec![existing.clone()]);

        let mut dup = rec("A renamed", "https://x/pros/1");
        dup.email = "a@b.fr".into();
        let added = set.absorb(vec![dup], EnrichMode::Append);

        assert_eq!(added, 0);
        assert_eq!(set.len(), 1);
        assert_eq!(set.records()[0], existing);

        let added = set.absorb(vec![rec("C", "https://x/pros/3")], EnrichMode::Append);
        assert_eq!(added, 1);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_replace_discards_prior_set() {
        let mut set = ResultSet::from(vec![rec("A", "u1"), rec("B", "u2")]);
        set.absorb(vec![rec("C", "u3")], EnrichMode::Replace);
        assert_eq!(set.len(), 1);
        assert_eq!(set.records()[0].denomination, "C");
    }

    #[test]
    fn test_extend_filters_noise() {
        let mut set = ResultSet::new();
        set.extend(vec![rec("3 photos", "u1"), rec("Garage", "u2"), rec("", "u3")]);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_load_missing_file_is_input_error() {
        let err = ResultSet::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ScoutError::InputNotFound(_)));
    }
}
