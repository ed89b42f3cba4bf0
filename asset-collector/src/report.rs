use crate::models::{AssetRecord, TokenId};
use eth::types::Address;
use serde_json::Value;
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::{Display, Formatter},
};

/// Field name to number of records in which it is null.
pub type NullTally = BTreeMap<String, usize>;

/// Names of the serialized fields of `record` that are null.
pub fn null_fields(record: &AssetRecord) -> Vec<String> {
    match serde_json::to_value(record) {
        Ok(Value::Object(fields)) => fields
            .into_iter()
            .filter(|(_, value)| value.is_null())
            .map(|(name, _)| name)
            .collect(),
        _ => Vec::new(),
    }
}

pub fn null_tally(records: &[AssetRecord]) -> NullTally {
    let mut tally = NullTally::new();
    for name in records.iter().flat_map(null_fields) {
        *tally.entry(name).or_default() += 1;
    }
    tally
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CollectionCount {
    pub name: Option<String>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Summary {
    pub total: usize,
    pub containers: BTreeSet<Address>,
    pub unique_assets: BTreeSet<(Address, TokenId)>,
    pub collections: BTreeMap<Address, CollectionCount>,
    pub null_fields: NullTally,
}

impl Summary {
    pub fn from_records(records: &[AssetRecord]) -> Self {
        let mut collections: BTreeMap<Address, CollectionCount> = BTreeMap::new();
        for record in records {
            let entry = collections.entry(record.token_address).or_default();
            entry.count += 1;
            if entry.name.is_none() {
                entry.name = record.token_name.clone();
            }
        }
        Self {
            total: records.len(),
            containers: collections.keys().copied().collect(),
            unique_assets: records.iter().map(AssetRecord::key).collect(),
            collections,
            null_fields: null_tally(records),
        }
    }

    /// Records sharing a (container, id) pair with an earlier record.
    pub fn duplicates(&self) -> usize {
        self.total - self.unique_assets.len()
    }

    /// Percentage of records where `field` is null.
    pub fn null_rate(&self, field: &str) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let nulls = self.null_fields.get(field).copied().unwrap_or_default();
        nulls as f64 * 100.0 / self.total as f64
    }
}

impl Display for Summary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Total assets: {}", self.total)?;
        writeln!(f, "Unique collections: {}", self.containers.len())?;
        writeln!(f, "Unique assets: {}", self.unique_assets.len())?;
        if self.duplicates() > 0 {
            writeln!(f, "Duplicate assets: {}", self.duplicates())?;
        }
        writeln!(f, "Assets per collection:")?;
        for (address, collection) in &self.collections {
            writeln!(
                f,
                "  {} ({address}): {}",
                collection.name.as_deref().unwrap_or("Unknown"),
                collection.count
            )?;
        }
        if !self.null_fields.is_empty() {
            writeln!(f, "Null fields:")?;
            for (field, count) in &self.null_fields {
                writeln!(f, "  {field}: {count} ({:.1}%)", self.null_rate(field))?;
            }
        }
        Ok(())
    }
}
