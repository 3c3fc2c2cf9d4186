//! In-memory records with stable identity.
//!
//! A [`RecordSet`] keeps rows in load order. Every [`Record`] carries the
//! `original_index` it was assigned when loaded; removals never renumber the
//! survivors, so a selection computed against one snapshot stays valid.

use std::collections::{BTreeSet, HashMap};

use super::{is_transient_column, DOMAIN, URI_NORMALIZED};

/// Values computed by the normalizer for one record.
///
/// These live beside the source fields, never inside them, so the output
/// projection cannot leak them into a written file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DerivedFields {
    /// `login_uri` with trailing slashes stripped
    pub uri_normalized: String,
    /// Best-effort host extracted from `uri_normalized`
    pub domain: String,
}

/// One row of the credential dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    original_index: usize,
    fields: Vec<String>,
    derived: Option<DerivedFields>,
}

impl Record {
    /// Create a record with the given identity and field values.
    #[must_use]
    pub fn new(original_index: usize, fields: Vec<String>) -> Self {
        Self {
            original_index,
            fields,
            derived: None,
        }
    }

    /// Position of this record in the table it was loaded from.
    #[must_use]
    pub fn original_index(&self) -> usize {
        self.original_index
    }

    /// Raw field values, aligned with [`RecordSet::headers`].
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Field value at a column position (empty when out of range).
    #[must_use]
    pub fn field(&self, column: usize) -> &str {
        self.fields.get(column).map_or("", String::as_str)
    }

    /// Derived values, if the record has been normalized.
    #[must_use]
    pub fn derived(&self) -> Option<&DerivedFields> {
        self.derived.as_ref()
    }

    pub(crate) fn set_derived(&mut self, derived: DerivedFields) {
        self.derived = Some(derived);
    }

    pub(crate) fn set_field(&mut self, column: usize, value: String) {
        if let Some(slot) = self.fields.get_mut(column) {
            *slot = value;
        }
    }
}

/// Resolved reference to a value of a record.
///
/// Source columns resolve to their position; the two derived columns resolve
/// to the normalizer output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnRef {
    /// A source column by position
    Field(usize),
    /// The derived normalized URI
    UriNormalized,
    /// The derived domain
    Domain,
}

/// Ordered collection of records sharing one header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSet {
    headers: Vec<String>,
    records: Vec<Record>,
    next_index: usize,
    normalized: bool,
}

impl RecordSet {
    /// Create an empty record set with the given headers.
    #[must_use]
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            records: Vec::new(),
            next_index: 0,
            normalized: false,
        }
    }

    /// Build a record set from raw rows, assigning indices in row order.
    ///
    /// Short rows are padded with empty values; long rows are truncated to
    /// the header width.
    ///
    /// # Example
    ///
    /// ```
    /// use credupe::records::RecordSet;
    ///
    /// let set = RecordSet::from_rows(
    ///     vec!["login_uri".into(), "login_username".into()],
    ///     vec![vec!["https://a.com".into(), "alice".into()]],
    /// );
    /// assert_eq!(set.len(), 1);
    /// assert_eq!(set.records()[0].original_index(), 0);
    /// ```
    #[must_use]
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let mut set = Self::new(headers);
        for row in rows {
            set.push(row);
        }
        set
    }

    /// Append a row, returning the `original_index` assigned to it.
    pub fn push(&mut self, mut fields: Vec<String>) -> usize {
        fields.resize(self.headers.len(), String::new());
        let index = self.next_index;
        self.next_index += 1;
        self.records.push(Record::new(index, fields));
        index
    }

    /// Column names in source order.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Records in load order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Iterate records in load order.
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the set holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether the normalizer has attached derived values to every record.
    #[must_use]
    pub fn is_normalized(&self) -> bool {
        self.normalized
    }

    pub(crate) fn set_normalized(&mut self, normalized: bool) {
        self.normalized = normalized;
    }

    pub(crate) fn records_mut(&mut self) -> &mut [Record] {
        &mut self.records
    }

    /// Position of a source column.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Resolve a column name, including the derived columns once normalized.
    ///
    /// Derived names take precedence over a source column of the same name,
    /// since such a column is dropped on output anyway.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<ColumnRef> {
        if self.normalized {
            match name {
                URI_NORMALIZED => return Some(ColumnRef::UriNormalized),
                DOMAIN => return Some(ColumnRef::Domain),
                _ => {}
            }
        }
        self.column_index(name).map(ColumnRef::Field)
    }

    /// Resolve several columns, returning the names that are missing.
    ///
    /// # Errors
    ///
    /// Returns the list of unresolvable names if any are missing.
    pub fn resolve_all(&self, names: &[&str]) -> Result<Vec<ColumnRef>, Vec<String>> {
        let mut refs = Vec::with_capacity(names.len());
        let mut missing = Vec::new();
        for name in names {
            match self.resolve(name) {
                Some(column) => refs.push(column),
                None => missing.push((*name).to_string()),
            }
        }
        if missing.is_empty() {
            Ok(refs)
        } else {
            Err(missing)
        }
    }

    /// Value of a resolved column for a record.
    #[must_use]
    pub fn value<'a>(&self, record: &'a Record, column: ColumnRef) -> &'a str {
        match column {
            ColumnRef::Field(idx) => record.field(idx),
            ColumnRef::UriNormalized => record
                .derived
                .as_ref()
                .map_or("", |d| d.uri_normalized.as_str()),
            ColumnRef::Domain => record.derived.as_ref().map_or("", |d| d.domain.as_str()),
        }
    }

    /// Value of a named column for a record, if the column exists.
    #[must_use]
    pub fn value_by_name<'a>(&self, record: &'a Record, name: &str) -> Option<&'a str> {
        self.resolve(name).map(|column| self.value(record, column))
    }

    /// Look up a record by its `original_index`.
    #[must_use]
    pub fn get(&self, original_index: usize) -> Option<&Record> {
        self.records
            .binary_search_by_key(&original_index, Record::original_index)
            .ok()
            .map(|pos| &self.records[pos])
    }

    /// Check whether a record with this `original_index` is present.
    #[must_use]
    pub fn contains(&self, original_index: usize) -> bool {
        self.get(original_index).is_some()
    }

    /// All `original_index` values currently present.
    #[must_use]
    pub fn indices(&self) -> BTreeSet<usize> {
        self.records.iter().map(Record::original_index).collect()
    }

    /// Remove exactly the records whose indices are in `selection`.
    ///
    /// Indices refer to `original_index`, never to positions, so removing in
    /// one pass is safe regardless of how the selection was accumulated.
    /// Returns the removed records as a new set with the same headers,
    /// preserving their relative order.
    ///
    /// # Errors
    ///
    /// Returns the first index that is not present; nothing is removed.
    pub fn remove_indices(&mut self, selection: &BTreeSet<usize>) -> Result<RecordSet, usize> {
        if let Some(&unknown) = selection.iter().find(|idx| !self.contains(**idx)) {
            return Err(unknown);
        }

        let mut removed = self.empty_like();
        let (gone, kept): (Vec<Record>, Vec<Record>) = std::mem::take(&mut self.records)
            .into_iter()
            .partition(|r| selection.contains(&r.original_index));
        self.records = kept;
        removed.records = gone;
        removed.next_index = self.next_index;
        Ok(removed)
    }

    /// Clone the records whose indices are in `selection`, in set order.
    #[must_use]
    pub fn extract(&self, selection: &BTreeSet<usize>) -> RecordSet {
        let mut out = self.empty_like();
        out.records = self
            .records
            .iter()
            .filter(|r| selection.contains(&r.original_index))
            .cloned()
            .collect();
        out.next_index = self.next_index;
        out
    }

    /// Concatenate two sets: all of `first`, then all of `second`.
    ///
    /// Headers are unioned by name in first-seen order. Records are
    /// renumbered in output order since the inputs may come from different
    /// files with overlapping indices.
    #[must_use]
    pub fn concat(first: &RecordSet, second: &RecordSet) -> RecordSet {
        let mut headers: Vec<String> = first.headers.clone();
        for header in &second.headers {
            if !headers.contains(header) {
                headers.push(header.clone());
            }
        }

        let mut out = RecordSet::new(headers);
        for part in [first, second] {
            let positions: HashMap<&str, usize> = part
                .headers
                .iter()
                .enumerate()
                .map(|(i, h)| (h.as_str(), i))
                .collect();
            for record in &part.records {
                let row = out
                    .headers
                    .iter()
                    .map(|h| {
                        positions
                            .get(h.as_str())
                            .map_or_else(String::new, |&i| record.field(i).to_string())
                    })
                    .collect();
                out.push(row);
            }
        }
        out
    }

    /// Output projection: header positions that may be written to disk.
    ///
    /// This is the single place where transient columns are stripped.
    #[must_use]
    pub fn output_columns(&self) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !is_transient_column(h))
            .map(|(i, _)| i)
            .collect()
    }

    fn empty_like(&self) -> RecordSet {
        RecordSet {
            headers: self.headers.clone(),
            records: Vec::new(),
            next_index: 0,
            normalized: self.normalized,
        }
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
