/*!
 * Equality filters over enriched records
 *
 * Each dimension holds either `All` or one exact value. Active selections are
 * combined with AND, so the order in which they are set does not matter.
 */

use std::collections::BTreeMap;
use std::fmt;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data_types::EnrichedRecord;

/// Columns the dashboard lets users filter on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FilterDimension {
    Regional,
    Supervisor,
    Brand,
    Initiative,
    Reason,
}

impl FilterDimension {
    pub const ALL: [FilterDimension; 5] = [
        FilterDimension::Regional,
        FilterDimension::Supervisor,
        FilterDimension::Brand,
        FilterDimension::Initiative,
        FilterDimension::Reason,
    ];

    /// The value of this dimension on a record
    pub fn value_of<'r>(&self, record: &'r EnrichedRecord) -> Option<&'r str> {
        match self {
            FilterDimension::Regional => record.regional(),
            FilterDimension::Supervisor => record.supervisor(),
            FilterDimension::Brand => record.brand(),
            FilterDimension::Initiative => record.initiative(),
            FilterDimension::Reason => record.reason(),
        }
    }

    /// Source column header for this dimension
    pub fn column_name(&self) -> &'static str {
        use crate::schema::columns;
        match self {
            FilterDimension::Regional => columns::REGIONAL,
            FilterDimension::Supervisor => columns::SUPERVISOR,
            FilterDimension::Brand => columns::BRAND,
            FilterDimension::Initiative => columns::INITIATIVE,
            FilterDimension::Reason => columns::REASON,
        }
    }
}

impl fmt::Display for FilterDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// A single dimension's selection
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Selection {
    #[default]
    All,
    Value(String),
}

impl Selection {
    /// `None` and the selector's "Todos" entry both mean no restriction
    pub fn from_option(value: Option<&str>) -> Self {
        match value {
            None => Selection::All,
            Some(v) if v == crate::constants::ALL_SENTINEL => Selection::All,
            Some(v) => Selection::Value(v.to_string()),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }

    /// Exact-match test; a missing value only matches `All`
    pub fn matches(&self, value: Option<&str>) -> bool {
        match self {
            Selection::All => true,
            Selection::Value(wanted) => value == Some(wanted.as_str()),
        }
    }
}

/// Selections for every filter dimension
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterSet {
    selections: BTreeMap<FilterDimension, Selection>,
}

impl FilterSet {
    /// A filter set with every dimension at `All`
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, dimension: FilterDimension, selection: Selection) -> Self {
        self.set(dimension, selection);
        self
    }

    pub fn set(&mut self, dimension: FilterDimension, selection: Selection) {
        if selection.is_all() {
            self.selections.remove(&dimension);
        } else {
            self.selections.insert(dimension, selection);
        }
    }

    pub fn get(&self, dimension: FilterDimension) -> &Selection {
        const ALL: &Selection = &Selection::All;
        self.selections.get(&dimension).unwrap_or(ALL)
    }

    pub fn regional<S: Into<String>>(self, value: S) -> Self {
        self.with(FilterDimension::Regional, Selection::Value(value.into()))
    }

    pub fn supervisor<S: Into<String>>(self, value: S) -> Self {
        self.with(FilterDimension::Supervisor, Selection::Value(value.into()))
    }

    pub fn brand<S: Into<String>>(self, value: S) -> Self {
        self.with(FilterDimension::Brand, Selection::Value(value.into()))
    }

    pub fn initiative<S: Into<String>>(self, value: S) -> Self {
        self.with(FilterDimension::Initiative, Selection::Value(value.into()))
    }

    pub fn reason<S: Into<String>>(self, value: S) -> Self {
        self.with(FilterDimension::Reason, Selection::Value(value.into()))
    }

    /// Number of dimensions not set to `All`
    pub fn active_count(&self) -> usize {
        self.selections.len()
    }

    pub fn is_unrestricted(&self) -> bool {
        self.selections.is_empty()
    }

    pub fn matches(&self, record: &EnrichedRecord) -> bool {
        self.selections
            .iter()
            .all(|(dimension, selection)| selection.matches(dimension.value_of(record)))
    }

    /// Records satisfying every active selection, in input order
    pub fn apply<'a>(&self, records: &'a [EnrichedRecord]) -> Vec<&'a EnrichedRecord> {
        let filtered: Vec<&EnrichedRecord> = records.iter().filter(|r| self.matches(r)).collect();
        debug!(
            active_filters = self.active_count(),
            input = records.len(),
            output = filtered.len(),
            "applied filters"
        );
        filtered
    }
}
