use std::collections::BTreeSet;

use log::debug;

use crate::error::{Error, Result};
use crate::schema::{Resolved, Schema};

use super::derive::{derive_prefix, prefix_of};
use super::filter::{Filter, FilterMap};
use super::loader::DataLoader;
use super::model::{Dataset, Record, RecordSet, Value};

// ---------------------------------------------------------------------------
// QueryPlan: pure composition, one terminal materialization
// ---------------------------------------------------------------------------

/// A compiled query over one dataset. Building the plan resolves every field
/// name and fixes the predicate set and projection; nothing touches row data
/// until [`QueryPlan::collect`]. Keeping composition pure is what lets a
/// future connection-backed source translate the same plan into SQL instead
/// of scanning rows.
#[derive(Debug)]
pub struct QueryPlan<'a> {
    dataset: &'a Dataset,
    filters: Vec<CompiledFilter>,
    projection: Vec<OutputColumn>,
}

/// One predicate bound to a resolved column. The frontend name is kept for
/// error messages only.
#[derive(Debug)]
struct CompiledFilter {
    field: String,
    column: Resolved,
    filter: Filter,
}

/// One projected output column: the frontend (or derived) name it will carry
/// in the result, and where its values come from.
#[derive(Debug)]
struct OutputColumn {
    name: String,
    column: Resolved,
}

/// Read the cell a resolved column reference points at. Derived columns are
/// computed here, before any predicate or projection consumes them; stored
/// columns missing from a row read as Null.
fn read_cell(row: &Record, column: &Resolved) -> Value {
    match column {
        Resolved::Stored { backend } => row.get(backend).cloned().unwrap_or(Value::Null),
        Resolved::Derived {
            source_backend,
            prefix_len,
        } => {
            let source = row.get(source_backend).unwrap_or(&Value::Null);
            derive_prefix(source, *prefix_len)
        }
    }
}

impl<'a> QueryPlan<'a> {
    /// Whether a row passes every predicate. Conjunctive; evaluation order
    /// does not affect the outcome.
    fn row_matches(&self, row: &Record) -> Result<bool> {
        for cf in &self.filters {
            let cell = read_cell(row, &cf.column);
            if !cf.filter.matches(&cf.field, &cell)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Execute the plan: filter first, then project, then materialize.
    /// Projection never clones cells of rows the predicates rejected.
    pub fn collect(&self) -> Result<RecordSet> {
        let mut rows = Vec::new();
        for row in self.dataset.rows() {
            if !self.row_matches(row)? {
                continue;
            }
            rows.push(
                self.projection
                    .iter()
                    .map(|out| read_cell(row, &out.column))
                    .collect(),
            );
        }

        let columns = self.projection.iter().map(|c| c.name.clone()).collect();
        Ok(RecordSet::new(columns, rows))
    }
}

// ---------------------------------------------------------------------------
// Query surface
// ---------------------------------------------------------------------------

impl DataLoader {
    /// Compile a query plan: resolve all field names up front (an unknown
    /// name fails here, before any row is read) and fix the projection to
    /// the requested fields plus the derived prefix columns.
    pub fn plan<'a>(
        &'a self,
        filters: &FilterMap,
        required_fields: &[&str],
    ) -> Result<QueryPlan<'a>> {
        let schema = self.schema();
        let compiled = compile_filters(schema, filters)?;

        // Requested fields in caller order, duplicates coalesced, then the
        // derived prefixes: callers displaying route summaries rely on both
        // prefixes being present whether or not they asked for them.
        let mut names: Vec<&str> = Vec::new();
        for &field in required_fields {
            if !names.contains(&field) {
                names.push(field);
            }
        }
        for derived in schema.derived_names() {
            if !names.contains(&derived) {
                names.push(derived);
            }
        }

        let projection = names
            .into_iter()
            .map(|name| {
                Ok(OutputColumn {
                    name: name.to_string(),
                    column: schema.resolve(name)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(QueryPlan {
            dataset: self.dataset(),
            filters: compiled,
            projection,
        })
    }

    /// Run a query: narrow the dataset by `filters`, project to
    /// `required_fields` plus the two derived prefix columns, and return the
    /// materialized rows under frontend names, in source order.
    pub fn query(&self, filters: &FilterMap, required_fields: &[&str]) -> Result<RecordSet> {
        let plan = self.plan(filters, required_fields)?;
        let result = plan.collect()?;
        debug!(
            "query: {} filters, {} of {} rows kept, {} columns",
            filters.len(),
            result.len(),
            self.dataset().len(),
            result.columns().len()
        );
        Ok(result)
    }

    /// Sorted, deduplicated, null-excluded values of one field, optionally
    /// narrowed by `filters` first. Used to populate dependent selectors.
    pub fn distinct_values(&self, field: &str, filters: Option<&FilterMap>) -> Result<Vec<Value>> {
        let column = self.schema().resolve(field)?;
        let plan = self.narrowing_plan(filters)?;

        let mut seen: BTreeSet<Value> = BTreeSet::new();
        for row in self.dataset().rows() {
            if !plan.row_matches(row)? {
                continue;
            }
            let cell = read_cell(row, &column);
            if !cell.is_null() {
                seen.insert(cell);
            }
        }
        Ok(seen.into_iter().collect())
    }

    /// Sorted, deduplicated prefixes of a location-code field. Fails with
    /// [`Error::InvalidField`] for fields that have no prefix derivation.
    pub fn distinct_prefixes(
        &self,
        field: &str,
        filters: Option<&FilterMap>,
        prefix_len: Option<usize>,
    ) -> Result<Vec<String>> {
        let rule = self
            .schema()
            .derivation_for_source(field)
            .ok_or_else(|| Error::InvalidField(field.to_string()))?;
        let n = prefix_len.unwrap_or(rule.prefix_len);
        let backend = self.schema().to_backend(field)?.to_string();
        let plan = self.narrowing_plan(filters)?;

        let mut seen: BTreeSet<String> = BTreeSet::new();
        for row in self.dataset().rows() {
            if !plan.row_matches(row)? {
                continue;
            }
            match row.get(&backend) {
                Some(Value::Null) | None => {}
                Some(cell) => {
                    seen.insert(prefix_of(&cell.to_string(), n));
                }
            }
        }
        Ok(seen.into_iter().collect())
    }

    /// A filter-only plan with an empty projection. The distinct resolvers
    /// narrow rows with it but do their own column reads; unlike the main
    /// query path there is no implicit location-code inclusion here, since
    /// nothing is projected.
    fn narrowing_plan(&self, filters: Option<&FilterMap>) -> Result<QueryPlan<'_>> {
        let empty = FilterMap::new();
        let filters = filters.unwrap_or(&empty);

        Ok(QueryPlan {
            dataset: self.dataset(),
            filters: compile_filters(self.schema(), filters)?,
            projection: Vec::new(),
        })
    }
}

fn compile_filters(schema: &Schema, filters: &FilterMap) -> Result<Vec<CompiledFilter>> {
    filters
        .iter()
        .map(|(field, filter)| {
            Ok(CompiledFilter {
                field: field.clone(),
                column: schema.resolve(field)?,
                filter: filter.clone(),
            })
        })
        .collect()
}
