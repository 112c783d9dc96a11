use std::collections::BTreeMap;

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Schema registry: the single source of truth for field names
// ---------------------------------------------------------------------------

/// Semantic type of a stored column, used by loaders to type cell values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free-form or low-cardinality text (location codes, vehicle type, ...).
    Text,
    /// Floating-point measure (weight, cost, distance).
    Float,
    /// Calendar date, stored as ISO-8601 text in delimited files.
    Date,
}

/// One queryable stored field: its frontend name (used at the query
/// boundary), its backend name (used in the stored dataset) and its kind.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub frontend: &'static str,
    pub backend: &'static str,
    pub kind: FieldKind,
}

/// A derived field: computed from a stored column, never persisted.
/// `prefix_len` characters of the source column's string form.
#[derive(Debug, Clone)]
pub struct DerivedDef {
    pub name: &'static str,
    pub source_frontend: &'static str,
    pub prefix_len: usize,
}

/// Result of resolving a frontend name to something the executor can read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// A stored column, addressed by its backend name.
    Stored { backend: String },
    /// A derived prefix column: backend name of the source + prefix length.
    Derived {
        source_backend: String,
        prefix_len: usize,
    },
}

/// Bidirectional field-name registry plus derivation rules.
///
/// Construction validates that the frontend↔backend mapping is a bijection;
/// a duplicate on either side is a configuration error and fails here rather
/// than at query time.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<FieldDef>,
    derived: Vec<DerivedDef>,
    by_frontend: BTreeMap<&'static str, usize>,
    by_backend: BTreeMap<&'static str, usize>,
}

impl Schema {
    pub fn new(fields: Vec<FieldDef>, derived: Vec<DerivedDef>) -> Result<Self> {
        let mut by_frontend = BTreeMap::new();
        let mut by_backend = BTreeMap::new();

        for (i, f) in fields.iter().enumerate() {
            if by_frontend.insert(f.frontend, i).is_some() {
                return Err(Error::DuplicateField {
                    namespace: "frontend",
                    name: f.frontend.to_string(),
                });
            }
            if by_backend.insert(f.backend, i).is_some() {
                return Err(Error::DuplicateField {
                    namespace: "backend",
                    name: f.backend.to_string(),
                });
            }
        }
        for d in &derived {
            if by_frontend.contains_key(d.name) {
                return Err(Error::DuplicateField {
                    namespace: "frontend",
                    name: d.name.to_string(),
                });
            }
            if !by_frontend.contains_key(d.source_frontend) {
                return Err(Error::UnknownField(d.source_frontend.to_string()));
            }
        }

        Ok(Schema {
            fields,
            derived,
            by_frontend,
            by_backend,
        })
    }

    /// The fixed shipment-pricing schema.
    pub fn shipping() -> Self {
        use FieldKind::*;
        let fields = vec![
            FieldDef { frontend: "origin_location_code", backend: "backend_origin_location_code", kind: Text },
            FieldDef { frontend: "destination_location_code", backend: "backend_destination_location_code", kind: Text },
            FieldDef { frontend: "vehicle_type", backend: "backend_vehicle_type", kind: Text },
            FieldDef { frontend: "contract_type", backend: "backend_contract_type", kind: Text },
            FieldDef { frontend: "carrier_name", backend: "backend_carrier_name", kind: Text },
            FieldDef { frontend: "shipper_name", backend: "backend_shipper_name", kind: Text },
            FieldDef { frontend: "weight_kg", backend: "backend_weight_kg", kind: Float },
            FieldDef { frontend: "cost", backend: "backend_cost", kind: Float },
            FieldDef { frontend: "route_distance_km", backend: "backend_route_distance_km", kind: Float },
            FieldDef { frontend: "pickup_date", backend: "backend_pickup_date", kind: Date },
        ];
        let derived = vec![
            DerivedDef { name: "origin_prefix", source_frontend: "origin_location_code", prefix_len: DEFAULT_PREFIX_LEN },
            DerivedDef { name: "destination_prefix", source_frontend: "destination_location_code", prefix_len: DEFAULT_PREFIX_LEN },
        ];
        Self::new(fields, derived).expect("shipping schema is a valid bijection")
    }

    /// Translate a frontend field name to its backend column name.
    pub fn to_backend(&self, frontend: &str) -> Result<&str> {
        self.by_frontend
            .get(frontend)
            .map(|&i| self.fields[i].backend)
            .ok_or_else(|| Error::UnknownField(frontend.to_string()))
    }

    /// Translate a backend column name to its frontend field name.
    pub fn to_frontend(&self, backend: &str) -> Result<&str> {
        self.by_backend
            .get(backend)
            .map(|&i| self.fields[i].frontend)
            .ok_or_else(|| Error::UnknownField(backend.to_string()))
    }

    /// Resolve a frontend name to a stored or derived column reference.
    /// Derived names (e.g. `origin_prefix`) resolve to their source's backend
    /// column plus the configured prefix length.
    pub fn resolve(&self, frontend: &str) -> Result<Resolved> {
        if let Some(&i) = self.by_frontend.get(frontend) {
            return Ok(Resolved::Stored {
                backend: self.fields[i].backend.to_string(),
            });
        }
        if let Some(d) = self.derived.iter().find(|d| d.name == frontend) {
            let backend = self.to_backend(d.source_frontend)?;
            return Ok(Resolved::Derived {
                source_backend: backend.to_string(),
                prefix_len: d.prefix_len,
            });
        }
        Err(Error::UnknownField(frontend.to_string()))
    }

    /// The kind of a stored field, looked up by backend column name.
    pub fn kind_of_backend(&self, backend: &str) -> Option<FieldKind> {
        self.by_backend.get(backend).map(|&i| self.fields[i].kind)
    }

    /// Derived field names, in declaration order.
    pub fn derived_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.derived.iter().map(|d| d.name)
    }

    /// The derivation rule whose source is the given frontend field, if any.
    /// `distinct_prefixes` uses this to reject non-location-code fields.
    pub fn derivation_for_source(&self, source_frontend: &str) -> Option<&DerivedDef> {
        self.derived
            .iter()
            .find(|d| d.source_frontend == source_frontend)
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }
}

/// Default number of leading characters taken for a location-code prefix.
pub const DEFAULT_PREFIX_LEN: usize = 3;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_field() {
        let schema = Schema::shipping();
        for f in schema.fields() {
            let backend = schema.to_backend(f.frontend).unwrap();
            assert_eq!(schema.to_frontend(backend).unwrap(), f.frontend);
        }
    }

    #[test]
    fn unknown_names_fail() {
        let schema = Schema::shipping();
        assert!(matches!(
            schema.to_backend("not_a_field"),
            Err(Error::UnknownField(_))
        ));
        assert!(matches!(
            schema.to_frontend("backend_not_a_field"),
            Err(Error::UnknownField(_))
        ));
    }

    #[test]
    fn duplicate_backend_name_fails_at_construction() {
        let fields = vec![
            FieldDef { frontend: "a", backend: "backend_x", kind: FieldKind::Text },
            FieldDef { frontend: "b", backend: "backend_x", kind: FieldKind::Text },
        ];
        assert!(matches!(
            Schema::new(fields, vec![]),
            Err(Error::DuplicateField { namespace: "backend", .. })
        ));
    }

    #[test]
    fn duplicate_frontend_name_fails_at_construction() {
        let fields = vec![
            FieldDef { frontend: "a", backend: "backend_x", kind: FieldKind::Text },
            FieldDef { frontend: "a", backend: "backend_y", kind: FieldKind::Text },
        ];
        assert!(matches!(
            Schema::new(fields, vec![]),
            Err(Error::DuplicateField { namespace: "frontend", .. })
        ));
    }

    #[test]
    fn derived_names_resolve_to_their_source() {
        let schema = Schema::shipping();
        match schema.resolve("origin_prefix").unwrap() {
            Resolved::Derived { source_backend, prefix_len } => {
                assert_eq!(source_backend, "backend_origin_location_code");
                assert_eq!(prefix_len, 3);
            }
            other => panic!("expected derived resolution, got {other:?}"),
        }
    }
}
