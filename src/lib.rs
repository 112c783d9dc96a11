//! lanequery – filtering and query layer for logistics shipment pricing data.
//!
//! A dataset of shipment records (origin/destination postal codes, vehicle
//! type, weight, cost, dates, carrier/shipper) is loaded once and queried
//! through [`DataLoader`]: heterogeneous filters (equality, prefix, numeric
//! range, date range) narrow the rows, derived postcode-prefix columns are
//! computed on the fly, and results come back under frontend field names.
//! Dependent selector options are served by the distinct-value resolvers.

pub mod data;
pub mod error;
pub mod schema;

pub use data::filter::{Filter, FilterMap, WILDCARD};
pub use data::loader::{DataLoader, Source};
pub use data::model::{Dataset, Record, RecordSet, Value};
pub use data::stats::{summarize, with_trailing_window, Summary};
pub use error::{Error, Result};
pub use schema::{FieldDef, FieldKind, Resolved, Schema, DEFAULT_PREFIX_LEN};
