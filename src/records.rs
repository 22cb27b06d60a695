//! Record graph produced by ingestion.
//!
//! Ownership flows strictly downwards: a [`RequestBatch`] owns its events and
//! each [`Event`] owns its products. The `request_id` and `event_id` fields are
//! non-owning back-references holding the parent's identifier.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Top-level unit ingested from one source document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBatch {
    /// Identifier copied verbatim from the document
    pub id: String,
    /// Accepted-at timestamp, `None` when the source value did not parse
    pub accept_date: Option<NaiveDateTime>,
    /// Label of the company that sent the request
    pub source_company: Option<String>,
    /// Owned events, in document order
    pub events: Vec<Event>,
}

/// An event reported for an insured party
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub event_type: Option<String>,
    pub insured_id: Option<String>,
    /// Identifier of the owning [`RequestBatch`]
    pub request_id: String,
    /// Owned products, in document order
    pub products: Vec<Product>,
}

/// A product attached to an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Generated when the record is mapped, never taken from the source
    pub id: String,
    pub product_type: Option<String>,
    pub price: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Identifier of the owning [`Event`]
    pub event_id: String,
}

impl RequestBatch {
    /// Total number of products across all events
    pub fn product_count(&self) -> usize {
        self.events.iter().map(|e| e.products.len()).sum()
    }

    /// Iterate over every product in the graph
    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.events.iter().flat_map(|e| e.products.iter())
    }
}
