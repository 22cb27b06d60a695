//! Maps decoded documents onto the record graph

use crate::ingestion::document::{EventDto, ProductDto, RootRequest};
use crate::ingestion::field_parser::{
    parse_date, parse_decimal, parse_optional, parse_timestamp, ACCEPT_DATE_FORMAT,
};
use crate::ingestion::{IngestionError, IngestionResult};
use crate::records::{Event, Product, RequestBatch};
use std::collections::HashSet;
use uuid::Uuid;

/// Turns a [`RootRequest`] into a [`RequestBatch`] graph.
///
/// Pure transformation: no I/O. Scalar fields that fail to parse become `None`
/// without affecting the rest of the record.
#[derive(Debug, Default, Clone)]
pub struct RecordMapper;

impl RecordMapper {
    pub fn new() -> Self {
        Self
    }

    /// Map a document whose request-details block is present
    pub fn map(&self, document: &RootRequest) -> IngestionResult<RequestBatch> {
        let details = document.request_details.as_ref().ok_or_else(|| {
            IngestionError::EmptyOrNoRequestDetails("document has no requestDetails".to_string())
        })?;

        let id = required_id(details.id.as_deref(), "requestDetails")?;

        let events = document
            .events()
            .iter()
            .map(|event| self.map_event(event, &id))
            .collect::<IngestionResult<Vec<_>>>()?;
        reject_duplicate_events(&events)?;

        Ok(RequestBatch {
            accept_date: parse_optional(details.accept_date.as_deref(), |text| {
                parse_timestamp(text, ACCEPT_DATE_FORMAT)
            }),
            source_company: details.source_company.clone(),
            events,
            id,
        })
    }

    fn map_event(&self, source: &EventDto, request_id: &str) -> IngestionResult<Event> {
        let id = required_id(source.id.as_deref(), "event")?;
        let products = source
            .products()
            .iter()
            .map(|product| self.map_product(product, &id))
            .collect();

        Ok(Event {
            event_type: source.event_type.clone(),
            insured_id: source.insured_id.clone(),
            request_id: request_id.to_string(),
            products,
            id,
        })
    }

    fn map_product(&self, source: &ProductDto, event_id: &str) -> Product {
        // The upstream id is never stored
        Product {
            id: Uuid::new_v4().to_string(),
            product_type: source.product_type.clone(),
            price: parse_optional(source.price.as_deref(), parse_decimal),
            start_date: parse_optional(source.start_date.as_deref(), parse_date),
            end_date: parse_optional(source.end_date.as_deref(), parse_date),
            event_id: event_id.to_string(),
        }
    }
}

/// Event ids key the stored graph, so one document may not repeat them
fn reject_duplicate_events(events: &[Event]) -> IngestionResult<()> {
    let mut seen = HashSet::with_capacity(events.len());
    match events.iter().find(|event| !seen.insert(event.id.as_str())) {
        Some(event) => Err(IngestionError::mapping(format!(
            "event id {} appears more than once",
            event.id
        ))),
        None => Ok(()),
    }
}

fn required_id(id: Option<&str>, element: &str) -> IngestionResult<String> {
    match id.map(str::trim) {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(IngestionError::mapping(format!(
            "<{}> is missing its <id>",
            element
        ))),
    }
}
