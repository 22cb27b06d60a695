//! Read-side queries over stored records

use super::core::index_prefix;
use super::DbOperations;
use crate::ingestion::IngestionResult;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Group label used when an event's request or its company label is missing
pub const UNKNOWN_COMPANY: &str = "unknown";

/// All products of one insured party, grouped by source company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsuredProducts {
    pub insured_id: String,
    pub groups: Vec<CompanyGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyGroup {
    pub source_company: String,
    pub products: Vec<ProductView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: String,
    #[serde(rename = "type")]
    pub product_type: Option<String>,
    pub price: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub event_id: String,
}

impl DbOperations {
    /// Products of every event recorded for `insured_id`.
    ///
    /// Returns `None` when no event matches. Groups are ordered by company
    /// label, events by identifier; products keep document order.
    pub fn products_by_insured(
        &self,
        insured_id: &str,
    ) -> IngestionResult<Option<InsuredProducts>> {
        let mut grouped: BTreeMap<String, Vec<ProductView>> = BTreeMap::new();
        let mut matched = 0usize;

        for entry in self.insured_index_tree.scan_prefix(index_prefix(insured_id).as_bytes()) {
            let (key, _) = entry?;
            let key = String::from_utf8_lossy(&key);
            let Some((_, event_id)) = key.split_once('\0') else {
                continue;
            };
            let Some(event) = self.get_event(event_id)? else {
                continue;
            };
            matched += 1;

            let company = self
                .get_stored_batch(&event.request_id)?
                .and_then(|batch| batch.source_company)
                .unwrap_or_else(|| UNKNOWN_COMPANY.to_string());

            let products = self.get_products(&event.product_ids)?;
            grouped
                .entry(company)
                .or_default()
                .extend(products.into_iter().map(|p| ProductView {
                    id: p.id,
                    product_type: p.product_type,
                    price: p.price,
                    start_date: p.start_date,
                    end_date: p.end_date,
                    event_id: event.id.clone(),
                }));
        }

        if matched == 0 {
            return Ok(None);
        }

        Ok(Some(InsuredProducts {
            insured_id: insured_id.to_string(),
            groups: grouped
                .into_iter()
                .map(|(source_company, products)| CompanyGroup {
                    source_company,
                    products,
                })
                .collect(),
        }))
    }
}
