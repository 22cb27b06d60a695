use super::RecordStore;
use crate::ingestion::{IngestionError, IngestionResult};
use crate::records::{Event, Product, RequestBatch};
use chrono::NaiveDateTime;
use log::debug;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionError,
    TransactionalTree,
};
use sled::Transactional;
use std::collections::HashSet;
use std::path::Path;

/// Tree names
const REQUEST_BATCHES_TREE: &str = "request_batches";
const EVENTS_TREE: &str = "events";
const PRODUCTS_TREE: &str = "products";
const EVENTS_BY_INSURED_TREE: &str = "events_by_insured";

/// Stored form of a request batch; children are referenced by id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoredBatch {
    pub id: String,
    pub accept_date: Option<NaiveDateTime>,
    pub source_company: Option<String>,
    pub event_ids: Vec<String>,
}

/// Stored form of an event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoredEvent {
    pub id: String,
    pub event_type: Option<String>,
    pub insured_id: Option<String>,
    pub request_id: String,
    pub product_ids: Vec<String>,
}

/// Database operations over the record trees of a sled database.
#[derive(Clone)]
pub struct DbOperations {
    /// The underlying sled database instance
    db: sled::Db,
    pub(crate) batches_tree: sled::Tree,
    pub(crate) events_tree: sled::Tree,
    pub(crate) products_tree: sled::Tree,
    /// `insured_id \0 event_id` -> empty
    pub(crate) insured_index_tree: sled::Tree,
}

impl DbOperations {
    /// Creates a new DbOperations instance with all required trees
    pub fn new(db: sled::Db) -> Result<Self, sled::Error> {
        let batches_tree = db.open_tree(REQUEST_BATCHES_TREE)?;
        let events_tree = db.open_tree(EVENTS_TREE)?;
        let products_tree = db.open_tree(PRODUCTS_TREE)?;
        let insured_index_tree = db.open_tree(EVENTS_BY_INSURED_TREE)?;

        Ok(Self {
            db,
            batches_tree,
            events_tree,
            products_tree,
            insured_index_tree,
        })
    }

    /// Opens (or creates) the database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, sled::Error> {
        Self::new(sled::open(path)?)
    }

    /// Number of stored request batches
    pub fn batch_count(&self) -> usize {
        self.batches_tree.len()
    }

    /// Reassemble a stored request batch with all of its events and products
    pub fn get_batch(&self, id: &str) -> IngestionResult<Option<RequestBatch>> {
        let Some(stored) = get_item::<StoredBatch>(&self.batches_tree, id)? else {
            return Ok(None);
        };

        let mut events = Vec::with_capacity(stored.event_ids.len());
        for event_id in &stored.event_ids {
            let Some(event) = self.get_event(event_id)? else {
                continue;
            };
            events.push(Event {
                products: self.get_products(&event.product_ids)?,
                id: event.id,
                event_type: event.event_type,
                insured_id: event.insured_id,
                request_id: event.request_id,
            });
        }

        Ok(Some(RequestBatch {
            id: stored.id,
            accept_date: stored.accept_date,
            source_company: stored.source_company,
            events,
        }))
    }

    pub(crate) fn get_stored_batch(&self, id: &str) -> IngestionResult<Option<StoredBatch>> {
        get_item(&self.batches_tree, id)
    }

    pub(crate) fn get_event(&self, id: &str) -> IngestionResult<Option<StoredEvent>> {
        get_item(&self.events_tree, id)
    }

    pub(crate) fn get_products(&self, ids: &[String]) -> IngestionResult<Vec<Product>> {
        let mut products = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(product) = get_item::<Product>(&self.products_tree, id)? {
                products.push(product);
            }
        }
        Ok(products)
    }

    /// Writes the whole graph in one transaction across all record trees
    fn save_batch(&self, batch: &RequestBatch) -> IngestionResult<()> {
        ensure_unique_keys(batch)?;

        let stored_batch = encode(&StoredBatch {
            id: batch.id.clone(),
            accept_date: batch.accept_date,
            source_company: batch.source_company.clone(),
            event_ids: batch.events.iter().map(|e| e.id.clone()).collect(),
        })?;

        let mut stored_events = Vec::with_capacity(batch.events.len());
        let mut stored_products = Vec::with_capacity(batch.product_count());
        for event in &batch.events {
            stored_events.push((
                event,
                encode(&StoredEvent {
                    id: event.id.clone(),
                    event_type: event.event_type.clone(),
                    insured_id: event.insured_id.clone(),
                    request_id: event.request_id.clone(),
                    product_ids: event.products.iter().map(|p| p.id.clone()).collect(),
                })?,
            ));
            for product in &event.products {
                stored_products.push((product.id.as_str(), encode(product)?));
            }
        }

        let trees = (
            &self.batches_tree,
            &self.events_tree,
            &self.products_tree,
            &self.insured_index_tree,
        );

        trees
            .transaction(|(batches, events, products, index)| {
                // Replace whatever was stored under this id before
                if let Some(previous) = tx_get::<StoredBatch>(batches, &batch.id)? {
                    for event_id in &previous.event_ids {
                        remove_event(events, products, index, event_id, Some(&batch.id))?;
                    }
                }

                for (event, bytes) in &stored_events {
                    if let Some(existing) = tx_get::<StoredEvent>(events, &event.id)? {
                        if existing.request_id != batch.id {
                            detach_event(batches, &existing.request_id, &event.id)?;
                        }
                        remove_event(events, products, index, &event.id, None)?;
                    }
                    events.insert(event.id.as_bytes(), bytes.clone())?;
                    if let Some(insured_id) = &event.insured_id {
                        index.insert(index_key(insured_id, &event.id).as_bytes(), &[] as &[u8])?;
                    }
                }

                for (id, bytes) in &stored_products {
                    products.insert(id.as_bytes(), bytes.clone())?;
                }

                batches.insert(batch.id.as_bytes(), stored_batch.clone())?;
                Ok(())
            })
            .map_err(|e| match e {
                TransactionError::Abort(inner) => IngestionError::persistence_failure(format!(
                    "transaction for request {} aborted: {}",
                    batch.id, inner
                )),
                TransactionError::Storage(inner) => IngestionError::persistence_failure(format!(
                    "storage error saving request {}: {}",
                    batch.id, inner
                )),
            })?;

        // Ensure the data is durably written to disk
        self.db.flush().map_err(|e| {
            IngestionError::persistence_failure(format!("Failed to flush db: {}", e))
        })?;

        debug!(
            "Stored request {} with {} events and {} products",
            batch.id,
            batch.events.len(),
            batch.product_count()
        );
        Ok(())
    }
}

impl RecordStore for DbOperations {
    fn save(&self, batch: &RequestBatch) -> IngestionResult<()> {
        self.save_batch(batch)
    }
}

/// Event and product ids are tree keys; a repeated id would overwrite a sibling
fn ensure_unique_keys(batch: &RequestBatch) -> IngestionResult<()> {
    let mut events = HashSet::with_capacity(batch.events.len());
    let mut products = HashSet::with_capacity(batch.product_count());
    for event in &batch.events {
        if !events.insert(event.id.as_str()) {
            return Err(IngestionError::persistence_failure(format!(
                "request {} repeats event id {}",
                batch.id, event.id
            )));
        }
        for product in &event.products {
            if !products.insert(product.id.as_str()) {
                return Err(IngestionError::persistence_failure(format!(
                    "request {} repeats product id {}",
                    batch.id, product.id
                )));
            }
        }
    }
    Ok(())
}

pub(crate) fn index_key(insured_id: &str, event_id: &str) -> String {
    format!("{}\0{}", insured_id, event_id)
}

pub(crate) fn index_prefix(insured_id: &str) -> String {
    format!("{}\0", insured_id)
}

fn encode<T: Serialize>(item: &T) -> IngestionResult<Vec<u8>> {
    Ok(serde_json::to_vec(item)?)
}

fn get_item<T: DeserializeOwned>(tree: &sled::Tree, key: &str) -> IngestionResult<Option<T>> {
    match tree.get(key.as_bytes())? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

fn tx_get<T: DeserializeOwned>(
    tree: &TransactionalTree,
    key: &str,
) -> ConflictableTransactionResult<Option<T>, IngestionError> {
    match tree.get(key.as_bytes())? {
        Some(bytes) => serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| ConflictableTransactionError::Abort(IngestionError::from(e))),
        None => Ok(None),
    }
}

/// Removes an event with its products and index entry.
///
/// With `owner` set, only an event still belonging to that batch is removed.
fn remove_event(
    events: &TransactionalTree,
    products: &TransactionalTree,
    index: &TransactionalTree,
    event_id: &str,
    owner: Option<&str>,
) -> ConflictableTransactionResult<(), IngestionError> {
    let Some(event) = tx_get::<StoredEvent>(events, event_id)? else {
        return Ok(());
    };
    if owner.is_some_and(|owner| owner != event.request_id) {
        return Ok(());
    }

    for product_id in &event.product_ids {
        products.remove(product_id.as_bytes())?;
    }
    if let Some(insured_id) = &event.insured_id {
        index.remove(index_key(insured_id, event_id).as_bytes())?;
    }
    events.remove(event_id.as_bytes())?;
    Ok(())
}

/// Drops `event_id` from another batch that previously owned it
fn detach_event(
    batches: &TransactionalTree,
    batch_id: &str,
    event_id: &str,
) -> ConflictableTransactionResult<(), IngestionError> {
    if let Some(mut other) = tx_get::<StoredBatch>(batches, batch_id)? {
        other.event_ids.retain(|id| id != event_id);
        let bytes = serde_json::to_vec(&other)
            .map_err(|e| ConflictableTransactionError::Abort(IngestionError::from(e)))?;
        batches.insert(batch_id.as_bytes(), bytes)?;
    }
    Ok(())
}
