//! Tests for the record store and its read-side queries

use crate::db_operations::{DbOperations, RecordStore, UNKNOWN_COMPANY};
use crate::ingestion::IngestionError;
use crate::records::{Event, Product, RequestBatch};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tempfile::{tempdir, TempDir};

/// Create a store backed by a fresh sled database in a temp directory
fn create_test_store() -> (DbOperations, TempDir) {
    let temp_dir = tempdir().unwrap();
    let db = sled::open(temp_dir.path()).unwrap();
    (DbOperations::new(db).unwrap(), temp_dir)
}

fn product(id: &str, event_id: &str, price: Option<i64>) -> Product {
    Product {
        id: id.to_string(),
        product_type: Some("CASCO".to_string()),
        price: price.map(Decimal::from),
        start_date: NaiveDate::from_ymd_opt(2023, 1, 1),
        end_date: None,
        event_id: event_id.to_string(),
    }
}

fn event(id: &str, request_id: &str, insured_id: Option<&str>, products: Vec<Product>) -> Event {
    Event {
        id: id.to_string(),
        event_type: Some("POLICY_ISSUED".to_string()),
        insured_id: insured_id.map(str::to_string),
        request_id: request_id.to_string(),
        products,
    }
}

fn batch(id: &str, company: Option<&str>, events: Vec<Event>) -> RequestBatch {
    RequestBatch {
        id: id.to_string(),
        accept_date: None,
        source_company: company.map(str::to_string),
        events,
    }
}

#[test]
fn test_save_and_reload_full_graph() {
    let (store, _dir) = create_test_store();
    let original = batch(
        "rd1",
        Some("CompanyA"),
        vec![
            event(
                "ev1",
                "rd1",
                Some("ins-1"),
                vec![product("p1", "ev1", Some(10)), product("p2", "ev1", None)],
            ),
            event("ev2", "rd1", None, Vec::new()),
        ],
    );

    store.save(&original).unwrap();

    assert_eq!(store.batch_count(), 1);
    assert_eq!(store.get_batch("rd1").unwrap(), Some(original));
    assert_eq!(store.get_batch("missing").unwrap(), None);
}

#[test]
fn test_save_batch_without_events() {
    let (store, _dir) = create_test_store();
    store.save(&batch("rd1", Some("CompanyA"), Vec::new())).unwrap();

    let stored = store.get_batch("rd1").unwrap().unwrap();
    assert!(stored.events.is_empty());
}

#[test]
fn test_resave_replaces_previous_graph() {
    let (store, _dir) = create_test_store();
    store
        .save(&batch(
            "rd1",
            Some("CompanyA"),
            vec![event("ev1", "rd1", Some("ins-1"), vec![product("p1", "ev1", Some(1))])],
        ))
        .unwrap();
    store
        .save(&batch(
            "rd1",
            Some("CompanyB"),
            vec![event("ev2", "rd1", Some("ins-2"), vec![product("p2", "ev2", Some(2))])],
        ))
        .unwrap();

    let stored = store.get_batch("rd1").unwrap().unwrap();
    assert_eq!(stored.source_company.as_deref(), Some("CompanyB"));
    assert_eq!(stored.events.len(), 1);
    assert_eq!(stored.events[0].id, "ev2");

    // Orphans of the first save are gone, including the index entry
    assert!(store.get_event("ev1").unwrap().is_none());
    assert!(store.get_products(&["p1".to_string()]).unwrap().is_empty());
    assert!(store.products_by_insured("ins-1").unwrap().is_none());
}

#[test]
fn test_event_moved_to_another_batch_is_detached() {
    let (store, _dir) = create_test_store();
    store
        .save(&batch("rd1", Some("CompanyA"), vec![event("ev1", "rd1", Some("ins-1"), Vec::new())]))
        .unwrap();
    store
        .save(&batch("rd2", Some("CompanyB"), vec![event("ev1", "rd2", Some("ins-1"), Vec::new())]))
        .unwrap();

    assert!(store.get_batch("rd1").unwrap().unwrap().events.is_empty());
    assert_eq!(store.get_batch("rd2").unwrap().unwrap().events.len(), 1);

    // Re-saving rd1 must not delete the event now owned by rd2
    store.save(&batch("rd1", Some("CompanyA"), Vec::new())).unwrap();
    assert_eq!(store.get_batch("rd2").unwrap().unwrap().events.len(), 1);
}

#[test]
fn test_repeated_event_id_is_rejected_without_writes() {
    let (store, _dir) = create_test_store();
    let duplicated = batch(
        "rd1",
        Some("CompanyA"),
        vec![
            event("ev1", "rd1", Some("ins-1"), vec![product("p1", "ev1", Some(1))]),
            event("ev1", "rd1", Some("ins-2"), vec![product("p2", "ev1", Some(2))]),
        ],
    );

    assert!(matches!(
        store.save(&duplicated),
        Err(IngestionError::PersistenceFailure(_))
    ));
    assert_eq!(store.batch_count(), 0);
    assert!(store.events_tree.is_empty());
    assert!(store.products_tree.is_empty());
    assert!(store.insured_index_tree.is_empty());
}

#[test]
fn test_repeated_event_id_keeps_previous_save_intact() {
    let (store, _dir) = create_test_store();
    let original = batch(
        "rd1",
        Some("CompanyA"),
        vec![event("ev1", "rd1", Some("ins-1"), vec![product("p1", "ev1", Some(1))])],
    );
    store.save(&original).unwrap();

    let duplicated = batch(
        "rd1",
        Some("CompanyB"),
        vec![
            event("ev1", "rd1", Some("ins-1"), Vec::new()),
            event("ev1", "rd1", Some("ins-1"), Vec::new()),
        ],
    );
    assert!(store.save(&duplicated).is_err());

    assert_eq!(store.get_batch("rd1").unwrap(), Some(original));
    assert!(store.products_by_insured("ins-1").unwrap().is_some());
}

#[test]
fn test_products_by_insured_groups_by_company() {
    let (store, _dir) = create_test_store();
    store
        .save(&batch(
            "rd1",
            Some("CompanyA"),
            vec![event("ev1", "rd1", Some("ins-1"), vec![product("p1", "ev1", Some(5))])],
        ))
        .unwrap();
    store
        .save(&batch(
            "rd2",
            Some("CompanyB"),
            vec![
                event(
                    "ev2",
                    "rd2",
                    Some("ins-1"),
                    vec![product("p2", "ev2", Some(7)), product("p3", "ev2", None)],
                ),
                event("ev3", "rd2", Some("ins-2"), vec![product("p4", "ev3", Some(1))]),
            ],
        ))
        .unwrap();

    let result = store.products_by_insured("ins-1").unwrap().unwrap();
    assert_eq!(result.insured_id, "ins-1");
    assert_eq!(result.groups.len(), 2);

    assert_eq!(result.groups[0].source_company, "CompanyA");
    assert_eq!(result.groups[0].products.len(), 1);
    assert_eq!(result.groups[0].products[0].event_id, "ev1");

    assert_eq!(result.groups[1].source_company, "CompanyB");
    let ids: Vec<&str> = result.groups[1].products.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["p2", "p3"]);
}

#[test]
fn test_products_by_insured_falls_back_to_unknown_company() {
    let (store, _dir) = create_test_store();
    let products = vec![product("p1", "ev1", None)];
    store
        .save(&batch("rd1", None, vec![event("ev1", "rd1", Some("ins-1"), products)]))
        .unwrap();

    let result = store.products_by_insured("ins-1").unwrap().unwrap();
    assert_eq!(result.groups.len(), 1);
    assert_eq!(result.groups[0].source_company, UNKNOWN_COMPANY);
}

#[test]
fn test_products_by_insured_not_found() {
    let (store, _dir) = create_test_store();
    let events = vec![event("ev1", "rd1", Some("ins-10"), Vec::new())];
    store.save(&batch("rd1", Some("CompanyA"), events)).unwrap();

    assert!(store.products_by_insured("unknown-party").unwrap().is_none());
    // Prefix of another id must not match
    assert!(store.products_by_insured("ins-1").unwrap().is_none());
}

#[test]
fn test_matching_event_without_products_is_found() {
    let (store, _dir) = create_test_store();
    store
        .save(&batch("rd1", Some("CompanyA"), vec![event("ev1", "rd1", Some("ins-1"), Vec::new())]))
        .unwrap();

    let result = store.products_by_insured("ins-1").unwrap().unwrap();
    assert_eq!(result.groups.len(), 1);
    assert!(result.groups[0].products.is_empty());
}

#[test]
fn test_insured_products_serializes_camel_case() {
    let (store, _dir) = create_test_store();
    let products = vec![product("p1", "ev1", Some(3))];
    let events = vec![event("ev1", "rd1", Some("ins-1"), products)];
    store.save(&batch("rd1", Some("CompanyA"), events)).unwrap();

    let result = store.products_by_insured("ins-1").unwrap().unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["insuredId"], "ins-1");
    assert_eq!(json["groups"][0]["sourceCompany"], "CompanyA");
    assert_eq!(json["groups"][0]["products"][0]["type"], "CASCO");
    assert_eq!(json["groups"][0]["products"][0]["eventId"], "ev1");
}
