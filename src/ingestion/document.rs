//! Wire format of incoming XML documents.
//!
//! Every leaf is kept as raw text; typed conversion happens in the mapper so
//! that a bad scalar never fails the whole decode.

use serde::Deserialize;

/// Root element (`<root>`) of an ingested document
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootRequest {
    #[serde(default)]
    pub request_details: Option<RequestDetailsDto>,
    #[serde(default)]
    pub events: Option<EventList>,
}

/// `<requestDetails>` block
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDetailsDto {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub accept_date: Option<String>,
    #[serde(default)]
    pub source_company: Option<String>,
}

/// `<events>` wrapper around repeated `<event>` elements
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EventList {
    #[serde(rename = "event", default)]
    pub items: Vec<EventDto>,
}

/// `<event>` block
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDto {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub insured_id: Option<String>,
    #[serde(default)]
    pub products: Option<ProductList>,
}

/// `<products>` wrapper around repeated `<product>` elements
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProductList {
    #[serde(rename = "product", default)]
    pub items: Vec<ProductDto>,
}

/// `<product>` block
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    /// Upstream identifier; decoded but never trusted
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

impl RootRequest {
    /// Decode a document. Blank input is an empty document and yields `None`.
    pub fn from_xml(xml: &str) -> Result<Option<Self>, quick_xml::DeError> {
        if xml.trim().is_empty() {
            return Ok(None);
        }
        quick_xml::de::from_str(xml).map(Some)
    }

    /// Events of the document, empty when the wrapper is absent
    pub fn events(&self) -> &[EventDto] {
        self.events.as_ref().map(|e| e.items.as_slice()).unwrap_or(&[])
    }
}

impl EventDto {
    /// Products of the event, empty when the wrapper is absent
    pub fn products(&self) -> &[ProductDto] {
        self.products.as_ref().map(|p| p.items.as_slice()).unwrap_or(&[])
    }
}
