//! Collections API wire types
//!
//! Data structures for (de)serializing collections API payloads, and their
//! conversion into the bridge data model.

use bridge_traits::collections::{
    Collection, CollectionId, Record, RecordPage, TransferRequest, TransferResult,
};
use serde::{Deserialize, Serialize};

/// `GET /collections` item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionMetadata {
    pub id: String,
    pub collection_name: String,
}

impl From<CollectionMetadata> for Collection {
    fn from(meta: CollectionMetadata) -> Self {
        Collection::new(CollectionId::new(meta.id), meta.collection_name)
    }
}

/// A company row as returned inside a collection page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyDto {
    pub id: i64,
    pub company_name: String,
    #[serde(default)]
    pub liked: bool,
}

impl From<CompanyDto> for Record {
    fn from(dto: CompanyDto) -> Self {
        Record::new(dto.id, dto.company_name, dto.liked)
    }
}

/// `GET /collections/{id}` response
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionPageResponse {
    pub id: String,
    pub collection_name: String,
    #[serde(default)]
    pub companies: Vec<CompanyDto>,
    pub total: u64,
}

impl From<CollectionPageResponse> for RecordPage {
    fn from(page: CollectionPageResponse) -> Self {
        RecordPage {
            records: page.companies.into_iter().map(Record::from).collect(),
            total: page.total,
        }
    }
}

/// `PUT /collections/add-companies` body
#[derive(Debug, Clone, Serialize)]
pub struct AddCompaniesRequest<'a> {
    pub company_ids: &'a [i64],
    pub origin_collection_id: &'a str,
    pub destination_collection_id: &'a str,
}

impl<'a> From<&'a TransferRequest> for AddCompaniesRequest<'a> {
    fn from(request: &'a TransferRequest) -> Self {
        Self {
            company_ids: &request.record_ids,
            origin_collection_id: request.origin_collection_id.as_str(),
            destination_collection_id: request.destination_collection_id.as_str(),
        }
    }
}

/// `PUT /collections/add-companies` response
#[derive(Debug, Clone, Deserialize)]
pub struct AddCompaniesResponse {
    #[serde(default)]
    pub message: String,
    pub companies_added: u64,
    #[serde(default)]
    pub companies_already_in_destination: u64,
}

impl From<AddCompaniesResponse> for TransferResult {
    fn from(response: AddCompaniesResponse) -> Self {
        TransferResult::new(
            response.companies_added,
            response.companies_already_in_destination,
        )
    }
}

/// Error body. `detail` is a string for handler errors and a list of
/// validation entries for request-validation errors.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub detail: ErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Message(String),
    Validation(Vec<ValidationEntry>),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidationEntry {
    pub msg: String,
}

impl ErrorDetail {
    pub fn into_message(self) -> String {
        match self {
            ErrorDetail::Message(msg) => msg,
            ErrorDetail::Validation(entries) => entries
                .into_iter()
                .map(|entry| entry.msg)
                .collect::<Vec<_>>()
                .join("; "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_response_conversion() {
        let json = r#"{
            "id": "c1",
            "collection_name": "My List",
            "companies": [{"id": 7, "company_name": "Acme", "liked": true}],
            "total": 42
        }"#;
        let page: RecordPage = serde_json::from_str::<CollectionPageResponse>(json)
            .unwrap()
            .into();

        assert_eq!(page.total, 42);
        assert_eq!(page.records, vec![Record::new(7, "Acme", true)]);
    }

    #[test]
    fn test_add_companies_body_shape() {
        let request = TransferRequest::new(vec![1, 2], "a".into(), "b".into());
        let body = serde_json::to_value(AddCompaniesRequest::from(&request)).unwrap();

        assert_eq!(body["company_ids"], serde_json::json!([1, 2]));
        assert_eq!(body["origin_collection_id"], "a");
        assert_eq!(body["destination_collection_id"], "b");
    }

    #[test]
    fn test_validation_detail_joins_messages() {
        let json = r#"{"detail": [{"loc": ["body"], "msg": "company_ids must be unique", "type": "value_error"}]}"#;
        let body: ErrorBody = serde_json::from_str(json).unwrap();
        assert_eq!(body.detail.into_message(), "company_ids must be unique");
    }
}
