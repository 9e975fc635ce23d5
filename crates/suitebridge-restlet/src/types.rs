// SPDX-FileCopyrightText: 2026 Suitebridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! RESTlet request bodies and response shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use suitebridge_core::traits::SearchRequest;
use suitebridge_core::{RecordId, RecordType};

// --- Requests ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchBody<'a> {
    pub action: &'static str,
    #[serde(flatten)]
    pub request: &'a SearchRequest,
}

impl<'a> SearchBody<'a> {
    pub fn new(request: &'a SearchRequest) -> Self {
        Self {
            action: "search",
            request,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMoreBody<'a> {
    pub action: &'static str,
    pub search_id: &'a str,
    pub page_index: u32,
}

impl<'a> SearchMoreBody<'a> {
    pub fn new(search_id: &'a str, page_index: u32) -> Self {
        Self {
            action: "searchMore",
            search_id,
            page_index,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchFieldsBody<'a> {
    pub action: &'static str,
    pub record_type: &'a RecordType,
    /// Internal ids, sent as strings.
    pub ids: Vec<String>,
    pub fields: Vec<&'a str>,
}

// --- Responses ---

/// An id as the script returns it: number or numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    Number(u64),
    Text(String),
}

impl WireId {
    pub fn parse(&self) -> Option<RecordId> {
        match self {
            WireId::Number(n) => Some(RecordId(*n)),
            WireId::Text(s) => s.parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default)]
    pub search_id: Option<String>,
    #[serde(default)]
    pub total_records: u64,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default = "first_page")]
    pub page_index: u32,
    #[serde(default)]
    pub ids: Vec<WireId>,
}

fn first_page() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchFieldsResponse {
    /// Wire records, each carrying its `internalId`.
    #[serde(default)]
    pub records: Vec<Value>,
    #[serde(default)]
    pub errors: Vec<RecordError>,
}

/// A failure for one identity inside an otherwise successful fetch.
#[derive(Debug, Deserialize)]
pub struct RecordError {
    pub id: WireId,
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// `{"error": {"code": ..., "message": ...}}` as returned by the script or the platform.
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: String,
}
