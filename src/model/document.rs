use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::utils::{record_id, timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString, EnumIter)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum DocumentType {
    Payslip,
    TaxInfo,
    IdProof,
    AddressProof,
    MedicalCert,
    Other,
}

/// Case-insensitive like the form; anything unrecognised reads as `Other`.
impl<'de> Deserialize<'de> for DocumentType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(DocumentType::from_str(raw.trim()).unwrap_or(DocumentType::Other))
    }
}

impl DocumentType {
    pub fn label(&self) -> &'static str {
        match self {
            DocumentType::Payslip => "Payslip",
            DocumentType::TaxInfo => "Tax Information",
            DocumentType::IdProof => "ID Proof",
            DocumentType::AddressProof => "Address Proof",
            DocumentType::MedicalCert => "Medical Certificate",
            DocumentType::Other => "Other",
        }
    }
}

/// Descriptive fields of an uploaded document. The bytes never leave the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    #[serde(
        rename = "documentId",
        alias = "id",
        default,
        deserialize_with = "record_id::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    pub file_name: String,
    #[serde(default)]
    pub file_size: u64,
    pub file_type: DocumentType,
    #[serde(default, with = "timestamp")]
    pub upload_date: Option<DateTime<Utc>>,
    #[serde(rename = "s3Key", default, skip_serializing_if = "Option::is_none")]
    pub storage_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

/// Client-side storage key, `documents/{userId}/{fileName}`.
pub fn storage_key(user_id: &str, file_name: &str) -> String {
    format!("documents/{user_id}/{file_name}")
}
