use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use utoipa::ToSchema;

const CONCEPTS_BASE: &str = "http://data.rollvolet.be/concepts";

/// Business classification of a file. Governs naming and storage path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentType {
    CaseAttachment,
    VisitReport,
    InterventionReport,
    Offer,
    Order,
    DeliveryNote,
    Invoice,
    DepositInvoice,
    ProductionTicket,
    ProductionTicketTemplate,
    InvoiceAccountancyExport,
    CustomerAccountancyExport,
}

impl DocumentType {
    pub const ALL: [DocumentType; 12] = [
        DocumentType::CaseAttachment,
        DocumentType::VisitReport,
        DocumentType::InterventionReport,
        DocumentType::Offer,
        DocumentType::Order,
        DocumentType::DeliveryNote,
        DocumentType::Invoice,
        DocumentType::DepositInvoice,
        DocumentType::ProductionTicket,
        DocumentType::ProductionTicketTemplate,
        DocumentType::InvoiceAccountancyExport,
        DocumentType::CustomerAccountancyExport,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::CaseAttachment => "case-attachment",
            DocumentType::VisitReport => "visit-report",
            DocumentType::InterventionReport => "intervention-report",
            DocumentType::Offer => "offer",
            DocumentType::Order => "order",
            DocumentType::DeliveryNote => "delivery-note",
            DocumentType::Invoice => "invoice",
            DocumentType::DepositInvoice => "deposit-invoice",
            DocumentType::ProductionTicket => "production-ticket",
            DocumentType::ProductionTicketTemplate => "production-ticket-template",
            DocumentType::InvoiceAccountancyExport => "invoice-accountancy-export",
            DocumentType::CustomerAccountancyExport => "customer-accountancy-export",
        }
    }

    /// Concept URI under which the type is stored in the metadata store.
    pub fn uri(&self) -> String {
        match self {
            DocumentType::InvoiceAccountancyExport => {
                format!("{}/6fbc15d2-11c0-4868-8b11-d15b8f1a3802", CONCEPTS_BASE)
            }
            DocumentType::CustomerAccountancyExport => {
                format!("{}/7afecda8-f128-4043-a69c-a68cbaaedac5", CONCEPTS_BASE)
            }
            other => format!("{}/{}", CONCEPTS_BASE, other.as_str()),
        }
    }

    pub fn from_uri(uri: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.uri() == uri)
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fields a document type needs to compute its location.
///
/// Each variant carries exactly the identifiers of one context shape; the
/// resolver checks the shape against its rule before doing any lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DocumentContext {
    Case { case_id: String, file_name: String },
    Request { case_id: String },
    Intervention { intervention_id: String },
    Offer { offer_id: String },
    Order { order_id: String },
    Invoice { invoice_id: String },
    AccountancyExport,
}

impl DocumentContext {
    pub fn shape(&self) -> ContextShape {
        match self {
            DocumentContext::Case { .. } => ContextShape::Case,
            DocumentContext::Request { .. } => ContextShape::Request,
            DocumentContext::Intervention { .. } => ContextShape::Intervention,
            DocumentContext::Offer { .. } => ContextShape::Offer,
            DocumentContext::Order { .. } => ContextShape::Order,
            DocumentContext::Invoice { .. } => ContextShape::Invoice,
            DocumentContext::AccountancyExport => ContextShape::AccountancyExport,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextShape {
    Case,
    Request,
    Intervention,
    Offer,
    Order,
    Invoice,
    AccountancyExport,
}

impl ContextShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextShape::Case => "case",
            ContextShape::Request => "request",
            ContextShape::Intervention => "intervention",
            ContextShape::Offer => "offer",
            ContextShape::Order => "order",
            ContextShape::Invoice => "invoice",
            ContextShape::AccountancyExport => "accountancy-export",
        }
    }
}

/// Target directory and file name on the remote drive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationSpec {
    pub directory_path: String,
    pub file_name: String,
}

impl LocationSpec {
    pub fn new(directory_path: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            directory_path: directory_path.into(),
            file_name: file_name.into(),
        }
    }

    pub fn full_path(&self) -> String {
        format!(
            "{}/{}",
            self.directory_path.trim_end_matches('/'),
            self.file_name
        )
    }
}

/// What to do when a file with the same name already exists remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictBehavior {
    #[default]
    Rename,
    Replace,
    Fail,
}

impl ConflictBehavior {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictBehavior::Rename => "rename",
            ConflictBehavior::Replace => "replace",
            ConflictBehavior::Fail => "fail",
        }
    }
}

impl FromStr for ConflictBehavior {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rename" => Ok(ConflictBehavior::Rename),
            "replace" => Ok(ConflictBehavior::Replace),
            "fail" => Ok(ConflictBehavior::Fail),
            other => Err(format!("unknown conflict behavior '{}'", other)),
        }
    }
}

/// Result of a successful remote upload, as reported by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFileRecord {
    pub remote_id: String,
    pub name: String,
    pub url: String,
    pub size: i64,
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Resource a newly uploaded file gets attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// Attachment of a case.
    Case(String),
    /// Document generated from a business resource (invoice, offer, ...).
    DerivedFrom(String),
    /// Replaces the local physical file backing an existing logical file.
    LocalFile(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLinkage {
    pub target: LinkTarget,
    pub document_type: Option<DocumentType>,
}

impl FileLinkage {
    pub fn new(target: LinkTarget, document_type: DocumentType) -> Self {
        Self {
            target,
            document_type: Some(document_type),
        }
    }
}

/// Logical file as persisted by the metadata store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FileMetadataEntry {
    pub id: String,
    pub name: String,
    pub format: String,
    pub size: i64,
    pub extension: String,
    pub created_at: DateTime<Utc>,
    pub document_type: Option<DocumentType>,
}

/// Credential used to act on the remote drive on behalf of a user.
#[derive(Clone)]
pub struct SessionHandle {
    pub session_id: String,
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("session_id", &self.session_id)
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// A file observed in the drop directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedFile {
    pub name: String,
    pub absolute_path: PathBuf,
}

impl DroppedFile {
    pub fn local_uri(&self) -> String {
        format!("share://{}", self.name)
    }
}

/// Metadata-store view of a dropped file: its declared type and owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedDocument {
    pub file_id: String,
    pub name: String,
    pub document_type_uri: Option<String>,
    pub case_id: Option<String>,
    pub source_id: Option<String>,
}

impl DroppedDocument {
    /// Builds the context for the given shape from the stored linkage.
    /// Returns `None` when the required identifier is missing.
    pub fn context_for(&self, shape: ContextShape) -> Option<DocumentContext> {
        let source = || self.source_id.clone();
        Some(match shape {
            ContextShape::Case => DocumentContext::Case {
                case_id: self.case_id.clone()?,
                file_name: self.name.clone(),
            },
            ContextShape::Request => DocumentContext::Request {
                case_id: self.case_id.clone()?,
            },
            ContextShape::Intervention => DocumentContext::Intervention {
                intervention_id: source()?,
            },
            ContextShape::Offer => DocumentContext::Offer { offer_id: source()? },
            ContextShape::Order => DocumentContext::Order { order_id: source()? },
            ContextShape::Invoice => DocumentContext::Invoice {
                invoice_id: source()?,
            },
            ContextShape::AccountancyExport => DocumentContext::AccountancyExport,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInfo {
    pub number: i64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterventionInfo {
    pub number: i64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferInfo {
    pub request_number: i64,
    pub version_info: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderInfo {
    pub request_number: i64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceInfo {
    pub number: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductionTicketInfo {
    pub request_number: i64,
    pub customer_name: String,
    pub date: NaiveDate,
}
