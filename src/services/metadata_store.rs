use crate::entities::{prelude::*, *};
use crate::error::{SyncError, SyncResult};
use crate::models::{
    DocumentType, DroppedDocument, FileLinkage, FileMetadataEntry, InterventionInfo, InvoiceInfo,
    LinkTarget, OfferInfo, OrderInfo, ProductionTicketInfo, RequestInfo, UploadedFileRecord,
};
use crate::utils::naming::file_extension;
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use uuid::Uuid;

/// Persistence of file metadata and the business lookups the resolver needs.
///
/// Lookups return `None` when the resource does not exist; only store failures
/// are errors.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn insert_uploaded_file(
        &self,
        record: &UploadedFileRecord,
        linkage: &FileLinkage,
    ) -> SyncResult<FileMetadataEntry>;

    async fn get_remote_id(&self, local_id: &str) -> SyncResult<Option<String>>;

    async fn get_local_id(&self, remote_id: &str) -> SyncResult<Option<String>>;

    /// Removes the logical file and everything linked to it. Missing rows are
    /// not an error.
    async fn delete_file(&self, local_id: &str) -> SyncResult<()>;

    async fn get_dropped_file(&self, local_uri: &str) -> SyncResult<Option<DroppedDocument>>;

    async fn get_case_identifier(&self, case_id: &str) -> SyncResult<Option<String>>;

    async fn get_request_info(&self, case_id: &str) -> SyncResult<Option<RequestInfo>>;

    async fn get_intervention_info(
        &self,
        intervention_id: &str,
    ) -> SyncResult<Option<InterventionInfo>>;

    async fn get_offer_info(&self, offer_id: &str) -> SyncResult<Option<OfferInfo>>;

    async fn get_order_info(&self, order_id: &str) -> SyncResult<Option<OrderInfo>>;

    async fn get_invoice_info(&self, invoice_id: &str) -> SyncResult<Option<InvoiceInfo>>;

    async fn get_production_ticket_info(
        &self,
        order_id: &str,
    ) -> SyncResult<Option<ProductionTicketInfo>>;
}

pub struct SeaOrmMetadataStore {
    db: DatabaseConnection,
}

impl SeaOrmMetadataStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn remote_file_model(file_id: &str, record: &UploadedFileRecord) -> remote_files::ActiveModel {
    remote_files::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        file_id: Set(file_id.to_string()),
        remote_id: Set(record.remote_id.clone()),
        name: Set(record.name.clone()),
        format: Set(record.mime_type.clone()),
        size: Set(record.size),
        extension: Set(file_extension(&record.name)),
        url: Set(record.url.clone()),
        created_at: Set(record.created_at),
    }
}

fn new_file_model(
    record: &UploadedFileRecord,
    document_type: Option<String>,
    case_id: Option<String>,
    derived_from: Option<String>,
) -> files::ActiveModel {
    files::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        name: Set(record.name.clone()),
        format: Set(record.mime_type.clone()),
        size: Set(record.size),
        extension: Set(file_extension(&record.name)),
        created_at: Set(record.created_at),
        document_type: Set(document_type),
        case_id: Set(case_id),
        derived_from: Set(derived_from),
    }
}

fn entry_from_model(file: files::Model) -> FileMetadataEntry {
    FileMetadataEntry {
        document_type: file.document_type.as_deref().and_then(DocumentType::from_uri),
        id: file.id,
        name: file.name,
        format: file.format,
        size: file.size,
        extension: file.extension,
        created_at: file.created_at,
    }
}

#[async_trait]
impl MetadataStore for SeaOrmMetadataStore {
    async fn insert_uploaded_file(
        &self,
        record: &UploadedFileRecord,
        linkage: &FileLinkage,
    ) -> SyncResult<FileMetadataEntry> {
        let document_type = linkage.document_type.map(|t| t.uri());
        let txn = self.db.begin().await?;

        let file = match &linkage.target {
            LinkTarget::LocalFile(uri) => {
                // The logical file already exists; swap its physical backing.
                let local = LocalFiles::find()
                    .filter(local_files::Column::Uri.eq(uri.as_str()))
                    .one(&txn)
                    .await?
                    .ok_or_else(|| SyncError::ResourceLookupFailed {
                        resource: "local file",
                        id: uri.clone(),
                    })?;
                let existing = Files::find_by_id(local.file_id.clone())
                    .one(&txn)
                    .await?
                    .ok_or_else(|| SyncError::ResourceLookupFailed {
                        resource: "file",
                        id: local.file_id.clone(),
                    })?;

                let mut active: files::ActiveModel = existing.into();
                active.name = Set(record.name.clone());
                active.format = Set(record.mime_type.clone());
                active.size = Set(record.size);
                active.extension = Set(file_extension(&record.name));
                active.created_at = Set(record.created_at);
                if document_type.is_some() {
                    active.document_type = Set(document_type);
                }
                let updated = active.update(&txn).await?;

                LocalFiles::delete_by_id(local.id).exec(&txn).await?;
                updated
            }
            LinkTarget::Case(case_id) => {
                if Cases::find_by_id(case_id.clone()).one(&txn).await?.is_none() {
                    return Err(SyncError::ResourceLookupFailed {
                        resource: "case",
                        id: case_id.clone(),
                    });
                }
                new_file_model(record, document_type, Some(case_id.clone()), None)
                    .insert(&txn)
                    .await?
            }
            LinkTarget::DerivedFrom(source) => {
                new_file_model(record, document_type, None, Some(source.clone()))
                    .insert(&txn)
                    .await?
            }
        };

        remote_file_model(&file.id, record).insert(&txn).await?;
        txn.commit().await?;

        tracing::info!(
            file_id = %file.id,
            remote_id = %record.remote_id,
            "Recorded uploaded file"
        );
        Ok(entry_from_model(file))
    }

    async fn get_remote_id(&self, local_id: &str) -> SyncResult<Option<String>> {
        let remote = RemoteFiles::find()
            .filter(remote_files::Column::FileId.eq(local_id))
            .one(&self.db)
            .await?;
        Ok(remote.map(|r| r.remote_id))
    }

    async fn get_local_id(&self, remote_id: &str) -> SyncResult<Option<String>> {
        let remote = RemoteFiles::find()
            .filter(remote_files::Column::RemoteId.eq(remote_id))
            .one(&self.db)
            .await?;
        Ok(remote.map(|r| r.file_id))
    }

    async fn delete_file(&self, local_id: &str) -> SyncResult<()> {
        let txn = self.db.begin().await?;
        RemoteFiles::delete_many()
            .filter(remote_files::Column::FileId.eq(local_id))
            .exec(&txn)
            .await?;
        LocalFiles::delete_many()
            .filter(local_files::Column::FileId.eq(local_id))
            .exec(&txn)
            .await?;
        let res = Files::delete_by_id(local_id.to_string()).exec(&txn).await?;
        txn.commit().await?;

        if res.rows_affected == 0 {
            tracing::debug!(file_id = local_id, "No logical file left to delete");
        }
        Ok(())
    }

    async fn get_dropped_file(&self, local_uri: &str) -> SyncResult<Option<DroppedDocument>> {
        let found = LocalFiles::find()
            .filter(local_files::Column::Uri.eq(local_uri))
            .find_also_related(Files)
            .one(&self.db)
            .await?;

        Ok(match found {
            Some((_, Some(file))) => Some(DroppedDocument {
                file_id: file.id,
                name: file.name,
                document_type_uri: file.document_type,
                case_id: file.case_id,
                source_id: file.derived_from,
            }),
            _ => None,
        })
    }

    async fn get_case_identifier(&self, case_id: &str) -> SyncResult<Option<String>> {
        let case = Cases::find_by_id(case_id.to_string()).one(&self.db).await?;
        Ok(case.map(|c| c.identifier))
    }

    async fn get_request_info(&self, case_id: &str) -> SyncResult<Option<RequestInfo>> {
        let case = Cases::find_by_id(case_id.to_string()).one(&self.db).await?;
        Ok(case.map(|c| RequestInfo {
            number: c.request_number,
            date: c.request_date,
        }))
    }

    async fn get_intervention_info(
        &self,
        intervention_id: &str,
    ) -> SyncResult<Option<InterventionInfo>> {
        let intervention = Interventions::find_by_id(intervention_id.to_string())
            .one(&self.db)
            .await?;
        Ok(intervention.map(|i| InterventionInfo {
            number: i.number,
            date: i.intervention_date,
        }))
    }

    async fn get_offer_info(&self, offer_id: &str) -> SyncResult<Option<OfferInfo>> {
        let found = Offers::find_by_id(offer_id.to_string())
            .find_also_related(Cases)
            .one(&self.db)
            .await?;
        Ok(match found {
            Some((offer, Some(case))) => Some(OfferInfo {
                request_number: case.request_number,
                version_info: offer.version_info,
                date: offer.offer_date,
            }),
            _ => None,
        })
    }

    async fn get_order_info(&self, order_id: &str) -> SyncResult<Option<OrderInfo>> {
        let found = Orders::find_by_id(order_id.to_string())
            .find_also_related(Cases)
            .one(&self.db)
            .await?;
        Ok(match found {
            Some((order, Some(case))) => Some(OrderInfo {
                request_number: case.request_number,
                date: order.order_date,
            }),
            _ => None,
        })
    }

    async fn get_invoice_info(&self, invoice_id: &str) -> SyncResult<Option<InvoiceInfo>> {
        let invoice = Invoices::find_by_id(invoice_id.to_string())
            .one(&self.db)
            .await?;
        Ok(invoice.map(|i| InvoiceInfo {
            number: i.number,
            date: i.invoice_date,
        }))
    }

    async fn get_production_ticket_info(
        &self,
        order_id: &str,
    ) -> SyncResult<Option<ProductionTicketInfo>> {
        let found = Orders::find_by_id(order_id.to_string())
            .find_also_related(Cases)
            .one(&self.db)
            .await?;
        Ok(match found {
            Some((order, Some(case))) => Some(ProductionTicketInfo {
                request_number: case.request_number,
                customer_name: case.customer_name,
                date: order.order_date,
            }),
            _ => None,
        })
    }
}
