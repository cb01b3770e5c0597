use crate::config::StorageRoots;
use crate::error::{SyncError, SyncResult};
use crate::models::{ContextShape, DocumentContext, DocumentType, LocationSpec};
use crate::services::metadata_store::MetadataStore;
use crate::utils::clock::Clock;
use crate::utils::naming::{pad_invoice_number, sanitize_name_part};
use chrono::{Datelike, NaiveDate};
use std::sync::Arc;

/// Root directory family a rule writes under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Root {
    Attachments,
    Reports,
    Offers,
    Orders,
    DeliveryNotes,
    Invoices,
    ProductionTickets,
    AccountancyExports,
}

impl Root {
    fn path(self, roots: &StorageRoots) -> &str {
        match self {
            Root::Attachments => &roots.attachments,
            Root::Reports => &roots.reports,
            Root::Offers => &roots.offers,
            Root::Orders => &roots.orders,
            Root::DeliveryNotes => &roots.delivery_notes,
            Root::Invoices => &roots.invoices,
            Root::ProductionTickets => &roots.production_tickets,
            Root::AccountancyExports => &roots.accountancy_exports,
        }
    }
}

/// Business lookup plus file name template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Naming {
    /// `{root}/{case identifier}/{original name}`
    CaseAttachment,
    /// `{root}/{year}/{prefix}{request number}.pdf`
    Request { prefix: &'static str },
    /// `{root}/{year}/{prefix}{intervention number}.pdf`
    Intervention { prefix: &'static str },
    /// `{root}/{year}/AD{request number}_{version}.pdf`
    Offer,
    /// `{root}/{year}/AD{request number}.pdf`
    Order,
    /// `{root}/{year}/F{number padded to 7}.pdf`
    Invoice,
    /// `{root}/{year}/AD{request number}_{customer}.pdf`
    ProductionTicket,
    /// `{root}/{base}` plus a timestamped copy `{root}/{timestamp}-{base}`
    Export { base_name: &'static str },
}

#[derive(Debug, Clone, Copy)]
struct LocationRule {
    shape: ContextShape,
    root: Root,
    naming: Naming,
}

const fn rule(shape: ContextShape, root: Root, naming: Naming) -> LocationRule {
    LocationRule {
        shape,
        root,
        naming,
    }
}

/// Types without an entry have no location. There is no fallback.
const LOCATION_RULES: &[(DocumentType, LocationRule)] = &[
    (
        DocumentType::CaseAttachment,
        rule(ContextShape::Case, Root::Attachments, Naming::CaseAttachment),
    ),
    (
        DocumentType::VisitReport,
        rule(ContextShape::Request, Root::Reports, Naming::Request { prefix: "AD" }),
    ),
    (
        DocumentType::InterventionReport,
        rule(
            ContextShape::Intervention,
            Root::Reports,
            Naming::Intervention { prefix: "IR" },
        ),
    ),
    (
        DocumentType::Offer,
        rule(ContextShape::Offer, Root::Offers, Naming::Offer),
    ),
    (
        DocumentType::Order,
        rule(ContextShape::Order, Root::Orders, Naming::Order),
    ),
    (
        DocumentType::DeliveryNote,
        rule(ContextShape::Order, Root::DeliveryNotes, Naming::Order),
    ),
    (
        DocumentType::Invoice,
        rule(ContextShape::Invoice, Root::Invoices, Naming::Invoice),
    ),
    (
        DocumentType::DepositInvoice,
        rule(ContextShape::Invoice, Root::Invoices, Naming::Invoice),
    ),
    (
        DocumentType::ProductionTicket,
        rule(
            ContextShape::Order,
            Root::ProductionTickets,
            Naming::ProductionTicket,
        ),
    ),
    (
        DocumentType::InvoiceAccountancyExport,
        rule(
            ContextShape::AccountancyExport,
            Root::AccountancyExports,
            Naming::Export { base_name: "ACT.csv" },
        ),
    ),
    (
        DocumentType::CustomerAccountancyExport,
        rule(
            ContextShape::AccountancyExport,
            Root::AccountancyExports,
            Naming::Export { base_name: "CSF.csv" },
        ),
    ),
];

fn rule_for(document_type: DocumentType) -> Option<&'static LocationRule> {
    LOCATION_RULES
        .iter()
        .find(|(t, _)| *t == document_type)
        .map(|(_, rule)| rule)
}

fn found<T>(value: Option<T>, resource: &'static str, id: &str) -> SyncResult<T> {
    value.ok_or_else(|| SyncError::ResourceLookupFailed {
        resource,
        id: id.to_string(),
    })
}

fn yearly(root: &str, date: NaiveDate, file_name: String) -> LocationSpec {
    LocationSpec::new(format!("{}/{}", root, date.year()), file_name)
}

/// Maps a document type and its business context to the remote locations the
/// document must be written to. The first location is the tracked one.
pub struct LocationResolver {
    roots: StorageRoots,
    clock: Arc<dyn Clock>,
}

impl LocationResolver {
    pub fn new(roots: StorageRoots, clock: Arc<dyn Clock>) -> Self {
        Self { roots, clock }
    }

    /// Context shape the type's rule needs, or `None` when the type has no rule.
    pub fn expected_shape(document_type: DocumentType) -> Option<ContextShape> {
        rule_for(document_type).map(|r| r.shape)
    }

    pub async fn resolve(
        &self,
        document_type: DocumentType,
        context: &DocumentContext,
        store: &dyn MetadataStore,
    ) -> SyncResult<Vec<LocationSpec>> {
        let rule = rule_for(document_type)
            .ok_or_else(|| SyncError::UnsupportedDocumentType(document_type.to_string()))?;

        let invalid = || SyncError::InvalidContext {
            document_type: document_type.to_string(),
            expected: rule.shape.as_str(),
            actual: context.shape().as_str(),
        };
        if context.shape() != rule.shape {
            return Err(invalid());
        }

        let root = rule.root.path(&self.roots);
        let locations = match (rule.naming, context) {
            (Naming::CaseAttachment, DocumentContext::Case { case_id, file_name }) => {
                let identifier = found(store.get_case_identifier(case_id).await?, "case", case_id)?;
                vec![LocationSpec::new(
                    format!("{}/{}", root, identifier),
                    file_name.clone(),
                )]
            }
            (Naming::Request { prefix }, DocumentContext::Request { case_id }) => {
                let info = found(store.get_request_info(case_id).await?, "request", case_id)?;
                vec![yearly(root, info.date, format!("{}{}.pdf", prefix, info.number))]
            }
            (Naming::Intervention { prefix }, DocumentContext::Intervention { intervention_id }) => {
                let info = found(
                    store.get_intervention_info(intervention_id).await?,
                    "intervention",
                    intervention_id,
                )?;
                vec![yearly(root, info.date, format!("{}{}.pdf", prefix, info.number))]
            }
            (Naming::Offer, DocumentContext::Offer { offer_id }) => {
                let info = found(store.get_offer_info(offer_id).await?, "offer", offer_id)?;
                vec![yearly(
                    root,
                    info.date,
                    format!("AD{}_{}.pdf", info.request_number, info.version_info),
                )]
            }
            (Naming::Order, DocumentContext::Order { order_id }) => {
                let info = found(store.get_order_info(order_id).await?, "order", order_id)?;
                vec![yearly(root, info.date, format!("AD{}.pdf", info.request_number))]
            }
            (Naming::Invoice, DocumentContext::Invoice { invoice_id }) => {
                let info = found(store.get_invoice_info(invoice_id).await?, "invoice", invoice_id)?;
                vec![yearly(
                    root,
                    info.date,
                    format!("F{}.pdf", pad_invoice_number(&info.number)),
                )]
            }
            (Naming::ProductionTicket, DocumentContext::Order { order_id }) => {
                let info = found(
                    store.get_production_ticket_info(order_id).await?,
                    "order",
                    order_id,
                )?;
                vec![yearly(
                    root,
                    info.date,
                    format!(
                        "AD{}_{}.pdf",
                        info.request_number,
                        sanitize_name_part(&info.customer_name)
                    ),
                )]
            }
            (Naming::Export { base_name }, DocumentContext::AccountancyExport) => {
                let timestamp = self.clock.now().format("%Y%m%d%H%M%S");
                vec![
                    LocationSpec::new(root, base_name),
                    LocationSpec::new(root, format!("{}-{}", timestamp, base_name)),
                ]
            }
            _ => return Err(invalid()),
        };

        tracing::debug!(
            document_type = %document_type,
            canonical = %locations[0].full_path(),
            copies = locations.len() - 1,
            "Resolved upload location"
        );
        Ok(locations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_type_but_template_has_a_rule() {
        for document_type in DocumentType::ALL {
            let has_rule = rule_for(document_type).is_some();
            assert_eq!(
                has_rule,
                document_type != DocumentType::ProductionTicketTemplate,
                "{}",
                document_type
            );
        }
    }

    #[test]
    fn test_rule_shapes_match_naming() {
        for (document_type, rule) in LOCATION_RULES {
            let expected = match rule.naming {
                Naming::CaseAttachment => ContextShape::Case,
                Naming::Request { .. } => ContextShape::Request,
                Naming::Intervention { .. } => ContextShape::Intervention,
                Naming::Offer => ContextShape::Offer,
                Naming::Order | Naming::ProductionTicket => ContextShape::Order,
                Naming::Invoice => ContextShape::Invoice,
                Naming::Export { .. } => ContextShape::AccountancyExport,
            };
            assert_eq!(rule.shape, expected, "{}", document_type);
        }
    }

    #[test]
    fn test_expected_shape() {
        assert_eq!(
            LocationResolver::expected_shape(DocumentType::DeliveryNote),
            Some(ContextShape::Order)
        );
        assert_eq!(
            LocationResolver::expected_shape(DocumentType::ProductionTicketTemplate),
            None
        );
    }
}
