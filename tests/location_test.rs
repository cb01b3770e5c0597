mod common;

use chrono::{TimeZone, Utc};
use cloud_file_sync::config::StorageRoots;
use cloud_file_sync::error::SyncError;
use cloud_file_sync::models::{
    DocumentContext, DocumentType, InterventionInfo, InvoiceInfo, LocationSpec, OfferInfo,
    OrderInfo, ProductionTicketInfo, RequestInfo,
};
use cloud_file_sync::services::location::LocationResolver;
use cloud_file_sync::utils::clock::FixedClock;
use common::{InMemoryMetadataStore, date};
use std::sync::Arc;

fn resolver() -> LocationResolver {
    let clock = FixedClock(Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap());
    LocationResolver::new(StorageRoots::default(), Arc::new(clock))
}

#[tokio::test]
async fn test_invoice_number_is_padded_under_year() {
    let mut store = InMemoryMetadataStore::default();
    store.invoices.insert(
        "inv-1".to_string(),
        InvoiceInfo {
            number: "42".to_string(),
            date: date(2024, 2, 14),
        },
    );

    let locations = resolver()
        .resolve(
            DocumentType::Invoice,
            &DocumentContext::Invoice {
                invoice_id: "inv-1".to_string(),
            },
            &store,
        )
        .await
        .unwrap();

    assert_eq!(
        locations,
        vec![LocationSpec::new("/crm-development/invoices/2024", "F0000042.pdf")]
    );
}

#[tokio::test]
async fn test_deposit_invoice_shares_invoice_layout() {
    let mut store = InMemoryMetadataStore::default();
    store.invoices.insert(
        "inv-2".to_string(),
        InvoiceInfo {
            number: "1234567".to_string(),
            date: date(2023, 12, 31),
        },
    );

    let locations = resolver()
        .resolve(
            DocumentType::DepositInvoice,
            &DocumentContext::Invoice {
                invoice_id: "inv-2".to_string(),
            },
            &store,
        )
        .await
        .unwrap();

    assert_eq!(locations[0].full_path(), "/crm-development/invoices/2023/F1234567.pdf");
}

#[tokio::test]
async fn test_case_attachment_keeps_original_name() {
    let mut store = InMemoryMetadataStore::default();
    store
        .case_identifiers
        .insert("abc".to_string(), "AD-2024-001".to_string());

    let locations = resolver()
        .resolve(
            DocumentType::CaseAttachment,
            &DocumentContext::Case {
                case_id: "abc".to_string(),
                file_name: "scan.pdf".to_string(),
            },
            &store,
        )
        .await
        .unwrap();

    assert_eq!(locations.len(), 1);
    assert_eq!(
        locations[0].full_path(),
        "/crm-development/attachments/AD-2024-001/scan.pdf"
    );
}

#[tokio::test]
async fn test_invoice_export_has_canonical_and_timestamped_copy() {
    let store = InMemoryMetadataStore::default();

    let locations = resolver()
        .resolve(
            DocumentType::InvoiceAccountancyExport,
            &DocumentContext::AccountancyExport,
            &store,
        )
        .await
        .unwrap();

    assert_eq!(
        locations,
        vec![
            LocationSpec::new("/crm-development/winbooks", "ACT.csv"),
            LocationSpec::new("/crm-development/winbooks", "20240506070809-ACT.csv"),
        ]
    );
    assert_eq!(store.lookup_count(), 0);
}

#[tokio::test]
async fn test_customer_export_uses_csf_name() {
    let store = InMemoryMetadataStore::default();

    let locations = resolver()
        .resolve(
            DocumentType::CustomerAccountancyExport,
            &DocumentContext::AccountancyExport,
            &store,
        )
        .await
        .unwrap();

    assert_eq!(locations[0].file_name, "CSF.csv");
    assert_eq!(locations[1].file_name, "20240506070809-CSF.csv");
    assert_eq!(locations[0].directory_path, locations[1].directory_path);
}

#[tokio::test]
async fn test_unsupported_type_has_no_side_effect() {
    let store = InMemoryMetadataStore::default();

    let result = resolver()
        .resolve(
            DocumentType::ProductionTicketTemplate,
            &DocumentContext::AccountancyExport,
            &store,
        )
        .await;

    assert!(matches!(result, Err(SyncError::UnsupportedDocumentType(_))));
    assert_eq!(store.lookup_count(), 0);
}

#[tokio::test]
async fn test_production_ticket_customer_name_is_sanitized() {
    let mut store = InMemoryMetadataStore::default();
    store.production_tickets.insert(
        "order-1".to_string(),
        ProductionTicketInfo {
            request_number: 7788,
            customer_name: "Peeters\nJan|BV".to_string(),
            date: date(2024, 9, 1),
        },
    );

    let locations = resolver()
        .resolve(
            DocumentType::ProductionTicket,
            &DocumentContext::Order {
                order_id: "order-1".to_string(),
            },
            &store,
        )
        .await
        .unwrap();

    assert_eq!(
        locations[0].full_path(),
        "/crm-development/production-tickets/2024/AD7788_PeetersJanBV.pdf"
    );
}

#[tokio::test]
async fn test_request_and_intervention_reports() {
    let mut store = InMemoryMetadataStore::default();
    store.requests.insert(
        "case-1".to_string(),
        RequestInfo {
            number: 5512,
            date: date(2022, 4, 3),
        },
    );
    store.interventions.insert(
        "int-1".to_string(),
        InterventionInfo {
            number: 301,
            date: date(2023, 1, 9),
        },
    );
    let resolver = resolver();

    let visit = resolver
        .resolve(
            DocumentType::VisitReport,
            &DocumentContext::Request {
                case_id: "case-1".to_string(),
            },
            &store,
        )
        .await
        .unwrap();
    assert_eq!(visit[0].full_path(), "/crm-development/reports/2022/AD5512.pdf");

    let intervention = resolver
        .resolve(
            DocumentType::InterventionReport,
            &DocumentContext::Intervention {
                intervention_id: "int-1".to_string(),
            },
            &store,
        )
        .await
        .unwrap();
    assert_eq!(
        intervention[0].full_path(),
        "/crm-development/reports/2023/IR301.pdf"
    );
}

#[tokio::test]
async fn test_offer_order_and_delivery_note() {
    let mut store = InMemoryMetadataStore::default();
    store.offers.insert(
        "offer-1".to_string(),
        OfferInfo {
            request_number: 900,
            version_info: "v2".to_string(),
            date: date(2024, 1, 2),
        },
    );
    store.orders.insert(
        "order-1".to_string(),
        OrderInfo {
            request_number: 901,
            date: date(2025, 6, 30),
        },
    );
    let resolver = resolver();
    let order_context = DocumentContext::Order {
        order_id: "order-1".to_string(),
    };

    let offer = resolver
        .resolve(
            DocumentType::Offer,
            &DocumentContext::Offer {
                offer_id: "offer-1".to_string(),
            },
            &store,
        )
        .await
        .unwrap();
    assert_eq!(offer[0].full_path(), "/crm-development/offers/2024/AD900_v2.pdf");

    let order = resolver
        .resolve(DocumentType::Order, &order_context, &store)
        .await
        .unwrap();
    assert_eq!(order[0].full_path(), "/crm-development/orders/2025/AD901.pdf");

    let note = resolver
        .resolve(DocumentType::DeliveryNote, &order_context, &store)
        .await
        .unwrap();
    assert_eq!(
        note[0].full_path(),
        "/crm-development/delivery-notes/2025/AD901.pdf"
    );
}

#[tokio::test]
async fn test_missing_resource_is_lookup_failure() {
    let store = InMemoryMetadataStore::default();

    let result = resolver()
        .resolve(
            DocumentType::Invoice,
            &DocumentContext::Invoice {
                invoice_id: "missing".to_string(),
            },
            &store,
        )
        .await;

    match result {
        Err(SyncError::ResourceLookupFailed { resource, id }) => {
            assert_eq!(resource, "invoice");
            assert_eq!(id, "missing");
        }
        other => panic!("expected lookup failure, got {:?}", other),
    }
    assert_eq!(store.lookup_count(), 1);
}

#[tokio::test]
async fn test_mismatched_context_fails_before_lookup() {
    let store = InMemoryMetadataStore::default();

    let result = resolver()
        .resolve(
            DocumentType::Invoice,
            &DocumentContext::Case {
                case_id: "abc".to_string(),
                file_name: "scan.pdf".to_string(),
            },
            &store,
        )
        .await;

    assert!(matches!(
        result,
        Err(SyncError::InvalidContext {
            expected: "invoice",
            actual: "case",
            ..
        })
    ));
    assert_eq!(store.lookup_count(), 0);
}

#[tokio::test]
async fn test_custom_roots_are_used() {
    let mut store = InMemoryMetadataStore::default();
    store.orders.insert(
        "order-1".to_string(),
        OrderInfo {
            request_number: 1,
            date: date(2020, 1, 1),
        },
    );
    let roots = StorageRoots {
        orders: "/prod/orders".to_string(),
        ..StorageRoots::default()
    };
    let resolver = LocationResolver::new(roots, Arc::new(FixedClock(Utc::now())));

    let locations = resolver
        .resolve(
            DocumentType::Order,
            &DocumentContext::Order {
                order_id: "order-1".to_string(),
            },
            &store,
        )
        .await
        .unwrap();
    assert_eq!(locations[0].full_path(), "/prod/orders/2020/AD1.pdf");
}
