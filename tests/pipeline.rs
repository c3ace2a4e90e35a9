//! End-to-end tests of the library pipeline over a real directory store.

use std::fs;
use std::sync::Arc;

use maritime_kb::enrichment::DisabledEnricher;
use maritime_kb::error::IngestError;
use maritime_kb::extract::{MIME_PDF, MIME_TEXT};
use maritime_kb::ingest::{Pipeline, PipelineOptions};
use maritime_kb::knowledge::build_knowledge_entries;
use maritime_kb::models::{DocumentType, KnowledgeCategory, SectionKind};
use maritime_kb::store::{DocumentStore, FsStore};
use tempfile::TempDir;

const VOYAGE_ORDERS: &str = "VOYAGE INSTRUCTIONS\n\
1. Proceed with all convenient speed to the loading port of Santos and tender NOR on arrival.\n\
2. Maintain a minimum of 15 percent bunkers remaining on board on arrival at the discharge port.\n\
\n\
WEATHER ROUTING\n\
The master shall follow the weather routing service advice. Report wind and swell daily at noon.\n";

const CHARTER_TERMS: &str = "CLAUSE 1\n\
Laytime for loading and discharging shall be 72 running hours, Sundays and holidays included.\n\
CLAUSE 2\n\
Demurrage shall be paid at USD 15,000 per day or pro rata for any part of a day.\n";

/// A one-page PDF whose content stream draws `text` in Helvetica.
fn minimal_pdf_with_text(text: &str) -> Vec<u8> {
    let stream = format!("BT /F1 12 Tf 72 720 Td ({}) Tj ET", text);
    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");
    let o1 = out.len();
    out.extend_from_slice(b"1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n");
    let o2 = out.len();
    out.extend_from_slice(b"2 0 obj << /Type /Pages /Kids [3 0 R] /Count 1 >> endobj\n");
    let o3 = out.len();
    out.extend_from_slice(b"3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >> endobj\n");
    let o4 = out.len();
    out.extend_from_slice(
        format!(
            "4 0 obj << /Length {} >> stream\n{}\nendstream endobj\n",
            stream.len(),
            stream
        )
        .as_bytes(),
    );
    let o5 = out.len();
    out.extend_from_slice(
        b"5 0 obj << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> endobj\n",
    );
    let xref_start = out.len();
    out.extend_from_slice(b"xref\n0 6\n");
    out.extend_from_slice(format!("{:010} 65535 f \n", 0).as_bytes());
    for offset in [o1, o2, o3, o4, o5] {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(b"trailer << /Size 6 /Root 1 0 R >>\nstartxref\n");
    out.extend_from_slice(format!("{}\n", xref_start).as_bytes());
    out.extend_from_slice(b"%%EOF\n");
    out
}

async fn setup() -> (TempDir, Pipeline) {
    let tmp = TempDir::new().unwrap();
    let store = FsStore::open(tmp.path().join("documents")).await.unwrap();
    let pipeline = Pipeline::new(
        Arc::new(store),
        Arc::new(DisabledEnricher),
        PipelineOptions::default(),
    );
    (tmp, pipeline)
}

#[tokio::test]
async fn test_text_document_end_to_end() {
    let (_tmp, pipeline) = setup().await;
    let doc = pipeline
        .ingest(VOYAGE_ORDERS.as_bytes(), MIME_TEXT, "voyage_orders.txt")
        .await
        .unwrap();

    assert_eq!(doc.document_type, DocumentType::WeatherReport);
    let titles: Vec<_> = doc.sections.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles[0], "VOYAGE INSTRUCTIONS");
    assert!(titles[1].starts_with("1. Proceed"));
    assert!(titles[2].starts_with("2. Maintain"));
    assert_eq!(titles[3], "WEATHER ROUTING");
    assert_eq!(doc.sections[1].kind, SectionKind::Clause);
    assert_eq!(doc.sections[3].kind, SectionKind::Header);
    assert!(doc.keywords.contains(&"bunkers".to_string()));

    let entries = build_knowledge_entries(&doc);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].title, "WEATHER ROUTING");
    assert_eq!(entries[0].category, KnowledgeCategory::Weather);
    assert_eq!(entries[0].id, format!("kb_{}_3", doc.id));
}

#[tokio::test]
async fn test_records_survive_reopen() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("documents");
    let doc = {
        let pipeline = Pipeline::new(
            Arc::new(FsStore::open(&dir).await.unwrap()),
            Arc::new(DisabledEnricher),
            PipelineOptions::default(),
        );
        pipeline
            .ingest(CHARTER_TERMS.as_bytes(), MIME_TEXT, "terms.txt")
            .await
            .unwrap()
    };

    let reopened = FsStore::open(&dir).await.unwrap();
    let loaded = reopened.get(&doc.id).await.unwrap().unwrap();
    assert_eq!(loaded, doc);
    assert_eq!(loaded.metadata.uploaded_at, doc.metadata.uploaded_at);
    assert_eq!(loaded.metadata.processed_at, doc.metadata.processed_at);
}

#[tokio::test]
async fn test_record_format_is_camel_case_json() {
    let (tmp, pipeline) = setup().await;
    let doc = pipeline
        .ingest(CHARTER_TERMS.as_bytes(), MIME_TEXT, "terms.txt")
        .await
        .unwrap();

    let raw = fs::read_to_string(tmp.path().join("documents").join(format!("{}.json", doc.id)))
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["originalName"], "terms.txt");
    assert_eq!(json["documentType"], "laytime_calculation");
    assert_eq!(json["metadata"]["pages"], 1);
    assert!(json["metadata"]["uploadedAt"].is_string());
    assert_eq!(json["sections"][0]["type"], "clause");
}

#[tokio::test]
async fn test_list_search_and_delete() {
    let (_tmp, pipeline) = setup().await;
    let first = pipeline
        .ingest(VOYAGE_ORDERS.as_bytes(), MIME_TEXT, "voyage_orders.txt")
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = pipeline
        .ingest(CHARTER_TERMS.as_bytes(), MIME_TEXT, "terms.txt")
        .await
        .unwrap();

    let ids: Vec<_> = pipeline
        .list_documents()
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.id)
        .collect();
    assert_eq!(ids, [second.id.clone(), first.id.clone()]);

    let hits = pipeline.search_documents("SANTOS").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, first.id);

    let laytime = pipeline
        .search_knowledge("", Some(KnowledgeCategory::Laytime))
        .await
        .unwrap();
    assert_eq!(laytime.len(), 2);
    assert!(laytime.iter().all(|e| e.document_id == second.id));
    assert!(laytime[0].relevance_score >= laytime[1].relevance_score);

    assert!(pipeline.delete_document(&second.id).await.unwrap());
    assert!(!pipeline.delete_document(&second.id).await.unwrap());
    assert!(pipeline.get_document(&second.id).await.unwrap().is_none());
    assert!(pipeline
        .knowledge_base()
        .await
        .unwrap()
        .iter()
        .all(|e| e.document_id == first.id));
}

#[tokio::test]
async fn test_pdf_ingestion() {
    let (_tmp, pipeline) = setup().await;
    let pdf = minimal_pdf_with_text("Laytime and demurrage as per charter party");
    let doc = pipeline
        .ingest(&pdf, MIME_PDF, "gencon.pdf")
        .await
        .unwrap();

    assert_eq!(doc.metadata.pages, 1);
    assert_eq!(doc.metadata.size, pdf.len() as u64);
    assert!(doc.content.contains("demurrage"), "content: {:?}", doc.content);
    assert_eq!(doc.document_type, DocumentType::CharterParty);
}

#[tokio::test]
async fn test_malformed_pdf_writes_nothing() {
    let (tmp, pipeline) = setup().await;
    let err = pipeline
        .ingest(b"%PDF-1.4\ngarbage", MIME_PDF, "broken.pdf")
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::Extraction(_)));
    assert_eq!(
        fs::read_dir(tmp.path().join("documents")).unwrap().count(),
        0
    );
}
