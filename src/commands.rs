//! CLI command runners.
//!
//! Each `run_*` function drives one [`Pipeline`] operation and prints a
//! human-readable report to stdout. Errors propagate to `main` as `anyhow`
//! errors with context.

use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::extract::{MIME_PDF, MIME_TEXT};
use crate::ingest::Pipeline;
use crate::models::{KnowledgeCategory, KnowledgeEntry, ProcessedDocument};

/// Characters of content shown in list and search excerpts.
const EXCERPT_CHARS: usize = 160;

/// Best-effort mime type from a file extension.
pub fn guess_mime_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("pdf") => MIME_PDF,
        _ => MIME_TEXT,
    }
}

pub async fn run_ingest(
    pipeline: &Pipeline,
    path: &Path,
    mime_type: Option<&str>,
    refine: bool,
) -> Result<()> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document");
    let mime_type = mime_type.unwrap_or_else(|| guess_mime_type(path));

    let mut doc = pipeline
        .ingest(&bytes, mime_type, filename)
        .await
        .with_context(|| format!("Failed to ingest {}", path.display()))?;

    if refine {
        if let Some(refined) = pipeline.refine_document_type(&doc.id).await? {
            doc = refined;
        }
    }

    println!("ingest {}", filename);
    println!("  id:       {}", doc.id);
    println!("  type:     {}", doc.document_type);
    println!("  pages:    {}", doc.metadata.pages);
    println!("  size:     {} bytes", doc.metadata.size);
    println!("  sections: {}", doc.sections.len());
    println!("  keywords: {}", doc.keywords.join(", "));
    println!("  summary:  {}", doc.summary);
    println!("ok");
    Ok(())
}

pub async fn run_list(pipeline: &Pipeline) -> Result<()> {
    let docs = pipeline.list_documents().await?;
    if docs.is_empty() {
        println!("No documents.");
        return Ok(());
    }
    print_documents(&docs);
    Ok(())
}

pub async fn run_get(pipeline: &Pipeline, id: &str) -> Result<()> {
    let Some(doc) = pipeline.get_document(id).await? else {
        bail!("document not found: {}", id);
    };

    println!("--- Document ---");
    println!("id:           {}", doc.id);
    println!("name:         {}", doc.original_name);
    println!("filename:     {}", doc.filename);
    println!("type:         {}", doc.document_type);
    println!("pages:        {}", doc.metadata.pages);
    println!("size:         {}", doc.metadata.size);
    println!("uploaded_at:  {}", doc.metadata.uploaded_at.to_rfc3339());
    println!("processed_at: {}", doc.metadata.processed_at.to_rfc3339());
    println!("keywords:     {}", doc.keywords.join(", "));
    println!();

    println!("--- Summary ---");
    println!("{}", doc.summary);
    println!();

    println!("--- Sections ({}) ---", doc.sections.len());
    for (i, section) in doc.sections.iter().enumerate() {
        println!(
            "[{} {:?} p.{}] {}",
            i,
            section.kind,
            section.page,
            section.title
        );
        if !section.content.is_empty() {
            println!("{}", section.content);
        }
        println!();
    }

    Ok(())
}

pub async fn run_delete(pipeline: &Pipeline, id: &str) -> Result<()> {
    if pipeline.delete_document(id).await? {
        println!("Deleted {}.", id);
    } else {
        println!("No document with id {}.", id);
    }
    Ok(())
}

pub async fn run_search(pipeline: &Pipeline, query: &str) -> Result<()> {
    let docs = pipeline.search_documents(query).await?;
    if docs.is_empty() {
        println!("No results.");
        return Ok(());
    }
    print_documents(&docs);
    Ok(())
}

/// Without a query or category, prints the whole knowledge base.
pub async fn run_knowledge(
    pipeline: &Pipeline,
    query: Option<&str>,
    category: Option<KnowledgeCategory>,
    limit: Option<usize>,
) -> Result<()> {
    let mut entries = if query.is_none() && category.is_none() {
        pipeline.knowledge_base().await?
    } else {
        pipeline
            .search_knowledge(query.unwrap_or(""), category)
            .await?
    };
    if let Some(limit) = limit {
        entries.truncate(limit);
    }

    if entries.is_empty() {
        println!("No knowledge entries.");
        return Ok(());
    }
    print_entries(&entries);
    Ok(())
}

fn print_documents(docs: &[ProcessedDocument]) {
    for (i, doc) in docs.iter().enumerate() {
        println!("{}. {} [{}]", i + 1, doc.original_name, doc.document_type);
        println!(
            "    uploaded: {}",
            doc.metadata.uploaded_at.format("%Y-%m-%d %H:%M")
        );
        println!("    summary: \"{}\"", excerpt(&doc.summary));
        println!("    id: {}", doc.id);
        println!();
    }
}

fn print_entries(entries: &[KnowledgeEntry]) {
    for (i, entry) in entries.iter().enumerate() {
        println!(
            "{}. [{:.2}] {} / {}",
            i + 1,
            entry.relevance_score,
            entry.category,
            entry.title
        );
        if !entry.tags.is_empty() {
            println!("    tags: {}", entry.tags.join(", "));
        }
        println!("    excerpt: \"{}\"", excerpt(&entry.content));
        println!("    document: {}", entry.document_id);
        println!("    id: {}", entry.id);
        println!();
    }
}

fn excerpt(text: &str) -> String {
    let flat = text.replace('\n', " ");
    let flat = flat.trim();
    if flat.chars().count() <= EXCERPT_CHARS {
        return flat.to_string();
    }
    let cut: String = flat.chars().take(EXCERPT_CHARS).collect();
    format!("{}...", cut.trim_end())
}
