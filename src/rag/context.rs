use crate::graph::state::Document;

/// Concatenate document contents, separated by a blank line
pub fn format_documents(documents: &[Document]) -> String {
    documents
        .iter()
        .map(|doc| doc.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
