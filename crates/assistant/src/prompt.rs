//! Prompt builder: renders the grounded prompt sent to the generation backend.
//!
//! The rendered template is the single source of truth for the JSON answer
//! shape; `orchestrator::validate_reply` parses exactly this shape.

use teamkb_core::RetrievalChunk;

/// Rendered in place of the documents section when nothing was retrieved.
pub const NO_DOCUMENTS: &str = "No documents retrieved";

/// Rendered in place of the history section when there is no history.
pub const NO_HISTORY: &str = "No previous conversation";

const INSTRUCTIONS: &str = r#"You have access to all the team's documented knowledge. Analyze the retrieved documents to answer the user's question. Remember to:
- Use ONLY the information from the retrieved documents above
- Cite any factual claims with chunk id and cursor, e.g. [doc:42,cursor:abc123]
- If the answer can be found in the documents, provide a comprehensive response
- If no relevant information is found, answer "I don't know" and suggest what information might be helpful to add
- If user asks for "more", set next_cursor to retriever_next_cursor
- Respond ONLY as valid JSON:

{
  "answer": "<assistant answer>",
  "citations": ["doc:42,cursor:abc123"],
  "next_cursor": "<cursor-or-null>",
  "follow_up": "<suggested follow-up>"
}"#;

/// Render the prompt for one request.
///
/// Pure: identical inputs always produce an identical string.
pub fn build_prompt(
    history: &[String],
    chunks: &[RetrievalChunk],
    query: &str,
    next_cursor: Option<&str>,
) -> String {
    format!(
        "RETRIEVED_DOCUMENTS:\n{documents}\n\n\
         CONVERSATION_HISTORY:\n{history}\n\n\
         USER_QUERY:\n{query}\n\n\
         RETRIEVER_NEXT_CURSOR:\n{cursor}\n\n\
         {INSTRUCTIONS}",
        documents = render_documents(chunks),
        history = render_history(history),
        cursor = next_cursor.unwrap_or("null"),
    )
}

fn render_documents(chunks: &[RetrievalChunk]) -> String {
    if chunks.is_empty() {
        return NO_DOCUMENTS.to_string();
    }
    chunks
        .iter()
        .map(|c| {
            format!(
                "Document {} (Source: {}, Cursor: {}):\n{}",
                c.id, c.source, c.cursor, c.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn render_history(history: &[String]) -> String {
    if history.is_empty() {
        return NO_HISTORY.to_string();
    }
    history
        .iter()
        .enumerate()
        .map(|(i, msg)| format!("User {}: {msg}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}
