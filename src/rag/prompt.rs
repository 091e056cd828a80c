//! Rendering of the retrieval-augmented prompt.

use crate::config::RagPrompts;

/// Cue that ends every prompt; the model continues after it.
pub const ANSWER_CUE: &str = "Answer:";

/// Bullet rendered when no context was retrieved.
const EMPTY_CONTEXT: &str = "(no context items found)";

/// Builds the prompt from the template, the retrieved chunks and the query.
///
/// Rendering is pure: the same inputs always produce the same bytes. Query and
/// chunk text are inserted verbatim.
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    template: RagPrompts,
}

impl PromptBuilder {
    pub fn new(template: RagPrompts) -> Self {
        Self { template }
    }

    /// Render instructions, few-shot examples, context and query.
    pub fn build_prompt(&self, query: &str, context_chunks: &[String]) -> String {
        let mut prompt = String::new();

        prompt.push_str(self.template.instructions.trim_end());
        prompt.push('\n');

        for (i, example) in self.template.examples.iter().enumerate() {
            prompt.push_str(&format!(
                "\nExample {}:\nQuery: {}\n{} {}\n",
                i + 1,
                example.query,
                ANSWER_CUE,
                example.answer
            ));
        }

        prompt.push('\n');
        prompt.push_str(&self.template.context_header);
        prompt.push('\n');
        prompt.push_str(&format_context(context_chunks));
        prompt.push_str("\n\n");
        prompt.push_str(&self.template.passages_cue);
        prompt.push_str(&format!("\nUser query: {}\n{}", query, ANSWER_CUE));

        prompt
    }
}

/// Join chunks as a bulleted list, keeping their order.
pub fn format_context(chunks: &[String]) -> String {
    if chunks.is_empty() {
        return format!("- {}", EMPTY_CONTEXT);
    }
    format!("- {}", chunks.join("\n- "))
}
