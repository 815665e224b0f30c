use crate::models::RetrievedPassage;

pub const DEFAULT_PERSONA: &str = "You are the portfolio assistant for a researcher. \
Answer accurately and courteously, grounded only in the provided document excerpts. \
Do not guess beyond the supplied information.";

/// Stands in for the context block when retrieval produced nothing, so the
/// prompt stays well-formed and the model can say it lacks material.
pub const NO_CONTEXT_SENTENCE: &str =
    "No matching documents were found for this question.";

/// One context budget applied everywhere before prompt assembly, counted in
/// characters.
#[derive(Debug, Clone, Copy)]
pub struct TruncationPolicy {
    pub max_context_chars: usize,
}

impl Default for TruncationPolicy {
    fn default() -> Self {
        Self {
            max_context_chars: 50_000,
        }
    }
}

impl TruncationPolicy {
    pub fn apply(&self, context: &str) -> String {
        match context.char_indices().nth(self.max_context_chars) {
            Some((byte_offset, _)) => context[..byte_offset].to_string(),
            None => context.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PromptAssembler {
    persona: String,
    truncation: TruncationPolicy,
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_PERSONA, TruncationPolicy::default())
    }
}

impl PromptAssembler {
    pub fn new(persona: impl Into<String>, truncation: TruncationPolicy) -> Self {
        Self {
            persona: persona.into(),
            truncation,
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.persona
    }

    /// Passage contents joined by blank lines, truncated to the context
    /// budget. Empty input yields the no-context sentence instead of an
    /// empty block.
    pub fn build_context(&self, passages: &[RetrievedPassage]) -> String {
        if passages.is_empty() {
            return NO_CONTEXT_SENTENCE.to_string();
        }

        let joined = passages
            .iter()
            .map(|passage| passage.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        self.truncation.apply(&joined)
    }

    pub fn build_prompt(&self, question: &str, context: &str) -> String {
        format!(
            "Use the following document excerpts to answer the question:\n\n{context}\n\nQuestion: {question}"
        )
    }

    /// Prompt for the structured summary of one source's stored content.
    pub fn build_summary_prompt(&self, title: &str, body: &str) -> String {
        let body = self.truncation.apply(body);
        format!(
            "Produce a structured summary of the following work. \
Write each section in 100-150 words.\n\n\
Title: {title}\n\n\
Content:\n{body}\n\n\
Respond with JSON in this shape:\n\
{{\n  \"keyContribution\": \"...\",\n  \"methodology\": \"...\",\n  \"results\": \"...\",\n  \"limitations\": \"...\",\n  \"practicalImplications\": \"...\"\n}}"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn passage(content: &str) -> RetrievedPassage {
        RetrievedPassage {
            content: content.to_string(),
            metadata: json!({}),
            similarity: 0.9,
        }
    }

    #[test]
    fn context_joins_passages_with_blank_lines() {
        let assembler = PromptAssembler::default();
        let context = assembler.build_context(&[passage("first"), passage("second")]);

        assert_eq!(context, "first\n\nsecond");
    }

    #[test]
    fn empty_passages_still_produce_a_valid_prompt() {
        let assembler = PromptAssembler::default();
        let context = assembler.build_context(&[]);
        let prompt = assembler.build_prompt("What did you publish?", &context);

        assert!(prompt.contains(NO_CONTEXT_SENTENCE));
        assert!(prompt.ends_with("Question: What did you publish?"));
    }

    #[test]
    fn truncation_is_applied_before_assembly() {
        let assembler = PromptAssembler::new(
            DEFAULT_PERSONA,
            TruncationPolicy {
                max_context_chars: 10,
            },
        );

        let context = assembler.build_context(&[passage("0123456789abcdef")]);
        assert_eq!(context, "0123456789");
    }

    #[test]
    fn truncation_respects_character_boundaries() {
        let policy = TruncationPolicy {
            max_context_chars: 2,
        };

        assert_eq!(policy.apply("한국어 텍스트"), "한국");
    }

    #[test]
    fn summary_prompt_truncates_the_body_with_the_same_policy() {
        let assembler = PromptAssembler::new(
            DEFAULT_PERSONA,
            TruncationPolicy {
                max_context_chars: 4,
            },
        );

        let prompt = assembler.build_summary_prompt("Paper", "abcdefgh");
        assert!(prompt.contains("Content:\nabcd\n"));
        assert!(!prompt.contains("abcde"));
        assert!(prompt.contains("keyContribution"));
    }
}
