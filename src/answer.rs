use crate::chunking::Segment;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::generation::{AnswerStream, Generator};
use crate::indexing::Retriever;

pub const PROMPT_TEMPLATE: &str = "\
Task:
You are a question-answering assistant. Answer the question using only the context given below.

Rules:

- Answer in bullet points.
- Base the answer only on the information in the context.
- If the answer is not in the context, say \"I don't know\".
- Keep the answer relevant to the question and limited to the context.

Question: {question}
Context: {context}
Answer:
";

/// Joins segment texts with a blank line between them.
pub fn format_segments(segments: &[&Segment]) -> String {
    segments
        .iter()
        .map(|s| s.content())
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn render_prompt(question: &str, context: &str) -> String {
    // substituted text is never scanned for placeholders again
    match PROMPT_TEMPLATE.split_once("{context}") {
        Some((head, tail)) => format!(
            "{}{}{}",
            head.replace("{question}", question),
            context,
            tail.replace("{question}", question)
        ),
        None => PROMPT_TEMPLATE.replace("{question}", question),
    }
}

/// Retrieve, fill the prompt, stream the completion.
pub struct RagChain<'a, E: Embedder, G: Generator> {
    retriever: Retriever<'a, E>,
    generator: G,
}

impl<'a, E: Embedder, G: Generator> RagChain<'a, E, G> {
    pub fn new(retriever: Retriever<'a, E>, generator: G) -> Self {
        Self {
            retriever,
            generator,
        }
    }

    pub fn prompt_for(&self, question: &str) -> Result<String> {
        let segments = self.retriever.retrieve(question)?;
        log::debug!("retrieved {} segments for {:?}", segments.len(), question);
        let context = format_segments(&segments);
        Ok(render_prompt(question, &context))
    }

    pub fn stream(&self, question: &str) -> Result<AnswerStream> {
        let prompt = self.prompt_for(question)?;
        self.generator.stream(&prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::MarkdownHeaderSplitter;

    #[test]
    fn segments_are_joined_with_blank_line() {
        let segments = MarkdownHeaderSplitter::default().split_text("# A\nfoo\n\n# B\nbar\n");
        let refs: Vec<&Segment> = segments.iter().collect();
        assert_eq!(format_segments(&refs), "# A\nfoo\n\n# B\nbar");
    }

    #[test]
    fn prompt_contains_question_and_context() {
        let prompt = render_prompt("What is it?", "It is a thing.");
        assert!(prompt.contains("Question: What is it?"));
        assert!(prompt.contains("Context: It is a thing."));
        assert!(prompt.contains("I don't know"));
        assert!(!prompt.contains("{question}"));
        assert!(!prompt.contains("{context}"));
    }

    #[test]
    fn placeholders_inside_context_are_left_alone() {
        let prompt = render_prompt("q", "literal {question} text");
        assert!(prompt.contains("Context: literal {question} text"));

        let prompt = render_prompt("what does {context} mean?", "ctx");
        assert!(prompt.contains("Question: what does {context} mean?"));
        assert!(prompt.contains("Context: ctx"));
    }
}
