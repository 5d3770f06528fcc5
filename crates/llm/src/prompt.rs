//! The retrieval-augmented prompt sent to the LLM.

use crate::provider::Message;

/// What the model is told to say when the context does not cover the question.
pub const NO_ANSWER: &str = "I don't have enough information";

/// Join retrieved chunk texts into the context block, blank line between each.
pub fn format_context<S: AsRef<str>>(contexts: &[S]) -> String {
    contexts
        .iter()
        .map(|c| c.as_ref())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Render the full prompt text.
pub fn render(context: &str, question: &str) -> String {
    format!(
        "Answer the question based only on the following context.\n\
         If the answer is not in the context, say \"{NO_ANSWER}\".\n\
         \n\
         Context:\n\
         {context}\n\
         \n\
         Question: {question}\n\
         Answer:"
    )
}

/// The prompt as a single user message.
pub fn build_messages<S: AsRef<str>>(contexts: &[S], question: &str) -> Vec<Message> {
    vec![Message::user(render(&format_context(contexts), question))]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Role;

    #[test]
    fn prompt_has_exact_layout() {
        let messages = build_messages(&["first chunk", "second chunk"], "What is it?");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(
            messages[0].content,
            "Answer the question based only on the following context.\n\
             If the answer is not in the context, say \"I don't have enough information\".\n\
             \n\
             Context:\n\
             first chunk\n\nsecond chunk\n\
             \n\
             Question: What is it?\n\
             Answer:"
        );
    }

    #[test]
    fn empty_context_still_renders() {
        let messages = build_messages::<&str>(&[], "Anything?");
        assert!(messages[0].content.contains("Context:\n\n\nQuestion: Anything?"));
    }
}
