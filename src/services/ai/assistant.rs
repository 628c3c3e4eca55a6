use crate::services::ai::{LlmProvider, Message};

const SYSTEM_PROMPT: &str = r#"You are a helpful booking assistant for a technical services company.
You help users understand their bookings and company policies.

Use the context below to answer questions about:
- Business hours
- The user's existing bookings
- General booking policies (each booking lasts one hour, no bookings in the past)
- Available services and scheduling guidelines

Always reference the current date/time and business hours from the context when discussing availability.
Answer in Markdown. Be concise but informative.
"#;

/// Free-form answer for messages that are not booking actions.
pub async fn answer(llm: &dyn LlmProvider, context: &str, message: &str) -> anyhow::Result<String> {
    let system = format!("{SYSTEM_PROMPT}\nContext:\n{context}");
    let reply = llm.chat(&system, &[Message::user(message)]).await?;
    Ok(reply.trim().to_string())
}
