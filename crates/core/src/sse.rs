use crate::chat::ChatEvent;
use crate::error::RagError;
use serde_json::json;

/// Renders one chat event as a server-sent-event frame: `data: {json}` with
/// a blank-line terminator, and the literal `[DONE]` sentinel for the end of
/// the turn.
pub fn frame(event: &ChatEvent) -> Result<String, RagError> {
    let body = match event {
        ChatEvent::Content(content) => serde_json::to_string(&json!({ "content": content }))?,
        ChatEvent::Sources(sources) => serde_json::to_string(&json!({ "sources": sources }))?,
        ChatEvent::Done => return Ok("data: [DONE]\n\n".to_string()),
    };

    Ok(format!("data: {body}\n\n"))
}
