//! Streaming response aggregation shared by completion-driven tools.

use crate::client::{ChatChunk, ChunkStream};
use crate::surface::Stage;
use crate::types::message::Attachment;
use crate::Result;
use futures::StreamExt;

/// Final aggregate of a consumed completion stream.
#[derive(Debug, Clone, Default)]
pub struct StreamedCompletion {
    pub text: String,
    pub attachments: Vec<Attachment>,
}

/// Consume an incremental completion response, forwarding every text delta
/// and attachment to `stage` as it arrives and accumulating the final
/// result.
///
/// Text is appended in receipt order; attachments in receipt order within
/// each increment. Increments without choices or without a delta are
/// no-ops. A transport failure propagates as the operation's error; output
/// already forwarded to the stage stays visible.
pub async fn aggregate_stream(
    mut stream: ChunkStream,
    stage: &dyn Stage,
) -> Result<StreamedCompletion> {
    let mut completion = StreamedCompletion::default();
    while let Some(chunk) = stream.next().await {
        consume_chunk(chunk?, stage, &mut completion);
    }
    Ok(completion)
}

fn consume_chunk(chunk: ChatChunk, stage: &dyn Stage, completion: &mut StreamedCompletion) {
    let Some(choice) = chunk.choices.into_iter().next() else {
        return;
    };
    let Some(delta) = choice.delta else {
        return;
    };
    if let Some(content) = delta.content {
        if !content.is_empty() {
            stage.append_content(&content);
            completion.text.push_str(&content);
        }
    }
    if let Some(custom) = delta.custom_content {
        for attachment in custom.attachments {
            stage.add_attachment(attachment.clone());
            completion.attachments.push(attachment);
        }
    }
}
