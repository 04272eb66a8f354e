//! Output surfaces a tool writes to while it executes.
//!
//! The *stage* is the append-only progress surface shown to the user; the
//! *choice* surface is the side channel for attachments tied to the
//! conversation turn. Both are owned by the hosting conversation loop and
//! passed to tools behind trait objects, so the runtime stays agnostic of
//! the presentation layer.

use crate::types::message::Attachment;
use std::sync::Mutex;

/// Append-only progress surface.
pub trait Stage: Send + Sync {
    fn append_content(&self, content: &str);
    fn add_attachment(&self, attachment: Attachment);
}

/// Side-channel attachment surface, independent of the stage.
pub trait ChoiceSurface: Send + Sync {
    fn add_attachment(&self, attachment: Attachment);
}

/// One observable event on a stage.
#[derive(Debug, Clone, PartialEq)]
pub enum StageEvent {
    Content(String),
    Attachment(Attachment),
}

/// In-memory stage that records every event in order.
#[derive(Default)]
pub struct RecordingStage {
    events: Mutex<Vec<StageEvent>>,
}

impl RecordingStage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<StageEvent> {
        self.events.lock().unwrap().clone()
    }

    /// All content appends, one entry per `append_content` call.
    pub fn content_appends(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                StageEvent::Content(text) => Some(text),
                StageEvent::Attachment(_) => None,
            })
            .collect()
    }

    /// The stage content as a single string.
    pub fn content(&self) -> String {
        self.content_appends().concat()
    }

    pub fn attachments(&self) -> Vec<Attachment> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                StageEvent::Attachment(att) => Some(att),
                StageEvent::Content(_) => None,
            })
            .collect()
    }
}

impl Stage for RecordingStage {
    fn append_content(&self, content: &str) {
        self.events
            .lock()
            .unwrap()
            .push(StageEvent::Content(content.to_string()));
    }

    fn add_attachment(&self, attachment: Attachment) {
        self.events
            .lock()
            .unwrap()
            .push(StageEvent::Attachment(attachment));
    }
}

/// In-memory choice surface that records attachments in order.
#[derive(Default)]
pub struct RecordingChoice {
    attachments: Mutex<Vec<Attachment>>,
}

impl RecordingChoice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attachments(&self) -> Vec<Attachment> {
        self.attachments.lock().unwrap().clone()
    }
}

impl ChoiceSurface for RecordingChoice {
    fn add_attachment(&self, attachment: Attachment) {
        self.attachments.lock().unwrap().push(attachment);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_stage_preserves_order() {
        let stage = RecordingStage::new();
        stage.append_content("a");
        stage.add_attachment(Attachment::file("files/x", "text/plain", "x"));
        stage.append_content("b");

        let events = stage.events();
        assert_eq!(events.len(), 3);
        assert_eq!(stage.content_appends(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(stage.content(), "ab");
        assert_eq!(stage.attachments().len(), 1);
    }

    #[test]
    fn test_recording_choice_collects_attachments() {
        let choice = RecordingChoice::new();
        choice.add_attachment(Attachment::file("files/a", "image/png", "a"));
        choice.add_attachment(Attachment::file("files/b", "image/png", "b"));
        assert_eq!(choice.attachments().len(), 2);
    }
}
