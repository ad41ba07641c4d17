/*!
 * A set of message layouts, looked up by frame id or by name
 */

use std::collections::HashMap;

use log::warn;

use crate::error::{CodecError, Result};
use crate::frame::CanFrame;
use crate::message_layout::MessageLayout;
use crate::options::{DecodeOptions, EncodeOptions};
use crate::value::SignalValues;

#[derive(Debug, Clone, Default)]
pub struct Database {
    messages: Vec<MessageLayout>,
    by_frame_id: HashMap<u32, usize>,
    by_name: HashMap<String, usize>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message. A later message with the same frame id or name takes
    /// over the lookup.
    pub fn add_message(&mut self, layout: MessageLayout) {
        let index = self.messages.len();
        if let Some(previous) = self.by_frame_id.insert(layout.frame_id(), index) {
            warn!(
                "Duplicate frame id {:#X}: '{}' replaces '{}'",
                layout.frame_id(),
                layout.name(),
                self.messages[previous].name()
            );
        }
        if self.by_name.insert(layout.name().to_owned(), index).is_some() {
            warn!("Duplicate message name '{}'", layout.name());
        }
        self.messages.push(layout);
    }

    /// Every message, in the order added.
    pub fn messages(&self) -> &[MessageLayout] {
        &self.messages
    }

    pub fn message_by_frame_id(&self, frame_id: u32) -> Result<&MessageLayout> {
        self.by_frame_id
            .get(&frame_id)
            .map(|index| &self.messages[*index])
            .ok_or(CodecError::UnknownFrameId(frame_id))
    }

    pub fn message_by_name(&self, name: &str) -> Result<&MessageLayout> {
        self.by_name
            .get(name)
            .map(|index| &self.messages[*index])
            .ok_or_else(|| CodecError::UnknownMessage(name.to_owned()))
    }

    pub fn encode_message(
        &self,
        name: &str,
        values: &SignalValues,
        options: &EncodeOptions,
    ) -> Result<Vec<u8>> {
        self.message_by_name(name)?.encode(values, options)
    }

    pub fn decode_message(
        &self,
        frame_id: u32,
        data: &[u8],
        options: &DecodeOptions,
    ) -> Result<SignalValues> {
        self.message_by_frame_id(frame_id)?.decode(data, options)
    }

    /// Decode a received frame, returning the layout it matched as well.
    pub fn decode_frame(
        &self,
        frame: &CanFrame,
        options: &DecodeOptions,
    ) -> Result<(&MessageLayout, SignalValues)> {
        let layout = self.message_by_frame_id(frame.id)?;
        Ok((layout, layout.decode_frame(frame, options)?))
    }
}

impl FromIterator<MessageLayout> for Database {
    fn from_iter<I: IntoIterator<Item = MessageLayout>>(iter: I) -> Self {
        let mut database = Database::new();
        for layout in iter {
            database.add_message(layout);
        }
        database
    }
}
