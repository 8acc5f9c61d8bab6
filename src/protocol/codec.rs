// LightControl Codec
// Encoding and strict parsing of the LightControl message format:
//
//   t:lights;g:<3-digit group>;s:<0|1>;
//
// NUL-terminated ASCII, fields separated by ';', each field <key>:<value>,
// fixed field order. Encoding is total; decoding is strict and partial.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Topic carried by every light command.
pub const LIGHT_CONTROL_TOPIC: &str = "lights";

const TOPIC_FIELD: &str = "t:lights";
const FIELD_SEPARATOR: char = ';';

// ============================================================================
// MESSAGE
// ============================================================================

/// One fully parsed light command: which group it addresses and the
/// commanded on/off state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightControlMessage {
    group: u16,
    state: bool,
}

impl LightControlMessage {
    pub fn new(group: u16, state: bool) -> Self {
        Self { group, state }
    }

    pub fn group(&self) -> u16 {
        self.group
    }

    pub fn state(&self) -> bool {
        self.state
    }

    /// Render the wire form. Total for any group in the 0-999 range.
    pub fn encode(&self) -> String {
        format!(
            "t:{};g:{:03};s:{};",
            LIGHT_CONTROL_TOPIC,
            self.group,
            if self.state { "1" } else { "0" }
        )
    }

    /// Wire form plus the terminating NUL that closes a frame.
    pub fn encode_framed(&self) -> Vec<u8> {
        let mut frame = self.encode().into_bytes();
        frame.push(0);
        frame
    }
}

impl fmt::Display for LightControlMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "lights group {:03} -> {}",
            self.group,
            if self.state { "ON" } else { "OFF" }
        )
    }
}

// ============================================================================
// CODEC ERRORS
// ============================================================================

/// Decode failures. None of these are fatal to the caller: an unusable
/// frame means "no command", never a crash or a partial actuator change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// First field is not the LightControl topic.
    #[error("unexpected topic field \"{0}\"")]
    SchemaMismatch(String),

    /// Well-formed message addressed to a different control group.
    #[error("message is for another control group: \"{0}\"")]
    GroupMismatch(String),

    /// Third field is not exactly `s:0` or `s:1`.
    #[error("malformed state field \"{0}\"")]
    MalformedState(String),

    /// A separator is missing before all three fields are complete.
    #[error("message truncated before all fields were present")]
    Truncated,
}

impl CodecError {
    /// A group mismatch is traffic for somebody else, not a protocol
    /// violation; callers may drop it silently.
    pub fn is_ignorable(&self) -> bool {
        matches!(self, Self::GroupMismatch(_))
    }
}

// ============================================================================
// CODEC
// ============================================================================

/// Parser and encoder bound to the locally configured control group.
#[derive(Debug, Clone)]
pub struct LightControlCodec {
    group: u16,
    expected_group_field: String,
}

impl LightControlCodec {
    pub fn new(group: u16) -> Self {
        Self {
            group,
            expected_group_field: format!("g:{:03}", group),
        }
    }

    pub fn group(&self) -> u16 {
        self.group
    }

    /// Build an outgoing message for this node's group.
    pub fn message(&self, state: bool) -> LightControlMessage {
        LightControlMessage::new(self.group, state)
    }

    /// Parse a received frame. Frames are NUL-terminated; anything past
    /// the first NUL is ignored.
    pub fn decode_bytes(&self, raw: &[u8]) -> Result<LightControlMessage, CodecError> {
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        let text = std::str::from_utf8(&raw[..end])
            .map_err(|_| CodecError::SchemaMismatch(String::from_utf8_lossy(&raw[..end]).into_owned()))?;
        self.decode(text)
    }

    /// Strict field-order parse of the text form.
    pub fn decode(&self, input: &str) -> Result<LightControlMessage, CodecError> {
        let mut rest = input;

        let topic = next_field(&mut rest).ok_or(CodecError::Truncated)?;
        if topic != TOPIC_FIELD {
            return Err(CodecError::SchemaMismatch(topic.to_string()));
        }

        let group = next_field(&mut rest).ok_or(CodecError::Truncated)?;
        if group != self.expected_group_field {
            return Err(CodecError::GroupMismatch(group.to_string()));
        }

        let state = next_field(&mut rest).ok_or(CodecError::Truncated)?;
        match state {
            "s:0" => Ok(LightControlMessage::new(self.group, false)),
            "s:1" => Ok(LightControlMessage::new(self.group, true)),
            other => Err(CodecError::MalformedState(other.to_string())),
        }
    }
}

/// Pop the next ';'-terminated field, advancing `rest` past the separator.
fn next_field<'a>(rest: &mut &'a str) -> Option<&'a str> {
    let idx = rest.find(FIELD_SEPARATOR)?;
    let field = &rest[..idx];
    *rest = &rest[idx + 1..];
    Some(field)
}
