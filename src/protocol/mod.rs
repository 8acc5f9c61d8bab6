// Protocol module - the LightControl wire format
// Pure encode/decode of the semicolon-delimited light command frames

mod codec;

pub use codec::{CodecError, LightControlCodec, LightControlMessage, LIGHT_CONTROL_TOPIC};
