pub mod blogml;
pub mod converter;
pub mod error;
pub mod messages;
pub mod models;
pub mod source;
pub mod transform;

pub use converter::BlogConverter;
pub use error::ConvertError;
pub use messages::{ConverterMessage, Discard, MessageSink};
