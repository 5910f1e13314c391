pub mod document;
pub mod metrics;
pub mod rich;

pub use document::{DiskState, Document, DocumentError, LegacyEncoding, LineEnding, TextEncoding};
pub use rich::{Alignment, Attr, Span, StyledText};
