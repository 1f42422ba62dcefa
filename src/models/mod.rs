pub mod document;
pub mod oembed;
pub mod validation;

pub use document::{CreateDocumentRequest, Document, UpdateDocumentRequest};
pub use oembed::{OEmbedParsedRequest, OEmbedResponse};
pub use validation::{StringValidator, ValidationError, Validator};
