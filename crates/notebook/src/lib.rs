pub mod autosave;
pub mod json;
pub mod model;
pub mod xml;

pub use autosave::{AutosaveError, AutosaveTimer, Autosaver, AUTOSAVE_FILE};
pub use json::JsonError;
pub use model::{Notebook, Page};
pub use xml::XmlError;
