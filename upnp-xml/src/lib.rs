//! XML reading and repair for UPnP message bodies
//!
//! Bodies received from devices are walked with [`XmlCursor`], a forward-only
//! cursor over the quick-xml pull reader. The [`repair`] functions rewrite
//! the malformed bodies commonly sent by real devices so that a second parse
//! attempt can succeed, and [`LastChange`] handles the nested XML documents
//! carried by AV services' `LastChange` variable.

pub mod cursor;
pub mod error;
pub mod last_change;
pub mod repair;

pub use cursor::{Node, StartTag, XmlCursor};
pub use error::{Result, XmlError};
pub use last_change::{InstanceChanges, LastChange, VariableChange};
pub use repair::{escape_xml, fix_last_change, fix_truncated_envelope, fix_xml_entities};
