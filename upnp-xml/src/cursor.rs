//! Forward-only XML cursor
//!
//! [`XmlCursor`] walks a document one node at a time on top of the quick-xml
//! pull reader. It only exposes what the UPnP codecs need: find the next start
//! tag with a given local name, read the text of a text-only element, iterate
//! over the direct children of an element, and verify the rest of the
//! document.
//!
//! Element and attribute names are reported by local name, so `s:Body`,
//! `SOAP-ENV:Body` and `Body` all read as `Body`.
//!
//! ```rust
//! use upnp_xml::{Node, XmlCursor};
//!
//! let mut cursor = XmlCursor::new("<e:property><Volume>35</Volume></e:property>");
//! let property = cursor.search_tag("property").unwrap().unwrap();
//! assert_eq!(property.name(), "property");
//!
//! let depth = cursor.depth();
//! let child = cursor.next_child(depth).unwrap().unwrap();
//! assert_eq!(child.name(), "Volume");
//! assert_eq!(cursor.read_text().unwrap(), "35");
//! assert!(cursor.next_child(depth).unwrap().is_none());
//! cursor.finish().unwrap();
//! ```

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Result, XmlError};

/// A start tag with its attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag {
    name: String,
    attributes: Vec<(String, String)>,
}

impl StartTag {
    /// Local name of the element
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unescaped value of the attribute with the given local name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

/// One step of the walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Start(StartTag),
    End(String),
    /// Unescaped character data (text or CDATA)
    Text(String),
    Eof,
}

/// Forward-only cursor over an XML document
pub struct XmlCursor<'a> {
    reader: Reader<&'a [u8]>,
    open: Vec<String>,
    pending_end: Option<String>,
    on_start: bool,
    seen_root: bool,
    done: bool,
}

impl<'a> XmlCursor<'a> {
    pub fn new(xml: &'a str) -> Self {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(false);
        Self {
            reader,
            open: Vec::new(),
            pending_end: None,
            on_start: false,
            seen_root: false,
            done: false,
        }
    }

    /// Number of currently open elements
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Local name of the innermost open element
    pub fn current_name(&self) -> Option<&str> {
        self.open.last().map(String::as_str)
    }

    /// Byte offset of the reader in the input
    pub fn position(&self) -> usize {
        self.reader.buffer_position()
    }

    fn syntax(&self, source: quick_xml::Error) -> XmlError {
        XmlError::Syntax {
            position: self.reader.buffer_position(),
            source,
        }
    }

    /// Advance to the next node.
    ///
    /// Declarations, comments, processing instructions and whitespace
    /// outside the document element are skipped. An empty element
    /// (`<a/>`) is reported as a start immediately followed by its end.
    ///
    /// # Errors
    ///
    /// Fails on tokenizer errors (including unknown or unterminated
    /// entities in text), on end tags that do not close the innermost open
    /// element, on content outside the document element and when the input
    /// ends with elements still open.
    pub fn next_node(&mut self) -> Result<Node> {
        let node = self.advance()?;
        self.on_start = matches!(node, Node::Start(_));
        Ok(node)
    }

    fn advance(&mut self) -> Result<Node> {
        if let Some(name) = self.pending_end.take() {
            self.open.pop();
            return Ok(Node::End(name));
        }
        if self.done {
            return Ok(Node::Eof);
        }

        loop {
            let event = self.reader.read_event().map_err(|e| self.syntax(e))?;
            match event {
                Event::Start(start) => {
                    let tag = self.start_tag(&start)?;
                    self.open_element(&tag)?;
                    return Ok(Node::Start(tag));
                }
                Event::Empty(start) => {
                    let tag = self.start_tag(&start)?;
                    self.open_element(&tag)?;
                    self.pending_end = Some(tag.name.clone());
                    return Ok(Node::Start(tag));
                }
                Event::End(end) => {
                    let found = String::from_utf8_lossy(end.local_name().as_ref()).into_owned();
                    return match self.open.pop() {
                        Some(expected) if expected == found => Ok(Node::End(found)),
                        Some(expected) => Err(XmlError::MismatchedEnd { expected, found }),
                        None => Err(XmlError::OutsideRoot(format!("</{}>", found))),
                    };
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(|e| self.syntax(e))?;
                    if self.open.is_empty() {
                        if text.trim().is_empty() {
                            continue;
                        }
                        return Err(XmlError::OutsideRoot(text.trim().to_string()));
                    }
                    return Ok(Node::Text(text.into_owned()));
                }
                Event::CData(data) => {
                    let text = String::from_utf8_lossy(&data).into_owned();
                    if self.open.is_empty() {
                        return Err(XmlError::OutsideRoot(text));
                    }
                    return Ok(Node::Text(text));
                }
                Event::Eof => {
                    if let Some(open) = self.open.last() {
                        return Err(XmlError::UnexpectedEof(open.clone()));
                    }
                    if !self.seen_root {
                        return Err(XmlError::MissingElement("document element".to_string()));
                    }
                    self.done = true;
                    return Ok(Node::Eof);
                }
                Event::Decl(_) | Event::PI(_) | Event::Comment(_) | Event::DocType(_) => {}
            }
        }
    }

    fn start_tag(&self, start: &BytesStart<'_>) -> Result<StartTag> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| self.syntax(quick_xml::Error::InvalidAttr(e)))?;
            let value = attr.unescape_value().map_err(|e| self.syntax(e))?;
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            attributes.push((key, value.into_owned()));
        }
        Ok(StartTag { name, attributes })
    }

    fn open_element(&mut self, tag: &StartTag) -> Result<()> {
        if self.open.is_empty() {
            if self.seen_root {
                return Err(XmlError::OutsideRoot(format!("<{}>", tag.name)));
            }
            self.seen_root = true;
        }
        self.open.push(tag.name.clone());
        Ok(())
    }

    /// Advance to the next start tag with the given local name.
    ///
    /// Returns `None` when the document ends without such a tag.
    pub fn search_tag(&mut self, name: &str) -> Result<Option<StartTag>> {
        self.search_tag_where(|tag| tag == name)
    }

    /// Advance to the next start tag whose local name satisfies `matches`
    pub fn search_tag_where<F>(&mut self, matches: F) -> Result<Option<StartTag>>
    where
        F: Fn(&str) -> bool,
    {
        loop {
            match self.next_node()? {
                Node::Start(tag) if matches(tag.name()) => return Ok(Some(tag)),
                Node::Eof => return Ok(None),
                _ => {}
            }
        }
    }

    /// Next direct child of the element open at `parent_depth`.
    ///
    /// Children that the caller did not consume, and anything nested inside
    /// them, are passed over. Returns `None` once the parent element is
    /// closed.
    pub fn next_child(&mut self, parent_depth: usize) -> Result<Option<StartTag>> {
        loop {
            match self.next_node()? {
                Node::Start(tag) if self.open.len() == parent_depth + 1 => return Ok(Some(tag)),
                Node::End(_) if self.open.len() < parent_depth => return Ok(None),
                Node::Eof => return Ok(None),
                _ => {}
            }
        }
    }

    /// Read the text content of the element whose start tag was just returned,
    /// leaving the cursor after its end tag.
    ///
    /// # Errors
    ///
    /// Fails with [`XmlError::UnexpectedElement`] when the element contains
    /// child elements, and with [`XmlError::NotOnStartTag`] when the last node
    /// was not a start tag.
    pub fn read_text(&mut self) -> Result<String> {
        if !self.on_start {
            return Err(XmlError::NotOnStartTag);
        }
        let parent = self.current_name().unwrap_or_default().to_string();

        let mut text = String::new();
        loop {
            match self.next_node()? {
                Node::Text(chunk) => text.push_str(&chunk),
                Node::End(_) => return Ok(text),
                Node::Start(tag) => {
                    return Err(XmlError::UnexpectedElement {
                        parent,
                        element: tag.name,
                    })
                }
                Node::Eof => return Err(XmlError::UnexpectedEof(parent)),
            }
        }
    }

    /// Skip the element whose start tag was just returned, including its content
    pub fn skip_element(&mut self) -> Result<()> {
        if !self.on_start {
            return Err(XmlError::NotOnStartTag);
        }
        let depth = self.open.len();
        loop {
            match self.next_node()? {
                Node::End(_) if self.open.len() < depth => return Ok(()),
                Node::Eof => return Err(XmlError::UnexpectedEof(String::new())),
                _ => {}
            }
        }
    }

    /// Read to the end of the document, validating everything that is left
    pub fn finish(mut self) -> Result<()> {
        while self.next_node()? != Node::Eof {}
        Ok(())
    }
}
