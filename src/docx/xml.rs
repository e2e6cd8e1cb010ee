//! Minimal owned XML tree over quick-xml events
//!
//! Keeps start tags as raw `BytesStart` so attributes and namespace
//! declarations are written back untouched; only text is re-escaped.

use anyhow::{bail, Context, Result};
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

#[derive(Debug, Clone)]
pub enum XmlNode {
    Element {
        start: BytesStart<'static>,
        children: Vec<XmlNode>,
    },
    Empty(BytesStart<'static>),
    /// Unescaped character data
    Text(String),
    /// Declarations, comments, processing instructions, CDATA
    Other(Event<'static>),
}

impl XmlNode {
    pub fn empty(name: &str, attributes: &[(&str, &str)]) -> Self {
        let mut start = BytesStart::new(name.to_string());
        for attribute in attributes {
            start.push_attribute(*attribute);
        }
        XmlNode::Empty(start)
    }

    /// Qualified tag name, e.g. `w:r`
    pub fn name(&self) -> Option<&[u8]> {
        match self {
            XmlNode::Element { start, .. } | XmlNode::Empty(start) => {
                Some(start.name().into_inner())
            }
            _ => None,
        }
    }

    pub fn is(&self, name: &str) -> bool {
        self.name() == Some(name.as_bytes())
    }

    pub fn children(&self) -> &[XmlNode] {
        match self {
            XmlNode::Element { children, .. } => children,
            _ => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<XmlNode>> {
        match self {
            XmlNode::Element { children, .. } => Some(children),
            _ => None,
        }
    }

    /// Concatenated text of direct text children
    pub fn text(&self) -> String {
        self.children()
            .iter()
            .filter_map(|c| match c {
                XmlNode::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Parse a document into its top-level nodes
pub fn parse(xml: &str) -> Result<Vec<XmlNode>> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<(BytesStart<'static>, Vec<XmlNode>)> = Vec::new();
    let mut top = Vec::new();

    loop {
        let event = reader
            .read_event()
            .with_context(|| format!("Malformed XML at byte {}", reader.buffer_position()))?;

        let node = match event {
            Event::Start(e) => {
                stack.push((e.into_owned(), Vec::new()));
                continue;
            }
            Event::End(_) => {
                let (start, children) = stack.pop().context("Unbalanced end tag")?;
                XmlNode::Element { start, children }
            }
            Event::Empty(e) => XmlNode::Empty(e.into_owned()),
            Event::Text(e) => XmlNode::Text(e.unescape()?.into_owned()),
            Event::Eof => break,
            other => XmlNode::Other(other.into_owned()),
        };

        match stack.last_mut() {
            Some((_, children)) => children.push(node),
            None => top.push(node),
        }
    }

    if !stack.is_empty() {
        bail!("Unclosed element at end of document");
    }

    Ok(top)
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &XmlNode) -> Result<()> {
    match node {
        XmlNode::Element { start, children } => {
            writer.write_event(Event::Start(start.clone()))?;
            for child in children {
                write_node(writer, child)?;
            }
            writer.write_event(Event::End(start.to_end()))?;
        }
        XmlNode::Empty(start) => writer.write_event(Event::Empty(start.clone()))?,
        XmlNode::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
        XmlNode::Other(event) => writer.write_event(event.clone())?,
    }
    Ok(())
}

/// Serialise nodes back to bytes
pub fn write(nodes: &[XmlNode]) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    for node in nodes {
        write_node(&mut writer, node)?;
    }
    Ok(writer.into_inner())
}
