//! Owned, mutable XML document model
//!
//! Parsing goes through `roxmltree` (read-only, namespace aware) and is copied
//! into an owned [`Element`] tree that can be edited in place. Elements in the
//! document namespace are stored under their local name and that namespace
//! becomes the unprefixed default on the root, however the source spelled it.
//! Serialization writes the tree back with `quick-xml`.

use quick_xml::events::{BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};
use quick_xml::Writer;
use tracing::trace;

use crate::domain::error::{DomainError, DomainResult};

/// Namespace declaration carried by an element: `(prefix, uri)`.
///
/// A `None` prefix is the default namespace (`xmlns="..."`).
pub type NamespaceDecl = (Option<String>, String);

/// A node in the document tree.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(Element),
    Text(String),
    Comment(String),
    ProcessingInstruction { target: String, value: Option<String> },
}

/// An XML element with ordered attributes and children.
///
/// Elements of the document namespace carry their local name (`title`); names
/// from other namespaces keep their prefix (`editor:foo`). An element created
/// with a bare name lands in the document namespace.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    name: String,
    namespaces: Vec<NamespaceDecl>,
    attributes: Vec<(String, String)>,
    children: Vec<XmlNode>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespaces: Vec::new(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder form of [`Element::set_attr`].
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder form of [`Element::set_text`].
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.set_text(Some(text.into()));
        self
    }

    /// Builder form of [`Element::append`].
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespaces(&self) -> &[NamespaceDecl] {
        &self.namespaces
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing an existing value in its original position.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Concatenated direct text content, `None` if the element has no text nodes.
    pub fn text(&self) -> Option<String> {
        let mut texts = self.children.iter().filter_map(|c| match c {
            XmlNode::Text(t) => Some(t.as_str()),
            _ => None,
        });
        let first = texts.next()?;
        Some(texts.fold(first.to_string(), |mut acc, t| {
            acc.push_str(t);
            acc
        }))
    }

    /// Replace all direct text content. `None` clears it.
    pub fn set_text(&mut self, text: Option<String>) {
        self.children.retain(|c| !matches!(c, XmlNode::Text(_)));
        if let Some(text) = text {
            self.children.insert(0, XmlNode::Text(text));
        }
    }

    /// Append a child element and return a handle to it.
    pub fn append(&mut self, child: Element) -> &mut Element {
        self.children.push(XmlNode::Element(child));
        match self.children.last_mut() {
            Some(XmlNode::Element(el)) => el,
            _ => unreachable!("element was just pushed"),
        }
    }

    /// Direct child elements.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|c| match c {
            XmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    /// First element matching a slash-separated path of child names, relative to `self`.
    pub fn find(&self, path: &str) -> Option<&Element> {
        self.find_all(path).into_iter().next()
    }

    pub fn find_mut(&mut self, path: &str) -> Option<&mut Element> {
        self.find_all_mut(path).into_iter().next()
    }

    /// All elements matching a slash-separated path, in document order.
    pub fn find_all(&self, path: &str) -> Vec<&Element> {
        let segments: Vec<&str> = path.split('/').collect();
        let mut found = Vec::new();
        collect(self, &segments, &mut found);
        found
    }

    pub fn find_all_mut(&mut self, path: &str) -> Vec<&mut Element> {
        let segments: Vec<&str> = path.split('/').collect();
        let mut found = Vec::new();
        collect_mut(self, &segments, &mut found);
        found
    }
}

fn collect<'a>(element: &'a Element, segments: &[&str], out: &mut Vec<&'a Element>) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };
    for child in element.elements().filter(|c| c.name == *first) {
        if rest.is_empty() {
            out.push(child);
        } else {
            collect(child, rest, out);
        }
    }
}

fn collect_mut<'a>(element: &'a mut Element, segments: &[&str], out: &mut Vec<&'a mut Element>) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };
    for node in element.children.iter_mut() {
        if let XmlNode::Element(child) = node {
            if child.name != *first {
                continue;
            }
            if rest.is_empty() {
                out.push(child);
            } else {
                collect_mut(child, rest, out);
            }
        }
    }
}

/// A parsed document whose root lives in a known namespace.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    root: Element,
}

impl XmlDocument {
    /// Parse `text` and require the root element to be in `namespace`.
    pub fn parse(text: &str, namespace: &str) -> DomainResult<Self> {
        let doc = roxmltree::Document::parse(text).map_err(|e| DomainError::Parse {
            message: e.to_string(),
        })?;
        let root = doc.root_element();

        let found = root.tag_name().namespace();
        if found != Some(namespace) {
            return Err(DomainError::NamespaceMismatch {
                expected: namespace.to_string(),
                found: found.map(str::to_string),
            });
        }

        let root = convert_root(root, namespace);
        trace!("parsed document root <{}>", root.name);
        Ok(Self { root })
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    /// Serialize as UTF-8 with an XML declaration.
    pub fn to_bytes(&self) -> DomainResult<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(serialize_err)?;
        writer
            .write_event(Event::Text(BytesText::new("\n")))
            .map_err(serialize_err)?;
        write_element(&mut writer, &self.root)?;
        writer
            .write_event(Event::Text(BytesText::new("\n")))
            .map_err(serialize_err)?;
        Ok(writer.into_inner())
    }
}

fn serialize_err(e: impl std::fmt::Display) -> DomainError {
    DomainError::Serialize {
        message: e.to_string(),
    }
}

fn in_scope_namespaces(node: roxmltree::Node) -> Vec<NamespaceDecl> {
    node.namespaces()
        .filter(|ns| ns.name() != Some("xml"))
        .map(|ns| (ns.name().map(str::to_string), ns.uri().to_string()))
        .collect()
}

/// `prefix:local` using a non-empty prefix bound to `namespace` in scope.
fn prefixed_name(node: roxmltree::Node, local: &str, namespace: Option<&str>) -> String {
    let prefix = namespace.and_then(|uri| {
        node.namespaces()
            .find(|ns| ns.uri() == uri && ns.name().is_some_and(|p| !p.is_empty()))
            .and_then(|ns| ns.name())
    });
    match prefix {
        Some(prefix) => format!("{prefix}:{local}"),
        None => local.to_string(),
    }
}

fn element_name(node: roxmltree::Node, document_ns: &str) -> String {
    let tag = node.tag_name();
    if tag.namespace() == Some(document_ns) {
        tag.name().to_string()
    } else {
        prefixed_name(node, tag.name(), tag.namespace())
    }
}

fn convert_root(node: roxmltree::Node, document_ns: &str) -> Element {
    // the root's own default declaration is replaced by the document namespace
    let mut namespaces: Vec<NamespaceDecl> = in_scope_namespaces(node)
        .into_iter()
        .filter(|(prefix, _)| prefix.is_some())
        .collect();
    namespaces.push((None, document_ns.to_string()));

    let scope = in_scope_namespaces(node);
    let mut root = convert_element(node, &scope, document_ns);
    // default namespace first, then prefixes alphabetically
    namespaces.sort();
    root.namespaces = namespaces;
    root
}

fn convert_element(
    node: roxmltree::Node,
    parent_scope: &[NamespaceDecl],
    document_ns: &str,
) -> Element {
    let scope = in_scope_namespaces(node);
    // default namespace first, then prefixes alphabetically
    let mut namespaces: Vec<NamespaceDecl> = scope
        .iter()
        .filter(|decl| !parent_scope.contains(decl))
        .filter(|(prefix, uri)| prefix.is_some() || uri != document_ns)
        .cloned()
        .collect();
    namespaces.sort();

    let attributes = node
        .attributes()
        .map(|a| {
            (
                prefixed_name(node, a.name(), a.namespace()),
                a.value().to_string(),
            )
        })
        .collect();

    let children = node
        .children()
        .filter_map(|child| {
            if child.is_element() {
                Some(XmlNode::Element(convert_element(child, &scope, document_ns)))
            } else if child.is_text() {
                child.text().map(|t| XmlNode::Text(t.to_string()))
            } else if child.is_comment() {
                child.text().map(|t| XmlNode::Comment(t.to_string()))
            } else {
                child.pi().map(|pi| XmlNode::ProcessingInstruction {
                    target: pi.target.to_string(),
                    value: pi.value.map(str::to_string),
                })
            }
        })
        .collect();

    Element {
        name: element_name(node, document_ns),
        namespaces,
        attributes,
        children,
    }
}

fn write_element<W: std::io::Write>(writer: &mut Writer<W>, element: &Element) -> DomainResult<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (prefix, uri) in &element.namespaces {
        let key = match prefix {
            Some(prefix) => format!("xmlns:{prefix}"),
            None => "xmlns".to_string(),
        };
        start.push_attribute((key.as_str(), uri.as_str()));
    }
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(serialize_err);
    }

    writer.write_event(Event::Start(start)).map_err(serialize_err)?;
    for child in &element.children {
        match child {
            XmlNode::Element(el) => write_element(writer, el)?,
            XmlNode::Text(text) => writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(serialize_err)?,
            XmlNode::Comment(text) => writer
                .write_event(Event::Comment(BytesText::from_escaped(text.as_str())))
                .map_err(serialize_err)?,
            XmlNode::ProcessingInstruction { target, value } => {
                let content = match value {
                    Some(value) => format!("{target} {value}"),
                    None => target.clone(),
                };
                writer
                    .write_event(Event::PI(BytesPI::new(content)))
                    .map_err(serialize_err)?
            }
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(serialize_err)
}
