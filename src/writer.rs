//! XML Writer
//!
//! Renders a subtree back to markup. Values are written verbatim: nothing is
//! re-escaped, so text or attributes holding `<`, `&` or `"` produce markup
//! that will not parse back to the same tree.
//!
//! Indented output never pads inside an element holding `_text_node`
//! children; that element's content is written flat so its text runs keep
//! their exact bytes.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::ops::{BitOr, BitOrAssign};
use std::path::Path;

use tracing::trace;

use crate::dom::{NodeRef, Tree};
use crate::error::Result;

/// Default indentation step
const INDENT: usize = 2;
const MAX_INDENT: usize = 16;
const MAX_INDENT_OFFSET: usize = 80;

const XML_HEADER: &str = "<?xml version=\"1.0\"?>\n";

/// Layout flags for [`crate::XmlFile::write`] and [`Writer::apply_format`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteFormat(u8);

impl WriteFormat {
    pub const MINIFY: WriteFormat = WriteFormat(0x01);
    pub const INDENT2: WriteFormat = WriteFormat(0x02);
    pub const INDENT4: WriteFormat = WriteFormat(0x04);

    #[inline]
    pub const fn empty() -> Self {
        WriteFormat(0)
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn contains(self, other: WriteFormat) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for WriteFormat {
    type Output = WriteFormat;

    fn bitor(self, rhs: Self) -> Self::Output {
        WriteFormat(self.0 | rhs.0)
    }
}

impl BitOrAssign for WriteFormat {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Serializer for the subtree rooted at one node
#[derive(Debug, Clone)]
pub struct Writer<'a> {
    root: NodeRef<'a>,
    indent_by: usize,
    indent_offset: usize,
    show_header: bool,
    minify: bool,
}

/// Serialization step: open a node, or close one whose children are written.
/// The flag marks nodes nested inside mixed content, which are never padded.
enum Step<'a> {
    Enter(NodeRef<'a>, bool),
    Exit(NodeRef<'a>, bool),
}

impl<'a> Writer<'a> {
    /// Minified output with the xml header
    pub fn new(root: NodeRef<'a>) -> Self {
        Writer {
            root,
            indent_by: INDENT,
            indent_offset: 0,
            show_header: true,
            minify: true,
        }
    }

    /// Indentation step, capped at 16. Zero means minified output whatever
    /// [`Writer::set_minify`] says.
    pub fn set_indent(&mut self, indent: usize) -> &mut Self {
        self.indent_by = indent.min(MAX_INDENT);
        self
    }

    /// Base indentation of the root, clamped to `0..=80`
    pub fn set_indent_offset(&mut self, offset: usize) -> &mut Self {
        self.indent_offset = offset.min(MAX_INDENT_OFFSET);
        self
    }

    pub fn set_show_xml_header(&mut self, show: bool) -> &mut Self {
        self.show_header = show;
        self
    }

    pub fn set_minify(&mut self, minify: bool) -> &mut Self {
        self.minify = minify;
        self
    }

    pub fn apply_format(&mut self, format: WriteFormat) -> &mut Self {
        self.set_minify(format.contains(WriteFormat::MINIFY));
        if format.contains(WriteFormat::INDENT2) {
            self.set_indent(2)
        } else if format.contains(WriteFormat::INDENT4) {
            self.set_indent(4)
        } else {
            self.set_indent(0)
        }
    }

    pub fn write<W: Write>(&self, mut out: W) -> Result<()> {
        let text = self.render();
        out.write_all(text.as_bytes())?;
        out.flush()?;
        Ok(())
    }

    pub fn write_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        self.write(BufWriter::new(file))
    }

    pub fn into_string(self) -> String {
        self.render()
    }

    /// Render `root` without the xml header
    pub fn to_string(root: NodeRef<'_>, minify: bool, indent: usize, offset: usize) -> String {
        Self::configured(root, minify, indent, offset).render()
    }

    /// Write `root` to `out` without the xml header
    pub fn to_stream<W: Write>(
        out: W,
        root: NodeRef<'_>,
        minify: bool,
        indent: usize,
        offset: usize,
    ) -> Result<()> {
        Self::configured(root, minify, indent, offset).write(out)
    }

    fn configured(root: NodeRef<'_>, minify: bool, indent: usize, offset: usize) -> Writer<'_> {
        let mut writer = Writer::new(root);
        writer
            .set_minify(minify)
            .set_indent(indent)
            .set_indent_offset(offset)
            .set_show_xml_header(false);
        writer
    }

    fn render(&self) -> String {
        let mut out = String::new();
        if self.show_header {
            out.push_str(XML_HEADER);
        }

        let minify = self.minify || self.indent_by == 0;
        let step = self.indent_by as isize;
        let mut indent = self.indent_offset as isize - step;
        let mut stack = vec![Step::Enter(self.root, false)];

        while let Some(entry) = stack.pop() {
            match entry {
                Step::Enter(node, _) if node.is_text_node() => out.push_str(node.text()),
                Step::Enter(node, inline) => {
                    let flat = minify || inline;
                    indent += step;
                    if !node.has_children() && !node.has_text() {
                        self.inline_tag(&mut out, node, indent, flat);
                        indent -= step;
                        continue;
                    }

                    // Text runs kept as children carry the text in document order
                    let mixed = is_mixed(node);
                    self.open_tag(&mut out, node, indent, flat, flat || mixed || node.has_text());
                    if !mixed {
                        out.push_str(node.text());
                    }
                    stack.push(Step::Exit(node, inline));
                    let children: Vec<NodeRef<'a>> = node.children().collect();
                    stack.extend(
                        children
                            .into_iter()
                            .rev()
                            .map(|child| Step::Enter(child, inline || mixed)),
                    );
                }
                Step::Exit(node, inline) => {
                    let flat = minify || inline;
                    let tight = flat || is_mixed(node) || node.has_text();
                    self.close_tag(&mut out, node, indent, flat, tight);
                    indent -= step;
                }
            }
        }

        trace!(bytes = out.len(), "xml written");
        out
    }

    fn pad(out: &mut String, indent: isize) {
        if indent > 0 {
            out.extend(std::iter::repeat_n(' ', indent as usize));
        }
    }

    /// `tight` keeps the content on the same line as the tag
    fn open_tag(&self, out: &mut String, node: NodeRef<'_>, indent: isize, flat: bool, tight: bool) {
        if !flat {
            Self::pad(out, indent);
        }
        out.push('<');
        out.push_str(node.name());
        Self::write_attributes(out, node);
        out.push('>');
        if !tight {
            out.push('\n');
        }
    }

    fn close_tag(&self, out: &mut String, node: NodeRef<'_>, indent: isize, flat: bool, tight: bool) {
        if !tight {
            Self::pad(out, indent);
        }
        out.push_str("</");
        out.push_str(node.name());
        out.push('>');
        if !flat {
            out.push('\n');
        }
    }

    fn inline_tag(&self, out: &mut String, node: NodeRef<'_>, indent: isize, flat: bool) {
        if !flat {
            Self::pad(out, indent);
        }
        out.push('<');
        out.push_str(node.name());
        Self::write_attributes(out, node);
        out.push_str("/>");
        if !flat {
            out.push('\n');
        }
    }

    fn write_attributes(out: &mut String, node: NodeRef<'_>) {
        for (key, value) in node.attributes() {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(value);
            out.push('"');
        }
    }
}

fn is_mixed(node: NodeRef<'_>) -> bool {
    node.children().any(|c| c.is_text_node())
}

/// Write the first top-level node of `tree` without the xml header.
/// A tree with no top-level node writes nothing.
pub fn write_document<W: Write>(tree: &Tree, out: W, format: WriteFormat) -> Result<()> {
    let Some(element) = tree.document_element() else {
        return Ok(());
    };
    let mut writer = Writer::new(element);
    writer.apply_format(format).set_show_xml_header(false);
    writer.write(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::NodeId;

    /// root -> (a[x=1] -> b("text")), c
    fn sample() -> (Tree, NodeId) {
        let mut tree = Tree::new();
        let root = tree.create_element("root");
        let a = tree.create_element("a");
        let b = tree.create_element("b");
        let c = tree.create_element("c");
        tree.add_child(tree.root_id(), root).unwrap();
        tree.add_child(root, a).unwrap();
        tree.add_child(a, b).unwrap();
        tree.add_child(root, c).unwrap();
        tree.insert_attribute(a, "x", "1").unwrap();
        tree.set_text(b, "text").unwrap();
        (tree, root)
    }

    #[test]
    fn test_format_flags() {
        let format = WriteFormat::MINIFY | WriteFormat::INDENT4;
        assert!(format.contains(WriteFormat::MINIFY));
        assert!(format.contains(WriteFormat::INDENT4));
        assert!(!format.contains(WriteFormat::INDENT2));
        assert_eq!(format.bits(), 0x05);
        assert_eq!(WriteFormat::empty().bits(), 0);
    }

    #[test]
    fn test_minified() {
        let (tree, root) = sample();
        let text = Writer::to_string(tree.node(root).unwrap(), true, 4, 0);
        assert_eq!(text, "<root><a x=\"1\"><b>text</b></a><c/></root>");
    }

    #[test]
    fn test_header() {
        let (tree, root) = sample();
        let text = Writer::new(tree.node(root).unwrap()).into_string();
        assert!(text.starts_with("<?xml version=\"1.0\"?>\n<root>"));
    }

    #[test]
    fn test_indented() {
        let (tree, root) = sample();
        let text = Writer::to_string(tree.node(root).unwrap(), false, 2, 0);
        let expected = "<root>\n  <a x=\"1\">\n    <b>text</b>\n  </a>\n  <c/>\n</root>\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_indent_offset() {
        let (tree, root) = sample();
        let c = tree.node(root).unwrap().first_child_of("c").unwrap();
        assert_eq!(Writer::to_string(c, false, 4, 3), "   <c/>\n");
        assert_eq!(Writer::to_string(c, false, 4, 500), format!("{}<c/>\n", " ".repeat(80)));
    }

    #[test]
    fn test_indent_clamp() {
        let (tree, root) = sample();
        let a = tree.node(root).unwrap().first_child_of("a").unwrap();
        let text = Writer::to_string(a, false, 40, 0);
        assert!(text.contains(&format!("\n{}<b>", " ".repeat(16))));
    }

    #[test]
    fn test_text_nodes_as_character_data() {
        let mut tree = Tree::new();
        let foo = tree.create_element("foo");
        tree.add_child(tree.root_id(), foo).unwrap();
        let a = tree.create_text_node("A");
        let b = tree.create_element("b");
        let c = tree.create_text_node("C");
        for id in [a, b, c] {
            tree.add_child(foo, id).unwrap();
        }
        tree.set_text(foo, "C").unwrap();
        tree.set_text(b, "B").unwrap();

        let mut out = Vec::new();
        write_document(&tree, &mut out, WriteFormat::MINIFY).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "<foo>A<b>B</b>C</foo>");
    }

    #[test]
    fn test_values_are_not_escaped() {
        let mut tree = Tree::new();
        let a = tree.create_element("a");
        tree.add_child(tree.root_id(), a).unwrap();
        tree.set_text(a, "1 < 2 & 3").unwrap();
        let text = Writer::to_string(tree.node(a).unwrap(), true, 0, 0);
        assert_eq!(text, "<a>1 < 2 & 3</a>");
    }

    #[test]
    fn test_write_to_path() {
        let (tree, root) = sample();
        let path = std::env::temp_dir().join(format!("minixml-writer-{}.xml", std::process::id()));
        let mut writer = Writer::new(tree.node(root).unwrap());
        writer.set_show_xml_header(false);
        writer.write_to_path(&path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(written, "<root><a x=\"1\"><b>text</b></a><c/></root>");
    }

    #[test]
    fn test_zero_indent_minifies() {
        let (tree, root) = sample();
        let node = tree.node(root).unwrap();
        let expected = "<root><a x=\"1\"><b>text</b></a><c/></root>";
        assert_eq!(Writer::to_string(node, false, 0, 0), expected);

        let mut out = Vec::new();
        Writer::to_stream(&mut out, node, false, 0, 3).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), expected);

        let mut writer = Writer::new(node);
        writer.set_indent(0).set_minify(false).set_show_xml_header(false);
        assert_eq!(writer.into_string(), expected);
    }

    #[test]
    fn test_mixed_content_is_not_padded() {
        let mut tree = Tree::new();
        let root = tree.create_element("root");
        let foo = tree.create_element("foo");
        tree.add_child(tree.root_id(), root).unwrap();
        tree.add_child(root, foo).unwrap();
        let a = tree.create_text_node("A");
        let b = tree.create_element("b");
        let c = tree.create_text_node("C");
        let d = tree.create_element("d");
        for id in [a, b, c, d] {
            tree.add_child(foo, id).unwrap();
        }
        tree.set_text(foo, "C").unwrap();
        tree.set_text(b, "B").unwrap();

        let mut out = Vec::new();
        write_document(&tree, &mut out, WriteFormat::INDENT2).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "<root>\n  <foo>A<b>B</b>C<d/></foo>\n</root>\n"
        );
    }

    #[test]
    fn test_empty_tree_writes_nothing() {
        let tree = Tree::new();
        let mut out = Vec::new();
        write_document(&tree, &mut out, WriteFormat::INDENT2).unwrap();
        assert!(out.is_empty());
    }
}
