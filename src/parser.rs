//! Recursive-descent XML parser
//!
//! Grammar:
//! ```text
//! Document    := XmlRoot? ObjectList
//! XmlRoot     := '<' '?' 'xml' Attribute* '?' '>'
//! ObjectList  := Object+
//! Object      := StartTag (Object)* EndTag | TextRun
//! StartTag    := '<' Identifier Attribute* ('>' | '/' '>')
//! EndTag      := '<' '/' Identifier '>'
//! Attribute   := Identifier '=' String
//! ```
//!
//! Open elements live on a working stack. Closing one ("reduce") pops it and
//! attaches it to the new top, or releases it when a type filter is active
//! and does not list its name. Each text run sets the text of the open
//! element and is also kept as a `_text_node` child, so the order of mixed
//! content survives.

use std::io::{Read, Write};

use tracing::{debug, trace, warn};

use crate::core::{Lexer, Token, TokenKind};
use crate::dom::{NodeId, NodeRef, Tree, TypeFilter, TypeFilterMap, TEXT_NODE_NAME, XML_NODE_NAME};
use crate::error::{Limit, Result, XmlError};
use crate::reader;
use crate::writer::{self, WriteFormat, Writer};

/// Default ceiling on created element + text nodes
pub const DEFAULT_MAX_TAGS: u16 = 0x400;
/// Default ceiling on element nesting
pub const DEFAULT_MAX_DEPTH: u16 = 0x10;
/// Hard upper bound for the nesting ceiling
pub const MAX_PARSE_DEPTH: u16 = 0x40;

/// Parse limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    pub max_tags: u16,
    pub max_depth: u16,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TAGS, DEFAULT_MAX_DEPTH)
    }
}

impl ParserOptions {
    /// `max_depth` is clamped to `[0, 64]`
    pub const fn new(max_tags: u16, max_depth: u16) -> Self {
        ParserOptions {
            max_tags,
            max_depth: clamp_depth(max_depth),
        }
    }

    pub const fn max_tags(mut self, max_tags: u16) -> Self {
        self.max_tags = max_tags;
        self
    }

    pub const fn max_depth(mut self, max_depth: u16) -> Self {
        self.max_depth = clamp_depth(max_depth);
        self
    }
}

const fn clamp_depth(depth: u16) -> u16 {
    if depth > MAX_PARSE_DEPTH {
        MAX_PARSE_DEPTH
    } else {
        depth
    }
}

// ============================================================================
// XmlFile
// ============================================================================

/// Owns the configuration of a parse and the tree it produced.
///
/// ```
/// use minixml::XmlFile;
///
/// let mut file = XmlFile::new();
/// file.parse_str("<a x='1'>hello world</a>").unwrap();
/// let a = file.root_by_name("a").unwrap().unwrap();
/// assert_eq!(a.attribute("x"), Some("1"));
/// assert_eq!(a.text(), "hello world");
/// ```
#[derive(Debug)]
pub struct XmlFile {
    tree: Option<Tree>,
    filter: TypeFilterMap,
    options: ParserOptions,
    tag_count: u32,
}

impl Default for XmlFile {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlFile {
    pub fn new() -> Self {
        Self::with_options(ParserOptions::default())
    }

    pub fn with_options(options: ParserOptions) -> Self {
        XmlFile {
            tree: Some(Tree::new()),
            filter: TypeFilterMap::default(),
            options,
            tag_count: 0,
        }
    }

    /// Parser that keeps only the nodes named in `filter`, stamped with their codes
    pub fn with_filter(filter: &[TypeFilter<'_>], options: ParserOptions) -> Self {
        let mut file = Self::with_options(options);
        file.apply_filter(filter);
        file
    }

    pub fn apply_filter(&mut self, filter: &[TypeFilter<'_>]) {
        self.filter.extend(filter);
    }

    /// Element and text nodes created by the last parse
    #[inline]
    pub fn tag_count(&self) -> u32 {
        self.tag_count
    }

    /// Read the whole stream and parse it
    pub fn read<R: Read>(&mut self, input: R) -> Result<()> {
        let bytes = reader::read_all(input)?;
        self.parse_bytes(&bytes)
    }

    pub fn parse_str(&mut self, input: &str) -> Result<()> {
        self.parse_bytes(input.as_bytes())
    }

    /// Parse `input` into a fresh tree, replacing any previous one.
    ///
    /// On failure the tree is left holding only its root.
    pub fn parse_bytes(&mut self, input: &[u8]) -> Result<()> {
        let mut parser = Parser::new(reader::strip_bom(input), &self.filter, self.options);
        let result = parser.parse();
        let (tree, tag_count) = parser.finish();

        self.tree = Some(tree);
        self.tag_count = tag_count;
        result
    }

    /// The synthetic root's tree
    pub fn tree(&self) -> Result<&Tree> {
        self.tree
            .as_ref()
            .ok_or_else(|| XmlError::lookup("the tree has been detached"))
    }

    /// First top-level node named `name`
    pub fn root_by_name(&self, name: &str) -> Result<Option<NodeRef<'_>>> {
        Ok(self.tree()?.root().and_then(|r| r.first_child_of(name)))
    }

    /// First top-level node with type code `code`
    pub fn root_by_type(&self, code: i64) -> Result<Option<NodeRef<'_>>> {
        Ok(self.tree()?.root().and_then(|r| r.first_child_of_type(code)))
    }

    /// Take ownership of the parsed tree. Later calls to [`XmlFile::tree`] fail
    /// until the next parse.
    pub fn detach_root(&mut self) -> Option<Tree> {
        self.tree.take()
    }

    /// Serialize the first top-level node, without the xml header
    pub fn write<W: Write>(&self, out: W, format: WriteFormat) -> Result<()> {
        writer::write_document(self.tree()?, out, format)
    }

    /// Parse `input` and hand back only the tree and its tag count
    pub fn detach_read<R: Read>(
        input: R,
        filter: &[TypeFilter<'_>],
        options: ParserOptions,
    ) -> Result<(Tree, u32)> {
        let mut file = XmlFile::with_filter(filter, options);
        file.read(input)?;
        let tag_count = file.tag_count;
        let tree = file
            .detach_root()
            .ok_or_else(|| XmlError::lookup("the tree has been detached"))?;
        Ok((tree, tag_count))
    }

    /// Copy the subtree at `node` into a new tree by writing it out and
    /// parsing it again under `filter`.
    pub fn construct_clone(node: NodeRef<'_>, filter: &[TypeFilter<'_>]) -> Result<Tree> {
        let text = Writer::to_string(node, true, 4, 0);
        let options = ParserOptions::new(u16::MAX, MAX_PARSE_DEPTH);
        let (tree, _) = XmlFile::detach_read(text.as_bytes(), filter, options)?;
        Ok(tree)
    }
}

// ============================================================================
// Parser
// ============================================================================

struct Parser<'a, 'f> {
    lexer: Lexer<'a>,
    /// Lookahead buffer; `cursor` indexes the current token
    tokens: Vec<Token>,
    cursor: usize,
    tree: Tree,
    stack: Vec<NodeId>,
    filter: &'f TypeFilterMap,
    options: ParserOptions,
    tag_count: u32,
}

impl<'a, 'f> Parser<'a, 'f> {
    fn new(input: &'a [u8], filter: &'f TypeFilterMap, options: ParserOptions) -> Self {
        let tree = Tree::new();
        let root = tree.root_id();
        Parser {
            lexer: Lexer::new(input),
            tokens: Vec::new(),
            cursor: 0,
            tree,
            stack: vec![root],
            filter,
            options,
            tag_count: 0,
        }
    }

    fn finish(self) -> (Tree, u32) {
        (self.tree, self.tag_count)
    }

    fn parse(&mut self) -> Result<()> {
        match self.parse_document() {
            Ok(()) => {
                debug!(
                    tags = self.tag_count,
                    nodes = self.tree.len(),
                    "parse complete"
                );
                Ok(())
            }
            Err(err) => {
                let released = self.release_stack();
                debug!(error = %err, released, "parse failed");
                Err(err)
            }
        }
    }

    fn parse_document(&mut self) -> Result<()> {
        loop {
            if self.kind(0)? == TokenKind::Eof {
                return Ok(());
            }

            let before = self.cursor;
            self.rule_object_list()?;

            if self.cursor == before {
                warn!(cursor = self.cursor, "parser did not advance, skipping a token");
                self.advance(1);
            }
        }
    }

    // ------------------------------------------------------------------
    // Token buffer
    // ------------------------------------------------------------------

    fn token(&mut self, offset: usize) -> Result<Token> {
        let at = self.cursor + offset;
        while self.tokens.len() <= at {
            let token = self.lexer.next_token()?;
            self.tokens.push(token);
        }
        Ok(self.tokens[at])
    }

    #[inline]
    fn kind(&mut self, offset: usize) -> Result<TokenKind> {
        Ok(self.token(offset)?.kind)
    }

    #[inline]
    fn advance(&mut self, n: usize) {
        self.cursor += n;
    }

    fn lexeme(&self, token: Token) -> Result<String> {
        self.lexer.string(token.index).map(str::to_owned)
    }

    fn line(&self) -> u32 {
        self.tokens
            .get(self.cursor)
            .map_or_else(|| self.lexer.line(), |t| t.line)
    }

    fn syntax_error(&self, message: impl Into<String>) -> XmlError {
        XmlError::syntax(self.line(), message)
    }

    fn unexpected(&self, kind: TokenKind) -> XmlError {
        self.syntax_error(format!("unexpected token 0x{:02X}", kind.code()))
    }

    fn expect(&mut self, offset: usize, kind: TokenKind, message: &str) -> Result<Token> {
        let token = self.token(offset)?;
        if token.kind != kind {
            return Err(self.syntax_error(message));
        }
        Ok(token)
    }

    // ------------------------------------------------------------------
    // Working stack
    // ------------------------------------------------------------------

    fn top(&self) -> Result<NodeId> {
        self.stack
            .last()
            .copied()
            .ok_or_else(|| self.syntax_error("empty stack"))
    }

    fn create_tag(&mut self, name: &str) -> Result<NodeId> {
        self.tag_count += 1;
        if self.tag_count > u32::from(self.options.max_tags) {
            return Err(XmlError::ResourceLimit {
                line: self.line(),
                limit: Limit::Tags(self.options.max_tags),
            });
        }

        let id = self.tree.create_element(name);
        self.stack.push(id);
        Ok(id)
    }

    /// Pop the open node and attach it to its parent, subject to the filter
    fn reduce(&mut self) -> Result<()> {
        if self.stack.len() <= 1 {
            return Ok(());
        }
        let Some(child) = self.stack.pop() else {
            return Ok(());
        };
        let parent = self.top()?;

        if self.filter.is_empty() {
            return self.tree.add_child(parent, child);
        }

        let name = self.tree.require(child)?.name();
        match self.filter.lookup(name) {
            Some(code) => {
                self.tree.set_type_code(child, code)?;
                self.tree.add_child(parent, child)
            }
            None => {
                trace!(name, "filtered node discarded");
                self.tree.release(child).map(|_| ())
            }
        }
    }

    /// Pop and release the open node
    fn drop_top(&mut self) -> Result<()> {
        if self.stack.len() > 1 {
            if let Some(id) = self.stack.pop() {
                self.tree.release(id)?;
            }
        }
        Ok(())
    }

    /// Release everything but the root, leaving a root-only tree
    fn release_stack(&mut self) -> usize {
        let mut released = 0;
        while self.stack.len() > 1 {
            if let Some(id) = self.stack.pop() {
                released += self.tree.release(id).unwrap_or(0);
            }
        }
        released + self.tree.clear_children(self.tree.root_id()).unwrap_or(0)
    }

    // ------------------------------------------------------------------
    // Rules
    // ------------------------------------------------------------------

    fn rule_object_list(&mut self) -> Result<()> {
        let t0 = self.kind(0)?;
        let t1 = self.kind(1)?;

        match (t0, t1) {
            (TokenKind::TagOpen, TokenKind::Question) => {
                if self.cursor != 0 {
                    return Err(self.syntax_error(
                        "the xml declaration is only allowed at the start of the document",
                    ));
                }
                self.rule_xml_root()
            }
            (TokenKind::TagOpen, TokenKind::Identifier) => self.rule_object(1),
            (TokenKind::TagOpen, TokenKind::Slash) => self.rule_end_tag(),
            (TokenKind::Text, _) => self.rule_content(),
            (other, _) => Err(self.syntax_error(format!(
                "unknown token parsed 0x{:02X}",
                other.code()
            ))),
        }
    }

    /// `<?xml ...?>`: attributes are checked, then the whole construct is dropped
    fn rule_xml_root(&mut self) -> Result<()> {
        self.expect(0, TokenKind::TagOpen, "expected the '<' character")?;
        self.expect(1, TokenKind::Question, "expected the '?' character")?;
        self.expect(2, TokenKind::KwXml, "expected the xml keyword")?;
        self.advance(3);

        let placeholder = self.tree.create_element(XML_NODE_NAME);
        self.stack.push(placeholder);

        loop {
            match self.kind(0)? {
                TokenKind::Question => break,
                TokenKind::Eof => return Err(self.syntax_error("unexpected end of file")),
                _ => self.rule_attribute()?,
            }
        }
        self.advance(1);

        let t0 = self.kind(0)?;
        if t0 != TokenKind::TagClose {
            return Err(self.unexpected(t0));
        }
        self.advance(1);
        self.drop_top()
    }

    /// One element and its content; `depth` is its nesting level
    fn rule_object(&mut self, depth: u16) -> Result<()> {
        if depth > self.options.max_depth {
            return Err(XmlError::ResourceLimit {
                line: self.line(),
                limit: Limit::Depth(self.options.max_depth),
            });
        }

        if self.rule_start_tag()? {
            return Ok(());
        }

        loop {
            let t0 = self.kind(0)?;
            let t1 = self.kind(1)?;

            match (t0, t1) {
                (TokenKind::TagOpen, TokenKind::Slash) => return self.rule_end_tag(),
                (TokenKind::TagOpen, TokenKind::Identifier) => self.rule_object(depth + 1)?,
                (TokenKind::Text, _) => self.rule_content()?,
                (TokenKind::Eof, _) => {
                    let open = self.tree.require(self.top()?)?.name().to_owned();
                    return Err(self.syntax_error(format!(
                        "unexpected end of file, '{open}' is not closed"
                    )));
                }
                (TokenKind::TagOpen, other) => return Err(self.unexpected(other)),
                (other, _) => return Err(self.unexpected(other)),
            }
        }
    }

    /// Returns `true` when the tag closed itself with `/>`
    fn rule_start_tag(&mut self) -> Result<bool> {
        self.expect(0, TokenKind::TagOpen, "expected the '<' character")?;
        let ident = self.expect(1, TokenKind::Identifier, "expected a tag identifier")?;

        let name = self.lexeme(ident)?;
        if name.is_empty() {
            return Err(self.syntax_error("empty tag name"));
        }
        self.advance(2);

        self.create_tag(&name)?;
        self.rule_attribute_list()?;

        match self.kind(0)? {
            TokenKind::Slash => {
                self.expect(1, TokenKind::TagClose, "expected the '>' character")?;
                self.advance(2);
                self.reduce()?;
                Ok(true)
            }
            TokenKind::TagClose => {
                self.advance(1);
                Ok(false)
            }
            _ => Err(self.syntax_error("expected the '>' character")),
        }
    }

    fn rule_attribute_list(&mut self) -> Result<()> {
        loop {
            match self.kind(0)? {
                TokenKind::TagClose | TokenKind::Slash => return Ok(()),
                TokenKind::Eof => return Err(self.syntax_error("unexpected end of file")),
                _ => self.rule_attribute()?,
            }
        }
    }

    fn rule_attribute(&mut self) -> Result<()> {
        let key = self.expect(0, TokenKind::Identifier, "expected an identifier")?;
        self.expect(1, TokenKind::Equals, "expected an equals sign")?;
        let value = self.expect(2, TokenKind::String, "expected a quoted string")?;

        let key = self.lexeme(key)?;
        if key.is_empty() {
            return Err(self.syntax_error("empty attribute name"));
        }
        let value = self.lexeme(value)?;

        let top = self.top()?;
        if !self.tree.insert_attribute(top, key.as_str(), value)? {
            let tag = self.tree.require(top)?.name().to_owned();
            return Err(self.syntax_error(format!(
                "'{tag}' duplicate attribute '{key}'"
            )));
        }
        self.advance(3);
        Ok(())
    }

    fn rule_content(&mut self) -> Result<()> {
        let token = self.expect(0, TokenKind::Text, "expected content text")?;
        let content = self.lexeme(token)?;
        if content.is_empty() {
            return Err(self.syntax_error("unexpected empty content token"));
        }

        let top = self.top()?;
        self.tree.set_text(top, content.as_str())?;

        let node = self.create_tag(TEXT_NODE_NAME)?;
        self.tree.set_text(node, content)?;
        self.reduce()?;

        self.advance(1);
        Ok(())
    }

    fn rule_end_tag(&mut self) -> Result<()> {
        self.expect(0, TokenKind::TagOpen, "expected the '<' character")?;
        self.expect(1, TokenKind::Slash, "expected the '/' character")?;
        let ident = self.expect(2, TokenKind::Identifier, "expected a tag identifier")?;
        self.expect(3, TokenKind::TagClose, "expected the '>' character")?;

        let name = self.lexeme(ident)?;
        if name.is_empty() {
            return Err(self.syntax_error("empty closing tag"));
        }

        let open = self.tree.require(self.top()?)?.name().to_owned();
        if name != open {
            return Err(self.syntax_error(format!(
                "closing tag mismatch between '{open}' and '{name}'"
            )));
        }

        self.advance(4);
        self.reduce()
    }
}
