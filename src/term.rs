//! Elixir Term Conversion Utilities
//!
//! Elements become `{:element, name, type_code, attrs, text, children}`,
//! text nodes become plain binaries, errors become `{:error, {kind, message}}`.

use rustler::{Encoder, Env, NewBinary, Term};

use crate::dom::NodeRef;
use crate::error::XmlError;

rustler::atoms! {
    ok,
    error,
    element,
    lexical,
    syntax,
    resource_limit,
    lookup,
    io,
}

/// Convert a node and its subtree to an Elixir term
pub fn node_to_term<'a>(env: Env<'a>, node: NodeRef<'_>) -> Term<'a> {
    if node.is_text_node() {
        return str_to_binary(env, node.text());
    }

    let mut attrs = Term::list_new_empty(env);
    for (name, value) in node.attributes() {
        let tuple = (str_to_binary(env, name), str_to_binary(env, value));
        attrs = attrs.list_prepend(tuple.encode(env));
    }

    let children: Vec<NodeRef<'_>> = node.children().collect();
    let mut list = Term::list_new_empty(env);
    for child in children.into_iter().rev() {
        list = list.list_prepend(node_to_term(env, child));
    }

    (
        element(),
        str_to_binary(env, node.name()),
        node.type_code(),
        attrs,
        str_to_binary(env, node.text()),
        list,
    )
        .encode(env)
}

/// `{:error, {kind, message}}`
pub fn error_to_term<'a>(env: Env<'a>, err: &XmlError) -> Term<'a> {
    let kind = match err {
        XmlError::Lexical { .. } => lexical(),
        XmlError::Syntax { .. } => syntax(),
        XmlError::ResourceLimit { .. } => resource_limit(),
        XmlError::Lookup(_) => lookup(),
        XmlError::Io(_) => io(),
    };
    let message = str_to_binary(env, &err.to_string());
    (error(), (kind, message)).encode(env)
}

/// Convert a string to a binary term (more efficient than .encode())
#[inline]
pub fn str_to_binary<'a>(env: Env<'a>, s: &str) -> Term<'a> {
    let bytes = s.as_bytes();
    let mut binary = NewBinary::new(env, bytes.len());
    binary.as_mut_slice().copy_from_slice(bytes);
    binary.into()
}
