//! Erlang NIF entry points

use rustler::{Binary, Encoder, Env, NifResult, ResourceArc, Term};

use crate::dom::TypeFilter;
use crate::parser::{ParserOptions, XmlFile};
use crate::resource::{DocumentRef, DocumentResource};
use crate::strategy::parallel;
use crate::term::{self, error_to_term, node_to_term, str_to_binary};
use crate::writer::{write_document, WriteFormat};

fn parse_into_resource<'a>(
    env: Env<'a>,
    input: &[u8],
    filter: &[TypeFilter<'_>],
    options: ParserOptions,
) -> Term<'a> {
    match XmlFile::detach_read(input, filter, options) {
        Ok((tree, tag_count)) => {
            let arc = ResourceArc::new(DocumentResource::new(tree, tag_count));
            (term::ok(), arc).encode(env)
        }
        Err(err) => error_to_term(env, &err),
    }
}

/// Parse with default limits (returns {:ok, doc} or {:error, {kind, message}})
#[rustler::nif]
fn parse<'a>(env: Env<'a>, input: Binary<'a>) -> NifResult<Term<'a>> {
    Ok(parse_into_resource(
        env,
        input.as_slice(),
        &[],
        ParserOptions::default(),
    ))
}

/// Parse keeping only the tags listed in `filter` as `{name, type_code}` pairs
#[rustler::nif]
fn parse_filtered<'a>(
    env: Env<'a>,
    input: Binary<'a>,
    filter: Vec<(String, i64)>,
    max_tags: u16,
    max_depth: u16,
) -> NifResult<Term<'a>> {
    let entries: Vec<TypeFilter<'_>> = filter
        .iter()
        .map(|(name, code)| TypeFilter::new(name.as_str(), *code))
        .collect();
    Ok(parse_into_resource(
        env,
        input.as_slice(),
        &entries,
        ParserOptions::new(max_tags, max_depth),
    ))
}

/// Document element as a term, or nil
#[rustler::nif]
fn get_root<'a>(env: Env<'a>, doc_ref: DocumentRef) -> NifResult<Term<'a>> {
    let result = doc_ref.with_tree(|tree| match tree.document_element() {
        Some(node) => node_to_term(env, node),
        None => rustler::types::atom::nil().encode(env),
    });
    Ok(result.unwrap_or_else(|_| rustler::types::atom::nil().encode(env)))
}

/// Element and text nodes created while parsing the document
#[rustler::nif]
fn tag_count(doc_ref: DocumentRef) -> u32 {
    doc_ref.tag_count
}

/// Serialize the document element using `WriteFormat` bits
#[rustler::nif]
fn write<'a>(env: Env<'a>, doc_ref: DocumentRef, format: u8) -> NifResult<Term<'a>> {
    let format = [WriteFormat::MINIFY, WriteFormat::INDENT2, WriteFormat::INDENT4]
        .into_iter()
        .filter(|flag| format & flag.bits() != 0)
        .fold(WriteFormat::empty(), |acc, flag| acc | flag);

    let result = doc_ref.with_tree(|tree| {
        let mut out = Vec::new();
        write_document(tree, &mut out, format).map(|()| out)
    });

    match result {
        Ok(Ok(out)) => Ok((term::ok(), str_to_binary(env, &String::from_utf8_lossy(&out))).encode(env)),
        Ok(Err(err)) => Ok(error_to_term(env, &err)),
        Err(reason) => Ok((term::error(), reason).encode(env)),
    }
}

/// Parse many documents on the Rayon pool; returns a list of
/// `{:ok, element}` / `{:error, {kind, message}}` in input order
#[rustler::nif(schedule = "DirtyCpu")]
fn parse_batch<'a>(env: Env<'a>, inputs: Vec<Binary<'a>>) -> NifResult<Term<'a>> {
    let slices: Vec<&[u8]> = inputs.iter().map(|b| b.as_slice()).collect();
    let results = parallel::parse_batch(&slices, &[], ParserOptions::default());

    let mut list = Term::list_new_empty(env);
    for result in results.into_iter().rev() {
        let entry = match result {
            Ok((tree, _)) => match tree.document_element() {
                Some(node) => (term::ok(), node_to_term(env, node)).encode(env),
                None => (term::ok(), rustler::types::atom::nil()).encode(env),
            },
            Err(err) => error_to_term(env, &err),
        };
        list = list.list_prepend(entry);
    }
    Ok(list)
}

#[allow(non_local_definitions)]
fn load(env: Env, _info: Term) -> bool {
    let _ = rustler::resource!(DocumentResource, env);
    true
}

rustler::init!("Elixir.MiniXml.Native", load = load);
