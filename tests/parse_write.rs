use minixml::{Limit, ParserOptions, TypeFilter, WriteFormat, XmlError, XmlFile, TEXT_NODE_NAME};
use rstest::rstest;

fn parse(input: &str) -> XmlFile {
    let mut file = XmlFile::new();
    file.parse_str(input).unwrap();
    file
}

fn parse_with(input: &str, options: ParserOptions) -> Result<XmlFile, XmlError> {
    let mut file = XmlFile::with_options(options);
    file.parse_str(input)?;
    Ok(file)
}

fn write_minified(file: &XmlFile) -> String {
    let mut out = Vec::new();
    file.write(&mut out, WriteFormat::MINIFY).unwrap();
    String::from_utf8(out).unwrap()
}

fn nested(depth: usize) -> String {
    let open: String = (0..depth).map(|i| format!("<l{i}>")).collect();
    let close: String = (0..depth).rev().map(|i| format!("</l{i}>")).collect();
    open + &close
}

#[rstest]
#[case("a", "x", "1", "hello")]
#[case("item", "id", "42", "some words here")]
#[case("ns:node", "data-key_1", "v", "t")]
#[case("Upper", "A", "", "with\nnewline")]
fn test_single_element_round_trip(
    #[case] tag: &str,
    #[case] attr: &str,
    #[case] value: &str,
    #[case] text: &str,
) {
    let input = format!("<{tag} {attr}=\"{value}\">{text}</{tag}>");
    let first = parse(&input);
    let written = write_minified(&first);
    let second = parse(&written);

    for file in [&first, &second] {
        let node = file.root_by_name(tag).unwrap().unwrap();
        assert_eq!(node.name(), tag);
        assert_eq!(node.attributes().len(), 1);
        assert_eq!(node.attribute(attr), Some(value));
        assert_eq!(node.text(), text);
    }
    assert_eq!(written, input);
}

#[rstest]
#[case("&lt;&gt;&amp;&quot;&apos;", "<>&\"'")]
#[case("&gt&amp&apos&quot&lt;", "&gt&amp&apos&quot<")]
#[case("&gt;&amp&apos;&quot&lt;", ">&amp'&quot<")]
#[case("&amp;sequence&amp;", "&sequence&")]
#[case("a & b", "a & b")]
#[case("&unknown;", "&unknown;")]
fn test_attribute_references(#[case] raw: &str, #[case] expected: &str) {
    let file = parse(&format!("<a v='{raw}'/>"));
    let a = file.root_by_name("a").unwrap().unwrap();
    assert_eq!(a.attribute("v"), Some(expected));
}

#[rstest]
#[case("x &lt; y", "x < y")]
#[case("&gt&lt;", "&gt<")]
fn test_text_references(#[case] raw: &str, #[case] expected: &str) {
    let file = parse(&format!("<t>{raw}</t>"));
    assert_eq!(file.root_by_name("t").unwrap().unwrap().text(), expected);
}

#[rstest]
#[case(16, 16, true)]
#[case(16, 17, false)]
#[case(4, 4, true)]
#[case(4, 5, false)]
#[case(200, 64, true)]
#[case(200, 65, false)]
fn test_depth_limit(#[case] max_depth: u16, #[case] depth: usize, #[case] accepted: bool) {
    let options = ParserOptions::default().max_depth(max_depth);
    match parse_with(&nested(depth), options) {
        Ok(file) => {
            assert!(accepted);
            assert!(file.root_by_name("l0").unwrap().is_some());
        }
        Err(err) => {
            assert!(!accepted);
            assert!(matches!(
                err,
                XmlError::ResourceLimit {
                    limit: Limit::Depth(_),
                    ..
                }
            ));
            assert!(err.to_string().contains("maximum recursion depth exceeded"));
        }
    }
}

#[test]
fn test_depth_failure_leaves_no_partial_tree() {
    let mut file = XmlFile::new();
    assert!(file.parse_str(&nested(17)).is_err());
    let tree = file.tree().unwrap();
    assert_eq!(tree.len(), 1);
    assert!(tree.document_element().is_none());
}

#[rstest]
// root + 3 items
#[case("<r><i/><i/><i/></r>", 4, true)]
#[case("<r><i/><i/><i/></r>", 3, false)]
// text runs count too
#[case("<r>a<i/>b</r>", 4, true)]
#[case("<r>a<i/>b</r>", 3, false)]
// the prolog does not count
#[case("<?xml version='1.0'?><r/>", 1, true)]
fn test_tag_limit(#[case] input: &str, #[case] max_tags: u16, #[case] accepted: bool) {
    let options = ParserOptions::default().max_tags(max_tags);
    match parse_with(input, options) {
        Ok(file) => {
            assert!(accepted);
            assert_eq!(file.tag_count(), u32::from(max_tags));
        }
        Err(err) => {
            assert!(!accepted);
            assert!(matches!(
                err,
                XmlError::ResourceLimit {
                    limit: Limit::Tags(_),
                    ..
                }
            ));
        }
    }
}

#[test]
fn test_mismatched_tags_name_both() {
    let err = XmlFile::new().parse_str("<a>text</b>").unwrap_err();
    assert!(matches!(err, XmlError::Syntax { .. }));
    let message = err.to_string();
    assert!(message.contains("'a'"), "{message}");
    assert!(message.contains("'b'"), "{message}");
}

#[test]
fn test_duplicate_attribute_names_tag_and_attribute() {
    let err = XmlFile::new().parse_str("<a x=\"1\" x=\"2\">").unwrap_err();
    assert!(matches!(err, XmlError::Syntax { .. }));
    let message = err.to_string();
    assert!(message.contains("'a'"), "{message}");
    assert!(message.contains("'x'"), "{message}");
}

#[rstest]
#[case("<a #/>", "#x23")]
#[case("<a x='1/>", "unterminated string")]
#[case("<!-- open", "unterminated comment")]
fn test_lexical_errors(#[case] input: &str, #[case] fragment: &str) {
    let err = XmlFile::new().parse_str(input).unwrap_err();
    assert!(matches!(err, XmlError::Lexical { .. }));
    assert!(err.to_string().contains(fragment), "{err}");
}

#[test]
fn test_filter_prunes_unlisted_tags() {
    let filter = [TypeFilter::new("root", 0), TypeFilter::new("keep", 1)];
    let mut file = XmlFile::with_filter(&filter, ParserOptions::default());
    file.parse_str("<root><keep/><drop><keep/></drop></root>").unwrap();

    let root = file.root_by_name("root").unwrap().unwrap();
    assert_eq!(root.len(), 1);
    let keep = root.first_child().unwrap();
    assert_eq!(keep.name(), "keep");
    assert_eq!(keep.type_code(), 1);
    assert!(root.first_child_of("drop").is_none());
}

#[test]
fn test_filter_applies_to_document_element() {
    let filter = [TypeFilter::new("keep", 1)];
    let mut file = XmlFile::with_filter(&filter, ParserOptions::default());
    file.parse_str("<root><keep/><drop/></root>").unwrap();

    // `root` is not listed, so it is discarded along with its subtree
    let tree = file.tree().unwrap();
    assert!(tree.document_element().is_none());
    assert_eq!(tree.len(), 1);
}

#[test]
fn test_mixed_content_keeps_order() {
    let file = parse("<root><foo>A<b>B</b>C</foo></root>");
    let foo = file
        .root_by_name("root")
        .unwrap()
        .unwrap()
        .first_child_of("foo")
        .unwrap();

    let children: Vec<(&str, &str)> = foo.children().map(|c| (c.name(), c.text())).collect();
    assert_eq!(
        children,
        vec![(TEXT_NODE_NAME, "A"), ("b", "B"), (TEXT_NODE_NAME, "C")]
    );
    assert_eq!(foo.text(), "C");

    let b = foo.at(1).unwrap();
    assert_eq!(b.len(), 1);
    assert_eq!(b.first_child().unwrap().text(), "B");

    assert_eq!(
        write_minified(&file),
        "<root><foo>A<b>B</b>C</foo></root>"
    );
}

#[test]
fn test_detached_tree_outlives_parser() {
    let mut file = parse("<a><b k='v'/>text</a>");
    let tree = file.detach_root().unwrap();
    assert!(file.tree().is_err());
    drop(file);

    let a = tree.document_element().unwrap();
    assert_eq!(a.name(), "a");
    assert_eq!(a.first_child_of("b").unwrap().attribute("k"), Some("v"));
    assert_eq!(a.text(), "text");
}

#[test]
fn test_unescaped_output_does_not_reparse() {
    let file = parse("<t>a &lt; b</t>");
    let written = write_minified(&file);
    assert_eq!(written, "<t>a < b</t>");
    assert!(XmlFile::new().parse_str(&written).is_err());
}

#[test]
fn test_indented_output() {
    let file = parse("<r><a>t</a><b/></r>");
    let mut out = Vec::new();
    file.write(&mut out, WriteFormat::INDENT4).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "<r>\n    <a>t</a>\n    <b/>\n</r>\n"
    );
}

#[test]
fn test_indented_mixed_content_reparses() {
    let file = parse("<root><foo>A<b>B</b>C</foo></root>");
    let mut out = Vec::new();
    file.write(&mut out, WriteFormat::INDENT2).unwrap();
    let written = String::from_utf8(out).unwrap();
    assert_eq!(written, "<root>\n  <foo>A<b>B</b>C</foo>\n</root>\n");

    let again = parse(&written);
    let foo = again
        .root_by_name("root")
        .unwrap()
        .unwrap()
        .first_child_of("foo")
        .unwrap();
    let children: Vec<(&str, &str)> = foo.children().map(|c| (c.name(), c.text())).collect();
    assert_eq!(
        children,
        vec![(TEXT_NODE_NAME, "A"), ("b", "B"), (TEXT_NODE_NAME, "C")]
    );
}
