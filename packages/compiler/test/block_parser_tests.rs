/**
 * Block Structure Parser Tests
 *
 * Nesting of fused block markers and malformed block structure.
 */

#[cfg(test)]
mod tests {
    use poirot_compiler::block_parser::{fuse_blocks, parse_markers, BlockParser, Fragment};
    use poirot_compiler::config::BLOCK_MARKER_ATTR;
    use poirot_compiler::dom::{ArenaDocument, Document, NodeId, NodeKind};
    use poirot_compiler::CompilerConfig;

    fn parser() -> BlockParser {
        BlockParser::new("blocks.html", &CompilerConfig::default())
    }

    /// `(identity, depth)` of every block in the fragment tree, pre-order.
    fn tree_markers(fragments: &[Fragment], depth: usize, out: &mut Vec<(String, usize)>) {
        for fragment in fragments {
            if let Fragment::Block(block) = fragment {
                out.push((block.identity(), depth));
                tree_markers(&block.fragments, depth + 1, out);
            }
        }
    }

    /// `(identity, depth)` of every marker element in the parsed markup.
    fn dom_markers(doc: &ArenaDocument, node: NodeId, depth: usize, out: &mut Vec<(String, usize)>) {
        for child in doc.children(node).unwrap() {
            if doc.kind(child).unwrap() != NodeKind::Element {
                continue;
            }
            match doc.attribute(child, BLOCK_MARKER_ATTR).unwrap() {
                Some(identity) => {
                    out.push((identity, depth));
                    dom_markers(doc, child, depth + 1, out);
                }
                None => dom_markers(doc, child, depth, out),
            }
        }
    }

    #[test]
    fn should_nest_markers_like_the_source() {
        let sources = [
            "{{#a}}x{{/a}}",
            "<ul>{{#a b}}<li>{{#c.d e}}<i>{{e}}</i>{{/c.d}}</li>{{/a}}</ul>",
            "{{#a}}{{#b}}{{#c}}{{/c}}{{/b}}{{#d x}}{{/d}}{{/a}}{{#e}}{{/e}}",
            "<p>no blocks</p>",
        ];
        for source in sources {
            let fragments = parser().split_blocks(source).unwrap();
            let mut expected = Vec::new();
            tree_markers(&fragments, 0, &mut expected);

            let fused = fuse_blocks(&fragments);
            let mut doc = ArenaDocument::new();
            let root = doc.parse_markup(&fused).unwrap();
            let mut actual = Vec::new();
            dom_markers(&doc, root, 0, &mut actual);

            assert_eq!(actual, expected, "source: {}", source);
            let identities: Vec<String> = expected.into_iter().map(|(id, _)| id).collect();
            assert_eq!(parse_markers(&fused), identities);
        }
    }

    #[test]
    fn should_keep_text_outside_blocks() {
        assert_eq!(
            parser().blockify("a {{x}} {{#list}}b{{/list}} c").unwrap(),
            "a {{x}} <div data-poirot-block=\"list\">b</div> c"
        );
    }

    #[test]
    fn should_report_tag_mismatch() {
        let err = parser().blockify("{{#a}}{{/b}}").unwrap_err();
        assert!(err.msg.contains("{{/a}}"));
        assert!(err.msg.contains("{{/b}}"));
        assert!(err.to_string().contains("blocks.html@0:6"));
        assert!(err.to_string().ends_with("block opened at blocks.html@0:0"));
    }

    #[test]
    fn should_report_unclosed_block_at_its_opening() {
        let err = parser().blockify("text\n{{#items i}}<li></li>").unwrap_err();
        assert!(err.msg.contains("missing closing tag"));
        assert_eq!(err.span.start.line, 1);
        assert_eq!(err.span.start.col, 0);
    }
}
