/**
 * Template Compiler Tests
 *
 * Reference tables and rewritten markup produced for representative
 * templates, plus the fatal error paths.
 */

#[path = "util/mod.rs"]
mod utils;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use poirot_compiler::dom::ArenaDocument;
    use poirot_compiler::logging::{LogLevel, MemoryLogger};
    use poirot_compiler::{
        BindingDescriptor, CompiledTemplate, Compiler, CompilerConfig, CompilerError, Reference,
        RenderKind,
    };

    use super::utils::{compile, json, load, render};

    fn bindings(compiled: &CompiledTemplate) -> Vec<&BindingDescriptor> {
        compiled.bindings().collect()
    }

    #[test]
    fn should_compile_end_to_end_example() {
        let compiled =
            compile("<div><p>{{ foo }} and <span class=\"{{baz}}\">{{bar}}</span></p></div>");
        assert_eq!(
            compiled.html(),
            "<div class=\"poirot-rendered\"><div><p><span data-poirot></span> and \
             <span class=\"\" data-poirot></span></p></div></div>"
        );
        assert_eq!(compiled.host_count(), 2);
        assert_eq!(
            compiled.references[0],
            vec![Reference::Binding(BindingDescriptor::new(RenderKind::Escaped, "foo"))]
        );
        assert_eq!(
            compiled.references[1],
            vec![
                Reference::Binding(
                    BindingDescriptor::new(RenderKind::Escaped, "baz").with_attribute("class")
                ),
                Reference::Binding(BindingDescriptor::new(RenderKind::Escaped, "bar")),
            ]
        );
    }

    #[test]
    fn should_drop_literal_text_around_attribute_directive() {
        let compiled = compile("<p class=\"btn {{c}} large\">x</p>");
        assert_eq!(
            compiled.html(),
            "<div class=\"poirot-rendered\"><p class=\"\" data-poirot>x</p></div>"
        );
        assert_eq!(
            compiled.references[0],
            vec![Reference::Binding(
                BindingDescriptor::new(RenderKind::Escaped, "c").with_attribute("class")
            )]
        );

        let mut doc = ArenaDocument::new();
        let (template, _) = load(&mut doc, "<p class=\"btn {{c}} large\">x</p>");
        assert_eq!(
            render(&mut doc, &template, &json(serde_json::json!({"c": "primary"}))),
            "<p class=\"primary\">x</p>"
        );
    }

    #[test]
    fn should_leave_directive_free_markup_untouched() {
        let compiled = compile("<p class=\"x\">plain <b>text</b></p>");
        assert_eq!(compiled.host_count(), 0);
        assert_eq!(
            compiled.html(),
            "<div class=\"poirot-rendered\"><p class=\"x\">plain <b>text</b></p></div>"
        );
    }

    #[test]
    fn should_nest_sub_templates() {
        let compiled = compile(
            "<table>{{#rows r}}<tr>{{#r.cells c}}<td>{{c.v}}</td>{{/r.cells}}</tr>{{/rows}}</table>",
        );
        assert_eq!(
            compiled.html(),
            "<div class=\"poirot-rendered\"><table data-poirot></table></div>"
        );
        let rows = compiled.sub_templates().next().unwrap();
        assert_eq!(rows.block_expr.as_deref(), Some("rows r"));
        assert_eq!(rows.html(), "<table><tr data-poirot></tr></table>");
        let cells = rows.sub_templates().next().unwrap();
        assert_eq!(cells.block_expr.as_deref(), Some("r.cells c"));
        assert_eq!(cells.html(), "<tr><td data-poirot></td></tr>");
        assert_eq!(bindings(cells)[0].key, "c.v");
    }

    #[test]
    fn should_number_hosts_in_document_order() {
        let compiled = compile("<a>{{one}}</a><b><i>{{two}}</i></b><u title=\"{{three}}\"></u>");
        let keys: Vec<_> = bindings(&compiled).iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, vec!["one", "two", "three"]);
    }

    #[test]
    fn should_record_fragment_block_names() {
        let compiled = compile("<section>{{> card item }}</section>");
        let binding = bindings(&compiled)[0];
        assert_eq!(binding.kind, RenderKind::Fragment);
        assert_eq!(binding.key, "item");
        assert_eq!(binding.block_name.as_deref(), Some("card"));
    }

    #[test]
    fn should_use_configured_wrapper_tag() {
        let compiler = Compiler::new(CompilerConfig::default().with_wrapper_tag("em"));
        let mut doc = ArenaDocument::new();
        let compiled = compiler.compile(&mut doc, "<p>a {{b}}</p>", "t").unwrap();
        assert!(compiled.html().contains("<p>a <em data-poirot></em></p>"));
    }

    #[test]
    fn should_compile_through_crate_entry_point() {
        let compiled = poirot_compiler::compile("<p>{{x}}</p>", "entry.html").unwrap();
        assert_eq!(compiled.host_count(), 1);
    }

    mod errors {
        use super::*;

        fn compile_err(source: &str) -> CompilerError {
            let mut doc = ArenaDocument::new();
            Compiler::default()
                .compile(&mut doc, source, "bad.html")
                .unwrap_err()
        }

        #[test]
        fn should_reject_block_tag_mismatch() {
            let err = compile_err("{{#a}}{{/b}}");
            let parse_error = err.as_parse_error().unwrap();
            assert!(parse_error.msg.starts_with("Block tag mismatch"));
        }

        #[test]
        fn should_reject_brace_mismatch_in_attributes() {
            let err = compile_err("<p title=\"{{{x}}\"></p>");
            assert!(err.as_parse_error().unwrap().msg.contains("brace mismatch"));
        }

        #[test]
        fn should_reject_brace_mismatch_in_text() {
            let err = compile_err("<p>a {{x}}} b</p>");
            assert!(matches!(err, CompilerError::Syntax(_)));
        }

        #[test]
        fn should_reject_malformed_fragments() {
            let err = compile_err("<p>{{> card}}</p>");
            assert!(err.to_string().contains("Malformed fragment directive"));
        }

        #[test]
        fn should_reject_missing_keys() {
            let err = compile_err("<p>{{!}}</p>");
            assert!(err.to_string().contains("Missing key"));
        }
    }

    #[test]
    fn should_trace_walk_when_verbose() {
        let logger = Arc::new(MemoryLogger::new(LogLevel::Debug));
        let compiler =
            Compiler::new(CompilerConfig::default().with_verbose(true)).with_logger(logger.clone());
        let mut doc = ArenaDocument::new();
        compiler
            .compile(&mut doc, "<ul>{{#xs x}}<li>{{x}}</li>{{/xs}}</ul>", "t")
            .unwrap();
        let lines = logger.lines_at(LogLevel::Debug);
        assert!(lines.iter().any(|l| l.starts_with("compile t")));
        assert!(lines.iter().any(|l| l.contains("promote block 'xs x'")));
        assert!(lines.iter().any(|l| l.contains("add sub-template <ul>")));
    }

    #[test]
    fn should_stay_silent_when_not_verbose() {
        let logger = Arc::new(MemoryLogger::new(LogLevel::Debug));
        let compiler = Compiler::default().with_logger(logger.clone());
        let mut doc = ArenaDocument::new();
        compiler.compile(&mut doc, "<p>{{a}}</p>", "t").unwrap();
        assert!(logger.lines().is_empty());
    }
}
