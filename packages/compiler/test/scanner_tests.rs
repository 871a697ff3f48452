/**
 * Interpolation Scanner Tests
 *
 * Directive discovery, classification and brace validation.
 */

#[cfg(test)]
mod tests {
    use poirot_compiler::scanner::{trailing, InterpolationScanner};
    use poirot_compiler::RenderKind;

    fn scanner() -> InterpolationScanner {
        InterpolationScanner::new("scan.html")
    }

    #[test]
    fn should_report_preambles_between_matches() {
        let text = "Hi {{a}}, {{{ b }}}!";
        let matches = scanner().match_all(text).unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].preamble, "Hi ");
        assert_eq!(matches[0].content, "a");
        assert_eq!(matches[1].preamble, ", ");
        assert_eq!(matches[1].content, "b");
        assert!(matches[1].is_triple());
        assert_eq!(trailing(text, &matches), "!");
    }

    #[test]
    fn should_return_whole_text_as_trailing_without_matches() {
        let text = "no directives { here }";
        let matches = scanner().match_all(text).unwrap();
        assert!(matches.is_empty());
        assert_eq!(trailing(text, &matches), text);
    }

    #[test]
    fn should_classify_sigils() {
        let kinds: Vec<_> = ["{{a}}", "{{{a}}}", "{{! a}}", "{{% a}}", "{{> tpl a}}"]
            .iter()
            .map(|text| {
                let m = scanner().match_one(text).unwrap().unwrap();
                m.directive().unwrap().kind
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                RenderKind::Escaped,
                RenderKind::Literal,
                RenderKind::Function,
                RenderKind::Numeral,
                RenderKind::Fragment
            ]
        );
    }

    #[test]
    fn should_carry_fragment_block_name() {
        let m = scanner().match_one("{{> card item }}").unwrap().unwrap();
        let directive = m.directive().unwrap();
        assert_eq!(directive.key, "item");
        assert_eq!(directive.block_name.as_deref(), Some("card"));
    }

    #[test]
    fn should_reject_fragments_without_arguments() {
        let m = scanner().match_one("{{> card}}").unwrap().unwrap();
        let err = m.directive().unwrap_err();
        assert!(err.msg.starts_with("Malformed fragment directive"));
    }

    #[test]
    fn should_reject_brace_mismatch_with_position() {
        let err = scanner().match_all("ab {{x}}}").unwrap_err();
        assert!(err.msg.contains("mismatch around x"));
        assert_eq!(err.span.start.offset, 3);
        assert!(err.to_string().contains("scan.html@0:3"));
    }

    #[test]
    fn should_detect_whole_matches_only() {
        assert!(scanner().is_whole_match("{{ a.b }}").unwrap());
        assert!(!scanner().is_whole_match(" {{a}}").unwrap());
        assert!(!scanner().is_whole_match("{{a}}{{b}}").unwrap());
    }

    #[test]
    fn should_trim_directive_content() {
        let m = scanner().match_one("{{   user.name   }}").unwrap().unwrap();
        assert_eq!(m.content, "user.name");
        assert_eq!(m.whole_match, "{{   user.name   }}");
    }
}
