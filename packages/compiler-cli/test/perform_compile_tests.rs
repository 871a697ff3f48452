/**
 * Batch Compilation Tests
 *
 * Several template files compiled into one artifact, and how failures
 * affect what gets written.
 */

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use poirot_compiler_cli::compiler::output::json::bundle_from_json;
    use poirot_compiler_cli::perform_compile::{
        exit_code_from_result, format_diagnostics, perform_compilation, CompileOptions,
        OutputFormat,
    };

    fn write(dir: &Path, name: &str, source: &str) {
        fs::write(dir.join(name), source).unwrap();
    }

    fn options(dir: &Path, pattern: &str) -> CompileOptions {
        CompileOptions {
            inputs: vec![dir.join(pattern).to_string_lossy().to_string()],
            out_dir: dir.join("out"),
            ..CompileOptions::default()
        }
    }

    #[test]
    fn should_bundle_all_inputs_into_one_json_artifact() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "item.html", "<li class=\"{{cls}}\">{{name}}</li>");
        write(dir.path(), "list.html", "<ul>{{#items i}}<li>{{i.name}}</li>{{/items}}</ul>");

        let result = perform_compilation(&options(dir.path(), "*.html"));
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        assert_eq!(exit_code_from_result(&result), 0);

        let path = result.output.expect("artifact written");
        assert_eq!(path, dir.path().join("out").join("templates.json"));
        let bundle = bundle_from_json(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(bundle.keys().collect::<Vec<_>>(), vec!["item", "list"]);
        assert_eq!(&bundle["list"], &result.templates["list"]);
    }

    #[test]
    fn should_emit_javascript_module() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "hello.html", "<p>{{who}}</p>");
        let mut opts = options(dir.path(), "hello.html");
        opts.format = OutputFormat::Js;
        opts.out_file = Some("bundle.js".to_string());

        let result = perform_compilation(&opts);
        let path = result.output.expect("artifact written");
        assert_eq!(path.file_name().unwrap(), "bundle.js");
        let module = fs::read_to_string(path).unwrap();
        assert!(module.starts_with("\"use strict\";\n"));
        assert!(module.contains("\"hello\": new Template("));
    }

    #[test]
    fn should_write_nothing_when_an_input_fails() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "bad.html", "<p>{{x}}}</p>");
        write(dir.path(), "good.html", "<p>{{x}}</p>");

        let opts = options(dir.path(), "*.html");
        let result = perform_compilation(&opts);
        assert_eq!(exit_code_from_result(&result), 1);
        assert!(result.output.is_none());
        assert!(!opts.output_path().exists());

        let diag = &result.diagnostics[0];
        assert_eq!(diag.file.as_deref(), Some(dir.path().join("bad.html").as_path()));
        assert!(diag.message.starts_with("Failed to compile"));
        assert!(format_diagnostics(&result.diagnostics).starts_with("error: Failed to compile"));
    }

    #[test]
    fn should_keep_going_past_failures() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "bad.html", "<p>{{x}}}</p>");
        write(dir.path(), "good.html", "<p>{{x}}</p>");

        let mut opts = options(dir.path(), "*.html");
        opts.keep_going = true;
        let result = perform_compilation(&opts);

        assert_eq!(exit_code_from_result(&result), 1);
        assert_eq!(result.diagnostics.len(), 1);
        let bundle = bundle_from_json(&fs::read_to_string(opts.output_path()).unwrap()).unwrap();
        assert_eq!(bundle.keys().collect::<Vec<_>>(), vec!["good"]);
    }

    #[test]
    fn should_report_patterns_without_matches() {
        let dir = tempfile::tempdir().unwrap();
        let result = perform_compilation(&options(dir.path(), "*.html"));
        assert_eq!(exit_code_from_result(&result), 1);
        assert!(result.diagnostics[0].message.starts_with("No input matches"));
        assert!(result.output.is_none());
    }
}
