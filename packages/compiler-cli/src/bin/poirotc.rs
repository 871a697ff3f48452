/**
 * Poirot Compiler CLI - poirotc
 *
 * Compiles template files into one JSON or JavaScript module artifact
 */
use clap::{Arg, ArgAction, Command};
use std::path::{Path, PathBuf};
use std::process;

use poirot_compiler_cli::config;
use poirot_compiler_cli::perform_compile::{
    exit_code_from_result, format_diagnostics, perform_compilation, CompileOptions, OutputFormat,
};

fn main() {
    let matches = Command::new("poirotc")
        .version(poirot_compiler_cli::version())
        .about("Poirot template compiler")
        .arg(
            Arg::new("inputs")
                .value_name("INPUT")
                .num_args(1..)
                .required(true)
                .help("Template files or glob patterns"),
        )
        .arg(
            Arg::new("outdir")
                .short('o')
                .long("outdir")
                .value_name("DIR")
                .default_value(".")
                .help("Directory receiving the artifact"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .value_parser(["json", "js"])
                .default_value("json")
                .help("Artifact encoding"),
        )
        .arg(
            Arg::new("out-file")
                .long("out-file")
                .value_name("FILE")
                .help("Artifact file name (default templates.json or templates.js)"),
        )
        .arg(
            Arg::new("keep-going")
                .long("keep-going")
                .action(ArgAction::SetTrue)
                .help("Keep compiling after a failure and write what succeeded"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .help("Compiler configuration file (default ./poirot.json when present)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Trace compilation steps"),
        )
        .get_matches();

    let explicit_config = matches.get_one::<String>("config").map(PathBuf::from);
    let compiler_config = match config::resolve(explicit_config.as_deref(), Path::new(".")) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {:#}", err);
            process::exit(2);
        }
    };

    let format = matches
        .get_one::<String>("format")
        .and_then(|f| OutputFormat::parse(f))
        .unwrap_or_default();

    let options = CompileOptions {
        inputs: matches
            .get_many::<String>("inputs")
            .map(|values| values.cloned().collect())
            .unwrap_or_default(),
        out_dir: matches
            .get_one::<String>("outdir")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".")),
        out_file: matches.get_one::<String>("out-file").cloned(),
        format,
        keep_going: matches.get_flag("keep-going"),
        verbose: matches.get_flag("verbose"),
        config: compiler_config,
    };

    let result = perform_compilation(&options);
    if !result.diagnostics.is_empty() {
        eprint!("{}", format_diagnostics(&result.diagnostics));
    }
    if let Some(path) = &result.output {
        println!("{} templates -> {}", result.templates.len(), path.display());
    }
    process::exit(exit_code_from_result(&result));
}
