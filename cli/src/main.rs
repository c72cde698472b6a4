use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use log::LevelFilter;

use gallery::parser::ParseError;
use notebook::{ConvertError, GalleryConfig};

#[derive(Parser)]
#[command(
    name = "convert-to-notebook",
    version,
    about = "Convert a Python example script to a Jupyter notebook"
)]
struct Cli {
    /// Path to the Python script
    #[arg(long)]
    input: PathBuf,

    /// Path to the output notebook
    #[arg(long)]
    output: PathBuf,
}

fn main() {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Warn)
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    let config = GalleryConfig::default();

    match notebook::convert(&cli.input, &cli.output, &config) {
        Ok(()) => println!("Notebook saved to: {}", cli.output.display()),
        Err(ConvertError::Parse { path, text, errors }) => {
            emit_parse_errors(&path.display().to_string(), text, &errors);
            process::exit(1);
        }
        Err(error) => {
            eprintln!("error: {}", error);
            process::exit(1);
        }
    }
}

fn emit_parse_errors(name: &str, text: String, errors: &[ParseError]) {
    let mut files = SimpleFiles::new();
    let file_id = files.add(name.to_string(), text);

    let color_choice = if std::io::stderr().is_terminal() {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();
    for error in errors {
        let mut diagnostic = error.to_diagnostic();
        for label in &mut diagnostic.labels {
            label.file_id = file_id;
        }
        let _ = term::emit_to_write_style(&mut writer.lock(), &config, &files, &diagnostic);
    }
}
