mod config;
mod error;
mod input;
mod test_runner;

use std::path::Path;
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::diagnostic::Diagnostic;
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};

use crate::config::{Config, RenderSettings};
use crate::error::CliError;
use crate::input::Output;

const SUBCOMMANDS: &[&str] = &["render", "check", "outline", "test", "help"];

#[derive(Parser)]
#[command(name = "folio", version, about = "Validate and render nested document sections")]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a document and print it as HTML
    Render(RenderArgs),

    /// Validate a document without rendering it
    Check(CheckArgs),

    /// Print the section titles of a document with their keys
    Outline(OutlineArgs),

    /// Run .test case files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct RenderArgs {
    /// JSON (.json) or Markdown (.md) document
    file: String,

    /// Render the root as the page's main section (container `main`, h1)
    #[arg(long)]
    main: bool,

    /// Container element for the root section
    #[arg(long = "as", value_name = "ELEMENT")]
    element: Option<String>,

    /// Heading depth of the root section
    #[arg(long)]
    level: Option<u32>,

    /// Style class for the root container
    #[arg(long = "class", value_name = "CLASS")]
    class_name: Option<String>,

    /// Report unknown fields as errors
    #[arg(long)]
    strict: bool,

    /// Print the node tree instead of HTML
    #[arg(long, conflicts_with = "markdown")]
    tree: bool,

    /// Print the validated document as Markdown instead of HTML
    #[arg(long)]
    markdown: bool,

    /// TOML config file (defaults to ./folio.toml when present)
    #[arg(long)]
    config: Option<String>,
}

#[derive(clap::Args)]
struct CheckArgs {
    /// JSON (.json) or Markdown (.md) document
    file: String,

    /// Report unknown fields as errors
    #[arg(long)]
    strict: bool,

    /// TOML config file (defaults to ./folio.toml when present)
    #[arg(long)]
    config: Option<String>,
}

#[derive(clap::Args)]
struct OutlineArgs {
    /// JSON (.json) or Markdown (.md) document
    file: String,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test file or directory containing them
    path: String,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    env_logger::init();

    // `folio doc.json` is shorthand for `folio render doc.json`.
    let mut args: Vec<String> = std::env::args().collect();
    if let Some(pos) = args.iter().skip(1).position(|a| !a.starts_with('-')) {
        let pos = pos + 1;
        if !SUBCOMMANDS.contains(&args[pos].as_str()) {
            args.insert(pos, "render".to_string());
        }
    }

    let cli = Cli::parse_from(&args);
    let color_choice = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };
    let mut files = SimpleFiles::new();

    let result = match cli.command {
        Command::Render(args) => do_render(args, &mut files, color_choice),
        Command::Check(args) => do_check(args, &mut files, color_choice),
        Command::Outline(args) => do_outline(args, &mut files, color_choice),
        Command::Test(args) => {
            let path = Path::new(&args.path);
            if args.list_categories {
                test_runner::list_categories(path);
                return;
            }
            process::exit(test_runner::run_tests(path, cli.no_color, &args.category));
        }
    };

    if let Err(error) = result {
        let writer = StandardStream::stderr(color_choice);
        emit(&writer, &files, &error.to_diagnostics());
        process::exit(1);
    }
}

fn do_render(
    args: RenderArgs,
    files: &mut SimpleFiles<String, String>,
    color: ColorChoice,
) -> Result<(), CliError> {
    let settings = Config::discover(args.config.as_deref())?.render.merge(
        args.element,
        args.level,
        args.class_name,
        args.strict,
        args.main,
    );
    let document = input::load(&args.file, files)?;
    emit_warnings(files, &document, color);
    let output = if args.tree {
        Output::Tree
    } else if args.markdown {
        Output::Markdown
    } else {
        Output::Html
    };
    let output = input::render(&document, &settings, output)?;
    print!("{}", output);
    Ok(())
}

fn do_check(
    args: CheckArgs,
    files: &mut SimpleFiles<String, String>,
    color: ColorChoice,
) -> Result<(), CliError> {
    let settings = Config::discover(args.config.as_deref())?.render;
    let settings = RenderSettings {
        strict: settings.strict || args.strict,
        ..settings
    };
    let document = input::load(&args.file, files)?;
    emit_warnings(files, &document, color);
    let count = input::check(&document, &settings)?;
    eprintln!("ok: {} ({} root section(s))", args.file, count);
    Ok(())
}

fn do_outline(
    args: OutlineArgs,
    files: &mut SimpleFiles<String, String>,
    color: ColorChoice,
) -> Result<(), CliError> {
    let document = input::load(&args.file, files)?;
    emit_warnings(files, &document, color);
    print!("{}", input::outline(&document)?);
    Ok(())
}

fn emit_warnings(
    files: &SimpleFiles<String, String>,
    document: &input::Document,
    color: ColorChoice,
) {
    if document.warnings.is_empty() {
        return;
    }
    let writer = StandardStream::stderr(color);
    let diagnostics: Vec<Diagnostic<usize>> =
        document.warnings.iter().map(|w| w.to_diagnostic()).collect();
    emit(&writer, files, &diagnostics);
}

fn emit(
    writer: &StandardStream,
    files: &SimpleFiles<String, String>,
    diagnostics: &[Diagnostic<usize>],
) {
    let config = term::Config::default();
    for diagnostic in diagnostics {
        if let Err(e) = term::emit_to_write_style(&mut writer.lock(), &config, files, diagnostic) {
            log::error!("cannot print diagnostic: {}", e);
        }
    }
}
