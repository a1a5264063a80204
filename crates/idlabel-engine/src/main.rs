//! `idlabel` command line: rewrite texts, validate and export alias files,
//! and run the engine over a sample console page.

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use idlabel_annotate::{strip_labels, Annotator};
use idlabel_core::{parse_import, ExportDocument, Identifier, Label, LabelMap, MemoryLabelStore};
use idlabel_dom::{ArenaDocument, DocumentTree, Location};
use idlabel_engine::{init_tracing, Controller, EngineConfig, HistoryEvents};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn cli() -> Command {
    Command::new("idlabel")
        .version(idlabel_engine::VERSION)
        .about("Label 12-digit account identifiers in live documents")
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .default_value("warn")
                .help("Tracing filter used when RUST_LOG is unset"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("rewrite")
                .about("Rewrite a text against an alias file")
                .arg(
                    Arg::new("aliases")
                        .long("aliases")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Export envelope or bare identifier -> label object"),
                )
                .arg(Arg::new("text").required(true).help("Text to rewrite")),
        )
        .subcommand(
            Command::new("strip")
                .about("Remove labels written for an alias file from a text")
                .arg(
                    Arg::new("aliases")
                        .long("aliases")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(Arg::new("text").required(true)),
        )
        .subcommand(
            Command::new("validate")
                .about("Validate an import payload")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Wrap an alias file in the export envelope")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("demo")
                .about("Run the engine over a built-in console page")
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("Engine config (TOML)"),
                )
                .arg(
                    Arg::new("aliases")
                        .long("aliases")
                        .value_parser(value_parser!(PathBuf))
                        .help("Alias file; a sample mapping is used otherwise"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the pass log as JSON"),
                ),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();

    let level = matches
        .get_one::<String>("log-level")
        .map_or("warn", String::as_str);
    init_tracing(level, matches.get_flag("log-json"))?;

    match matches.subcommand() {
        Some(("rewrite", args)) => rewrite(args),
        Some(("strip", args)) => strip(args),
        Some(("validate", args)) => validate(args),
        Some(("export", args)) => export(args),
        Some(("demo", args)) => demo(args).await,
        _ => unreachable!("subcommand is required"),
    }
}

fn path_arg<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a PathBuf> {
    args.get_one::<PathBuf>(name)
        .with_context(|| format!("missing --{name}"))
}

fn load_aliases(path: &Path) -> Result<LabelMap> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    parse_import(&text).with_context(|| format!("validating {}", path.display()))
}

fn rewrite(args: &ArgMatches) -> Result<()> {
    let mapping = load_aliases(path_arg(args, "aliases")?)?;
    let text = args
        .get_one::<String>("text")
        .context("missing text")?;
    let annotator = Annotator::new(EngineConfig::default().classifier()?);
    println!("{}", annotator.rewrite_text(text, &mapping));
    Ok(())
}

fn strip(args: &ArgMatches) -> Result<()> {
    let mapping = load_aliases(path_arg(args, "aliases")?)?;
    let text = args
        .get_one::<String>("text")
        .context("missing text")?;
    println!("{}", strip_labels(text, &mapping));
    Ok(())
}

fn validate(args: &ArgMatches) -> Result<()> {
    let path = path_arg(args, "file")?;
    match load_aliases(path) {
        Ok(mapping) => {
            println!("valid: {} entries", mapping.len());
            Ok(())
        }
        Err(error) => {
            eprintln!("invalid: {error:#}");
            std::process::exit(1);
        }
    }
}

fn export(args: &ArgMatches) -> Result<()> {
    let mapping = load_aliases(path_arg(args, "file")?)?;
    println!("{}", ExportDocument::new(mapping).to_json()?);
    Ok(())
}

async fn demo(args: &ArgMatches) -> Result<()> {
    let config = match args.get_one::<PathBuf>("config") {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let mapping = match args.get_one::<PathBuf>("aliases") {
        Some(path) => load_aliases(path)?,
        None => sample_mapping()?,
    };
    let settle = config.debounce() * 3;

    let document = Arc::new(Mutex::new(demo_document()?));
    let store = Arc::new(MemoryLabelStore::with_mapping(mapping));
    let (navigation, events) = HistoryEvents::channel();
    let mut controller = Controller::new(Arc::clone(&document), store, config)?
        .with_navigation_observer(Box::new(events));

    controller.start().await?;
    println!("== initial ==\n{}\n", render(&document));

    {
        let mut doc = document.lock();
        let root = doc.root();
        let footer = doc.append_element(root, "footer", &[("id", "content")])?;
        doc.append_text(footer, "Signed in as 2109-8765-4321")?;
    }
    tokio::time::sleep(settle).await;
    println!("== after mutation ==\n{}\n", render(&document));

    let away = Location::new("console.aws.amazon.com", "/ec2/home");
    document.lock().set_location(away.clone());
    navigation.navigated(away);
    tokio::time::sleep(settle).await;
    println!("== after navigation ==\n{}\n", render(&document));

    controller.stop().await;

    let records = controller.pass_log().records();
    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        for record in records {
            println!(
                "pass {} {:?}: rewritten={} cleared={} failed={}",
                record.sequence,
                record.triggers,
                record.report.rewritten,
                record.report.cleared,
                record.report.failed
            );
        }
    }
    Ok(())
}

fn render(document: &Mutex<ArenaDocument>) -> String {
    let doc = document.lock();
    format!("title: {}\n{}", doc.title(), doc.outer_html(doc.root()))
}

fn sample_mapping() -> Result<LabelMap> {
    Ok([
        (Identifier::parse("123456789012")?, Label::new("Prod")?),
        (Identifier::parse("210987654321")?, Label::new("Dev")?),
    ]
    .into_iter()
    .collect())
}

fn demo_document() -> Result<ArenaDocument> {
    let mut doc = ArenaDocument::new(Location::new("console.aws.amazon.com", "/console/home"))
        .with_title("Console Home | 123456789012");
    let root = doc.root();

    let header = doc.append_element(root, "header", &[])?;
    let button = doc.append_element(
        header,
        "button",
        &[("data-testid", "awsc-nav-account-menu-button")],
    )?;
    doc.append_text(button, "Admin @ 1234-5678-9012")?;

    let main = doc.append_element(root, "main", &[])?;
    let p = doc.append_element(main, "p", &[])?;
    doc.append_text(p, "Account: 1234-5678-9012")?;
    let pre = doc.append_element(main, "pre", &[])?;
    doc.append_text(pre, "{\"Account\": \"123456789012\"}")?;
    let arn = doc.append_element(main, "p", &[])?;
    doc.append_text(arn, "arn:aws:iam::123456789012:role/Admin")?;
    Ok(doc)
}
