//! Storyline outline viewer.
//!
//! # Responsibility
//! - Open (or create) a project database and print its outline in visiting
//!   order.
//! - Keep output deterministic for quick local sanity checks.

use clap::Parser;
use log::warn;
use std::path::PathBuf;
use std::process::ExitCode;
use storyline_core::{
    init_from_config, load_config, open_db, open_db_in_memory, save_config, ItemLevel,
    ProjectService, ProjectTree, SqliteProjectRepository,
};

/// Print the outline of a Storyline project.
#[derive(Debug, Parser)]
#[command(name = "storyline_cli", version)]
struct Cli {
    /// JSON config file with logging settings and recent projects.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Project database; a fresh in-memory project is used when omitted.
    #[arg(value_name = "PROJECT")]
    project: Option<PathBuf>,
}

fn run(args: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => Default::default(),
    };
    if let Err(err) = init_from_config(&config) {
        eprintln!("logging disabled: {err}");
    }

    let conn = match &args.project {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    let service = ProjectService::new(SqliteProjectRepository::try_new(&conn)?);

    let mut opened = service.open()?;
    if opened.summary.restored == 0 {
        opened = service.create("Untitled", "")?;
    }

    println!(
        "project={} title={:?} draft={}",
        opened.meta.project_id, opened.meta.title, opened.meta.draft
    );
    println!(
        "entries={} repairs={} orphans={}",
        opened.tree.len(),
        opened.summary.repairs,
        opened.summary.orphans
    );
    print_outline(&opened.tree);
    service.save(&mut opened.tree, &opened.meta)?;

    if let (Some(config_path), Some(project)) = (&args.config, &args.project) {
        config.remember_project(project.clone());
        if let Err(err) = save_config(config_path, &config) {
            warn!("event=config_save module=cli status=error error={err}");
        }
    }
    Ok(())
}

fn print_outline(tree: &ProjectTree) {
    for handle in tree.global_order() {
        let Ok(entry) = tree.get(handle) else {
            continue;
        };
        let indent = match entry.item.level {
            ItemLevel::Root => "",
            ItemLevel::Item => "  ",
            ItemLevel::File => "    ",
        };
        println!("{indent}{} [{}] {}", entry.item.name, entry.item.kind.as_str(), handle);
    }
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
