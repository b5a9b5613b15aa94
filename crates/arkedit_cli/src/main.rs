use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process;

use arkedit_core::{
    CoreError, CoreErrorCode, ModificationPlan, ObjectContainer, ObjectId, apply, collect,
    collect_all, load_documents, merge, remap,
};
use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Save document (JSON form of the object container).
    #[arg(value_name = "SAVE.JSON")]
    path: PathBuf,
    /// Export only the subgraph reachable from these record ids.
    #[arg(long = "export", value_name = "ID")]
    export: Vec<i32>,
    /// First object id assigned to exported records.
    #[arg(long = "start-id", default_value_t = 0)]
    start_id: i32,
    /// Merge every record of the given save documents into this one.
    #[arg(long = "merge", value_name = "FILE")]
    merge: Vec<PathBuf>,
    /// Profile or cluster exports, merged the same way as --merge sources.
    #[arg(long = "profiles", value_name = "FILE")]
    profiles: Vec<PathBuf>,
    /// Apply a JSON edit script.
    #[arg(long = "modify", value_name = "SCRIPT")]
    modify: Option<PathBuf>,
    #[arg(long)]
    output: Option<PathBuf>,
    /// Print counters instead of dumping the document to stdout.
    #[arg(long)]
    summary: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CoreError> {
    let mut container = ObjectContainer::load_json(&cli.path)?;
    let mut rng = rand::thread_rng();
    let sources: Vec<PathBuf> = cli
        .merge
        .iter()
        .chain(cli.profiles.iter())
        .cloned()
        .collect();
    let transformed = !cli.export.is_empty() || !sources.is_empty() || cli.modify.is_some();

    if !cli.export.is_empty() {
        let roots: Vec<ObjectId> = cli.export.iter().copied().map(ObjectId).collect();
        for root in &roots {
            if container.get(*root).is_none() {
                return Err(CoreError::new(
                    CoreErrorCode::UnsupportedOperation,
                    format!("export root {root} does not exist in the document"),
                ));
            }
        }
        let remapped = remap(collect(&container, &roots), cli.start_id);
        if cli.summary {
            println!("exported={}", remapped.objects.len());
            println!("unresolved={}", remapped.unresolved);
        }
        container = ObjectContainer::from(remapped.objects);
    }

    // Sibling documents load in parallel; a corrupt one is skipped with a
    // warning and never aborts the batch.
    for (path, source) in load_documents(&sources) {
        let remapped = remap(collect_all(&source), container.next_id());
        if remapped.unresolved > 0 {
            warn!(
                path = %path.display(),
                unresolved = remapped.unresolved,
                "merge source contains references outside its own records"
            );
        }
        let appended = merge(&mut container, remapped.objects, &mut rng)?;
        if cli.summary {
            println!("merged={appended} source={}", path.display());
        }
    }

    if let Some(script_path) = &cli.modify {
        let file = File::open(script_path).map_err(|e| {
            CoreError::new(
                CoreErrorCode::Io,
                format!("cannot open {}: {e}", script_path.display()),
            )
        })?;
        let (mut plan, issues) = ModificationPlan::from_reader(BufReader::new(file))?;
        for issue in &issues {
            warn!(field = %issue.field, expected = issue.expected, "ignoring edit-script field");
        }
        let report = apply(&mut plan, &mut container, &mut rng)?;
        if cli.summary {
            println!("renamed={}", report.renamed);
            println!("deleted={}", report.deleted);
            println!("added={}", report.added);
            println!("removed={}", report.removed);
            println!("modifications={}", report.total());
        }
    }

    // The document is written only after every transformation succeeded.
    if let Some(path) = &cli.output {
        container.store_json(path)?;
    } else if transformed && !cli.summary {
        container.to_json_writer(io::stdout().lock())?;
    }

    if cli.summary {
        println!("records={}", container.len());
    }

    Ok(())
}
