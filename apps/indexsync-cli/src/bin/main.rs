use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use tracing::info;
use tracing_subscriber::EnvFilter;

use indexsync_core::config::Config;
use indexsync_core::model::{License, Project};
use indexsync_core::types::IndexKind;
use indexsync_text::{IndexStore, IndexerRegistry, TextSearcher};

const USAGE: &str = "Usage: indexsync <command> [args...]

Commands:
  add-license <uuid> <licenseid> <name>
  update-license <uuid> <licenseid> <name>
  remove-license <uuid>
  add-project <uuid> <name> [version] [description]
  update-project <uuid> <name> [version] [description]
  remove-project <uuid>
  get <license|project> <uuid>
  search <license|project> <query> [limit]
  import <licenses.json>";

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().collect();
    args.remove(0);
    if args.is_empty() { eprintln!("{}", USAGE); std::process::exit(1); }
    let cmd = args.remove(0);
    (cmd, args)
}

fn arg(args: &[String], i: usize, name: &str) -> anyhow::Result<String> {
    args.get(i).cloned().ok_or_else(|| anyhow!("missing <{}>\n\n{}", name, USAGE))
}

fn kind_arg(args: &[String]) -> anyhow::Result<IndexKind> {
    let raw = arg(args, 0, "license|project")?;
    IndexKind::parse(&raw).ok_or_else(|| anyhow!("unknown index kind '{}'", raw))
}

fn license_from(args: &[String]) -> anyhow::Result<License> {
    Ok(License::new(arg(args, 0, "uuid")?, arg(args, 1, "licenseid")?, arg(args, 2, "name")?))
}

fn project_from(args: &[String]) -> anyhow::Result<Project> {
    let mut project = Project::new(arg(args, 0, "uuid")?, arg(args, 1, "name")?);
    project.version = args.get(2).cloned();
    project.description = args.get(3).cloned();
    Ok(project)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.index_settings()?;
    let (cmd, args) = parse_args();

    let base = env::current_dir()?;
    let store = IndexStore::from_settings(&settings, &base)
        .with_context(|| format!("opening index root {}", settings.root_path(&base).display()))?;
    let registry = IndexerRegistry::new(&store, settings.failure_policy)?;

    match cmd.as_str() {
        "add-license" => registry.add(&license_from(&args)?)?,
        "update-license" => registry.update(&license_from(&args)?)?,
        "remove-license" => registry.remove(&License { uuid: arg(&args, 0, "uuid")?, ..License::default() })?,
        "add-project" => registry.add(&project_from(&args)?)?,
        "update-project" => registry.update(&project_from(&args)?)?,
        "remove-project" => registry.remove(&Project { uuid: arg(&args, 0, "uuid")?, ..Project::default() })?,
        "get" => {
            let kind = kind_arg(&args)?;
            let uuid = arg(&args, 1, "uuid")?;
            match store.handle(kind)?.get_by_key(&uuid)? {
                Some(doc) => {
                    for field in doc.fields() {
                        println!("{:<12} {}", field.name, field.value.as_deref().unwrap_or("-"));
                    }
                }
                None => bail!("{} {} is not indexed", kind, uuid),
            }
        }
        "search" => {
            let kind = kind_arg(&args)?;
            let query = arg(&args, 1, "query")?;
            let limit = match args.get(2) { Some(raw) => raw.parse::<usize>().context("limit must be a number")?, None => 10 };
            let searcher = TextSearcher::new(store.handle(kind)?);
            let hits = searcher.search_documents(&query, limit)?;
            println!("{} hit(s) for '{}' in {}", hits.len(), query, kind);
            for (hit, doc) in hits {
                let label = kind.search_fields().iter().filter_map(|f| doc.get(f)).collect::<Vec<_>>().join(" | ");
                println!("{:>8.3}  {}  {}", hit.score, hit.id, label);
            }
        }
        "import" => {
            let path = PathBuf::from(arg(&args, 0, "licenses.json")?);
            let raw = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
            let licenses: Vec<License> = serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
            for license in &licenses { registry.add(license)?; }
            info!(count = licenses.len(), file = %path.display(), "imported licenses");
        }
        _ => { eprintln!("Unknown command: {}\n\n{}", cmd, USAGE); std::process::exit(1); }
    }
    Ok(())
}
