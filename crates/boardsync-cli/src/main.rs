use anyhow::Result;
use boardsync_cli::{read_state, render_state, render_statuses, render_template};
use boardsync_core::config::DEFAULT_STORAGE_KEY;
use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Command::new("boardsync")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Inspect boardsync state, status mapping and module templates")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("status")
                .about("Map remote status texts to task statuses")
                .arg(
                    Arg::new("text")
                        .required(true)
                        .num_args(1..)
                        .help("Raw status text, e.g. \"Working on it\""),
                ),
        )
        .subcommand(
            Command::new("inspect")
                .about("Show projects from a saved state directory")
                .arg(
                    Arg::new("dir")
                        .long("dir")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Directory holding the saved state"),
                )
                .arg(
                    Arg::new("key")
                        .long("key")
                        .default_value(DEFAULT_STORAGE_KEY)
                        .help("Storage key of the state blob"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("template")
                .about("Resolve a module name against a template file")
                .arg(
                    Arg::new("file")
                        .long("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("YAML file with a top-level `templates` list"),
                )
                .arg(
                    Arg::new("name")
                        .required(true)
                        .help("Module name to resolve"),
                ),
        );

    let matches = cli.get_matches();

    match matches.subcommand() {
        Some(("status", args)) => {
            let texts: Vec<&String> = args.get_many::<String>("text").into_iter().flatten().collect();
            print!("{}", render_statuses(&texts));
        }
        Some(("inspect", args)) => {
            let Some(dir) = args.get_one::<PathBuf>("dir") else {
                anyhow::bail!("--dir is required");
            };
            let key = args
                .get_one::<String>("key")
                .map_or(DEFAULT_STORAGE_KEY, String::as_str);
            let state = read_state(dir, key).await?;
            tracing::debug!(projects = state.projects.len(), "state loaded");
            print!("{}", render_state(&state, args.get_flag("json"))?);
        }
        Some(("template", args)) => {
            let (Some(file), Some(name)) = (
                args.get_one::<PathBuf>("file"),
                args.get_one::<String>("name"),
            ) else {
                anyhow::bail!("--file and NAME are required");
            };
            print!("{}", render_template(file, name)?);
        }
        _ => {}
    }
    Ok(())
}
