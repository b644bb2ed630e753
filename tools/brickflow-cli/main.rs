use brickflow::prelude::*;
use clap::{Parser, Subcommand};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Runs and inspects brick-graph functions described in a workspace JSON file
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import a workspace document and execute its functions
    Run {
        /// Path to the workspace definition JSON file
        workspace_path: String,
        /// Only run the function with this name
        #[arg(short, long)]
        function: Option<String>,
        /// Write a bincode snapshot of the imported store to this path
        #[arg(long)]
        snapshot: Option<String>,
    },
    /// Import a workspace document and validate its functions without running them
    Validate {
        /// Path to the workspace definition JSON file
        workspace_path: String,
    },
    /// List the registered brick types with their ports
    Catalog,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Run {
            workspace_path,
            function,
            snapshot,
        } => run(&workspace_path, function.as_deref(), snapshot.as_deref()),
        Command::Validate { workspace_path } => validate(&workspace_path),
        Command::Catalog => print_catalog(&BrickTypeRegistry::new()),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads the document into a fresh workspace owned by a local user.
fn import(workspace_path: &str) -> (Workspace, Vec<FunctionRow>) {
    let definition = WorkspaceDefinition::from_file(workspace_path)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load workspace: {}", e)));

    let workspace = Workspace::default();
    let project = workspace
        .create_project(UserId(1), "cli")
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to create project: {}", e)));
    let functions = workspace
        .import_workspace(project.id, &definition)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to import workspace: {}", e)));
    (workspace, functions)
}

fn run(workspace_path: &str, only: Option<&str>, snapshot: Option<&str>) {
    let total_start = Instant::now();
    let (workspace, functions) = import(workspace_path);

    let selected: Vec<_> = functions
        .iter()
        .filter(|f| only.is_none_or(|name| f.name == name))
        .collect();
    if selected.is_empty() {
        exit_with_error("No matching function found in the workspace document.");
    }

    let mut failures = 0;
    for function in selected {
        println!("\n=== {} ===", function.name);
        let start = Instant::now();
        match workspace.execute(function.id) {
            Ok(result) => println!("{}", ConsoleFormatter::format_result(&result)),
            Err(e) => {
                failures += 1;
                println!("Execution failed: {}", e);
            }
        }
        println!("({:?})", start.elapsed());
    }

    if let Some(path) = snapshot {
        workspace
            .store()
            .save(path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to save snapshot: {}", e)));
        println!("\nSnapshot written to '{}'", path);
    }

    println!("\nTotal: {:?}", total_start.elapsed());
    if failures > 0 {
        std::process::exit(1);
    }
}

fn validate(workspace_path: &str) {
    let (workspace, functions) = import(workspace_path);
    let mut failures = 0;
    for function in &functions {
        match workspace.validate(function.id) {
            Ok(()) => println!("{}: ok", function.name),
            Err(e) => {
                failures += 1;
                println!("{}: {}", function.name, e);
            }
        }
    }
    if failures > 0 {
        std::process::exit(1);
    }
}

fn print_catalog(registry: &BrickTypeRegistry) {
    for brick_type in registry.iter() {
        println!("{}", brick_type.name);
        for port in &brick_type.inputs {
            let required = if port.required { "" } else { " (optional)" };
            println!("  in  {}: {}{}", port.name, port.data_type, required);
        }
        for port in &brick_type.outputs {
            println!("  out {}: {}", port.name, port.data_type);
        }
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
