use brickflow::prelude::*;
use clap::Parser;
use rand::Rng;
use rand::rngs::ThreadRng;
use rand::seq::IndexedRandom;
use std::collections::BTreeMap;
use std::fs;

/// Brick types the generator combines. Each of them succeeds on any input a
/// generated graph can feed it.
const GENERATED_TYPES: &[&str] = &[
    "ListInstancesByDBName",
    "GetFirstInstance",
    "CountInstances",
    "GetAttributeValue",
    "ConcatText",
    "NumberToText",
    "LogListOfInstances",
    "LogInstance",
    "LogText",
    "LogNumber",
];

const DATABASE_NAME: &str = "Customers";

/// A CLI tool to generate random, valid workspace documents for brickflow
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The path to write the generated JSON file to
    #[arg(short, long, default_value = "generated_workspace.json")]
    output: String,

    /// Number of bricks in the generated function
    #[arg(long, default_value_t = 100)]
    bricks: usize,

    /// Number of instances in the generated database
    #[arg(long, default_value_t = 20)]
    instances: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut rng = rand::rng();

    if cli.bricks == 0 || cli.bricks > brickflow::limits::MAX_BRICKS_PER_FUNCTION {
        eprintln!(
            "Error: --bricks must be between 1 and {}",
            brickflow::limits::MAX_BRICKS_PER_FUNCTION
        );
        std::process::exit(1);
    }

    println!(
        "Generating a function with {} bricks over {} instances...",
        cli.bricks, cli.instances
    );

    let definition = WorkspaceDefinition {
        databases: vec![generate_database(&mut rng, cli.instances.max(1))],
        functions: vec![generate_function(&mut rng, cli.bricks)],
    };

    fs::write(&cli.output, definition.to_json()?)?;
    println!("Successfully generated and saved workspace to '{}'", cli.output);
    Ok(())
}

fn generate_database(rng: &mut ThreadRng, count: usize) -> DatabaseDefinition {
    let schema = BTreeMap::from([
        ("name".to_string(), AttributeType::Text),
        ("age".to_string(), AttributeType::Number),
        ("vip".to_string(), AttributeType::Boolean),
    ]);
    let first_names = ["Ada", "Grace", "Linus", "Barbara", "Ken", "Margaret"];

    let instances = (0..count)
        .map(|_| {
            let mut values = serde_json::Map::new();
            let name = first_names.choose(rng).copied().unwrap_or("Ada");
            values.insert("name".to_string(), serde_json::json!(name));
            values.insert("age".to_string(), serde_json::json!(rng.random_range(18..90)));
            values.insert("vip".to_string(), serde_json::json!(rng.random_bool(0.2)));
            values
        })
        .collect();

    DatabaseDefinition {
        name: DATABASE_NAME.to_string(),
        schema,
        instances,
    }
}

/// Builds a random acyclic function. Inputs only connect to earlier bricks,
/// and scalar inputs without a producer get a literal instead.
fn generate_function(rng: &mut ThreadRng, count: usize) -> FunctionDefinition {
    let registry = BrickTypeRegistry::new();
    let mut bricks: Vec<BrickDefinition> = Vec::with_capacity(count);
    let mut producers: Vec<(String, String, DataType)> = Vec::new();
    let mut connections = Vec::new();

    while bricks.len() < count {
        // The first brick is always a source.
        let type_name = if bricks.is_empty() {
            GENERATED_TYPES[0]
        } else {
            GENERATED_TYPES.choose(rng).copied().unwrap_or(GENERATED_TYPES[0])
        };
        let Some(brick_type) = registry.get(type_name) else {
            continue;
        };

        let key = format!("b{}", bricks.len());
        let mut configuration = serde_json::Map::new();
        let mut wiring = Vec::new();
        let mut satisfiable = true;

        for input in &brick_type.inputs {
            let candidates: Vec<_> = producers
                .iter()
                .filter(|(_, _, data_type)| *data_type == input.data_type)
                .collect();
            let literal = literal_for(rng, &input.name, input.data_type);

            match (candidates.choose(rng), literal) {
                (Some((from, output, _)), None) => {
                    wiring.push((from.clone(), output.clone(), input.name.clone()))
                }
                (Some((from, output, _)), Some(_)) if rng.random_bool(0.7) => {
                    wiring.push((from.clone(), output.clone(), input.name.clone()))
                }
                (_, Some(value)) => {
                    configuration.insert(input.name.clone(), value);
                }
                (None, None) => satisfiable = false,
            }
        }
        if !satisfiable {
            continue;
        }

        for (from, output, input) in wiring {
            connections.push(ConnectionDefinition {
                from,
                from_output: output,
                to: key.clone(),
                to_input: input,
            });
        }
        for output in &brick_type.outputs {
            producers.push((key.clone(), output.name.clone(), output.data_type));
        }
        bricks.push(BrickDefinition {
            key,
            brick_type: type_name.to_string(),
            position_x: rng.random_range(0..2000),
            position_y: rng.random_range(0..2000),
            configuration,
        });
    }

    println!(
        "-> Generated {} bricks and {} connections.",
        bricks.len(),
        connections.len()
    );
    FunctionDefinition {
        name: "generated".to_string(),
        bricks,
        connections,
    }
}

/// Literal for a scalar input. Inputs naming a database or an attribute are
/// pinned so the generated graph always runs.
fn literal_for(
    rng: &mut ThreadRng,
    input: &str,
    data_type: DataType,
) -> Option<serde_json::Value> {
    match (input, data_type) {
        ("database_name", _) => Some(serde_json::json!(DATABASE_NAME)),
        ("attribute", _) => Some(serde_json::json!("name")),
        (_, DataType::Text) => {
            Some(serde_json::json!(format!("text-{}", rng.random_range(0..1000))))
        }
        (_, DataType::Number) => Some(serde_json::json!(rng.random_range(0..1000))),
        (_, DataType::Boolean) => Some(serde_json::json!(rng.random_bool(0.5))),
        _ => None,
    }
}
