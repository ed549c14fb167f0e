use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;
use spk_batch::write_batches;
use spk_sdk::{Serializer, SerializerConfig, TraversalStrategy};
use spk_types::ObjectId;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serialize(args) => {
            let report = cmd_serialize(&args)?;
            print_serialize(&report, cli.format)
        }
        Command::Closure(args) => {
            let report = cmd_closure(&args)?;
            print_closure(&report, cli.format)
        }
    }
}

// ---- Reports ----

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializeReport {
    pub id: ObjectId,
    pub speckle_type: Option<String>,
    pub objects: usize,
    pub closure_size: usize,
    pub batches: Vec<BatchSummary>,
    pub object_references: BTreeMap<String, ObjectId>,
}

#[derive(Debug, Serialize)]
pub struct BatchSummary {
    pub objects: usize,
    pub bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClosureReport {
    pub id: ObjectId,
    pub closure: Vec<ClosureEntry>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ClosureEntry {
    pub id: ObjectId,
    pub depth: u32,
}

// ---- Commands ----

fn load_config(args: &TraverseArgs) -> anyhow::Result<SerializerConfig> {
    let mut config = match &args.config {
        Some(path) => SerializerConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => SerializerConfig::default(),
    };
    if let Some(size) = args.chunk_size {
        config.traverse.default_chunk_size = size;
    }
    if let Some(strategy) = args.strategy {
        config.traverse.strategy = match strategy {
            StrategyArg::Recursive => TraversalStrategy::Recursive,
            StrategyArg::WorkStack => TraversalStrategy::WorkStack,
        };
    }
    if let Some(depth) = args.max_depth {
        config.traverse.max_depth = depth;
    }
    if args.total_children_count {
        config.traverse.emit_total_children_count = true;
    }
    Ok(config)
}

fn read_input(path: &Path) -> anyhow::Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}

pub fn cmd_serialize(args: &SerializeArgs) -> anyhow::Result<SerializeReport> {
    let mut config = load_config(&args.traverse)?;
    if let Some(max) = args.max_batch_bytes {
        config.max_batch_bytes = max;
    }
    let mut serializer = Serializer::new(config)?;
    let root = read_input(&args.traverse.input)?;
    let object = serializer.serialize_object(&root)?;

    let batches = serializer.batches()?;
    let paths: Vec<Option<String>> = match &args.out_dir {
        Some(dir) => write_batches(dir, &batches)
            .with_context(|| format!("failed to write batches to {}", dir.display()))?
            .into_iter()
            .map(|path| Some(path.display().to_string()))
            .collect(),
        None => vec![None; batches.len()],
    };

    Ok(SerializeReport {
        id: object.id(),
        speckle_type: object.speckle_type().map(str::to_string),
        objects: serializer.object_store().len(),
        closure_size: object.closure().len(),
        batches: batches
            .iter()
            .zip(paths)
            .map(|(batch, path)| BatchSummary {
                objects: batch.object_count(),
                bytes: batch.len_bytes(),
                path,
            })
            .collect(),
        object_references: serializer
            .object_references()
            .iter()
            .map(|(app_id, reference)| (app_id.clone(), reference.referenced_id))
            .collect(),
    })
}

pub fn cmd_closure(args: &ClosureArgs) -> anyhow::Result<ClosureReport> {
    let mut serializer = Serializer::new(load_config(&args.traverse)?)?;
    let root = read_input(&args.traverse.input)?;
    let object = serializer.serialize_object(&root)?;

    let mut closure: Vec<ClosureEntry> = object
        .closure()
        .iter()
        .map(|(id, depth)| ClosureEntry {
            id: *id,
            depth: *depth,
        })
        .collect();
    closure.sort_by_key(|entry| (entry.depth, entry.id));
    Ok(ClosureReport {
        id: object.id(),
        closure,
    })
}

// ---- Output ----

fn print_json<T: Serialize>(report: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

fn print_serialize(report: &SerializeReport, format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        return print_json(report);
    }
    println!(
        "{} Serialized {} {}",
        "✓".green().bold(),
        report.speckle_type.as_deref().unwrap_or("object").bold(),
        report.id.to_string().yellow()
    );
    println!("  Objects: {}", report.objects.to_string().bold());
    println!("  Closure: {} detached descendants", report.closure_size);
    let total: usize = report.batches.iter().map(|b| b.bytes).sum();
    println!("  Batches: {} ({} bytes)", report.batches.len(), total);
    for batch in &report.batches {
        let location = batch.path.as_deref().unwrap_or("-");
        println!(
            "    {}  {} objects  {} bytes",
            location.dimmed(),
            batch.objects,
            batch.bytes
        );
    }
    if !report.object_references.is_empty() {
        println!("  Handles:");
        for (app_id, id) in &report.object_references {
            println!("    {} → {}", app_id.cyan(), id.short_hex().yellow());
        }
    }
    Ok(())
}

fn print_closure(report: &ClosureReport, format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        return print_json(report);
    }
    println!("Closure of {}", report.id.to_string().yellow().bold());
    if report.closure.is_empty() {
        println!("  (no detached descendants)");
    }
    for entry in &report.closure {
        println!("  {:>3}  {}", entry.depth.to_string().bold(), entry.id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, Parser};
    use spk_batch::parse_batch;
    use std::path::PathBuf;

    fn write_input(dir: &Path, value: &Value) -> PathBuf {
        let path = dir.join("input.json");
        std::fs::write(&path, serde_json::to_string(value).unwrap()).unwrap();
        path
    }

    fn model() -> Value {
        serde_json::json!({
            "speckle_type": "Model",
            "@mid": {
                "speckle_type": "Mid",
                "applicationId": "mid-1",
                "@leaf": { "speckle_type": "Leaf", "v": 1 }
            },
            "@(2)values": [1, 2, 3]
        })
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_serialize_flags() {
        let cli = Cli::try_parse_from([
            "spk",
            "serialize",
            "in.json",
            "--strategy",
            "work-stack",
            "--chunk-size",
            "10",
            "--max-batch-bytes",
            "2048",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        let Command::Serialize(args) = cli.command else {
            panic!("expected serialize");
        };
        assert_eq!(args.traverse.strategy, Some(StrategyArg::WorkStack));
        assert_eq!(args.traverse.chunk_size, Some(10));
        assert_eq!(args.max_batch_bytes, Some(2048));
    }

    #[test]
    fn serialize_writes_batches() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("batches");
        let args = SerializeArgs {
            traverse: TraverseArgs {
                input: write_input(dir.path(), &model()),
                ..Default::default()
            },
            max_batch_bytes: Some(200),
            out_dir: Some(out_dir.clone()),
        };
        let report = cmd_serialize(&args).unwrap();

        // root, mid, leaf, two chunks
        assert_eq!(report.objects, 5);
        assert_eq!(report.closure_size, 4);
        assert_eq!(report.speckle_type.as_deref(), Some("Model"));
        assert!(report.object_references.contains_key("mid-1"));

        let mut parsed = 0;
        for batch in &report.batches {
            let path = batch.path.as_ref().unwrap();
            let text = std::fs::read_to_string(path).unwrap();
            assert_eq!(text.len(), batch.bytes);
            parsed += parse_batch(&text).unwrap().len();
        }
        assert_eq!(parsed, 5);
        assert_eq!(std::fs::read_dir(&out_dir).unwrap().count(), report.batches.len());
    }

    #[test]
    fn strategy_flag_does_not_change_ids() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), &model());
        let run = |strategy| {
            cmd_serialize(&SerializeArgs {
                traverse: TraverseArgs {
                    input: input.clone(),
                    strategy: Some(strategy),
                    ..Default::default()
                },
                ..Default::default()
            })
            .unwrap()
            .id
        };
        assert_eq!(run(StrategyArg::Recursive), run(StrategyArg::WorkStack));
    }

    #[test]
    fn closure_is_sorted_by_depth() {
        let dir = tempfile::tempdir().unwrap();
        let args = ClosureArgs {
            traverse: TraverseArgs {
                input: write_input(dir.path(), &model()),
                ..Default::default()
            },
        };
        let report = cmd_closure(&args).unwrap();
        let depths: Vec<u32> = report.closure.iter().map(|e| e.depth).collect();
        assert_eq!(depths, vec![1, 1, 1, 2]);
    }

    #[test]
    fn config_file_and_flags_combine() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("spk.toml");
        std::fs::write(&config, "[traverse]\ndefault_chunk_size = 1\n").unwrap();
        let value = serde_json::json!({ "speckle_type": "Mesh", "@()faces": [1, 2, 3] });

        let args = TraverseArgs {
            input: write_input(dir.path(), &value),
            config: Some(config),
            ..Default::default()
        };
        let from_file = load_config(&args).unwrap();
        assert_eq!(from_file.traverse.default_chunk_size, 1);

        let report = cmd_closure(&ClosureArgs { traverse: args.clone() }).unwrap();
        assert_eq!(report.closure.len(), 3);

        let overridden = load_config(&TraverseArgs {
            chunk_size: Some(2),
            total_children_count: true,
            ..args
        })
        .unwrap();
        assert_eq!(overridden.traverse.default_chunk_size, 2);
        assert!(overridden.traverse.emit_total_children_count);
    }

    #[test]
    fn missing_or_invalid_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = ClosureArgs {
            traverse: TraverseArgs {
                input: dir.path().join("nope.json"),
                ..Default::default()
            },
        };
        assert!(cmd_closure(&missing).is_err());

        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        let invalid = ClosureArgs {
            traverse: TraverseArgs {
                input: path,
                ..Default::default()
            },
        };
        let err = cmd_closure(&invalid).unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));
    }
}
