use crate::config::{Config, load_config};
use crate::ir::GraphSpec;
use crate::layout::{Axis, PositionMap, SizeMap, align_positions, layout_spec};
use crate::layout_dump::{LayoutDump, write_layout_dump, write_layout_dump_file};
use crate::parser::{from_json_str, from_yaml_str, to_json_string, to_yaml_string};
use crate::validate::summarize;
use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "sge",
    version,
    about = "Normalize, validate, lay out and align streaming pipeline graphs"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct InputArg {
    /// Graph spec file (.yaml/.yml/.json) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the canonical form of a graph spec
    Normalize {
        #[command(flatten)]
        input: InputArg,

        /// Output format
        #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
        format: SpecFormat,
    },
    /// Run the strict DAG check and print the validation summary
    Validate {
        #[command(flatten)]
        input: InputArg,
    },
    /// Compute the layered layout and write a JSON layout dump
    Layout {
        #[command(flatten)]
        input: InputArg,

        /// Output file. Defaults to stdout.
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,

        /// Config file (JSON5)
        #[arg(short = 'c', long = "configFile")]
        config: Option<PathBuf>,
    },
    /// Align nodes on one axis and print the resulting positions
    Align {
        #[command(flatten)]
        input: InputArg,

        /// Position map JSON: {"id": {"x": .., "y": ..}}
        #[arg(short = 'p', long = "positions")]
        positions: PathBuf,

        /// Size map JSON: {"id": {"width": .., "height": ..}}
        #[arg(short = 's', long = "sizes")]
        sizes: Option<PathBuf>,

        #[arg(short = 'a', long = "axis", value_enum)]
        axis: AxisArg,

        /// Node ids to align. Defaults to every node of the graph.
        #[arg(long = "ids", value_delimiter = ',')]
        ids: Vec<String>,

        /// Config file (JSON5)
        #[arg(short = 'c', long = "configFile")]
        config: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecFormat {
    Yaml,
    Json,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisArg {
    Horizontal,
    Vertical,
}

impl From<AxisArg> for Axis {
    fn from(arg: AxisArg) -> Self {
        match arg {
            AxisArg::Horizontal => Axis::Horizontal,
            AxisArg::Vertical => Axis::Vertical,
        }
    }
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute(args.command, &mut out)
}

pub fn execute<W: Write>(command: Command, out: &mut W) -> Result<()> {
    match command {
        Command::Normalize { input, format } => {
            let spec = load_spec(input.input.as_deref())?;
            let text = match format {
                SpecFormat::Yaml => to_yaml_string(&spec)?,
                SpecFormat::Json => to_json_string(&spec)? + "\n",
            };
            out.write_all(text.as_bytes())?;
        }
        Command::Validate { input } => {
            let spec = load_spec(input.input.as_deref())?;
            let summary = summarize(&spec);
            serde_json::to_writer_pretty(&mut *out, &summary)?;
            writeln!(out)?;
            tracing::info!(ok = summary.ok, nodes = spec.nodes.len(), "validated graph");
            if !summary.ok {
                anyhow::bail!("graph validation failed: {}", summary.error);
            }
        }
        Command::Layout {
            input,
            output,
            config,
        } => {
            let config = load_config(config.as_deref()).context("failed to load config")?;
            let spec = load_spec(input.input.as_deref())?;
            let dump = build_layout_dump(&spec, &config);
            match output {
                Some(path) => write_layout_dump_file(&path, &dump)
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => {
                    write_layout_dump(&mut *out, &dump)?;
                    writeln!(out)?;
                }
            }
        }
        Command::Align {
            input,
            positions,
            sizes,
            axis,
            ids,
            config,
        } => {
            let config = load_config(config.as_deref()).context("failed to load config")?;
            let spec = load_spec(input.input.as_deref())?;
            let positions: PositionMap = read_json_file(&positions)?;
            let sizes: SizeMap = match sizes {
                Some(path) => read_json_file(&path)?,
                None => SizeMap::new(),
            };
            let ids = if ids.is_empty() {
                spec.node_ids().map(str::to_string).collect()
            } else {
                ids
            };
            let aligned = align_positions(&positions, &ids, axis.into(), &sizes, &config.layout);
            serde_json::to_writer_pretty(&mut *out, &aligned)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

pub fn build_layout_dump(spec: &GraphSpec, config: &Config) -> LayoutDump {
    let positions = layout_spec(spec, &config.layout);
    LayoutDump::from_spec(spec, &positions, &SizeMap::new(), config.layout.default_node_size)
}

fn load_spec(path: Option<&Path>) -> Result<GraphSpec> {
    let (text, format) = read_input(path)?;
    parse_spec(&text, format)
}

fn parse_spec(text: &str, format: SpecFormat) -> Result<GraphSpec> {
    let spec = match format {
        SpecFormat::Json => from_json_str(text)?,
        SpecFormat::Yaml => from_yaml_str(text)?,
    };
    Ok(spec)
}

fn read_input(path: Option<&Path>) -> Result<(String, SpecFormat)> {
    if let Some(path) = path {
        if path != Path::new("-") {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            return Ok((content, format_for_path(path)));
        }
    }

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok((buf, SpecFormat::Yaml))
}

fn format_for_path(path: &Path) -> SpecFormat {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if is_json {
        SpecFormat::Json
    } else {
        SpecFormat::Yaml
    }
}

fn read_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("invalid JSON in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::NodePosition;
    use pretty_assertions::assert_eq;

    #[test]
    fn picks_format_from_extension() {
        assert_eq!(format_for_path(Path::new("graph.json")), SpecFormat::Json);
        assert_eq!(format_for_path(Path::new("graph.JSON")), SpecFormat::Json);
        assert_eq!(format_for_path(Path::new("graph.yaml")), SpecFormat::Yaml);
        assert_eq!(format_for_path(Path::new("graph")), SpecFormat::Yaml);
    }

    #[test]
    fn yaml_parser_accepts_json_text() {
        let spec = parse_spec(
            r#"{"nodes": [{"id": "a", "plugin": "p:A"}], "edges": []}"#,
            SpecFormat::Yaml,
        )
        .unwrap();
        assert_eq!(spec.nodes[0].id, "a");
    }

    #[test]
    fn parses_subcommands() {
        let args = Args::try_parse_from([
            "sge", "align", "-i", "g.yaml", "-p", "pos.json", "--axis", "vertical", "--ids", "a,b",
        ])
        .unwrap();
        match args.command {
            Command::Align { axis, ids, .. } => {
                assert_eq!(axis, AxisArg::Vertical);
                assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let args = Args::try_parse_from(["sge", "normalize", "-i", "-", "-f", "json"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Normalize {
                format: SpecFormat::Json,
                ..
            }
        ));
        assert!(Args::try_parse_from(["sge", "align", "-i", "g.yaml"]).is_err());
    }

    #[test]
    fn layout_dump_uses_config_gaps() {
        let spec = parse_spec(
            "nodes:\n  - {id: a, plugin: p:A}\n  - {id: b, plugin: p:B}\nedges:\n  - {src: a, dst: b}\n",
            SpecFormat::Yaml,
        )
        .unwrap();
        let mut config = Config::default();
        config.layout.gap_x = 100.0;
        let dump = build_layout_dump(&spec, &config);
        assert_eq!(dump.nodes[1].x, 180.0);
        assert_eq!(dump.nodes[1].width, 200.0);
    }

    #[test]
    fn align_command_reads_files_and_prints_positions() {
        let dir = std::env::temp_dir().join(format!("sge-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let spec_path = dir.join("graph.yaml");
        let pos_path = dir.join("positions.json");
        std::fs::write(
            &spec_path,
            "nodes:\n  - {id: a, plugin: p:A}\n  - {id: b, plugin: p:B}\n",
        )
        .unwrap();
        std::fs::write(
            &pos_path,
            r#"{"a": {"x": 0, "y": 50}, "b": {"x": 10, "y": 0}}"#,
        )
        .unwrap();

        let mut out = Vec::new();
        execute(
            Command::Align {
                input: InputArg {
                    input: Some(spec_path),
                },
                positions: pos_path,
                sizes: None,
                axis: AxisArg::Horizontal,
                ids: Vec::new(),
                config: None,
            },
            &mut out,
        )
        .unwrap();
        let aligned: PositionMap = serde_json::from_slice(&out).unwrap();
        assert_eq!(aligned["a"], NodePosition::new(0.0, 0.0));
        assert_eq!(aligned["b"], NodePosition::new(236.0, 0.0));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn validate_command_fails_on_cycle() {
        let dir = std::env::temp_dir().join(format!("sge-cli-validate-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let spec_path = dir.join("cycle.json");
        std::fs::write(
            &spec_path,
            r#"{"nodes": [{"id": "a", "plugin": "p"}, {"id": "b", "plugin": "p"}],
                "edges": [{"src": "a", "dst": "b"}, {"src": "b", "dst": "a"}]}"#,
        )
        .unwrap();

        let mut out = Vec::new();
        let err = execute(
            Command::Validate {
                input: InputArg {
                    input: Some(spec_path),
                },
            },
            &mut out,
        )
        .unwrap_err();
        assert!(err.to_string().contains("a -> b -> a"));
        let printed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(printed["ok"], serde_json::json!(false));
        std::fs::remove_dir_all(&dir).ok();
    }
}
