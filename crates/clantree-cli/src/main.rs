use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clantree_core::{MemberRecord, parse_snapshot};
use clantree_graph::{HierarchyBuilder, Vec2};
use clantree_view::{TickStatus, TreeView, ViewSettings, ViewportSize, ViewportTransform};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Lay out a snapshot and print node positions and edge paths
    Layout {
        /// JSON array of member records
        #[arg(short, long)]
        input: PathBuf,

        /// View settings JSON
        #[arg(short, long)]
        settings: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Run the focus animation for one member and print the final transform
    Focus {
        #[arg(short, long)]
        input: PathBuf,

        /// Member id to center
        #[arg(long)]
        id: String,

        /// Viewport size as WIDTHxHEIGHT
        #[arg(long, default_value = "800x600", value_parser = parse_viewport)]
        viewport: ViewportSize,

        #[arg(short, long)]
        settings: Option<PathBuf>,
    },
    /// Check that a snapshot forms a single rooted tree
    Validate {
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Json,
    SvgPaths,
}

#[derive(Serialize)]
struct LayoutOutput<'a> {
    nodes: Vec<NodeOutput<'a>>,
    edges: Vec<EdgeOutput<'a>>,
}

#[derive(Serialize)]
struct NodeOutput<'a> {
    id: &'a str,
    name: &'a str,
    depth: usize,
    position: Vec2,
}

#[derive(Serialize)]
struct EdgeOutput<'a> {
    source: &'a str,
    target: &'a str,
    path: String,
}

#[derive(Serialize)]
struct FocusOutput<'a> {
    id: &'a str,
    frames: usize,
    transform: ViewportTransform,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    match args.command {
        Command::Layout {
            input,
            settings,
            format,
        } => run_layout(&input, settings.as_deref(), format),
        Command::Focus {
            input,
            id,
            viewport,
            settings,
        } => run_focus(&input, &id, viewport, settings.as_deref()),
        Command::Validate { input } => run_validate(&input),
    }
}

fn read_records(path: &Path) -> Result<Vec<MemberRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    let records = parse_snapshot(&content)
        .with_context(|| format!("decoding snapshot {}", path.display()))?;
    Ok(records)
}

fn read_settings(path: Option<&Path>) -> Result<ViewSettings> {
    match path {
        Some(path) => ViewSettings::load(path),
        None => Ok(ViewSettings::default()),
    }
}

fn load_view(input: &Path, settings: Option<&Path>, viewport: ViewportSize) -> Result<TreeView> {
    let records = read_records(input)?;
    let mut view = TreeView::new(read_settings(settings)?, viewport);
    view.apply_snapshot(&records)?;
    Ok(view)
}

fn run_layout(input: &Path, settings: Option<&Path>, format: OutputFormat) -> Result<()> {
    let view = load_view(input, settings, ViewportSize::default())?;
    let tree = view.tree();
    tracing::info!(
        "Laid out {} members and {} edges from {}",
        tree.len(),
        view.edges().len(),
        input.display()
    );

    match format {
        OutputFormat::Json => {
            let output = LayoutOutput {
                nodes: tree
                    .descendants()
                    .map(|node| NodeOutput {
                        id: node.id().as_str(),
                        name: &node.record.name,
                        depth: node.depth,
                        position: node.position,
                    })
                    .collect(),
                edges: view
                    .edges()
                    .iter()
                    .filter_map(|edge| {
                        Some(EdgeOutput {
                            source: tree.node(edge.source)?.id().as_str(),
                            target: tree.node(edge.target)?.id().as_str(),
                            path: edge.path.to_svg_path(),
                        })
                    })
                    .collect(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::SvgPaths => {
            for edge in view.edges() {
                println!("{}", edge.path.to_svg_path());
            }
        }
    }
    Ok(())
}

fn run_focus(
    input: &Path,
    id: &str,
    viewport: ViewportSize,
    settings: Option<&Path>,
) -> Result<()> {
    let mut view = load_view(input, settings, viewport)?;
    view.focus_node(id)?;

    let frame = Duration::from_millis(16);
    let mut frames = 1;
    while view.tick(frame) == TickStatus::Running {
        frames += 1;
    }

    let output = FocusOutput {
        id,
        frames,
        transform: view.transform(),
    };
    tracing::info!("Focused {} after {} frames", id, frames);
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Member and generation counts of a snapshot that stratifies cleanly.
#[derive(Debug, PartialEq, Eq)]
struct ValidationSummary {
    members: usize,
    generations: usize,
}

fn validate_snapshot(input: &Path) -> Result<ValidationSummary> {
    let records = read_records(input)?;
    let hierarchy = match HierarchyBuilder::build(&records) {
        Ok(hierarchy) => hierarchy,
        Err(err) => {
            tracing::warn!("{} failed validation: {}", input.display(), err);
            return Err(err).with_context(|| format!("invalid hierarchy in {}", input.display()));
        }
    };
    Ok(ValidationSummary {
        members: hierarchy.len(),
        generations: if hierarchy.is_empty() {
            0
        } else {
            hierarchy.max_depth() + 1
        },
    })
}

fn run_validate(input: &Path) -> Result<()> {
    let summary = validate_snapshot(input)?;
    tracing::info!("{} is a valid clan tree", input.display());
    println!(
        "{}: {} members, {} generations",
        input.display(),
        summary.members,
        summary.generations
    );
    Ok(())
}

fn parse_viewport(value: &str) -> Result<ViewportSize, String> {
    let (width, height) = value
        .split_once(|c: char| c.eq_ignore_ascii_case(&'x'))
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{value}'"))?;
    let parse = |s: &str| {
        s.trim()
            .parse::<f32>()
            .ok()
            .filter(|v| v.is_finite() && *v > 0.0)
            .ok_or_else(|| format!("invalid viewport dimension '{s}'"))
    };
    Ok(ViewportSize::new(parse(width)?, parse(height)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_viewport() {
        assert_eq!(
            parse_viewport("1024x768").unwrap(),
            ViewportSize::new(1024.0, 768.0)
        );
        assert_eq!(
            parse_viewport("800X600").unwrap(),
            ViewportSize::new(800.0, 600.0)
        );
        assert!(parse_viewport("800").is_err());
        assert!(parse_viewport("0x600").is_err());
        assert!(parse_viewport("axb").is_err());
    }

    fn write_snapshot(dir: &tempfile::TempDir, json: &str) -> PathBuf {
        let path = dir.path().join("clan.json");
        std::fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn test_validate_counts_members_and_generations() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_snapshot(
            &dir,
            r#"[{"id":"A","parentId":""},{"id":"B","parentId":"A"},{"id":"C","parentId":"B"}]"#,
        );
        assert_eq!(
            validate_snapshot(&path).unwrap(),
            ValidationSummary {
                members: 3,
                generations: 3
            }
        );
    }

    #[test]
    fn test_validate_rejects_rootless_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_snapshot(
            &dir,
            r#"[{"id":"A","parentId":"B"},{"id":"B","parentId":"A"}]"#,
        );
        let err = validate_snapshot(&path).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("invalid hierarchy"));
        assert!(message.contains("cycle"));
    }

    #[test]
    fn test_args_parse_focus() {
        let args = Args::try_parse_from([
            "clantree", "focus", "--input", "tree.json", "--id", "B", "--viewport", "640x480",
        ])
        .unwrap();
        match args.command {
            Command::Focus { id, viewport, .. } => {
                assert_eq!(id, "B");
                assert_eq!(viewport, ViewportSize::new(640.0, 480.0));
            }
            other => panic!("Expected focus, got {other:?}"),
        }
    }

    #[test]
    fn test_args_parse_layout_format() {
        let args =
            Args::try_parse_from(["clantree", "layout", "-i", "tree.json", "-f", "svg-paths"])
                .unwrap();
        match args.command {
            Command::Layout { format, .. } => assert_eq!(format, OutputFormat::SvgPaths),
            other => panic!("Expected layout, got {other:?}"),
        }
    }
}
