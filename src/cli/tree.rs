use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use defwiki::{Filters, Workspace, domain::ProjectedNode};
use serde_json::{Value, json};
use tracing::instrument;

use super::terminal::{Colorize, is_narrow};

#[derive(Debug, Parser, Default)]
#[command(about = "Show the definition tree")]
pub struct Tree {
    /// Only show definitions whose name or keywords contain this text
    #[arg(long, short)]
    query: Option<String>,

    /// Include archived definitions
    #[arg(long)]
    archived: bool,

    /// Only show bookmarked definitions
    #[arg(long)]
    bookmarked: bool,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "pretty")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

impl Tree {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let workspace = Workspace::open_dir(root)?;

        let defaults = workspace.default_filters();
        let filters = Filters {
            query: self.query.unwrap_or_default(),
            show_archived: self.archived || defaults.show_archived,
            show_bookmarked: self.bookmarked,
        };
        let nodes = workspace.project(&filters);

        match self.output {
            OutputFormat::Pretty => {
                if nodes.is_empty() {
                    println!("{}", "No definitions to show".dim());
                }
                let keywords = !is_narrow();
                for node in &nodes {
                    render(node, 0, keywords);
                }
            }
            OutputFormat::Json => {
                let value: Vec<Value> = nodes.iter().map(to_json).collect();
                serde_json::to_writer_pretty(std::io::stdout(), &value)
                    .context("failed to render json output")?;
                println!();
            }
        }
        Ok(())
    }
}

fn render(node: &ProjectedNode, depth: usize, keywords: bool) {
    let indent = "  ".repeat(depth);
    let definition = &node.definition;
    let marker = if node.bookmarked { "★ " } else { "" };

    let mut line = format!("{indent}{marker}{}", definition.name());
    if definition.is_archived {
        line = format!("{} {}", line.dim(), "(archived)".warning());
    }
    line.push_str(&format!("  {}", definition.id.as_str().dim()));
    if keywords && !definition.content.keywords.is_empty() {
        line.push_str(&format!(" {}", definition.content.keywords.join(", ").info()));
    }
    println!("{line}");

    for child in &node.children {
        render(child, depth + 1, keywords);
    }
}

fn to_json(node: &ProjectedNode) -> Value {
    json!({
        "id": node.id(),
        "name": node.definition.name(),
        "module": node.definition.content.module,
        "isArchived": node.definition.is_archived,
        "bookmarked": node.bookmarked,
        "children": node.children.iter().map(to_json).collect::<Vec<_>>(),
    })
}
