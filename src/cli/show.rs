use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use defwiki::{
    DefinitionId, JsonDirectory, Workspace,
    domain::{Definition, revision::Field},
};
use tracing::instrument;

use super::terminal::{Colorize, plain_text};

#[derive(Debug, Parser)]
#[command(about = "Display detailed information about a definition")]
pub struct Show {
    /// The id of the definition to display
    id: DefinitionId,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "pretty")]
    output: OutputFormat,

    /// Print the supporting tables referenced by the definition
    #[arg(long)]
    tables: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

impl Show {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let workspace = Workspace::open_dir(root)?;

        let Some(definition) = workspace.find(&self.id) else {
            anyhow::bail!("Definition {} not found", self.id);
        };

        match self.output {
            OutputFormat::Pretty => self.output_pretty(&workspace, definition)?,
            OutputFormat::Json => {
                serde_json::to_writer_pretty(std::io::stdout(), definition.as_ref())
                    .context("failed to render json output")?;
                println!();
            }
        }
        Ok(())
    }

    fn output_pretty(
        &self,
        workspace: &Workspace<JsonDirectory>,
        definition: &Definition,
    ) -> anyhow::Result<()> {
        let content = &definition.content;

        // Header
        println!("# {}", content.name);
        if definition.is_archived {
            println!("{}", "Archived".warning());
        }
        println!();

        // Metadata
        println!("{}", "Metadata".dim());
        println!("  Id:         {}", definition.id);
        println!("  Module:     {}", content.module);
        if let Some(parent) = workspace.store().parent_of(&definition.id) {
            println!("  Parent:     {} ({})", parent.name(), parent.id);
        }
        if workspace.bookmarks().contains(&definition.id) {
            println!("  Bookmarked: yes");
        }
        if !content.keywords.is_empty() {
            println!("  Keywords:   {}", content.keywords.join(", "));
        }

        for field in Field::ALL {
            let body = plain_text(field.get(content));
            if !body.is_empty() {
                println!("\n{}", field.to_string().dim());
                for line in body.lines() {
                    println!("  {line}");
                }
            }
        }

        if !content.related_definitions.is_empty() {
            println!("\n{}", "Related".dim());
            for related in &content.related_definitions {
                match workspace.find(related) {
                    Some(other) => println!("  • {} ({related})", other.name()),
                    None => println!("  • {}", format!("{related} (missing)").warning()),
                }
            }
        }

        if !definition.children.is_empty() {
            println!("\n{}", "Children".dim());
            for child in &definition.children {
                println!("  • {} ({})", child.name(), child.id);
            }
        }

        if !definition.revisions.is_empty() {
            println!("\n{}", "Revisions".dim());
            for (index, revision) in definition.revisions.iter().enumerate() {
                println!(
                    "  [{index}] {} {} {} {}",
                    revision.date,
                    revision.ticket_id.as_str().info(),
                    revision.description,
                    format!("({})", revision.developer).dim()
                );
            }
        }

        if self.tables {
            let resolved = workspace.resolve_tables(&definition.id)?;
            for table in &resolved.tables {
                println!("\n{}", table.name.dim());
                println!("  {}", table.headers.join(" | "));
                for row in &table.rows {
                    println!("  {}", row.join(" | "));
                }
            }
            for id in &resolved.unresolved {
                eprintln!("{}", format!("⚠️  Unknown table '{id}'").warning());
            }
        }

        Ok(())
    }
}
