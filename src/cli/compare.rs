use std::path::PathBuf;

use clap::Parser;
use defwiki::{
    DefinitionId, Workspace,
    domain::diff::{self, Operation, Span},
};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
#[command(about = "Compare two revisions of a definition")]
pub struct Compare {
    /// The id of the definition
    id: DefinitionId,

    /// Index of one revision, as listed by `show`
    first: usize,

    /// Index of the other revision
    second: usize,

    /// Print one merged view instead of separate before and after views
    #[arg(long)]
    inline: bool,
}

impl Compare {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let workspace = Workspace::open_dir(root)?;
        let comparison = workspace.compare_revisions(&self.id, self.first, self.second)?;

        println!(
            "{} → {}",
            format!("{} ({})", comparison.older.ticket_id, comparison.older.date).dim(),
            format!("{} ({})", comparison.newer.ticket_id, comparison.newer.date).dim()
        );

        if comparison.fields.is_empty() {
            println!("{}", "No differences".dim());
            return Ok(());
        }

        for field in &comparison.fields {
            println!("\n{}", field.field.to_string().info());
            if self.inline {
                println!("  {}", render(field.spans.iter()));
            } else {
                println!("- {}", render(diff::deletion_view(&field.spans)));
                println!("+ {}", render(diff::insertion_view(&field.spans)));
            }
        }
        Ok(())
    }
}

fn render<'a>(spans: impl Iterator<Item = &'a Span>) -> String {
    spans
        .map(|span| match span.operation {
            Operation::Equal => span.text.clone(),
            Operation::Insert => span.text.inserted(),
            Operation::Delete => span.text.deleted(),
        })
        .collect()
}
