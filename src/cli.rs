use std::{collections::BTreeSet, path::PathBuf};

mod compare;
mod notifications;
mod show;
mod terminal;
mod tree;

use anyhow::Context;
use clap::ArgAction;
use compare::Compare;
use defwiki::{Content, DefinitionId, Workspace};
use notifications::Notifications;
use show::Show;
use tracing::instrument;
use tree::Tree;

use terminal::Colorize;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global=true)]
    verbose: u8,

    /// The path to the directory holding the wiki data
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command
            .unwrap_or_else(|| Command::Tree(Tree::default()))
            .run(self.root)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Show the definition tree (default)
    Tree(Tree),

    /// Show detailed information about a definition
    Show(Show),

    /// Search names, keywords and every body of text
    Search(Search),

    /// Create a new definition
    Create(Create),

    /// Edit a definition
    Update(Update),

    /// Copy a definition next to the original
    Duplicate(Duplicate),

    /// Archive or restore definitions
    ///
    /// Archiving hides a definition without deleting it. Children are not
    /// affected.
    Archive(Archive),

    /// Delete a definition and everything below it
    Delete(Delete),

    /// Toggle the bookmark on a definition
    Bookmark(Bookmark),

    /// Relate two definitions
    Relate(Relate),

    /// List or acknowledge change notifications
    Notifications(Notifications),

    /// Compare two revisions of a definition
    Compare(Compare),

    /// Export selected definitions as JSON
    Export(Export),
}

impl Command {
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        match self {
            Self::Tree(command) => command.run(root)?,
            Self::Show(command) => command.run(root)?,
            Self::Search(command) => command.run(root)?,
            Self::Create(command) => command.run(root)?,
            Self::Update(command) => command.run(root)?,
            Self::Duplicate(command) => command.run(root)?,
            Self::Archive(command) => command.run(root)?,
            Self::Delete(command) => command.run(root)?,
            Self::Bookmark(command) => command.run(root)?,
            Self::Relate(command) => command.run(root)?,
            Self::Notifications(command) => command.run(root)?,
            Self::Compare(command) => command.run(root)?,
            Self::Export(command) => command.run(root)?,
        }
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Search {
    /// Case-insensitive text to look for
    query: String,
}

impl Search {
    #[instrument]
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let workspace = Workspace::open_dir(root)?;
        let hits = workspace.search(&self.query);

        if hits.is_empty() {
            println!("{}", format!("No definitions match '{}'", self.query).dim());
            return Ok(());
        }

        for definition in &hits {
            let module = &definition.content.module;
            println!(
                "{}  {} {}",
                definition.id.as_str().dim(),
                definition.name(),
                format!("({module})").dim()
            );
        }
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Create {
    /// The name of the module to create the definition in.
    ///
    /// A new top-level module is created if none has this name.
    module: String,

    /// The name of the new definition.
    #[clap(long, short)]
    name: String,

    /// The description (rich text).
    #[clap(long, short)]
    description: Option<String>,

    /// Search keywords.
    #[clap(long, short, value_delimiter = ',')]
    keywords: Vec<String>,
}

impl Create {
    #[instrument]
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut workspace = Workspace::open_dir(root)?;

        let content = Content {
            description: self.description.unwrap_or_default(),
            keywords: self.keywords,
            ..Content::named(self.name, String::new())
        };
        let id = workspace.create(&self.module, content)?;
        workspace.flush()?;

        println!("Added definition {id}");
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Update {
    /// The id of the definition to edit
    id: DefinitionId,

    /// New name.
    #[clap(long)]
    name: Option<String>,

    /// New module label.
    #[clap(long)]
    module: Option<String>,

    /// New description (rich text).
    #[clap(long)]
    description: Option<String>,

    /// New technical details (rich text).
    #[clap(long)]
    technical_details: Option<String>,

    /// New usage examples (rich text).
    #[clap(long)]
    examples: Option<String>,

    /// New usage guidance (rich text).
    #[clap(long)]
    usage: Option<String>,

    /// Replace the keywords.
    #[clap(long, value_delimiter = ',')]
    keywords: Option<Vec<String>>,

    /// Record the edit as a revision under this ticket.
    #[clap(long)]
    ticket: Option<String>,

    /// What changed, recorded with the revision.
    #[clap(long, requires = "ticket")]
    note: Option<String>,
}

impl Update {
    #[instrument]
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut workspace = Workspace::open_dir(root)?;
        let Some(definition) = workspace.find(&self.id) else {
            anyhow::bail!("Definition {} not found", self.id);
        };

        let mut content = definition.content.clone();
        let fields = [
            (self.name, &mut content.name),
            (self.module, &mut content.module),
            (self.description, &mut content.description),
            (self.technical_details, &mut content.technical_details),
            (self.examples, &mut content.examples),
            (self.usage, &mut content.usage),
        ];
        for (value, field) in fields {
            if let Some(value) = value {
                *field = value;
            }
        }
        if let Some(keywords) = self.keywords {
            content.keywords = keywords;
        }

        let edited = match self.ticket {
            Some(ticket) => {
                let note = workspace.revision_note(&ticket, self.note.as_deref().unwrap_or_default());
                workspace.update_with_revision(&self.id, content, note)?
            }
            None => workspace.update(&self.id, content)?,
        };
        workspace.flush()?;

        println!("{}", format!("Updated {}", edited.update.current.name()).success());
        if edited.notification.is_some() {
            println!("{}", "A notification was recorded for this bookmark".info());
        }
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Duplicate {
    /// The id of the definition to copy
    id: DefinitionId,
}

impl Duplicate {
    #[instrument]
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut workspace = Workspace::open_dir(root)?;
        let copy = workspace.duplicate(&self.id)?;
        workspace.flush()?;

        println!("Added definition {copy}");
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Archive {
    /// The ids of the definitions to archive
    #[arg(required = true)]
    ids: Vec<DefinitionId>,

    /// Restore instead of archiving
    #[arg(long)]
    restore: bool,
}

impl Archive {
    #[instrument]
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut workspace = Workspace::open_dir(root)?;
        let archived = !self.restore;

        let changed = if let [id] = self.ids.as_slice() {
            usize::from(workspace.archive(id, archived)?)
        } else {
            workspace.bulk_archive(&self.ids, archived)?
        };
        workspace.flush()?;

        let verb = if archived { "Archived" } else { "Restored" };
        println!("{}", format!("{verb} {changed} definition(s)").success());
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Delete {
    /// The id of the definition to delete
    id: DefinitionId,

    /// Skip confirmation prompts
    #[arg(long, short)]
    yes: bool,
}

impl Delete {
    #[instrument]
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut workspace = Workspace::open_dir(root)?;

        let Some(definition) = workspace.find(&self.id) else {
            anyhow::bail!("Definition {} not found", self.id);
        };

        if !self.yes {
            let descendants = defwiki::domain::hierarchy::flatten(&definition.children);
            println!("Will delete {}", definition.name());
            if !descendants.is_empty() {
                println!(
                    "{}",
                    format!("and {} definition(s) below it:", descendants.len()).warning()
                );
                for node in &descendants {
                    println!("  • {}", node.name());
                }
            }

            eprint!("\nProceed? (y/N) ");
            use std::io::{self, BufRead};
            let stdin = io::stdin();
            let mut line = String::new();
            stdin.lock().read_line(&mut line)?;
            if !line.trim().eq_ignore_ascii_case("y") {
                println!("Cancelled");
                std::process::exit(130);
            }
        }

        let deletion = workspace.delete(&self.id)?;
        workspace.flush()?;

        println!(
            "{}",
            format!("✅ Deleted {} definition(s)", deletion.removed.len()).success()
        );
        if deletion.unlinked_references > 0 {
            println!(
                "{}",
                format!(
                    "Removed {} reference(s) from related definitions",
                    deletion.unlinked_references
                )
                .dim()
            );
        }
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Bookmark {
    /// The id of the definition to bookmark or unbookmark
    id: DefinitionId,
}

impl Bookmark {
    #[instrument]
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut workspace = Workspace::open_dir(root)?;
        let bookmarked = workspace.toggle_bookmark(&self.id)?;
        workspace.flush()?;

        if bookmarked {
            println!("Bookmarked {}", self.id);
        } else {
            println!("Removed bookmark on {}", self.id);
        }
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Relate {
    /// The definition to edit
    id: DefinitionId,

    /// The definition to relate it to
    other: DefinitionId,

    /// Remove the relation instead
    #[arg(long)]
    remove: bool,
}

impl Relate {
    #[instrument]
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut workspace = Workspace::open_dir(root)?;

        let changed = if self.remove {
            workspace.unrelate(&self.id, &self.other)?
        } else {
            workspace.relate(&self.id, &self.other)?
        };
        workspace.flush()?;

        match (changed, self.remove) {
            (true, false) => println!("Related {} to {}", self.id, self.other),
            (true, true) => println!("Unrelated {} from {}", self.id, self.other),
            (false, false) => println!("{}", "Already related".dim()),
            (false, true) => println!("{}", "Not related".dim()),
        }
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Export {
    /// The ids of the definitions to export
    #[arg(required = true)]
    ids: Vec<DefinitionId>,

    /// Write to this file instead of standard output
    #[arg(long, short)]
    file: Option<PathBuf>,
}

impl Export {
    #[instrument]
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let workspace = Workspace::open_dir(root)?;
        let selection: BTreeSet<DefinitionId> = self.ids.into_iter().collect();

        let missing: Vec<_> = selection
            .iter()
            .filter(|id| workspace.find(id).is_none())
            .collect();
        for id in &missing {
            eprintln!("{}", format!("⚠️  Definition {id} not found").warning());
        }

        let selected = workspace.export(&selection);
        let json = serde_json::to_string_pretty(&selected).context("failed to render json output")?;

        match self.file {
            Some(path) => {
                std::fs::write(&path, json)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!("Exported {} definition(s) to {}", selected.len(), path.display());
            }
            None => println!("{json}"),
        }
        Ok(())
    }
}
