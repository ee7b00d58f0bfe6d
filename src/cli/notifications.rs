use std::path::PathBuf;

use clap::Parser;
use defwiki::Workspace;
use tracing::instrument;
use uuid::Uuid;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
#[command(about = "List or acknowledge change notifications")]
pub struct Notifications {
    /// Mark one notification as read
    #[arg(long, value_name = "ID", conflicts_with_all = ["all_read", "clear"])]
    read: Option<Uuid>,

    /// Mark every notification as read
    #[arg(long, conflicts_with = "clear")]
    all_read: bool,

    /// Remove every notification
    #[arg(long)]
    clear: bool,

    /// Only list unread notifications
    #[arg(long)]
    unread: bool,
}

impl Notifications {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut workspace = Workspace::open_dir(root)?;

        if let Some(id) = self.read {
            if !workspace.mark_read(id) {
                anyhow::bail!("Notification {id} not found");
            }
            workspace.flush()?;
            return Ok(());
        }

        if self.all_read {
            let count = workspace.mark_all_read();
            workspace.flush()?;
            println!("Marked {count} notification(s) as read");
            return Ok(());
        }

        if self.clear {
            workspace.clear_notifications();
            workspace.flush()?;
            println!("Cleared notifications");
            return Ok(());
        }

        let log = workspace.notifications();
        if log.is_empty() {
            println!("{}", "No notifications".dim());
            return Ok(());
        }

        println!(
            "{}",
            format!("{} unread of {}", log.unread_count(), log.len()).dim()
        );
        for notification in log.iter().filter(|n| !self.unread || !n.read) {
            let marker = if notification.read { " " } else { "●" };
            println!(
                "{} {} {}",
                marker.info(),
                notification.message,
                format!(
                    "{} {}",
                    notification.date.format("%Y-%m-%d %H:%M"),
                    notification.id
                )
                .dim()
            );
        }
        Ok(())
    }
}
