//! slotcast-queue - Manage the post queue and weekly schedule
//!
//! Unix-style tool for queueing posts, inspecting the queue, and editing
//! weekly availability slots.

use clap::{Parser, Subcommand};
use libslotcast::queue::enqueue_scheduled;
use libslotcast::schedule::{from_epoch, Weekday, WeeklySlot};
use libslotcast::{Config, Database, Platform, QueuedPost, Result, SlotcastError};
use std::str::FromStr;

#[derive(Parser, Debug)]
#[command(name = "slotcast-queue")]
#[command(version)]
#[command(about = "Manage the post queue and weekly schedule")]
#[command(long_about = "\
slotcast-queue - Manage the post queue and weekly schedule

DESCRIPTION:
    slotcast-queue is a Unix-style tool for managing the Slotcast post
    queue. Use it to queue posts against your weekly schedule, list pending
    and published posts, cancel queued posts, and edit your weekly slots.

    Queueing a post resolves its publication time from your weekly slots at
    that moment; the post then waits in the queue until slotcast-dispatch
    delivers it.

COMMANDS:
    add     Queue a post for the next available slot
    list    List a user's pending and published posts
    cancel  Cancel a queued post
    slots   Manage weekly availability slots

USAGE EXAMPLES:
    # Queue a post for alice's next Mastodon slot
    slotcast-queue add --user alice --platform mastodon \\
        --title \"Release notes\" --body \"Version 0.2 is out.\"

    # List alice's queue
    slotcast-queue list --user alice

    # List in JSON format
    slotcast-queue list --user alice --format json

    # Cancel a queued post
    slotcast-queue cancel <POST_ID>

    # Add a weekly slot: Wednesdays at 14:00
    slotcast-queue slots add --user alice wed 14:00

    # List and remove slots
    slotcast-queue slots list --user alice
    slotcast-queue slots remove <SLOT_ID>

CONFIGURATION:
    Configuration file: ~/.config/slotcast/config.toml
    Database location: ~/.local/share/slotcast/queue.db

    Override with environment variables:
        SLOTCAST_CONFIG - Path to config file

EXIT CODES:
    0 - Success
    1 - Operation failed
    2 - Database or configuration error
    3 - Invalid input (bad platform, weekday, time, or empty content)
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    #[arg(help = "Enable verbose logging to stderr (useful for debugging)")]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Queue a post for the next available slot
    Add {
        /// User the post belongs to
        #[arg(short, long)]
        user: String,

        /// Target platform: mastodon or linkedin
        #[arg(short, long)]
        platform: String,

        /// Post title
        #[arg(short, long)]
        title: String,

        /// Post body
        #[arg(short, long)]
        body: String,
    },

    /// List a user's pending and published posts
    List {
        /// User whose queue to show
        #[arg(short, long)]
        user: String,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Cancel a queued post
    Cancel {
        /// Post ID to cancel
        post_id: String,
    },

    /// Manage weekly availability slots
    Slots {
        #[command(subcommand)]
        command: SlotCommands,
    },
}

#[derive(Subcommand, Debug)]
enum SlotCommands {
    /// Add a weekly slot
    Add {
        /// User the slot belongs to
        #[arg(short, long)]
        user: String,

        /// Day of the week (mon, tue, ... or full name)
        day: String,

        /// Time of day, HH:MM
        time: String,
    },

    /// List a user's slots
    List {
        /// User whose slots to show
        #[arg(short, long)]
        user: String,
    },

    /// Remove a slot by ID
    Remove {
        /// Slot ID to remove
        slot_id: i64,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("error")
            .with_writer(std::io::stderr)
            .init();
    }

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let db = Database::new(&config.database.path).await?;

    match cli.command {
        Commands::Add {
            user,
            platform,
            title,
            body,
        } => cmd_add(&db, &user, &platform, &title, &body).await?,
        Commands::List { user, format } => cmd_list(&db, &user, &format).await?,
        Commands::Cancel { post_id } => cmd_cancel(&db, &post_id).await?,
        Commands::Slots { command } => match command {
            SlotCommands::Add { user, day, time } => cmd_slot_add(&db, &user, &day, &time).await?,
            SlotCommands::List { user } => cmd_slot_list(&db, &user).await?,
            SlotCommands::Remove { slot_id } => cmd_slot_remove(&db, slot_id).await?,
        },
    }

    Ok(())
}

async fn cmd_add(db: &Database, user: &str, platform: &str, title: &str, body: &str) -> Result<()> {
    let platform = Platform::from_str(platform).map_err(SlotcastError::InvalidInput)?;

    let now = chrono::Utc::now().naive_utc();
    let post = enqueue_scheduled(db, user, platform, title, body, now).await?;

    println!("Queued post {}", post.id);
    println!("  Platform:      {}", post.platform);
    println!("  Scheduled for: {} UTC", from_epoch(post.scheduled_at));

    Ok(())
}

async fn cmd_list(db: &Database, user: &str, format: &str) -> Result<()> {
    if format != "text" && format != "json" {
        return Err(SlotcastError::InvalidInput(format!(
            "Invalid format '{}'. Must be 'text' or 'json'",
            format
        )));
    }

    let queue = db.list_by_user(user).await?;

    if format == "json" {
        let json = serde_json::json!({
            "pending": queue.pending,
            "published": queue.published,
        });
        println!("{}", serde_json::to_string_pretty(&json).unwrap_or_default());
        return Ok(());
    }

    if queue.pending.is_empty() && queue.published.is_empty() {
        println!("No posts for user '{}'", user);
        return Ok(());
    }

    if !queue.pending.is_empty() {
        println!("Pending ({}):", queue.pending.len());
        for post in &queue.pending {
            print_post(post);
        }
    }

    if !queue.published.is_empty() {
        println!("Published ({}):", queue.published.len());
        for post in &queue.published {
            print_post(post);
        }
    }

    Ok(())
}

fn print_post(post: &QueuedPost) {
    println!(
        "  {}  {:9}  {} UTC  {}",
        post.id,
        post.platform.as_str(),
        from_epoch(post.scheduled_at),
        post.title
    );
}

async fn cmd_cancel(db: &Database, post_id: &str) -> Result<()> {
    if db.delete_post(post_id).await? {
        println!("Cancelled post {}", post_id);
        Ok(())
    } else {
        Err(SlotcastError::InvalidInput(format!(
            "No queued post with ID '{}' (already published posts cannot be cancelled)",
            post_id
        )))
    }
}

async fn cmd_slot_add(db: &Database, user: &str, day: &str, time: &str) -> Result<()> {
    let day = Weekday::from_str(day).map_err(SlotcastError::InvalidInput)?;
    let time = chrono::NaiveTime::parse_from_str(time, "%H:%M").map_err(|_| {
        SlotcastError::InvalidInput(format!("Invalid time '{}'. Expected HH:MM", time))
    })?;

    let slot_id = db.add_slot(&WeeklySlot::new(user, day, time)).await?;
    println!(
        "Added slot {}: {} at {}",
        slot_id,
        day,
        time.format("%H:%M")
    );

    Ok(())
}

async fn cmd_slot_list(db: &Database, user: &str) -> Result<()> {
    let slots = db.list_slots(user).await?;

    if slots.is_empty() {
        println!("No slots for user '{}'", user);
        return Ok(());
    }

    for slot in &slots {
        println!(
            "  {}  {} at {}",
            slot.id.unwrap_or_default(),
            slot.day,
            slot.time.format("%H:%M")
        );
    }

    Ok(())
}

async fn cmd_slot_remove(db: &Database, slot_id: i64) -> Result<()> {
    if db.delete_slot(slot_id).await? {
        println!("Removed slot {}", slot_id);
        Ok(())
    } else {
        Err(SlotcastError::InvalidInput(format!(
            "No slot with ID {}",
            slot_id
        )))
    }
}
