use clap::{Parser, Subcommand};

/// Courier — messaging & notification engine for the marketplace
#[derive(Parser)]
#[command(name = "courier", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the engine server
    Serve {
        /// Port to bind
        #[arg(short, long, default_value = "8088")]
        port: u16,
    },

    /// Show a user's inbox badge (global unread + per-conversation counts)
    Unread {
        #[arg(long)]
        user_id: String,
    },

    /// Send a manual notification to a user (operator escape hatch)
    Notify {
        #[arg(long)]
        user_id: String,
        /// One of: new_message, new_follower, new_listing, new_review, price_drop
        #[arg(long, default_value = "new_listing")]
        kind: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        body: Option<String>,
        #[arg(long)]
        link: Option<String>,
    },
}
