use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "channelshop")]
#[command(author, version, about = "Telegram storefront bot with manual payment review", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the bot in normal mode
    Run {
        /// Use webhook mode instead of long polling
        #[arg(long)]
        webhook: bool,
    },

    /// Run the release trigger once and exit
    ReleaseCheck {
        /// Pretend today is this date (YYYY-MM-DD)
        #[arg(long)]
        today: Option<String>,
    },

    /// Print recent orders from the database
    Orders {
        /// Only orders in this status (pending, proof_received, approved, rejected, delivered)
        #[arg(short, long)]
        status: Option<String>,

        /// Maximum number of orders to print
        #[arg(short, long, default_value_t = 50)]
        limit: usize,

        /// Print JSON instead of one line per order
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_orders_subcommand() {
        let cli = Cli::try_parse_from(["channelshop", "orders", "--status", "approved", "--json"]).unwrap();
        match cli.command {
            Some(Commands::Orders { status, limit, json }) => {
                assert_eq!(status.as_deref(), Some("approved"));
                assert_eq!(limit, 50);
                assert!(json);
            }
            _ => panic!("expected orders subcommand"),
        }
    }

    #[test]
    fn no_subcommand_is_allowed() {
        let cli = Cli::try_parse_from(["channelshop"]).unwrap();
        assert!(cli.command.is_none());
    }
}
