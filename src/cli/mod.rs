use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Send a single message and print the reply
    Ask {
        message: String,

        /// Print the reply as it is generated
        #[arg(short, long)]
        stream: bool,

        /// Append this turn to the --history file
        #[arg(long)]
        save: bool,
    },

    /// Chat interactively; type /history to show the transcript, /exit to quit
    Repl {
        /// Write the transcript back to the --history file on exit
        #[arg(long)]
        save: bool,
    },
}
