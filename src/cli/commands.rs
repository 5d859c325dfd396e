use clap::Subcommand;

#[derive(Subcommand)]
pub enum RepoCommands {
    /// Create a repository (and its main branch)
    Create {
        /// Repository name
        name: String,

        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List repositories, most recently pushed first
    List {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a repository with its branches and commit count
    Show {
        /// Repository ID
        id: String,

        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
