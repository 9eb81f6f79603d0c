use clap::Subcommand;

#[derive(Subcommand)]
pub enum UserCommands {
    /// Add a new user
    Add {
        /// Data directory for the database and config file
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Username for the new user
        #[arg(long)]
        username: Option<String>,

        /// Skip interactive prompts (requires --username)
        #[arg(long)]
        non_interactive: bool,
    },

    /// List users
    List {
        /// Data directory for the database and config file
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum GroupCommands {
    /// Create a user group
    Create {
        /// Data directory for the database and config file
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Group name
        #[arg(long)]
        name: String,
    },

    /// List user groups
    List {
        /// Data directory for the database and config file
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove a user group (pages granted to it become creator-only)
    Remove {
        /// Data directory for the database and config file
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Group name (prompted when omitted)
        #[arg(long)]
        name: Option<String>,

        /// Skip confirmation prompt
        #[arg(long, short)]
        yes: bool,

        /// Skip interactive prompts (requires --yes)
        #[arg(long)]
        non_interactive: bool,
    },

    /// Add a user to a group
    AddMember {
        /// Data directory for the database and config file
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Group name
        #[arg(long)]
        group: String,

        /// Username to add
        #[arg(long)]
        user: String,
    },

    /// Remove a user from a group
    RemoveMember {
        /// Data directory for the database and config file
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Group name
        #[arg(long)]
        group: String,

        /// Username to remove
        #[arg(long)]
        user: String,
    },
}

#[derive(Subcommand)]
pub enum PageCommands {
    /// Create a page
    Create {
        /// Data directory for the database and config file
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Page path, e.g. /docs/intro
        path: String,

        /// Username of the creator
        #[arg(long)]
        creator: String,

        /// Grant: public, restricted, specified, owner or user-group
        #[arg(long, default_value = "public")]
        grant: String,

        /// Username allowed to view a restricted or specified page (repeatable)
        #[arg(long = "user")]
        users: Vec<String>,

        /// Group allowed to view a user-group page
        #[arg(long)]
        group: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a page as seen by a viewer
    Show {
        /// Data directory for the database and config file
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Page path
        path: String,

        /// View as this username (anonymous when omitted)
        #[arg(long = "as")]
        as_user: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List a page and its descendants as seen by a viewer
    List {
        /// Data directory for the database and config file
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Path prefix
        #[arg(default_value = "/")]
        prefix: String,

        /// View as this username (anonymous when omitted)
        #[arg(long = "as")]
        as_user: Option<String>,

        /// Treat the prefix as a partial regular expression
        #[arg(long)]
        start_with: bool,

        /// Do not escape the prefix when listing descendants
        #[arg(long)]
        regex: bool,

        /// Include pages in the trash
        #[arg(long)]
        include_trashed: bool,

        /// Maximum number of pages to return
        #[arg(long)]
        limit: Option<String>,

        /// Number of pages to skip
        #[arg(long)]
        offset: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Move a page into the trash
    Remove {
        /// Data directory for the database and config file
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Page path
        path: String,

        /// Also move every descendant
        #[arg(long, short)]
        recursive: bool,

        /// Skip confirmation prompt
        #[arg(long, short)]
        yes: bool,

        /// Skip interactive prompts (requires --yes)
        #[arg(long)]
        non_interactive: bool,
    },

    /// Move a trashed page back to its original path
    Revert {
        /// Data directory for the database and config file
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Trashed page path, e.g. /trash/docs/intro
        path: String,

        /// Also move every descendant
        #[arg(long, short)]
        recursive: bool,
    },

    /// Set one key of a page's extended data
    Extend {
        /// Data directory for the database and config file
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Page path
        path: String,

        /// Key to set
        #[arg(long)]
        key: String,

        /// JSON value (plain text is stored as a string)
        #[arg(long)]
        value: String,
    },

    /// Replace a page's grant
    Grant {
        /// Data directory for the database and config file
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Page path
        path: String,

        /// Grant: public, restricted, specified, owner or user-group
        #[arg(long)]
        grant: String,

        /// Username allowed to view a restricted or specified page (repeatable)
        #[arg(long = "user")]
        users: Vec<String>,

        /// Group allowed to view a user-group page
        #[arg(long)]
        group: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum PathCommands {
    /// Report whether a path may be created and deleted
    Check {
        /// Path to check
        path: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum BookmarkCommands {
    /// Bookmark a page for a user
    Add {
        /// Data directory for the database and config file
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Page path
        path: String,

        /// Username
        #[arg(long)]
        user: String,
    },

    /// Remove a bookmark
    Remove {
        /// Data directory for the database and config file
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Page path
        path: String,

        /// Username
        #[arg(long)]
        user: String,
    },

    /// List a user's bookmarks
    List {
        /// Data directory for the database and config file
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Username
        #[arg(long)]
        user: String,

        /// Maximum number of bookmarks to return
        #[arg(long)]
        limit: Option<String>,

        /// Number of bookmarks to skip
        #[arg(long)]
        offset: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
