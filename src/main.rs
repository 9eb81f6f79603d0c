use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pagewarden::cli::{
    BookmarkCommands, GroupCommands, PageCommands, PathCommands, UserCommands, run_bookmark_add,
    run_bookmark_list, run_bookmark_remove, run_group_add_member, run_group_create,
    run_group_list, run_group_remove, run_group_remove_member, run_init, run_page_create,
    run_page_extend, run_page_grant, run_page_list, run_page_remove, run_page_revert,
    run_page_show, run_path_check, run_user_add, run_user_list,
};

#[derive(Parser)]
#[command(name = "pagewarden")]
#[command(about = "Wiki page access control and hierarchy admin tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and a default config file
    Init {
        /// Data directory for the database and config file
        #[arg(long, default_value = "./data")]
        data_dir: String,
    },

    /// Manage users
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Manage user groups
    Group {
        #[command(subcommand)]
        command: GroupCommands,
    },

    /// Create, list and move pages
    Page {
        #[command(subcommand)]
        command: PageCommands,
    },

    /// Check page paths against the naming rules
    Path {
        #[command(subcommand)]
        command: PathCommands,
    },

    /// Manage bookmarks
    Bookmark {
        #[command(subcommand)]
        command: BookmarkCommands,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("pagewarden=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { data_dir } => run_init(data_dir)?,
        Commands::User { command } => match command {
            UserCommands::Add {
                data_dir,
                username,
                non_interactive,
            } => run_user_add(data_dir, username, non_interactive)?,
            UserCommands::List { data_dir, json } => run_user_list(data_dir, json)?,
        },
        Commands::Group { command } => match command {
            GroupCommands::Create { data_dir, name } => run_group_create(data_dir, name)?,
            GroupCommands::List { data_dir, json } => run_group_list(data_dir, json)?,
            GroupCommands::Remove {
                data_dir,
                name,
                yes,
                non_interactive,
            } => run_group_remove(data_dir, name, yes, non_interactive)?,
            GroupCommands::AddMember {
                data_dir,
                group,
                user,
            } => run_group_add_member(data_dir, group, user)?,
            GroupCommands::RemoveMember {
                data_dir,
                group,
                user,
            } => run_group_remove_member(data_dir, group, user)?,
        },
        Commands::Page { command } => match command {
            PageCommands::Create {
                data_dir,
                path,
                creator,
                grant,
                users,
                group,
                json,
            } => run_page_create(data_dir, path, creator, grant, users, group, json)?,
            PageCommands::Show {
                data_dir,
                path,
                as_user,
                json,
            } => run_page_show(data_dir, path, as_user, json)?,
            PageCommands::List {
                data_dir,
                prefix,
                as_user,
                start_with,
                regex,
                include_trashed,
                limit,
                offset,
                json,
            } => run_page_list(
                data_dir,
                prefix,
                as_user,
                start_with,
                regex,
                include_trashed,
                limit,
                offset,
                json,
            )?,
            PageCommands::Remove {
                data_dir,
                path,
                recursive,
                yes,
                non_interactive,
            } => run_page_remove(data_dir, path, recursive, yes, non_interactive)?,
            PageCommands::Revert {
                data_dir,
                path,
                recursive,
            } => run_page_revert(data_dir, path, recursive)?,
            PageCommands::Extend {
                data_dir,
                path,
                key,
                value,
            } => run_page_extend(data_dir, path, key, value)?,
            PageCommands::Grant {
                data_dir,
                path,
                grant,
                users,
                group,
            } => run_page_grant(data_dir, path, grant, users, group)?,
        },
        Commands::Path { command } => match command {
            PathCommands::Check { path, json } => run_path_check(path, json)?,
        },
        Commands::Bookmark { command } => match command {
            BookmarkCommands::Add {
                data_dir,
                path,
                user,
            } => run_bookmark_add(data_dir, path, user)?,
            BookmarkCommands::Remove {
                data_dir,
                path,
                user,
            } => run_bookmark_remove(data_dir, path, user)?,
            BookmarkCommands::List {
                data_dir,
                user,
                limit,
                offset,
                json,
            } => run_bookmark_list(data_dir, user, limit, offset, json)?,
        },
    }

    Ok(())
}
