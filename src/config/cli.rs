use std::{num::NonZeroU32, path::PathBuf};

use clap::{ArgGroup, Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};
use url::Url;
use uuid::Uuid;

/// Command-line arguments for the `folio` binary.
#[derive(Debug, Parser)]
#[command(name = "folio", version, about = "Browse and manage portfolio posts")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "FOLIO_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: GlobalOverrides,

    /// Answer every confirmation prompt with yes.
    #[arg(long, short = 'y', global = true, action = clap::ArgAction::SetTrue)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args, Default, Clone)]
pub struct GlobalOverrides {
    /// Override the site base URL (the API lives under `/api`).
    #[arg(long = "site", env = "FOLIO_SITE_URL", value_name = "URL", global = true)]
    pub site: Option<Url>,

    /// Override where the session token is persisted.
    #[arg(
        long = "token-file",
        env = "FOLIO_TOKEN_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath,
        global = true
    )]
    pub token_file: Option<PathBuf>,

    /// Override the default number of posts per page.
    #[arg(long = "page-size", value_name = "COUNT", global = true)]
    pub page_size: Option<u32>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Post listing and editing.
    Posts(PostsArgs),
    /// Sign in and store the session token.
    Login(LoginArgs),
    /// Create a new account.
    Register(RegisterArgs),
    /// Forget the stored session token.
    Logout,
    /// Show the signed-in profile.
    Whoami,
}

#[derive(Debug, Args, Clone)]
pub struct PostsArgs {
    #[command(subcommand)]
    pub command: PostsCommand,
}

#[derive(Debug, Subcommand, Clone)]
pub enum PostsCommand {
    /// Render one listing view.
    List(ListArgs),
    /// Interactive listing session.
    Browse(BrowseArgs),
    /// Print a post's contents.
    Show(ShowArgs),
    /// Create a post.
    Create(CreateArgs),
    /// Replace a post's contents.
    Edit(EditArgs),
    /// Delete a post after confirmation.
    Delete(DeleteArgs),
}

#[derive(Debug, Args, Clone, Default)]
pub struct ListArgs {
    /// Starting location, e.g. `/posts?page=2&contents=rust`.
    #[arg(long, value_name = "LOCATION")]
    pub location: Option<String>,

    /// Page to show (applied on top of --location).
    #[arg(long, value_name = "N")]
    pub page: Option<NonZeroU32>,

    /// Contents filter (applied on top of --location).
    #[arg(long, value_name = "TEXT")]
    pub filter: Option<String>,
}

#[derive(Debug, Args, Clone, Default)]
pub struct BrowseArgs {
    /// Starting location, e.g. `/posts?page=2`.
    #[arg(long, value_name = "LOCATION")]
    pub location: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    pub id: Uuid,
}

#[derive(Debug, Args, Clone)]
#[command(group(ArgGroup::new("source").required(true).args(["contents", "contents_file"])))]
pub struct ContentsSource {
    /// Post body (HTML).
    #[arg(long, value_name = "HTML")]
    pub contents: Option<String>,

    /// Read the post body from a file.
    #[arg(long = "contents-file", value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub contents_file: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct CreateArgs {
    #[command(flatten)]
    pub source: ContentsSource,
}

#[derive(Debug, Args, Clone)]
pub struct EditArgs {
    pub id: Uuid,

    #[command(flatten)]
    pub source: ContentsSource,
}

#[derive(Debug, Args, Clone)]
pub struct DeleteArgs {
    pub id: Uuid,
}

#[derive(Debug, Args, Clone)]
pub struct LoginArgs {
    #[arg(long, value_name = "EMAIL")]
    pub email: String,

    /// Password; read from stdin when absent.
    #[arg(long, env = "FOLIO_PASSWORD", hide_env_values = true, value_name = "PASSWORD")]
    pub password: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct RegisterArgs {
    #[arg(long, value_name = "NAME")]
    pub name: String,

    #[arg(long, value_name = "EMAIL")]
    pub email: String,

    /// Password; read from stdin when absent.
    #[arg(long, env = "FOLIO_PASSWORD", hide_env_values = true, value_name = "PASSWORD")]
    pub password: Option<String>,
}
