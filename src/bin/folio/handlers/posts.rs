use std::io::Write;
use std::num::NonZeroU32;

use folio::application::error::AppError;
use folio::application::listing::{DELETE_FAILURE, DeleteOutcome, FetchState, PostListController};
use folio::config::{BrowseArgs, ContentsSource, ListArgs, PostsCommand};
use folio::domain::query::Location;
use folio::infra::http::ApiClient;
use tracing::debug;
use uuid::Uuid;

use crate::context::Ctx;
use crate::io::{emit, read_value};
use crate::print::print_json;
use crate::view::{BROWSE_HELP, render_listing};

pub async fn handle(ctx: &Ctx, cmd: PostsCommand, out: &mut impl Write) -> Result<(), AppError> {
    match cmd {
        PostsCommand::List(args) => list(ctx, args, out).await,
        PostsCommand::Browse(args) => browse(ctx, args, out).await,
        PostsCommand::Show(args) => show(ctx, args.id, out).await,
        PostsCommand::Create(args) => create(ctx, args.source, out).await,
        PostsCommand::Edit(args) => edit(ctx, args.id, args.source, out).await,
        PostsCommand::Delete(args) => delete(ctx, args.id, out).await,
    }
}

fn start_location(raw: Option<String>) -> Location {
    raw.map(Location::new).unwrap_or_default()
}

fn listing_result(controller: &PostListController<ApiClient>) -> Result<(), AppError> {
    match controller.state() {
        FetchState::Error(message) => Err(AppError::Listing(message.clone())),
        _ => Ok(()),
    }
}

async fn list(ctx: &Ctx, args: ListArgs, out: &mut impl Write) -> Result<(), AppError> {
    let mut query = ctx.open_query(start_location(args.location));
    if let Some(filter) = args.filter {
        query.submit_filter(filter);
    }
    if let Some(page) = args.page {
        query.set_page(page);
    }

    let mut controller = ctx.controller(query);
    controller.refresh().await;
    emit(out, &render_listing(&controller)?)?;
    listing_result(&controller)
}

async fn show_listing_at(ctx: &Ctx, location: Location, out: &mut impl Write) -> Result<(), AppError> {
    let mut controller = ctx.controller(ctx.open_query(location));
    controller.refresh().await;
    emit(out, &render_listing(&controller)?)
}

async fn show(ctx: &Ctx, id: Uuid, out: &mut impl Write) -> Result<(), AppError> {
    let contents = ctx.editor().load(id).await?;
    emit(out, &format!("{contents}\n"))
}

async fn create(ctx: &Ctx, source: ContentsSource, out: &mut impl Write) -> Result<(), AppError> {
    let contents = read_value(source.contents, source.contents_file)?;
    let saved = ctx.editor().create(&contents).await?;
    print_json(out, &saved.response)?;
    show_listing_at(ctx, saved.next, out).await
}

async fn edit(
    ctx: &Ctx,
    id: Uuid,
    source: ContentsSource,
    out: &mut impl Write,
) -> Result<(), AppError> {
    let contents = read_value(source.contents, source.contents_file)?;
    let editor = ctx.editor();
    let previous = editor.load(id).await?;
    debug!(target = "folio::cli", post = %id, bytes = previous.len(), "loaded post for edit");
    let saved = editor.save(id, &contents).await?;
    print_json(out, &saved.response)?;
    show_listing_at(ctx, saved.next, out).await
}

async fn delete(ctx: &Ctx, id: Uuid, out: &mut impl Write) -> Result<(), AppError> {
    let mut controller = ctx.controller(ctx.open_query(Location::posts()));
    match controller.delete_post(&ctx.gate, id).await {
        DeleteOutcome::Deleted => {
            emit(out, &format!("deleted {id}\n"))?;
            emit(out, &render_listing(&controller)?)?;
            listing_result(&controller)
        }
        DeleteOutcome::Cancelled => emit(out, "cancelled\n"),
        DeleteOutcome::Failed => Err(AppError::Listing(
            controller
                .banner()
                .unwrap_or(DELETE_FAILURE)
                .to_string(),
        )),
    }
}

/// One line of input in the interactive listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseCommand {
    Next,
    Prev,
    Page(NonZeroU32),
    Type(String),
    Search(Option<String>),
    Back,
    Forward,
    Reload,
    Delete(Uuid),
    Dismiss,
    Help,
    Quit,
    Nothing,
}

impl BrowseCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(word, rest)| (word, rest.trim()));

        let command = match word.to_ascii_lowercase().as_str() {
            "" => Self::Nothing,
            "next" | "n" => Self::Next,
            "prev" | "p" => Self::Prev,
            "page" => {
                let page = rest
                    .parse::<NonZeroU32>()
                    .map_err(|_| format!("not a page number: `{rest}`"))?;
                Self::Page(page)
            }
            "type" => Self::Type(rest.to_string()),
            "search" | "s" => Self::Search((!rest.is_empty()).then(|| rest.to_string())),
            "back" => Self::Back,
            "forward" => Self::Forward,
            "reload" | "r" => Self::Reload,
            "delete" => {
                let id = Uuid::parse_str(rest).map_err(|_| format!("not a post id: `{rest}`"))?;
                Self::Delete(id)
            }
            "dismiss" => Self::Dismiss,
            "help" | "?" => Self::Help,
            "quit" | "q" | "exit" => Self::Quit,
            other => return Err(format!("unknown command `{other}`")),
        };
        Ok(command)
    }
}

async fn browse(ctx: &Ctx, args: BrowseArgs, out: &mut impl Write) -> Result<(), AppError> {
    let mut controller = ctx.controller(ctx.open_query(start_location(args.location)));
    controller.refresh().await;
    emit(out, &render_listing(&controller)?)?;

    while let Some(line) = ctx.console.read_line("folio> ").await? {
        let command = match BrowseCommand::parse(&line) {
            Ok(command) => command,
            Err(message) => {
                emit(out, &format!("{message}\n{BROWSE_HELP}"))?;
                continue;
            }
        };
        match command {
            BrowseCommand::Quit => break,
            BrowseCommand::Nothing => continue,
            _ => {}
        }
        if let Some(note) = apply(ctx, &mut controller, command).await {
            emit(out, &format!("{note}\n"))?;
            continue;
        }
        emit(out, &render_listing(&controller)?)?;
    }
    Ok(())
}

/// Apply a command. Returns a note to print instead of re-rendering the view.
async fn apply(
    ctx: &Ctx,
    controller: &mut PostListController<ApiClient>,
    command: BrowseCommand,
) -> Option<String> {
    let page = controller.query().page;
    match command {
        BrowseCommand::Next => match page.checked_add(1) {
            Some(next) if next.get() <= controller.page_total() => controller.set_page(next).await,
            _ => return Some("already on the last page".into()),
        },
        BrowseCommand::Prev => match NonZeroU32::new(page.get() - 1) {
            Some(prev) => controller.set_page(prev).await,
            None => return Some("already on the first page".into()),
        },
        BrowseCommand::Page(target) => controller.set_page(target).await,
        BrowseCommand::Type(text) => {
            controller.search_mut().set(text);
            return Some(format!("search staged: `{}`", controller.search().value()));
        }
        BrowseCommand::Search(text) => {
            if let Some(text) = text {
                controller.search_mut().set(text);
            }
            controller.submit_search().await;
        }
        BrowseCommand::Back => {
            if !controller.back().await {
                return Some("no earlier location".into());
            }
        }
        BrowseCommand::Forward => {
            if !controller.forward().await {
                return Some("no later location".into());
            }
        }
        BrowseCommand::Reload => controller.reload().await,
        BrowseCommand::Delete(id) => {
            if controller.delete_post(&ctx.gate, id).await == DeleteOutcome::Cancelled {
                return Some("cancelled".into());
            }
        }
        BrowseCommand::Dismiss => controller.dismiss_banner(),
        BrowseCommand::Help => return Some(BROWSE_HELP.trim_end().to_string()),
        BrowseCommand::Nothing | BrowseCommand::Quit => {}
    }
    None
}
