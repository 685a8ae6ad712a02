//! Plain-text rendering of the listing and profile views.

use std::fmt::{self, Write as _};

use folio::application::api::PostsApi;
use folio::application::error::AppError;
use folio::application::listing::{EMPTY_LISTING, FetchState, PostListController};
use folio::domain::claims::Claims;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub fn render_listing<A: PostsApi + ?Sized>(
    controller: &PostListController<A>,
) -> Result<String, AppError> {
    let mut out = String::new();
    write_listing(&mut out, controller).map_err(render_error)?;
    Ok(out)
}

fn write_listing<A: PostsApi + ?Sized>(
    out: &mut String,
    controller: &PostListController<A>,
) -> fmt::Result {
    let query = controller.query();

    writeln!(out, "Posts")?;
    writeln!(out, "location: {}", controller.location())?;
    if !query.contents_filter.is_empty() {
        writeln!(out, "filter: {}", query.contents_filter)?;
    }
    if let Some(banner) = controller.banner() {
        writeln!(out, "error: {banner}")?;
    }
    if controller.state().is_loading() {
        writeln!(out, "loading…")?;
    }

    for row in controller.rows() {
        let mut actions = Vec::new();
        if row.actions.edit {
            actions.push("edit");
        }
        if row.actions.delete {
            actions.push("delete");
        }
        write!(out, "\n* {} by {}", row.post.id, row.post.account_name)?;
        if !actions.is_empty() {
            write!(out, "  [{}]", actions.join(", "))?;
        }
        writeln!(out)?;
        for line in row.post.contents.lines() {
            writeln!(out, "    {line}")?;
        }
    }

    if controller.is_empty() {
        writeln!(out, "\n{EMPTY_LISTING}")?;
    }

    let total = controller.page_total();
    if total > 0 && !matches!(controller.state(), FetchState::Idle) {
        writeln!(out, "\npage {} of {}", query.page, total)?;
    }
    if controller.can_create() {
        writeln!(out, "new post: folio posts create --contents <HTML>")?;
    }
    Ok(())
}

pub fn render_profile(claims: Option<&Claims>, now: OffsetDateTime) -> Result<String, AppError> {
    let mut out = String::new();
    write_profile(&mut out, claims, now).map_err(render_error)?;
    Ok(out)
}

fn write_profile(out: &mut String, claims: Option<&Claims>, now: OffsetDateTime) -> fmt::Result {
    let default = Claims::default();
    let claims = claims.unwrap_or(&default);
    writeln!(out, "{}", claims.display_name())?;
    writeln!(out, "{}", claims.display_email())?;
    if let Some(subject) = claims.subject.as_deref() {
        writeln!(out, "account: {subject}")?;
    }
    if let Some(expires_at) = claims.expires_at {
        let stamp = expires_at
            .format(&Rfc3339)
            .unwrap_or_else(|_| expires_at.unix_timestamp().to_string());
        let status = if claims.is_expired_at(now) {
            "expired"
        } else {
            "expires"
        };
        writeln!(out, "{status}: {stamp}")?;
    }
    Ok(())
}

fn render_error(err: fmt::Error) -> AppError {
    AppError::unexpected(format!("failed to render view: {err}"))
}

pub const BROWSE_HELP: &str = "\
commands:
  next | prev          move one page
  page N               jump to page N
  type TEXT            stage search text without submitting
  search [TEXT]        submit search (staged text when TEXT is omitted)
  back | forward       walk navigation history
  reload               fetch the current location again
  delete ID            delete a post you own
  dismiss              hide the error banner
  help | quit
";
