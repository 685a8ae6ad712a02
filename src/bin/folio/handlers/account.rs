use std::io::Write;

use folio::application::error::AppError;
use folio::config::{LoginArgs, RegisterArgs};
use time::OffsetDateTime;

use crate::context::Ctx;
use crate::io::{emit, read_password};
use crate::print::print_json;
use crate::view::render_profile;

pub async fn login(ctx: &Ctx, args: LoginArgs, out: &mut impl Write) -> Result<(), AppError> {
    let password = read_password(&ctx.console, args.password).await?;
    let identity = ctx.accounts().login(&args.email, &password).await?;
    emit(out, "signed in\n")?;
    emit(
        out,
        &render_profile(identity.claims(), OffsetDateTime::now_utc())?,
    )
}

pub async fn register(ctx: &Ctx, args: RegisterArgs, out: &mut impl Write) -> Result<(), AppError> {
    let password = read_password(&ctx.console, args.password).await?;
    let created = ctx
        .accounts()
        .register(&args.name, &args.email, &password)
        .await?;
    print_json(out, &created)
}

pub async fn logout(ctx: &Ctx, out: &mut impl Write) -> Result<(), AppError> {
    if !ctx.auth.is_signed_in() {
        return emit(out, "not signed in\n");
    }
    let outcome = ctx.accounts().logout(&ctx.gate).await?;
    if outcome.is_cancelled() {
        emit(out, "cancelled\n")
    } else {
        emit(out, "signed out\n")
    }
}

pub fn whoami(ctx: &Ctx, out: &mut impl Write) -> Result<(), AppError> {
    let Some(identity) = ctx.auth.current() else {
        return emit(out, "not signed in\n");
    };
    emit(
        out,
        &render_profile(identity.claims(), OffsetDateTime::now_utc())?,
    )
}
