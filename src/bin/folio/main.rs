//! folio: terminal client for the portfolio post listing.

mod context;
mod handlers;
mod io;
mod print;
mod prompt;
mod view;

use std::process;
use std::sync::Arc;

use folio::{
    application::error::AppError,
    config::{self, Command},
    infra::telemetry,
};
use tracing::{Dispatch, Level, dispatcher, error};
use tracing_subscriber::fmt as tracing_fmt;

use context::Ctx;
use handlers::{account, posts};
use io::Console;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(std::io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging)?;

    let ctx = Ctx::from_settings(&settings, cli_args.yes, Arc::new(Console::stdin()))?;
    let mut out = std::io::stdout().lock();

    match cli_args.command {
        Command::Posts(args) => posts::handle(&ctx, args.command, &mut out).await,
        Command::Login(args) => account::login(&ctx, args, &mut out).await,
        Command::Register(args) => account::register(&ctx, args, &mut out).await,
        Command::Logout => account::logout(&ctx, &mut out).await,
        Command::Whoami => account::whoami(&ctx, &mut out),
    }
}
