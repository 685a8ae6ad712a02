use std::sync::Arc;

use async_trait::async_trait;
use folio::application::confirm::{Confirmation, Decision, Prompter};
use tracing::warn;

use crate::io::Console;

/// Asks on the terminal; only an explicit yes confirms.
#[derive(Debug, Clone)]
pub struct TerminalPrompter {
    console: Arc<Console>,
}

impl TerminalPrompter {
    pub fn new(console: Arc<Console>) -> Self {
        Self { console }
    }
}

#[async_trait]
impl Prompter for TerminalPrompter {
    async fn ask(&self, confirmation: &Confirmation) -> Decision {
        let prompt = format!(
            "{}\n{}\n[{} = y / {} = N] ",
            confirmation.title,
            confirmation.body,
            confirmation.confirm_label,
            confirmation.cancel_label
        );
        match self.console.read_line(&prompt).await {
            Ok(Some(answer)) => parse_answer(&answer, confirmation),
            Ok(None) => Decision::Cancelled,
            Err(err) => {
                warn!(target = "folio::prompt", error = %err, "could not read answer");
                Decision::Cancelled
            }
        }
    }
}

pub(crate) fn parse_answer(answer: &str, confirmation: &Confirmation) -> Decision {
    let answer = answer.trim();
    if answer.eq_ignore_ascii_case("y")
        || answer.eq_ignore_ascii_case("yes")
        || answer.eq_ignore_ascii_case(&confirmation.confirm_label)
    {
        Decision::Confirmed
    } else {
        Decision::Cancelled
    }
}
