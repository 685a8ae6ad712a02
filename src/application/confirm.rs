//! Confirmation gate for irreversible actions.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

/// What the user is asked before an irreversible action runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub title: String,
    pub body: String,
    pub confirm_label: String,
    pub cancel_label: String,
}

impl Confirmation {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            confirm_label: "Confirm".into(),
            cancel_label: "Cancel".into(),
        }
    }

    pub fn with_labels(mut self, confirm: impl Into<String>, cancel: impl Into<String>) -> Self {
        self.confirm_label = confirm.into();
        self.cancel_label = cancel.into();
        self
    }

    pub fn delete_post() -> Self {
        Self::new(
            "Confirm delete",
            "Are you sure you want to delete this post?",
        )
        .with_labels("Delete", "Cancel")
    }

    pub fn logout() -> Self {
        Self::new("Confirm logout", "Are you sure you want to logout?")
            .with_labels("Logout", "Cancel")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Confirmed,
    Cancelled,
}

/// Presents a [`Confirmation`] and reports the user's answer.
///
/// Implementations treat any failure to obtain an answer as
/// [`Decision::Cancelled`].
#[async_trait]
pub trait Prompter: Send + Sync {
    async fn ask(&self, confirmation: &Confirmation) -> Decision;
}

/// Answers every confirmation affirmatively (`--yes`).
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

#[async_trait]
impl Prompter for AssumeYes {
    async fn ask(&self, _confirmation: &Confirmation) -> Decision {
        Decision::Confirmed
    }
}

/// Result of running an action behind the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gated<T> {
    Confirmed(T),
    Cancelled,
}

impl<T> Gated<T> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[derive(Clone)]
pub struct ConfirmationGate {
    prompter: Arc<dyn Prompter>,
}

impl ConfirmationGate {
    pub fn new(prompter: Arc<dyn Prompter>) -> Self {
        Self { prompter }
    }

    /// Ask first; run `action` exactly once only if confirmed.
    pub async fn run<F, Fut, T>(&self, confirmation: &Confirmation, action: F) -> Gated<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        match self.prompter.ask(confirmation).await {
            Decision::Confirmed => Gated::Confirmed(action().await),
            Decision::Cancelled => {
                debug!(target = "folio::confirm", title = %confirmation.title, "cancelled");
                Gated::Cancelled
            }
        }
    }
}

impl std::fmt::Debug for ConfirmationGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfirmationGate").finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Replays a fixed answer and records every confirmation it was shown.
    #[derive(Debug)]
    pub struct ScriptedPrompter {
        answer: Decision,
        pub asked: Mutex<Vec<Confirmation>>,
    }

    impl ScriptedPrompter {
        pub fn new(answer: Decision) -> Arc<Self> {
            Arc::new(Self {
                answer,
                asked: Mutex::new(Vec::new()),
            })
        }

        pub fn asked(&self) -> Vec<Confirmation> {
            self.asked.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl Prompter for ScriptedPrompter {
        async fn ask(&self, confirmation: &Confirmation) -> Decision {
            self.asked.lock().expect("lock").push(confirmation.clone());
            self.answer
        }
    }
}
