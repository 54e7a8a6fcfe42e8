//! Assignment notifications.
//!
//! After a task write has committed, [`Notifier::notify_assignees`] emails every
//! user that is in the new assignee set but was not in the old one. Delivery is
//! best effort: failures are logged and counted, never returned to the caller.

pub mod mailer;

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{Task, User};
use crate::store::UserStore;

pub use mailer::{LogMailer, SmtpMailer};

/// A plain-text email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("could not build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("SMTP delivery failed: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
    #[error("mail transport unavailable: {0}")]
    Unavailable(String),
}

/// Outbound mail transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), MailError>;
}

/// Why a user is being notified; selects the wording of the email.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentEvent {
    /// The task was just created with the user among its assignees.
    Created,
    /// The user was added to an existing task.
    Added,
}

impl AssignmentEvent {
    fn compose(self, user: &User, task: &Task) -> Email {
        let description = task.description.as_deref().unwrap_or("");
        let (subject, body) = match self {
            AssignmentEvent::Created => (
                "New Task Assigned".to_string(),
                format!(
                    "You have been assigned a new task: {}\n\nTask Description: {}",
                    task.title, description
                ),
            ),
            AssignmentEvent::Added => (
                "You've been added to a task".to_string(),
                format!(
                    "Hello {},\n\nYou have been assigned a new task: {}\n\nTask Description: {}",
                    user.username, task.title, description
                ),
            ),
        };
        Email {
            to: user.email.clone(),
            subject,
            body,
        }
    }
}

/// Outcome of one notification batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub sent: usize,
    /// Ids that no longer resolve to a user.
    pub skipped: usize,
    pub failed: usize,
}

/// `after − before` by user id, in the order ids appear in `after`.
pub fn newly_assigned(before: &[Uuid], after: &[Uuid]) -> Vec<Uuid> {
    let previous: HashSet<&Uuid> = before.iter().collect();
    let mut seen = HashSet::new();
    after
        .iter()
        .filter(|id| !previous.contains(id) && seen.insert(**id))
        .copied()
        .collect()
}

#[derive(Clone)]
pub struct Notifier {
    mailer: Arc<dyn Mailer>,
    users: Arc<dyn UserStore>,
}

impl Notifier {
    pub fn new(mailer: Arc<dyn Mailer>, users: Arc<dyn UserStore>) -> Self {
        Self { mailer, users }
    }

    /// Sends one email per id in `recipients`, sequentially and in order.
    pub async fn notify_assignees(
        &self,
        task: &Task,
        recipients: &[Uuid],
        event: AssignmentEvent,
    ) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        for user_id in recipients {
            let user = match self.users.find_by_id(*user_id).await {
                Ok(Some(user)) => user,
                Ok(None) => {
                    log::warn!("Skipping notification for unknown user {}", user_id);
                    report.skipped += 1;
                    continue;
                }
                Err(e) => {
                    log::error!("Could not load user {} for notification: {}", user_id, e);
                    report.failed += 1;
                    continue;
                }
            };

            let email = event.compose(&user, task);
            match self.mailer.send(&email).await {
                Ok(()) => {
                    log::info!("Email sent successfully to {}", email.to);
                    report.sent += 1;
                }
                Err(e) => {
                    log::error!("Email sending error for {}: {}", email.to, e);
                    report.failed += 1;
                }
            }
        }

        report
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier").finish_non_exhaustive()
    }
}
