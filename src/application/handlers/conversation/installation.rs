//! InstallationHandler - greets new installations.

use std::sync::Arc;

use crate::domain::activity::{Activity, ActivityId};
use crate::domain::conversation::ConversationAddress;
use crate::ports::{ConversationDirectory, TransportFactory};

use super::TurnError;

pub const WELCOME_TEXT: &str = "Welcome to this Teams bot!";

/// What happened on an installation update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallationOutcome {
    /// The bot was added; the welcome message has this id.
    Welcomed { activity_id: ActivityId },
    /// The bot was removed; the stored address was dropped if present.
    Forgotten { removed: bool },
}

/// Handles `installationUpdate` activities.
pub struct InstallationHandler {
    transports: Arc<dyn TransportFactory>,
    directory: Arc<dyn ConversationDirectory>,
}

impl InstallationHandler {
    pub fn new(
        transports: Arc<dyn TransportFactory>,
        directory: Arc<dyn ConversationDirectory>,
    ) -> Self {
        Self {
            transports,
            directory,
        }
    }

    /// Welcomes the conversation and stores its address.
    ///
    /// An uninstall (an action starting with `remove`) only forgets the stored address and
    /// sends nothing; the bot can no longer post there. A failed upsert is
    /// logged and still counts as welcomed.
    pub async fn handle(&self, activity: &Activity) -> Result<InstallationOutcome, TurnError> {
        let address = ConversationAddress::from_activity(activity)?;

        if activity.is_uninstall() {
            let removed = self.directory.remove(address.conversation_id()).await?;
            tracing::info!(
                conversation_id = %address.conversation_id(),
                removed,
                "Bot uninstalled"
            );
            return Ok(InstallationOutcome::Forgotten { removed });
        }

        let transport = self.transports.for_conversation(&address);
        let activity_id = transport.send(Activity::message(WELCOME_TEXT)).await?;

        if let Err(e) = self.directory.upsert(&address).await {
            tracing::warn!(
                conversation_id = %address.conversation_id(),
                error = %e,
                "Failed to store conversation address"
            );
        }

        Ok(InstallationOutcome::Welcomed { activity_id })
    }
}
