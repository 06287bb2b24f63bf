pub mod borrow_workflow;
pub mod flagging;
pub mod notifier;
pub mod suspension;
pub mod trust_score;

pub use borrow_workflow::{ActionParams, BorrowService, CreateBorrowInput};
pub use flagging::FlaggingSummary;
pub use notifier::{BorrowEvent, NoopNotifier, NotificationDispatcher, WebhookNotifier};
pub use suspension::{SuspensionPolicy, SuspensionSummary};

use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::db::Store;
use crate::error::Result;
use crate::models::{default_rules, FlaggingRule, NewUser};

/// Trust & safety service: trust scoring, automated flagging and the
/// auto-suspension policy. One instance per process, explicitly constructed
/// and handed to its consumers.
pub struct TrustSafetyService {
    store: Arc<dyn Store>,
    rules: RwLock<Vec<FlaggingRule>>,
    system_reporter_id: Uuid,
    policy: SuspensionPolicy,
}

impl TrustSafetyService {
    /// Build the service, provisioning the system reporter identity if it
    /// does not exist yet. Automated reports and admin actions are attributed
    /// to this identity.
    pub async fn bootstrap(
        store: Arc<dyn Store>,
        reporter_email: &str,
        policy: SuspensionPolicy,
    ) -> Result<Self> {
        let reporter = match store.find_user_by_email(reporter_email).await? {
            Some(user) => user,
            None => {
                let user = store
                    .create_user(NewUser {
                        email: reporter_email.to_string(),
                        display_name: Some("StuffLibrary System".to_string()),
                    })
                    .await?;
                tracing::info!(
                    reporter_id = %user.id,
                    email = %reporter_email,
                    "System reporter provisioned"
                );
                user
            }
        };

        Ok(Self {
            store,
            rules: RwLock::new(default_rules()),
            system_reporter_id: reporter.id,
            policy,
        })
    }

    pub fn system_reporter_id(&self) -> Uuid {
        self.system_reporter_id
    }
}
