use std::sync::Arc;

use crate::state::{AuthState, ScheduleState};
use crate::store::{ChangeFeed, StoreError, Subscription};

/// Reloads both managers whenever any collection changes.
///
/// Every notification triggers one full reload; frames are not inspected
/// and bursts are not coalesced.
pub struct RealtimeSync {
    subscription: Option<Subscription>,
}

impl RealtimeSync {
    pub async fn activate(
        feed: &ChangeFeed,
        schedule: Arc<ScheduleState>,
        auth: Arc<AuthState>,
    ) -> Result<Self, StoreError> {
        let subscription = feed
            .subscribe(move || {
                let schedule = Arc::clone(&schedule);
                let auth = Arc::clone(&auth);
                tokio::spawn(async move {
                    tokio::join!(schedule.load_data(), auth.refresh_users());
                });
            })
            .await?;

        tracing::info!("Realtime sync active");
        Ok(Self {
            subscription: Some(subscription),
        })
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn deactivate(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.unsubscribe();
            tracing::info!("Realtime sync stopped");
        }
    }
}
