use chrono::Utc;
use std::collections::{BTreeMap, HashSet};
use tokio::sync::{watch, RwLock};

use crate::error::{Error, Result};
use crate::models::{normalize_month, DayRecord, Nurse, ScheduleKey, ScheduleRow};
use crate::store::{Filter, StoreClient};

/// Point-in-time view of the roster and every loaded month.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleSnapshot {
    pub nurses: Vec<Nurse>,
    pub schedule: BTreeMap<ScheduleKey, Vec<DayRecord>>,
    pub is_loading: bool,
    pub last_error: Option<String>,
}

/// Roster and monthly schedules mirrored from `nurses` and `schedules`.
pub struct ScheduleState {
    store: StoreClient,
    inner: RwLock<ScheduleSnapshot>,
    loads: watch::Sender<u64>,
}

impl ScheduleState {
    pub fn new(store: StoreClient) -> Self {
        let (loads, _) = watch::channel(0);
        Self {
            store,
            inner: RwLock::new(ScheduleSnapshot::default()),
            loads,
        }
    }

    pub async fn snapshot(&self) -> ScheduleSnapshot {
        self.inner.read().await.clone()
    }

    pub async fn nurses(&self) -> Vec<Nurse> {
        self.inner.read().await.nurses.clone()
    }

    /// Revision bumped after every `load_data`, successful or not.
    pub fn watch_loads(&self) -> watch::Receiver<u64> {
        self.loads.subscribe()
    }

    /// Days of one staff member's month, padded or cut to the month length.
    pub async fn month(&self, staff_id: &str, year: i32, month: u32) -> Vec<DayRecord> {
        let key = ScheduleKey {
            year,
            month,
            staff_id: staff_id.to_string(),
        };
        let days = self
            .inner
            .read()
            .await
            .schedule
            .get(&key)
            .cloned()
            .unwrap_or_default();
        normalize_month(days, year, month)
    }

    /// One day (1-based); the default record when nothing is stored.
    pub async fn day(&self, staff_id: &str, year: i32, month: u32, day: u32) -> DayRecord {
        let days = self.month(staff_id, year, month).await;
        day.checked_sub(1)
            .and_then(|index| days.into_iter().nth(index as usize))
            .unwrap_or_default()
    }

    async fn begin(&self) {
        let mut state = self.inner.write().await;
        state.is_loading = true;
        state.last_error = None;
    }

    async fn fail(&self, context: &str, error: Error) -> Error {
        tracing::warn!("{}: {}", context, error);
        let mut state = self.inner.write().await;
        state.is_loading = false;
        state.last_error = Some(format!("{}: {}", context, error));
        error
    }

    /// Replaces the whole mirror with a fresh read of both collections.
    ///
    /// Schedule rows whose staff id is not on the roster are left out.
    /// Failures are recorded in `last_error` and the previous state is kept.
    pub async fn load_data(&self) {
        self.begin().await;

        let result = tokio::try_join!(
            self.store.list_all::<Nurse>(Some("name")),
            self.store.list_all::<ScheduleRow>(None),
        );

        {
            let mut state = self.inner.write().await;
            state.is_loading = false;

            match result {
                Ok((nurses, rows)) => {
                    let schedule = {
                        let roster: HashSet<&str> = nurses.iter().map(|n| n.id.as_str()).collect();
                        let total = rows.len();
                        let schedule: BTreeMap<_, _> = rows
                            .into_iter()
                            .filter(|row| roster.contains(row.staff_id.as_str()))
                            .map(|row| (row.schedule_key(), row.schedule))
                            .collect();
                        if schedule.len() < total {
                            tracing::debug!(
                                "Ignored {} orphaned schedule row(s)",
                                total - schedule.len()
                            );
                        }
                        schedule
                    };
                    tracing::debug!(
                        "Loaded {} nurse(s) and {} schedule(s)",
                        nurses.len(),
                        schedule.len()
                    );
                    state.nurses = nurses;
                    state.schedule = schedule;
                }
                Err(e) => {
                    tracing::warn!("Failed to load data: {}", e);
                    state.last_error = Some(format!("Failed to load data: {}", e));
                }
            }
        }

        self.loads.send_modify(|revision| *revision += 1);
    }

    /// Inserts a nurse, then appends it locally.
    pub async fn add_nurse(&self, nurse: Nurse) -> Result<Nurse> {
        self.begin().await;

        if nurse.id.trim().is_empty() || nurse.name.trim().is_empty() {
            let e = Error::Validation("Nurse id and name are required".to_string());
            return Err(self.fail("Failed to add nurse", e).await);
        }

        let nurse = Nurse {
            created_at: nurse.created_at.or_else(|| Some(Utc::now())),
            ..nurse
        };

        match self.store.insert(std::slice::from_ref(&nurse)).await {
            Ok(()) => {
                let mut state = self.inner.write().await;
                state.is_loading = false;
                state.nurses.push(nurse.clone());
                Ok(nurse)
            }
            Err(e) => Err(self.fail("Failed to add nurse", e.into()).await),
        }
    }

    /// Deletes a nurse and every schedule row whose staff id equals `id`.
    pub async fn delete_nurse(&self, id: &str) -> Result<()> {
        self.begin().await;

        if let Err(e) = self
            .store
            .delete::<Nurse>(&Filter::new().eq("id", id))
            .await
        {
            return Err(self.fail("Failed to delete nurse", e.into()).await);
        }

        let schedules = self
            .store
            .delete::<ScheduleRow>(&Filter::new().eq("staff_id", id))
            .await;

        let mut state = self.inner.write().await;
        state.nurses.retain(|n| n.id != id);
        state.schedule.retain(|key, _| key.staff_id != id);
        state.is_loading = false;

        match schedules {
            Ok(count) => {
                tracing::info!("Deleted nurse {} and {} schedule(s)", id, count);
                Ok(())
            }
            Err(e) => {
                drop(state);
                Err(self
                    .fail("Nurse deleted but schedules were not", e.into())
                    .await)
            }
        }
    }

    /// Replaces one staff member's whole month.
    pub async fn update_schedule(
        &self,
        staff_id: &str,
        year: i32,
        month: u32,
        days: Vec<DayRecord>,
    ) -> Result<()> {
        self.begin().await;

        let key = match ScheduleKey::new(year, month, staff_id) {
            Ok(key) => key,
            Err(e) => return Err(self.fail("Failed to update schedule", e).await),
        };
        if days.len() != key.days() as usize {
            let e = Error::Validation(format!(
                "{} has {} days, got {} records",
                key,
                key.days(),
                days.len()
            ));
            return Err(self.fail("Failed to update schedule", e).await);
        }

        let row = ScheduleRow::new(&key, days);
        match self.store.upsert(&row).await {
            Ok(()) => {
                let mut state = self.inner.write().await;
                state.is_loading = false;
                state.schedule.insert(key, row.schedule);
                Ok(())
            }
            Err(e) => Err(self.fail("Failed to update schedule", e.into()).await),
        }
    }

    /// Deletes stored schedule rows whose staff id is not on the roster.
    ///
    /// Returns the number of rows removed.
    pub async fn prune_orphans(&self) -> Result<u64> {
        self.begin().await;

        let result = tokio::try_join!(
            self.store.list_all::<Nurse>(None),
            self.store.list_all::<ScheduleRow>(None),
        );
        let (nurses, rows) = match result {
            Ok(data) => data,
            Err(e) => return Err(self.fail("Failed to prune schedules", e.into()).await),
        };

        let roster: HashSet<&str> = nurses.iter().map(|n| n.id.as_str()).collect();
        let orphans: HashSet<&str> = rows
            .iter()
            .map(|row| row.staff_id.as_str())
            .filter(|staff_id| !roster.contains(staff_id))
            .collect();

        let mut removed = 0;
        for staff_id in orphans {
            match self
                .store
                .delete::<ScheduleRow>(&Filter::new().eq("staff_id", staff_id))
                .await
            {
                Ok(count) => removed += count,
                Err(e) => return Err(self.fail("Failed to prune schedules", e.into()).await),
            }
        }

        self.inner.write().await.is_loading = false;
        tracing::info!("Pruned {} orphaned schedule row(s)", removed);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{days_in_month, Note, ShiftStatus};
    use crate::store::StoreError;
    use crate::test_support::{dead_endpoint, TestServer};

    fn month_with(days: u32, index: usize, record: DayRecord) -> Vec<DayRecord> {
        let mut month = vec![DayRecord::default(); days as usize];
        month[index] = record;
        month
    }

    #[tokio::test]
    async fn test_reload_is_idempotent() {
        let server = TestServer::start().await;
        let client = server.client();
        client
            .insert(&[Nurse::new("b", "Zoe"), Nurse::new("a", "Adam")])
            .await
            .unwrap();
        let key = ScheduleKey::new(2024, 3, "a").unwrap();
        client
            .upsert(&ScheduleRow::new(
                &key,
                month_with(31, 4, DayRecord::new(ShiftStatus::Work)),
            ))
            .await
            .unwrap();

        let state = ScheduleState::new(client);
        state.load_data().await;
        let first = state.snapshot().await;
        state.load_data().await;
        let second = state.snapshot().await;

        assert_eq!(first, second);
        assert_eq!(first.nurses[0].name, "Adam");
        assert_eq!(first.schedule.len(), 1);
        assert!(first.last_error.is_none());
    }

    #[tokio::test]
    async fn test_absent_day_is_default() {
        let server = TestServer::start().await;
        let state = ScheduleState::new(server.client());
        state.load_data().await;

        assert_eq!(state.day("nobody", 2024, 2, 29).await, DayRecord::default());
        assert_eq!(state.day("nobody", 2024, 2, 0).await, DayRecord::default());
        assert_eq!(state.month("nobody", 2024, 2).await.len(), 29);
        assert_eq!(
            state.month("nobody", 2023, 2).await.len() as u32,
            days_in_month(2023, 2)
        );
    }

    #[tokio::test]
    async fn test_delete_nurse_cascades_by_staff_id() {
        let server = TestServer::start().await;
        let client = server.client();
        let state = ScheduleState::new(client.clone());

        state.add_nurse(Nurse::new("12", "Ana")).await.unwrap();
        state.add_nurse(Nurse::new("112", "Ben")).await.unwrap();
        for staff_id in ["12", "112"] {
            for month in [1, 2] {
                let days = vec![DayRecord::new(ShiftStatus::Rest); days_in_month(2024, month) as usize];
                state
                    .update_schedule(staff_id, 2024, month, days)
                    .await
                    .unwrap();
            }
        }

        state.delete_nurse("12").await.unwrap();

        let snapshot = state.snapshot().await;
        assert_eq!(snapshot.nurses.len(), 1);
        assert_eq!(snapshot.schedule.len(), 2);
        assert!(snapshot.schedule.keys().all(|k| k.staff_id == "112"));

        let rows: Vec<ScheduleRow> = client.list_all(None).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.staff_id == "112"));
    }

    #[tokio::test]
    async fn test_update_replaces_whole_month() {
        let server = TestServer::start().await;
        let state = ScheduleState::new(server.client());
        state.add_nurse(Nurse::new("n1", "Ana")).await.unwrap();

        let noted = DayRecord::new(ShiftStatus::Work).with_note(Note::new("late", "ana", "n1"));
        state
            .update_schedule("n1", 2024, 4, month_with(30, 2, noted))
            .await
            .unwrap();
        state
            .update_schedule("n1", 2024, 4, month_with(30, 5, DayRecord::new(ShiftStatus::Vacation)))
            .await
            .unwrap();

        assert_eq!(state.day("n1", 2024, 4, 3).await, DayRecord::default());
        assert_eq!(state.day("n1", 2024, 4, 6).await.status, ShiftStatus::Vacation);

        state.load_data().await;
        assert_eq!(state.day("n1", 2024, 4, 3).await, DayRecord::default());
        assert_eq!(state.day("n1", 2024, 4, 6).await.status, ShiftStatus::Vacation);
    }

    #[tokio::test]
    async fn test_failed_mutations_leave_state_untouched() {
        let server = TestServer::start().await;
        let state = ScheduleState::new(server.client());
        state.add_nurse(Nurse::new("n1", "Ana")).await.unwrap();
        let before = state.snapshot().await;

        let result = state.add_nurse(Nurse::new("n1", "Duplicate")).await;
        assert!(matches!(result, Err(Error::Store(StoreError::Conflict(_)))));

        let result = state.update_schedule("n1", 2024, 13, Vec::new()).await;
        assert!(matches!(result, Err(Error::Validation(_))));

        let after = state.snapshot().await;
        assert_eq!(after.nurses, before.nurses);
        assert_eq!(after.schedule, before.schedule);
        assert!(after.last_error.is_some());
        assert!(!after.is_loading);
    }

    #[tokio::test]
    async fn test_update_requires_one_record_per_day() {
        let server = TestServer::start().await;
        let client = server.client();
        let state = ScheduleState::new(client.clone());
        state.add_nurse(Nurse::new("n1", "Ana")).await.unwrap();

        for len in [3, 30] {
            let result = state
                .update_schedule("n1", 2024, 2, vec![DayRecord::default(); len])
                .await;
            assert!(matches!(result, Err(Error::Validation(_))));
        }
        assert!(state.snapshot().await.schedule.is_empty());

        let rows: Vec<ScheduleRow> = client.list_all(None).await.unwrap();
        assert!(rows.is_empty());

        state
            .update_schedule("n1", 2024, 2, vec![DayRecord::default(); 29])
            .await
            .unwrap();
        assert!(state.snapshot().await.last_error.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_store() {
        let state = ScheduleState::new(StoreClient::new(dead_endpoint().await, None));
        let loads = state.watch_loads();

        state.load_data().await;
        assert_eq!(*loads.borrow(), 1);
        assert!(state.snapshot().await.last_error.is_some());

        assert!(state.add_nurse(Nurse::new("n1", "Ana")).await.is_err());
        assert!(state.delete_nurse("n1").await.is_err());
        assert!(state.nurses().await.is_empty());
    }

    #[tokio::test]
    async fn test_orphans_ignored_then_pruned() {
        let server = TestServer::start().await;
        let client = server.client();
        let state = ScheduleState::new(client.clone());
        state.add_nurse(Nurse::new("n1", "Ana")).await.unwrap();

        for staff_id in ["n1", "ghost"] {
            let key = ScheduleKey::new(2024, 1, staff_id).unwrap();
            client
                .upsert(&ScheduleRow::new(&key, vec![DayRecord::default(); 31]))
                .await
                .unwrap();
        }

        state.load_data().await;
        let snapshot = state.snapshot().await;
        assert_eq!(snapshot.schedule.len(), 1);
        assert!(snapshot.schedule.keys().all(|k| k.staff_id == "n1"));

        assert_eq!(state.prune_orphans().await.unwrap(), 1);
        assert_eq!(state.prune_orphans().await.unwrap(), 0);

        let rows: Vec<ScheduleRow> = client.list_all(None).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].staff_id, "n1");
    }
}
