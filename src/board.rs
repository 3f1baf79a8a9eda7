//! The scheduling board: one session, its roster and its months.

use chrono::{Datelike, NaiveDate};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{DayRecord, NewUser, Note, Nurse, Role, ShiftStatus, User};
use crate::state::{AuthState, ScheduleState};
use crate::store::{StoreClient, StoreError};
use crate::sync::RealtimeSync;

/// Owns the store client and both state managers.
pub struct Board {
    store: StoreClient,
    auth: Arc<AuthState>,
    schedule: Arc<ScheduleState>,
}

impl Board {
    pub fn new(store: StoreClient) -> Self {
        Self {
            auth: Arc::new(AuthState::new(store.clone())),
            schedule: Arc::new(ScheduleState::new(store.clone())),
            store,
        }
    }

    pub fn store(&self) -> &StoreClient {
        &self.store
    }

    pub fn auth(&self) -> &Arc<AuthState> {
        &self.auth
    }

    pub fn schedule(&self) -> &Arc<ScheduleState> {
        &self.schedule
    }

    /// Fails with `Error::Connectivity` when the store does not answer in time.
    pub async fn ensure_reachable(&self, timeout: Duration) -> Result<()> {
        if self.store.health_check(timeout).await {
            Ok(())
        } else {
            Err(Error::Connectivity(format!(
                "no answer from {} within {:?}",
                self.store.base_url(),
                timeout
            )))
        }
    }

    /// Bootstraps the administrator, then loads the roster and schedules.
    pub async fn start(&self) -> Result<()> {
        self.auth.initialize().await?;
        self.schedule.load_data().await;
        Ok(())
    }

    /// Signs in, reporting the recorded reason on failure.
    pub async fn sign_in(&self, username: &str, secret: &str) -> Result<User> {
        if self.auth.login(username, secret).await {
            self.auth.require_user().await
        } else {
            let reason = self
                .auth
                .snapshot()
                .await
                .last_error
                .unwrap_or_else(|| "Invalid credentials".to_string());
            Err(Error::Permission(reason))
        }
    }

    pub async fn activate_sync(&self) -> Result<RealtimeSync, StoreError> {
        RealtimeSync::activate(
            &self.store.feed(),
            Arc::clone(&self.schedule),
            Arc::clone(&self.auth),
        )
        .await
    }

    /// Admins see the whole roster; staff see only their own row.
    pub async fn visible_nurses(&self) -> Vec<Nurse> {
        let Some(user) = self.auth.current_user().await else {
            return Vec::new();
        };
        let nurses = self.schedule.nurses().await;
        if user.is_admin() {
            nurses
        } else {
            nurses.into_iter().filter(|n| n.id == user.id).collect()
        }
    }

    pub async fn can_edit(&self, staff_id: &str) -> bool {
        match self.auth.current_user().await {
            Some(user) => may_edit(&user, staff_id),
            None => false,
        }
    }

    async fn require_admin(&self) -> Result<User> {
        let user = self.auth.require_user().await?;
        if user.is_admin() {
            Ok(user)
        } else {
            Err(Error::Permission("administrator role required".to_string()))
        }
    }

    /// Creates a staff login and its roster entry under one shared id.
    pub async fn register_staff(&self, username: &str, secret: &str) -> Result<Nurse> {
        self.require_admin().await?;

        let id = Uuid::new_v4().to_string();
        let user = self
            .auth
            .add_user(NewUser::new(username, secret, Role::Staff).with_id(id.clone()))
            .await?;
        self.schedule
            .add_nurse(Nurse::new(id, user.username))
            .await
    }

    pub async fn remove_staff(&self, id: &str) -> Result<()> {
        self.require_admin().await?;
        self.schedule.delete_nurse(id).await
    }

    /// Replaces one day of a month and writes the whole month back.
    async fn edit_day<F>(&self, staff_id: &str, date: NaiveDate, edit: F) -> Result<()>
    where
        F: FnOnce(&DayRecord, &User) -> Result<DayRecord>,
    {
        let user = self.auth.require_user().await?;
        if !may_edit(&user, staff_id) {
            return Err(Error::Permission(format!(
                "{} cannot edit the schedule of {}",
                user.username, staff_id
            )));
        }

        let (year, month) = (date.year(), date.month());
        let mut days = self.schedule.month(staff_id, year, month).await;
        let index = date.day0() as usize;
        let current = days
            .get(index)
            .ok_or_else(|| Error::Validation(format!("Invalid date {}", date)))?;
        let updated = edit(current, &user)?;
        days[index] = updated;

        self.schedule
            .update_schedule(staff_id, year, month, days)
            .await
    }

    pub async fn set_status(
        &self,
        staff_id: &str,
        date: NaiveDate,
        status: ShiftStatus,
    ) -> Result<()> {
        self.edit_day(staff_id, date, |day, _| Ok(day.with_status(status)))
            .await
    }

    /// Appends a note authored by the signed-in user.
    pub async fn add_note(&self, staff_id: &str, date: NaiveDate, text: &str) -> Result<Note> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::Validation("Note text cannot be empty".to_string()));
        }

        let mut added = None;
        self.edit_day(staff_id, date, |day, user| {
            let note = Note::new(text, user.username.as_str(), user.id.as_str());
            added = Some(note.clone());
            Ok(day.with_note(note))
        })
        .await?;

        added.ok_or_else(|| Error::Validation("Note was not added".to_string()))
    }

    /// Removes a note. Only its author may do so.
    pub async fn delete_note(&self, staff_id: &str, date: NaiveDate, note_id: Uuid) -> Result<()> {
        self.edit_day(staff_id, date, |day, user| {
            day.without_note(note_id, &user.id)
        })
        .await
    }
}

fn may_edit(user: &User, staff_id: &str) -> bool {
    user.is_admin() || user.id == staff_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ScheduleRow, DEFAULT_ADMIN_SECRET};
    use crate::test_support::{dead_endpoint, TestServer};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn admin_board(server: &TestServer) -> Board {
        let board = Board::new(server.client());
        board.start().await.unwrap();
        board.sign_in("admin", DEFAULT_ADMIN_SECRET).await.unwrap();
        board
    }

    #[tokio::test]
    async fn test_unreachable_store() {
        let board = Board::new(StoreClient::new(dead_endpoint().await, None));
        let result = board.ensure_reachable(Duration::from_millis(500)).await;
        assert!(matches!(result, Err(Error::Connectivity(_))));
        assert!(board.start().await.is_err());
    }

    #[tokio::test]
    async fn test_register_staff_shares_id() {
        let server = TestServer::start().await;
        let board = admin_board(&server).await;

        let nurse = board.register_staff("Dana", "pw").await.unwrap();
        assert_eq!(nurse.name, "dana");

        let staff = Board::new(server.client());
        staff.start().await.unwrap();
        let user = staff.sign_in("dana", "pw").await.unwrap();
        assert_eq!(user.id, nurse.id);
        assert_eq!(user.role, Role::Staff);
    }

    #[tokio::test]
    async fn test_staff_visibility_and_permissions() {
        let server = TestServer::start().await;
        let admin = admin_board(&server).await;
        let dana = admin.register_staff("dana", "pw").await.unwrap();
        let eli = admin.register_staff("eli", "pw").await.unwrap();
        assert_eq!(admin.visible_nurses().await.len(), 2);
        assert!(admin.can_edit(&eli.id).await);

        let board = Board::new(server.client());
        board.start().await.unwrap();
        assert!(board.visible_nurses().await.is_empty());
        board.sign_in("dana", "pw").await.unwrap();

        let visible = board.visible_nurses().await;
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, dana.id);
        assert!(board.can_edit(&dana.id).await);
        assert!(!board.can_edit(&eli.id).await);

        let result = board.set_status(&eli.id, date(2024, 5, 1), ShiftStatus::Work).await;
        assert!(matches!(result, Err(Error::Permission(_))));
        let result = board.register_staff("fay", "pw").await;
        assert!(matches!(result, Err(Error::Permission(_))));
        let result = board.remove_staff(&eli.id).await;
        assert!(matches!(result, Err(Error::Permission(_))));
    }

    #[tokio::test]
    async fn test_set_status_keeps_rest_of_month() {
        let server = TestServer::start().await;
        let board = admin_board(&server).await;
        let nurse = board.register_staff("dana", "pw").await.unwrap();

        let note = board
            .add_note(&nurse.id, date(2024, 2, 10), "  swap with eli  ")
            .await
            .unwrap();
        assert_eq!(note.text, "swap with eli");
        assert_eq!(note.author, "admin");

        board
            .set_status(&nurse.id, date(2024, 2, 10), ShiftStatus::Training)
            .await
            .unwrap();
        board
            .set_status(&nurse.id, date(2024, 2, 29), ShiftStatus::Rest)
            .await
            .unwrap();

        let schedule = board.schedule();
        let day = schedule.day(&nurse.id, 2024, 2, 10).await;
        assert_eq!(day.status, ShiftStatus::Training);
        assert_eq!(day.notes, vec![note]);
        assert_eq!(schedule.day(&nurse.id, 2024, 2, 29).await.status, ShiftStatus::Rest);
        assert_eq!(schedule.month(&nurse.id, 2024, 2).await.len(), 29);

        let result = board.add_note(&nurse.id, date(2024, 2, 10), "   ").await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_only_author_deletes_note() {
        let server = TestServer::start().await;
        let admin = admin_board(&server).await;
        let nurse = admin.register_staff("dana", "pw").await.unwrap();
        let day = date(2024, 6, 3);
        let note = admin.add_note(&nurse.id, day, "bring badge").await.unwrap();

        let staff = Board::new(server.client());
        staff.start().await.unwrap();
        staff.sign_in("dana", "pw").await.unwrap();

        let result = staff.delete_note(&nurse.id, day, note.id).await;
        assert!(matches!(result, Err(Error::Permission(_))));

        let rows: Vec<ScheduleRow> = server.client().list_all(None).await.unwrap();
        assert_eq!(rows[0].schedule[2].notes.len(), 1);

        admin.delete_note(&nurse.id, day, note.id).await.unwrap();
        assert!(admin.schedule().day(&nurse.id, 2024, 6, 3).await.notes.is_empty());
    }

    #[tokio::test]
    async fn test_remove_staff() {
        let server = TestServer::start().await;
        let board = admin_board(&server).await;
        let nurse = board.register_staff("dana", "pw").await.unwrap();
        board
            .set_status(&nurse.id, date(2024, 1, 1), ShiftStatus::Work)
            .await
            .unwrap();

        board.remove_staff(&nurse.id).await.unwrap();

        assert!(board.visible_nurses().await.is_empty());
        let rows: Vec<ScheduleRow> = server.client().list_all(None).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_edits_require_sign_in() {
        let server = TestServer::start().await;
        let board = Board::new(server.client());
        board.start().await.unwrap();

        let result = board.set_status("n1", date(2024, 1, 1), ShiftStatus::Work).await;
        assert!(matches!(result, Err(Error::NotSignedIn)));
        assert!(!board.can_edit("n1").await);
    }
}
