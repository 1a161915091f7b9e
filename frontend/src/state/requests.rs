use crate::{
    api::{
        ApiClient, ApiError, ApproverRef, NewVacationRequest, RequestId, RequestStatus,
        RequestSubmission, User, UserId, VacationRequest,
    },
    state::auth::{use_auth, AuthContext},
    utils::notify,
};
use chrono::{DateTime, SecondsFormat, Utc};
use leptos::*;
use std::{cmp::Reverse, rc::Rc};

const NO_SESSION_MESSAGE: &str = "No hay ninguna sesión iniciada.";
const NOT_ALLOWED_MESSAGE: &str = "No tienes permiso para realizar esta acción.";
const REJECTED_IS_FINAL_MESSAGE: &str = "Una solicitud rechazada no puede cambiar de estado.";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestState {
    pub requests: Vec<VacationRequest>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(RequestStatus),
}

impl StatusFilter {
    pub fn matches(self, status: RequestStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => wanted == status,
        }
    }
}

fn created_key(request: &VacationRequest) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&request.created_at)
        .ok()
        .map(|at| at.with_timezone(&Utc))
}

fn newest_first(mut requests: Vec<VacationRequest>) -> Vec<VacationRequest> {
    requests.sort_by_key(|request| Reverse(created_key(request)));
    requests
}

impl RequestState {
    pub fn find(&self, id: RequestId) -> Option<&VacationRequest> {
        self.requests.iter().find(|r| r.id == id)
    }

    /// A user's own requests, newest first.
    pub fn user_requests(&self, user_id: UserId) -> Vec<VacationRequest> {
        newest_first(
            self.requests
                .iter()
                .filter(|r| r.user_id == user_id)
                .cloned()
                .collect(),
        )
    }

    pub fn pending(&self) -> Vec<VacationRequest> {
        self.with_status(StatusFilter::Only(RequestStatus::Pending))
    }

    pub fn with_status(&self, filter: StatusFilter) -> Vec<VacationRequest> {
        newest_first(
            self.requests
                .iter()
                .filter(|r| filter.matches(r.status))
                .cloned()
                .collect(),
        )
    }

    /// Days currently drawn from the user's balance.
    pub fn approved_days_for(&self, user_id: UserId) -> i32 {
        self.requests
            .iter()
            .filter(|r| r.user_id == user_id && r.status.consumes_balance())
            .map(|r| r.days)
            .sum()
    }
}

fn ensure_approver(actor: &User) -> Result<(), ApiError> {
    if actor.is_approver() {
        Ok(())
    } else {
        Err(ApiError::validation(NOT_ALLOWED_MESSAGE))
    }
}

/// Employees may only touch their own requests while they are still pending.
fn ensure_can_change(actor: &User, request: &VacationRequest) -> Result<(), ApiError> {
    if actor.is_approver()
        || (request.user_id == actor.id && request.status == RequestStatus::Pending)
    {
        Ok(())
    } else {
        Err(ApiError::validation(NOT_ALLOWED_MESSAGE))
    }
}

fn ensure_transition(from: RequestStatus, to: RequestStatus) -> Result<(), ApiError> {
    if from == RequestStatus::Rejected && to != RequestStatus::Rejected {
        Err(ApiError::validation(REJECTED_IS_FINAL_MESSAGE))
    } else {
        Ok(())
    }
}

/// Balance change for an edit: only requests already drawn from the balance
/// move it, by the change in days.
fn edit_delta(original: &VacationRequest, updated: &VacationRequest) -> i32 {
    if original.status.consumes_balance() {
        updated.days - original.days
    } else {
        0
    }
}

/// Request list plus the operations that keep it and the balances in step.
#[derive(Clone)]
pub struct RequestContext {
    state: RwSignal<RequestState>,
    api: Rc<ApiClient>,
    auth: AuthContext,
}

impl RequestContext {
    pub fn new(auth: AuthContext) -> Self {
        Self {
            state: create_rw_signal(RequestState::default()),
            api: auth.api(),
            auth,
        }
    }

    pub fn state(&self) -> RwSignal<RequestState> {
        self.state
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    /// Tracked view of the signed-in user's requests.
    pub fn user_requests(&self) -> Vec<VacationRequest> {
        let user_id = self
            .auth
            .state()
            .with(|state| state.user.as_ref().map(|u| u.id));
        match user_id {
            Some(id) => self.state.with(|state| state.user_requests(id)),
            None => Vec::new(),
        }
    }

    pub fn clear(&self) {
        self.state.set(RequestState::default());
    }

    pub async fn fetch_requests(&self) -> Result<(), ApiError> {
        self.state.update(|state| {
            state.loading = true;
            state.error = None;
        });
        match self.api.get_requests().await {
            Ok(requests) => {
                log::debug!("Loaded {} requests", requests.len());
                self.state.update(|state| {
                    state.requests = requests;
                    state.loading = false;
                });
                Ok(())
            }
            Err(err) => {
                log::error!("Failed to fetch requests: {}", err);
                self.state.update(|state| {
                    state.error = Some(err.error.clone());
                    state.loading = false;
                });
                Err(err)
            }
        }
    }

    pub async fn add_request(
        &self,
        submission: RequestSubmission,
    ) -> Result<VacationRequest, ApiError> {
        let result = self.try_add_request(submission).await;
        result.map_err(|err| self.report(err))
    }

    async fn try_add_request(
        &self,
        submission: RequestSubmission,
    ) -> Result<VacationRequest, ApiError> {
        let actor = self.actor()?;
        let new_request = NewVacationRequest {
            user_id: actor.id,
            user_name: actor.name,
            start_date: submission.start_date,
            end_date: submission.end_date,
            days: submission.days,
            request_type: submission.request_type,
            status: RequestStatus::Pending,
            employee_comment: submission.employee_comment,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        let stored = self.api.add_request(&new_request).await?;
        self.state
            .update(|state| state.requests.insert(0, stored.clone()));
        log::info!("Request {} submitted", stored.id);
        Ok(stored)
    }

    /// Approves or rejects a request. Approving draws its days from the
    /// owner's balance.
    pub async fn update_request(
        &self,
        id: RequestId,
        status: RequestStatus,
        comment: Option<String>,
    ) -> Result<(), ApiError> {
        let result = self.try_update_request(id, status, comment).await;
        result.map_err(|err| self.report(err))
    }

    async fn try_update_request(
        &self,
        id: RequestId,
        status: RequestStatus,
        comment: Option<String>,
    ) -> Result<(), ApiError> {
        let actor = self.actor()?;
        ensure_approver(&actor)?;
        let Some(original) = self.find(id) else {
            log::warn!("Request {} is not loaded; skipping update", id);
            return Ok(());
        };
        ensure_transition(original.status, status)?;

        let updated = VacationRequest {
            status,
            approver_comment: comment.or_else(|| original.approver_comment.clone()),
            approved_by: Some(ApproverRef::from(&actor)),
            ..original.clone()
        };
        let returned = self.api.update_request(&updated).await?;
        self.replace_local(returned);

        if status == RequestStatus::Approved && !original.status.consumes_balance() {
            self.adjust_balance(original.user_id, original.days).await?;
        }
        Ok(())
    }

    /// Persists edited fields. Approved or modified requests move the
    /// balance by the change in days.
    pub async fn edit_request(&self, updated: VacationRequest) -> Result<(), ApiError> {
        let result = self.try_edit_request(updated).await;
        result.map_err(|err| self.report(err))
    }

    async fn try_edit_request(&self, updated: VacationRequest) -> Result<(), ApiError> {
        let actor = self.actor()?;
        let Some(original) = self.find(updated.id) else {
            log::warn!("Request {} is not loaded; skipping edit", updated.id);
            return Ok(());
        };
        ensure_can_change(&actor, &original)?;

        let delta = edit_delta(&original, &updated);
        let returned = self.api.edit_request(&updated).await?;
        self.replace_local(returned);

        if delta != 0 {
            self.adjust_balance(original.user_id, delta).await?;
        }
        Ok(())
    }

    /// Removes the request locally first and restores the list if the
    /// backend refuses.
    pub async fn delete_request(&self, id: RequestId) -> Result<(), ApiError> {
        let result = self.try_delete_request(id).await;
        result.map_err(|err| self.report(err))
    }

    async fn try_delete_request(&self, id: RequestId) -> Result<(), ApiError> {
        let actor = self.actor()?;
        let Some(doomed) = self.find(id) else {
            log::warn!("Request {} is not loaded; skipping delete", id);
            return Ok(());
        };
        ensure_can_change(&actor, &doomed)?;

        let snapshot = self.state.with_untracked(|state| state.requests.clone());
        self.state
            .update(|state| state.requests.retain(|r| r.id != id));

        if let Err(err) = self.api.delete_request(id).await {
            self.state.update(|state| state.requests = snapshot);
            return Err(err);
        }

        if doomed.status.consumes_balance() {
            self.adjust_balance(doomed.user_id, -doomed.days).await?;
        }
        Ok(())
    }

    /// Drops every request of a user and credits back the days they held.
    pub async fn remove_requests_by_user(&self, user_id: UserId) -> Result<(), ApiError> {
        let result = self.try_remove_requests_by_user(user_id).await;
        result.map_err(|err| self.report(err))
    }

    async fn try_remove_requests_by_user(&self, user_id: UserId) -> Result<(), ApiError> {
        let actor = self.actor()?;
        ensure_approver(&actor)?;
        let held = self
            .state
            .with_untracked(|state| state.approved_days_for(user_id));

        self.api.remove_requests_by_user(user_id).await?;
        self.state
            .update(|state| state.requests.retain(|r| r.user_id != user_id));

        if held > 0 {
            self.adjust_balance(user_id, -held).await?;
        }
        Ok(())
    }

    async fn adjust_balance(&self, user_id: UserId, days: i32) -> Result<(), ApiError> {
        let Some(owner) = self.auth.find_user(user_id) else {
            log::warn!("User {} not found; balance left unchanged", user_id);
            return Ok(());
        };
        self.auth
            .update_user(owner.with_leave_adjusted(days))
            .await
            .map(|_| ())
    }

    fn actor(&self) -> Result<User, ApiError> {
        self.auth
            .current_user()
            .ok_or_else(|| ApiError::validation(NO_SESSION_MESSAGE))
    }

    fn find(&self, id: RequestId) -> Option<VacationRequest> {
        self.state.with_untracked(|state| state.find(id).cloned())
    }

    fn replace_local(&self, record: VacationRequest) {
        self.state.update(|state| {
            if let Some(slot) = state.requests.iter_mut().find(|r| r.id == record.id) {
                *slot = record;
            }
        });
    }

    fn report(&self, err: ApiError) -> ApiError {
        log::error!("Request operation failed: {} ({})", err, err.code);
        self.state.update(|state| state.error = Some(err.error.clone()));
        notify::alert(&err.error);
        err
    }
}

#[component]
pub fn RequestProvider(children: Children) -> impl IntoView {
    let ctx = RequestContext::new(use_auth());
    let authenticated = create_memo({
        let auth = ctx.auth.clone();
        move |_| auth.is_authenticated()
    });
    let loader = ctx.clone();
    create_effect(move |_| {
        if authenticated.get() {
            let loader = loader.clone();
            spawn_local(async move {
                let _ = loader.fetch_requests().await;
            });
        } else {
            loader.clear();
        }
    });
    provide_context(ctx);
    view! { <>{children()}</> }
}

pub fn use_requests() -> RequestContext {
    use_context::<RequestContext>().unwrap_or_else(|| RequestContext::new(use_auth()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{RequestType, Role};
    use leptos::create_runtime;

    fn record(id: i64, user_id: i64, status: RequestStatus, days: i32, created: &str) -> VacationRequest {
        VacationRequest {
            id,
            user_id,
            user_name: format!("user-{}", user_id),
            start_date: "10/06/2024".into(),
            end_date: "14/06/2024".into(),
            days,
            request_type: RequestType::Vacation,
            status,
            employee_comment: None,
            approver_comment: None,
            approved_by: None,
            created_at: created.into(),
        }
    }

    fn sample_state() -> RequestState {
        RequestState {
            requests: vec![
                record(1, 7, RequestStatus::Approved, 3, "2024-05-01T09:00:00.000Z"),
                record(2, 7, RequestStatus::Pending, 2, "2024-05-03T09:00:00.000Z"),
                record(3, 8, RequestStatus::Pending, 1, "2024-05-02T09:00:00.000Z"),
                record(4, 7, RequestStatus::Modified, 4, "2024-05-02T10:00:00.000Z"),
                record(5, 7, RequestStatus::Rejected, 5, "2024-04-30T09:00:00.000Z"),
            ],
            ..RequestState::default()
        }
    }

    fn ids(requests: &[VacationRequest]) -> Vec<i64> {
        requests.iter().map(|r| r.id).collect()
    }

    #[test]
    fn user_requests_are_newest_first() {
        assert_eq!(ids(&sample_state().user_requests(7)), vec![2, 4, 1, 5]);
        assert!(sample_state().user_requests(99).is_empty());
    }

    #[test]
    fn status_filters_select_matching_requests() {
        let state = sample_state();
        assert_eq!(ids(&state.pending()), vec![2, 3]);
        assert_eq!(state.with_status(StatusFilter::All).len(), 5);
        assert_eq!(
            ids(&state.with_status(StatusFilter::Only(RequestStatus::Rejected))),
            vec![5]
        );
    }

    #[test]
    fn approved_days_count_approved_and_modified_only() {
        assert_eq!(sample_state().approved_days_for(7), 7);
        assert_eq!(sample_state().approved_days_for(8), 0);
    }

    #[test]
    fn rejected_requests_cannot_change_status() {
        assert!(ensure_transition(RequestStatus::Rejected, RequestStatus::Approved).is_err());
        assert!(ensure_transition(RequestStatus::Rejected, RequestStatus::Rejected).is_ok());
        assert!(ensure_transition(RequestStatus::Pending, RequestStatus::Rejected).is_ok());
        assert!(ensure_transition(RequestStatus::Approved, RequestStatus::Modified).is_ok());
    }

    #[test]
    fn edit_delta_only_moves_consumed_requests() {
        let approved = record(1, 7, RequestStatus::Approved, 3, "");
        let longer = VacationRequest { days: 5, ..approved.clone() };
        let modified = VacationRequest { status: RequestStatus::Modified, ..approved.clone() };
        let pending = VacationRequest { status: RequestStatus::Pending, ..approved.clone() };
        let rejected = VacationRequest { status: RequestStatus::Rejected, ..approved.clone() };
        assert_eq!(edit_delta(&approved, &longer), 2);
        assert_eq!(edit_delta(&longer, &approved), -2);
        assert_eq!(edit_delta(&modified, &VacationRequest { days: 1, ..modified.clone() }), -2);
        assert_eq!(edit_delta(&pending, &VacationRequest { days: 9, ..pending.clone() }), 0);
        let edited_pending = VacationRequest {
            status: RequestStatus::Modified,
            ..pending.clone()
        };
        assert_eq!(edit_delta(&pending, &edited_pending), 0);
        assert_eq!(edit_delta(&rejected, &modified), 0);
    }

    #[test]
    fn employees_only_change_their_own_pending_requests() {
        let employee = User {
            id: 7,
            name: "Lucia Perez".into(),
            email: "lucia@example.com".into(),
            role: Role::Employee,
            annual_leave: Default::default(),
        };
        let own_pending = record(2, 7, RequestStatus::Pending, 2, "");
        let own_approved = record(1, 7, RequestStatus::Approved, 3, "");
        let foreign = record(3, 8, RequestStatus::Pending, 1, "");
        assert!(ensure_can_change(&employee, &own_pending).is_ok());
        assert!(ensure_can_change(&employee, &own_approved).is_err());
        assert!(ensure_can_change(&employee, &foreign).is_err());
        assert!(ensure_approver(&employee).is_err());
    }

    #[test]
    fn use_requests_returns_empty_state_without_context() {
        let runtime = create_runtime();
        let ctx = use_requests();
        assert_eq!(ctx.state().get_untracked(), RequestState::default());
        assert!(ctx.user_requests().is_empty());
        runtime.dispose();
    }
}
