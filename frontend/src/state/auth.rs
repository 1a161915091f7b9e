use crate::{
    api::{ApiClient, ApiError, LeaveBalance, LoginRequest, NewUser, User, UserId},
    utils::storage::SessionStorage,
};
use leptos::*;
use std::rc::Rc;

pub const SESSION_USER_KEY: &str = "vacationManagerUser";
pub const SESSION_USERS_KEY: &str = "vacationManagerUsers";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub user: Option<User>,
    pub users: Vec<User>,
    pub is_authenticated: bool,
    pub loading: bool,
    pub error: Option<String>,
}

impl AuthState {
    /// Balance shown on the dashboard cards.
    pub fn leave_balance(&self) -> Option<LeaveBalance> {
        self.user.as_ref().map(|user| user.annual_leave)
    }
}

/// Current user, the full user list and the session mirror of both.
#[derive(Clone)]
pub struct AuthContext {
    state: RwSignal<AuthState>,
    api: Rc<ApiClient>,
    session: SessionStorage,
}

impl AuthContext {
    pub fn new(api: ApiClient, session: SessionStorage) -> Self {
        Self {
            state: create_rw_signal(AuthState::default()),
            api: Rc::new(api),
            session,
        }
    }

    pub fn state(&self) -> RwSignal<AuthState> {
        self.state
    }

    pub fn api(&self) -> Rc<ApiClient> {
        Rc::clone(&self.api)
    }

    pub fn session(&self) -> &SessionStorage {
        &self.session
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.with_untracked(|state| state.user.clone())
    }

    pub fn find_user(&self, id: UserId) -> Option<User> {
        self.state
            .with_untracked(|state| state.users.iter().find(|u| u.id == id).cloned())
    }

    /// Tracked, so effects re-run when the session starts or ends.
    pub fn is_authenticated(&self) -> bool {
        self.state.with(|state| state.is_authenticated)
    }

    pub fn restore_session(&self) {
        self.state.update(|state| state.loading = true);
        match self.load_session() {
            Ok(Some((user, users))) => self.state.update(|state| {
                state.user = Some(user);
                state.users = users;
                state.is_authenticated = true;
            }),
            Ok(None) => {}
            Err(err) => {
                log::error!("Failed to load session: {}", err);
                self.clear_session();
            }
        }
        self.state.update(|state| state.loading = false);
    }

    fn load_session(&self) -> Result<Option<(User, Vec<User>)>, String> {
        let saved_user = self.session.get_item(SESSION_USER_KEY)?;
        let saved_users = self.session.get_item(SESSION_USERS_KEY)?;
        match (saved_user, saved_users) {
            (Some(user), Some(users)) => {
                let user: User = serde_json::from_str(&user).map_err(|e| e.to_string())?;
                let users: Vec<User> = serde_json::from_str(&users).map_err(|e| e.to_string())?;
                Ok(Some((user, users)))
            }
            _ => Ok(None),
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(), ApiError> {
        self.state.update(|state| {
            state.loading = true;
            state.error = None;
        });

        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        match self.api.login(request).await {
            Ok(response) => {
                self.persist_user(&response.user);
                self.persist_users(&response.users);
                self.state.update(|state| {
                    state.user = Some(response.user);
                    state.users = response.users;
                    state.is_authenticated = true;
                    state.loading = false;
                });
                log::info!("Signed in as {}", email);
                Ok(())
            }
            Err(err) => {
                self.logout();
                self.state.update(|state| {
                    state.error = Some(err.error.clone());
                    state.loading = false;
                });
                Err(err)
            }
        }
    }

    pub fn logout(&self) {
        self.state.update(|state| {
            state.user = None;
            state.users.clear();
            state.is_authenticated = false;
        });
        self.clear_session();
    }

    pub async fn add_user(&self, new_user: NewUser) -> Result<User, ApiError> {
        let created = self.api.add_user(&new_user).await?;
        let users = self.state.with_untracked(|state| {
            let mut users = state.users.clone();
            users.push(created.clone());
            users
        });
        self.replace_users(users);
        Ok(created)
    }

    pub async fn update_user(&self, user: User) -> Result<User, ApiError> {
        let returned = self.api.update_user(&user).await?;
        let users = self.state.with_untracked(|state| {
            state
                .users
                .iter()
                .map(|u| {
                    if u.id == returned.id {
                        returned.clone()
                    } else {
                        u.clone()
                    }
                })
                .collect::<Vec<_>>()
        });
        self.replace_users(users);

        if self.current_user().is_some_and(|current| current.id == returned.id) {
            self.persist_user(&returned);
            self.state
                .update(|state| state.user = Some(returned.clone()));
        }
        Ok(returned)
    }

    pub async fn delete_user(&self, user_id: UserId) -> Result<(), ApiError> {
        self.api.delete_user(user_id).await?;
        let users = self.state.with_untracked(|state| {
            state
                .users
                .iter()
                .filter(|u| u.id != user_id)
                .cloned()
                .collect::<Vec<_>>()
        });
        self.replace_users(users);
        Ok(())
    }

    fn replace_users(&self, users: Vec<User>) {
        self.persist_users(&users);
        self.state.update(|state| state.users = users);
    }

    fn persist_user(&self, user: &User) {
        self.persist(SESSION_USER_KEY, user);
    }

    fn persist_users(&self, users: &[User]) {
        self.persist(SESSION_USERS_KEY, users);
    }

    fn persist<T: serde::Serialize + ?Sized>(&self, key: &str, value: &T) {
        let stored = serde_json::to_string(value)
            .map_err(|e| e.to_string())
            .and_then(|json| self.session.set_item(key, &json));
        if let Err(err) = stored {
            log::warn!("Failed to persist {}: {}", key, err);
        }
    }

    fn clear_session(&self) {
        if let Err(err) = self.session.clear() {
            log::warn!("{}", err);
        }
    }
}

#[component]
pub fn AuthProvider(children: Children) -> impl IntoView {
    let api = use_context::<ApiClient>().unwrap_or_default();
    let ctx = AuthContext::new(api, SessionStorage::new());
    ctx.restore_session();
    provide_context(ctx);
    view! { <>{children()}</> }
}

pub fn use_auth() -> AuthContext {
    use_context::<AuthContext>()
        .unwrap_or_else(|| AuthContext::new(ApiClient::new(), SessionStorage::new()))
}

pub fn use_login_action() -> Action<LoginRequest, Result<(), ApiError>> {
    let auth = use_auth();
    create_action(move |request: &LoginRequest| {
        let auth = auth.clone();
        let request = request.clone();
        async move { auth.login(&request.email, &request.password).await }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use leptos::create_runtime;

    fn with_runtime<T>(test: impl FnOnce() -> T) -> T {
        let runtime = create_runtime();
        let result = test();
        runtime.dispose();
        result
    }

    #[test]
    fn use_auth_returns_default_without_context() {
        with_runtime(|| {
            let auth = use_auth();
            let snapshot = auth.state().get_untracked();
            assert!(!snapshot.is_authenticated);
            assert!(snapshot.user.is_none());
            assert!(snapshot.users.is_empty());
            assert!(snapshot.leave_balance().is_none());
        });
    }
}
