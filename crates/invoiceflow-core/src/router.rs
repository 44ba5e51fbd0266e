//! Top-level view router.
//!
//! Exactly one of four views is current at a time:
//!
//! | From              | Action                    | To         |
//! |-------------------|---------------------------|------------|
//! | Home, Login       | `login_click`, signed in  | Dashboard  |
//! | Home, Login       | `login_click`, signed out | Login      |
//! | Home, Login       | `navigate_to_assessment`  | Assessment |
//! | Login, Assessment | `back`, signed in         | Dashboard  |
//! | Login, Assessment | `back`, signed out        | Home       |
//! | Login             | `complete_login`          | Dashboard  |
//! | Dashboard         | `logout`                  | Home       |
//!
//! The router owns the session store and the in-memory current user. Storage
//! failures during a transition are logged and do not block the transition.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::RouterError;
use crate::session::SessionStore;
use crate::user::User;

/// One of the four top-level views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Home,
    Login,
    Dashboard,
    Assessment,
}

impl View {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Login => "login",
            Self::Dashboard => "dashboard",
            Self::Assessment => "assessment",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Proof that a login started while the router was in a given state.
///
/// A ticket issued before any later transition is stale and
/// [`ViewRouter::complete_login`] ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginTicket {
    epoch: u64,
}

/// What [`ViewRouter::complete_login`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    /// The login was applied and the router moved to this view.
    Applied(View),
    /// The router moved on while the login was in flight; nothing changed.
    Stale,
}

/// The top-level view state machine.
#[derive(Debug)]
pub struct ViewRouter {
    session: SessionStore,
    current: View,
    user: Option<User>,
    epoch: u64,
}

impl ViewRouter {
    /// Start the application.
    ///
    /// Lands on Dashboard with the stored user when a valid session exists.
    /// A session without a readable user is cleared and the router lands on
    /// Home, as it does with no session at all.
    pub async fn start(session: SessionStore) -> Self {
        let user = restore_user(&session, None).await;
        let current = if user.is_some() {
            View::Dashboard
        } else {
            View::Home
        };
        info!(view = %current, "router started");
        Self {
            session,
            current,
            user,
            epoch: 0,
        }
    }

    pub fn current(&self) -> View {
        self.current
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// The "Login" call to action.
    ///
    /// From Home or Login: Dashboard if a valid session with a readable user
    /// exists, else Login. A session without a user is cleared, as on
    /// [`ViewRouter::start`].
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::InvalidTransition`] from any other view.
    pub async fn login_click(&mut self) -> Result<View, RouterError> {
        self.expect_one_of(&[View::Home, View::Login], "open login")?;
        self.user = restore_user(&self.session, self.user.take()).await;
        let next = if self.user.is_some() {
            View::Dashboard
        } else {
            View::Login
        };
        Ok(self.go(next))
    }

    /// Open the assessment booking form from Home or Login.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::InvalidTransition`] from any other view.
    pub fn navigate_to_assessment(&mut self) -> Result<View, RouterError> {
        self.expect_one_of(&[View::Home, View::Login], "open the assessment")?;
        Ok(self.go(View::Assessment))
    }

    /// Leave Login or Assessment: Dashboard if a valid session with a
    /// readable user exists, else Home.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::InvalidTransition`] from any other view.
    pub async fn back(&mut self) -> Result<View, RouterError> {
        self.expect_one_of(&[View::Login, View::Assessment], "go back")?;
        self.user = restore_user(&self.session, self.user.take()).await;
        let next = if self.user.is_some() {
            View::Dashboard
        } else {
            View::Home
        };
        Ok(self.go(next))
    }

    /// Take a ticket before awaiting the auth service.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::InvalidTransition`] unless the router is on
    /// Login.
    pub fn begin_login(&self) -> Result<LoginTicket, RouterError> {
        self.expect_one_of(&[View::Login], "log in")?;
        Ok(LoginTicket { epoch: self.epoch })
    }

    /// Apply a successful login.
    ///
    /// Saves the session (a failed save is logged, the user still enters the
    /// dashboard for this tab), keeps `user` with `isAuthenticated: true` and
    /// moves to Dashboard. A ticket from before another transition, or a
    /// router no longer on Login, is [`LoginOutcome::Stale`].
    pub async fn complete_login(&mut self, ticket: LoginTicket, user: User) -> LoginOutcome {
        if ticket.epoch != self.epoch || self.current != View::Login {
            debug!(
                ticket = ticket.epoch,
                current = self.epoch,
                view = %self.current,
                "login completed after the router moved on; ignoring"
            );
            return LoginOutcome::Stale;
        }

        let user = user.authenticated();
        if let Err(e) = self.session.save_session(&user).await {
            warn!(error = %e, "failed to persist session");
        }
        self.user = Some(user);
        LoginOutcome::Applied(self.go(View::Dashboard))
    }

    /// Sign out from the dashboard: clear the session and return Home.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::InvalidTransition`] from any view but Dashboard.
    pub async fn logout(&mut self) -> Result<View, RouterError> {
        self.expect_one_of(&[View::Dashboard], "log out")?;
        if let Err(e) = self.session.clear_session().await {
            warn!(error = %e, "failed to clear session");
        }
        self.user = None;
        Ok(self.go(View::Home))
    }

    fn expect_one_of(&self, allowed: &[View], action: &'static str) -> Result<(), RouterError> {
        if allowed.contains(&self.current) {
            Ok(())
        } else {
            Err(RouterError::InvalidTransition {
                from: self.current,
                action,
            })
        }
    }

    fn go(&mut self, next: View) -> View {
        info!(from = %self.current, to = %next, "view transition");
        self.current = next;
        self.epoch = self.epoch.wrapping_add(1);
        next
    }
}

/// The user for a valid session, or `None`.
///
/// A session flag with no readable user behind it is cleared.
async fn restore_user(session: &SessionStore, known: Option<User>) -> Option<User> {
    if !session.is_authenticated().await {
        return None;
    }
    if known.is_some() {
        return known;
    }
    let user = session.get_user().await;
    if user.is_none() {
        warn!("session without a user, clearing");
        if let Err(e) = session.clear_session().await {
            warn!(error = %e, "failed to clear session");
        }
    }
    user
}
