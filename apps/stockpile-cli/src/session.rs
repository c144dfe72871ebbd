//! # Session
//!
//! Who is running the command, and what they may do.
//!
//! ```text
//! --user / --password ──► UserRepository::authenticate ──► Session { user }
//!                                                             │
//!        command ──► Action (e.g. RecordSales) ──► Role::allows ──► run
//!                                                             └──► FORBIDDEN
//! ```

use stockpile_core::{Action, User};
use stockpile_db::Database;
use tracing::{debug, info, warn};

use crate::config::AdminSettings;
use crate::error::{CliError, CliResult};

/// The logged-in account.
#[derive(Debug, Clone)]
pub struct Session {
    user: User,
}

impl Session {
    pub fn new(user: User) -> Self {
        Session { user }
    }

    /// Checks the supplied credentials against the user store.
    ///
    /// Unknown users and wrong passwords produce the same error.
    pub async fn login(
        db: &Database,
        username: Option<&str>,
        password: Option<&str>,
    ) -> CliResult<Self> {
        let (Some(username), Some(password)) = (username, password) else {
            return Err(CliError::unauthorized(
                "Login required: pass --user and --password (or STOCKPILE_USER and STOCKPILE_PASSWORD)",
            ));
        };

        match db.users().authenticate(username, password).await? {
            Some(user) => {
                info!(username = %user.username, role = %user.role, "Logged in");
                Ok(Session::new(user))
            }
            None => Err(CliError::unauthorized("Invalid username or password")),
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    /// Fails with `FORBIDDEN` unless the account's role allows `action`.
    pub fn require(&self, action: Action) -> CliResult<()> {
        if self.user.role.allows(action) {
            debug!(username = %self.user.username, %action, "Permission granted");
            Ok(())
        } else {
            warn!(username = %self.user.username, role = %self.user.role, %action, "Permission denied");
            Err(CliError::forbidden(format!(
                "{} accounts may not {}",
                self.user.role, action
            )))
        }
    }
}

/// Creates the configured admin account on first start.
pub async fn bootstrap_admin(db: &Database, admin: &AdminSettings) -> CliResult<bool> {
    Ok(db
        .users()
        .ensure_default_admin(&admin.username, &admin.password)
        .await?)
}
