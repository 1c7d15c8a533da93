//! Auth view form state.
//!
//! Tracks the active mode (sign in / sign up / reset), the entered
//! credentials and whether a submission is in flight. A pending submission
//! disables the submit control: [`AuthForm::begin_submit`] returns `None`
//! until it finishes.

use super::gate::SessionGate;
use super::provider::IdentityProvider;
use crate::notify::{NoticeId, Notifications};

pub const SIGNED_IN_MESSAGE: &str = "Successfully signed in!";
pub const SIGNED_UP_MESSAGE: &str = "Registration successful! Please check your email.";
pub const RESET_SENT_MESSAGE: &str = "Password reset instructions sent to your email.";
pub const SIGNED_OUT_MESSAGE: &str = "Logged out successfully";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    #[default]
    SignIn,
    SignUp,
    Reset,
}

impl AuthMode {
    pub fn title(self) -> &'static str {
        match self {
            AuthMode::SignIn => "Sign In",
            AuthMode::SignUp => "Create Account",
            AuthMode::Reset => "Reset Password",
        }
    }

    pub fn submit_label(self) -> &'static str {
        match self {
            AuthMode::SignIn => "Sign In",
            AuthMode::SignUp => "Sign Up",
            AuthMode::Reset => "Reset Password",
        }
    }

    /// Mode switches offered below the form, with their labels.
    pub fn switches(self) -> &'static [(AuthMode, &'static str)] {
        match self {
            AuthMode::SignIn => &[
                (AuthMode::SignUp, "Create new account"),
                (AuthMode::Reset, "Forgot your password?"),
            ],
            AuthMode::SignUp | AuthMode::Reset => &[(AuthMode::SignIn, "Back to sign in")],
        }
    }

    pub fn needs_password(self) -> bool {
        !matches!(self, AuthMode::Reset)
    }
}

/// A provider call requested by the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    SignIn { email: String, password: String },
    SignUp { email: String, password: String },
    Reset { email: String },
}

#[derive(Debug, Default)]
pub struct AuthForm {
    mode: AuthMode,
    pub email: String,
    pub password: String,
    pending: bool,
}

impl AuthForm {
    pub fn new(mode: AuthMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    /// Switches mode. Entered values are kept.
    pub fn set_mode(&mut self, mode: AuthMode) {
        self.mode = mode;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn submit_label(&self) -> &'static str {
        if self.pending {
            "Processing..."
        } else {
            self.mode.submit_label()
        }
    }

    /// Marks the form pending and returns the call to make, or `None` while a
    /// previous submission is still in flight.
    pub fn begin_submit(&mut self) -> Option<Submission> {
        if self.pending {
            return None;
        }
        self.pending = true;
        let email = self.email.trim().to_string();
        Some(match self.mode {
            AuthMode::SignIn => Submission::SignIn {
                email,
                password: self.password.clone(),
            },
            AuthMode::SignUp => Submission::SignUp {
                email,
                password: self.password.clone(),
            },
            AuthMode::Reset => Submission::Reset { email },
        })
    }

    pub fn finish_submit(&mut self) {
        self.pending = false;
    }

    /// Runs the submission against `gate` and reports the outcome as a notice.
    ///
    /// Returns `None` if a submission was already pending.
    pub async fn submit<P: IdentityProvider>(
        &mut self,
        gate: &mut SessionGate<P>,
        notices: &mut Notifications,
    ) -> Option<NoticeId> {
        let submission = self.begin_submit()?;
        let outcome = match &submission {
            Submission::SignIn { email, password } => gate
                .sign_in(email, password)
                .await
                .map(|_| SIGNED_IN_MESSAGE),
            Submission::SignUp { email, password } => gate
                .sign_up(email, password)
                .await
                .map(|_| SIGNED_UP_MESSAGE),
            Submission::Reset { email } => gate
                .request_password_reset(email)
                .await
                .map(|()| RESET_SENT_MESSAGE),
        };
        self.finish_submit();

        Some(match outcome {
            Ok(message) => notices.success(message),
            Err(err) => notices.error(err.message()),
        })
    }
}

/// Signs out through `gate` and reports the outcome as a notice.
pub async fn sign_out<P: IdentityProvider>(
    gate: &mut SessionGate<P>,
    notices: &mut Notifications,
) -> NoticeId {
    match gate.sign_out().await {
        Ok(()) => notices.success(SIGNED_OUT_MESSAGE),
        Err(err) => notices.error(err.message()),
    }
}
