//! In-process stand-ins for the user pool and the scrape launcher.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use cognito::models::{AuthenticationResult, CodeDeliveryDetails, SignUpOutput, UserProfile};
use cognito::CognitoError;
use server_core::domains::auth::IdentityProvider;
use server_core::kernel::ScrapeTrigger;

pub const GOOD_PASSWORD: &str = "Correct-Horse-1";
pub const GOOD_CODE: &str = "123456";

fn rejected(kind: &str, message: &str) -> CognitoError {
    CognitoError::Service {
        status: 400,
        kind: kind.to_string(),
        message: message.to_string(),
    }
}

fn tokens(refresh: bool) -> AuthenticationResult {
    AuthenticationResult {
        access_token: "access-token".into(),
        refresh_token: refresh.then(|| "refresh-token".to_string()),
        id_token: "id-token".into(),
        token_type: "Bearer".into(),
        expires_in: 3600,
    }
}

/// Records every call as `"action:arg"`.
#[derive(Default)]
pub struct FakeIdentity {
    calls: Mutex<Vec<String>>,
    fail_group_assignment: AtomicBool,
}

impl FakeIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_group_assignment(&self) {
        self.fail_group_assignment.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, action: &str, arg: &str) {
        self.calls.lock().unwrap().push(format!("{}:{}", action, arg));
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn sign_up(&self, email: &str, _password: &str) -> Result<SignUpOutput, CognitoError> {
        self.record("sign_up", email);
        if email == "taken@example.com" {
            return Err(rejected("UsernameExistsException", "User already exists"));
        }
        Ok(SignUpOutput {
            user_confirmed: false,
            user_sub: format!("sub-{}", email),
        })
    }

    async fn confirm_sign_up(&self, email: &str, code: &str) -> Result<(), CognitoError> {
        self.record("confirm_sign_up", email);
        if code != GOOD_CODE {
            return Err(rejected("CodeMismatchException", "Invalid verification code provided"));
        }
        Ok(())
    }

    async fn add_user_to_group(&self, email: &str, group: &str) -> Result<(), CognitoError> {
        self.record("add_user_to_group", &format!("{}/{}", email, group));
        if self.fail_group_assignment.load(Ordering::SeqCst) {
            return Err(CognitoError::MissingCredentials("admin actions need AWS credentials"));
        }
        Ok(())
    }

    async fn resend_confirmation_code(&self, email: &str) -> Result<CodeDeliveryDetails, CognitoError> {
        self.record("resend_confirmation_code", email);
        Ok(CodeDeliveryDetails::default())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthenticationResult, CognitoError> {
        self.record("sign_in", email);
        if password != GOOD_PASSWORD {
            return Err(rejected("NotAuthorizedException", "Incorrect username or password."));
        }
        Ok(tokens(true))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthenticationResult, CognitoError> {
        self.record("refresh", refresh_token);
        Ok(tokens(false))
    }

    async fn forgot_password(&self, email: &str) -> Result<CodeDeliveryDetails, CognitoError> {
        self.record("forgot_password", email);
        Ok(CodeDeliveryDetails::default())
    }

    async fn confirm_forgot_password(
        &self,
        email: &str,
        code: &str,
        _new_password: &str,
    ) -> Result<(), CognitoError> {
        self.record("confirm_forgot_password", email);
        if code != GOOD_CODE {
            return Err(rejected("CodeMismatchException", "Invalid verification code provided"));
        }
        Ok(())
    }

    async fn change_password(
        &self,
        access_token: &str,
        previous: &str,
        _proposed: &str,
    ) -> Result<(), CognitoError> {
        self.record("change_password", access_token);
        if previous != GOOD_PASSWORD {
            return Err(rejected("NotAuthorizedException", "Incorrect username or password."));
        }
        Ok(())
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), CognitoError> {
        self.record("sign_out", access_token);
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> Result<UserProfile, CognitoError> {
        self.record("get_user", access_token);
        Ok(UserProfile {
            username: "user".into(),
            user_attributes: vec![],
        })
    }
}

/// Remembers the keywords of every triggered run without starting one.
#[derive(Default)]
pub struct RecordingTrigger {
    triggered: Mutex<Vec<String>>,
}

impl RecordingTrigger {
    pub fn triggered(&self) -> Vec<String> {
        self.triggered.lock().unwrap().clone()
    }
}

impl ScrapeTrigger for RecordingTrigger {
    fn trigger(&self, keywords: String) {
        self.triggered.lock().unwrap().push(keywords);
    }
}
