//! Seam between the auth routes and the user-pool client.

use async_trait::async_trait;
use cognito::models::{AuthenticationResult, CodeDeliveryDetails, SignUpOutput, UserProfile};
use cognito::{CognitoClient, CognitoError};

/// Group every confirmed user joins.
pub const DEFAULT_GROUP: &str = "User";

/// Group allowed to trigger scrapes.
pub const ADMIN_GROUP: &str = "Admin";

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutput, CognitoError>;
    async fn confirm_sign_up(&self, email: &str, code: &str) -> Result<(), CognitoError>;
    async fn add_user_to_group(&self, email: &str, group: &str) -> Result<(), CognitoError>;
    async fn resend_confirmation_code(&self, email: &str) -> Result<CodeDeliveryDetails, CognitoError>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthenticationResult, CognitoError>;
    async fn refresh(&self, refresh_token: &str) -> Result<AuthenticationResult, CognitoError>;
    async fn forgot_password(&self, email: &str) -> Result<CodeDeliveryDetails, CognitoError>;
    async fn confirm_forgot_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), CognitoError>;
    async fn change_password(
        &self,
        access_token: &str,
        previous: &str,
        proposed: &str,
    ) -> Result<(), CognitoError>;
    async fn sign_out(&self, access_token: &str) -> Result<(), CognitoError>;
    async fn get_user(&self, access_token: &str) -> Result<UserProfile, CognitoError>;
}

#[async_trait]
impl IdentityProvider for CognitoClient {
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutput, CognitoError> {
        CognitoClient::sign_up(self, email, password).await
    }

    async fn confirm_sign_up(&self, email: &str, code: &str) -> Result<(), CognitoError> {
        CognitoClient::confirm_sign_up(self, email, code).await
    }

    async fn add_user_to_group(&self, email: &str, group: &str) -> Result<(), CognitoError> {
        self.admin_add_user_to_group(email, group).await
    }

    async fn resend_confirmation_code(&self, email: &str) -> Result<CodeDeliveryDetails, CognitoError> {
        CognitoClient::resend_confirmation_code(self, email).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthenticationResult, CognitoError> {
        self.initiate_auth(email, password).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthenticationResult, CognitoError> {
        CognitoClient::refresh(self, refresh_token).await
    }

    async fn forgot_password(&self, email: &str) -> Result<CodeDeliveryDetails, CognitoError> {
        CognitoClient::forgot_password(self, email).await
    }

    async fn confirm_forgot_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), CognitoError> {
        CognitoClient::confirm_forgot_password(self, email, code, new_password).await
    }

    async fn change_password(
        &self,
        access_token: &str,
        previous: &str,
        proposed: &str,
    ) -> Result<(), CognitoError> {
        CognitoClient::change_password(self, access_token, previous, proposed).await
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), CognitoError> {
        self.global_sign_out(access_token).await
    }

    async fn get_user(&self, access_token: &str) -> Result<UserProfile, CognitoError> {
        CognitoClient::get_user(self, access_token).await
    }
}
