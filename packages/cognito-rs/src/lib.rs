//! Minimal client for the Cognito user-pool JSON API.
//!
//! Public (client-id scoped) actions are plain JSON POSTs. Admin actions are
//! signed with SigV4 and need AWS credentials.

pub mod models;
mod sigv4;

use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{
    AuthenticationResult, CodeDeliveryDetails, CodeDeliveryOutput, InitiateAuthOutput,
    ServiceErrorBody, SignUpOutput, UserProfile,
};

pub use sigv4::AwsCredentials;

pub(crate) const CONTENT_TYPE: &str = "application/x-amz-json-1.1";
const TARGET_PREFIX: &str = "AWSCognitoIdentityProviderService";

#[derive(Debug, Error)]
pub enum CognitoError {
    /// The provider rejected the call
    #[error("{kind}: {message}")]
    Service {
        status: u16,
        kind: String,
        message: String,
    },

    #[error("request to identity provider failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected identity provider response: {0}")]
    Decode(String),

    /// Sign-in needs an extra step this client does not handle
    #[error("authentication challenge required: {0}")]
    ChallengeRequired(String),

    #[error("AWS credentials are required for {0}")]
    MissingCredentials(&'static str),

    #[error("failed to sign request: {0}")]
    Signing(String),
}

impl CognitoError {
    /// HTTP status to surface to API callers.
    pub fn status(&self) -> u16 {
        match self {
            CognitoError::Service { status, .. } => *status,
            CognitoError::ChallengeRequired(_) => 401,
            _ => 502,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CognitoOptions {
    pub region: String,
    pub user_pool_id: String,
    pub client_id: String,
    /// Needed for admin actions only
    pub credentials: Option<AwsCredentials>,
    /// Override of the regional endpoint
    pub endpoint: Option<String>,
}

impl CognitoOptions {
    pub fn new(
        region: impl Into<String>,
        user_pool_id: impl Into<String>,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            region: region.into(),
            user_pool_id: user_pool_id.into(),
            client_id: client_id.into(),
            credentials: None,
            endpoint: None,
        }
    }

    pub fn with_credentials(mut self, credentials: AwsCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct CognitoClient {
    options: CognitoOptions,
    http: reqwest::Client,
}

impl CognitoClient {
    pub fn new(options: CognitoOptions) -> Self {
        Self {
            options,
            http: reqwest::Client::new(),
        }
    }

    pub fn options(&self) -> &CognitoOptions {
        &self.options
    }

    pub fn endpoint(&self) -> String {
        self.options
            .endpoint
            .clone()
            .unwrap_or_else(|| format!("https://cognito-idp.{}.amazonaws.com/", self.options.region))
    }

    /// Token issuer (`iss` claim) of this user pool.
    pub fn issuer(&self) -> String {
        format!(
            "https://cognito-idp.{}.amazonaws.com/{}",
            self.options.region, self.options.user_pool_id
        )
    }

    /// Public signing keys of this user pool.
    pub fn jwks_url(&self) -> String {
        format!("{}/.well-known/jwks.json", self.issuer())
    }

    /// Register `email` as a new user.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutput, CognitoError> {
        self.call(
            "SignUp",
            &json!({
                "ClientId": self.options.client_id,
                "Username": email,
                "Password": password,
                "UserAttributes": [{ "Name": "email", "Value": email }],
            }),
        )
        .await
    }

    pub async fn confirm_sign_up(&self, email: &str, code: &str) -> Result<(), CognitoError> {
        self.call::<_, IgnoredAny>(
            "ConfirmSignUp",
            &json!({
                "ClientId": self.options.client_id,
                "Username": email,
                "ConfirmationCode": code,
            }),
        )
        .await
        .map(|_| ())
    }

    pub async fn resend_confirmation_code(
        &self,
        email: &str,
    ) -> Result<CodeDeliveryDetails, CognitoError> {
        self.call::<_, CodeDeliveryOutput>(
            "ResendConfirmationCode",
            &json!({ "ClientId": self.options.client_id, "Username": email }),
        )
        .await
        .map(|out| out.code_delivery_details)
    }

    /// Password sign-in (`USER_PASSWORD_AUTH`).
    pub async fn initiate_auth(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthenticationResult, CognitoError> {
        self.authenticate(
            "USER_PASSWORD_AUTH",
            json!({ "USERNAME": email, "PASSWORD": password }),
        )
        .await
    }

    /// Exchange a refresh token for fresh access and id tokens.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthenticationResult, CognitoError> {
        self.authenticate("REFRESH_TOKEN_AUTH", json!({ "REFRESH_TOKEN": refresh_token }))
            .await
    }

    async fn authenticate(
        &self,
        flow: &str,
        parameters: serde_json::Value,
    ) -> Result<AuthenticationResult, CognitoError> {
        let out: InitiateAuthOutput = self
            .call(
                "InitiateAuth",
                &json!({
                    "ClientId": self.options.client_id,
                    "AuthFlow": flow,
                    "AuthParameters": parameters,
                }),
            )
            .await?;

        match (out.authentication_result, out.challenge_name) {
            (Some(result), _) => Ok(result),
            (None, Some(challenge)) => Err(CognitoError::ChallengeRequired(challenge)),
            (None, None) => Err(CognitoError::Decode(
                "InitiateAuth returned neither tokens nor a challenge".into(),
            )),
        }
    }

    pub async fn forgot_password(&self, email: &str) -> Result<CodeDeliveryDetails, CognitoError> {
        self.call::<_, CodeDeliveryOutput>(
            "ForgotPassword",
            &json!({ "ClientId": self.options.client_id, "Username": email }),
        )
        .await
        .map(|out| out.code_delivery_details)
    }

    pub async fn confirm_forgot_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), CognitoError> {
        self.call::<_, IgnoredAny>(
            "ConfirmForgotPassword",
            &json!({
                "ClientId": self.options.client_id,
                "Username": email,
                "ConfirmationCode": code,
                "Password": new_password,
            }),
        )
        .await
        .map(|_| ())
    }

    pub async fn change_password(
        &self,
        access_token: &str,
        previous: &str,
        proposed: &str,
    ) -> Result<(), CognitoError> {
        self.call::<_, IgnoredAny>(
            "ChangePassword",
            &json!({
                "AccessToken": access_token,
                "PreviousPassword": previous,
                "ProposedPassword": proposed,
            }),
        )
        .await
        .map(|_| ())
    }

    /// Revoke every token issued to the user.
    pub async fn global_sign_out(&self, access_token: &str) -> Result<(), CognitoError> {
        self.call::<_, IgnoredAny>("GlobalSignOut", &json!({ "AccessToken": access_token }))
            .await
            .map(|_| ())
    }

    pub async fn get_user(&self, access_token: &str) -> Result<UserProfile, CognitoError> {
        self.call("GetUser", &json!({ "AccessToken": access_token }))
            .await
    }

    /// Add a user to a group. Signed admin action.
    pub async fn admin_add_user_to_group(
        &self,
        username: &str,
        group: &str,
    ) -> Result<(), CognitoError> {
        let credentials = self
            .options
            .credentials
            .as_ref()
            .ok_or(CognitoError::MissingCredentials("AdminAddUserToGroup"))?;

        let body = serde_json::to_vec(&json!({
            "UserPoolId": self.options.user_pool_id,
            "Username": username,
            "GroupName": group,
        }))
        .map_err(|e| CognitoError::Decode(e.to_string()))?;

        let endpoint = self.endpoint();
        let host = url::Url::parse(&endpoint)
            .ok()
            .and_then(|u| {
                u.host_str().map(|h| match u.port() {
                    Some(port) => format!("{}:{}", h, port),
                    None => h.to_string(),
                })
            })
            .ok_or_else(|| CognitoError::Decode(format!("invalid endpoint {}", endpoint)))?;

        let target = format!("{}.AdminAddUserToGroup", TARGET_PREFIX);
        let signed = sigv4::sign(
            credentials,
            &self.options.region,
            &host,
            &target,
            &body,
            chrono::Utc::now(),
        )
        .map_err(|e| CognitoError::Signing(e.to_string()))?;

        let mut headers = self.headers(&target)?;
        headers.insert("x-amz-date", header_value(&signed.amz_date)?);
        headers.insert(header::AUTHORIZATION, header_value(&signed.authorization)?);
        if let Some(token) = &signed.security_token {
            headers.insert("x-amz-security-token", header_value(token)?);
        }

        self.send::<IgnoredAny>("AdminAddUserToGroup", headers, body)
            .await
            .map(|_| ())
    }

    async fn call<B, R>(&self, action: &str, body: &B) -> Result<R, CognitoError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let target = format!("{}.{}", TARGET_PREFIX, action);
        let headers = self.headers(&target)?;
        let body = serde_json::to_vec(body).map_err(|e| CognitoError::Decode(e.to_string()))?;
        self.send(action, headers, body).await
    }

    fn headers(&self, target: &str) -> Result<HeaderMap, CognitoError> {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE));
        headers.insert("x-amz-target", header_value(target)?);
        Ok(headers)
    }

    async fn send<R: DeserializeOwned>(
        &self,
        action: &str,
        headers: HeaderMap,
        body: Vec<u8>,
    ) -> Result<R, CognitoError> {
        debug!(action, "Calling identity provider");

        let response = self
            .http
            .post(self.endpoint())
            .headers(headers)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let error = service_error(status.as_u16(), &bytes);
            warn!(action, status = status.as_u16(), error = %error, "Identity provider error");
            return Err(error);
        }

        // some actions answer with an empty body
        let bytes: &[u8] = if bytes.is_empty() { b"{}" } else { &bytes };
        serde_json::from_slice(bytes).map_err(|e| CognitoError::Decode(e.to_string()))
    }
}

fn header_value(value: &str) -> Result<HeaderValue, CognitoError> {
    HeaderValue::from_str(value).map_err(|e| CognitoError::Decode(e.to_string()))
}

fn service_error(status: u16, body: &[u8]) -> CognitoError {
    let parsed: Option<ServiceErrorBody> = serde_json::from_slice(body).ok();
    let (kind, message) = match parsed {
        Some(b) => (b.kind, b.message),
        None => (None, None),
    };

    // "com.amazonaws...#NotAuthorizedException" -> "NotAuthorizedException"
    let kind = kind
        .map(|k| k.rsplit('#').next().unwrap_or_default().to_string())
        .filter(|k| !k.is_empty())
        .unwrap_or_else(|| "UnknownError".to_string());

    CognitoError::Service {
        status,
        kind,
        message: message.unwrap_or_else(|| String::from_utf8_lossy(body).into_owned()),
    }
}
