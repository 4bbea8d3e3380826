//! Two-step login protocol
//!
//! This module performs the external authentication sequence: the primary
//! member login followed by the admin step-up login. Any HTTP-level failure
//! ends the attempt; retrying is the session coordinator's decision.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;

use super::session::SessionContext;
use crate::auth::Credentials;
use crate::constants::auth;
use crate::errors::{AuthError, AuthResult};

/// Performs one complete login attempt
#[async_trait]
pub trait LoginProtocol: Send + Sync {
    /// Run the login sequence, persisting session cookies on success
    async fn login(&self) -> AuthResult<()>;
}

/// Primary member login followed by admin elevation
pub struct StepUpLogin {
    context: Arc<SessionContext>,
    credentials: Credentials,
}

impl StepUpLogin {
    /// Create a login protocol bound to a session context
    pub fn new(context: Arc<SessionContext>, credentials: Credentials) -> Self {
        Self {
            context,
            credentials,
        }
    }

    /// Form body of the primary login
    fn primary_form(&self) -> Vec<(&'static str, String)> {
        let mut form: Vec<(&'static str, String)> = auth::PRIMARY_TASK_MARKERS
            .iter()
            .map(|(k, v)| (*k, v.to_string()))
            .collect();
        form.push((auth::MEMBER_ID_FIELD, self.credentials.member_id.clone()));
        form.push((auth::PIN_FIELD, self.credentials.pin.clone()));
        form
    }

    /// Form body of the admin step-up login
    fn step_up_form(&self) -> Vec<(&'static str, String)> {
        let mut form: Vec<(&'static str, String)> = auth::STEP_UP_TASK_MARKERS
            .iter()
            .map(|(k, v)| (*k, v.to_string()))
            .collect();
        form.push((
            auth::ADMIN_PASSWORD_FIELD,
            self.credentials.admin_password.clone(),
        ));
        form
    }

    async fn post_form(
        &self,
        path: &str,
        form: &[(&'static str, String)],
    ) -> AuthResult<StatusCode> {
        let url = self
            .context
            .resolve(path)
            .map_err(|e| AuthError::InvalidEndpoint {
                path: path.to_string(),
                error: e.to_string(),
            })?;

        let response = self
            .context
            .client()
            .post(url.as_str())
            .header("Content-Type", "application/x-www-form-urlencoded")
            .header("Referer", self.context.base_url().as_str())
            .form(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AuthError::Timeout {
                        seconds: self.context.request_timeout().as_secs(),
                    }
                } else {
                    AuthError::Http(e)
                }
            })?;

        tracing::debug!("Login POST {} -> {}", url, response.status());
        Ok(response.status())
    }
}

#[async_trait]
impl LoginProtocol for StepUpLogin {
    async fn login(&self) -> AuthResult<()> {
        let site = self.context.site();
        tracing::info!("Starting login for member {}", self.credentials.member_id);

        // Step 1: member id + PIN
        let status = self
            .post_form(&site.login_path, &self.primary_form())
            .await?;
        if !status.is_success() {
            tracing::warn!("Primary login rejected with HTTP {}", status);
            return Err(AuthError::PrimaryLoginFailed {
                status: status.as_u16(),
            });
        }

        // Step 2: admin elevation
        let status = self
            .post_form(&site.step_up_path, &self.step_up_form())
            .await?;
        if !status.is_success() {
            tracing::warn!("Step-up login rejected with HTTP {}", status);
            return Err(AuthError::StepUpFailed {
                status: status.as_u16(),
            });
        }

        tracing::info!("Login and step-up succeeded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::client::config::{ClientConfig, SiteConfig};

    fn login() -> StepUpLogin {
        let context = SessionContext::new(
            &ClientConfig::default(),
            SiteConfig::with_base_url("https://club.example.org"),
        )
        .unwrap();
        StepUpLogin::new(
            Arc::new(context),
            Credentials::new("1234", "9876", "admin-secret"),
        )
    }

    #[test]
    fn test_primary_form_contents() {
        let form = login().primary_form();
        assert!(form.contains(&("task", "login".to_string())));
        assert!(form.contains(&(auth::MEMBER_ID_FIELD, "1234".to_string())));
        assert!(form.contains(&(auth::PIN_FIELD, "9876".to_string())));
        assert!(!form.iter().any(|(_, v)| v == "admin-secret"));
    }

    #[test]
    fn test_step_up_form_contents() {
        let form = login().step_up_form();
        assert!(form.contains(&(auth::ADMIN_PASSWORD_FIELD, "admin-secret".to_string())));
        assert!(!form.iter().any(|(_, v)| v == "9876"));
    }
}
