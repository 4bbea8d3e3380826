//! Credential management for the two-step site login
//!
//! This module handles retrieval, validation and storage of the member id,
//! PIN and admin password. Credentials are read from the environment (a
//! `.env` file is loaded at startup) and can be stored in a `.env` file with
//! owner-only permissions.

use std::env;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use tracing::{info, warn};

use crate::app::client::{LoginProtocol, SessionContext, StepUpLogin};
use crate::config::AppConfig;
use crate::constants::{auth, env as env_constants};
use crate::errors::{AuthError, AuthResult};

/// Login secrets for one member with admin rights
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub member_id: String,
    pub pin: String,
    pub admin_password: String,
}

impl Credentials {
    pub fn new(
        member_id: impl Into<String>,
        pin: impl Into<String>,
        admin_password: impl Into<String>,
    ) -> Self {
        Self {
            member_id: member_id.into(),
            pin: pin.into(),
            admin_password: admin_password.into(),
        }
    }

    /// Read credentials from the process environment
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingCredentials` if any variable is unset or
    /// blank, and `AuthError::InvalidMemberId` for a malformed member id.
    pub fn from_env() -> AuthResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read credentials through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> AuthResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or(AuthError::MissingCredentials)
        };

        let credentials = Self::new(
            read(env_constants::MEMBER_ID)?,
            read(env_constants::PIN)?,
            read(env_constants::ADMIN_PASSWORD)?,
        );
        validate_member_id(&credentials.member_id)?;
        Ok(credentials)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("member_id", &self.member_id)
            .field("pin", &"<redacted>")
            .field("admin_password", &"<redacted>")
            .finish()
    }
}

/// Authentication status information
#[derive(Debug, Clone)]
pub struct AuthStatus {
    /// Whether the member id variable is set
    pub member_id_set: bool,
    /// Whether the PIN variable is set
    pub pin_set: bool,
    /// Whether the admin password variable is set
    pub admin_password_set: bool,
    /// Whether .env file exists in current directory
    pub dotenv_file_exists: bool,
    /// Whether credentials have been verified (None = not tested)
    pub credentials_valid: Option<bool>,
}

impl AuthStatus {
    /// Check if all three credentials are available in environment
    pub fn has_credentials(&self) -> bool {
        self.member_id_set && self.pin_set && self.admin_password_set
    }

    /// Get descriptive status message for display
    pub fn status_message(&self) -> String {
        match (self.has_credentials(), self.credentials_valid) {
            (false, _) => "Missing credentials - run 'auth setup' to configure".to_string(),
            (true, None) => "Credentials configured but not verified".to_string(),
            (true, Some(true)) => "Credentials configured and verified".to_string(),
            (true, Some(false)) => "Credentials configured but login failed".to_string(),
        }
    }
}

/// Check current authentication status
pub fn get_auth_status() -> AuthStatus {
    AuthStatus {
        member_id_set: env::var(env_constants::MEMBER_ID).is_ok(),
        pin_set: env::var(env_constants::PIN).is_ok(),
        admin_password_set: env::var(env_constants::ADMIN_PASSWORD).is_ok(),
        dotenv_file_exists: Path::new(".env").exists(),
        credentials_valid: None,
    }
}

/// Check if credentials exist in environment variables
pub fn check_credentials() -> bool {
    Credentials::from_env().is_ok()
}

/// Prompt user for credentials interactively
pub fn prompt_credentials() -> AuthResult<Credentials> {
    print!("Member ID: ");
    io::stdout().flush().map_err(AuthError::CredentialStorage)?;

    let mut member_id = String::new();
    io::stdin()
        .read_line(&mut member_id)
        .map_err(AuthError::CredentialStorage)?;
    let member_id = member_id.trim().to_string();
    validate_member_id(&member_id)?;

    let pin = read_secret("PIN: ")?;
    let admin_password = read_secret("Admin password: ")?;

    Ok(Credentials::new(member_id, pin, admin_password))
}

fn read_secret(prompt: &str) -> AuthResult<String> {
    let secret = rpassword::prompt_password(prompt)
        .map_err(|e| AuthError::CredentialStorage(io::Error::new(io::ErrorKind::Other, e)))?;
    if secret.is_empty() {
        return Err(AuthError::MissingCredentials);
    }
    Ok(secret)
}

/// Validate member id format
fn validate_member_id(member_id: &str) -> AuthResult<()> {
    if member_id.is_empty() {
        return Err(AuthError::InvalidMemberId {
            reason: "Member id cannot be empty".to_string(),
        });
    }
    if member_id.len() < auth::MIN_MEMBER_ID_LENGTH || member_id.len() > auth::MAX_MEMBER_ID_LENGTH
    {
        return Err(AuthError::InvalidMemberId {
            reason: format!(
                "Member id must be {} to {} characters",
                auth::MIN_MEMBER_ID_LENGTH,
                auth::MAX_MEMBER_ID_LENGTH
            ),
        });
    }
    if !member_id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AuthError::InvalidMemberId {
            reason: "Member id should be alphanumeric".to_string(),
        });
    }
    Ok(())
}

/// Save credentials to `.env` in the current directory
pub fn save_credentials(credentials: &Credentials) -> AuthResult<()> {
    save_credentials_to(Path::new(".env"), credentials)?;

    env::set_var(env_constants::MEMBER_ID, &credentials.member_id);
    env::set_var(env_constants::PIN, &credentials.pin);
    env::set_var(env_constants::ADMIN_PASSWORD, &credentials.admin_password);

    println!("Credentials saved to .env file");

    #[cfg(unix)]
    println!("File permissions set to owner-only (600)");

    #[cfg(not(unix))]
    println!(
        "Warning: File permissions not set (non-Unix system). Please ensure .env file is protected."
    );

    Ok(())
}

/// Merge credentials into an env file, keeping unrelated lines
pub fn save_credentials_to(env_path: &Path, credentials: &Credentials) -> AuthResult<()> {
    let entries = [
        (env_constants::MEMBER_ID, credentials.member_id.as_str()),
        (env_constants::PIN, credentials.pin.as_str()),
        (env_constants::ADMIN_PASSWORD, credentials.admin_password.as_str()),
    ];
    let mut found = [false; 3];
    let mut lines = Vec::new();

    if env_path.exists() {
        let reader = BufReader::new(File::open(env_path)?);
        for line in reader.lines() {
            let line = line?;
            let trimmed = line.trim();
            match entries
                .iter()
                .position(|(name, _)| trimmed.starts_with(&format!("{}=", name)))
            {
                Some(index) => {
                    let (name, value) = entries[index];
                    lines.push(format!("{}={}", name, value));
                    found[index] = true;
                }
                None => lines.push(line),
            }
        }
    }

    for (index, (name, value)) in entries.iter().enumerate() {
        if !found[index] {
            lines.push(format!("{}={}", name, value));
        }
    }

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(env_path)?;
    for line in lines {
        writeln!(file, "{}", line)?;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = file.metadata()?.permissions();
        perms.set_mode(auth::ENV_FILE_PERMISSIONS);
        file.set_permissions(perms)?;
    }

    Ok(())
}

/// Verify credentials by running the full two-step login once
pub async fn verify_credentials(config: &AppConfig) -> AuthResult<bool> {
    let credentials = Credentials::from_env()?;

    println!("Verifying credentials with {}...", config.site.base_url);

    let context = SessionContext::new(&config.client, config.site.clone())?;
    let login = StepUpLogin::new(std::sync::Arc::new(context), credentials);
    let timeout = config.session.login_timeout;

    match tokio::time::timeout(timeout, login.login()).await {
        Ok(Ok(())) => {
            info!("Credential verification succeeded");
            println!("Credentials verified successfully!");
            Ok(true)
        }
        Ok(Err(e)) => {
            warn!("Credential verification failed: {}", e);
            println!("Credential verification failed: {}", e);
            Ok(false)
        }
        Err(_) => {
            let e = AuthError::Timeout {
                seconds: timeout.as_secs(),
            };
            warn!("Credential verification failed: {}", e);
            println!("Credential verification failed: {}", e);
            Ok(false)
        }
    }
}

/// Interactive credential setup workflow
pub async fn setup_credentials(config: &AppConfig) -> AuthResult<()> {
    println!("IG Authentication Setup");
    println!("=======================");
    println!();
    println!("This will configure the member login and admin password used to read reports.");
    println!("Your credentials will be stored in a .env file in the current directory.");
    println!();

    let status = get_auth_status();
    if status.has_credentials() {
        println!("Warning: Credentials are already configured.");
        print!("Do you want to update them? [y/N]: ");
        io::stdout().flush().map_err(AuthError::CredentialStorage)?;

        let mut response = String::new();
        io::stdin()
            .read_line(&mut response)
            .map_err(AuthError::CredentialStorage)?;

        if !response.trim().to_lowercase().starts_with('y') {
            println!("Setup cancelled.");
            return Ok(());
        }
        println!();
    }

    let credentials = prompt_credentials()?;

    println!();
    println!("Saving credentials...");
    save_credentials(&credentials)?;

    println!();
    if verify_credentials(config).await? {
        println!();
        println!("Setup complete! You can now fetch reports.");
    } else {
        println!();
        println!("Setup failed. Please check your credentials and try again.");
        println!("   You can run 'auth setup' again to re-enter your credentials.");
    }

    Ok(())
}

/// Show current authentication status, optionally testing the login
pub async fn show_auth_status(config: &AppConfig, verify: bool) -> AuthResult<()> {
    let mut status = get_auth_status();

    println!("IG Authentication Status");
    println!("========================");
    println!();

    match env::var(env_constants::MEMBER_ID) {
        Ok(member_id) => println!("Member ID: {} (set)", member_id),
        Err(_) => println!("Member ID: Not set"),
    }
    println!("PIN: {}", if status.pin_set { "Set" } else { "Not set" });
    println!(
        "Admin password: {}",
        if status.admin_password_set {
            "Set"
        } else {
            "Not set"
        }
    );
    println!(
        ".env file: {}",
        if status.dotenv_file_exists {
            "Exists"
        } else {
            "Not found"
        }
    );
    println!("Site: {}", config.site.base_url);
    println!();

    if verify && status.has_credentials() {
        println!("Testing credentials...");
        status.credentials_valid = Some(verify_credentials(config).await?);
        println!();
    }

    println!("Status: {}", status.status_message());

    if !status.has_credentials() {
        println!();
        println!("To configure credentials, run: ig_fetcher auth setup");
    } else if status.credentials_valid == Some(false) {
        println!();
        println!("To update credentials, run: ig_fetcher auth setup");
    }

    Ok(())
}
