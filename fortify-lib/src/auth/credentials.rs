//! Form data for the token endpoint.

/// Scope requested when none is configured.
pub const DEFAULT_SCOPE: &str = "api-tenant";

/// Credentials exchanged for an access token.
///
/// `Debug` output redacts secrets.
///
/// # Example
///
/// ```
/// use fortify_lib::auth::Credentials;
///
/// let creds = Credentials::password("jdoe", "secret").with_tenant("acme");
/// let form = creds.to_form();
/// assert!(form.contains(&("username".to_string(), "acme\\jdoe".to_string())));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Resource owner password grant.
    Password {
        /// User name.
        username: String,
        /// Password (or personal access token).
        password: String,
        /// Tenant code, prefixed to the user name as `tenant\user`.
        tenant: Option<String>,
        /// Requested scope.
        scope: String,
    },
    /// Client credentials grant.
    ClientCredentials {
        /// API key.
        client_id: String,
        /// API secret.
        client_secret: String,
        /// Requested scope.
        scope: String,
    },
}

impl Credentials {
    /// Creates password credentials with the default scope.
    pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Password {
            username: username.into(),
            password: password.into(),
            tenant: None,
            scope: DEFAULT_SCOPE.to_string(),
        }
    }

    /// Creates client credentials with the default scope.
    pub fn client_credentials(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self::ClientCredentials {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scope: DEFAULT_SCOPE.to_string(),
        }
    }

    /// Sets the tenant (password grant only; ignored otherwise).
    pub fn with_tenant(self, tenant: impl Into<String>) -> Self {
        match self {
            Self::Password {
                username,
                password,
                scope,
                ..
            } => Self::Password {
                username,
                password,
                tenant: Some(tenant.into()),
                scope,
            },
            other => other,
        }
    }

    /// Sets the requested scope.
    pub fn with_scope(mut self, new_scope: impl Into<String>) -> Self {
        match &mut self {
            Self::Password { scope, .. } | Self::ClientCredentials { scope, .. } => {
                *scope = new_scope.into();
            }
        }
        self
    }

    /// Returns the form fields posted to the token endpoint.
    pub fn to_form(&self) -> Vec<(String, String)> {
        let pairs: Vec<(&str, String)> = match self {
            Self::Password {
                username,
                password,
                tenant,
                scope,
            } => {
                let username = match tenant {
                    Some(tenant) => format!("{}\\{}", tenant, username),
                    None => username.clone(),
                };
                vec![
                    ("grant_type", "password".to_string()),
                    ("scope", scope.clone()),
                    ("username", username),
                    ("password", password.clone()),
                ]
            }
            Self::ClientCredentials {
                client_id,
                client_secret,
                scope,
            } => vec![
                ("grant_type", "client_credentials".to_string()),
                ("scope", scope.clone()),
                ("client_id", client_id.clone()),
                ("client_secret", client_secret.clone()),
            ],
        };
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Password {
                username,
                tenant,
                scope,
                ..
            } => f
                .debug_struct("Password")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .field("tenant", tenant)
                .field("scope", scope)
                .finish(),
            Self::ClientCredentials { client_id, scope, .. } => f
                .debug_struct("ClientCredentials")
                .field("client_id", client_id)
                .field("client_secret", &"[REDACTED]")
                .field("scope", scope)
                .finish(),
        }
    }
}
