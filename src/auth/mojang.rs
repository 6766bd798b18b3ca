// ─── Yggdrasil (legacy) ───
// authenticate / validate / refresh / invalidate against the legacy
// username-password scheme, plus the public service status projection.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use super::response::RestResponse;
use crate::error::retryable_transport;

const AUTH_BASE: &str = "https://authserver.mojang.com";
const STATUS_SUMMARY_URL: &str = "https://status.mojang.com/summary.json";

const AGENT_NAME: &str = "Minecraft";
const AGENT_VERSION: u32 = 1;

// ── Error classification ────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MojangErrorCode {
    MethodNotAllowed,
    NotFound,
    UserMigrated,
    InvalidCredentials,
    Ratelimit,
    InvalidToken,
    AccessTokenHasProfile,
    CredentialsMissing,
    InvalidSaltVersion,
    UnsupportedMediaType,
    Gone,
    Unreachable,
    Unknown,
}

impl MojangErrorCode {
    /// Classify an error body `{error, errorMessage, cause?}`.
    pub fn from_error_body(body: &serde_json::Value) -> Self {
        let error = body.get("error").and_then(|v| v.as_str()).unwrap_or("");
        let message = body
            .get("errorMessage")
            .and_then(|v| v.as_str())
            .unwrap_or("");
        let cause = body.get("cause").and_then(|v| v.as_str()).unwrap_or("");

        match error {
            "Method Not Allowed" => MojangErrorCode::MethodNotAllowed,
            "Not Found" => MojangErrorCode::NotFound,
            "Unsupported Media Type" => MojangErrorCode::UnsupportedMediaType,
            "ForbiddenOperationException" => {
                if cause == "UserMigratedException" {
                    return MojangErrorCode::UserMigrated;
                }
                match message {
                    "Invalid credentials. Invalid username or password." => {
                        MojangErrorCode::InvalidCredentials
                    }
                    "Invalid credentials." => MojangErrorCode::Ratelimit,
                    "Invalid token." => MojangErrorCode::InvalidToken,
                    "Forbidden" => MojangErrorCode::CredentialsMissing,
                    _ => MojangErrorCode::Unknown,
                }
            }
            "IllegalArgumentException" => match message {
                "Access token already has a profile assigned." => {
                    MojangErrorCode::AccessTokenHasProfile
                }
                "Invalid salt version" => MojangErrorCode::InvalidSaltVersion,
                _ => MojangErrorCode::Unknown,
            },
            "ResourceException" | "GoneException" => MojangErrorCode::Gone,
            _ => MojangErrorCode::Unknown,
        }
    }

    /// Codes that indicate a malformed request on our side: report these as
    /// bugs, not credential problems.
    pub fn is_internal_error(&self) -> bool {
        matches!(
            self,
            MojangErrorCode::MethodNotAllowed
                | MojangErrorCode::NotFound
                | MojangErrorCode::AccessTokenHasProfile
                | MojangErrorCode::CredentialsMissing
                | MojangErrorCode::InvalidSaltVersion
                | MojangErrorCode::UnsupportedMediaType
        )
    }
}

// ── Wire shapes ─────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MojangSession {
    pub access_token: String,
    pub client_token: String,
    pub selected_profile: MojangProfile,
    #[serde(default)]
    pub user: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MojangProfile {
    pub id: String,
    pub name: String,
}

// ── Status projection ───────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusColor {
    Green,
    Yellow,
    Red,
    Grey,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub service: &'static str,
    pub name: &'static str,
    pub essential: bool,
    pub status: StatusColor,
}

/// Pure template: every known service, grey until proven otherwise.
fn default_statuses() -> Vec<ServiceStatus> {
    const SERVICES: [(&str, &str, bool); 6] = [
        (
            "mojang-multiplayer-session-service",
            "Sesiones multijugador",
            true,
        ),
        ("microsoft-o-auth-server", "Servidor OAuth de Microsoft", true),
        ("xbox-live-auth-server", "Autenticación Xbox Live", true),
        ("xbox-live-gatekeeper", "Xbox Live Gatekeeper", false),
        ("microsoft-minecraft-api", "API de Minecraft", true),
        (
            "microsoft-minecraft-profile",
            "Perfil de Minecraft",
            false,
        ),
    ];
    SERVICES
        .iter()
        .map(|(service, name, essential)| ServiceStatus {
            service,
            name,
            essential: *essential,
            status: StatusColor::Grey,
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct StatusEntry {
    slug: String,
    status: String,
}

/// Project the summary entries onto a freshly-built template.
fn project_statuses(entries: &[StatusEntry]) -> Vec<ServiceStatus> {
    let mut statuses = default_statuses();
    for service in &mut statuses {
        let Some(entry) = entries.iter().find(|e| e.slug == service.service) else {
            continue;
        };
        service.status = match entry.status.as_str() {
            "up" => StatusColor::Green,
            "down" => StatusColor::Red,
            _ => StatusColor::Grey,
        };
    }
    statuses
}

// ── REST client ─────────────────────────────────────────

pub struct MojangRestClient {
    client: Client,
    auth_base: String,
    status_url: String,
}

impl MojangRestClient {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            auth_base: AUTH_BASE.to_string(),
            status_url: STATUS_SUMMARY_URL.to_string(),
        }
    }

    /// Point the client at a different deployment (mock servers in tests).
    pub fn with_bases(mut self, auth_base: impl Into<String>, status_url: impl Into<String>) -> Self {
        self.auth_base = auth_base.into();
        self.status_url = status_url.into();
        self
    }

    /// Authenticate a username/password pair. A missing `client_token`
    /// generates a fresh one.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
        client_token: Option<String>,
    ) -> RestResponse<MojangSession, MojangErrorCode> {
        let client_token = client_token.unwrap_or_else(|| Uuid::new_v4().simple().to_string());
        let body = json!({
            "agent": { "name": AGENT_NAME, "version": AGENT_VERSION },
            "username": username,
            "password": password,
            "clientToken": client_token,
            "requestUser": true,
        });

        let response = match self
            .client
            .post(format!("{}/authenticate", self.auth_base))
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return transport_failure(e),
        };

        if response.status() == StatusCode::OK {
            match response.json::<MojangSession>().await {
                Ok(session) => RestResponse::success(session),
                Err(e) => RestResponse::failure(e.to_string(), Some(MojangErrorCode::Unknown)),
            }
        } else {
            classify_error_response(response).await
        }
    }

    /// `true` when the token pair is still usable. A 403 is a semantic
    /// "no": the envelope stays SUCCESS with `data = false`.
    pub async fn validate(
        &self,
        access_token: &str,
        client_token: &str,
    ) -> RestResponse<bool, MojangErrorCode> {
        let body = json!({ "accessToken": access_token, "clientToken": client_token });

        let response = match self
            .client
            .post(format!("{}/validate", self.auth_base))
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return transport_failure(e),
        };

        match response.status() {
            StatusCode::NO_CONTENT | StatusCode::OK => RestResponse::success(true),
            StatusCode::FORBIDDEN => RestResponse::success(false),
            _ => classify_error_response(response).await,
        }
    }

    /// Invalidate a token pair.
    pub async fn invalidate(
        &self,
        access_token: &str,
        client_token: &str,
    ) -> RestResponse<(), MojangErrorCode> {
        let body = json!({ "accessToken": access_token, "clientToken": client_token });

        let response = match self
            .client
            .post(format!("{}/invalidate", self.auth_base))
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return transport_failure(e),
        };

        if response.status().is_success() {
            RestResponse::success(())
        } else {
            classify_error_response(response).await
        }
    }

    /// Exchange a stale access token for a fresh session.
    pub async fn refresh(
        &self,
        access_token: &str,
        client_token: &str,
    ) -> RestResponse<MojangSession, MojangErrorCode> {
        let body = json!({
            "accessToken": access_token,
            "clientToken": client_token,
            "requestUser": true,
        });

        let response = match self
            .client
            .post(format!("{}/refresh", self.auth_base))
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return transport_failure(e),
        };

        if response.status() == StatusCode::OK {
            match response.json::<MojangSession>().await {
                Ok(session) => RestResponse::success(session),
                Err(e) => RestResponse::failure(e.to_string(), Some(MojangErrorCode::Unknown)),
            }
        } else {
            classify_error_response(response).await
        }
    }

    /// Poll the service summary. The projection is always freshly built;
    /// a transport failure yields the all-grey template on an ERROR
    /// envelope.
    pub async fn status(&self) -> RestResponse<Vec<ServiceStatus>, MojangErrorCode> {
        let entries: Result<Vec<StatusEntry>, _> = async {
            self.client
                .get(&self.status_url)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await
        }
        .await;

        match entries {
            Ok(entries) => RestResponse::success(project_statuses(&entries)),
            Err(e) => {
                warn!("Status summary unavailable: {e}");
                let mut failure = RestResponse::failure(
                    e.to_string(),
                    Some(if retryable_transport(&e) {
                        MojangErrorCode::Unreachable
                    } else {
                        MojangErrorCode::Unknown
                    }),
                );
                failure.data = Some(default_statuses());
                failure
            }
        }
    }
}

async fn classify_error_response<T>(
    response: reqwest::Response,
) -> RestResponse<T, MojangErrorCode> {
    let status = response.status();
    let body: serde_json::Value = response.json().await.unwrap_or(serde_json::Value::Null);
    let code = MojangErrorCode::from_error_body(&body);
    debug!("Yggdrasil error ({status}): {code:?}");

    let message = body
        .get("errorMessage")
        .and_then(|v| v.as_str())
        .unwrap_or("request rejected")
        .to_string();
    RestResponse::failure(message, Some(code))
}

fn transport_failure<T>(e: reqwest::Error) -> RestResponse<T, MojangErrorCode> {
    let code = if retryable_transport(&e) {
        MojangErrorCode::Unreachable
    } else {
        MojangErrorCode::Unknown
    };
    RestResponse::failure(e.to_string(), Some(code))
}
