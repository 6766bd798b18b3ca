// ─── Microsoft OAuth chain ───
// Token → XBL → XSTS → game token → profile. Every hop consumes the
// previous hop's output; each one reports through the uniform envelope.

use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::response::RestResponse;

const TOKEN_URL: &str = "https://login.microsoftonline.com/consumers/oauth2/v2.0/token";
const XBL_AUTH_URL: &str = "https://user.auth.xboxlive.com/user/authenticate";
const XSTS_AUTH_URL: &str = "https://xsts.auth.xboxlive.com/xsts/authorize";
const MC_LOGIN_URL: &str = "https://api.minecraftservices.com/authentication/login_with_xbox";
const MC_PROFILE_URL: &str = "https://api.minecraftservices.com/minecraft/profile";

const OAUTH_SCOPE: &str = "XboxLive.signin";
const XSTS_RELYING_PARTY: &str = "rp://api.minecraftservices.com/";
const XSTS_SANDBOX: &str = "RETAIL";

// ── Error classification ────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MicrosoftErrorCode {
    NoXboxAccount,
    XblBanned,
    Under18,
    NotOwned,
    Unknown,
}

impl MicrosoftErrorCode {
    /// XSTS authorization failures carry a numeric `XErr`.
    pub fn from_xsts_xerr(xerr: u64) -> Self {
        match xerr {
            2148916233 => MicrosoftErrorCode::NoXboxAccount,
            2148916235 => MicrosoftErrorCode::XblBanned,
            2148916238 => MicrosoftErrorCode::Under18,
            _ => MicrosoftErrorCode::Unknown,
        }
    }

    /// Profile endpoint failures mark an account that never bought the game.
    pub fn from_profile_body(body: &serde_json::Value) -> Self {
        let path = body.get("path").and_then(|v| v.as_str()).unwrap_or("");
        let error_type = body.get("errorType").and_then(|v| v.as_str()).unwrap_or("");
        if path == "/minecraft/profile" && error_type == "NOT_FOUND" {
            MicrosoftErrorCode::NotOwned
        } else {
            MicrosoftErrorCode::Unknown
        }
    }
}

// ── Wire shapes ─────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizationTokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(skip, default = "Utc::now")]
    received_at: DateTime<Utc>,
}

impl AuthorizationTokenResponse {
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.received_at + Duration::seconds(self.expires_in)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct XboxServiceTokenResponse {
    pub issue_instant: String,
    pub not_after: String,
    pub token: String,
    pub display_claims: DisplayClaims,
}

impl XboxServiceTokenResponse {
    /// Xbox user hash from the first claim.
    pub fn user_hash(&self) -> Option<&str> {
        self.display_claims.xui.first().map(|x| x.uhs.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayClaims {
    pub xui: Vec<XuiClaim>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct XuiClaim {
    pub uhs: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct McTokenResponse {
    pub access_token: String,
    pub expires_in: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(skip, default = "Utc::now")]
    received_at: DateTime<Utc>,
}

impl McTokenResponse {
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.received_at + Duration::seconds(self.expires_in)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub skins: Vec<serde_json::Value>,
    #[serde(default)]
    pub capes: Vec<serde_json::Value>,
}

/// Which grant the token endpoint should run.
pub enum TokenGrant<'a> {
    AuthorizationCode(&'a str),
    RefreshToken(&'a str),
}

// ── REST client ─────────────────────────────────────────

pub struct MicrosoftRestClient {
    client: Client,
    client_id: String,
    redirect_uri: String,
}

impl MicrosoftRestClient {
    pub fn new(client: Client, client_id: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
        Self {
            client,
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
        }
    }

    /// Step 1: exchange an authorization code or refresh token.
    pub async fn get_access_token(
        &self,
        grant: TokenGrant<'_>,
    ) -> RestResponse<AuthorizationTokenResponse, MicrosoftErrorCode> {
        let mut form = vec![
            ("client_id", self.client_id.as_str()),
            ("scope", OAUTH_SCOPE),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];
        match &grant {
            TokenGrant::AuthorizationCode(code) => {
                form.push(("grant_type", "authorization_code"));
                form.push(("code", code));
            }
            TokenGrant::RefreshToken(token) => {
                form.push(("grant_type", "refresh_token"));
                form.push(("refresh_token", token));
            }
        }

        let response = match self.client.post(TOKEN_URL).form(&form).send().await {
            Ok(response) => response,
            Err(e) => return RestResponse::failure(e.to_string(), None),
        };
        decode_or_unknown(response).await
    }

    /// Step 2: Xbox Live user token from the OAuth access token.
    pub async fn get_xbl_token(
        &self,
        access_token: &str,
    ) -> RestResponse<XboxServiceTokenResponse, MicrosoftErrorCode> {
        let body = json!({
            "Properties": {
                "AuthMethod": "RPS",
                "SiteName": "user.auth.xboxlive.com",
                "RpsTicket": format!("d={access_token}"),
            },
            "RelyingParty": "http://auth.xboxlive.com",
            "TokenType": "JWT",
        });

        let response = match self.client.post(XBL_AUTH_URL).json(&body).send().await {
            Ok(response) => response,
            Err(e) => return RestResponse::failure(e.to_string(), None),
        };
        decode_or_unknown(response).await
    }

    /// Step 3: XSTS delegated token. Denials carry an `XErr` that maps to
    /// the known account conditions.
    pub async fn get_xsts_token(
        &self,
        xbl_token: &str,
    ) -> RestResponse<XboxServiceTokenResponse, MicrosoftErrorCode> {
        let body = json!({
            "Properties": {
                "SandboxId": XSTS_SANDBOX,
                "UserTokens": [xbl_token],
            },
            "RelyingParty": XSTS_RELYING_PARTY,
            "TokenType": "JWT",
        });

        let response = match self.client.post(XSTS_AUTH_URL).json(&body).send().await {
            Ok(response) => response,
            Err(e) => return RestResponse::failure(e.to_string(), None),
        };

        if response.status().is_success() {
            return decode_or_unknown(response).await;
        }

        let body: serde_json::Value = response.json().await.unwrap_or(serde_json::Value::Null);
        let code = body
            .get("XErr")
            .and_then(|v| v.as_u64())
            .map(MicrosoftErrorCode::from_xsts_xerr)
            .unwrap_or(MicrosoftErrorCode::Unknown);
        debug!("XSTS denied: {code:?}");
        RestResponse::failure("XSTS authorization denied", Some(code))
    }

    /// Step 4: game token from the combined user hash and XSTS token.
    pub async fn get_mc_access_token(
        &self,
        user_hash: &str,
        xsts_token: &str,
    ) -> RestResponse<McTokenResponse, MicrosoftErrorCode> {
        let body = json!({
            "identityToken": format!("XBL3.0 x={user_hash};{xsts_token}"),
        });

        let response = match self.client.post(MC_LOGIN_URL).json(&body).send().await {
            Ok(response) => response,
            Err(e) => return RestResponse::failure(e.to_string(), None),
        };
        decode_or_unknown(response).await
    }

    /// Step 5: game profile. A NOT_FOUND on the profile path means the
    /// account does not own the game.
    pub async fn get_mc_profile(
        &self,
        mc_access_token: &str,
    ) -> RestResponse<McProfile, MicrosoftErrorCode> {
        let response = match self
            .client
            .get(MC_PROFILE_URL)
            .bearer_auth(mc_access_token)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return RestResponse::failure(e.to_string(), None),
        };

        if response.status() == StatusCode::OK {
            return decode_or_unknown(response).await;
        }

        let body: serde_json::Value = response.json().await.unwrap_or(serde_json::Value::Null);
        let code = MicrosoftErrorCode::from_profile_body(&body);
        RestResponse::failure("profile request rejected", Some(code))
    }

    /// Run the whole chain from a fresh token grant to a profile.
    pub async fn full_login(
        &self,
        grant: TokenGrant<'_>,
    ) -> RestResponse<(AuthorizationTokenResponse, McTokenResponse, McProfile), MicrosoftErrorCode>
    {
        macro_rules! step {
            ($response:expr) => {{
                let r = $response;
                match r.data {
                    Some(data) if r.is_success() => data,
                    _ => {
                        return RestResponse::failure(
                            r.error.unwrap_or_else(|| "login chain failed".into()),
                            r.provider_code,
                        )
                    }
                }
            }};
        }

        let tokens = step!(self.get_access_token(grant).await);
        let xbl = step!(self.get_xbl_token(&tokens.access_token).await);
        let xsts = step!(self.get_xsts_token(&xbl.token).await);
        let Some(user_hash) = xbl.user_hash() else {
            return RestResponse::failure("XBL reply carried no user hash", None);
        };
        let mc_token = step!(self.get_mc_access_token(user_hash, &xsts.token).await);
        let profile = step!(self.get_mc_profile(&mc_token.access_token).await);

        RestResponse::success((tokens, mc_token, profile))
    }
}

async fn decode_or_unknown<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> RestResponse<T, MicrosoftErrorCode> {
    let status = response.status();
    if !status.is_success() {
        return RestResponse::failure(
            format!("HTTP {status}"),
            Some(MicrosoftErrorCode::Unknown),
        );
    }
    match response.json::<T>().await {
        Ok(data) => RestResponse::success(data),
        Err(e) => RestResponse::failure(e.to_string(), Some(MicrosoftErrorCode::Unknown)),
    }
}
