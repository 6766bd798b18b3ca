// ─── Identity Providers ───
// Both providers wrap every outbound request into the uniform response
// envelope and classify failures into provider-specific codes.

mod microsoft;
mod mojang;
mod response;

pub use microsoft::{
    AuthorizationTokenResponse, McProfile, McTokenResponse, MicrosoftErrorCode,
    MicrosoftRestClient, TokenGrant, XboxServiceTokenResponse,
};
pub use mojang::{
    MojangErrorCode, MojangProfile, MojangRestClient, MojangSession, ServiceStatus, StatusColor,
};
pub use response::{ResponseStatus, RestResponse};
