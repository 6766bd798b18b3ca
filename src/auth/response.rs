use serde::Serialize;

/// Outcome of an outbound request, independent of any provider code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Uniform envelope around every network-facing operation.
///
/// `status` and `provider_code` are independent: an error envelope may or
/// may not carry a provider-specific code.
#[derive(Debug, Clone, Serialize)]
pub struct RestResponse<T, C> {
    pub data: Option<T>,
    pub status: ResponseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_code: Option<C>,
}

impl<T, C> RestResponse<T, C> {
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            status: ResponseStatus::Success,
            error: None,
            provider_code: None,
        }
    }

    pub fn failure(error: impl Into<String>, provider_code: Option<C>) -> Self {
        Self {
            data: None,
            status: ResponseStatus::Error,
            error: Some(error.into()),
            provider_code,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_carries_data_and_no_code() {
        let r: RestResponse<u32, ()> = RestResponse::success(7);
        assert!(r.is_success());
        assert_eq!(r.data, Some(7));
        assert!(r.error.is_none());
    }

    #[test]
    fn failure_may_carry_a_code() {
        let r: RestResponse<u32, &str> = RestResponse::failure("boom", Some("CODE"));
        assert!(!r.is_success());
        assert_eq!(r.data, None);
        assert_eq!(r.provider_code, Some("CODE"));
    }
}
