//! Maps PA-API error payloads onto [`ApiError`].

use crate::ports::ApiError;

use super::wire::ErrorResponse;

/// Longest slice of an unparseable body kept in an error message.
const MAX_BODY_SNIPPET: usize = 256;

/// Maps one upstream error code. The original code and message are kept.
pub fn map_error_code(code: &str, message: &str) -> ApiError {
    let code_owned = code.to_string();
    let message = message.to_string();
    match code {
        "ItemNotAccessible" => ApiError::ItemNotAccessible {
            code: code_owned,
            message,
        },
        "InvalidParameterValue" | "MissingParameter" | "NoResults" => {
            ApiError::InvalidParameter {
                code: code_owned,
                message,
            }
        }
        "TooManyRequests" | "RequestThrottled" => ApiError::Throttled {
            code: code_owned,
            message,
        },
        "InvalidSignature"
        | "IncompleteSignature"
        | "UnrecognizedClient"
        | "AccessDenied"
        | "AccessDeniedException"
        | "InvalidPartnerTag"
        | "InvalidAssociate"
        | "RequestExpired" => ApiError::InvalidCredentials {
            code: code_owned,
            message,
        },
        _ => ApiError::Upstream {
            status: 0,
            code: Some(code_owned),
            message,
        },
    }
}

/// Maps a non-2xx response.
///
/// Uses the first error in the payload when present, otherwise a generic
/// upstream error carrying the status.
pub fn map_error_response(status: u16, body: &str) -> ApiError {
    let parsed = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|r| r.errors.into_iter().next());

    match parsed {
        Some(err) => match map_error_code(&err.code, &err.message) {
            ApiError::Upstream { code, message, .. } => ApiError::Upstream {
                status,
                code,
                message,
            },
            mapped => mapped,
        },
        None if status == 429 => ApiError::Throttled {
            code: "TooManyRequests".to_string(),
            message: snippet(body),
        },
        None => ApiError::Upstream {
            status,
            code: None,
            message: snippet(body),
        },
    }
}

fn snippet(body: &str) -> String {
    if body.trim().is_empty() {
        return "empty response body".to_string();
    }
    body.chars().take(MAX_BODY_SNIPPET).collect()
}
