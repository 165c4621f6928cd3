//! HTTP rendering of gateway replies.
//!
//! | Reply status | HTTP |
//! |---|---|
//! | `Ok`, `Alert` | 200 |
//! | `NotFound` | 404 |
//! | `InvalidValue` | 400 |
//! | `MissingProfile` | 409 |
//!
//! Every reply carries its `-1` / `0` / `1` result code both in the JSON
//! body and in the `x-result-code` header.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use smartpot_types::{Reply, ReplyStatus};

pub const SERVER_NAME: &str = concat!("smartpot/", env!("CARGO_PKG_VERSION"));
pub const RESULT_CODE_HEADER: &str = "x-result-code";

pub fn status_for(status: ReplyStatus) -> StatusCode {
    match status {
        ReplyStatus::Ok | ReplyStatus::Alert => StatusCode::OK,
        ReplyStatus::NotFound => StatusCode::NOT_FOUND,
        ReplyStatus::InvalidValue => StatusCode::BAD_REQUEST,
        ReplyStatus::MissingProfile => StatusCode::CONFLICT,
    }
}

/// JSON body of every gateway reply.
#[derive(Debug, Serialize)]
pub struct ReplyBody {
    pub code: i8,
    pub status: ReplyStatus,
    pub message: String,
}

/// A gateway [`Reply`] as an axum response.
#[derive(Debug)]
pub struct ApiReply(pub Reply);

impl IntoResponse for ApiReply {
    fn into_response(self) -> Response {
        let Reply { status, code, message } = self.0;
        let code = code.as_i8();
        (
            status_for(status),
            [(RESULT_CODE_HEADER, code.to_string())],
            Json(ReplyBody { code, status, message }),
        )
            .into_response()
    }
}

/// Requests rejected before reaching the gateway.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    UnknownCheck(String),
    BadBound(String),
    Unavailable,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::UnknownCheck(check) => {
                (StatusCode::NOT_FOUND, format!("unknown diagnostic check '{check}'"))
            }
            ApiError::BadBound(raw) => {
                (StatusCode::BAD_REQUEST, format!("'{raw}' is not a valid bound"))
            }
            ApiError::Unavailable => {
                (StatusCode::SERVICE_UNAVAILABLE, "endpoint is shutting down".to_string())
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartpot_types::Diagnosis;

    #[test]
    fn alert_is_200_with_code_header() {
        let reply = Reply::from_diagnosis(&Diagnosis::Alert("soilPh under critical levels!".into()), false);
        let resp = ApiReply(reply).into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[RESULT_CODE_HEADER], "1");
    }

    #[test]
    fn missing_profile_is_conflict() {
        let reply = Reply::from_diagnosis(&Diagnosis::Error("No plant found!".into()), true);
        let resp = ApiReply(reply).into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert_eq!(resp.headers()[RESULT_CODE_HEADER], "-1");
    }

    #[test]
    fn missing_sensor_is_not_found() {
        assert_eq!(status_for(ReplyStatus::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ReplyStatus::InvalidValue), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn rejected_requests_carry_no_result_code() {
        let resp = ApiError::BadBound("low".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(resp.headers().get(RESULT_CODE_HEADER).is_none());
        assert_eq!(
            ApiError::UnknownCheck("weather".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
    }
}
