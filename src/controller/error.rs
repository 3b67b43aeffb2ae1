use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use serde_json::json;

use thiserror::Error;

use crate::error::{Error, ErrorKind};

pub type RestResult<T> = Result<T, RestError>;

#[derive(Debug, Error)]
pub enum RestError {
    #[error("Parse Error: {0}")]
    ParseError(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Upstream service failed with {status}")]
    Upstream {
        status: StatusCode,
        detail: serde_json::Value,
    },

    #[error("Internal Server Error: {0}")]
    InternalError(String),
}

impl From<Error> for RestError {
    fn from(e: Error) -> Self {
        let message = e.to_string();
        match e.kind() {
            ErrorKind::AlreadyExists => Self::Conflict(message),
            ErrorKind::NotFound | ErrorKind::EmptyResult => Self::NotFound(message),
            ErrorKind::PermissionDenied | ErrorKind::InvalidCredentials => {
                Self::Forbidden(message)
            }
            ErrorKind::UpstreamFailure => match e {
                Error::PaymentRejected { status, detail } => Self::Upstream {
                    status: StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                    detail,
                },
                other => {
                    tracing::error!(error.cause_chain = ?other, "Collaborator request failed");
                    Self::InternalError("Collaborator request failed".into())
                }
            },
            ErrorKind::Internal => {
                tracing::error!(error.cause_chain = ?e, "Request failed");
                Self::InternalError("Internal failure".into())
            }
        }
    }
}

impl ResponseError for RestError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ParseError(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Upstream { status, .. } => *status,
            Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let detail = match self {
            Self::Upstream { detail, .. } => detail.clone(),
            other => json!(other.to_string()),
        };
        HttpResponse::build(self.status_code()).json(json!({ "detail": detail }))
    }
}
