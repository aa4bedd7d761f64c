// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable error codes for every failure the client can surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NetworkError,
    TimeoutError,
    ConnectionError,
    Unauthorized,
    TokenExpired,
    InvalidCredentials,
    ValidationError,
    InvalidInput,
    ServerError,
    NotFound,
    Forbidden,
    UnknownError,
}

impl ErrorCode {
    /// Map an HTTP status to an error code.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => Self::ValidationError,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            408 | 504 => Self::TimeoutError,
            500 | 502 | 503 => Self::ServerError,
            _ => Self::UnknownError,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NetworkError => "NETWORK_ERROR",
            Self::TimeoutError => "TIMEOUT_ERROR",
            Self::ConnectionError => "CONNECTION_ERROR",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::InvalidInput => "INVALID_INPUT",
            Self::ServerError => "SERVER_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Forbidden => "FORBIDDEN",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// User-facing message used when the server supplies none.
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::NetworkError => {
                "No se pudo conectar al servidor. Verifica tu conexión a internet."
            }
            Self::TimeoutError => "La solicitud tardó demasiado tiempo. Intenta de nuevo.",
            Self::ConnectionError => "No se pudo establecer conexión con el servidor.",
            Self::Unauthorized => "No estás autorizado. Por favor, inicia sesión de nuevo.",
            Self::TokenExpired => "Tu sesión ha expirado. Por favor, inicia sesión de nuevo.",
            Self::InvalidCredentials => "Email o contraseña incorrectos.",
            Self::ValidationError => "Los datos ingresados no son válidos.",
            Self::InvalidInput => "Por favor, verifica los datos ingresados.",
            Self::ServerError => "Ocurrió un error en el servidor. Intenta más tarde.",
            Self::NotFound => "El recurso solicitado no fue encontrado.",
            Self::Forbidden => "No tienes permiso para realizar esta acción.",
            Self::UnknownError => "Ocurrió un error inesperado. Intenta de nuevo.",
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Self::NetworkError | Self::ConnectionError | Self::TimeoutError)
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Unauthorized | Self::TokenExpired)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by every API call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No response was received (timeout, DNS, refused connection).
    #[error("{code}: {message}")]
    Network { code: ErrorCode, message: String, detail: String },

    /// The server answered with a non-success status.
    #[error("{code} ({status}): {message}")]
    Status { status: u16, code: ErrorCode, message: String, body: Option<serde_json::Value> },

    /// The response body did not match the expected schema.
    #[error("unexpected response payload: {0}")]
    Payload(String),

    /// Rejected on the client before any request was sent.
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),
}

impl ApiError {
    /// Classify a transport error that produced no response.
    pub fn from_transport(err: &reqwest::Error) -> Self {
        let code = if err.is_timeout() {
            ErrorCode::TimeoutError
        } else if err.is_connect() {
            ErrorCode::ConnectionError
        } else if err.is_decode() {
            return Self::Payload(err.to_string());
        } else {
            ErrorCode::NetworkError
        };
        Self::Network { code, message: code.default_message().to_owned(), detail: err.to_string() }
    }

    /// Build a status error from a response body (if any).
    ///
    /// Message precedence: first field error in `errors`, then `detail`,
    /// `message`, `error`, then the code's default message.
    pub fn from_status(status: u16, body: Option<serde_json::Value>) -> Self {
        let code = ErrorCode::from_status(status);
        let message = body
            .as_ref()
            .and_then(server_message)
            .unwrap_or_else(|| code.default_message().to_owned());
        Self::Status { status, code, message, body }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Network { code, .. } | Self::Status { code, .. } => *code,
            Self::Payload(_) => ErrorCode::UnknownError,
            Self::InvalidInput(_) => ErrorCode::InvalidInput,
        }
    }

    /// HTTP status, when the server responded.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_auth_error(&self) -> bool {
        self.code().is_auth()
    }

    pub fn is_network_error(&self) -> bool {
        self.code().is_network()
    }

    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network { message, .. } | Self::Status { message, .. } => message.clone(),
            Self::Payload(_) => ErrorCode::UnknownError.default_message().to_owned(),
            Self::InvalidInput(msg) => msg.clone(),
        }
    }

    /// Serializable summary (`{code, message, status}`).
    pub fn to_error_body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code().as_str().to_owned(),
            message: self.user_message(),
            status: self.status(),
        }
    }
}

/// Error body with machine-readable code and human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

fn server_message(body: &serde_json::Value) -> Option<String> {
    if let Some(errors) = body.get("errors").and_then(|v| v.as_object()) {
        let first = errors
            .values()
            .next()
            .and_then(|v| v.as_array())
            .and_then(|arr| arr.first())
            .and_then(|v| v.as_str());
        if let Some(msg) = first {
            return Some(msg.to_owned());
        }
    }
    ["detail", "message", "error"]
        .iter()
        .filter_map(|key| body.get(key).and_then(|v| v.as_str()))
        .find(|s| !s.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
