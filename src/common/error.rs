use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

// SQLSTATE do Postgres que tratamos de forma específica
const PG_UNIQUE_VIOLATION: &str = "23505";
const PG_FOREIGN_KEY_VIOLATION: &str = "23503";
const PG_NUMERIC_OUT_OF_RANGE: &str = "22003";

/// Categoria do erro vista pelo cliente.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Conflict,
    Unauthorized,
    Forbidden,
    Internal,
}

impl ErrorKind {
    pub fn status_code(self) -> StatusCode {
        match self {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Regra de negócio violada (status errado para a transição, lista vazia, etc.)
    #[error("{0}")]
    BusinessRule(String),

    #[error("{0}")]
    ResourceNotFound(String),

    #[error("{0}")]
    UniqueConstraintViolation(String),

    #[error("Referência inválida: {0}")]
    InvalidReference(String),

    #[error("Token inválido")]
    InvalidToken,

    #[error("{0}")]
    Forbidden(String),

    // Sem `#[from]`: a conversão classifica o erro (ver `From<sqlx::Error>`)
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(sqlx::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn business(message: impl Into<String>) -> Self {
        AppError::BusinessRule(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::ResourceNotFound(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::ValidationError(_)
            | AppError::BusinessRule(_)
            | AppError::InvalidReference(_) => ErrorKind::Validation,
            AppError::ResourceNotFound(_) => ErrorKind::NotFound,
            AppError::UniqueConstraintViolation(_) => ErrorKind::Conflict,
            AppError::InvalidToken | AppError::JwtError(_) => ErrorKind::Unauthorized,
            AppError::Forbidden(_) => ErrorKind::Forbidden,
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => ErrorKind::Internal,
        }
    }

    /// Converte para o formato de resposta HTTP.
    pub fn to_api_error(&self) -> ApiError {
        let kind = self.kind();
        match self {
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                ApiError {
                    status: kind.status_code(),
                    error: "Um ou mais campos são inválidos.".to_string(),
                    details: Some(json!(details)),
                }
            }
            AppError::InvalidToken | AppError::JwtError(_) => ApiError {
                status: kind.status_code(),
                error: "Token de autenticação inválido ou ausente.".to_string(),
                details: None,
            },
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                // O detalhe fica só no log
                tracing::error!("Erro Interno do Servidor: {}", self);
                ApiError {
                    status: kind.status_code(),
                    error: "Ocorreu um erro inesperado.".to_string(),
                    details: None,
                }
            }
            other => ApiError {
                status: kind.status_code(),
                error: other.to_string(),
                details: None,
            },
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            match db_err.code().as_deref() {
                Some(PG_UNIQUE_VIOLATION) => {
                    let constraint = db_err.constraint().unwrap_or("registro").to_string();
                    return AppError::UniqueConstraintViolation(format!(
                        "Registro duplicado ({}).",
                        constraint
                    ));
                }
                Some(PG_FOREIGN_KEY_VIOLATION) => {
                    let constraint = db_err.constraint().unwrap_or("desconhecida").to_string();
                    return AppError::InvalidReference(constraint);
                }
                Some(PG_NUMERIC_OUT_OF_RANGE) => {
                    return AppError::business("Valor excede o limite permitido");
                }
                _ => {}
            }
        }
        AppError::DatabaseError(e)
    }
}

/// Erro já pronto para virar resposta HTTP.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        e.to_api_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error().into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_rule_maps_to_bad_request() {
        let err = AppError::business("Apenas compras pendentes podem ser concluídas");
        let api = err.to_api_error();
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.error, "Apenas compras pendentes podem ser concluídas");
    }

    #[test]
    fn each_kind_has_a_distinct_status() {
        assert_eq!(AppError::not_found("x").kind().status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::UniqueConstraintViolation("x".into()).kind().status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(AppError::InvalidToken.kind().status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::InternalServerError(anyhow::anyhow!("boom")).kind(),
            ErrorKind::Internal
        );
        assert_eq!(AppError::InvalidReference("fk".into()).kind(), ErrorKind::Validation);
    }

    #[test]
    fn internal_errors_hide_their_message() {
        let api = AppError::InternalServerError(anyhow::anyhow!("senha do banco vazou")).to_api_error();
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.error.contains("senha"));
    }

    #[test]
    fn row_not_found_is_internal_not_a_silent_404() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
