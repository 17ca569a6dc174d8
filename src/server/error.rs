use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::Error;

pub type Result<T, E = AppError> = std::result::Result<T, E>;

/// 鉴权失败
#[derive(Debug, thiserror::Error)]
#[error("token 校验失败")]
pub struct Unauthorized;

/// API错误类型
pub struct AppError(pub anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = if self.0.downcast_ref::<Unauthorized>().is_some() {
            StatusCode::UNAUTHORIZED
        } else {
            match self.0.downcast_ref::<Error>() {
                Some(Error::NotFound(_)) => StatusCode::NOT_FOUND,
                Some(Error::AlreadyExists(_)) => StatusCode::CONFLICT,
                Some(Error::NoDescriptors) => StatusCode::UNPROCESSABLE_ENTITY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            }
        };
        (status, format!("{:#}", self.0)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
