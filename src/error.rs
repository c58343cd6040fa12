// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by the livestream, comment, friend and notification services
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Friend request already sent")]
    DuplicateRequest,

    #[error("Users are already friends")]
    AlreadyFriends,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
