use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use super::error::{ServiceError, ServiceResult};
use crate::{
    db::{Store, StoreError, UserExt, USERS_EMAIL_KEY, USERS_USERNAME_KEY},
    dtos::{
        first_validation_message,
        userdtos::{FilterUserDto, LoginUserDto, RegisterUserDto, UpdateUserDto},
    },
    error::ErrorMessage,
    models::usermodel::{Identity, NewUser, UserChanges},
    utils::{password, token},
};

/// Result of a successful sign-in.
#[derive(Debug)]
pub struct SignedIn {
    pub token: String,
    pub user: FilterUserDto,
}

fn hash_password(plain: impl Into<String>) -> ServiceResult<String> {
    password::hash(plain).map_err(|err| match err {
        ErrorMessage::EmptyPassword | ErrorMessage::ExceededMaxPasswordLength(_) => {
            ServiceError::bad_request(err.to_string())
        }
        other => ServiceError::Hash(other),
    })
}

#[derive(Debug, Clone)]
pub struct CredentialService {
    db_client: Arc<dyn Store>,
    jwt_secret: String,
    jwt_maxage: i64,
}

fn map_unique_violation(err: StoreError) -> ServiceError {
    if err.violates(USERS_USERNAME_KEY) {
        ServiceError::Conflict(ErrorMessage::UsernameExist.to_string())
    } else if err.violates(USERS_EMAIL_KEY) {
        ServiceError::Conflict(ErrorMessage::EmailExist.to_string())
    } else {
        ServiceError::Store(err)
    }
}

impl CredentialService {
    pub fn new(db_client: Arc<dyn Store>, jwt_secret: String, jwt_maxage: i64) -> Self {
        CredentialService {
            db_client,
            jwt_secret,
            jwt_maxage,
        }
    }

    pub async fn register(&self, mut body: RegisterUserDto) -> ServiceResult<FilterUserDto> {
        if body.has_empty_field() {
            return Err(ServiceError::bad_request(
                ErrorMessage::AllFieldsRequired.to_string(),
            ));
        }

        body.username = body.username.trim().to_lowercase();
        body.email = body.email.trim().to_string();
        body.validate()
            .map_err(|e| ServiceError::bad_request(first_validation_message(&e)))?;

        let hashed_password = hash_password(&body.password)?;

        let user = self
            .db_client
            .save_user(NewUser {
                username: body.username,
                email: body.email,
                password: hashed_password,
                avatar: body.avatar.filter(|a| !a.trim().is_empty()),
            })
            .await
            .map_err(map_unique_violation)?;

        tracing::info!(user_id = %user.id, "account created");
        Ok(FilterUserDto::filter_user(&user))
    }

    pub async fn authenticate(&self, body: LoginUserDto) -> ServiceResult<SignedIn> {
        body.validate()
            .map_err(|e| ServiceError::bad_request(first_validation_message(&e)))?;

        let user = self
            .db_client
            .get_user(None, None, Some(body.email.trim()))
            .await?
            .ok_or_else(|| ServiceError::NotFound(ErrorMessage::UserNotFound.to_string()))?;

        let password_matched = password::compare(&body.password, &user.password)
            .map_err(|_| ServiceError::Unauthorized(ErrorMessage::WrongCredentials.to_string()))?;
        if !password_matched {
            return Err(ServiceError::Unauthorized(
                ErrorMessage::WrongCredentials.to_string(),
            ));
        }

        let token = token::create_token(
            &user.id.to_string(),
            self.jwt_secret.as_bytes(),
            self.jwt_maxage,
        )?;

        Ok(SignedIn {
            token,
            user: FilterUserDto::filter_user(&user),
        })
    }

    pub async fn update_profile(
        &self,
        identity: &Identity,
        user_id: Uuid,
        mut body: UpdateUserDto,
    ) -> ServiceResult<FilterUserDto> {
        if !identity.is(user_id) {
            return Err(ServiceError::Forbidden(
                "You can only update your own account".to_string(),
            ));
        }

        body.email = body.email.map(|email| email.trim().to_string());
        body.validate()
            .map_err(|e| ServiceError::bad_request(first_validation_message(&e)))?;

        let password = match body.password {
            Some(plain) => Some(hash_password(plain)?),
            None => None,
        };
        let changes = UserChanges {
            username: body.username,
            email: body.email,
            password,
            avatar: body.avatar,
        };

        let user = if changes.is_empty() {
            self.db_client.get_user(Some(user_id), None, None).await?
        } else {
            self.db_client
                .update_user(user_id, changes)
                .await
                .map_err(map_unique_violation)?
        }
        .ok_or_else(|| ServiceError::NotFound(ErrorMessage::UserNotFound.to_string()))?;

        tracing::info!(user_id = %user.id, "profile updated");
        Ok(FilterUserDto::filter_user(&user))
    }

    /// Removes the account only. Listings and bookings that reference it stay.
    pub async fn delete_account(
        &self,
        identity: &Identity,
        user_id: Uuid,
    ) -> ServiceResult<()> {
        if !identity.is(user_id) {
            return Err(ServiceError::Forbidden(
                "You can only delete your own account".to_string(),
            ));
        }

        if !self.db_client.delete_user(user_id).await? {
            return Err(ServiceError::NotFound(ErrorMessage::UserNotFound.to_string()));
        }

        tracing::info!(%user_id, "account deleted");
        Ok(())
    }

    pub async fn get_public_profile(&self, user_id: Uuid) -> ServiceResult<FilterUserDto> {
        let user = self
            .db_client
            .get_user(Some(user_id), None, None)
            .await?
            .ok_or_else(|| ServiceError::NotFound(ErrorMessage::UserNotFound.to_string()))?;

        Ok(FilterUserDto::filter_user(&user))
    }
}
