use std::sync::Arc;

use mongodb::bson::oid::ObjectId;

use crate::config::AppConfig;
use crate::database::RedisService;
use crate::middleware::auth::create_token_with_session;
use crate::user::model::{AuthUser, CreateUserRequest, LoginRequest, Role, UpdateUserRequest, User};
use crate::user::repository::UserRepository;
use crate::utils::error::CustomError;
use crate::utils::helpers::now;
use crate::utils::{hashing, password_validation};

pub struct UserService {
    users: Arc<dyn UserRepository>,
    config: AppConfig,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>, config: AppConfig) -> Self {
        UserService { users, config }
    }

    pub async fn find_by_id(&self, id: &ObjectId) -> Result<Option<User>, CustomError> {
        self.users.find_by_id(id).await
    }

    pub async fn get_user(&self, id: &ObjectId) -> Result<User, CustomError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| CustomError::NotFoundError("User not found".into()))
    }

    /// Register a new account and sign a token for it.
    pub async fn create_user(
        &self,
        req: CreateUserRequest,
        redis_service: Option<&RedisService>,
    ) -> Result<(User, String), CustomError> {
        let username = req.username.trim().to_string();
        let email = req.email.trim().to_lowercase();

        if username.is_empty() {
            return Err(CustomError::ValidationError("Please add a username".into()));
        }
        password_validation::validate_email(&email)?;
        password_validation::validate_password(&req.password)?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(CustomError::ConflictError("Email already exists".into()));
        }
        if self.users.find_by_username(&username).await?.is_some() {
            return Err(CustomError::ConflictError("Username already exists".into()));
        }

        let hashed_password = hashing::hash_password(&req.password, self.config.bcrypt_cost)
            .map_err(|e| CustomError::InternalServerError(e.to_string()))?;

        let timestamp = now();
        let user = self
            .users
            .insert(User {
                id: ObjectId::new(),
                username,
                email,
                password: hashed_password,
                avatar: None,
                bio: None,
                role: Role::User,
                created_at: timestamp,
                updated_at: timestamp,
            })
            .await?;

        log::info!("User registered: {} ({})", user.username, user.id);

        let token = create_token_with_session(&user.id.to_hex(), &self.config, redis_service).await?;
        Ok((user, token))
    }

    pub async fn authenticate_user(&self, email: &str, password: &str) -> Result<User, CustomError> {
        let user = self
            .users
            .find_by_email(&email.trim().to_lowercase())
            .await?
            .ok_or_else(|| CustomError::UnauthorizedError("Invalid credentials".to_string()))?;

        if !hashing::verify_password(password, &user.password)
            .map_err(|_| CustomError::InternalServerError("Invalid credentials".to_string()))?
        {
            return Err(CustomError::UnauthorizedError(
                "Invalid credentials".to_string(),
            ));
        }

        Ok(user)
    }

    pub async fn login(
        &self,
        login_data: LoginRequest,
        redis_service: Option<&RedisService>,
    ) -> Result<(User, String), CustomError> {
        let user = self
            .authenticate_user(&login_data.email, &login_data.password)
            .await?;

        let token = create_token_with_session(&user.id.to_hex(), &self.config, redis_service).await?;
        log::info!("User logged in: {}", user.id);
        Ok((user, token))
    }

    /// Apply profile changes to `target`. Only the user themself or an admin may do so.
    pub async fn update_user(
        &self,
        caller: &AuthUser,
        target: &ObjectId,
        req: UpdateUserRequest,
    ) -> Result<User, CustomError> {
        if caller.id != *target && !caller.is_admin() {
            return Err(CustomError::ForbiddenError(
                "Not authorized to update this user".into(),
            ));
        }

        let mut user = self.get_user(target).await?;

        if let Some(email) = req.email.map(|e| e.trim().to_lowercase()) {
            if email != user.email {
                password_validation::validate_email(&email)?;
                if self.users.find_by_email(&email).await?.is_some() {
                    return Err(CustomError::ConflictError("Email already in use".into()));
                }
                user.email = email;
            }
        }

        if let Some(username) = req.username.map(|u| u.trim().to_string()) {
            if !username.is_empty() && username != user.username {
                if self.users.find_by_username(&username).await?.is_some() {
                    return Err(CustomError::ConflictError("Username already in use".into()));
                }
                user.username = username;
            }
        }

        if let Some(avatar) = req.avatar {
            user.avatar = Some(avatar);
        }
        if let Some(bio) = req.bio {
            user.bio = Some(bio);
        }
        user.updated_at = now();

        self.users
            .update(user)
            .await?
            .ok_or_else(|| CustomError::NotFoundError("User not found".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::repository::InMemoryUserRepository;

    fn service() -> UserService {
        let config = AppConfig {
            jwt_secret: "test-secret".into(),
            bcrypt_cost: 4,
            ..AppConfig::default()
        };
        UserService::new(Arc::new(InMemoryUserRepository::new()), config)
    }

    fn register(username: &str, email: &str) -> CreateUserRequest {
        CreateUserRequest {
            username: username.into(),
            email: email.into(),
            password: "Passw0rd1".into(),
        }
    }

    #[actix_web::test]
    async fn duplicate_email_is_a_conflict() {
        let service = service();
        service.create_user(register("ada", "ada@example.com"), None).await.unwrap();

        let err = service
            .create_user(register("ada2", "ADA@example.com"), None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Conflict: Email already exists");
    }

    #[actix_web::test]
    async fn login_checks_password() {
        let service = service();
        service.create_user(register("ada", "ada@example.com"), None).await.unwrap();

        let ok = service
            .login(
                LoginRequest {
                    email: "ada@example.com".into(),
                    password: "Passw0rd1".into(),
                },
                None,
            )
            .await;
        assert!(ok.is_ok());

        let err = service
            .login(
                LoginRequest {
                    email: "ada@example.com".into(),
                    password: "nope".into(),
                },
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CustomError::UnauthorizedError(_)));
    }

    #[actix_web::test]
    async fn users_cannot_edit_each_other() {
        let service = service();
        let (ada, _) = service.create_user(register("ada", "ada@example.com"), None).await.unwrap();
        let (bob, _) = service.create_user(register("bob", "bob@example.com"), None).await.unwrap();

        let err = service
            .update_user(
                &AuthUser::from(&bob),
                &ada.id,
                UpdateUserRequest {
                    bio: Some("hijacked".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CustomError::ForbiddenError(_)));

        let updated = service
            .update_user(
                &AuthUser::from(&ada),
                &ada.id,
                UpdateUserRequest {
                    bio: Some("Analytical engines".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.bio.as_deref(), Some("Analytical engines"));
    }
}
