use chrono::Utc;
use sea_orm::{sea_query::OnConflict, ConnectionTrait, EntityTrait, Set};
use tracing::info;

use crate::domain::user::entity::user;
use crate::utils::error::AppError;

pub struct UserService;

impl UserService {
    /// Provision or refresh a user row from the auth provider's profile.
    ///
    /// Room and vote operations only ever reference existing users.
    pub async fn upsert_user<C>(
        db: &C,
        user_id: &str,
        name: &str,
        email: &str,
    ) -> Result<user::Model, AppError>
    where
        C: ConnectionTrait,
    {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(AppError::BadRequest("User id must not be empty.".into()));
        }

        let model = user::ActiveModel {
            user_id: Set(user_id.to_string()),
            name: Set(name.trim().to_string()),
            email: Set(email.trim().to_string()),
            created_at: Set(Utc::now().naive_utc()),
        };

        user::Entity::insert(model)
            .on_conflict(
                OnConflict::column(user::Column::UserId)
                    .update_columns([user::Column::Name, user::Column::Email])
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        let user = user::Entity::find_by_id(user_id.to_string())
            .one(db)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?
            .ok_or_else(|| AppError::InternalError("User vanished after upsert.".into()))?;

        info!(user_id = %user.user_id, "User profile synchronised");

        Ok(user)
    }
}
