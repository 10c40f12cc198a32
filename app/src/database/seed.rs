use sea_orm::{ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use tracing::info;

use crate::{
    config::config::Config,
    models::user::{self, Entity as UserEntity, UserRole},
    utils::password::hash_password,
};

/// Create the default admin account if no admin exists yet.
pub async fn seed_admin_user(db: &DatabaseConnection, config: &Config) -> Result<(), DbErr> {
    let existing_admin = UserEntity::find()
        .filter(user::Column::Role.eq(UserRole::Admin))
        .one(db)
        .await?;

    if existing_admin.is_some() {
        return Ok(());
    }

    let admin = user::ActiveModel {
        username: Set(config.admin_username.clone()),
        password: Set(hash_password(&config.admin_password)),
        role: Set(UserRole::Admin),
        ..Default::default()
    };
    admin.insert(db).await?;

    info!("Default admin user created: username='{}'", config.admin_username);

    Ok(())
}
