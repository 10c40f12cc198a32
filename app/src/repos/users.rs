use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter,
};

use crate::models::user::{self, Entity as UserEntity, Model as User, UserRole};

pub struct UsersRepo {
    db: DatabaseConnection,
}

impl UsersRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        username: String,
        password_hash: String,
        role: UserRole,
    ) -> Result<User, DbErr> {
        let user_model = user::ActiveModel {
            username: Set(username),
            password: Set(password_hash),
            role: Set(role),
            ..Default::default()
        };

        let user = user_model.insert(&self.db).await?;

        Ok(user)
    }

    pub async fn get_by_id(&self, user_id: i32) -> Result<User, DbErr> {
        let user = UserEntity::find_by_id(user_id).one(&self.db).await?;

        match user {
            Some(u) => Ok(u),
            None => Err(DbErr::RecordNotFound(format!(
                "User {} was not found",
                user_id
            ))),
        }
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, DbErr> {
        let user = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?;

        Ok(user)
    }
}
