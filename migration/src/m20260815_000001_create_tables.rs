use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // user
        manager
            .create_table(
                Table::create()
                    .table("user")
                    .if_not_exists()
                    .col(pk_auto("id"))
                    .col(string_uniq("username"))
                    .col(string("password"))
                    .col(string("role"))
                    .to_owned(),
            )
            .await?;

        // task_manager
        //
        // Priority is a plain string column; the entity maps it through a
        // string-backed enum and normalizes unknown inputs before writes.
        manager
            .create_table(
                Table::create()
                    .table("task_manager")
                    .if_not_exists()
                    .col(pk_auto("id"))
                    .col(string("task_name"))
                    .col(text_null("description"))
                    .col(boolean("is_active").default(true))
                    .col(string("priority").default("LOW"))
                    .col(date("created_at"))
                    .col(integer_null("assigned_user"))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_task_manager_user")
                            .from("task_manager", "assigned_user")
                            .to("user", "id"),
                    )
                    .to_owned(),
            )
            .await?;

        // task_logger
        manager
            .create_table(
                Table::create()
                    .table("task_logger")
                    .if_not_exists()
                    .col(pk_auto("id"))
                    .col(integer("task_id"))
                    .col(
                        timestamp("logged_at")
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_task_logger_task_manager")
                            .from("task_logger", "task_id")
                            .to("task_manager", "id"),
                    )
                    .to_owned(),
            )
            .await?;

        // audit_logger
        manager
            .create_table(
                Table::create()
                    .table("audit_logger")
                    .if_not_exists()
                    .col(pk_auto("id"))
                    .col(integer("task_id"))
                    .col(string_null("previous_state"))
                    .col(string("current_state"))
                    .col(string("action_by"))
                    .col(
                        timestamp("timestamp")
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_audit_logger_task_manager")
                            .from("audit_logger", "task_id")
                            .to("task_manager", "id"),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table("audit_logger").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table("task_logger").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table("task_manager").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table("user").to_owned())
            .await?;

        Ok(())
    }
}
