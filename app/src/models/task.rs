use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    #[sea_orm(string_value = "LOW")]
    Low,
    #[sea_orm(string_value = "MEDIUM")]
    Medium,
    #[sea_orm(string_value = "HIGH")]
    High,
    #[sea_orm(string_value = "CRITICAL")]
    Critical,
}

impl Priority {
    /// Map arbitrary user input onto the enumeration. Accepts the short
    /// forms that show up in spreadsheet exports (MED, CRIT, URGENT);
    /// anything unrecognized becomes MEDIUM.
    pub fn normalize(input: &str) -> Priority {
        match input.trim().to_uppercase().as_str() {
            "LOW" => Priority::Low,
            "MEDIUM" | "MED" => Priority::Medium,
            "HIGH" => Priority::High,
            "CRITICAL" | "CRIT" | "URGENT" => Priority::Critical,
            _ => Priority::Medium,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "task_manager")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub task_name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub priority: Priority,
    pub created_at: Date,
    pub assigned_user: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AssignedUser",
        to = "super::user::Column::Id"
    )]
    User,
    #[sea_orm(has_many = "super::task_log::Entity")]
    TaskLog,
    #[sea_orm(has_many = "super::audit_log::Entity")]
    AuditLog,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::task_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TaskLog.def()
    }
}

impl Related<super::audit_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuditLog.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_exact_values() {
        assert_eq!(Priority::normalize("LOW"), Priority::Low);
        assert_eq!(Priority::normalize("MEDIUM"), Priority::Medium);
        assert_eq!(Priority::normalize("HIGH"), Priority::High);
        assert_eq!(Priority::normalize("CRITICAL"), Priority::Critical);
    }

    #[test]
    fn test_normalize_is_case_insensitive() {
        assert_eq!(Priority::normalize("low"), Priority::Low);
        assert_eq!(Priority::normalize("High"), Priority::High);
        assert_eq!(Priority::normalize(" critical "), Priority::Critical);
    }

    #[test]
    fn test_normalize_short_forms() {
        assert_eq!(Priority::normalize("med"), Priority::Medium);
        assert_eq!(Priority::normalize("crit"), Priority::Critical);
        assert_eq!(Priority::normalize("URGENT"), Priority::Critical);
    }

    #[test]
    fn test_normalize_unknown_falls_back_to_medium() {
        assert_eq!(Priority::normalize(""), Priority::Medium);
        assert_eq!(Priority::normalize("banana"), Priority::Medium);
        assert_eq!(Priority::normalize("P1"), Priority::Medium);
    }
}
