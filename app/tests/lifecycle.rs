use chrono::NaiveDate;
use migration::{Migrator, MigratorTrait};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectOptions, Database,
    DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use tokio::time::Duration;

use taskhub::models::{
    audit_log::{self, Entity as AuditLogEntity},
    task::{self, Entity as TaskEntity, Priority},
    task_log::{self, Entity as TaskLogEntity},
    user::{Model as User, UserRole},
};
use taskhub::repos::{tasks::TasksRepo, users::UsersRepo};
use taskhub::services::cache::{CacheStore, MemoryCache};
use taskhub::services::snapshot::SnapshotJob;
use taskhub::services::tasks::{
    NewTask, TaskChanges, TaskError, TaskImportRecord, TaskService, STATE_TASK_ADDED,
    STATE_TASK_UPDATED,
};
use taskhub::utils::password::hash_password;

// A single pooled connection so every query sees the same in-memory
// database.
async fn setup_db() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1);

    let db = Database::connect(opt).await.expect("connect sqlite");
    Migrator::up(&db, None).await.expect("run migrations");
    db
}

async fn seed_user(db: &DatabaseConnection, username: &str, role: UserRole) -> User {
    UsersRepo::new(db.clone())
        .create(username.to_string(), hash_password("pw"), role)
        .await
        .expect("create user")
}

fn new_task(name: &str, priority: Option<&str>) -> NewTask {
    NewTask {
        task_name: name.to_string(),
        description: None,
        priority: priority.map(|p| p.to_string()),
        created_at: Some(NaiveDate::from_ymd_opt(2026, 8, 15).unwrap()),
        assigned_user: None,
    }
}

async fn audit_entries(db: &DatabaseConnection, task_id: i32) -> Vec<audit_log::Model> {
    AuditLogEntity::find()
        .filter(audit_log::Column::TaskId.eq(task_id))
        .order_by_asc(audit_log::Column::Id)
        .all(db)
        .await
        .expect("fetch audit entries")
}

#[tokio::test]
async fn create_writes_task_and_one_audit_entry() {
    let db = setup_db().await;
    let admin = seed_user(&db, "admin", UserRole::Admin).await;
    let service = TaskService::new(db.clone());

    let task = service
        .create(new_task("Ship release", Some("crit")), &admin)
        .await
        .expect("create task");

    assert_eq!(task.task_name, "Ship release");
    assert_eq!(task.priority, Priority::Critical);
    assert!(task.is_active);

    let entries = audit_entries(&db, task.id).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].previous_state, None);
    assert_eq!(entries[0].current_state, STATE_TASK_ADDED);
    assert_eq!(entries[0].action_by, admin.id.to_string());
}

#[tokio::test]
async fn create_without_name_writes_nothing() {
    let db = setup_db().await;
    let admin = seed_user(&db, "admin", UserRole::Admin).await;
    let service = TaskService::new(db.clone());

    let result = service.create(new_task("  ", None), &admin).await;
    assert!(matches!(result, Err(TaskError::Validation(_))));

    assert_eq!(TaskEntity::find().count(&db).await.unwrap(), 0);
    assert_eq!(AuditLogEntity::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn create_requires_admin_role() {
    let db = setup_db().await;
    let user = seed_user(&db, "bob", UserRole::User).await;
    let service = TaskService::new(db.clone());

    let result = service.create(new_task("Ship release", None), &user).await;
    assert!(matches!(result, Err(TaskError::Unauthorized(_))));
}

#[tokio::test]
async fn update_touches_only_supplied_fields() {
    let db = setup_db().await;
    let admin = seed_user(&db, "admin", UserRole::Admin).await;
    let service = TaskService::new(db.clone());

    let created = service
        .create(
            NewTask {
                task_name: "Write docs".to_string(),
                description: Some("user guide".to_string()),
                priority: Some("low".to_string()),
                created_at: Some(NaiveDate::from_ymd_opt(2026, 8, 10).unwrap()),
                assigned_user: None,
            },
            &admin,
        )
        .await
        .unwrap();

    let updated = service
        .update(
            created.id,
            TaskChanges {
                priority: Some("high".to_string()),
                ..Default::default()
            },
            &admin,
        )
        .await
        .expect("update task");

    assert_eq!(updated.priority, Priority::High);
    assert_eq!(updated.task_name, "Write docs");
    assert_eq!(updated.description, Some("user guide".to_string()));
    assert_eq!(
        updated.created_at,
        NaiveDate::from_ymd_opt(2026, 8, 10).unwrap()
    );

    let entries = audit_entries(&db, created.id).await;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].previous_state, Some(STATE_TASK_ADDED.to_string()));
    assert_eq!(entries[1].current_state, STATE_TASK_UPDATED);
}

#[tokio::test]
async fn update_can_clear_nullable_fields() {
    let db = setup_db().await;
    let admin = seed_user(&db, "admin", UserRole::Admin).await;
    let service = TaskService::new(db.clone());

    let created = service
        .create(
            NewTask {
                task_name: "Handover".to_string(),
                description: Some("owned by ops".to_string()),
                priority: None,
                created_at: Some(NaiveDate::from_ymd_opt(2026, 8, 15).unwrap()),
                assigned_user: Some(admin.id),
            },
            &admin,
        )
        .await
        .unwrap();
    assert_eq!(created.assigned_user, Some(admin.id));

    // Explicit nulls clear the fields, as opposed to leaving them out.
    let updated = service
        .update(
            created.id,
            TaskChanges {
                description: Some(None),
                assigned_user: Some(None),
                ..Default::default()
            },
            &admin,
        )
        .await
        .expect("clearing nullable fields");

    assert_eq!(updated.description, None);
    assert_eq!(updated.assigned_user, None);
    assert_eq!(updated.task_name, "Handover");
    assert_eq!(audit_entries(&db, created.id).await.len(), 2);
}

#[tokio::test]
async fn update_normalizes_unknown_priority_to_medium() {
    let db = setup_db().await;
    let admin = seed_user(&db, "admin", UserRole::Admin).await;
    let service = TaskService::new(db.clone());

    let created = service.create(new_task("Triage", None), &admin).await.unwrap();

    let updated = service
        .update(
            created.id,
            TaskChanges {
                priority: Some("P1".to_string()),
                ..Default::default()
            },
            &admin,
        )
        .await
        .unwrap();

    assert_eq!(updated.priority, Priority::Medium);
}

#[tokio::test]
async fn update_missing_task_is_not_found() {
    let db = setup_db().await;
    let admin = seed_user(&db, "admin", UserRole::Admin).await;
    let service = TaskService::new(db.clone());

    let result = service
        .update(9999, TaskChanges::default(), &admin)
        .await;
    assert!(matches!(result, Err(TaskError::NotFound(_))));
}

#[tokio::test]
async fn update_without_audit_history_records_null_previous_state() {
    let db = setup_db().await;
    let admin = seed_user(&db, "admin", UserRole::Admin).await;
    let service = TaskService::new(db.clone());

    // Row inserted outside the mutation service, so it has no audit trail.
    let orphan = task::ActiveModel {
        task_name: Set("Legacy import".to_string()),
        description: Set(None),
        is_active: Set(true),
        priority: Set(Priority::Low),
        created_at: Set(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()),
        assigned_user: Set(None),
        ..Default::default()
    }
    .insert(&db)
    .await
    .unwrap();

    service
        .update(
            orphan.id,
            TaskChanges {
                description: Some(Some("backfilled".to_string())),
                ..Default::default()
            },
            &admin,
        )
        .await
        .expect("update succeeds despite missing audit history");

    let entries = audit_entries(&db, orphan.id).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].previous_state, None);
    assert_eq!(entries[0].current_state, STATE_TASK_UPDATED);
}

#[tokio::test]
async fn deactivate_soft_deletes_and_audits_the_transition() {
    let db = setup_db().await;
    let admin = seed_user(&db, "admin", UserRole::Admin).await;
    let service = TaskService::new(db.clone());

    let created = service.create(new_task("Retire host", None), &admin).await.unwrap();

    let deactivated = service.deactivate(created.id, &admin).await.unwrap();
    assert!(!deactivated.is_active);

    // Soft delete: the row is still there.
    assert!(TaskEntity::find_by_id(created.id)
        .one(&db)
        .await
        .unwrap()
        .is_some());

    let entries = audit_entries(&db, created.id).await;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].previous_state, Some("true".to_string()));
    assert_eq!(entries[1].current_state, "false");
}

#[tokio::test]
async fn deactivate_twice_is_a_noop_the_second_time() {
    let db = setup_db().await;
    let admin = seed_user(&db, "admin", UserRole::Admin).await;
    let service = TaskService::new(db.clone());

    let created = service.create(new_task("Retire host", None), &admin).await.unwrap();

    service.deactivate(created.id, &admin).await.unwrap();
    let second = service
        .deactivate(created.id, &admin)
        .await
        .expect("second deactivate must not fail");

    assert!(!second.is_active);
    // No extra audit entry for the no-op.
    assert_eq!(audit_entries(&db, created.id).await.len(), 2);
}

#[tokio::test]
async fn snapshot_pass_logs_each_active_task_once() {
    let db = setup_db().await;
    let admin = seed_user(&db, "admin", UserRole::Admin).await;
    let service = TaskService::new(db.clone());

    let a = service.create(new_task("a", None), &admin).await.unwrap();
    let b = service.create(new_task("b", None), &admin).await.unwrap();
    let c = service.create(new_task("c", None), &admin).await.unwrap();
    service.deactivate(c.id, &admin).await.unwrap();

    let job = SnapshotJob::new(db.clone(), 0, 0);
    let count = job.run_snapshot_pass().await.expect("snapshot pass");

    assert_eq!(count, 2);

    let logs = TaskLogEntity::find().all(&db).await.unwrap();
    assert_eq!(logs.len(), 2);
    let logged_ids: Vec<i32> = logs.iter().map(|l| l.task_id).collect();
    assert!(logged_ids.contains(&a.id));
    assert!(logged_ids.contains(&b.id));
    assert!(!logged_ids.contains(&c.id));
}

#[tokio::test]
async fn snapshot_pass_with_no_active_tasks_logs_zero() {
    let db = setup_db().await;

    let job = SnapshotJob::new(db.clone(), 0, 0);
    let count = job.run_snapshot_pass().await.expect("empty pass is not an error");

    assert_eq!(count, 0);
    assert_eq!(TaskLogEntity::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn cached_date_query_is_byte_identical_within_ttl() {
    let db = setup_db().await;
    let admin = seed_user(&db, "admin", UserRole::Admin).await;
    let service = TaskService::new(db.clone());
    let cache = MemoryCache::new();

    let date = NaiveDate::from_ymd_opt(2026, 8, 15).unwrap();
    let created = service.create(new_task("Ship release", None), &admin).await.unwrap();

    let ttl = Duration::from_secs(3600);
    let first = service.tasks_for_date(&cache, date, ttl).await.unwrap();

    // Mutation between the two reads; staleness is accepted inside the TTL.
    service
        .update(
            created.id,
            TaskChanges {
                priority: Some("high".to_string()),
                ..Default::default()
            },
            &admin,
        )
        .await
        .unwrap();

    let second = service.tasks_for_date(&cache, date, ttl).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn expired_cache_entry_requeries_the_store() {
    let db = setup_db().await;
    let admin = seed_user(&db, "admin", UserRole::Admin).await;
    let service = TaskService::new(db.clone());
    let cache = MemoryCache::new();

    let date = NaiveDate::from_ymd_opt(2026, 8, 15).unwrap();
    let created = service.create(new_task("Ship release", None), &admin).await.unwrap();

    // Zero TTL: every entry is expired by the time it is read back.
    let ttl = Duration::ZERO;
    let first = service.tasks_for_date(&cache, date, ttl).await.unwrap();

    service
        .update(
            created.id,
            TaskChanges {
                priority: Some("high".to_string()),
                ..Default::default()
            },
            &admin,
        )
        .await
        .unwrap();

    let second = service.tasks_for_date(&cache, date, ttl).await.unwrap();
    assert_ne!(first, second);
    assert!(second.contains("HIGH"));
}

#[tokio::test]
async fn date_query_with_no_tasks_is_not_found_and_not_cached() {
    let db = setup_db().await;
    let service = TaskService::new(db.clone());
    let cache = MemoryCache::new();

    let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
    let result = service
        .tasks_for_date(&cache, date, Duration::from_secs(3600))
        .await;

    assert!(matches!(result, Err(TaskError::NotFound(_))));
    assert_eq!(cache.get("task:2026-01-01").await, None);
}

#[tokio::test]
async fn bulk_import_creates_tasks_audits_and_missing_users() {
    let db = setup_db().await;
    let admin = seed_user(&db, "admin", UserRole::Admin).await;
    let service = TaskService::new(db.clone());

    let records = vec![
        TaskImportRecord {
            task_name: "Migrate database".to_string(),
            description: Some("phase 1".to_string()),
            is_active: true,
            priority: Some("URGENT".to_string()),
            created_at: Some(NaiveDate::from_ymd_opt(2026, 8, 1).unwrap()),
            assigned_user: Some("carol".to_string()),
        },
        TaskImportRecord {
            task_name: "Rotate keys".to_string(),
            description: None,
            is_active: false,
            priority: None,
            created_at: None,
            assigned_user: None,
        },
    ];

    let imported = service.bulk_import(records, &admin).await.expect("import");
    assert_eq!(imported, 2);

    assert_eq!(TaskEntity::find().count(&db).await.unwrap(), 2);
    assert_eq!(AuditLogEntity::find().count(&db).await.unwrap(), 2);

    let carol = UsersRepo::new(db.clone())
        .find_by_username("carol")
        .await
        .unwrap()
        .expect("import created the missing user");
    assert_eq!(carol.role, UserRole::User);

    let migrated = TaskEntity::find()
        .filter(task::Column::TaskName.eq("Migrate database"))
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(migrated.priority, Priority::Critical);
    assert_eq!(migrated.assigned_user, Some(carol.id));
}

#[tokio::test]
async fn task_records_are_paginated_five_per_page() {
    let db = setup_db().await;
    let admin = seed_user(&db, "admin", UserRole::Admin).await;
    let service = TaskService::new(db.clone());

    for i in 0..7 {
        service
            .create(
                NewTask {
                    task_name: format!("task-{}", i),
                    description: None,
                    priority: None,
                    created_at: Some(NaiveDate::from_ymd_opt(2026, 8, 15).unwrap()),
                    assigned_user: Some(admin.id),
                },
                &admin,
            )
            .await
            .unwrap();
    }

    let job = SnapshotJob::new(db.clone(), 0, 0);
    job.run_snapshot_pass().await.unwrap();

    let repo = TasksRepo::new(db.clone());

    let page1 = repo.get_task_records(1).await.unwrap();
    assert_eq!(page1.data.len(), 5);
    assert_eq!(page1.total_records, 7);
    assert_eq!(page1.total_pages, 2);

    let page2 = repo.get_task_records(2).await.unwrap();
    assert_eq!(page2.data.len(), 2);
}

#[tokio::test]
async fn full_lifecycle_create_deactivate_snapshot() {
    let db = setup_db().await;
    let admin = seed_user(&db, "admin", UserRole::Admin).await;
    let service = TaskService::new(db.clone());

    let task = service
        .create(new_task("Ship release", Some("crit")), &admin)
        .await
        .unwrap();
    assert_eq!(task.priority, Priority::Critical);

    let entries = audit_entries(&db, task.id).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].current_state, STATE_TASK_ADDED);

    let task = service.deactivate(task.id, &admin).await.unwrap();
    assert!(!task.is_active);

    let entries = audit_entries(&db, task.id).await;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].previous_state, Some("true".to_string()));
    assert_eq!(entries[1].current_state, "false");

    let job = SnapshotJob::new(db.clone(), 0, 0);
    let count = job.run_snapshot_pass().await.unwrap();
    assert_eq!(count, 0);

    let snapshots = TaskLogEntity::find()
        .filter(task_log::Column::TaskId.eq(task.id))
        .all(&db)
        .await
        .unwrap();
    assert!(snapshots.is_empty());
}
