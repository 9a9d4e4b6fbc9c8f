//! Repository behavior against a real SQLite schema.

mod common;

use anyhow::Result;

use common::test_db;
use taskboard::contract::model::{NewProject, NewUser, TaskPriority, TaskStatus};
use taskboard::domain::repo::{
    ConstraintViolation, ProjectsRepository, TaskFields, TasksRepository, UsersRepository,
};
use taskboard::infra::storage::{
    SeaOrmProjectsRepository, SeaOrmTasksRepository, SeaOrmUsersRepository,
};

#[tokio::test]
async fn deleting_a_referenced_row_is_a_foreign_key_violation() -> Result<()> {
    let db = test_db().await;
    let users = SeaOrmUsersRepository::new(db.clone());
    let projects = SeaOrmProjectsRepository::new(db.clone());
    let tasks = SeaOrmTasksRepository::new(db.clone());

    let owner = users
        .insert(NewUser {
            name: "Owner".into(),
            email: "owner@x.com".into(),
        })
        .await?;
    let project = projects
        .insert(NewProject {
            name: "Alpha".into(),
            description: None,
            owner_id: owner.id,
        })
        .await?;
    tasks
        .insert(TaskFields {
            title: "Write docs".into(),
            description: None,
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            due_date: None,
            project_id: project.id,
        })
        .await?;

    // The schema itself refuses to orphan rows, whatever the service checked first.
    let err = users.delete(owner.id).await.unwrap_err();
    assert_eq!(
        err.downcast_ref::<ConstraintViolation>(),
        Some(&ConstraintViolation::ForeignKey),
        "{err:#}"
    );

    let err = projects.delete(project.id).await.unwrap_err();
    assert_eq!(
        err.downcast_ref::<ConstraintViolation>(),
        Some(&ConstraintViolation::ForeignKey),
        "{err:#}"
    );

    assert!(users.find_by_id(owner.id).await?.is_some());
    assert!(projects.find_by_id(project.id).await?.is_some());
    Ok(())
}

#[tokio::test]
async fn unreferenced_rows_delete_cleanly() -> Result<()> {
    let db = test_db().await;
    let users = SeaOrmUsersRepository::new(db.clone());

    let user = users
        .insert(NewUser {
            name: "Loner".into(),
            email: "loner@x.com".into(),
        })
        .await?;
    assert!(users.delete(user.id).await?);
    assert!(!users.delete(user.id).await?);
    Ok(())
}
