pub mod entity;
pub mod mapper;
pub mod migrations;
pub mod sea_orm_repo;
pub mod uniqueness;

pub use sea_orm_repo::{SeaOrmProjectsRepository, SeaOrmTasksRepository, SeaOrmUsersRepository};
pub use uniqueness::SeaOrmUniquenessStore;
