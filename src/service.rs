use crate::{
    data::{
        pagination::Pageable,
        student::{AddStudent, Student, StudentChanges},
    },
    error::SchoolResult,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStudentService;
pub use postgres::PostgresStudentService;

/// Business operations on students. Constructed once at startup and handed to
/// the router through [`crate::state::SchoolState`].
///
/// Lookups by id that find nothing fail with
/// [`crate::error::SchoolError::MissingStudent`].
#[async_trait]
pub trait StudentService: Send + Sync + Debug {
    async fn find_all(&self, pageable: &Pageable) -> SchoolResult<Vec<Student>>;

    async fn find_by_id(&self, id: i64) -> SchoolResult<Student>;

    /// Students whose name contains `name`. Case sensitivity is up to the
    /// implementation's configuration.
    async fn find_by_name_like(
        &self,
        name: &str,
        pageable: &Pageable,
    ) -> SchoolResult<Vec<Student>>;

    async fn save(&self, student: AddStudent) -> SchoolResult<Student>;

    /// Merges `changes` into the stored student and returns the result.
    async fn update(&self, changes: StudentChanges, id: i64) -> SchoolResult<Student>;

    async fn delete(&self, id: i64) -> SchoolResult<()>;

    async fn shutdown(&self) {}
}
