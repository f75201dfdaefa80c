use crate::{
    config::StudentsConfig,
    data::{
        pagination::Pageable,
        student::{AddStudent, Student, StudentChanges},
    },
    error::{MissingStudentSnafu, SchoolResult},
    service::StudentService,
};
use async_trait::async_trait;
use snafu::OptionExt;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Store {
    last_id: i64,
    students: BTreeMap<i64, Student>,
}

/// Student store kept entirely in process memory. Ids start at 1 and are never
/// reused, even after deletion.
#[derive(Debug, Default)]
pub struct MemoryStudentService {
    store: RwLock<Store>,
    config: StudentsConfig,
}

impl MemoryStudentService {
    pub fn new(config: StudentsConfig) -> Self {
        Self {
            store: RwLock::default(),
            config,
        }
    }

    fn name_matches(&self, name: &str, needle: &str) -> bool {
        if self.config.name_search_case_sensitive {
            name.contains(needle)
        } else {
            name.to_lowercase().contains(&needle.to_lowercase())
        }
    }
}

#[async_trait]
impl StudentService for MemoryStudentService {
    async fn find_all(&self, pageable: &Pageable) -> SchoolResult<Vec<Student>> {
        let students = self.store.read().await.students.values().cloned().collect();
        Ok(pageable.apply(students))
    }

    async fn find_by_id(&self, id: i64) -> SchoolResult<Student> {
        self.store
            .read()
            .await
            .students
            .get(&id)
            .cloned()
            .context(MissingStudentSnafu { id })
    }

    async fn find_by_name_like(
        &self,
        name: &str,
        pageable: &Pageable,
    ) -> SchoolResult<Vec<Student>> {
        let students = self
            .store
            .read()
            .await
            .students
            .values()
            .filter(|student| self.name_matches(&student.name, name))
            .cloned()
            .collect();
        Ok(pageable.apply(students))
    }

    async fn save(&self, student: AddStudent) -> SchoolResult<Student> {
        let AddStudent { name } = student;

        let mut store = self.store.write().await;
        store.last_id += 1;
        let student = Student {
            id: store.last_id,
            name,
        };
        store.students.insert(student.id, student.clone());

        debug!(id = student.id, "inserted student");
        Ok(student)
    }

    async fn update(&self, changes: StudentChanges, id: i64) -> SchoolResult<Student> {
        let mut store = self.store.write().await;
        let student = store
            .students
            .get_mut(&id)
            .context(MissingStudentSnafu { id })?;
        changes.apply_to(student);
        Ok(student.clone())
    }

    async fn delete(&self, id: i64) -> SchoolResult<()> {
        self.store
            .write()
            .await
            .students
            .remove(&id)
            .context(MissingStudentSnafu { id })?;
        debug!(id, "deleted student");
        Ok(())
    }
}
