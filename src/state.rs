use crate::{
    config::{RuntimeConfiguration, StoreConfig, StudentsConfig},
    error::SchoolResult,
    service::{MemoryStudentService, PostgresStudentService, StudentService},
};
use std::{ops::Deref, sync::Arc};

#[derive(Clone, Debug)]
pub struct SchoolState {
    students: Arc<dyn StudentService>,
    students_config: StudentsConfig,
}

impl SchoolState {
    pub async fn new(config: &RuntimeConfiguration) -> SchoolResult<Self> {
        let students_config = config.students_config();

        let students: Arc<dyn StudentService> = match config.store() {
            StoreConfig::Postgres(db_config) => {
                info!("using postgres student store");
                Arc::new(PostgresStudentService::new(db_config, students_config).await?)
            }
            StoreConfig::Memory => {
                warn!("using in-memory student store, nothing will be persisted");
                Arc::new(MemoryStudentService::new(students_config))
            }
        };

        Ok(Self::with_service(students, students_config))
    }

    pub fn with_service(
        students: Arc<dyn StudentService>,
        students_config: StudentsConfig,
    ) -> Self {
        Self {
            students,
            students_config,
        }
    }

    pub const fn students_config(&self) -> StudentsConfig {
        self.students_config
    }

    pub async fn sensible_shutdown(&self) {
        self.students.shutdown().await;
    }
}

impl Deref for SchoolState {
    type Target = dyn StudentService;

    fn deref(&self) -> &Self::Target {
        &*self.students
    }
}
