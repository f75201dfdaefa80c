use crate::{
    config::{DbConfig, StudentsConfig},
    data::{
        pagination::Pageable,
        student::{AddStudent, Student, StudentChanges},
    },
    error::{MakeQuerySnafu, MigrateSnafu, MissingStudentSnafu, OpenDatabaseSnafu, SchoolResult},
    service::StudentService,
};
use async_trait::async_trait;
use snafu::{OptionExt, ResultExt, ensure};
use sqlx::{Pool, Postgres, postgres::PgPoolOptions};

/// Escapes `%`, `_` and `\` so `s` matches literally inside a `LIKE` pattern
/// using `ESCAPE '\'`.
fn escape_like(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn to_sql_int(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[derive(Debug, Clone)]
pub struct PostgresStudentService {
    pool: Pool<Postgres>,
    config: StudentsConfig,
}

impl PostgresStudentService {
    pub async fn new(db_config: &DbConfig, config: StudentsConfig) -> SchoolResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(db_config.max_connections())
            .connect(&db_config.get_db_path())
            .await
            .context(OpenDatabaseSnafu)?;

        sqlx::migrate!().run(&pool).await.context(MigrateSnafu)?;
        info!("database migrated");

        Ok(Self::from_pool(pool, config))
    }

    /// Wraps an already-migrated pool.
    pub const fn from_pool(pool: Pool<Postgres>, config: StudentsConfig) -> Self {
        Self { pool, config }
    }
}

#[async_trait]
impl StudentService for PostgresStudentService {
    async fn find_all(&self, pageable: &Pageable) -> SchoolResult<Vec<Student>> {
        let query = format!(
            "SELECT id, name FROM public.students ORDER BY {} LIMIT $1 OFFSET $2",
            pageable.order_by_sql()
        );

        sqlx::query_as::<_, Student>(&query)
            .bind(to_sql_int(pageable.limit()))
            .bind(to_sql_int(pageable.offset()))
            .fetch_all(&self.pool)
            .await
            .context(MakeQuerySnafu)
    }

    async fn find_by_id(&self, id: i64) -> SchoolResult<Student> {
        sqlx::query_as::<_, Student>("SELECT id, name FROM public.students WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context(MakeQuerySnafu)?
            .context(MissingStudentSnafu { id })
    }

    async fn find_by_name_like(
        &self,
        name: &str,
        pageable: &Pageable,
    ) -> SchoolResult<Vec<Student>> {
        let operator = if self.config.name_search_case_sensitive {
            "LIKE"
        } else {
            "ILIKE"
        };
        let query = format!(
            "SELECT id, name FROM public.students WHERE name {operator} $1 ESCAPE '\\' \
             ORDER BY {} LIMIT $2 OFFSET $3",
            pageable.order_by_sql()
        );

        sqlx::query_as::<_, Student>(&query)
            .bind(format!("%{}%", escape_like(name)))
            .bind(to_sql_int(pageable.limit()))
            .bind(to_sql_int(pageable.offset()))
            .fetch_all(&self.pool)
            .await
            .context(MakeQuerySnafu)
    }

    async fn save(&self, student: AddStudent) -> SchoolResult<Student> {
        let AddStudent { name } = student;

        let student = sqlx::query_as::<_, Student>(
            "INSERT INTO public.students (name) VALUES ($1) RETURNING id, name",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .context(MakeQuerySnafu)?;

        debug!(id = student.id, "inserted student");
        Ok(student)
    }

    async fn update(&self, changes: StudentChanges, id: i64) -> SchoolResult<Student> {
        let StudentChanges { name } = changes;

        sqlx::query_as::<_, Student>(
            "UPDATE public.students SET name = COALESCE($1, name) WHERE id = $2 RETURNING id, name",
        )
        .bind(name)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context(MakeQuerySnafu)?
        .context(MissingStudentSnafu { id })
    }

    async fn delete(&self, id: i64) -> SchoolResult<()> {
        let result = sqlx::query("DELETE FROM public.students WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context(MakeQuerySnafu)?;

        ensure!(result.rows_affected() > 0, MissingStudentSnafu { id });
        debug!(id, "deleted student");
        Ok(())
    }

    async fn shutdown(&self) {
        self.pool.close().await;
        info!("database pool closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data::pagination::{Direction, SortField, SortOrder},
        error::SchoolError,
    };
    use sqlx::PgPool;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("Ada"), "Ada");
        assert_eq!(escape_like("100%_done"), "100\\%\\_done");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
    }

    #[test]
    fn huge_offsets_saturate() {
        assert_eq!(to_sql_int(5), 5);
        assert_eq!(to_sql_int(u64::MAX), i64::MAX);
    }

    // The tests below need a postgres server: set DATABASE_URL and run with
    // `cargo test -- --ignored`.

    fn add(name: &str) -> AddStudent {
        AddStudent { name: name.into() }
    }

    fn everything() -> Pageable {
        Pageable {
            size: 50,
            ..Pageable::default()
        }
    }

    #[sqlx::test]
    #[ignore = "needs DATABASE_URL"]
    async fn update_merges_into_stored_row(pool: PgPool) -> SchoolResult<()> {
        let service = PostgresStudentService::from_pool(pool, StudentsConfig::default());
        let ada = service.save(add("Ada")).await?;

        let unchanged = service.update(StudentChanges::default(), ada.id).await?;
        assert_eq!(unchanged, ada);

        let changes = StudentChanges {
            name: Some("Ada Lovelace".into()),
        };
        let renamed = service.update(changes, ada.id).await?;
        assert_eq!(renamed.id, ada.id);
        assert_eq!(service.find_by_id(ada.id).await?.name, "Ada Lovelace");

        assert!(matches!(
            service.update(StudentChanges::default(), ada.id + 1).await,
            Err(SchoolError::MissingStudent { .. })
        ));
        Ok(())
    }

    #[sqlx::test]
    #[ignore = "needs DATABASE_URL"]
    async fn deleting_twice_is_not_found(pool: PgPool) -> SchoolResult<()> {
        let service = PostgresStudentService::from_pool(pool, StudentsConfig::default());
        let grace = service.save(add("Grace")).await?;

        service.delete(grace.id).await?;
        assert!(matches!(
            service.delete(grace.id).await,
            Err(SchoolError::MissingStudent { .. })
        ));
        assert!(matches!(
            service.find_by_id(grace.id).await,
            Err(SchoolError::MissingStudent { .. })
        ));
        Ok(())
    }

    #[sqlx::test]
    #[ignore = "needs DATABASE_URL"]
    async fn name_search_escapes_wildcards(pool: PgPool) -> SchoolResult<()> {
        let insensitive =
            PostgresStudentService::from_pool(pool.clone(), StudentsConfig::default());
        let sensitive = PostgresStudentService::from_pool(
            pool,
            StudentsConfig {
                name_search_case_sensitive: true,
                ..StudentsConfig::default()
            },
        );
        for name in ["100% Pure", "100 Pure", "Ada", "a_b", "axb"] {
            insensitive.save(add(name)).await?;
        }

        let names = |students: Vec<Student>| -> Vec<String> {
            students.into_iter().map(|s| s.name).collect()
        };

        let found = insensitive.find_by_name_like("0%", &everything()).await?;
        assert_eq!(names(found), vec!["100% Pure"]);

        let found = insensitive.find_by_name_like("a_b", &everything()).await?;
        assert_eq!(names(found), vec!["a_b"]);

        let found = insensitive.find_by_name_like("ADA", &everything()).await?;
        assert_eq!(names(found), vec!["Ada"]);

        let found = sensitive.find_by_name_like("ADA", &everything()).await?;
        assert!(found.is_empty());
        Ok(())
    }

    #[sqlx::test]
    #[ignore = "needs DATABASE_URL"]
    async fn pages_follow_requested_order(pool: PgPool) -> SchoolResult<()> {
        let service = PostgresStudentService::from_pool(pool, StudentsConfig::default());
        for name in ["Charlie", "Alice", "Bob"] {
            service.save(add(name)).await?;
        }

        let pageable = Pageable {
            page: 1,
            size: 2,
            sort: vec![SortOrder {
                field: SortField::Name,
                direction: Direction::Desc,
            }],
        };
        let page = service.find_all(&pageable).await?;
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].name, "Alice");
        Ok(())
    }
}
