// src/db/user_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::{db_utils::map_constraint_error, error::AppError},
    models::auth::{Rol, Usuario},
};

// Repositorio de usuarios: todas las interacciones con la tabla 'usuarios'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Usuario>, AppError> {
        let maybe_user = sqlx::query_as::<_, Usuario>(
            "SELECT * FROM usuarios WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(maybe_user)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Usuario>, AppError> {
        let maybe_user = sqlx::query_as::<_, Usuario>("SELECT * FROM usuarios WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_user)
    }

    pub async fn list_users(&self) -> Result<Vec<Usuario>, AppError> {
        let users = sqlx::query_as::<_, Usuario>("SELECT * FROM usuarios ORDER BY nombre ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    pub async fn count_users(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM usuarios")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn create_user<'e, E>(
        &self,
        executor: E,
        email: &str,
        password_hash: &str,
        nombre: &str,
        rol: Rol,
        empleado_id: Option<i32>,
    ) -> Result<Usuario, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Usuario>(
            r#"
            INSERT INTO usuarios (email, password_hash, nombre, rol, empleado_id)
            VALUES (LOWER($1), $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(nombre)
        .bind(rol)
        .bind(empleado_id)
        .fetch_one(executor)
        .await
        .map_err(|e| map_constraint_error(e, "Ya existe un usuario con ese e-mail."))
    }
}
