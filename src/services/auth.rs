// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{AuthResponse, Claims, CreateUserPayload, Rol, Usuario},
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    pool: PgPool,
    jwt_secret: String,
    jwt_expiration_hours: i64,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        pool: PgPool,
        jwt_secret: String,
        jwt_expiration_hours: i64,
    ) -> Self {
        Self { user_repo, pool, jwt_secret, jwt_expiration_hours }
    }

    async fn hash_password(password: &str) -> Result<String, AppError> {
        let password_clone = password.to_owned();
        let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
            .await
            .map_err(|e| anyhow::anyhow!("Falló la tarea de hashing: {}", e))??;
        Ok(hashed)
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .filter(|u| u.activo)
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // La verificación de bcrypt es costosa: se ejecuta fuera del runtime
        let is_password_valid =
            tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
                .await
                .map_err(|e| anyhow::anyhow!("Falló la tarea de verificación: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        let token = self.create_token(&user)?;
        tracing::info!(usuario_id = user.id, rol = user.rol.as_str(), "Inicio de sesión");

        Ok(AuthResponse { token, usuario: user })
    }

    pub async fn create_user(&self, input: &CreateUserPayload) -> Result<Usuario, AppError> {
        let hashed_password = Self::hash_password(&input.password).await?;

        let user = self
            .user_repo
            .create_user(
                &self.pool,
                &input.email,
                &hashed_password,
                &input.nombre,
                input.rol,
                input.empleado_id,
            )
            .await?;

        tracing::info!(usuario_id = user.id, rol = user.rol.as_str(), "Usuario creado");
        Ok(user)
    }

    pub async fn list_users(&self) -> Result<Vec<Usuario>, AppError> {
        self.user_repo.list_users().await
    }

    /// Crea el administrador inicial si la tabla de usuarios está vacía.
    pub async fn bootstrap_admin(&self, email: &str, password: &str) -> Result<Option<Usuario>, AppError> {
        if self.user_repo.count_users().await? > 0 {
            return Ok(None);
        }

        let admin = self
            .create_user(&CreateUserPayload {
                email: email.to_string(),
                password: password.to_string(),
                nombre: "Administrador".to_string(),
                rol: Rol::Administrador,
                empleado_id: None,
            })
            .await?;

        Ok(Some(admin))
    }

    pub async fn validate_token(&self, token: &str) -> Result<Usuario, AppError> {
        let claims = self.decode_token(token)?;

        self.user_repo
            .find_by_id(claims.sub)
            .await?
            .filter(|u| u.activo)
            .ok_or(AppError::InvalidToken)
    }

    fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;
        Ok(token_data.claims)
    }

    fn create_token(&self, user: &Usuario) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::hours(self.jwt_expiration_hours);

        let claims = Claims {
            sub: user.id,
            rol: user.rol,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn service_with_secret(secret: &str) -> AuthService {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/erp_envases_test")
            .unwrap();
        AuthService::new(UserRepository::new(pool.clone()), pool, secret.into(), 12)
    }

    fn usuario(rol: Rol) -> Usuario {
        Usuario {
            id: 7,
            email: "ventas@envases.pe".into(),
            password_hash: String::new(),
            nombre: "Luis Huamán".into(),
            rol,
            empleado_id: None,
            activo: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn token_round_trip_keeps_user_and_role() {
        let svc = service_with_secret("secreto-de-prueba");
        let token = svc.create_token(&usuario(Rol::Vendedor)).unwrap();
        let claims = svc.decode_token(&token).unwrap();

        assert_eq!(claims.sub, 7);
        assert_eq!(claims.rol, Rol::Vendedor);
        assert_eq!(claims.exp - claims.iat, 12 * 3600);
    }

    #[tokio::test]
    async fn tokens_signed_with_another_secret_are_rejected() {
        let svc = service_with_secret("secreto-de-prueba");
        let other = service_with_secret("otro-secreto");
        let token = other.create_token(&usuario(Rol::Administrador)).unwrap();

        assert!(matches!(svc.decode_token(&token), Err(AppError::InvalidToken)));
        assert!(matches!(svc.decode_token("basura"), Err(AppError::InvalidToken)));
    }
}
