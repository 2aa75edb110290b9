use axum::{Json, extract::State, http::StatusCode};
use tracing::info;

use crate::{
    AppState,
    api::models::auth::{AdminLoginResponse, AdminRegisterRequest, AdminResponse, CompanyLoginResponse, CompanySummary, LoginRequest},
    auth::{
        password,
        session::{self, SessionClaims},
    },
    db::{
        handlers::{Admins, Companies},
        models::admins::AdminCreateDBRequest,
    },
    errors::Error,
};

fn invalid_credentials() -> Error {
    Error::Unauthenticated {
        message: Some("Invalid email or password".to_string()),
    }
}

fn inactive_account() -> Error {
    Error::Unauthenticated {
        message: Some("Account is inactive".to_string()),
    }
}

/// Check a password against a stored hash on a blocking thread.
async fn verify_password(password: &str, hash: &str) -> Result<bool, Error> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || password::verify_string(&password, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })?
}

/// Register a new admin
#[utoipa::path(
    post,
    path = "/admin/api/v1/authentication/register",
    request_body = AdminRegisterRequest,
    tag = "authentication",
    responses(
        (status = 201, description = "Admin registered", body = AdminResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Admin registration is disabled"),
        (status = 409, description = "Email already exists"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn admin_register(
    State(state): State<AppState>,
    Json(request): Json<AdminRegisterRequest>,
) -> Result<(StatusCode, Json<AdminResponse>), Error> {
    if !state.config.auth.allow_admin_registration {
        return Err(Error::Forbidden {
            message: "Admin registration is disabled".to_string(),
        });
    }

    // Hash the password on a blocking thread to avoid blocking async runtime
    let rules = state.config.auth.password.clone();
    let password = request.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || password::hash_new_password(&password, &rules))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })??;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut admins = Admins::new(&mut conn);
    let mut admin = admins
        .create(&AdminCreateDBRequest {
            email: request.email,
            name: request.name,
            password_hash: Some(password_hash),
        })
        .await?;

    if request.is_active == Some(false) {
        admin = sqlx::query_as("UPDATE admins SET is_active = FALSE, updated_at = NOW() WHERE id = $1 RETURNING *")
            .bind(admin.id)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| Error::Database(e.into()))?;
    }

    info!(admin_id = %admin.id, "Registered admin");
    Ok((StatusCode::CREATED, Json(AdminResponse::from(admin))))
}

/// Admin login
#[utoipa::path(
    post,
    path = "/admin/api/v1/authentication/login",
    request_body = LoginRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Login successful", body = AdminLoginResponse),
        (status = 401, description = "Invalid credentials or inactive account"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn admin_login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<Json<AdminLoginResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let admin = Admins::new(&mut conn)
        .get_by_email(&request.email)
        .await?
        .ok_or_else(invalid_credentials)?;

    // An admin seeded without a password cannot log in
    let hash = admin.password_hash.as_deref().ok_or_else(invalid_credentials)?;
    if !verify_password(&request.password, hash).await? {
        return Err(invalid_credentials());
    }
    if !admin.is_active {
        return Err(inactive_account());
    }

    let claims = SessionClaims::admin(admin.id, &admin.email, &state.config);
    let access_token = session::create_session_token(&claims, &state.config)?;

    Ok(Json(AdminLoginResponse {
        access_token,
        admin: AdminResponse::from(admin),
    }))
}

/// Company login
///
/// The returned token carries the company's tenant database name; every company-surface
/// request is routed by it.
#[utoipa::path(
    post,
    path = "/company/api/v1/authentication/login",
    request_body = LoginRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Login successful", body = CompanyLoginResponse),
        (status = 401, description = "Invalid credentials or inactive account"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn company_login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<Json<CompanyLoginResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let company = Companies::new(&mut conn)
        .get_by_email(&request.email)
        .await?
        .ok_or_else(invalid_credentials)?;

    if !verify_password(&request.password, &company.password_hash).await? {
        return Err(invalid_credentials());
    }
    if !company.is_active {
        return Err(inactive_account());
    }

    let claims = SessionClaims::company(company.id, &company.email, &company.db_name, &state.config);
    let access_token = session::create_session_token(&claims, &state.config)?;

    Ok(Json(CompanyLoginResponse {
        access_token,
        company: CompanySummary::from(&company),
    }))
}

#[cfg(test)]
mod tests {
    use crate::auth::session::{SessionKind, verify_session_token};
    use crate::test_utils::{TEST_PASSWORD, TestTenants, create_test_admin, create_test_app, create_test_config, insert_company_record};
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_admin_register_then_login(pool: PgPool) {
        let (server, _state) = create_test_app(pool).await;

        let response = server
            .post("/admin/api/v1/authentication/register")
            .json(&json!({"email": "new@admin.example", "name": "New Admin", "password": "long-enough-pw"}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["email"], "new@admin.example");
        assert!(body.get("passwordHash").is_none());

        let response = server
            .post("/admin/api/v1/authentication/login")
            .json(&json!({"email": "new@admin.example", "password": "long-enough-pw"}))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        let claims = verify_session_token(body["accessToken"].as_str().unwrap(), &create_test_config()).unwrap();
        assert_eq!(claims.kind, SessionKind::Admin);
        assert!(claims.db_name.is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_admin_email_conflicts(pool: PgPool) {
        let (server, _state) = create_test_app(pool).await;
        let body = json!({"email": "dup@admin.example", "name": "Dup", "password": "long-enough-pw"});

        server.post("/admin/api/v1/authentication/register").json(&body).await.assert_status(StatusCode::CREATED);
        let response = server.post("/admin/api/v1/authentication/register").json(&body).await;
        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(response.json::<Value>()["message"], "Email already exists");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_short_password_is_rejected(pool: PgPool) {
        let (server, _state) = create_test_app(pool).await;
        let response = server
            .post("/admin/api/v1/authentication/register")
            .json(&json!({"email": "short@admin.example", "name": "Short", "password": "abc"}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_wrong_password_is_unauthorized(pool: PgPool) {
        let admin = create_test_admin(&pool).await;
        let (server, _state) = create_test_app(pool).await;

        let response = server
            .post("/admin/api/v1/authentication/login")
            .json(&json!({"email": admin.email, "password": "not-the-password"}))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        let response = server
            .post("/admin/api/v1/authentication/login")
            .json(&json!({"email": "nobody@admin.example", "password": TEST_PASSWORD}))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_company_login_carries_db_name(pool: PgPool) {
        let tenants = TestTenants::new(&pool);
        let admin = create_test_admin(&pool).await;
        let db_name = tenants.provision().await;
        let company = insert_company_record(&pool, admin.id, &db_name).await;
        let (server, state) = create_test_app(pool).await;

        let response = server
            .post("/company/api/v1/authentication/login")
            .json(&json!({"email": company.email, "password": TEST_PASSWORD}))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["company"]["id"], company.id.to_string());
        assert_eq!(body["company"]["allowedTransactions"], json!(["new-sales"]));

        let claims = verify_session_token(body["accessToken"].as_str().unwrap(), &create_test_config()).unwrap();
        assert_eq!(claims.kind, SessionKind::Company);
        assert_eq!(claims.db_name.as_deref(), Some(db_name.as_str()));

        state.registry.close_all().await;
        tenants.cleanup().await;
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_inactive_company_cannot_log_in(pool: PgPool) {
        let tenants = TestTenants::new(&pool);
        let admin = create_test_admin(&pool).await;
        let db_name = tenants.provision().await;
        let company = insert_company_record(&pool, admin.id, &db_name).await;
        sqlx::query("UPDATE companies SET is_active = FALSE WHERE id = $1")
            .bind(company.id)
            .execute(&pool)
            .await
            .unwrap();
        let (server, _state) = create_test_app(pool).await;

        let response = server
            .post("/company/api/v1/authentication/login")
            .json(&json!({"email": company.email, "password": TEST_PASSWORD}))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.text(), "Account is inactive");

        tenants.cleanup().await;
    }
}
