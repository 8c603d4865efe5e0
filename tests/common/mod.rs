use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use uuid::Uuid;

static SERVER: OnceLock<TestServer> = OnceLock::new();

/// Integration tests need a reachable Postgres. When DATABASE_URL is not
/// set each test returns early instead of failing the suite.
pub fn database_configured() -> bool {
    std::env::var("DATABASE_URL").is_ok()
}

pub struct TestServer {
    pub base_url: String,
    #[allow(dead_code)]
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{port}");

        // Cargo builds the binary before integration tests run
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_geomon-api"));
        cmd.env("GEOMON_API_PORT", port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;
        Ok(Self { base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        let url = format!("{}/health", self.base_url);
        while Instant::now() < deadline {
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK
                    || resp.status() == StatusCode::SERVICE_UNAVAILABLE
                {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!(
            "server did not become ready on {} within {:?}",
            self.base_url,
            timeout
        )
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(15)).await?;
    Ok(server)
}

/// Attach principal headers to a request.
pub fn as_user(
    rb: reqwest::RequestBuilder,
    user_id: Uuid,
    roles: &str,
) -> reqwest::RequestBuilder {
    rb.header("x-user-id", user_id.to_string())
        .header("x-user-roles", roles)
}

/// Attach a fresh admin principal to a request.
pub fn as_admin(rb: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    as_user(rb, Uuid::new_v4(), "admin")
}

/// Pool for seeding collaborator-owned tables (branches, accounts) that
/// have no HTTP surface here.
pub async fn pool() -> Result<sqlx::PgPool> {
    let url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    sqlx::PgPool::connect(&url).await.context("connect failed")
}

pub async fn seed_branch(pool: &sqlx::PgPool, name: &str, region_ids: &[Uuid]) -> Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO branches (id, name, region_ids) VALUES ($1, $2, $3)")
        .bind(id)
        .bind(name)
        .bind(region_ids.to_vec())
        .execute(pool)
        .await?;
    Ok(id)
}

pub async fn seed_account(
    pool: &sqlx::PgPool,
    user_id: Uuid,
    default_branch: Option<Uuid>,
    access_branches: &[Uuid],
    multi_branches: bool,
) -> Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO accounts (id, user_id, default_branch, access_branches, multi_branches) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(id)
    .bind(user_id)
    .bind(default_branch)
    .bind(access_branches.to_vec())
    .bind(multi_branches)
    .execute(pool)
    .await?;
    Ok(id)
}

/// Short unique suffix for names that carry unique constraints.
pub fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}
