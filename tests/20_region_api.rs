mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;
use uuid::Uuid;

use common::{as_admin, as_user, ensure_server, unique};

#[tokio::test]
async fn create_sets_server_timestamps() -> Result<()> {
    if !common::database_configured() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = ensure_server().await?;
    let client = reqwest::Client::new();

    let res = as_admin(client.post(format!("{}/geospatial/regions/create", server.base_url)))
        .json(&serde_json::json!({
            "name": unique("Haro Maya"),
            "code": unique("41006"),
            // client-supplied timestamps must be ignored
            "created_at": "2001-01-01T00:00:00Z"
        }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::OK);
    let region = res.json::<Value>().await?;
    assert!(region["id"].is_string());
    assert_eq!(region["created_at"], region["updated_at"]);
    assert_ne!(region["created_at"], "2001-01-01T00:00:00Z");
    Ok(())
}

#[tokio::test]
async fn create_collects_all_validation_errors() -> Result<()> {
    if !common::database_configured() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = ensure_server().await?;
    let client = reqwest::Client::new();

    let res = as_admin(client.post(format!("{}/geospatial/regions/create", server.base_url)))
        .json(&serde_json::json!({ "name": "  " }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(body["type"], "REGION_CREATION_ERROR");
    assert_eq!(body["field_errors"]["name"], "Region name is empty");
    assert_eq!(body["field_errors"]["code"], "Region code is empty");
    Ok(())
}

#[tokio::test]
async fn create_requires_region_permission() -> Result<()> {
    if !common::database_configured() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = ensure_server().await?;
    let client = reqwest::Client::new();

    // Officers may view regions but not create them
    let res = as_user(
        client.post(format!("{}/geospatial/regions/create", server.base_url)),
        Uuid::new_v4(),
        "officer",
    )
    .json(&serde_json::json!({ "name": unique("r"), "code": unique("c") }))
    .send()
    .await?;

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body = res.json::<Value>().await?;
    assert_eq!(body["type"], "REGION_CREATION_ERROR");
    Ok(())
}

#[tokio::test]
async fn missing_principal_is_unauthorized() -> Result<()> {
    if !common::database_configured() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/geospatial/regions/paginate", server.base_url))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = res.json::<Value>().await?;
    assert_eq!(body["type"], "UNAUTHORIZED");
    Ok(())
}

#[tokio::test]
async fn update_is_a_partial_merge() -> Result<()> {
    if !common::database_configured() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = ensure_server().await?;
    let client = reqwest::Client::new();

    let name = unique("Gimbo");
    let created = as_admin(client.post(format!("{}/geospatial/regions/create", server.base_url)))
        .json(&serde_json::json!({ "name": name, "code": unique("41007") }))
        .send()
        .await?
        .json::<Value>()
        .await?;
    let id = created["id"].as_str().unwrap().to_string();
    let created_updated_at = created["updated_at"].as_str().unwrap().to_string();

    let new_code = unique("99999");
    let updated = as_admin(client.put(format!("{}/geospatial/regions/{id}", server.base_url)))
        .json(&serde_json::json!({ "code": new_code }))
        .send()
        .await?
        .json::<Value>()
        .await?;

    assert_eq!(updated["name"], name, "untouched field must survive");
    assert_eq!(updated["code"], new_code);
    let before: chrono::DateTime<chrono::Utc> = created_updated_at.parse()?;
    let after: chrono::DateTime<chrono::Utc> = updated["updated_at"].as_str().unwrap().parse()?;
    assert!(after > before, "updated_at must move forward");
    assert_eq!(updated["created_at"], created["created_at"]);
    Ok(())
}

#[tokio::test]
async fn paginate_honors_the_envelope_contract() -> Result<()> {
    if !common::database_configured() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = ensure_server().await?;
    let client = reqwest::Client::new();

    for _ in 0..3 {
        as_admin(client.post(format!("{}/geospatial/regions/create", server.base_url)))
            .json(&serde_json::json!({ "name": unique("page"), "code": unique("pg") }))
            .send()
            .await?
            .error_for_status()?;
    }

    let page = as_admin(client.get(format!(
        "{}/geospatial/regions/paginate?page=1&per_page=2",
        server.base_url
    )))
    .send()
    .await?
    .json::<Value>()
    .await?;

    let total = page["total_docs_count"].as_i64().unwrap();
    let total_pages = page["total_pages"].as_i64().unwrap();
    let docs = page["docs"].as_array().unwrap();

    assert!(total >= 3);
    assert_eq!(total_pages, (total + 1) / 2, "total_pages == ceil(total/2)");
    assert_eq!(page["current_page"], 1);
    assert!(docs.len() <= 2);
    Ok(())
}

#[tokio::test]
async fn search_requires_a_query() -> Result<()> {
    if !common::database_configured() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = ensure_server().await?;
    let client = reqwest::Client::new();

    let res = as_admin(client.get(format!("{}/geospatial/regions/search", server.base_url)))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(body["type"], "REGION_SEARCH_ERROR");
    assert_eq!(body["message"], "Search query is missing");

    let res = as_admin(client.get(format!(
        "{}/geospatial/regions/search?color=red",
        server.base_url
    )))
    .send()
    .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(body["type"], "REGION_SEARCH_ERROR");
    Ok(())
}

#[tokio::test]
async fn search_finds_by_allowlisted_field() -> Result<()> {
    if !common::database_configured() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = ensure_server().await?;
    let client = reqwest::Client::new();

    let code = unique("41010");
    as_admin(client.post(format!("{}/geospatial/regions/create", server.base_url)))
        .json(&serde_json::json!({ "name": unique("search-me"), "code": code }))
        .send()
        .await?
        .error_for_status()?;

    let found = as_admin(client.get(format!(
        "{}/geospatial/regions/search?code={code}",
        server.base_url
    )))
    .send()
    .await?
    .json::<Value>()
    .await?;

    let docs = found.as_array().unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0]["code"], code);
    Ok(())
}

#[tokio::test]
async fn remove_cascades_into_branch_region_lists() -> Result<()> {
    if !common::database_configured() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = ensure_server().await?;
    let client = reqwest::Client::new();
    let pool = common::pool().await?;

    let r1 = as_admin(client.post(format!("{}/geospatial/regions/create", server.base_url)))
        .json(&serde_json::json!({ "name": unique("cascade-a"), "code": unique("ca") }))
        .send()
        .await?
        .json::<Value>()
        .await?;
    let r2 = as_admin(client.post(format!("{}/geospatial/regions/create", server.base_url)))
        .json(&serde_json::json!({ "name": unique("cascade-b"), "code": unique("cb") }))
        .send()
        .await?
        .json::<Value>()
        .await?;
    let r1_id: Uuid = r1["id"].as_str().unwrap().parse()?;
    let r2_id: Uuid = r2["id"].as_str().unwrap().parse()?;

    let b1 = common::seed_branch(&pool, &unique("b1"), &[r1_id, r2_id]).await?;
    let b2 = common::seed_branch(&pool, &unique("b2"), &[r1_id]).await?;
    let b3 = common::seed_branch(&pool, &unique("b3"), &[r2_id]).await?;

    let res = as_admin(client.delete(format!(
        "{}/geospatial/regions/{r1_id}",
        server.base_url
    )))
    .send()
    .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let lists: Vec<(Uuid, Vec<Uuid>)> = sqlx::query_as(
        "SELECT id, region_ids FROM branches WHERE id = ANY($1) ORDER BY created_at",
    )
    .bind(vec![b1, b2, b3])
    .fetch_all(&pool)
    .await?;

    let by_id = |id: Uuid| {
        lists
            .iter()
            .find(|(branch, _)| *branch == id)
            .map(|(_, regions)| regions.clone())
            .unwrap()
    };
    assert_eq!(by_id(b1), vec![r2_id]);
    assert_eq!(by_id(b2), Vec::<Uuid>::new());
    assert_eq!(by_id(b3), vec![r2_id], "unrelated branch must stay intact");

    // A second delete reports the missing record through the same kind
    let res = as_admin(client.delete(format!(
        "{}/geospatial/regions/{r1_id}",
        server.base_url
    )))
    .send()
    .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(body["type"], "REMOVE_REGION_ERROR");
    Ok(())
}
