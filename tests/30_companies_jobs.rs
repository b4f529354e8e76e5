mod common;

use anyhow::Result;
use axum::{
    http::{Method, StatusCode},
    Router,
};
use serde_json::{json, Value};

async fn create_company(app: &Router, admin: &str, handle: &str, employees: i64) -> Result<Value> {
    let (status, body) = common::send(
        app,
        Method::POST,
        "/companies",
        Some(admin),
        Some(json!({
            "handle": handle,
            "name": format!("Company {}", handle),
            "description": "Makes things",
            "numEmployees": employees,
            "logoUrl": "http://logo.example/c.png"
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "body: {}", body);
    Ok(body["company"].clone())
}

#[tokio::test]
async fn patch_changes_only_given_field() -> Result<()> {
    let Some((app, _pool)) = common::db_app().await? else {
        return Ok(());
    };
    let admin = common::token("root", true);
    let handle = common::unique("acme");
    let before = create_company(&app, &admin, &handle, 10).await?;

    let (status, body) = common::send(
        &app,
        Method::PATCH,
        &format!("/companies/{}", handle),
        Some(&admin),
        Some(json!({ "numEmployees": 50 })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK, "body: {}", body);

    let after = &body["company"];
    assert_eq!(after["numEmployees"], 50);
    for field in ["handle", "name", "description", "logoUrl", "location"] {
        assert_eq!(after[field], before[field], "{} changed", field);
    }
    Ok(())
}

#[tokio::test]
async fn patch_null_clears_nullable_fields() -> Result<()> {
    let Some((app, _pool)) = common::db_app().await? else {
        return Ok(());
    };
    let admin = common::token("root", true);
    let handle = common::unique("clear");
    let before = create_company(&app, &admin, &handle, 12).await?;
    assert!(before["logoUrl"].is_string());

    let (status, body) = common::send(
        &app,
        Method::PATCH,
        &format!("/companies/{}", handle),
        Some(&admin),
        Some(json!({ "logoUrl": null, "numEmployees": null })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body["company"]["logoUrl"], Value::Null);
    assert_eq!(body["company"]["numEmployees"], Value::Null);
    assert_eq!(body["company"]["name"], before["name"]);

    let (status, body) = common::send(
        &app,
        Method::POST,
        "/jobs",
        Some(&admin),
        Some(json!({ "title": "Clerk", "salary": 100, "equity": 0.5, "companyHandle": handle })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "body: {}", body);
    let id = body["job"]["id"].as_i64().unwrap_or_default();

    let (status, body) = common::send(
        &app,
        Method::PATCH,
        &format!("/jobs/{}", id),
        Some(&admin),
        Some(json!({ "salary": null, "equity": null })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body["job"]["salary"], Value::Null);
    assert_eq!(body["job"]["equity"], Value::Null);
    assert_eq!(body["job"]["title"], "Clerk");
    Ok(())
}

#[tokio::test]
async fn patch_rejects_handle_change() -> Result<()> {
    let Some((app, _pool)) = common::db_app().await? else {
        return Ok(());
    };
    let admin = common::token("root", true);
    let handle = common::unique("fixed");
    create_company(&app, &admin, &handle, 1).await?;

    let (status, _) = common::send(
        &app,
        Method::PATCH,
        &format!("/companies/{}", handle),
        Some(&admin),
        Some(json!({ "handle": "moved" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn duplicate_company_is_bad_request() -> Result<()> {
    let Some((app, _pool)) = common::db_app().await? else {
        return Ok(());
    };
    let admin = common::token("root", true);
    let handle = common::unique("dup");
    create_company(&app, &admin, &handle, 1).await?;

    let (status, body) = common::send(
        &app,
        Method::POST,
        "/companies",
        Some(&admin),
        Some(json!({ "handle": handle, "name": "Other name", "description": "x" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], format!("Duplicate company: {}", handle));
    Ok(())
}

#[tokio::test]
async fn missing_company_is_404() -> Result<()> {
    let Some((app, _pool)) = common::db_app().await? else {
        return Ok(());
    };
    let admin = common::token("root", true);

    let (status, _) = common::send(&app, Method::GET, "/companies/nope-nope", None, None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = common::send(
        &app,
        Method::PATCH,
        "/companies/nope-nope",
        Some(&admin),
        Some(json!({ "name": "x" })),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = common::send(&app, Method::DELETE, "/companies/nope-nope", Some(&admin), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn job_lifecycle() -> Result<()> {
    let Some((app, _pool)) = common::db_app().await? else {
        return Ok(());
    };
    let admin = common::token("root", true);
    let handle = common::unique("jobs");
    create_company(&app, &admin, &handle, 3).await?;

    let (status, body) = common::send(
        &app,
        Method::POST,
        "/jobs",
        Some(&admin),
        Some(json!({ "title": "Welder", "salary": 50000, "equity": 0.1, "companyHandle": handle })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "body: {}", body);
    let id = body["job"]["id"].as_i64().unwrap_or_default();
    assert_eq!(body["job"]["equity"], 0.1);

    // Company detail lists its jobs
    let (_, body) = common::send(&app, Method::GET, &format!("/companies/{}", handle), None, None).await?;
    assert_eq!(body["company"]["jobs"][0]["id"], id);

    let (status, body) = common::send(
        &app,
        Method::PATCH,
        &format!("/jobs/{}", id),
        Some(&admin),
        Some(json!({ "salary": 60000 })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body["job"]["salary"], 60000);
    assert_eq!(body["job"]["title"], "Welder");

    let (_, body) = common::send(&app, Method::GET, "/jobs?title=welder&minSalary=55000", None, None).await?;
    let ids: Vec<i64> = body["jobs"]
        .as_array()
        .cloned()
        .unwrap_or_default()
        .iter()
        .filter_map(|j| j["id"].as_i64())
        .collect();
    assert!(ids.contains(&id));

    let (status, body) = common::send(&app, Method::DELETE, &format!("/jobs/{}", id), Some(&admin), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], id);

    let (status, _) = common::send(&app, Method::GET, &format!("/jobs/{}", id), None, None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn job_for_missing_company_is_bad_request() -> Result<()> {
    let Some((app, _pool)) = common::db_app().await? else {
        return Ok(());
    };
    let admin = common::token("root", true);

    let (status, body) = common::send(
        &app,
        Method::POST,
        "/jobs",
        Some(&admin),
        Some(json!({ "title": "Ghost", "companyHandle": "no-such-company" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No company: no-such-company");
    Ok(())
}
