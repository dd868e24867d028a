mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn serves_session_and_bookings_over_http() -> Result<()> {
    let server = common::TestServer::start().await?;
    let client = reqwest::Client::new();

    let res = client.get(format!("{}/", server.base_url)).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await?, "Hello world!");

    let res = client
        .post(format!("{}/jwt", server.base_url))
        .json(&json!({"email": "a@x.com"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let cookie = res
        .headers()
        .get(reqwest::header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
        .expect("token cookie");

    let res = client
        .post(format!("{}/bookings", server.base_url))
        .json(&json!({"email": "a@x.com", "service": "oil-change", "status": "pending"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{}/bookings?email=a@x.com", server.base_url))
        .header(reqwest::header::COOKIE, &cookie)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let bookings = res.json::<serde_json::Value>().await?;
    assert_eq!(bookings.as_array().map(Vec::len), Some(1));

    let res = client
        .get(format!("{}/bookings?email=a@x.com", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}
