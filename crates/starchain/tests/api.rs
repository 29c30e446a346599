mod common;

use anyhow::Result;
use common::{T0, spawn_app};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use starchain::GENESIS_DATA;
use starchain::http::BlockDto;

#[tokio::test]
async fn hello_and_height() -> Result<()> {
    let app = spawn_app().await;
    let client = Client::new();

    let hello = client.get(app.url("/hello")).send().await?.text().await?;
    assert_eq!(hello, "hello");

    let height: Value = client.get(app.url("/height")).send().await?.json().await?;
    assert_eq!(height, json!({ "height": 1 }));

    Ok(())
}

#[tokio::test]
async fn genesis_block_by_height() -> Result<()> {
    let app = spawn_app().await;
    let client = Client::new();

    let response = client.get(app.url("/block/0")).send().await?;
    assert_eq!(response.status(), StatusCode::OK);

    let genesis: BlockDto = response.json().await?;
    assert_eq!(genesis.body, GENESIS_DATA);
    assert_eq!(genesis.owner, "");
    assert_eq!(genesis.height, 0);
    assert_eq!(genesis.previous_block_hash, None);
    assert_eq!(genesis.time, T0);
    assert_eq!(genesis.hash.len(), 64);

    assert_eq!(
        client.get(app.url("/block/1")).send().await?.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        client.get(app.url("/block/-1")).send().await?.status(),
        StatusCode::BAD_REQUEST
    );

    Ok(())
}

#[tokio::test]
async fn request_validation_then_submit_star() -> Result<()> {
    let app = spawn_app().await;
    let client = Client::new();
    let address = "1FzpnkhbAteDkU1wXDtd8kKizQhqWcsrWe";

    let response = client
        .post(app.url("/requestValidation"))
        .json(&json!({ "address": address }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let message = response.text().await?;
    assert_eq!(message, format!("{address}:{T0}:starRegistry"));

    app.clock.advance(120);

    let star = json!({ "dec": "68 52 56.9", "ra": "16h 29m 1.0s", "story": "Testing" });
    let response = client
        .post(app.url("/submitStar"))
        .json(&json!({
            "address": address,
            "message": message,
            "star": star.clone(),
            "signature": "signature",
        }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    let block: BlockDto = response.json().await?;
    let genesis: BlockDto = client.get(app.url("/block/0")).send().await?.json().await?;
    assert_eq!(block.height, 1);
    assert_eq!(block.owner, address);
    assert_eq!(block.time, T0 + 120);
    assert_eq!(block.previous_block_hash.as_deref(), Some(genesis.hash.as_str()));
    assert_eq!(serde_json::from_str::<Value>(&block.body)?, star);

    let by_hash: BlockDto = client
        .get(app.url(&format!("/block/hash/{}", block.hash)))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(by_hash, block);

    let stars: Vec<String> = client
        .get(app.url(&format!("/blocks/{address}")))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(stars, vec![block.body.clone()]);

    let violations: Vec<String> = client.get(app.url("/validate")).send().await?.json().await?;
    assert!(violations.is_empty());

    Ok(())
}

#[tokio::test]
async fn outdated_submission_is_rejected() -> Result<()> {
    let app = spawn_app().await;
    let client = Client::new();

    let response = client
        .post(app.url("/submitStar"))
        .json(&json!({
            "address": "A",
            "message": format!("A:{}:starRegistry", T0 - 301),
            "star": { "story": "late" },
            "signature": "signature",
        }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await?;
    assert_eq!(body["status"], 400);
    assert_eq!(app.chain.height().await, 1);

    Ok(())
}

#[tokio::test]
async fn empty_address_is_rejected() -> Result<()> {
    let app = spawn_app().await;
    let client = Client::new();

    let response = client
        .post(app.url("/requestValidation"))
        .json(&json!({ "address": "" }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn malformed_hash_lookups() -> Result<()> {
    let app = spawn_app().await;
    let client = Client::new();

    let too_long = "0".repeat(66);
    for hash in ["zz", "abcd", too_long.as_str()] {
        let response = client
            .get(app.url(&format!("/block/hash/{hash}")))
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "hash {hash:?}");
    }

    let response = client
        .get(app.url(&format!("/block/hash/{}", "0".repeat(64))))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn unknown_wallet_has_no_stars() -> Result<()> {
    let app = spawn_app().await;

    let stars: Vec<String> = Client::new()
        .get(app.url("/blocks/nobody"))
        .send()
        .await?
        .json()
        .await?;
    assert!(stars.is_empty());

    Ok(())
}

#[tokio::test]
async fn uppercase_hash_is_rejected() -> Result<()> {
    let app = spawn_app().await;
    let client = Client::new();

    let genesis: BlockDto = client.get(app.url("/block/0")).send().await?.json().await?;

    let response = client
        .get(app.url(&format!("/block/hash/{}", genesis.hash.to_ascii_uppercase())))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .get(app.url(&format!("/block/hash/{}", genesis.hash)))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn undecodable_bodies_are_bad_requests() -> Result<()> {
    let app = spawn_app().await;
    let client = Client::new();

    let missing_star = client
        .post(app.url("/submitStar"))
        .json(&json!({
            "address": "A",
            "message": format!("A:{T0}:starRegistry"),
            "signature": "signature",
        }))
        .send()
        .await?;
    assert_eq!(missing_star.status(), StatusCode::BAD_REQUEST);
    let body: Value = missing_star.json().await?;
    assert_eq!(body["status"], 400);
    assert!(body["detail"].as_str().is_some_and(|d| d.contains("star")));

    let missing_address = client
        .post(app.url("/requestValidation"))
        .json(&json!({}))
        .send()
        .await?;
    assert_eq!(missing_address.status(), StatusCode::BAD_REQUEST);
    let body: Value = missing_address.json().await?;
    assert_eq!(body["status"], 400);

    let malformed = client
        .post(app.url("/submitStar"))
        .header("content-type", "application/json")
        .body("{\"address\": ")
        .send()
        .await?;
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
    let body: Value = malformed.json().await?;
    assert_eq!(body["status"], 400);

    assert_eq!(app.chain.height().await, 1);
    Ok(())
}
