use animal_rescue_test_support::{
    KillOnDrop, McpHttpSession, pick_unused_port, result_text, spawn_http_server, wait_http_ok,
};
use anyhow::Context as _;
use serde_json::{Value, json};
use std::path::Path;
use std::time::Duration;

async fn start_server(extra_args: &[&str]) -> anyhow::Result<(KillOnDrop, String)> {
    let bin = Path::new(env!("CARGO_BIN_EXE_animal-rescue-mcp"));
    let port = pick_unused_port()?;
    let child = spawn_http_server(bin, port, extra_args)?;

    let base_url = format!("http://127.0.0.1:{port}");
    wait_http_ok(&format!("{base_url}/health"), Duration::from_secs(20)).await?;
    Ok((child, base_url))
}

async fn status(base_url: &str) -> anyhow::Result<Value> {
    reqwest::get(format!("{base_url}/status"))
        .await
        .context("GET /status")?
        .error_for_status()
        .context("GET /status status")?
        .json()
        .await
        .context("GET /status json")
}

#[tokio::test]
async fn tools_list_exposes_the_adoption_tools() -> anyhow::Result<()> {
    let (_server, base_url) = start_server(&[]).await?;
    let session = McpHttpSession::connect(&base_url).await?;

    let msg = session
        .request("tools/list", json!({}), Duration::from_secs(5))
        .await?;
    let mut names: Vec<&str> = msg
        .pointer("/result/tools")
        .and_then(Value::as_array)
        .context("tools/list missing result.tools")?
        .iter()
        .filter_map(|t| t.get("name").and_then(Value::as_str))
        .collect();
    names.sort_unstable();

    assert_eq!(
        names,
        [
            "adopt_pet",
            "get_animal_by_id",
            "get_animal_by_name",
            "list_animals"
        ]
    );
    Ok(())
}

#[tokio::test]
async fn adopting_max_once_over_http() -> anyhow::Result<()> {
    let (_server, base_url) = start_server(&[]).await?;
    let session = McpHttpSession::connect(&base_url).await?;

    let list = session.call_tool("list_animals", json!({})).await?;
    anyhow::ensure!(result_text(&list)?.contains("• Max (dog)"));

    let first = session
        .call_tool("adopt_pet", json!({ "id": "dog-001" }))
        .await?;
    anyhow::ensure!(
        result_text(&first)?.starts_with("🎉 Adoption successful!"),
        "unexpected adopt text: {}",
        result_text(&first)?
    );
    assert_eq!(
        first.pointer("/structuredContent/certificate/animal_id"),
        Some(&json!("dog-001"))
    );

    let list = session.call_tool("list_animals", json!({})).await?;
    anyhow::ensure!(!result_text(&list)?.contains("Max"));

    let second = session
        .call_tool("adopt_pet", json!({ "animal_id": "dog-001" }))
        .await?;
    anyhow::ensure!(result_text(&second)?.starts_with("Unable to adopt animal with ID: dog-001"));
    assert_eq!(
        second.pointer("/structuredContent/success"),
        Some(&json!(false))
    );

    let status = status(&base_url).await?;
    assert_eq!(status.pointer("/catalog/adopted"), Some(&json!(1)));
    assert_eq!(status.pointer("/catalog/available"), Some(&json!(7)));
    Ok(())
}

#[tokio::test]
async fn name_lookup_is_case_insensitive_over_http() -> anyhow::Result<()> {
    let (_server, base_url) = start_server(&[]).await?;
    let session = McpHttpSession::connect(&base_url).await?;

    for name in ["MAX", "max", "Max"] {
        let result = session
            .call_tool("get_animal_by_name", json!({ "name": name }))
            .await?;
        assert_eq!(
            result.pointer("/structuredContent/animal/id"),
            Some(&json!("dog-001"))
        );
    }
    Ok(())
}

#[tokio::test]
async fn missing_arguments_return_error_text_not_faults() -> anyhow::Result<()> {
    let (_server, base_url) = start_server(&[]).await?;
    let session = McpHttpSession::connect(&base_url).await?;

    let by_id = session.call_tool("get_animal_by_id", json!({})).await?;
    assert_eq!(result_text(&by_id)?, "Error: id is required");

    let by_name = session
        .call_tool("get_animal_by_name", json!({ "name": "   " }))
        .await?;
    assert_eq!(result_text(&by_name)?, "Error: name is required");

    // Wrong-typed values are answered like missing ones, not with invalid-params faults.
    let numeric = session
        .call_tool("get_animal_by_id", json!({ "id": 5 }))
        .await?;
    assert_eq!(result_text(&numeric)?, "Error: id is required");

    let adopt = session
        .call_tool("adopt_pet", json!({ "animal_id": 5 }))
        .await?;
    assert_eq!(result_text(&adopt)?, "Error: id is required");
    assert_eq!(
        adopt.pointer("/structuredContent/success"),
        Some(&json!(false))
    );
    Ok(())
}

#[tokio::test]
async fn concurrent_sessions_adopt_the_same_cat_once() -> anyhow::Result<()> {
    let (_server, base_url) = start_server(&[]).await?;
    let a = McpHttpSession::connect(&base_url).await?;
    let b = McpHttpSession::connect(&base_url).await?;

    let args = json!({ "id": "cat-001" });
    let (ra, rb) = tokio::join!(
        a.call_tool("adopt_pet", args.clone()),
        b.call_tool("adopt_pet", args)
    );

    let successes = [ra?, rb?]
        .iter()
        .filter(|r| r.pointer("/structuredContent/success") == Some(&json!(true)))
        .count();
    assert_eq!(successes, 1);
    Ok(())
}

#[tokio::test]
async fn custom_catalog_and_pickup_location() -> anyhow::Result<()> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let catalog = dir.path().join("animals.yaml");
    std::fs::write(
        &catalog,
        r"- id: ferret-001
  name: Noodle
  species: ferret
  breed: Standard
  age: 2
  gender: male
  size: small
  color: sable
  description: Endlessly curious.
  vaccinated: true
  spayed_neutered: true
  good_with_kids: true
  good_with_pets: false
  energy_level: high
  adoption_fee: 120
  date_arrived: 2024-04-01
",
    )
    .context("write catalog")?;

    let catalog_arg = catalog.to_str().context("utf-8 temp path")?;
    let (_server, base_url) = start_server(&[
        "--catalog",
        catalog_arg,
        "--pickup-location",
        "Ferret Rescue, Dock 4",
    ])
    .await?;
    let session = McpHttpSession::connect(&base_url).await?;

    let result = session
        .call_tool("adopt_pet", json!({ "id": "noodle" }))
        .await?;
    let text = result_text(&result)?;
    anyhow::ensure!(
        text.starts_with("Found 'noodle' -> ID: ferret-001"),
        "unexpected text: {text}"
    );
    assert_eq!(
        result.pointer("/structuredContent/certificate/pickup_location"),
        Some(&json!("Ferret Rescue, Dock 4"))
    );

    let status = status(&base_url).await?;
    assert_eq!(status.pointer("/catalog/total"), Some(&json!(1)));
    Ok(())
}
