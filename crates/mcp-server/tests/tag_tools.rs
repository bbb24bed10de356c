//! Tag search, tag deletion with orphan cleanup, and the tags resource.

use anyhow::Result;
use serde_json::json;

mod support;

const SOURCE: &str = "\
def authenticate(token):
    payload = decode(token)
    return payload

def upload(data):
    blob = pack(data)
    return blob
";

#[tokio::test]
async fn tag_surface_end_to_end() -> Result<()> {
    let dir = tempfile::TempDir::new()?;
    std::fs::write(dir.path().join("api.py"), SOURCE)?;
    let mut client = support::McpClient::start(dir.path()).await?;

    let (_, a) = client
        .call_tool(
            "create_shard",
            json!({
                "file": "api.py",
                "from_text": "def authenticate(",
                "to_text": "return payload",
                "tags": ["auth"]
            }),
        )
        .await?;
    assert_eq!(a["status"], "ok");

    let (_, b) = client
        .call_tool(
            "create_shard",
            json!({
                "file": "api.py",
                "from_text": "def upload(",
                "to_text": "return blob",
                "tags": ["auth", "api"]
            }),
        )
        .await?;
    assert_eq!(b["status"], "ok");

    // Fuzzy search finds the tag with its shard count.
    let (is_error, search) = client
        .call_tool("search_tags", json!({ "query": "auth" }))
        .await?;
    assert!(!is_error);
    let hit = search["tags"]
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["tag"] == "auth")
        .expect("search_tags missing 'auth'");
    assert_eq!(hit["shard_count"], 2);

    // The resource lists tags.
    let resource = client
        .request(
            "resources/read",
            json!({ "uri": "memshard://tags" }),
        )
        .await?;
    let text = resource["result"]["contents"][0]["text"]
        .as_str()
        .unwrap_or_default();
    assert!(text.contains("auth"), "tags resource missing 'auth': {text}");

    // Deleting the shared tag orphans the single-tag shard.
    let (is_error, deleted) = client
        .call_tool("delete_tag", json!({ "tag": "auth" }))
        .await?;
    assert!(!is_error);
    assert_eq!(deleted["status"], "ok");
    assert_eq!(deleted["modified"], 2);
    assert_eq!(deleted["orphans_deleted"], 1);

    // The surviving shard kept its other tag.
    let (_, remaining) = client
        .call_tool("view_shards", json!({ "tags": ["api"] }))
        .await?;
    assert_eq!(remaining["total"], 1);
    assert_eq!(remaining["shards"][0]["tags"], json!(["api"]));

    // Deleting again reports not_found.
    let (_, again) = client.call_tool("delete_tag", json!({ "tag": "auth" })).await?;
    assert_eq!(again["status"], "not_found");

    client.shutdown().await;
    Ok(())
}
