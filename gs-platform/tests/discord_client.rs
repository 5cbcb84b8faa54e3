//! HTTP-level tests for the REST platform client.

use gs_platform::discord::{DiscordClient, DiscordConfig};
use gs_platform::{
    GroupSpec, Overwrite, Permissions, PlatformClient, PlatformError, ResourceKind, Snowflake,
    TextResourceSpec,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GUILD: Snowflake = Snowflake(100_000_000_000_000_001);

async fn connected_client(server: &MockServer) -> DiscordClient {
    Mock::given(method("GET"))
        .and(path("/users/@me"))
        .and(header("authorization", "Bot test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "900000000000000009",
            "username": "guildspace"
        })))
        .mount(server)
        .await;

    let config = DiscordConfig {
        token: "test-token".to_string(),
        guild_id: GUILD,
        api_base: server.uri(),
    };
    DiscordClient::connect(config)
        .await
        .expect("client should connect")
}

#[tokio::test]
async fn test_connect_resolves_service_identity() {
    let server = MockServer::start().await;
    let client = connected_client(&server).await;

    assert_eq!(client.service_id(), Snowflake(900_000_000_000_000_009));
    assert_eq!(client.everyone_id(), GUILD);
    assert_eq!(client.name(), "discord");
}

#[tokio::test]
async fn test_list_resources_filters_channel_types() {
    let server = MockServer::start().await;
    let client = connected_client(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("/guilds/{GUILD}/channels")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "1", "type": 4, "name": "Projets" },
            { "id": "2", "type": 0, "name": "brief", "parent_id": "1",
              "topic": "WORKSPACE:atlas | GROUP:123456789012345678 | BRIEF" },
            { "id": "3", "type": 2, "name": "vocal – réunion・p-atlas", "parent_id": "1" },
            { "id": "4", "type": 15, "name": "forum" }
        ])))
        .mount(&server)
        .await;

    let resources = client.list_resources().await.unwrap();
    assert_eq!(resources.len(), 2);
    assert_eq!(resources[0].kind, ResourceKind::Text);
    assert_eq!(resources[0].container_id, Some(Snowflake(1)));
    assert_eq!(resources[1].kind, ResourceKind::Voice);
    assert!(resources[1].metadata_tag.is_none());

    let containers = client.list_containers().await.unwrap();
    assert_eq!(containers.len(), 1);
    assert_eq!(containers[0].label, "Projets");
}

#[tokio::test]
async fn test_create_group_sends_flags() {
    let server = MockServer::start().await;
    let client = connected_client(&server).await;

    Mock::given(method("POST"))
        .and(path(format!("/guilds/{GUILD}/roles")))
        .and(body_partial_json(json!({
            "name": "PROJET — Atlas",
            "color": 0x5865F2,
            "hoist": true,
            "mentionable": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "555555555555555555",
            "name": "PROJET — Atlas",
            "color": 0x5865F2,
            "hoist": true,
            "mentionable": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let group = client
        .create_group(&GroupSpec {
            label: "PROJET — Atlas".to_string(),
            color: 0x5865F2,
            mentionable: true,
            hoisted: true,
        })
        .await
        .unwrap();

    assert_eq!(group.id, Snowflake(555_555_555_555_555_555));
    assert!(group.hoisted);
}

#[tokio::test]
async fn test_create_text_resource_sends_overwrites() {
    let server = MockServer::start().await;
    let client = connected_client(&server).await;

    Mock::given(method("POST"))
        .and(path(format!("/guilds/{GUILD}/channels")))
        .and(body_partial_json(json!({
            "name": "brief",
            "type": 0,
            "parent_id": "7",
            "topic": "WORKSPACE:atlas",
            "permission_overwrites": [
                { "id": GUILD.to_string(), "type": 0, "allow": "0", "deny": "1024" },
                { "id": "900000000000000009", "type": 1, "allow": "1024", "deny": "0" }
            ]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "8", "type": 0, "name": "brief", "parent_id": "7", "topic": "WORKSPACE:atlas"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let spec = TextResourceSpec {
        label: "brief".to_string(),
        container_id: Snowflake(7),
        metadata_tag: "WORKSPACE:atlas".to_string(),
        access: vec![
            Overwrite::role(GUILD, Permissions::NONE, Permissions::VIEW_CHANNEL),
            Overwrite::member(
                client.service_id(),
                Permissions::VIEW_CHANNEL,
                Permissions::NONE,
            ),
        ],
    };

    let resource = client.create_text_resource(&spec).await.unwrap();
    assert_eq!(resource.id, Snowflake(8));
    assert_eq!(resource.metadata_tag.as_deref(), Some("WORKSPACE:atlas"));
}

#[tokio::test]
async fn test_move_syncs_permissions_and_retag_uses_patch() {
    let server = MockServer::start().await;
    let client = connected_client(&server).await;

    Mock::given(method("PATCH"))
        .and(path("/channels/8"))
        .and(body_partial_json(json!({ "parent_id": "9", "lock_permissions": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "8", "type": 0 })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/channels/8"))
        .and(body_partial_json(json!({ "topic": "WORKSPACE:atlas | BRIEF" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "8", "type": 0 })))
        .expect(1)
        .mount(&server)
        .await;

    client.move_resource(Snowflake(8), Snowflake(9)).await.unwrap();
    client
        .set_resource_metadata_tag(Snowflake(8), "WORKSPACE:atlas | BRIEF")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_error_statuses_are_mapped() {
    let server = MockServer::start().await;
    let client = connected_client(&server).await;

    Mock::given(method("DELETE"))
        .and(path("/channels/8"))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_json(json!({ "message": "Missing Permissions", "code": 50013 })),
        )
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path(format!("/guilds/{GUILD}/roles/5")))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_json(json!({ "message": "You are being rate limited.", "retry_after": 2.5 })),
        )
        .mount(&server)
        .await;

    let err = client.delete_resource(Snowflake(8)).await.unwrap_err();
    assert!(err.is_forbidden());
    assert!(err.to_string().contains("Missing Permissions"));

    let err = client.delete_group(Snowflake(5)).await.unwrap_err();
    match err {
        PlatformError::RateLimited { retry_after_secs } => assert_eq!(retry_after_secs, 2.5),
        other => panic!("expected rate limit, got {other:?}"),
    }
}
