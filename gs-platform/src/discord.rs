//! REST implementation of [`PlatformClient`] for a single guild.
//!
//! Groups map to guild roles, containers to category channels and managed
//! resources to text and voice channels. Rate limits are reported as
//! [`PlatformError::RateLimited`] and never retried here.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{PlatformError, Result};
use crate::model::{
    Container, Group, GroupSpec, Resource, ResourceKind, Snowflake, TextResourceSpec,
    VoiceResourceSpec,
};
use crate::permissions::{Overwrite, Permissions, PrincipalKind};
use crate::PlatformClient;

pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

const USER_AGENT: &str = concat!("guildspace (", env!("CARGO_PKG_VERSION"), ")");

const CHANNEL_TEXT: u8 = 0;
const CHANNEL_VOICE: u8 = 2;
const CHANNEL_CATEGORY: u8 = 4;

const OVERWRITE_ROLE: u8 = 0;
const OVERWRITE_MEMBER: u8 = 1;

#[derive(Debug, Clone)]
pub struct DiscordConfig {
    pub token: String,
    pub guild_id: Snowflake,
    pub api_base: String,
}

impl DiscordConfig {
    pub fn new(token: impl Into<String>, guild_id: Snowflake) -> Self {
        Self {
            token: token.into(),
            guild_id,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

pub struct DiscordClient {
    http: reqwest::Client,
    api_base: String,
    guild_id: Snowflake,
    service_id: Snowflake,
}

// Wire payloads

#[derive(Debug, Deserialize)]
struct UserPayload {
    id: Snowflake,
}

#[derive(Debug, Deserialize)]
struct RolePayload {
    id: Snowflake,
    name: String,
    #[serde(default)]
    color: u32,
    #[serde(default)]
    hoist: bool,
    #[serde(default)]
    mentionable: bool,
}

impl From<RolePayload> for Group {
    fn from(role: RolePayload) -> Self {
        Self {
            id: role.id,
            label: role.name,
            color: role.color,
            mentionable: role.mentionable,
            hoisted: role.hoist,
        }
    }
}

#[derive(Debug, Serialize)]
struct CreateRoleBody<'a> {
    name: &'a str,
    color: u32,
    hoist: bool,
    mentionable: bool,
}

#[derive(Debug, Deserialize)]
struct ChannelPayload {
    id: Snowflake,
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    parent_id: Option<Snowflake>,
    #[serde(default)]
    topic: Option<String>,
}

impl ChannelPayload {
    fn into_resource(self) -> Option<Resource> {
        let kind = match self.kind {
            CHANNEL_TEXT => ResourceKind::Text,
            CHANNEL_VOICE => ResourceKind::Voice,
            _ => return None,
        };
        Some(Resource {
            id: self.id,
            kind,
            container_id: self.parent_id,
            label: self.name.unwrap_or_default(),
            metadata_tag: self.topic,
        })
    }

    fn into_container(self) -> Option<Container> {
        (self.kind == CHANNEL_CATEGORY).then(|| Container {
            id: self.id,
            label: self.name.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Serialize)]
struct OverwritePayload {
    id: Snowflake,
    #[serde(rename = "type")]
    kind: u8,
    allow: Permissions,
    deny: Permissions,
}

impl From<&Overwrite> for OverwritePayload {
    fn from(overwrite: &Overwrite) -> Self {
        Self {
            id: overwrite.principal,
            kind: match overwrite.kind {
                PrincipalKind::Role => OVERWRITE_ROLE,
                PrincipalKind::Member => OVERWRITE_MEMBER,
            },
            allow: overwrite.allow,
            deny: overwrite.deny,
        }
    }
}

fn overwrite_payloads(access: &[Overwrite]) -> Vec<OverwritePayload> {
    access.iter().map(OverwritePayload::from).collect()
}

#[derive(Debug, Serialize)]
struct CreateChannelBody<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_id: Option<Snowflake>,
    #[serde(skip_serializing_if = "Option::is_none")]
    topic: Option<&'a str>,
    permission_overwrites: Vec<OverwritePayload>,
}

#[derive(Debug, Default, Serialize)]
struct ModifyChannelBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_id: Option<Snowflake>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lock_permissions: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    topic: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    permission_overwrites: Option<Vec<OverwritePayload>>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    retry_after: Option<f64>,
}

impl DiscordClient {
    /// Build a client and resolve the service identity with `GET /users/@me`.
    #[instrument(skip(config), fields(guild_id = %config.guild_id))]
    pub async fn connect(config: DiscordConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bot {}", config.token))
            .map_err(|e| PlatformError::Rejected(format!("invalid token: {e}")))?;
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .build()?;

        let mut client = Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            guild_id: config.guild_id,
            service_id: Snowflake(0),
        };

        let me: UserPayload = client.send(client.request(Method::GET, "/users/@me")).await?;
        client.service_id = me.id;
        debug!(service_id = %me.id, "Resolved service identity");

        Ok(client)
    }

    pub fn guild_id(&self) -> Snowflake {
        self.guild_id
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{}", self.api_base, path))
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let body: Option<ErrorBody> = serde_json::from_str(&text).ok();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = body.and_then(|b| b.retry_after).unwrap_or(1.0);
            return Err(PlatformError::RateLimited { retry_after_secs });
        }

        let message = body.and_then(|b| b.message).unwrap_or(text);
        Err(PlatformError::Http {
            status: status.as_u16(),
            message,
        })
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = Self::check(request.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn send_empty(&self, request: RequestBuilder) -> Result<()> {
        Self::check(request.send().await?).await?;
        Ok(())
    }

    async fn fetch_channels(&self) -> Result<Vec<ChannelPayload>> {
        let path = format!("/guilds/{}/channels", self.guild_id);
        self.send(self.request(Method::GET, &path)).await
    }

    async fn create_channel(&self, body: &CreateChannelBody<'_>) -> Result<ChannelPayload> {
        let path = format!("/guilds/{}/channels", self.guild_id);
        self.send(self.request(Method::POST, &path).json(body)).await
    }

    async fn modify_channel(&self, id: Snowflake, body: &ModifyChannelBody<'_>) -> Result<()> {
        let path = format!("/channels/{id}");
        self.send_empty(self.request(Method::PATCH, &path).json(body))
            .await
    }
}

#[async_trait]
impl PlatformClient for DiscordClient {
    fn name(&self) -> &'static str {
        "discord"
    }

    // The @everyone role shares its id with the guild.
    fn everyone_id(&self) -> Snowflake {
        self.guild_id
    }

    fn service_id(&self) -> Snowflake {
        self.service_id
    }

    async fn create_group(&self, spec: &GroupSpec) -> Result<Group> {
        let path = format!("/guilds/{}/roles", self.guild_id);
        let body = CreateRoleBody {
            name: &spec.label,
            color: spec.color,
            hoist: spec.hoisted,
            mentionable: spec.mentionable,
        };
        let role: RolePayload = self
            .send(self.request(Method::POST, &path).json(&body))
            .await?;
        Ok(role.into())
    }

    async fn delete_group(&self, id: Snowflake) -> Result<()> {
        let path = format!("/guilds/{}/roles/{id}", self.guild_id);
        self.send_empty(self.request(Method::DELETE, &path)).await
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        let path = format!("/guilds/{}/roles", self.guild_id);
        let roles: Vec<RolePayload> = self.send(self.request(Method::GET, &path)).await?;
        Ok(roles.into_iter().map(Group::from).collect())
    }

    async fn create_container(&self, label: &str) -> Result<Container> {
        let body = CreateChannelBody {
            name: label,
            kind: CHANNEL_CATEGORY,
            parent_id: None,
            topic: None,
            permission_overwrites: Vec::new(),
        };
        let channel = self.create_channel(&body).await?;
        let id = channel.id;
        channel.into_container().ok_or_else(|| {
            PlatformError::Decode(format!("channel {id} was not created as a category"))
        })
    }

    async fn list_containers(&self) -> Result<Vec<Container>> {
        let channels = self.fetch_channels().await?;
        Ok(channels
            .into_iter()
            .filter_map(ChannelPayload::into_container)
            .collect())
    }

    async fn set_container_access(&self, id: Snowflake, access: &[Overwrite]) -> Result<()> {
        let body = ModifyChannelBody {
            permission_overwrites: Some(overwrite_payloads(access)),
            ..Default::default()
        };
        self.modify_channel(id, &body).await
    }

    async fn create_text_resource(&self, spec: &TextResourceSpec) -> Result<Resource> {
        let body = CreateChannelBody {
            name: &spec.label,
            kind: CHANNEL_TEXT,
            parent_id: Some(spec.container_id),
            topic: Some(&spec.metadata_tag),
            permission_overwrites: overwrite_payloads(&spec.access),
        };
        let channel = self.create_channel(&body).await?;
        let id = channel.id;
        channel
            .into_resource()
            .ok_or_else(|| PlatformError::Decode(format!("channel {id} is not a text channel")))
    }

    async fn create_voice_resource(&self, spec: &VoiceResourceSpec) -> Result<Resource> {
        let body = CreateChannelBody {
            name: &spec.label,
            kind: CHANNEL_VOICE,
            parent_id: Some(spec.container_id),
            topic: None,
            permission_overwrites: overwrite_payloads(&spec.access),
        };
        let channel = self.create_channel(&body).await?;
        let id = channel.id;
        channel
            .into_resource()
            .ok_or_else(|| PlatformError::Decode(format!("channel {id} is not a voice channel")))
    }

    async fn list_resources(&self) -> Result<Vec<Resource>> {
        let channels = self.fetch_channels().await?;
        Ok(channels
            .into_iter()
            .filter_map(ChannelPayload::into_resource)
            .collect())
    }

    async fn move_resource(&self, id: Snowflake, container_id: Snowflake) -> Result<()> {
        let body = ModifyChannelBody {
            parent_id: Some(container_id),
            lock_permissions: Some(true),
            ..Default::default()
        };
        self.modify_channel(id, &body).await
    }

    async fn delete_resource(&self, id: Snowflake) -> Result<()> {
        let path = format!("/channels/{id}");
        self.send_empty(self.request(Method::DELETE, &path)).await
    }

    async fn set_resource_access(&self, id: Snowflake, access: &[Overwrite]) -> Result<()> {
        let body = ModifyChannelBody {
            permission_overwrites: Some(overwrite_payloads(access)),
            ..Default::default()
        };
        self.modify_channel(id, &body).await
    }

    async fn set_resource_metadata_tag(&self, id: Snowflake, tag: &str) -> Result<()> {
        let body = ModifyChannelBody {
            topic: Some(tag),
            ..Default::default()
        };
        self.modify_channel(id, &body).await
    }
}
