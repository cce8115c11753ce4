//! Custom tag lookups and auditing.

use std::sync::Arc;

use log::debug;
use serde::Serialize;
use serde_json::Value;

use super::APPLICATION_VERSIONS_PATH;
use super::CustomTagsQuery;
use crate::cache::DEFAULT_CACHE_CAPACITY;
use crate::cache::LoadingCache;
use crate::cache::Memoized;
use crate::error::Error;
use crate::model::Record;
use crate::transport::RestConnection;
use crate::transport::RestRequest;

/// Reference to an issue revision, as required by audit actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IssueRef {
    /// Issue id.
    pub id: u64,
    /// Issue revision the audit applies to.
    pub revision: u64,
}

impl IssueRef {
    /// Creates an issue reference.
    pub fn new(id: u64, revision: u64) -> Self {
        Self { id, revision }
    }

    /// Reads `id` and `revision` from an issue record.
    pub fn from_record(record: &Record) -> Option<Self> {
        Some(Self {
            id: record.get_u64("id")?,
            revision: record.get_u64("revision")?,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CustomTagAudit {
    custom_tag_guid: String,
    text_value: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuditValues<'a> {
    issues: &'a [IssueRef],
    custom_tag_audit: Vec<CustomTagAudit>,
}

#[derive(Debug, Serialize)]
struct AuditAction<'a> {
    #[serde(rename = "type")]
    action: &'static str,
    values: AuditValues<'a>,
}

/// Custom tag definitions, cached per server and per application version.
///
/// The server-wide tag list is loaded once and kept. Tags of individual
/// application versions are kept for the most recently used versions.
pub struct CustomTagApi {
    connection: Arc<dyn RestConnection>,
    all_tags: Memoized<Arc<Vec<Record>>>,
    version_tags: LoadingCache<String, Arc<Vec<Record>>>,
}

impl CustomTagApi {
    /// Creates the API on top of an authenticated connection.
    pub fn new(connection: Arc<dyn RestConnection>) -> Self {
        Self {
            connection,
            all_tags: Memoized::new(),
            version_tags: LoadingCache::new(DEFAULT_CACHE_CAPACITY),
        }
    }

    /// All custom tags defined on the server.
    pub async fn custom_tags(&self) -> Result<Arc<Vec<Record>>, Error> {
        self.all_tags
            .get_or_try_load(|| async {
                let tags = CustomTagsQuery::all(self.connection.clone()).get_all().await?;
                debug!("Loaded {} custom tag definitions", tags.len());
                Ok::<_, Error>(Arc::new(tags))
            })
            .await
    }

    /// Custom tags assigned to an application version.
    pub async fn version_custom_tags(&self, version_id: &str) -> Result<Arc<Vec<Record>>, Error> {
        self.version_tags
            .get_or_try_load(version_id.to_string(), || async {
                let tags = CustomTagsQuery::for_version(self.connection.clone(), version_id)
                    .get_all()
                    .await?;
                debug!("Loaded {} custom tags for application version {}", tags.len(), version_id);
                Ok::<_, Error>(Arc::new(tags))
            })
            .await
    }

    /// Names of the custom tags assigned to an application version.
    pub async fn version_custom_tag_names(&self, version_id: &str) -> Result<Vec<String>, Error> {
        Ok(collect_str(&self.version_custom_tags(version_id).await?, "name"))
    }

    /// GUIDs of the custom tags assigned to an application version.
    pub async fn version_custom_tag_guids(&self, version_id: &str) -> Result<Vec<String>, Error> {
        Ok(collect_str(&self.version_custom_tags(version_id).await?, "guid"))
    }

    /// GUID of the custom tag with the given name, compared case-insensitively.
    pub async fn custom_tag_guid(&self, name: &str) -> Result<Option<String>, Error> {
        let name = name.to_lowercase();
        Ok(self
            .custom_tags()
            .await?
            .iter()
            .find(|tag| tag.get_str("name").is_some_and(|n| n.to_lowercase() == name))
            .and_then(|tag| tag.get_str("guid"))
            .map(str::to_string))
    }

    /// Name of the custom tag with the given GUID.
    pub async fn custom_tag_name(&self, guid: &str) -> Result<Option<String>, Error> {
        Ok(self
            .custom_tags()
            .await?
            .iter()
            .find(|tag| tag.get_str("guid") == Some(guid))
            .and_then(|tag| tag.get_str("name"))
            .map(str::to_string))
    }

    /// Sets custom tag values, given as `(tag name, value)`, on the issues.
    ///
    /// All tag names are resolved before anything is sent.
    pub async fn set_custom_tag_values(
        &self,
        version_id: &str,
        values: &[(&str, &str)],
        issues: &[IssueRef],
    ) -> Result<Value, Error> {
        let mut custom_tag_audit = Vec::with_capacity(values.len());
        for (name, value) in values {
            let guid = self
                .custom_tag_guid(name)
                .await?
                .ok_or_else(|| Error::configuration(format!("Unknown custom tag '{}'", name)))?;
            custom_tag_audit.push(CustomTagAudit {
                custom_tag_guid: guid,
                text_value: value.to_string(),
            });
        }

        let action = AuditAction {
            action: "AUDIT_ISSUE",
            values: AuditValues {
                issues,
                custom_tag_audit,
            },
        };
        let body = serde_json::to_value(&action)
            .map_err(|e| Error::configuration(format!("Cannot encode audit action: {}", e)))?;

        let target = self
            .connection
            .base_target()
            .path(APPLICATION_VERSIONS_PATH)
            .segment(version_id)
            .path("issues/action");

        debug!(
            "Auditing {} issue(s) of application version {} with {} custom tag value(s)",
            issues.len(),
            version_id,
            values.len()
        );
        self.connection.execute(RestRequest::post_json(target, body)).await
    }

    /// Sets a single custom tag value on the issues.
    pub async fn set_custom_tag_value(
        &self,
        version_id: &str,
        name: &str,
        value: &str,
        issues: &[IssueRef],
    ) -> Result<Value, Error> {
        self.set_custom_tag_values(version_id, &[(name, value)], issues).await
    }
}

impl std::fmt::Debug for CustomTagApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomTagApi").finish_non_exhaustive()
    }
}

fn collect_str(records: &[Record], field: &str) -> Vec<String> {
    records
        .iter()
        .filter_map(|record| record.get_str(field))
        .map(str::to_string)
        .collect()
}
