//! IAM policy retrieval and instance role discovery.

use async_trait::async_trait;
use aws_sdk_iam::Client;
use cs_collector::aws::classify_sdk_error;
use cs_collector::paginate;
use cs_error::SourceError;
use cs_traits::{PageSource, PolicyDocument, PolicySource, SourceResult};
use cs_types::{Page, PageCursor};
use futures::TryStreamExt;
use tracing::debug;

/// Instance metadata path describing the attached instance profile.
const INSTANCE_INFO_PATH: &str = "/latest/meta-data/iam/info";

/// Policies attached to or embedded in IAM roles.
#[derive(Clone)]
pub struct IamPolicySource {
    client: Client,
}

impl IamPolicySource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn managed_document(&self, arn: &str) -> SourceResult<PolicyDocument> {
        let policy = self
            .client
            .get_policy()
            .policy_arn(arn)
            .send()
            .await
            .map_err(|e| classify_sdk_error("GetPolicy", e))?;

        let version_id = policy
            .policy()
            .and_then(|p| p.default_version_id())
            .ok_or_else(|| SourceError::MalformedResponse(format!("policy {arn} has no default version")))?;

        let version = self
            .client
            .get_policy_version()
            .policy_arn(arn)
            .version_id(version_id)
            .send()
            .await
            .map_err(|e| classify_sdk_error("GetPolicyVersion", e))?;

        let document = version
            .policy_version()
            .and_then(|v| v.document())
            .ok_or_else(|| SourceError::MalformedResponse(format!("policy {arn} version {version_id} has no document")))?;

        Ok(PolicyDocument::new(policy_name_from_arn(arn), decode_document(document)?))
    }
}

#[async_trait]
impl PolicySource for IamPolicySource {
    async fn managed_policies(&self, role: &str) -> SourceResult<Vec<PolicyDocument>> {
        let listing = AttachedPolicies {
            client: self.client.clone(),
            role: role.to_string(),
        };
        let arns: Vec<String> = paginate(&listing, None).try_collect().await?;
        debug!(role, policies = arns.len(), "Listed attached policies");

        let mut documents = Vec::with_capacity(arns.len());
        for arn in &arns {
            documents.push(self.managed_document(arn).await?);
        }
        Ok(documents)
    }

    async fn inline_policies(&self, role: &str) -> SourceResult<Vec<PolicyDocument>> {
        let listing = InlinePolicyNames {
            client: self.client.clone(),
            role: role.to_string(),
        };
        let names: Vec<String> = paginate(&listing, None).try_collect().await?;
        debug!(role, policies = names.len(), "Listed inline policies");

        let mut documents = Vec::with_capacity(names.len());
        for name in names {
            let output = self
                .client
                .get_role_policy()
                .role_name(role)
                .policy_name(&name)
                .send()
                .await
                .map_err(|e| classify_sdk_error("GetRolePolicy", e))?;

            documents.push(PolicyDocument::new(name, decode_document(output.policy_document())?));
        }
        Ok(documents)
    }
}

/// ARNs of the managed policies attached to a role, paged by marker.
struct AttachedPolicies {
    client: Client,
    role: String,
}

#[async_trait]
impl PageSource for AttachedPolicies {
    type Item = String;

    async fn fetch(&self, cursor: Option<&PageCursor>) -> SourceResult<Page<String>> {
        let output = self
            .client
            .list_attached_role_policies()
            .role_name(&self.role)
            .set_marker(cursor.map(|c| c.as_str().to_string()))
            .send()
            .await
            .map_err(|e| classify_sdk_error("ListAttachedRolePolicies", e))?;

        let items = output
            .attached_policies()
            .iter()
            .filter_map(|p| p.policy_arn().map(str::to_string))
            .collect();

        Ok(Page {
            items,
            next: output.marker().map(PageCursor::new),
        })
    }

    fn describe(&self) -> String {
        format!("attached policies of {}", self.role)
    }
}

/// Names of the inline policies of a role, paged by marker.
struct InlinePolicyNames {
    client: Client,
    role: String,
}

#[async_trait]
impl PageSource for InlinePolicyNames {
    type Item = String;

    async fn fetch(&self, cursor: Option<&PageCursor>) -> SourceResult<Page<String>> {
        let output = self
            .client
            .list_role_policies()
            .role_name(&self.role)
            .set_marker(cursor.map(|c| c.as_str().to_string()))
            .send()
            .await
            .map_err(|e| classify_sdk_error("ListRolePolicies", e))?;

        Ok(Page {
            items: output.policy_names().to_vec(),
            next: output.marker().map(PageCursor::new),
        })
    }

    fn describe(&self) -> String {
        format!("inline policies of {}", self.role)
    }
}

/// Managed policy name: the last `/` segment of its ARN.
pub fn policy_name_from_arn(arn: &str) -> &str {
    arn.rsplit('/').next().unwrap_or(arn)
}

/// Undo the URL encoding IAM applies to policy documents.
pub fn decode_document(raw: &str) -> SourceResult<String> {
    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| SourceError::MalformedResponse(format!("policy document is not valid UTF-8: {e}")))
}

/// Role name from the instance metadata `iam/info` document.
///
/// The name is the second `/` segment of `InstanceProfileArn`.
pub fn role_from_instance_info(info: &str) -> SourceResult<String> {
    let value: serde_json::Value = serde_json::from_str(info)
        .map_err(|e| SourceError::MalformedResponse(format!("instance info is not JSON: {e}")))?;

    value
        .get("InstanceProfileArn")
        .and_then(|arn| arn.as_str())
        .and_then(|arn| arn.split('/').nth(1))
        .filter(|role| !role.is_empty())
        .map(str::to_string)
        .ok_or_else(|| SourceError::MalformedResponse("instance info has no usable InstanceProfileArn".to_string()))
}

/// Resolve the role of the instance this process runs on.
pub async fn instance_role() -> SourceResult<String> {
    let client = aws_config::imds::Client::builder().build();
    let info = client
        .get(INSTANCE_INFO_PATH)
        .await
        .map_err(|e| SourceError::Transient(format!("instance metadata unavailable: {e}")))?;

    let role = role_from_instance_info(info.as_ref())?;
    debug!(role = %role, "Resolved instance role");
    Ok(role)
}
