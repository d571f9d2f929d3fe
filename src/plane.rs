//! Plane API client.
//!
//! All operations go through the `PlaneClient` trait so the sync layer can be
//! exercised against a mock. The real client authenticates with the
//! `X-API-Key` header and scopes every call to one workspace and project.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use color_eyre::Report;
use color_eyre::eyre::{Result, bail, eyre};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::PlaneSettings;
use crate::records::{IssuePayload, LabelPayload, ModulePayload};

#[derive(Clone, Debug, Deserialize)]
pub struct PlaneLabel {
	pub id: String,
	pub name: String,
	#[serde(default)]
	pub color: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PlaneIssue {
	pub id: String,
	pub name: String,
	#[serde(default)]
	pub priority: Option<String>,
	#[serde(default)]
	pub state: Option<String>,
	#[serde(default)]
	pub labels: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PlaneModule {
	pub id: String,
	pub name: String,
	#[serde(default)]
	pub status: Option<String>,
	#[serde(default)]
	pub sort_order: Option<f64>,
}

/// Pagination cursor in Plane's `limit:offset:is_prev` wire format.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cursor {
	pub limit: u32,
	pub offset: u32,
	pub is_prev: bool,
}

impl Default for Cursor {
	fn default() -> Self {
		Self {
			limit: 100,
			offset: 0,
			is_prev: false,
		}
	}
}

impl std::fmt::Display for Cursor {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}:{}:{}", self.limit, self.offset, if self.is_prev { 1 } else { 0 })
	}
}

impl FromStr for Cursor {
	type Err = Report;

	fn from_str(s: &str) -> Result<Self> {
		let parts: Vec<&str> = s.split(':').collect();
		if parts.len() != 3 {
			bail!("invalid cursor {s:?}, expected limit:offset:is_prev");
		}
		Ok(Self {
			limit: parts[0].parse().map_err(|_| eyre!("invalid cursor limit in {s:?}"))?,
			offset: parts[1].parse().map_err(|_| eyre!("invalid cursor offset in {s:?}"))?,
			is_prev: parts[2] == "1",
		})
	}
}

#[derive(Debug, Deserialize)]
pub struct Page<T> {
	#[serde(default)]
	pub next_cursor: Option<String>,
	#[serde(default)]
	pub prev_cursor: Option<String>,
	#[serde(default)]
	pub next_page_results: bool,
	#[serde(default)]
	pub prev_page_results: bool,
	#[serde(default)]
	pub count: u64,
	#[serde(default)]
	pub total_pages: u64,
	#[serde(default)]
	pub total_results: u64,
	pub results: Vec<T>,
}

#[async_trait]
pub trait PlaneClient: Send + Sync {
	async fn create_issue(&self, payload: &IssuePayload) -> Result<PlaneIssue>;
	async fn list_issues(&self, cursor: Cursor) -> Result<Page<PlaneIssue>>;
	async fn update_issue(&self, issue_id: &str, payload: &Value) -> Result<()>;
	async fn delete_issue(&self, issue_id: &str) -> Result<()>;

	async fn create_label(&self, payload: &LabelPayload) -> Result<PlaneLabel>;
	async fn list_labels(&self, cursor: Cursor) -> Result<Page<PlaneLabel>>;
	async fn update_label(&self, label_id: &str, payload: &Value) -> Result<()>;
	async fn delete_label(&self, label_id: &str) -> Result<()>;

	async fn create_module(&self, payload: &ModulePayload) -> Result<PlaneModule>;
	async fn list_modules(&self, cursor: Cursor) -> Result<Page<PlaneModule>>;
	async fn update_module(&self, module_id: &str, payload: &Value) -> Result<()>;
	async fn delete_module(&self, module_id: &str) -> Result<()>;

	/// Attach already-created issues to a module.
	async fn add_issues_to_module(&self, module_id: &str, issue_ids: &[String]) -> Result<()>;
}

pub struct RealPlaneClient {
	http_client: Client,
	base_url: String,
	workspace_slug: String,
	project_id: String,
	api_key: String,
}

impl RealPlaneClient {
	pub fn new(settings: &PlaneSettings) -> Result<Self> {
		Ok(Self {
			http_client: Client::builder().timeout(Duration::from_secs(10)).build()?,
			base_url: settings.base_url.trim_end_matches('/').to_string(),
			workspace_slug: settings.workspace_slug.clone(),
			project_id: settings.project_id.clone(),
			api_key: settings.api_key()?,
		})
	}

	fn project_url(&self, resource: &str) -> String {
		format!("{}/api/v1/workspaces/{}/projects/{}/{resource}/", self.base_url, self.workspace_slug, self.project_id)
	}

	async fn create<P: Serialize + ?Sized, T: for<'de> Deserialize<'de>>(&self, resource: &str, payload: &P) -> Result<T> {
		let res = self.http_client.post(self.project_url(resource)).header("X-API-Key", &self.api_key).json(payload).send().await?;

		if !res.status().is_success() {
			let status = res.status();
			let body = res.text().await.unwrap_or_default();
			bail!("Failed to create {resource}: {status} - {body}");
		}

		Ok(res.json().await?)
	}

	async fn list<T: for<'de> Deserialize<'de>>(&self, resource: &str, cursor: Cursor) -> Result<Page<T>> {
		let res = self
			.http_client
			.get(self.project_url(resource))
			.header("X-API-Key", &self.api_key)
			.query(&[("cursor", cursor.to_string()), ("per_page", cursor.limit.to_string())])
			.send()
			.await?;

		if !res.status().is_success() {
			let status = res.status();
			let body = res.text().await.unwrap_or_default();
			bail!("Failed to list {resource}: {status} - {body}");
		}

		Ok(res.json().await?)
	}

	async fn update(&self, resource: &str, id: &str, payload: &Value) -> Result<()> {
		let url = format!("{}{id}/", self.project_url(resource));
		let res = self.http_client.patch(&url).header("X-API-Key", &self.api_key).json(payload).send().await?;

		if !res.status().is_success() {
			let status = res.status();
			let body = res.text().await.unwrap_or_default();
			bail!("Failed to update {resource} {id}: {status} - {body}");
		}

		Ok(())
	}

	async fn delete(&self, resource: &str, id: &str) -> Result<()> {
		let url = format!("{}{id}/", self.project_url(resource));
		let res = self.http_client.delete(&url).header("X-API-Key", &self.api_key).send().await?;

		if !res.status().is_success() {
			let status = res.status();
			let body = res.text().await.unwrap_or_default();
			bail!("Failed to delete {resource} {id}: {status} - {body}");
		}

		Ok(())
	}
}

#[async_trait]
impl PlaneClient for RealPlaneClient {
	async fn create_issue(&self, payload: &IssuePayload) -> Result<PlaneIssue> {
		self.create("issues", payload).await
	}

	async fn list_issues(&self, cursor: Cursor) -> Result<Page<PlaneIssue>> {
		self.list("issues", cursor).await
	}

	async fn update_issue(&self, issue_id: &str, payload: &Value) -> Result<()> {
		self.update("issues", issue_id, payload).await
	}

	async fn delete_issue(&self, issue_id: &str) -> Result<()> {
		self.delete("issues", issue_id).await
	}

	async fn create_label(&self, payload: &LabelPayload) -> Result<PlaneLabel> {
		self.create("labels", payload).await
	}

	async fn list_labels(&self, cursor: Cursor) -> Result<Page<PlaneLabel>> {
		self.list("labels", cursor).await
	}

	async fn update_label(&self, label_id: &str, payload: &Value) -> Result<()> {
		self.update("labels", label_id, payload).await
	}

	async fn delete_label(&self, label_id: &str) -> Result<()> {
		self.delete("labels", label_id).await
	}

	async fn create_module(&self, payload: &ModulePayload) -> Result<PlaneModule> {
		self.create("modules", payload).await
	}

	async fn list_modules(&self, cursor: Cursor) -> Result<Page<PlaneModule>> {
		self.list("modules", cursor).await
	}

	async fn update_module(&self, module_id: &str, payload: &Value) -> Result<()> {
		self.update("modules", module_id, payload).await
	}

	async fn delete_module(&self, module_id: &str) -> Result<()> {
		self.delete("modules", module_id).await
	}

	async fn add_issues_to_module(&self, module_id: &str, issue_ids: &[String]) -> Result<()> {
		let url = format!("{}{module_id}/module-issues/", self.project_url("modules"));
		let res = self
			.http_client
			.post(&url)
			.header("X-API-Key", &self.api_key)
			.json(&serde_json::json!({ "issues": issue_ids }))
			.send()
			.await?;

		if !res.status().is_success() {
			let status = res.status();
			let body = res.text().await.unwrap_or_default();
			bail!("Failed to add issues to module {module_id}: {status} - {body}");
		}

		Ok(())
	}
}

pub type BoxedPlaneClient = Arc<dyn PlaneClient>;

pub fn create_client(settings: &PlaneSettings) -> Result<BoxedPlaneClient> {
	Ok(Arc::new(RealPlaneClient::new(settings)?))
}

/// Drain a paginated listing into one vec.
async fn fetch_all<T, F, Fut>(list_page: F) -> Result<Vec<T>>
where
	F: Fn(Cursor) -> Fut,
	Fut: Future<Output = Result<Page<T>>>,
{
	let mut all = Vec::new();
	let mut cursor = Cursor::default();
	loop {
		let page = list_page(cursor).await?;
		all.extend(page.results);
		if !page.next_page_results {
			break;
		}
		cursor = match page.next_cursor.as_deref() {
			Some(next) => next.parse()?,
			None => break,
		};
	}
	Ok(all)
}

pub async fn fetch_all_issues(client: &dyn PlaneClient) -> Result<Vec<PlaneIssue>> {
	fetch_all(|cursor| client.list_issues(cursor)).await
}

pub async fn fetch_all_labels(client: &dyn PlaneClient) -> Result<Vec<PlaneLabel>> {
	fetch_all(|cursor| client.list_labels(cursor)).await
}

pub async fn fetch_all_modules(client: &dyn PlaneClient) -> Result<Vec<PlaneModule>> {
	fetch_all(|cursor| client.list_modules(cursor)).await
}
