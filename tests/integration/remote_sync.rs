//! Sync behavior against an in-memory mock of the remote API.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use color_eyre::eyre::Result;
use plane_sync::Priority;
use plane_sync::batch::BatchOptions;
use plane_sync::config::StateMap;
use plane_sync::plane::{Cursor, Page, PlaneClient, PlaneIssue, PlaneLabel, PlaneModule};
use plane_sync::records::{IssuePayload, IssueRecord, LabelPayload, LabelRecord, ModulePayload, ModuleRecord, SubIssueRecord};
use plane_sync::sync;
use serde_json::Value;

#[derive(Default)]
struct RemoteState {
	labels: Vec<PlaneLabel>,
	issues: Vec<PlaneIssue>,
	modules: Vec<PlaneModule>,
	module_memberships: Vec<(String, Vec<String>)>,
	created_parents: Vec<Option<String>>,
	next_id: usize,
}

impl RemoteState {
	fn fresh_id(&mut self, prefix: &str) -> String {
		self.next_id += 1;
		format!("{prefix}-{}", self.next_id)
	}
}

#[derive(Clone, Default)]
struct MockPlaneClient {
	state: Arc<Mutex<RemoteState>>,
}

fn single_page<T>(results: Vec<T>) -> Page<T> {
	Page {
		next_cursor: None,
		prev_cursor: None,
		next_page_results: false,
		prev_page_results: false,
		count: results.len() as u64,
		total_pages: 1,
		total_results: results.len() as u64,
		results,
	}
}

#[async_trait]
impl PlaneClient for MockPlaneClient {
	async fn create_issue(&self, payload: &IssuePayload) -> Result<PlaneIssue> {
		let mut state = self.state.lock().unwrap();
		let issue = PlaneIssue {
			id: state.fresh_id("issue"),
			name: payload.name.clone(),
			priority: Some(payload.priority.as_str().to_string()),
			state: payload.state.clone(),
			labels: payload.labels.clone(),
		};
		state.created_parents.push(payload.parent.clone());
		state.issues.push(issue.clone());
		Ok(issue)
	}

	async fn list_issues(&self, _cursor: Cursor) -> Result<Page<PlaneIssue>> {
		Ok(single_page(self.state.lock().unwrap().issues.clone()))
	}

	async fn update_issue(&self, _issue_id: &str, _payload: &Value) -> Result<()> {
		Ok(())
	}

	async fn delete_issue(&self, issue_id: &str) -> Result<()> {
		self.state.lock().unwrap().issues.retain(|i| i.id != issue_id);
		Ok(())
	}

	async fn create_label(&self, payload: &LabelPayload) -> Result<PlaneLabel> {
		let mut state = self.state.lock().unwrap();
		let label = PlaneLabel {
			id: state.fresh_id("label"),
			name: payload.name.clone(),
			color: Some(payload.color.clone()),
		};
		state.labels.push(label.clone());
		Ok(label)
	}

	async fn list_labels(&self, _cursor: Cursor) -> Result<Page<PlaneLabel>> {
		Ok(single_page(self.state.lock().unwrap().labels.clone()))
	}

	async fn update_label(&self, _label_id: &str, _payload: &Value) -> Result<()> {
		Ok(())
	}

	async fn delete_label(&self, label_id: &str) -> Result<()> {
		self.state.lock().unwrap().labels.retain(|l| l.id != label_id);
		Ok(())
	}

	async fn create_module(&self, payload: &ModulePayload) -> Result<PlaneModule> {
		let mut state = self.state.lock().unwrap();
		let module = PlaneModule {
			id: state.fresh_id("module"),
			name: payload.name.clone(),
			status: Some(payload.status.clone()),
			sort_order: Some(payload.sort_order as f64),
		};
		state.modules.push(module.clone());
		Ok(module)
	}

	async fn list_modules(&self, _cursor: Cursor) -> Result<Page<PlaneModule>> {
		Ok(single_page(self.state.lock().unwrap().modules.clone()))
	}

	async fn update_module(&self, _module_id: &str, _payload: &Value) -> Result<()> {
		Ok(())
	}

	async fn delete_module(&self, module_id: &str) -> Result<()> {
		self.state.lock().unwrap().modules.retain(|m| m.id != module_id);
		Ok(())
	}

	async fn add_issues_to_module(&self, module_id: &str, issue_ids: &[String]) -> Result<()> {
		self.state.lock().unwrap().module_memberships.push((module_id.to_string(), issue_ids.to_vec()));
		Ok(())
	}
}

fn fast_options() -> BatchOptions {
	BatchOptions {
		batch_size: 10,
		sleep: Duration::from_millis(1),
	}
}

fn states() -> StateMap {
	StateMap {
		backlog: "s-backlog".to_string(),
		todo: "s-todo".to_string(),
		in_progress: "s-progress".to_string(),
		done: "s-done".to_string(),
		cancelled: "s-cancelled".to_string(),
	}
}

fn label_record(name: &str) -> LabelRecord {
	LabelRecord {
		name: name.to_string(),
		raw_text: format!("[{name}]"),
		payload: LabelPayload {
			name: name.to_string(),
			color: "#3b82f6".to_string(),
			description: String::new(),
		},
	}
}

fn issue_payload(name: &str) -> IssuePayload {
	IssuePayload {
		name: name.to_string(),
		priority: Priority::None,
		labels: Vec::new(),
		parent: None,
		state: None,
		description_html: "<p></p>".to_string(),
		description_stripped: String::new(),
		assignees: Vec::new(),
		start_date: None,
		target_date: None,
	}
}

fn issue_record(name: &str, module_name: &str, is_completed: bool) -> IssueRecord {
	IssueRecord {
		kind: "issue".to_string(),
		module_name: module_name.to_string(),
		name: name.to_string(),
		raw_text: format!("[ ] {name}"),
		link_sub_issue: None,
		is_completed,
		payload: issue_payload(name),
	}
}

fn sub_issue_record(name: &str, parent: &str) -> SubIssueRecord {
	SubIssueRecord {
		kind: "sub_issue".to_string(),
		module_name: "Phase 1: Setup".to_string(),
		parent_issue_name: parent.to_string(),
		name: name.to_string(),
		raw_text: format!("[ ] {name}"),
		is_completed: false,
		payload: issue_payload(name),
	}
}

fn module_record(name: &str, sort_order: i64) -> ModuleRecord {
	ModuleRecord {
		raw_text: name.to_string(),
		clean_text: name.to_string(),
		label: label_record("DEFAULT"),
		payload: ModulePayload {
			name: name.to_string(),
			status: "planned".to_string(),
			sort_order,
			description: String::new(),
			start_date: None,
			target_date: None,
		},
	}
}

#[tokio::test]
async fn test_sync_labels_skips_existing_case_insensitively() {
	let mock = MockPlaneClient::default();
	mock.state.lock().unwrap().labels.push(PlaneLabel {
		id: "pre-1".to_string(),
		name: "be-core".to_string(),
		color: None,
	});
	let client: Arc<dyn PlaneClient> = Arc::new(mock.clone());

	let records = vec![label_record("BE-CORE"), label_record("FE-UI")];
	let summary = sync::sync_labels(client, &records, fast_options(), false).await.unwrap();

	assert_eq!(summary.successful, 1);
	assert_eq!(summary.failed, 0);
	let state = mock.state.lock().unwrap();
	assert_eq!(state.labels.len(), 2);
	assert!(state.labels.iter().any(|l| l.name == "FE-UI"));
}

#[tokio::test]
async fn test_sync_labels_dry_run_creates_nothing() {
	let mock = MockPlaneClient::default();
	let client: Arc<dyn PlaneClient> = Arc::new(mock.clone());

	let records = vec![label_record("BE-CORE")];
	let summary = sync::sync_labels(client, &records, fast_options(), true).await.unwrap();

	assert_eq!(summary.successful, 0);
	assert!(mock.state.lock().unwrap().labels.is_empty());
}

#[tokio::test]
async fn test_sync_modules_creates_missing_only() {
	let mock = MockPlaneClient::default();
	mock.state.lock().unwrap().modules.push(PlaneModule {
		id: "pre-m".to_string(),
		name: "Phase 1: Setup".to_string(),
		status: None,
		sort_order: None,
	});
	let client: Arc<dyn PlaneClient> = Arc::new(mock.clone());

	let records = vec![module_record("Phase 1: Setup", 0), module_record("Phase 2: Frontend", 1)];
	let summary = sync::sync_modules(client, &records, fast_options(), false).await.unwrap();

	assert_eq!(summary.successful, 1);
	let state = mock.state.lock().unwrap();
	assert_eq!(state.modules.len(), 2);
	assert!(state.modules.iter().any(|m| m.name == "Phase 2: Frontend"));
}

#[tokio::test]
async fn test_sync_issues_sets_state_and_attaches_to_modules() {
	let mock = MockPlaneClient::default();
	mock.state.lock().unwrap().modules.push(PlaneModule {
		id: "mod-1".to_string(),
		name: "Phase 1: Setup".to_string(),
		status: None,
		sort_order: None,
	});
	let client: Arc<dyn PlaneClient> = Arc::new(mock.clone());

	let records = vec![
		issue_record("Configure DB", "Phase 1: Setup", false),
		issue_record("Write docs", "Phase 1: Setup", true),
		issue_record("Orphan task", "Phase 99: Nowhere", false),
	];
	let summary = sync::sync_issues(client, &records, &states(), fast_options(), false).await.unwrap();

	assert_eq!(summary.successful, 3);
	let state = mock.state.lock().unwrap();

	let configure = state.issues.iter().find(|i| i.name == "Configure DB").unwrap();
	assert_eq!(configure.state.as_deref(), Some("s-todo"));
	let docs = state.issues.iter().find(|i| i.name == "Write docs").unwrap();
	assert_eq!(docs.state.as_deref(), Some("s-done"));

	// Both Phase 1 issues attached to the one known module, the orphan to none.
	assert_eq!(state.module_memberships.len(), 1);
	let (module_id, issue_ids) = &state.module_memberships[0];
	assert_eq!(module_id, "mod-1");
	assert_eq!(issue_ids.len(), 2);
}

#[tokio::test]
async fn test_sync_issues_skips_names_already_remote() {
	let mock = MockPlaneClient::default();
	mock.state.lock().unwrap().issues.push(PlaneIssue {
		id: "pre-i".to_string(),
		name: "configure db".to_string(),
		priority: None,
		state: None,
		labels: Vec::new(),
	});
	let client: Arc<dyn PlaneClient> = Arc::new(mock.clone());

	let records = vec![issue_record("Configure DB", "Phase 1: Setup", false)];
	let summary = sync::sync_issues(client, &records, &states(), fast_options(), false).await.unwrap();

	assert_eq!(summary.successful, 0);
	assert_eq!(mock.state.lock().unwrap().issues.len(), 1);
}

#[tokio::test]
async fn test_sync_sub_issues_resolves_parent_or_skips() {
	let mock = MockPlaneClient::default();
	mock.state.lock().unwrap().issues.push(PlaneIssue {
		id: "parent-1".to_string(),
		name: "[BE-CORE]: Gateway work".to_string(),
		priority: None,
		state: None,
		labels: Vec::new(),
	});
	let client: Arc<dyn PlaneClient> = Arc::new(mock.clone());

	let records = vec![
		sub_issue_record("Route registration", "[be-core]: gateway work"),
		sub_issue_record("Lost child", "Never synced parent"),
	];
	let summary = sync::sync_sub_issues(client, &records, &states(), fast_options(), false).await.unwrap();

	assert_eq!(summary.successful, 1);
	let state = mock.state.lock().unwrap();
	assert_eq!(state.issues.len(), 2);
	assert_eq!(state.created_parents, [Some("parent-1".to_string())]);
}
