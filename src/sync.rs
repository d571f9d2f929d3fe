//! Sync: push exported records to the remote project.
//!
//! Each sync pass is additive and idempotent at the name level: records whose
//! name already exists remotely (case-insensitive) are skipped, the rest are
//! created through the rate-limited batch driver. Nothing is updated or
//! deleted here.

use std::sync::{Arc, Mutex};

use color_eyre::eyre::Result;

use crate::batch::{self, BatchOptions, BatchSummary};
use crate::config::StateMap;
use crate::labels;
use crate::plane::{self, BoxedPlaneClient};
use crate::records::{IssueRecord, LabelRecord, ModuleRecord, SubIssueRecord};

/// Records whose name has no case-insensitive match in `remote_names`,
/// original order preserved.
pub fn missing_by_name<'a, T>(local: &'a [T], remote_names: &[String], name_of: impl Fn(&T) -> &str) -> Vec<&'a T> {
	let remote_lower: Vec<String> = remote_names.iter().map(|n| n.to_lowercase()).collect();
	local.iter().filter(|record| !remote_lower.contains(&name_of(record).to_lowercase())).collect()
}

pub async fn sync_labels(client: BoxedPlaneClient, records: &[LabelRecord], options: BatchOptions, dry_run: bool) -> Result<BatchSummary> {
	// Fail open: if the existing labels can't be fetched, attempt every
	// creation and let the server reject duplicates.
	let existing = match plane::fetch_all_labels(client.as_ref()).await {
		Ok(labels) => Some(labels),
		Err(e) => {
			tracing::warn!("could not fetch existing labels, attempting all creations: {e:#}");
			None
		}
	};

	let to_create: Vec<&LabelRecord> = records.iter().filter(|r| labels::is_name_unique(&r.name, existing.as_deref())).collect();
	tracing::info!(total = records.len(), to_create = to_create.len(), "label sync plan");

	if dry_run {
		for record in &to_create {
			tracing::info!(name = %record.name, "[dry-run] would create label");
		}
		return Ok(BatchSummary::default());
	}

	let payloads: Vec<_> = to_create.into_iter().map(|r| r.payload.clone()).collect();
	let summary = batch::process_batches(payloads, options, |payload, _| {
		let client = Arc::clone(&client);
		async move {
			let created = client.create_label(&payload).await?;
			tracing::info!(name = %created.name, id = %created.id, "created label");
			Ok(())
		}
	})
	.await;

	Ok(summary)
}

pub async fn sync_modules(client: BoxedPlaneClient, records: &[ModuleRecord], options: BatchOptions, dry_run: bool) -> Result<BatchSummary> {
	let existing = plane::fetch_all_modules(client.as_ref()).await?;
	let remote_names: Vec<String> = existing.into_iter().map(|m| m.name).collect();

	let to_create = missing_by_name(records, &remote_names, |r| &r.payload.name);
	tracing::info!(total = records.len(), to_create = to_create.len(), "module sync plan");

	if dry_run {
		for record in &to_create {
			tracing::info!(name = %record.payload.name, "[dry-run] would create module");
		}
		return Ok(BatchSummary::default());
	}

	let payloads: Vec<_> = to_create.into_iter().map(|r| r.payload.clone()).collect();
	let summary = batch::process_batches(payloads, options, |payload, _| {
		let client = Arc::clone(&client);
		async move {
			let created = client.create_module(&payload).await?;
			tracing::info!(name = %created.name, id = %created.id, "created module");
			Ok(())
		}
	})
	.await;

	Ok(summary)
}

pub async fn sync_issues(client: BoxedPlaneClient, records: &[IssueRecord], states: &StateMap, options: BatchOptions, dry_run: bool) -> Result<BatchSummary> {
	let existing = plane::fetch_all_issues(client.as_ref()).await?;
	let remote_names: Vec<String> = existing.into_iter().map(|i| i.name).collect();

	let to_create = missing_by_name(records, &remote_names, |r| r.name.as_str());
	tracing::info!(total = records.len(), to_create = to_create.len(), "issue sync plan");

	if dry_run {
		for record in &to_create {
			tracing::info!(name = %record.name, module = %record.module_name, "[dry-run] would create issue");
		}
		return Ok(BatchSummary::default());
	}

	// (module name, created issue id), filled concurrently by the batch driver.
	let memberships: Arc<Mutex<Vec<(String, String)>>> = Arc::new(Mutex::new(Vec::new()));

	let items: Vec<(String, crate::records::IssuePayload)> = to_create
		.into_iter()
		.map(|r| {
			let mut payload = r.payload.clone();
			payload.state = Some(states.for_completion(r.is_completed).to_string());
			(r.module_name.clone(), payload)
		})
		.collect();

	let summary = batch::process_batches(items, options, |(module_name, payload), _| {
		let client = Arc::clone(&client);
		let memberships = Arc::clone(&memberships);
		async move {
			let created = client.create_issue(&payload).await?;
			tracing::info!(name = %created.name, id = %created.id, "created issue");
			memberships.lock().unwrap().push((module_name, created.id));
			Ok(())
		}
	})
	.await;

	let memberships = std::mem::take(&mut *memberships.lock().unwrap());
	attach_to_modules(client, memberships).await?;

	Ok(summary)
}

/// Group freshly created issues by module name and attach each group to its
/// remote module. A module name with no remote counterpart is logged and
/// skipped; the issues themselves already exist.
async fn attach_to_modules(client: BoxedPlaneClient, memberships: Vec<(String, String)>) -> Result<()> {
	if memberships.is_empty() {
		return Ok(());
	}

	let modules = plane::fetch_all_modules(client.as_ref()).await?;

	let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
	for (module_name, issue_id) in memberships {
		match grouped.iter_mut().find(|(name, _)| name.eq_ignore_ascii_case(&module_name)) {
			Some((_, ids)) => ids.push(issue_id),
			None => grouped.push((module_name, vec![issue_id])),
		}
	}

	for (module_name, issue_ids) in grouped {
		let Some(module) = modules.iter().find(|m| m.name.eq_ignore_ascii_case(&module_name)) else {
			tracing::warn!(module = %module_name, issues = issue_ids.len(), "module not found remotely, leaving issues unattached");
			continue;
		};
		client.add_issues_to_module(&module.id, &issue_ids).await?;
		tracing::info!(module = %module.name, issues = issue_ids.len(), "attached issues to module");
	}

	Ok(())
}

pub async fn sync_sub_issues(client: BoxedPlaneClient, records: &[SubIssueRecord], states: &StateMap, options: BatchOptions, dry_run: bool) -> Result<BatchSummary> {
	let existing = plane::fetch_all_issues(client.as_ref()).await?;
	let remote_names: Vec<String> = existing.iter().map(|i| i.name.clone()).collect();

	let to_create = missing_by_name(records, &remote_names, |r| r.name.as_str());
	tracing::info!(total = records.len(), to_create = to_create.len(), "sub-issue sync plan");

	// Parents are resolved by name against the same snapshot; a sub-issue
	// whose parent has not been synced yet is skipped, not orphaned.
	let mut items: Vec<crate::records::IssuePayload> = Vec::new();
	let mut skipped = 0usize;
	for record in to_create {
		let Some(parent) = existing.iter().find(|i| i.name.eq_ignore_ascii_case(&record.parent_issue_name)) else {
			skipped += 1;
			tracing::warn!(name = %record.name, parent = %record.parent_issue_name, "parent issue not found remotely, skipping sub-issue");
			continue;
		};
		let mut payload = record.payload.clone();
		payload.parent = Some(parent.id.clone());
		payload.state = Some(states.for_completion(record.is_completed).to_string());
		items.push(payload);
	}
	if skipped > 0 {
		tracing::warn!(skipped, "sub-issues skipped for missing parents; sync issues first, then re-run");
	}

	if dry_run {
		for payload in &items {
			tracing::info!(name = %payload.name, parent = ?payload.parent, "[dry-run] would create sub-issue");
		}
		return Ok(BatchSummary::default());
	}

	let summary = batch::process_batches(items, options, |payload, _| {
		let client = Arc::clone(&client);
		async move {
			let created = client.create_issue(&payload).await?;
			tracing::info!(name = %created.name, id = %created.id, "created sub-issue");
			Ok(())
		}
	})
	.await;

	Ok(summary)
}
