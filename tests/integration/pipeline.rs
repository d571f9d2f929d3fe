//! End-to-end extraction: checklist files on disk through modules, labels,
//! issues and sub-issues, into export records and back.

use std::fs;

use plane_sync::config::ExportDefaults;
use plane_sync::modules::ModuleDepths;
use plane_sync::records::{self, IssueExport, SubIssueExport};
use plane_sync::{Priority, issues, labels, modules, reader, sub_issues};

const CHECKLIST: &str = "\
# Backend rollout

## Phase 1: [BE-CORE] Setup

- [ ] [high] Configure DB
- [x] Write docs
- [ ] [urgent] Gateway work [Details](Phase1/api-gateway.md)
- [ ] **Automated testing:**

## Phase 2: [FE-UI] Frontend

- [ ] Build UI
- plain bullet without a checkbox
";

const SUB_FILE: &str = "\
# Gateway breakdown

- [ ] [medium] Route registration
- [x] Health endpoint
";

#[test]
fn test_full_pipeline_from_files() {
	let dir = tempfile::tempdir().unwrap();
	let checklist_path = dir.path().join("checklist.md");
	fs::write(&checklist_path, CHECKLIST).unwrap();
	fs::create_dir(dir.path().join("Phase1")).unwrap();
	fs::write(dir.path().join("Phase1/api-gateway.md"), SUB_FILE).unwrap();

	let tree = reader::parse_markdown_file(&checklist_path).unwrap();

	// Modules: both phases, gap-free positions, labels from heading tags.
	let mods = modules::extract_modules(&tree, 0, ModuleDepths::Top);
	assert_eq!(mods.len(), 2);
	assert_eq!(mods[0].clean_name, "Phase 1: Setup");
	assert_eq!(mods[0].label.name, "BE-CORE");
	assert_eq!(mods[1].sort_position, 1);

	// Labels: deduplicated union across headings and items.
	let tags = labels::extract_labels(&tree);
	let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
	assert_eq!(names, ["BE-CORE", "FE-UI"]);

	// Issues, per module section.
	let mut all_issues = Vec::new();
	for module in &mods {
		all_issues.extend(issues::extract_issues_in_section(&tree, |text| text == module.raw_heading_text, ModuleDepths::Top, &[]));
	}
	assert_eq!(all_issues.len(), 4); // section-header item and plain bullet excluded
	assert_eq!(all_issues[0].name, "[BE-CORE]: Configure DB");
	assert_eq!(all_issues[0].priority, Priority::High);
	assert!(all_issues[1].is_completed);
	assert_eq!(all_issues[2].trailing_link.as_deref(), Some("Phase1/api-gateway.md"));
	assert_eq!(all_issues[3].name, "[FE-UI]: Build UI");
	assert_eq!(all_issues[3].module_name, "Phase 2: Frontend");

	// Sub-issues: resolved through the trailing link, relative to the checklist.
	let parent = &all_issues[2];
	let sub_path = checklist_path.parent().unwrap().join(parent.trailing_link.as_deref().unwrap());
	let subs = sub_issues::extract_sub_issues_from_file(&sub_path, &parent.name, &parent.module_name).unwrap();
	assert_eq!(subs.len(), 2);
	assert_eq!(subs[0].name, "Route registration");
	assert_eq!(subs[0].priority, Priority::Medium);
	assert_eq!(subs[0].parent_issue_name, "[BE-CORE]: Gateway work");
	assert!(subs.iter().all(|s| s.labels.is_empty()));

	// Records survive a write/load round trip.
	let defaults = ExportDefaults::default();
	let issue_export = IssueExport {
		issues: all_issues.iter().map(records::issue_record).collect(),
	};
	let sub_export = SubIssueExport {
		issues: subs.iter().map(records::sub_issue_record).collect(),
	};
	let out = dir.path().join("export");
	records::write_json(&out.join("issues.json"), &issue_export).unwrap();
	records::write_json(&out.join("sub-issues.json"), &sub_export).unwrap();

	let loaded: IssueExport = records::load_json(&out.join("issues.json")).unwrap();
	assert_eq!(loaded.issues.len(), 4);
	assert_eq!(loaded.issues[2].link_sub_issue.as_deref(), Some("Phase1/api-gateway.md"));
	assert_eq!(loaded.issues[2].payload.priority, Priority::Urgent);

	let loaded_subs: SubIssueExport = records::load_json(&out.join("sub-issues.json")).unwrap();
	assert_eq!(loaded_subs.issues[0].kind, "sub_issue");
	assert_eq!(loaded_subs.issues[0].module_name, "Phase 1: Setup");

	// Module records carry the export defaults.
	let module_record = records::module_record(&mods[0], &defaults);
	assert_eq!(module_record.payload.status, "planned");
	assert_eq!(module_record.label.payload.color, "#3b82f6");
}

#[test]
fn test_missing_sub_issue_file_surfaces_read_error() {
	let dir = tempfile::tempdir().unwrap();
	let missing = dir.path().join("nope.md");
	let err = sub_issues::extract_sub_issues_from_file(&missing, "parent", "module").unwrap_err();
	assert!(matches!(err, reader::ReadError::NotFound { .. }));
}
