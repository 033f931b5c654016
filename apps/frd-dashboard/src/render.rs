use frd_core::{LoadStatus, PageView, RowFlag, RowView};
use frd_events::Envelope;
use frd_model::EditDraft;
use frd_topics as topics;

pub fn render_view(view: &PageView) -> Vec<String> {
    match &view.load {
        LoadStatus::Failed(msg) => {
            return vec![
                format!("Could not load feedback: {msg}"),
                "Type `retry` to try again.".to_string(),
            ];
        }
        LoadStatus::Idle | LoadStatus::Loading => return vec!["Loading feedback...".to_string()],
        LoadStatus::Loaded | LoadStatus::Empty => {}
    }
    let mut out = Vec::new();
    let mut header = format!("All Feedback ({})", view.total_count);
    if view.status_filter != "ALL" {
        header.push_str(&format!("  status={}", view.status_filter));
    }
    if !view.search.trim().is_empty() {
        header.push_str(&format!("  search=\"{}\"", view.search.trim()));
    }
    out.push(header);
    if view.rows.is_empty() {
        out.push("No feedback items found.".to_string());
    }
    for row in &view.rows {
        render_row(row, &mut out);
    }
    out.push(format!(
        "Page {} of {} ({} matching)",
        view.page,
        view.total_pages.max(1),
        view.filtered_count
    ));
    out
}

fn render_row(row: &RowView, out: &mut Vec<String>) {
    let rec = &row.record;
    let marker = if row.open { "v" } else { ">" };
    let mut line = format!("{marker} #{} [{}]", rec.id, rec.status_label());
    if let Some(date) = rec.date.as_deref() {
        line.push_str(&format!(" {date}"));
    }
    line.push_str(&format!(" {}", rec.workflow_name));
    match row.flag {
        RowFlag::Idle => {}
        RowFlag::Confirming => line.push_str(&format!(
            "  Are you sure? (confirm {0} / cancel {0})",
            rec.id
        )),
        RowFlag::Deleting => line.push_str("  (deleting)"),
    }
    out.push(line);
    if let Some(rationale) = rec.rationale.as_deref() {
        out.push(format!("    Rationale: {rationale}"));
    }
    if !row.open {
        return;
    }
    if row.editing {
        out.push("    Editing: message <text>, tags <json>, attach <path>, save, discard".to_string());
        return;
    }
    if let Some(reason) = rec.feedback_request_reason.as_deref() {
        out.push(format!("    Requested because: {reason}"));
    }
    if rec.feedback_attributes.is_some() {
        out.push("    AI Decision Logic".to_string());
        if let Some(reason) = rec.decision_reason() {
            out.push(format!("      Reason: {reason}"));
        }
        for attr in rec.attribute_lines() {
            out.push(format!("      {}: {}", attr.key, attr.display));
        }
    }
    if let Some(meta) = rec.metadata.as_ref().filter(|m| !m.is_empty()) {
        let tags = meta
            .iter()
            .map(|(k, v)| format!("{k}={}", v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string())))
            .collect::<Vec<_>>()
            .join(", ");
        out.push(format!("    Tags: {tags}"));
    }
    out.push(format!(
        "    Message: {}",
        rec.feedback_message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or("No detailed feedback provided.")
    ));
    if let Some(by) = rec.provided_by.as_deref() {
        out.push(format!("    Provided by: {by}"));
    }
    if rec.has_attachment() {
        out.push(format!("    Attachment: Excel report (download {})", rec.id));
    }
}

pub fn render_draft(draft: &EditDraft) -> Vec<String> {
    let mut out = vec![format!("Editing #{}", draft.record_id)];
    out.push(format!("  content: {}", draft.content));
    if !draft.metadata_text.trim().is_empty() {
        out.push(format!("  tags: {}", draft.metadata_text));
    }
    match (&draft.pending_file, draft.existing_file()) {
        (Some(file), _) => out.push(format!("  file: {} ({} bytes, new)", file.name, file.bytes.len())),
        (None, Some(_)) => out.push("  file: existing attachment kept".to_string()),
        (None, None) => out.push("  file: none (XLS or XLSX only)".to_string()),
    }
    out
}

/// One-line rendering of a bus notice, or `None` for events not shown.
pub fn notice_line(env: &Envelope) -> Option<String> {
    let id = env.str_field("id").unwrap_or("?");
    let text = match env.kind.as_str() {
        topics::TOPIC_FEEDBACK_UPDATED => "Feedback updated correctly".to_string(),
        topics::TOPIC_FEEDBACK_UPDATE_FAILED => format!(
            "Update of #{id} failed: {}",
            env.str_field("error").unwrap_or("unknown error")
        ),
        topics::TOPIC_FEEDBACK_DELETED => format!("Feedback #{id} deleted"),
        topics::TOPIC_FEEDBACK_VALIDATION_FAILED => {
            "Please fix the highlighted fields before saving".to_string()
        }
        topics::TOPIC_FEEDBACK_LOAD_FAILED => format!(
            "Load failed: {}",
            env.str_field("error").unwrap_or("unknown error")
        ),
        _ => return None,
    };
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use frd_core::seed::seed_records;
    use frd_core::CollectionState;
    use frd_model::StatusFilter;
    use serde_json::json;

    fn state() -> CollectionState {
        CollectionState::with_records(5, seed_records())
    }

    #[test]
    fn renders_header_rows_and_footer() {
        let lines = render_view(&state().page_view());
        assert_eq!(lines[0], "All Feedback (5)");
        assert!(lines[1].starts_with("> #1 [NEW] Dec 14, 2023 Login process review"));
        assert!(lines.iter().any(|l| l.starts_with("> #4 [NEW]")));
        assert_eq!(lines.last().map(String::as_str), Some("Page 1 of 1 (5 matching)"));
    }

    #[test]
    fn open_row_shows_detail_block() {
        let mut st = state();
        st.toggle_open("1");
        let lines = render_view(&st.page_view());
        assert!(lines.iter().any(|l| l.starts_with("v #1")));
        assert!(lines.iter().any(|l| l.trim() == "Reason: Unknown identity provider in request"));
        assert!(lines.iter().any(|l| l.trim() == "unknown_word: Yes"));
        assert!(lines.iter().any(|l| l.trim() == "Message: No detailed feedback provided."));
    }

    #[test]
    fn empty_and_failed_views() {
        let mut st = state();
        st.set_status_filter(StatusFilter::parse("archived"));
        let lines = render_view(&st.page_view());
        assert!(lines.contains(&"No feedback items found.".to_string()));
        assert!(lines.last().is_some_and(|l| l == "Page 1 of 1 (0 matching)"));

        let mut failed = CollectionState::new(5);
        failed.begin_load();
        let _ = failed.finish_load(Err("server responded with status 500".into()));
        let lines = render_view(&failed.page_view());
        assert_eq!(lines[0], "Could not load feedback: server responded with status 500");
        assert!(lines[1].contains("retry"));
    }

    #[test]
    fn confirming_and_deleting_rows_are_marked() {
        let mut st = state();
        st.request_delete("2");
        st.mark_deleting("3");
        let lines = render_view(&st.page_view());
        assert!(lines.iter().any(|l| l.starts_with("> #2") && l.contains("Are you sure?")));
        assert!(lines.iter().any(|l| l.starts_with("> #3") && l.ends_with("(deleting)")));
    }

    #[test]
    fn notices_map_topics_to_text() {
        let env = Envelope {
            time: "2024-01-01T00:00:00.000Z".into(),
            kind: topics::TOPIC_FEEDBACK_UPDATE_FAILED.into(),
            payload: json!({"id": "3", "error": "round trip failed: server responded with status 503"}),
        };
        assert_eq!(
            notice_line(&env).as_deref(),
            Some("Update of #3 failed: round trip failed: server responded with status 503")
        );
        let other = Envelope {
            kind: topics::TOPIC_FEEDBACK_DELETE_SCHEDULED.into(),
            ..env
        };
        assert_eq!(notice_line(&other), None);
    }

    #[test]
    fn draft_rendering_mentions_file_state() {
        let rec = seed_records().remove(2);
        let draft = EditDraft::from_record(&rec);
        let lines = render_draft(&draft);
        assert_eq!(lines[0], "Editing #3");
        assert!(lines.iter().any(|l| l.contains("none (XLS or XLSX only)")));
    }
}
