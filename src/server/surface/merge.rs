use std::collections::HashSet;

use thiserror::Error;
use tracing::warn;

use super::model::{call_token, Component, ComponentEntry, Fragment, Surface, TextContent};

/// One normalized tool result entering aggregation, in router call order.
#[derive(Debug, Clone)]
pub enum CallResult {
    Surface(Fragment),
    Text(String),
}

#[derive(Debug, Clone)]
pub enum AggregateReply {
    Surface(Surface),
    Text(String),
}

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("component id `{0}` appears in more than one fragment")]
    DuplicateNodeId(String),
}

pub const NO_TOOLS_EXECUTED: &str = "No tools executed.";

/// Combines the results of all tool calls into exactly one reply.
///
/// - no results: a default text reply;
/// - a single fragment: passed through unchanged (identity fast path, the
///   client sees exactly what the tool produced);
/// - no fragments at all: the text results joined;
/// - otherwise: a dashboard surface. Fragment node lists are concatenated
///   with their ids unchanged, a fresh synthetic `Column` becomes the root
///   with the fragments' roots as children in call order, and text results
///   are folded in as synthetic `Text` nodes so nothing is silently dropped.
///
/// Node ids must be unique across fragments (tools namespace their ids with
/// a per-call token); a collision fails the merge rather than producing a
/// surface that renders one fragment's node in another's place.
pub fn aggregate(results: Vec<CallResult>) -> Result<AggregateReply, MergeError> {
    if results.is_empty() {
        return Ok(AggregateReply::Text(NO_TOOLS_EXECUTED.to_string()));
    }

    let fragment_count = results
        .iter()
        .filter(|r| matches!(r, CallResult::Surface(_)))
        .count();

    if fragment_count == 0 {
        let joined = results
            .iter()
            .filter_map(|r| match r {
                CallResult::Text(text) => Some(text.as_str()),
                CallResult::Surface(_) => None,
            })
            .collect::<Vec<_>>()
            .join("\n\n");
        return Ok(AggregateReply::Text(joined));
    }

    if results.len() == 1 {
        // fragment_count == 1 here, so this is the lone fragment.
        if let Some(CallResult::Surface(surface)) = results.into_iter().next() {
            return Ok(AggregateReply::Surface(surface));
        }
        unreachable!("single result with fragment_count == 1 must be a surface");
    }

    let token = call_token();
    let dashboard_root = format!("dashboard_{token}");

    let mut components = Vec::new();
    let mut data_model = Vec::new();
    let mut child_ids = Vec::new();
    let mut seen_ids: HashSet<String> = HashSet::new();

    for (index, result) in results.into_iter().enumerate() {
        match result {
            CallResult::Surface(fragment) => {
                for entry in &fragment.components {
                    if !seen_ids.insert(entry.id.clone()) {
                        return Err(MergeError::DuplicateNodeId(entry.id.clone()));
                    }
                }
                child_ids.push(fragment.root);
                components.extend(fragment.components);
                data_model.extend(fragment.data_model);
            }
            CallResult::Text(text) => {
                let id = format!("dashtext_{token}_{index}");
                components.push(ComponentEntry::new(
                    id.clone(),
                    Component::text(TextContent::literal(text)),
                ));
                child_ids.push(id);
            }
        }
    }

    let mut namespace_keys: HashSet<&str> = HashSet::new();
    for entry in &data_model {
        if !namespace_keys.insert(entry.key.as_str()) {
            // Retained on purpose: later entries win for client reads.
            warn!(namespace = %entry.key, "duplicate data model namespace after merge");
        }
    }

    components.insert(
        0,
        ComponentEntry::new(dashboard_root.clone(), Component::column(child_ids)),
    );

    Ok(AggregateReply::Surface(Surface {
        surface_id: "dashboard".to_string(),
        components,
        data_model,
        root: dashboard_root,
    }))
}
