//! FILENAME: core/style-engine/src/info.rs
//! PURPOSE: Describes the registered styling directives to the viewer.

use serde::{Deserialize, Serialize};

use crate::patcher::{PatcherKind, TodoPatcher};
use crate::style_func::Axis;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleFunctionInfo {
    pub index: usize,
    /// Name the function was registered under.
    pub qname: String,
    /// Built-in name if the function is a built-in, else `qname`.
    pub resolved_name: String,
    pub axis: Option<Axis>,
    pub is_builtin: bool,
    pub is_supported: bool,
    pub is_chunk_parent_requested: bool,
    pub is_apply: bool,
}

impl StyleFunctionInfo {
    pub fn from_patcher(patcher: &TodoPatcher) -> Self {
        let todo = patcher.todo();
        let func = todo.style_func();
        StyleFunctionInfo {
            index: patcher.index(),
            qname: func.name().to_string(),
            resolved_name: func
                .builtin()
                .map(|b| b.name().to_string())
                .unwrap_or_else(|| func.name().to_string()),
            axis: todo.axis(),
            is_builtin: func.builtin().is_some(),
            is_supported: patcher.kind().is_supported(),
            is_chunk_parent_requested: matches!(patcher.kind(), PatcherKind::ApplyWithGlobal),
            is_apply: todo.is_apply(),
        }
    }
}
