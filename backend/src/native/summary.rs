//! Introspection snapshot of an object no converter understands

use crate::bridge::ForeignObject;
use serde::Serialize;
use std::io::{self, Write};

/// Members listed per category before the preview is cut short
pub const MEMBER_PREVIEW_LIMIT: usize = 15;
/// Characters of the textual preview kept
pub const TEXT_PREVIEW_LIMIT: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectSummary {
    pub type_name: String,
    pub attributes: Vec<String>,
    pub methods: Vec<String>,
    pub preview: String,
}

impl ObjectSummary {
    /// Enumerate public attributes and callable members of a foreign handle
    pub fn from_handle(handle: &dyn ForeignObject) -> Self {
        let mut attributes = Vec::new();
        let mut methods = Vec::new();
        for member in handle.members().into_iter().filter(|m| m.is_public()) {
            if member.callable {
                methods.push(member.name);
            } else {
                attributes.push(member.name);
            }
        }
        attributes.sort();
        methods.sort();

        Self {
            type_name: handle.type_name(),
            attributes,
            methods,
            preview: truncate(&handle.describe(), TEXT_PREVIEW_LIMIT),
        }
    }

    pub fn write_to(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "{}", self.type_name)?;
        writeln!(out, "  preview: {}", self.preview)?;
        write_member_list(out, "attributes", &self.attributes)?;
        write_member_list(out, "methods", &self.methods)?;
        Ok(())
    }
}

fn write_member_list(out: &mut dyn Write, label: &str, names: &[String]) -> io::Result<()> {
    if names.is_empty() {
        return Ok(());
    }
    let shown: Vec<&str> = names.iter().take(MEMBER_PREVIEW_LIMIT).map(String::as_str).collect();
    let more = names.len().saturating_sub(MEMBER_PREVIEW_LIMIT);
    if more > 0 {
        writeln!(out, "  {} ({}): {}, ... (+{} more)", label, names.len(), shown.join(", "), more)
    } else {
        writeln!(out, "  {} ({}): {}", label, names.len(), shown.join(", "))
    }
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(limit).collect();
    cut.push_str("...");
    cut
}
