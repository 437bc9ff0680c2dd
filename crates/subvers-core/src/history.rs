//! Whole-video history, for debugging and visualisation.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::version::SubtitleVersion;

/// Every version of every branch of a video, plus the parent edges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoHistory {
  pub video_id: String,
  pub versions: Vec<SubtitleVersion>,
  /// `(parent_id, child_id)` pairs.
  pub edges:    Vec<(Uuid, Uuid)>,
}

impl VideoHistory {
  /// Render the history as a Graphviz digraph, oldest at the bottom.
  pub fn to_dot(&self) -> String {
    let name = |id: &Uuid| {
      self
        .versions
        .iter()
        .find(|v| v.version_id == *id)
        .map(node_name)
        .unwrap_or_else(|| format!("\"{id}\""))
    };

    let mut out = String::new();
    let _ = writeln!(out, "digraph {} {{", quoted(&format!("video_{}", self.video_id)));
    let _ = writeln!(out, "rankdir = BT;");
    for v in &self.versions {
      let n = node_name(v);
      let _ = writeln!(out, "{n}[label={n}];");
    }
    for (parent, child) in &self.edges {
      let _ = writeln!(out, "{} -> {};", name(parent), name(child));
    }
    out.push_str("}\n");
    out
  }
}

fn node_name(v: &SubtitleVersion) -> String {
  quoted(&format!("{}{}", v.language_code, v.version_number))
}

/// A DOT quoted identifier.
fn quoted(id: &str) -> String {
  let mut out = String::with_capacity(id.len() + 2);
  out.push('"');
  for c in id.chars() {
    if matches!(c, '"' | '\\') {
      out.push('\\');
    }
    out.push(c);
  }
  out.push('"');
  out
}
