//! Project plan model.
//!
//! A plan is the ordered list of files to generate plus a description for
//! each. It is built once, before generation starts, and is read-only for
//! the remainder of the run.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// The single aggregating file that imports and renders every other file.
pub const ROOT_FILE: &str = "src/App.jsx";

const ROOT_DESCRIPTION: &str = "Main application component that renders the scene \
    and provides the overall structure for the application.";

/// A declared file with its generation instruction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub path: String,
    pub description: String,
}

/// The ordered file list plus path-to-description mapping describing what to
/// generate. Declaration order is preserved; every listed path has exactly one
/// description; the root file is always present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectPlan {
    files: Vec<String>,
    descriptions: HashMap<String, String>,
}

impl ProjectPlan {
    /// Build a plan from a file list and description map.
    ///
    /// Duplicate paths are dropped (first occurrence wins). A listed path
    /// without a description is an error. If the root file is missing from
    /// the list it is inserted at the front with a default description.
    pub fn new(
        files: Vec<String>,
        mut descriptions: HashMap<String, String>,
    ) -> CoreResult<Self> {
        let mut seen = HashSet::new();
        let mut ordered = Vec::with_capacity(files.len());
        for path in files {
            if seen.insert(path.clone()) {
                ordered.push(path);
            }
        }

        for path in &ordered {
            if !descriptions.contains_key(path) {
                return Err(CoreError::MissingDescription(path.clone()));
            }
        }

        if !seen.contains(ROOT_FILE) {
            ordered.insert(0, ROOT_FILE.to_string());
            descriptions
                .entry(ROOT_FILE.to_string())
                .or_insert_with(|| ROOT_DESCRIPTION.to_string());
        }

        Ok(Self {
            files: ordered,
            descriptions,
        })
    }

    /// Build a plan from descriptors, in declaration order.
    pub fn from_descriptors(descriptors: Vec<FileDescriptor>) -> CoreResult<Self> {
        let mut files = Vec::with_capacity(descriptors.len());
        let mut descriptions = HashMap::with_capacity(descriptors.len());
        for d in descriptors {
            files.push(d.path.clone());
            descriptions.insert(d.path, d.description);
        }
        Self::new(files, descriptions)
    }

    /// All declared paths in declaration order.
    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Description for a path, if declared.
    pub fn description(&self, path: &str) -> Option<&str> {
        self.descriptions.get(path).map(|s| s.as_str())
    }

    /// Description of the root file.
    pub fn root_description(&self) -> &str {
        self.descriptions
            .get(ROOT_FILE)
            .map(|s| s.as_str())
            .unwrap_or(ROOT_DESCRIPTION)
    }

    /// Leaf paths in declaration order: every declared path except the root
    /// and any path in `exclusions`.
    pub fn leaf_paths<'a>(
        &'a self,
        exclusions: &'a HashSet<String>,
    ) -> impl Iterator<Item = &'a str> {
        self.files
            .iter()
            .map(|p| p.as_str())
            .filter(move |p| *p != ROOT_FILE && !exclusions.contains(*p))
    }

    /// Rendered listing of every declared path with its description, except
    /// `target`. Used to give a generation task awareness of sibling files.
    pub fn context_listing(&self, target: &str) -> String {
        self.files
            .iter()
            .filter(|p| p.as_str() != target)
            .map(|p| {
                format!(
                    "- {}: {}",
                    p,
                    self.descriptions.get(p).map(|s| s.as_str()).unwrap_or("")
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan_with(paths: &[(&str, &str)]) -> ProjectPlan {
        ProjectPlan::from_descriptors(
            paths
                .iter()
                .map(|(p, d)| FileDescriptor {
                    path: p.to_string(),
                    description: d.to_string(),
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_root_is_always_present() {
        let plan = plan_with(&[("src/Cube.jsx", "a spinning cube")]);
        assert_eq!(plan.files()[0], ROOT_FILE);
        assert!(plan.description(ROOT_FILE).is_some());
    }

    #[test]
    fn test_declaration_order_preserved() {
        let plan = plan_with(&[
            ("src/App.jsx", "root"),
            ("src/Cube.jsx", "cube"),
            ("src/Lights.jsx", "lights"),
        ]);
        assert_eq!(
            plan.files(),
            &["src/App.jsx", "src/Cube.jsx", "src/Lights.jsx"]
        );
    }

    #[test]
    fn test_duplicate_paths_dropped() {
        let plan = plan_with(&[
            ("src/App.jsx", "root"),
            ("src/Cube.jsx", "cube"),
            ("src/Cube.jsx", "cube again"),
        ]);
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn test_missing_description_is_an_error() {
        let result = ProjectPlan::new(
            vec!["src/App.jsx".to_string(), "src/Cube.jsx".to_string()],
            HashMap::from([("src/App.jsx".to_string(), "root".to_string())]),
        );
        assert!(matches!(result, Err(CoreError::MissingDescription(p)) if p == "src/Cube.jsx"));
    }

    #[test]
    fn test_leaf_paths_exclude_root_and_exclusions() {
        let plan = plan_with(&[
            ("src/App.jsx", "root"),
            ("index.html", "entry page"),
            ("src/Cube.jsx", "cube"),
        ]);
        let exclusions = HashSet::from(["index.html".to_string()]);
        let leaves: Vec<_> = plan.leaf_paths(&exclusions).collect();
        assert_eq!(leaves, vec!["src/Cube.jsx"]);
    }

    #[test]
    fn test_context_listing_excludes_target() {
        let plan = plan_with(&[
            ("src/App.jsx", "root"),
            ("src/Cube.jsx", "cube"),
            ("src/Lights.jsx", "lights"),
        ]);
        let listing = plan.context_listing("src/Cube.jsx");
        assert!(!listing.contains("src/Cube.jsx"));
        assert!(listing.contains("- src/App.jsx: root"));
        assert!(listing.contains("- src/Lights.jsx: lights"));
    }
}
