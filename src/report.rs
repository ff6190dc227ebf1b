//! Corpus analysis and the coverage report: which defined paths a set of
//! XML files witnesses, which it misses, and which of its paths the schema
//! never defined.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use log::warn;
use roxmltree::{Document, Node};

use crate::paths::PathSets;

/// Path-classifying markers for imported schemas: an undefined path
/// containing one of these segments is external, not a defect.
pub const DEFAULT_EXTERNAL_MARKERS: &[&str] = &["/Signature/"];

/// Attributes that never count toward coverage (instance-level plumbing).
const IGNORED_ATTRIBUTES: &[&str] = &["schemaLocation", "type", "nil"];

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UsedPaths {
    pub elements: BTreeSet<String>,
    pub attributes: BTreeSet<String>,
    pub files_analyzed: usize,
    pub files_failed: usize,
}

/// Parses every file and accumulates the element and attribute paths in
/// use. A file that fails to parse is a warning, not a stop.
pub fn analyze_corpus(files: &[impl AsRef<Path>]) -> UsedPaths {
    let mut used = UsedPaths::default();
    for file in files {
        let file = file.as_ref();
        let source = match fs::read_to_string(file) {
            Ok(source) => source,
            Err(e) => {
                warn!("skipping {}: {e}", file.display());
                used.files_failed += 1;
                continue;
            }
        };
        match Document::parse(&source) {
            Ok(doc) => {
                collect_paths(doc.root_element(), "", &mut used);
                used.files_analyzed += 1;
            }
            Err(e) => {
                warn!("skipping {}: {e}", file.display());
                used.files_failed += 1;
            }
        }
    }
    used
}

fn collect_paths(node: Node, parent_path: &str, used: &mut UsedPaths) {
    let path = format!("{parent_path}/{}", node.tag_name().name());
    used.elements.insert(path.clone());
    for attribute in node.attributes() {
        let name = attribute.name();
        if IGNORED_ATTRIBUTES.contains(&name) {
            continue;
        }
        used.attributes.insert(format!("{path}@{name}"));
    }
    for child in node.children().filter(|c| c.is_element()) {
        collect_paths(child, &path, used);
    }
}

/// The computed diff between defined and used path sets.
#[derive(Clone, Debug)]
pub struct CoverageReport {
    defined_elements: BTreeSet<String>,
    defined_attributes: BTreeSet<String>,
    used_elements: BTreeSet<String>,
    used_attributes: BTreeSet<String>,
    covered_elements: BTreeSet<String>,
    covered_attributes: BTreeSet<String>,
    unused_elements: BTreeSet<String>,
    unused_attributes: BTreeSet<String>,
    external_elements: BTreeSet<String>,
    undefined_elements: BTreeSet<String>,
    external_attributes: BTreeSet<String>,
    undefined_attributes: BTreeSet<String>,
}

impl CoverageReport {
    pub fn new(defined: &PathSets, used: &UsedPaths, external_markers: &[&str]) -> Self {
        let is_external =
            |path: &String| external_markers.iter().any(|marker| path.contains(marker));

        let covered_elements: BTreeSet<String> = defined
            .elements
            .intersection(&used.elements)
            .cloned()
            .collect();
        let covered_attributes: BTreeSet<String> = defined
            .attributes
            .intersection(&used.attributes)
            .cloned()
            .collect();
        let unused_elements = defined
            .elements
            .difference(&used.elements)
            .cloned()
            .collect();
        let unused_attributes = defined
            .attributes
            .difference(&used.attributes)
            .cloned()
            .collect();
        let (external_elements, undefined_elements): (BTreeSet<String>, BTreeSet<String>) = used
            .elements
            .difference(&defined.elements)
            .cloned()
            .partition(is_external);
        let (external_attributes, undefined_attributes): (BTreeSet<String>, BTreeSet<String>) =
            used.attributes
                .difference(&defined.attributes)
                .cloned()
                .partition(is_external);

        for path in &undefined_elements {
            warn!("element path {path} is defined by no schema");
        }
        for path in &undefined_attributes {
            warn!("attribute path {path} is defined by no schema");
        }

        CoverageReport {
            defined_elements: defined.elements.clone(),
            defined_attributes: defined.attributes.clone(),
            used_elements: used.elements.clone(),
            used_attributes: used.attributes.clone(),
            covered_elements,
            covered_attributes,
            unused_elements,
            unused_attributes,
            external_elements,
            undefined_elements,
            external_attributes,
            undefined_attributes,
        }
    }

    pub fn element_coverage(&self) -> f64 {
        percentage(self.covered_elements.len(), self.defined_elements.len())
    }

    pub fn attribute_coverage(&self) -> f64 {
        percentage(self.covered_attributes.len(), self.defined_attributes.len())
    }

    pub fn total_coverage(&self) -> f64 {
        percentage(
            self.covered_elements.len() + self.covered_attributes.len(),
            self.defined_elements.len() + self.defined_attributes.len(),
        )
    }

    /// Paths in the corpus that neither the schema nor a known external
    /// namespace accounts for. Anything above zero points at an enumerator
    /// bug or a non-conforming document.
    pub fn truly_undefined_count(&self) -> usize {
        self.undefined_elements.len() + self.undefined_attributes.len()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let rule = "=".repeat(80);
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "XSD coverage report");
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out);

        self.render_category(
            &mut out,
            "Element paths",
            &self.defined_elements,
            &self.used_elements,
            &self.covered_elements,
            self.undefined_elements.len() + self.external_elements.len(),
            self.element_coverage(),
        );
        self.render_category(
            &mut out,
            "Attribute paths",
            &self.defined_attributes,
            &self.used_attributes,
            &self.covered_attributes,
            self.undefined_attributes.len() + self.external_attributes.len(),
            self.attribute_coverage(),
        );

        let total_defined = self.defined_elements.len() + self.defined_attributes.len();
        let total_used = self.used_elements.len() + self.used_attributes.len();
        let total_covered = self.covered_elements.len() + self.covered_attributes.len();
        let _ = writeln!(out, "Combined");
        let _ = writeln!(out, "  defined by the schema:  {total_defined}");
        let _ = writeln!(out, "  present in the corpus:  {total_used}");
        let _ = writeln!(
            out,
            "  coverage: {:.2}% ({total_covered}/{total_defined})",
            self.total_coverage()
        );
        let _ = writeln!(out);

        bounded_list(&mut out, "Unused element paths", &self.unused_elements, 100, "-");
        bounded_list(
            &mut out,
            "Unused attribute paths",
            &self.unused_attributes,
            100,
            "-",
        );
        bounded_list(
            &mut out,
            "External-schema element paths (defined via import)",
            &self.external_elements,
            50,
            "i",
        );
        bounded_list(
            &mut out,
            "External-schema attribute paths (defined via import)",
            &self.external_attributes,
            50,
            "i",
        );
        bounded_list(
            &mut out,
            "WARNING: element paths defined by no schema",
            &self.undefined_elements,
            50,
            "!",
        );
        bounded_list(
            &mut out,
            "WARNING: attribute paths defined by no schema",
            &self.undefined_attributes,
            50,
            "!",
        );

        self.render_used_list(&mut out, "Used element paths", &self.used_elements, |p| {
            self.defined_elements.contains(p)
        });
        self.render_used_list(
            &mut out,
            "Used attribute paths",
            &self.used_attributes,
            |p| self.defined_attributes.contains(p),
        );

        let _ = writeln!(out, "{rule}");
        out
    }

    #[allow(clippy::too_many_arguments)]
    fn render_category(
        &self,
        out: &mut String,
        title: &str,
        defined: &BTreeSet<String>,
        used: &BTreeSet<String>,
        covered: &BTreeSet<String>,
        undefined: usize,
        coverage: f64,
    ) {
        let _ = writeln!(out, "{title}");
        let _ = writeln!(out, "  defined by the schema:  {}", defined.len());
        let _ = writeln!(out, "    used in the corpus:   {}", covered.len());
        let _ = writeln!(out, "    unused:               {}", defined.len() - covered.len());
        let _ = writeln!(out, "  present in the corpus:  {}", used.len());
        let _ = writeln!(out, "    defined:              {}", covered.len());
        let _ = writeln!(out, "    undefined:            {undefined}");
        let _ = writeln!(
            out,
            "  coverage: {coverage:.2}% ({}/{})",
            covered.len(),
            defined.len()
        );
        let _ = writeln!(out);
    }

    fn render_used_list(
        &self,
        out: &mut String,
        title: &str,
        paths: &BTreeSet<String>,
        defined: impl Fn(&String) -> bool,
    ) {
        let _ = writeln!(out, "{title} ({} total)", paths.len());
        for (index, path) in paths.iter().enumerate() {
            if index >= 100 {
                let _ = writeln!(out, "  ... {} more", paths.len() - 100);
                break;
            }
            let marker = if defined(path) { "+" } else { "!" };
            let _ = writeln!(out, "  {marker} {path}");
        }
        let _ = writeln!(out);
    }
}

fn percentage(covered: usize, defined: usize) -> f64 {
    if defined == 0 {
        0.0
    } else {
        covered as f64 / defined as f64 * 100.0
    }
}

fn bounded_list(
    out: &mut String,
    title: &str,
    paths: &BTreeSet<String>,
    limit: usize,
    marker: &str,
) {
    if paths.is_empty() {
        return;
    }
    let _ = writeln!(out, "{title} ({} total)", paths.len());
    for (index, path) in paths.iter().enumerate() {
        if index >= limit {
            let _ = writeln!(out, "  ... {} more", paths.len() - limit);
            break;
        }
        let _ = writeln!(out, "  {marker} {path}");
    }
    let _ = writeln!(out);
}
