//! Greedy set-cover selection over materialized candidates, plus the
//! candidate generation loop that feeds it.

use std::collections::BTreeSet;

use log::{debug, info};

use crate::xsd::SchemaModel;

use super::builder::{CandidateBuilder, OptionalMode, XmlSnippet};

#[derive(Clone, Debug)]
pub struct SetCoverConfig {
    /// Selection stops once this fraction of the universe is covered.
    pub target_coverage: f64,
    pub max_files: usize,
    /// Scores are damped by `1 / (1 + depth_penalty * depth)` so shallow
    /// candidates win ties against deep ones.
    pub depth_penalty: f64,
}

impl Default for SetCoverConfig {
    fn default() -> Self {
        SetCoverConfig {
            target_coverage: 0.95,
            max_files: 50,
            depth_penalty: 0.1,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Selection {
    /// Indices into the candidate list, in selection order.
    pub chosen: Vec<usize>,
    pub covered: usize,
    pub universe: usize,
}

impl Selection {
    pub fn coverage(&self) -> f64 {
        if self.universe == 0 {
            1.0
        } else {
            self.covered as f64 / self.universe as f64
        }
    }
}

/// Greedy selection: repeatedly take the candidate covering the most
/// still-uncovered paths, damped by depth; earliest candidate wins ties.
/// Adding a snippet never decreases cumulative coverage.
pub fn select_snippets(
    universe: &BTreeSet<String>,
    candidates: &[XmlSnippet],
    config: &SetCoverConfig,
) -> Selection {
    let mut uncovered = universe.clone();
    let mut chosen = Vec::new();

    info!(
        "set-cover selection: {} coverage items, {} candidates, target {:.1}%",
        universe.len(),
        candidates.len(),
        config.target_coverage * 100.0
    );

    while !uncovered.is_empty() && chosen.len() < config.max_files {
        let mut best: Option<(usize, f64)> = None;
        for (index, snippet) in candidates.iter().enumerate() {
            let gain = snippet
                .covered_paths
                .iter()
                .filter(|p| uncovered.contains(*p))
                .count();
            if gain == 0 {
                continue;
            }
            let score = gain as f64 / (1.0 + config.depth_penalty * snippet.depth as f64);
            if best.map(|(_, s)| score > s).unwrap_or(true) {
                best = Some((index, score));
            }
        }
        let Some((index, _)) = best else {
            break;
        };

        let snippet = &candidates[index];
        for path in &snippet.covered_paths {
            uncovered.remove(path);
        }
        chosen.push(index);

        let covered = universe.len() - uncovered.len();
        debug!(
            "selected candidate {index} (depth {}), cumulative {}/{}",
            snippet.depth,
            covered,
            universe.len()
        );
        if covered as f64 / universe.len() as f64 >= config.target_coverage {
            break;
        }
    }

    let covered = universe.len() - uncovered.len();
    info!(
        "set-cover selection done: {} files, {}/{} items covered",
        chosen.len(),
        covered,
        universe.len()
    );
    Selection {
        chosen,
        covered,
        universe: universe.len(),
    }
}

#[derive(Clone, Debug)]
pub struct CandidateConfig {
    pub max_snippets: usize,
    /// Depth ceiling for generated variants; defaults to
    /// `min(max_depth, 5)` which keeps candidate counts practical.
    pub max_gen_depth: Option<u32>,
}

impl Default for CandidateConfig {
    fn default() -> Self {
        CandidateConfig {
            max_snippets: 100,
            max_gen_depth: None,
        }
    }
}

/// Materializes candidate variants per root element and depth: everything
/// optional, required-only, and two further choice rotations.
pub fn generate_candidates(
    model: &SchemaModel,
    builder: &CandidateBuilder,
    config: &CandidateConfig,
) -> Vec<XmlSnippet> {
    let gen_depth = config
        .max_gen_depth
        .unwrap_or_else(|| builder.max_depth().min(5))
        .max(1);
    let variants: [(OptionalMode, usize); 4] = [
        (OptionalMode::All, 0),
        (OptionalMode::RequiredOnly, 0),
        (OptionalMode::All, 1),
        (OptionalMode::All, 2),
    ];

    let mut snippets = Vec::new();
    'roots: for root in model.root_elements() {
        for depth in 1..=gen_depth {
            for (mode, choice_index) in &variants {
                if let Some(snippet) = builder.build(root, depth, mode, *choice_index) {
                    snippets.push(snippet);
                }
                if snippets.len() >= config.max_snippets {
                    break 'roots;
                }
            }
        }
    }
    info!("generated {} candidate snippets", snippets.len());
    snippets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::builder::BuilderConfig;
    use crate::generate::tree::XmlElement;
    use crate::paths::enumerate_paths;
    use crate::xsd::load_schema_source;

    fn snippet(paths: &[&str], depth: u32) -> XmlSnippet {
        XmlSnippet {
            root: XmlElement::new("x"),
            covered_paths: paths.iter().map(|p| p.to_string()).collect(),
            depth,
        }
    }

    fn universe(paths: &[&str]) -> BTreeSet<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn greedy_prefers_larger_gain() {
        let u = universe(&["/a", "/b", "/c", "/d"]);
        let candidates = vec![
            snippet(&["/a"], 1),
            snippet(&["/b", "/c", "/d"], 1),
            snippet(&["/a", "/b"], 1),
        ];
        let selection = select_snippets(&u, &candidates, &SetCoverConfig::default());
        assert_eq!(selection.chosen[0], 1);
        assert_eq!(selection.covered, 4);
        assert_eq!(selection.coverage(), 1.0);
    }

    #[test]
    fn depth_penalty_prefers_shallow_equal_gain() {
        let u = universe(&["/a", "/b"]);
        let candidates = vec![snippet(&["/a", "/b"], 5), snippet(&["/a", "/b"], 1)];
        let selection = select_snippets(&u, &candidates, &SetCoverConfig::default());
        assert_eq!(selection.chosen, vec![1]);
    }

    #[test]
    fn ties_go_to_the_earliest_candidate() {
        let u = universe(&["/a"]);
        let candidates = vec![snippet(&["/a"], 2), snippet(&["/a"], 2)];
        let selection = select_snippets(&u, &candidates, &SetCoverConfig::default());
        assert_eq!(selection.chosen, vec![0]);
    }

    #[test]
    fn coverage_is_monotone_over_selections() {
        let u = universe(&["/a", "/b", "/c", "/d", "/e"]);
        let candidates = vec![
            snippet(&["/a", "/b"], 1),
            snippet(&["/b", "/c"], 1),
            snippet(&["/d"], 1),
            snippet(&["/e"], 1),
        ];
        let selection = select_snippets(
            &u,
            &candidates,
            &SetCoverConfig {
                target_coverage: 1.0,
                ..Default::default()
            },
        );
        let mut covered: BTreeSet<String> = BTreeSet::new();
        let mut last = 0;
        for index in &selection.chosen {
            covered.extend(candidates[*index].covered_paths.iter().cloned());
            assert!(covered.len() >= last);
            last = covered.len();
        }
        assert_eq!(last, 5);
    }

    #[test]
    fn max_files_caps_the_selection() {
        let u = universe(&["/a", "/b", "/c"]);
        let candidates = vec![snippet(&["/a"], 1), snippet(&["/b"], 1), snippet(&["/c"], 1)];
        let selection = select_snippets(
            &u,
            &candidates,
            &SetCoverConfig {
                max_files: 2,
                target_coverage: 1.0,
                ..Default::default()
            },
        );
        assert_eq!(selection.chosen.len(), 2);
        assert!(selection.coverage() < 1.0);
    }

    #[test]
    fn end_to_end_candidates_cover_small_schema() {
        let model = load_schema_source(
            r#"<xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema">
                   <xsd:element name="R" type="RType"/>
                   <xsd:complexType name="RType">
                       <xsd:sequence>
                           <xsd:element name="A" type="xsd:string"/>
                           <xsd:element name="B" type="xsd:string" minOccurs="0"/>
                       </xsd:sequence>
                       <xsd:attribute name="id" type="xsd:string" use="required"/>
                   </xsd:complexType>
               </xsd:schema>"#,
            None,
        )
        .unwrap();
        let sets = enumerate_paths(&model, 5);
        let builder = CandidateBuilder::new(&model, BuilderConfig::default());
        let candidates = generate_candidates(&model, &builder, &CandidateConfig::default());
        let selection = select_snippets(&sets.all(), &candidates, &SetCoverConfig::default());
        assert_eq!(selection.coverage(), 1.0);
    }
}
