#![forbid(unsafe_code)]

//! `Within` — proximity conditions gating a finding on the presence
//! (or absence) of another pattern nearby (§4.4.3).

use crate::model::SearchIn;
use crate::text_container::{Boundary, TextContainer};

/// True when at least one of `inner_matches` stands in the relation
/// `search_in` demands to `finding` within `container`.
///
/// Negation (`negate_finding`) is the evaluator's concern, not this
/// function's: it always answers "does the positive relation hold".
pub fn selector_holds(
    search_in: SearchIn,
    container: &TextContainer,
    finding: Boundary,
    inner_matches: &[Boundary],
) -> bool {
    match search_in {
        SearchIn::FindingOnly => inner_matches
            .iter()
            .any(|m| m.index >= finding.index && m.end() <= finding.end()),
        SearchIn::FindingRegion { before, after } => {
            let finding_line = container.get_location(finding.index).line;
            let lo = finding_line.saturating_sub(before).max(1);
            let hi = finding_line.saturating_add(after);
            inner_matches.iter().any(|m| {
                let line = container.get_location(m.index).line;
                line >= lo && line <= hi
            })
        }
        SearchIn::SameLine => {
            let finding_line = container.get_location(finding.index).line;
            inner_matches
                .iter()
                .any(|m| container.get_location(m.index).line == finding_line)
        }
        SearchIn::SameFile => !inner_matches.is_empty(),
        SearchIn::OnlyBefore => inner_matches.iter().any(|m| m.end() <= finding.index),
        SearchIn::OnlyAfter => inner_matches.iter().any(|m| m.index >= finding.end()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::from_file_name;
    use std::path::Path;

    fn container(content: &str) -> TextContainer {
        let (_, info) = from_file_name(Path::new("test.rs"));
        TextContainer::new(content, &info)
    }

    #[test]
    fn finding_only_requires_match_inside_finding_boundary() {
        let tc = container("let x = danger();");
        let finding = Boundary::new(8, 6);
        let inside = vec![Boundary::new(9, 3)];
        let outside = vec![Boundary::new(0, 3)];
        assert!(selector_holds(SearchIn::FindingOnly, &tc, finding, &inside));
        assert!(!selector_holds(SearchIn::FindingOnly, &tc, finding, &outside));
    }

    #[test]
    fn same_line_requires_shared_line() {
        let tc = container("one danger\ntwo safe");
        let finding = Boundary::new(4, 6);
        let same_line = vec![Boundary::new(0, 3)];
        let other_line = vec![Boundary::new(15, 4)];
        assert!(selector_holds(SearchIn::SameLine, &tc, finding, &same_line));
        assert!(!selector_holds(SearchIn::SameLine, &tc, finding, &other_line));
    }

    #[test]
    fn finding_region_expands_by_line_count() {
        let tc = container("a\nb\nDANGER\nc\nd");
        let finding = Boundary::new(4, 6);
        let within_one_before = vec![Boundary::new(2, 1)];
        let too_far_before = vec![Boundary::new(0, 1)];
        let selector = SearchIn::FindingRegion { before: 1, after: 1 };
        assert!(selector_holds(selector, &tc, finding, &within_one_before));
        assert!(!selector_holds(selector, &tc, finding, &too_far_before));
    }

    #[test]
    fn same_file_is_true_whenever_any_inner_match_exists() {
        let tc = container("anything");
        let finding = Boundary::new(0, 1);
        assert!(selector_holds(SearchIn::SameFile, &tc, finding, &[Boundary::new(5, 1)]));
        assert!(!selector_holds(SearchIn::SameFile, &tc, finding, &[]));
    }

    #[test]
    fn only_before_and_only_after_are_directional() {
        let tc = container("AAA danger BBB");
        let finding = Boundary::new(4, 6);
        let before = vec![Boundary::new(0, 3)];
        let after = vec![Boundary::new(11, 3)];
        assert!(selector_holds(SearchIn::OnlyBefore, &tc, finding, &before));
        assert!(!selector_holds(SearchIn::OnlyBefore, &tc, finding, &after));
        assert!(selector_holds(SearchIn::OnlyAfter, &tc, finding, &after));
        assert!(!selector_holds(SearchIn::OnlyAfter, &tc, finding, &before));
    }
}
