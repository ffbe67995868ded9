//! Top-K selection over the raw score vector produced by inference.

/// A class label paired with the raw score the model assigned to it.
///
/// Scores are whatever the model emits; no softmax or other normalization is
/// applied, so they need not sum to 1.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredClass {
    pub class_name: String,
    pub score: f32,
}

/// Ranks a score vector against an ordered label list, highest score first.
///
/// Ties are broken by original index, lowest first, so the result is fully
/// deterministic. At most `min(labels.len(), scores.len())` entries are
/// emitted; a high-scoring index with no corresponding label is skipped
/// rather than indexed out of range. Position 0 is always the
/// highest-confidence class — callers may rely on the ordering.
pub fn rank(scores: &[f32], labels: &[String]) -> Vec<ScoredClass> {
    let mut indexed: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
    // Stable sort: equal scores keep their index order.
    indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let k = labels.len().min(scores.len());
    let mut ranked = Vec::with_capacity(k);
    for (index, score) in indexed {
        if ranked.len() == k {
            break;
        }
        if let Some(label) = labels.get(index) {
            ranked.push(ScoredClass {
                class_name: label.clone(),
                score,
            });
        }
    }
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_ranking_is_descending() {
        let ranked = rank(&[0.1, 0.9, 0.5], &labels(&["cat", "dog", "fish"]));
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0], ScoredClass { class_name: "dog".into(), score: 0.9 });
        assert_eq!(ranked[1], ScoredClass { class_name: "fish".into(), score: 0.5 });
        assert_eq!(ranked[2], ScoredClass { class_name: "cat".into(), score: 0.1 });
    }

    #[test]
    fn test_ties_keep_first_index() {
        let ranked = rank(&[0.5, 0.5], &labels(&["a", "b"]));
        assert_eq!(ranked[0].class_name, "a");
        assert_eq!(ranked[1].class_name, "b");
    }

    #[test]
    fn test_truncates_to_label_count() {
        let ranked = rank(&[0.1, 0.2, 0.3, 0.4, 0.5], &labels(&["a", "b", "c"]));
        assert_eq!(ranked.len(), 3);
        // The three labeled indices, best first.
        assert_eq!(ranked[0].class_name, "c");
        assert_eq!(ranked[1].class_name, "b");
        assert_eq!(ranked[2].class_name, "a");
    }

    #[test]
    fn test_unlabeled_high_scores_are_skipped() {
        // Index 3 scores highest but has no label; it must be skipped, not
        // crash or shadow a labeled entry.
        let ranked = rank(&[0.1, 0.2, 0.3, 0.9], &labels(&["a", "b", "c"]));
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].class_name, "c");
    }

    #[test]
    fn test_more_labels_than_scores() {
        let ranked = rank(&[0.7, 0.2], &labels(&["a", "b", "c", "d"]));
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].class_name, "a");
    }

    #[test]
    fn test_empty_scores() {
        assert!(rank(&[], &labels(&["a"])).is_empty());
        assert!(rank(&[0.5], &[]).is_empty());
    }

    #[test]
    fn test_nan_scores_do_not_panic() {
        let ranked = rank(&[f32::NAN, 0.5], &labels(&["a", "b"]));
        assert_eq!(ranked.len(), 2);
    }
}
