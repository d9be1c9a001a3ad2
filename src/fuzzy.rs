//! Edit-distance scoring for approximate name matching.

/// Levenshtein distance over chars, two-row DP.
pub(crate) fn distance(a: &str, b: &str) -> usize {
    if a == b {
        return 0;
    }
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0usize; b_chars.len() + 1];

    for (i, &ac) in a_chars.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &bc) in b_chars.iter().enumerate() {
            let sub_cost = if ac == bc { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + sub_cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_chars.len()]
}

/// Distance normalized to [0, 1] by the longer input; 0 means identical.
pub(crate) fn normalized_distance(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 0.0;
    }
    distance(a, b) as f64 / longest as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_empty() {
        assert_eq!(distance("", ""), 0);
    }

    #[test]
    fn one_side_empty() {
        assert_eq!(distance("", "lyon"), 4);
        assert_eq!(distance("lyon", ""), 4);
    }

    #[test]
    fn single_substitution() {
        assert_eq!(distance("cat", "cut"), 1);
    }

    #[test]
    fn insertion_and_deletion() {
        assert_eq!(distance("paris", "pariss"), 1);
        assert_eq!(distance("pariss", "paris"), 1);
    }

    #[test]
    fn unrelated_strings() {
        assert_eq!(distance("kitten", "orange"), 6);
    }

    #[test]
    fn multibyte_chars_count_once() {
        assert_eq!(distance("orléans", "orleans"), 1);
    }

    #[test]
    fn normalized_identical_is_zero() {
        assert_eq!(normalized_distance("nice", "nice"), 0.0);
    }

    #[test]
    fn normalized_disjoint_is_one() {
        assert_eq!(normalized_distance("abc", "xyz"), 1.0);
    }

    #[test]
    fn normalized_uses_longer_input() {
        // distance 1 over max(6, 5) chars
        let d = normalized_distance("pariss", "paris");
        assert!((d - 1.0 / 6.0).abs() < 1e-9);
    }
}
