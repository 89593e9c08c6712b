use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TOKEN: Regex = Regex::new(r"(?u)[\p{L}\p{N}]+").expect("valid regex");
}

/// Tokenize text into lowercase terms. Tokens are maximal runs of
/// alphanumeric characters; everything else separates. No stemming or
/// stopword removal: search is exact-token intersection.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_non_alphanumeric_runs() {
        let t = tokenize("Cats, dogs -- and 42 birds!");
        assert_eq!(t, vec!["cats", "dogs", "and", "42", "birds"]);
    }

    #[test]
    fn lowercases_and_drops_empty() {
        assert_eq!(tokenize("  ...  HELLO..World  "), vec!["hello", "world"]);
        assert!(tokenize("!!! --- ???").is_empty());
    }
}
