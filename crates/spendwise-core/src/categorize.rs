//! Keyword category classifier
//!
//! Offline fallback for category suggestion. Groups are checked in a fixed
//! order and the first group with a matching keyword wins.

use crate::error::{Error, Result};
use crate::models::Category;

/// Longest description accepted for classification (in characters)
pub const MAX_DESCRIPTION_CHARS: usize = 200;

const KEYWORD_GROUPS: &[(Category, &[&str])] = &[
    (
        Category::Food,
        &[
            "coffee", "food", "restaurant", "lunch", "dinner", "breakfast", "pizza", "burger",
            "meal", "snack", "grocery", "market",
        ],
    ),
    (
        Category::Transportation,
        &[
            "uber", "taxi", "bus", "train", "metro", "fuel", "gas", "petrol", "parking", "flight",
            "car",
        ],
    ),
    (
        Category::Shopping,
        &[
            "shop", "buy", "purchase", "store", "mall", "online", "amazon", "flipkart", "clothes",
            "shoes",
        ],
    ),
    (
        Category::Entertainment,
        &[
            "movie", "cinema", "netflix", "spotify", "game", "concert", "show", "party", "club",
        ],
    ),
    (
        Category::Bills,
        &[
            "bill",
            "electricity",
            "water",
            "internet",
            "phone",
            "rent",
            "emi",
            "subscription",
            "insurance",
        ],
    ),
    (
        Category::Healthcare,
        &[
            "doctor", "hospital", "medicine", "pharmacy", "medical", "health", "clinic", "dentist",
        ],
    ),
];

/// Classify by substring keyword match over the lower-cased text
pub fn classify_by_keywords(description: &str) -> Category {
    let text = description.to_lowercase();

    KEYWORD_GROUPS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Other)
}

/// Reject empty or overlong descriptions, returning the trimmed text
pub fn validate_description(description: &str) -> Result<&str> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("Description is required".into()));
    }
    if trimmed.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(Error::InvalidInput(format!(
            "Description too long (max {} characters)",
            MAX_DESCRIPTION_CHARS
        )));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_groups() {
        assert_eq!(classify_by_keywords("uber ride to airport"), Category::Transportation);
        assert_eq!(classify_by_keywords("Coffee at Starbucks"), Category::Food);
        assert_eq!(classify_by_keywords("Netflix monthly"), Category::Entertainment);
        assert_eq!(classify_by_keywords("electricity"), Category::Bills);
        assert_eq!(classify_by_keywords("dentist visit"), Category::Healthcare);
        assert_eq!(classify_by_keywords("new shoes"), Category::Shopping);
        assert_eq!(classify_by_keywords("gift for mom"), Category::Other);
    }

    #[test]
    fn test_first_group_wins() {
        // "grocery" (Food) is checked before "online" (Shopping)
        assert_eq!(classify_by_keywords("online grocery order"), Category::Food);
        // "netflix subscription" hits Entertainment before Bills
        assert_eq!(classify_by_keywords("netflix subscription"), Category::Entertainment);
    }

    #[test]
    fn test_validate_description() {
        assert_eq!(validate_description("  lunch  ").unwrap(), "lunch");
        assert!(matches!(validate_description("   "), Err(Error::InvalidInput(_))));
        assert!(validate_description(&"a".repeat(200)).is_ok());
        assert!(validate_description(&"a".repeat(201)).is_err());
        // Multi-byte characters are counted as characters
        assert!(validate_description(&"₹".repeat(200)).is_ok());
    }
}
