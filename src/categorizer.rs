// 🏷️ Ingredient Categorizer - Keyword lists as data
// Substring matching of ingredient names against fixed shopping-aisle keywords

use crate::models::GroceryCategory;

// ============================================================================
// KEYWORD LISTS
// ============================================================================

// Every keyword must reach its own rule: a keyword containing an earlier
// rule's keyword would be dead ("peanut butter" is dairy through "butter",
// "ice cream" through "cream"). test_every_keyword_reaches_its_rule checks it.

const PRODUCE: &[&str] = &[
    "lettuce", "tomato", "onion", "garlic", "potato", "carrot", "celery", "cucumber",
    "spinach", "kale", "broccoli", "cauliflower", "zucchini", "squash", "mushroom",
    "bell pepper", "jalapeno", "avocado", "lemon", "lime", "apple", "banana", "orange",
    "berries", "strawberr", "blueberr", "grape", "cilantro", "parsley", "basil", "mint",
    "ginger", "scallion", "shallot", "cabbage", "sweet corn", "corn on the cob", "asparagus",
    "eggplant", "fruit", "vegetable",
];

const DAIRY: &[&str] = &[
    "milk", "cheese", "butter", "cream", "yogurt", "egg", "mozzarella", "parmesan",
    "cheddar", "ricotta", "half and half",
];

const MEAT: &[&str] = &[
    "chicken", "beef", "pork", "turkey", "bacon", "sausage", "lamb", "steak", "ground meat",
    "fish", "salmon", "tuna", "shrimp", "cod", "prosciutto", "chorizo",
];

const FROZEN: &[&str] = &["frozen", "popsicle"];

const PANTRY: &[&str] = &[
    "flour", "sugar", "salt", "oil", "vinegar", "rice", "pasta", "noodle", "bean", "lentil",
    "sauce", "broth", "stock", "spice", "cumin", "paprika", "cinnamon", "oregano", "honey",
    "syrup", "oats", "cereal", "bread", "tortilla", "canned", "baking", "yeast", "vanilla",
    "ketchup", "mustard", "mayonnaise", "soy", "nuts", "cornstarch", "cornmeal",
];

// ============================================================================
// RULE DEFINITION
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct KeywordRule {
    pub category: GroceryCategory,
    pub keywords: &'static [&'static str],
}

impl KeywordRule {
    /// Check if any keyword is contained in the (already lower-cased) name
    pub fn matches(&self, name_lower: &str) -> bool {
        self.keywords.iter().any(|k| name_lower.contains(k))
    }
}

/// Match priority. Frozen is tested before pantry, while pantry is
/// displayed before frozen.
pub const MATCH_PRIORITY: [KeywordRule; 5] = [
    KeywordRule { category: GroceryCategory::Produce, keywords: PRODUCE },
    KeywordRule { category: GroceryCategory::Dairy, keywords: DAIRY },
    KeywordRule { category: GroceryCategory::Meat, keywords: MEAT },
    KeywordRule { category: GroceryCategory::Frozen, keywords: FROZEN },
    KeywordRule { category: GroceryCategory::Pantry, keywords: PANTRY },
];

/// Assign a shopping category. First matching rule wins; no match is Other.
/// Never returns Beverages or VerifyPantry.
pub fn categorize(name: &str) -> GroceryCategory {
    let name_lower = name.trim().to_lowercase();

    MATCH_PRIORITY
        .iter()
        .find(|rule| rule.matches(&name_lower))
        .map(|rule| rule.category)
        .unwrap_or(GroceryCategory::Other)
}

// ============================================================================
// TESTS
// ============================================================================
