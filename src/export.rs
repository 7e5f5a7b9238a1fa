//! Shopping-list export surfaces.
//!
//! Two purely textual renderings of a [`ShoppingList`]:
//!
//! - a compact share format (numbered list with totals) for messaging apps,
//!   plus the WhatsApp/mailto URLs that carry it, and
//! - a sectioned document format that groups items into store-aisle
//!   categories by keyword, suitable for printing.
//!
//! Both are formatting only; no business logic lives here, and deleted
//! items are always excluded.

use crate::model::{ShoppingList, ShoppingListItem};

const APP_NAME: &str = "Mealsmith";

const SEPARATOR: &str = "━━━━━━━━━━━━━━━━━━━━━";

/// Render the compact share text.
///
/// With `only_unowned` set, items the user already owns are skipped along
/// with deleted ones; the totals line reflects exactly the items printed.
pub fn share_text(list: &ShoppingList, only_unowned: bool) -> String {
    let items: Vec<&ShoppingListItem> = list
        .items
        .iter()
        .filter(|item| !item.deleted && !(only_unowned && item.owned))
        .collect();

    let mut out = format!("🛒 Shopping List - {APP_NAME}\n{SEPARATOR}\n\n");

    for (index, item) in items.iter().enumerate() {
        out.push_str(&format!(
            "{}. {}\n   {:.0}{} • €{:.2}\n\n",
            index + 1,
            item.display_name,
            item.total_quantity,
            item.unit,
            item.estimated_price_eur
        ));
    }

    let total: f64 = items.iter().map(|item| item.estimated_price_eur).sum();
    out.push_str(&format!(
        "{SEPARATOR}\nTotal: €{:.2}\nItems: {}\n",
        total,
        items.len()
    ));
    out
}

/// WhatsApp deep link carrying the share text.
pub fn whatsapp_share_url(text: &str) -> String {
    format!("https://wa.me/?text={}", urlencoding::encode(text))
}

/// `mailto:` URL carrying the share text.
pub fn email_share_url(subject: &str, body: &str) -> String {
    format!(
        "mailto:?subject={}&body={}",
        urlencoding::encode(subject),
        urlencoding::encode(body)
    )
}

/// Store-aisle buckets used by the document export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Produce,
    MeatSeafood,
    DairyEggs,
    GrainsPasta,
    Pantry,
    Other,
}

impl Category {
    /// Every category in rendering order.
    pub const ALL: [Category; 6] = [
        Category::Produce,
        Category::MeatSeafood,
        Category::DairyEggs,
        Category::GrainsPasta,
        Category::Pantry,
        Category::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Produce => "Produce",
            Category::MeatSeafood => "Meat & Seafood",
            Category::DairyEggs => "Dairy & Eggs",
            Category::GrainsPasta => "Grains & Pasta",
            Category::Pantry => "Pantry",
            Category::Other => "Other",
        }
    }
}

const PRODUCE_KEYWORDS: &[&str] = &[
    "tomat", "onion", "garlic", "pepper", "lettuce", "carrot", "cucumber", "spinach", "mushroom",
];
const MEAT_KEYWORDS: &[&str] = &[
    "chicken", "beef", "pork", "fish", "salmon", "shrimp", "meat", "turkey",
];
const DAIRY_KEYWORDS: &[&str] = &["milk", "cheese", "yogurt", "butter", "cream", "egg"];
const GRAIN_KEYWORDS: &[&str] = &["rice", "pasta", "bread", "flour", "oat", "quinoa"];
const PANTRY_KEYWORDS: &[&str] = &[
    "oil", "salt", "spice", "sauce", "vinegar", "sugar", "honey",
];

/// Naive keyword bucketing of an ingredient name.
///
/// First matching bucket wins, checked in aisle order; "pepper" is treated
/// as produce, not a pantry spice.
pub fn classify(display_name: &str) -> Category {
    let name = display_name.to_lowercase();
    let matches = |keywords: &[&str]| keywords.iter().any(|k| name.contains(k));

    if matches(PRODUCE_KEYWORDS) {
        Category::Produce
    } else if matches(MEAT_KEYWORDS) {
        Category::MeatSeafood
    } else if matches(DAIRY_KEYWORDS) {
        Category::DairyEggs
    } else if matches(GRAIN_KEYWORDS) {
        Category::GrainsPasta
    } else if matches(PANTRY_KEYWORDS) {
        Category::Pantry
    } else {
        Category::Other
    }
}

/// Group the visible (non-deleted) items into aisle sections.
///
/// Empty categories are omitted; item order within a section follows the
/// list's own (name-sorted) order.
pub fn document_sections(list: &ShoppingList) -> Vec<(Category, Vec<&ShoppingListItem>)> {
    let mut sections: Vec<(Category, Vec<&ShoppingListItem>)> =
        Category::ALL.iter().map(|c| (*c, Vec::new())).collect();

    for item in list.items.iter().filter(|item| !item.deleted) {
        let category = classify(&item.display_name);
        sections
            .iter_mut()
            .find(|(c, _)| *c == category)
            .expect("every category is pre-seeded")
            .1
            .push(item);
    }

    sections.retain(|(_, items)| !items.is_empty());
    sections
}

/// Render the sectioned shopping document.
pub fn document_text(list: &ShoppingList) -> String {
    let visible: Vec<&ShoppingListItem> =
        list.items.iter().filter(|item| !item.deleted).collect();

    let mut out = format!(
        "Shopping List\n{APP_NAME} - {}\n\n",
        list.generated_at.format("%Y-%m-%d")
    );

    out.push_str("Summary\n");
    out.push_str(&format!("  Items: {}\n", visible.len()));
    out.push_str(&format!("  Plan cost: €{:.2}\n", list.summary.plan_cost_eur));
    out.push_str(&format!(
        "  Total cost: €{:.2}\n",
        list.summary.total_shopping_cost_eur
    ));
    if list.summary.waste_cost_eur > 0.0 {
        out.push_str(&format!(
            "  Estimated waste: €{:.2}\n",
            list.summary.waste_cost_eur
        ));
    }
    out.push('\n');

    for (category, items) in document_sections(list) {
        out.push_str(&format!("{}\n", category.label()));
        for item in items {
            let mut quantity = format!("{:.0}{}", item.total_quantity, item.unit);
            if item.minimum_purchase_quantity > item.total_quantity {
                quantity.push_str(&format!(
                    " (min {:.0}{})",
                    item.minimum_purchase_quantity, item.unit
                ));
            }
            out.push_str(&format!(
                "  [ ] {} | {} | €{:.2}\n",
                item.display_name, quantity, item.estimated_price_eur
            ));
        }
        out.push('\n');
    }

    out.push_str(&format!(
        "Total: €{:.2}\n\nPrices are estimates based on regional averages. \
         Actual costs may vary by store and location.\n",
        list.summary.total_shopping_cost_eur
    ));
    out
}
