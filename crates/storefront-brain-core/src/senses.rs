//! Shared vocabulary with more than one meaning.
//!
//! "Wax" is hair wax or snowboard wax, "Duft" is a perfume or a scented
//! candle. These helpers decide which sense a query means and whether a
//! product belongs to it.

use serde::Serialize;

use crate::models::Product;
use crate::normalize::{contains_any, normalize, pad};
use crate::vocab::{
    PERFUME_PRODUCT_NEGATIONS, PERFUME_PRODUCT_WORDS, PERFUME_QUERY_WORDS, WAX_HAIR_KEYWORDS,
    WAX_HAIR_NEGATIONS, WAX_SNOWBOARD_KEYWORDS, WAX_WORDS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WaxSense {
    Hair,
    Snowboard,
}

/// Which wax the query means, if it mentions wax and the context decides.
pub fn detect_wax_sense(text: &str) -> Option<WaxSense> {
    let padded = pad(&normalize(text));
    if !contains_any(&padded, WAX_WORDS) {
        return None;
    }
    let negated_hair = contains_any(&padded, WAX_HAIR_NEGATIONS);
    if contains_any(&padded, WAX_SNOWBOARD_KEYWORDS) || negated_hair {
        return Some(WaxSense::Snowboard);
    }
    contains_any(&padded, WAX_HAIR_KEYWORDS).then_some(WaxSense::Hair)
}

/// Does the product belong to the other sense of "wax"?
pub fn is_wrong_wax_sense(product: &Product, sense: WaxSense) -> bool {
    let padded = pad(&product.search_blob());
    match sense {
        WaxSense::Hair => contains_any(&padded, WAX_SNOWBOARD_KEYWORDS),
        WaxSense::Snowboard => contains_any(&padded, WAX_HAIR_KEYWORDS),
    }
}

pub fn is_perfume_query(text: &str) -> bool {
    contains_any(&pad(&normalize(text)), PERFUME_QUERY_WORDS)
}

pub fn is_perfume_product(product: &Product) -> bool {
    let padded = pad(&product.search_blob());
    contains_any(&padded, PERFUME_PRODUCT_WORDS) && !contains_any(&padded, PERFUME_PRODUCT_NEGATIONS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_product(title: &str, category: &str) -> Product {
        Product {
            id: title.to_string(),
            title: title.to_string(),
            description: String::new(),
            category: category.to_string(),
            tags: Vec::new(),
            price: 10.0,
        }
    }

    #[test]
    fn test_wax_sense() {
        assert_eq!(detect_wax_sense("Wachs für die Haare"), Some(WaxSense::Hair));
        assert_eq!(detect_wax_sense("wax for my snowboard"), Some(WaxSense::Snowboard));
        assert_eq!(detect_wax_sense("Wachs, nicht für Haare"), Some(WaxSense::Snowboard));
        assert_eq!(detect_wax_sense("wachs"), None);
        assert_eq!(detect_wax_sense("haargel"), None);
    }

    #[test]
    fn test_wrong_wax_sense() {
        let hair = make_product("Styling Haarwachs", "Pflege");
        let board = make_product("Gleitwachs Universal", "Snowboard");
        assert!(is_wrong_wax_sense(&board, WaxSense::Hair));
        assert!(!is_wrong_wax_sense(&hair, WaxSense::Hair));
        assert!(is_wrong_wax_sense(&hair, WaxSense::Snowboard));
    }

    #[test]
    fn test_perfume_detection() {
        assert!(is_perfume_query("ein Parfüm für meine Frau"));
        assert!(is_perfume_query("eau de toilette"));
        assert!(!is_perfume_query("duftkerze"));

        assert!(is_perfume_product(&make_product("Eau de Parfum 50ml", "Beauty")));
        assert!(!is_perfume_product(&make_product("Duftkerze Vanille", "Wohnen")));
        assert!(!is_perfume_product(&make_product("Raumduft Lavendel mit Duft", "Wohnen")));
    }
}
