//! Keyword and phrase tables.
//!
//! All entries are already in [`normalize`](crate::normalize::normalize)d
//! form and are matched with [`contains_term`](crate::normalize::contains_term):
//! a trailing `*` matches a word prefix, anything else matches whole words.
//! Tables cover German and English.

// ---------------------------------------------------------------------------
// Intent
// ---------------------------------------------------------------------------

pub const PREMIUM_WORDS: &[&str] = &[
    "premium",
    "hochwertig*",
    "beste",
    "bestes",
    "besten",
    "bester",
    "qualität",
    "qualitaet",
    "luxus*",
    "luxury",
    "teuer",
    "teure*",
    "teuerste*",
    "best",
    "high end",
    "highend",
    "top qualität",
    "expensive",
    "most expensive",
    "finest",
];

/// Phrases that contain premium words but mean the opposite.
pub const PREMIUM_NEGATIONS: &[&str] = &[
    "nicht zu teuer",
    "nicht so teuer",
    "nicht teuer",
    "not too expensive",
    "not expensive",
    "inexpensive",
];

pub const BARGAIN_WORDS: &[&str] = &[
    "billig*",
    "günstig*",
    "guenstig*",
    "gunstig*",
    "preiswert*",
    "discount",
    "spar*",
    "rabatt*",
    "deal",
    "deals",
    "bargain*",
    "cheap*",
    "affordable",
    "budget friendly",
    "sale",
    "angebot*",
];

pub const GIFT_WORDS: &[&str] = &[
    "geschenk*",
    "gift*",
    "präsent*",
    "praesent*",
    "present",
    "mitbringsel",
    "überraschung",
];

pub const BUNDLE_WORDS: &[&str] = &[
    "bundle*",
    "set",
    "sets",
    "paket*",
    "combo*",
    "kombi*",
    "komplettset",
];

pub const EXPLORE_WORDS: &[&str] = &[
    "zeig mir was",
    "zeig mal was",
    "inspiration",
    "inspire me",
    "zeige mir",
    "zeig mir",
    "was hast du",
    "was gibt es",
    "was habt ihr",
    "stöbern",
    "umschauen",
    "show me",
    "what do you have",
    "browse",
    "ideas",
    "ideen",
];

/// Leading phrases of "show me X" requests.
pub const SHOW_ME_PATTERNS: &[&str] = &["zeige mir", "zeig mir", "zeig mal", "show me"];

pub const MOST_EXPENSIVE_PATTERNS: &[&str] = &[
    "teuerste*",
    "am teuersten",
    "most expensive",
    "priciest",
    "highest price",
];

pub const CHEAPEST_PATTERNS: &[&str] = &[
    "günstigste*",
    "guenstigste*",
    "gunstigste*",
    "billigste*",
    "preiswerteste*",
    "am günstigsten",
    "am guenstigsten",
    "so billig wie möglich",
    "so günstig wie möglich",
    "cheapest",
    "lowest price",
    "most affordable",
];

// ---------------------------------------------------------------------------
// Budget
// ---------------------------------------------------------------------------

/// Explicit budget vocabulary (not including cheap/bargain wording).
pub const BUDGET_WORDS: &[&str] = &[
    "budget",
    "preis",
    "preise",
    "preisrahmen",
    "preislimit",
    "preisspanne",
    "preisgrenze",
    "obergrenze",
    "untergrenze",
    "kosten",
    "kostet",
    "ausgeben",
    "price",
    "prices",
    "price range",
    "cost",
    "costs",
    "spend",
];

pub const CURRENCY_WORDS: &[&str] = &[
    "eur", "euro", "euros", "€", "bucks", "dollar", "dollars", "usd", "chf", "franken",
];

pub const UNDER_WORDS: &[&str] = &[
    "unter",
    "under",
    "below",
    "bis",
    "up to",
    "max",
    "maximal",
    "maximum",
    "höchstens",
    "hoechstens",
    "hochstens",
    "at most",
    "weniger als",
    "less than",
    "no more than",
    "nicht mehr als",
];

pub const OVER_WORDS: &[&str] = &[
    "über",
    "ueber",
    "uber",
    "over",
    "above",
    "mindestens",
    "at least",
    "mehr als",
    "more than",
    "ab",
    "from",
    "minimum",
];

/// Phrases that contain an [`OVER_WORDS`] entry but set a ceiling.
pub const NEGATED_OVER_PHRASES: &[&str] = &["nicht mehr als", "no more than", "nicht über"];

pub const BETWEEN_WORDS: &[&str] = &["zwischen", "between"];

pub const APPROX_WORDS: &[&str] = &[
    "circa",
    "ca",
    "zirka",
    "ungefähr",
    "ungefaehr",
    "etwa",
    "rund",
    "um die",
    "around",
    "about",
    "approximately",
    "roughly",
];

pub const CHEAP_WORDS: &[&str] = &[
    "günstig*",
    "guenstig*",
    "billig*",
    "preiswert*",
    "erschwinglich*",
    "nicht zu teuer",
    "cheap*",
    "affordable",
    "inexpensive",
    "not too expensive",
];

pub const SMALL_BUDGET_PHRASES: &[&str] = &[
    "kleines budget",
    "kleinen budget",
    "wenig geld",
    "knappes budget",
    "knappen budget",
    "schmales budget",
    "small budget",
    "tight budget",
    "low budget",
    "not much money",
];

/// Words marking a number as a physical size rather than a price.
pub const UNIT_WORDS: &[&str] = &["zoll", "inch", "inches", "cm", "mm"];

// ---------------------------------------------------------------------------
// Noise words excluded from keyword and unknown-term extraction
// ---------------------------------------------------------------------------

pub const QUERY_STOPWORDS: &[&str] = &[
    // de
    "der", "die", "das", "den", "dem", "des", "ein", "eine", "einen", "einem", "einer", "eines",
    "und", "oder", "mit", "ohne", "für", "fuer", "von", "vom", "zum", "zur", "auf", "aus", "bei",
    "nach", "was", "wie", "wer", "ich", "mir", "mich", "mein", "meine", "meinen", "meiner",
    "mein", "du", "dir", "ihr", "euch", "sie", "wir", "uns", "ist", "sind", "hast", "habt",
    "habe", "haben", "gibt", "gib", "bitte", "auch", "noch", "mal", "nur", "sehr", "gerne",
    "etwas", "welche", "welcher", "welches", "suche", "such", "brauche", "möchte", "moechte",
    "will", "hätte", "haette", "gern", "kannst", "kann", "zeig", "zeige", "zeigen", "nicht",
    "kein", "keine", "dies", "diese", "dieser", "dieses", "jetzt", "hier", "dort", "liegt",
    "dafür", "damit", "alle", "alles", "viel", "viele", "neue", "neuen", "neues", "produkt",
    "produkte", "artikel", "etwa", "circa", "zirka", "rund", "ungefähr", "ungefaehr",
    // en
    "the", "and", "for", "with", "without", "from", "you", "your", "have", "has", "any",
    "some", "something", "please", "want", "need", "looking", "look", "show", "find", "get",
    "give", "can", "could", "would", "like", "what", "which", "that", "this", "these", "those",
    "are", "is", "was", "all", "just", "only", "also", "very", "new", "one", "ones", "item",
    "items", "product", "products", "about", "around", "roughly", "approximately", "not",
    "too", "much", "than", "into", "buy", "shop", "recommend",
];

/// Words that carry intent, not product meaning.
pub const INTENT_WORDS: &[&str] = &[
    "billig", "billige", "billiger", "billiges", "billigste", "billigstes", "billigsten",
    "günstig", "günstige", "günstiger", "günstiges", "günstigste", "günstigstes",
    "günstigsten", "guenstig", "guenstige", "guenstigste", "guenstigsten", "preiswert",
    "preiswerte", "preiswertes", "preiswerteste", "teuer", "teure", "teures", "teuerste",
    "teuersten", "teuerstes", "premium", "hochwertig", "hochwertige", "hochwertiges", "beste",
    "besten", "bestes", "luxus", "qualität", "qualitaet", "geschenk", "geschenke",
    "geschenkidee", "inspiration", "angebot", "angebote", "rabatt", "deal", "deals", "cheap",
    "cheaper", "cheapest", "expensive", "priciest", "best", "luxury", "gift", "gifts", "bargain",
    "affordable", "discount", "sale", "present", "ideas", "ideen", "browse", "highend",
    "erschwinglich", "erschwingliche", "inexpensive",
];

/// Budget vocabulary dropped from unknown-term escalation.
pub const BUDGET_STOPWORDS: &[&str] = &[
    "mein", "meine", "meinen", "meiner", "budget", "preis", "preise", "kosten", "kostet",
    "liegt", "zwischen", "unter", "über", "ueber", "uber", "bis", "ab", "von", "und", "oder",
    "euro", "euros", "eur", "€", "dollar", "dollars", "usd", "bucks", "under", "over", "between",
    "below", "above", "max", "maximal", "maximum", "minimum", "mindestens", "höchstens",
    "hoechstens", "price", "prices", "cost", "costs", "spend", "ausgeben", "range", "least",
    "most", "less", "more", "mehr", "weniger", "als", "upto", "franken", "chf", "geld",
    "money", "kleines", "small", "tight", "low",
];

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// Category hint keys and the words that suggest them.
///
/// Single words match as a word prefix ("snowboards" hints `snowboard`),
/// so risky keys carry a negative word list in [`CATEGORY_NEGATIVE_WORDS`].
/// Multi-word entries match as whole phrases.
pub const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "elektronik",
        &[
            "elektronik", "electronics", "smartphone", "handy", "fernseher", "laptop",
            "kopfhörer", "headphones", "tablet", "kamera", "camera",
        ],
    ),
    (
        "mode",
        &[
            "mode", "fashion", "kleidung", "bekleidung", "jeans", "hose", "t shirt", "shirt",
            "jacke", "hoodie", "pullover", "kleid", "clothing",
        ],
    ),
    ("snowboard", &["snowboard"]),
    ("bindungen", &["bindung", "binding"]),
    (
        "haushalt",
        &["haushalt", "household", "wasserkocher", "kettle", "toaster", "reiniger", "putz"],
    ),
    (
        "pflege",
        &["pflege", "skincare", "hautpflege", "creme", "lotion", "duschgel", "shampoo"],
    ),
    (
        "kosmetik",
        &["kosmetik", "cosmetic", "makeup", "make up", "lippenstift", "mascara", "beauty"],
    ),
    (
        "tierbedarf",
        &[
            "tierbedarf", "haustier", "hund", "katze", "napf", "leckerli", "futter", "pet",
            "dog", "cat",
        ],
    ),
    ("perfume", &["parfum", "parfüm", "perfume", "duft", "eau de"]),
    ("garten", &["garten", "garden", "rasen", "pflanze", "gießkanne"]),
    ("werkzeug", &["werkzeug", "tool", "bohrer", "schraub", "hammer", "akkuschrauber"]),
];

/// Words that contain a hint keyword without meaning that category.
pub const CATEGORY_NEGATIVE_WORDS: &[(&str, &[&str])] = &[
    (
        "mode",
        &["modern", "moderne", "moderner", "modernes", "modernen", "modell", "modelle", "modem"],
    ),
    ("elektronik", &["handyhülle"]),
    ("tierbedarf", &["catalog", "category", "kategorie", "hundert", "petrol", "petit"]),
    ("werkzeug", &["toolbar"]),
    ("perfume", &["duftkerze", "duftkerzen", "duftbaum"]),
];

/// Names a hint key is known by in catalogs, in preference order.
pub const CATEGORY_SYNONYMS: &[(&str, &[&str])] = &[
    ("elektronik", &["elektronik", "electronics", "elektro", "technik"]),
    ("mode", &["mode", "fashion", "bekleidung", "kleidung", "clothing", "apparel"]),
    ("snowboard", &["snowboard", "snowboards", "snowboarding"]),
    ("bindungen", &["bindungen", "bindung", "bindings"]),
    ("haushalt", &["haushalt", "household", "home", "küche", "kitchen"]),
    ("pflege", &["pflege", "körperpflege", "skincare", "skin care", "body care", "beauty"]),
    ("kosmetik", &["kosmetik", "cosmetics", "beauty", "makeup"]),
    (
        "tierbedarf",
        &["tierbedarf", "haustier", "haustiere", "pet", "pets", "pet supplies", "pet care"],
    ),
    ("perfume", &["perfume", "parfum", "parfüm", "düfte", "fragrance"]),
    ("garten", &["garten", "garden"]),
    ("werkzeug", &["werkzeug", "werkzeuge", "tools"]),
];

/// Unambiguous product nouns that decide the category outright.
pub const CATEGORY_OVERRIDES: &[(&[&str], &str)] = &[
    (&["wasserkocher", "kettle", "electric kettle"], "haushalt"),
    (
        &["smartphone", "smartphones", "handy", "iphone", "phone", "phones"],
        "elektronik",
    ),
    (&["jeans"], "mode"),
];

/// Categories whose products are meant for human skin.
pub const HUMAN_SKIN_CATEGORIES: &[&str] = &[
    "kosmetik", "cosmetic", "beauty", "pflege", "haut", "gesicht", "body", "skin", "skincare",
    "drogerie",
];

/// Category words that mark pet products.
pub const PET_CATEGORY_WORDS: &[&str] = &["tier", "pet", "hund", "katze", "dog", "cat"];

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

/// Multi-word attribute phrases, extracted before tokenization.
pub const ATTRIBUTE_PHRASES: &[&str] = &[
    "trockene haut",
    "empfindliche haut",
    "sensible haut",
    "fettige haut",
    "reife haut",
    "trockene haare",
    "für herren",
    "für damen",
    "für kinder",
    "für männer",
    "für frauen",
    "für bad",
    "für das bad",
    "für die küche",
    "für küche",
    "für wohnung",
    "für haustiere",
    "für hunde",
    "für katzen",
    "dry skin",
    "sensitive skin",
    "oily skin",
    "mature skin",
    "combination skin",
    "dry hair",
    "for men",
    "for women",
    "for kids",
    "for children",
    "for dogs",
    "for cats",
    "for pets",
    "for the kitchen",
    "for the bathroom",
];

/// Single words that describe rather than name a product.
pub const ATTRIBUTE_KEYWORDS: &[&str] = &[
    "trockene", "trocken", "empfindliche", "sensible", "fettige", "herren", "damen", "kinder",
    "männer", "frauen", "vegan", "bio", "organic", "xxl", "haut", "haare", "bad", "küche",
    "wohnung", "dry", "sensitive", "oily", "mature", "men", "women", "kids", "children", "skin",
    "hair", "unisex", "baby",
];

// ---------------------------------------------------------------------------
// Domain special cases
// ---------------------------------------------------------------------------

pub const WAX_WORDS: &[&str] = &["wachs*", "wax*"];

pub const WAX_HAIR_KEYWORDS: &[&str] = &[
    "haar*", "frisur*", "styling", "pomade", "hair", "gel", "haarwachs", "hairstyle", "stylen",
];

pub const WAX_SNOWBOARD_KEYWORDS: &[&str] = &[
    "snowboard*", "ski", "skier", "belag", "board", "piste", "kanten", "skiwachs", "winter",
    "gleitwachs", "heißwachs",
];

pub const WAX_HAIR_NEGATIONS: &[&str] = &[
    "nicht für haare",
    "nicht für die haare",
    "kein haarwachs",
    "not for hair",
    "no hair wax",
];

pub const PERFUME_QUERY_WORDS: &[&str] = &[
    "parfum*", "parfüm*", "perfume*", "duft", "düfte", "eau de", "fragrance*", "cologne",
];

pub const PERFUME_PRODUCT_WORDS: &[&str] = &[
    "parfum*", "parfüm*", "perfume*", "eau de parfum", "eau de toilette", "eau de cologne",
    "fragrance*", "duft", "edp", "edt",
];

/// Terms that look like a perfume but are not one.
pub const PERFUME_PRODUCT_NEGATIONS: &[&str] = &[
    "duftkerze*", "raumduft*", "duftbaum*", "weichspüler", "waschmittel*", "candle*",
    "air freshener",
];

// ---------------------------------------------------------------------------
// Explanation follow-ups
// ---------------------------------------------------------------------------

pub const EXPLAIN_INGREDIENT_WORDS: &[&str] = &[
    "inhaltsstoffe",
    "zutaten",
    "was ist drin",
    "was ist da drin",
    "ingredients",
    "what is in it",
    "whats in it",
];

pub const EXPLAIN_USAGE_WORDS: &[&str] = &[
    "wie benutze",
    "wie verwende",
    "wie wende",
    "anwendung",
    "wie trage",
    "how do i use",
    "how to use",
    "how should i use",
];

pub const EXPLAIN_WASHING_WORDS: &[&str] = &[
    "waschen",
    "waschbar",
    "wie wasche",
    "pflegehinweis*",
    "how do i wash",
    "how to wash",
    "washable",
];

pub fn is_noise_word(token: &str) -> bool {
    QUERY_STOPWORDS.contains(&token)
        || INTENT_WORDS.contains(&token)
        || BUDGET_STOPWORDS.contains(&token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    fn assert_normalized(table: &[&str]) {
        for entry in table {
            let bare = entry.trim_end_matches('*');
            assert_eq!(normalize(bare), bare, "entry not normalized: {:?}", entry);
        }
    }

    #[test]
    fn test_tables_are_normalized() {
        for table in [
            PREMIUM_WORDS,
            BARGAIN_WORDS,
            GIFT_WORDS,
            BUNDLE_WORDS,
            EXPLORE_WORDS,
            BUDGET_WORDS,
            UNDER_WORDS,
            OVER_WORDS,
            APPROX_WORDS,
            CHEAP_WORDS,
            ATTRIBUTE_PHRASES,
            CHEAPEST_PATTERNS,
            MOST_EXPENSIVE_PATTERNS,
            WAX_HAIR_NEGATIONS,
        ] {
            assert_normalized(table);
        }
        for (key, words) in CATEGORY_KEYWORDS {
            assert_normalized(&[*key]);
            assert_normalized(words);
        }
    }

    #[test]
    fn test_every_hint_key_has_synonyms() {
        for (key, _) in CATEGORY_KEYWORDS {
            assert!(
                CATEGORY_SYNONYMS.iter().any(|(k, _)| k == key),
                "missing synonyms for {}",
                key
            );
        }
    }

    #[test]
    fn test_noise_words() {
        assert!(is_noise_word("the"));
        assert!(is_noise_word("cheapest"));
        assert!(is_noise_word("euros"));
        assert!(!is_noise_word("snowboard"));
    }
}
