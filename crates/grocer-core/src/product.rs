use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Display value used when a product has no store on record.
pub const UNKNOWN_STORE: &str = "Unknown Store";
/// Display value used when a product has no brand on record.
pub const UNKNOWN_BRAND: &str = "Unknown Brand";

/// Metadata key holding the product price.
pub const PRICE_KEY: &str = "price";
/// Metadata key holding the store name.
pub const STORE_KEY: &str = "store";
/// Metadata key holding the brand name.
pub const BRAND_KEY: &str = "brand";

/// Typed view over a product's loose metadata record.
///
/// Construction never fails: missing, null or malformed fields fall back to
/// `0.0` for the price and to [`UNKNOWN_STORE`] / [`UNKNOWN_BRAND`] for the
/// display strings.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductMetadata {
    /// Non-negative price.
    pub price: f64,
    /// Store display name.
    pub store: String,
    /// Brand display name.
    pub brand: String,
}

impl ProductMetadata {
    /// Creates metadata from already-normalized values.
    pub fn new(price: f64, store: impl Into<String>, brand: impl Into<String>) -> Self {
        Self {
            price: sanitize_price(price),
            store: store.into(),
            brand: brand.into(),
        }
    }

    /// Reads a metadata map, substituting defaults for anything unusable.
    pub fn from_map(map: &HashMap<String, Value>) -> Self {
        Self {
            price: map.get(PRICE_KEY).map(price_from_value).unwrap_or(0.0),
            store: display_from_value(map.get(STORE_KEY), UNKNOWN_STORE),
            brand: display_from_value(map.get(BRAND_KEY), UNKNOWN_BRAND),
        }
    }

    /// Renders the metadata back into the map shape stored alongside vectors.
    pub fn to_map(&self) -> HashMap<String, Value> {
        let mut map = HashMap::with_capacity(3);
        map.insert(PRICE_KEY.to_string(), Value::from(self.price));
        map.insert(STORE_KEY.to_string(), Value::from(self.store.clone()));
        map.insert(BRAND_KEY.to_string(), Value::from(self.brand.clone()));
        map
    }
}

impl Default for ProductMetadata {
    fn default() -> Self {
        Self {
            price: 0.0,
            store: UNKNOWN_STORE.to_string(),
            brand: UNKNOWN_BRAND.to_string(),
        }
    }
}

/// Parses a raw price cell such as `"$4.99"`.
///
/// Currency symbols and surrounding whitespace are stripped; anything that
/// still fails to parse, or parses to a negative or non-finite number,
/// becomes `0.0`.
pub fn parse_price(raw: &str) -> f64 {
    let cleaned = raw.trim().replace('$', "");
    cleaned
        .trim()
        .parse::<f64>()
        .map(sanitize_price)
        .unwrap_or(0.0)
}

fn sanitize_price(price: f64) -> f64 {
    if price.is_finite() && price >= 0.0 {
        price
    } else {
        0.0
    }
}

fn price_from_value(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().map(sanitize_price).unwrap_or(0.0),
        Value::String(s) => parse_price(s),
        _ => 0.0,
    }
}

fn display_from_value(value: Option<&Value>, fallback: &str) -> String {
    let rendered = match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    };
    if rendered.is_empty() {
        fallback.to_string()
    } else {
        rendered
    }
}

/// A catalog entry as returned by a full catalog fetch: identifier, document
/// text and raw metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogDocument {
    /// Stable identifier assigned at ingestion.
    pub id: String,
    /// Product name as indexed.
    pub text: String,
    /// Loose metadata record (`price`, `store`, `brand`).
    pub metadata: HashMap<String, Value>,
}

/// A nearest-neighbor hit returned by a semantic query.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticHit {
    /// Stable identifier of the matched entry.
    pub id: String,
    /// Document text; may be empty if the index holds a blank document.
    pub text: String,
    /// Loose metadata record.
    pub metadata: HashMap<String, Value>,
    /// Embedding distance to the query (lower is closer).
    pub distance: f32,
}

/// Which part of the merged list an item came from.
///
/// The declaration order is the merge order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Bucket {
    /// Literal match whose name starts with the whole query.
    PriorityLiteral,
    /// Literal match that is not a prefix match.
    NormalLiteral,
    /// Nearest-neighbor match from the semantic index.
    Semantic,
}

/// A single search result as returned to callers.
///
/// Only `name`, `price`, `store` and `brand` are serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultItem {
    /// Product name.
    pub name: String,
    /// Product price (0.0 when unknown).
    pub price: f64,
    /// Store display name.
    pub store: String,
    /// Brand display name.
    pub brand: String,
    /// Catalog identifier of the source entry.
    #[serde(skip)]
    pub id: Option<String>,
    /// Bucket the item was produced in.
    #[serde(skip)]
    pub bucket: Bucket,
}

impl ResultItem {
    /// Builds a result item by copying a name and defaulted metadata.
    pub fn from_parts(
        id: Option<String>,
        name: impl Into<String>,
        metadata: &HashMap<String, Value>,
        bucket: Bucket,
    ) -> Self {
        let meta = ProductMetadata::from_map(metadata);
        Self {
            name: name.into(),
            price: meta.price,
            store: meta.store,
            brand: meta.brand,
            id,
            bucket,
        }
    }
}
