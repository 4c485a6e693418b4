//! Named queries over the `good` index.

use crate::mapping::{FieldMapping, IndexDefinition, IndexMapping, IndexSettings};
use crate::query::{AggregationRequest, Query};

/// Name of the index holding goods.
pub const INDEX_NAME: &str = "good";

pub const ID_FIELD: &str = "id";
pub const TITLE_FIELD: &str = "title";
pub const PRICE_FIELD: &str = "price";
pub const BRAND_FIELD: &str = "brand";

/// Analyzer of the title field.
pub const TITLE_ANALYZER: &str = "ik_max_word";

/// Name of the brand terms aggregation.
pub const BRANDS_AGGREGATION: &str = "brands";

/// Index definition of goods: one shard, no replicas, titles segmented with
/// `ik_max_word` and brands stored as exact keywords.
pub fn index_definition() -> IndexDefinition {
    IndexDefinition::new(
        INDEX_NAME,
        IndexSettings::new(1, 0),
        IndexMapping::new()
            .field(ID_FIELD, FieldMapping::long())
            .field(TITLE_FIELD, FieldMapping::text(TITLE_ANALYZER))
            .field(PRICE_FIELD, FieldMapping::double())
            .field(BRAND_FIELD, FieldMapping::keyword()),
    )
}

/// Goods priced between `low` and `high`, both inclusive.
pub fn price_between(low: f64, high: f64) -> Query {
    Query::between(PRICE_FIELD, low, high)
}

/// Goods whose title shares an analysed token with `text`.
pub fn title_matches(text: &str) -> Query {
    Query::matching(TITLE_FIELD, text)
}

/// Goods whose title contains the indexed token `term`, without analysing it.
pub fn title_term(term: &str) -> Query {
    Query::term(TITLE_FIELD, term)
}

/// Goods of exactly `brand`.
pub fn brand_is(brand: &str) -> Query {
    Query::term(BRAND_FIELD, brand)
}

/// Terms aggregation on brand, named [`BRANDS_AGGREGATION`].
pub fn brand_aggregation() -> AggregationRequest {
    AggregationRequest::terms(BRANDS_AGGREGATION, BRAND_FIELD)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::FieldKind;
    use crate::query::RangeBounds;

    #[test]
    fn test_index_definition() {
        let definition = index_definition();

        assert_eq!(definition.name, "good");
        assert_eq!(definition.settings, IndexSettings::new(1, 0));

        let title = definition.mapping.get(TITLE_FIELD).unwrap();
        assert_eq!(title.kind, FieldKind::Text);
        assert_eq!(title.analyzer.as_deref(), Some("ik_max_word"));
        assert_eq!(
            definition.mapping.get(BRAND_FIELD).unwrap().kind,
            FieldKind::Keyword
        );
        assert_eq!(
            definition.mapping.get(PRICE_FIELD).unwrap().kind,
            FieldKind::Double
        );
        assert_eq!(definition.mapping.get(ID_FIELD).unwrap().kind, FieldKind::Long);
    }

    #[test]
    fn test_price_between_is_inclusive() {
        match price_between(2000.0, 4000.0) {
            Query::Range { field, bounds } => {
                assert_eq!(field, "price");
                assert_eq!(bounds, RangeBounds::inclusive(2000.0, 4000.0));
            }
            other => panic!("expected range query, got {:?}", other),
        }
    }

    #[test]
    fn test_brand_aggregation() {
        let aggregation = brand_aggregation();
        assert_eq!(aggregation.name(), "brands");
        assert_eq!(
            aggregation,
            AggregationRequest::terms("brands", "brand")
        );
    }
}
