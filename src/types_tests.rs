//! Tests for core types

#[cfg(test)]
mod tests {
    use super::super::types::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_side_serialization() {
        assert_eq!(serde_json::to_string(&Side::Buy).unwrap(), "\"BUY\"");
        assert_eq!(serde_json::to_string(&Side::Sell).unwrap(), "\"SELL\"");
        let sell: Side = serde_json::from_str("\"SELL\"").unwrap();
        assert_eq!(sell, Side::Sell);
    }

    #[test]
    fn test_side_sign_and_opposite() {
        assert_eq!(Side::Buy.sign(), 1.0);
        assert_eq!(Side::Sell.sign(), -1.0);
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
    }

    #[test]
    fn test_market_lenient_fields() {
        let market: Market = serde_json::from_value(json!({
            "id": 42,
            "question": "Will it rain?",
            "conditionId": "0xabc",
            "volumeNum": "1234.5",
            "liquidity": 10,
            "spread": "0.01",
            "outcomes": "[\"Yes\", \"No\"]",
            "outcomePrices": ["0.25", "0.75"],
            "clobTokenIds": "[\"111\", \"222\"]"
        }))
        .unwrap();

        assert_eq!(market.id, "42");
        assert_eq!(market.volume_num, Some(1234.5));
        assert_eq!(market.reported_liquidity(), Some(10.0));
        assert_eq!(market.spread, Some(0.01));
        assert_eq!(market.outcomes, vec!["Yes", "No"]);
        assert_eq!(market.clob_token_ids, vec!["111", "222"]);
        assert_eq!(market.yes_price(), Some(0.25));
    }

    #[test]
    fn test_market_reported_volume_fallback() {
        let zero: Market = serde_json::from_value(json!({"volumeNum": 0, "volume": "55"})).unwrap();
        assert_eq!(zero.reported_volume(), Some(55.0));
        assert_eq!(zero.volume_or_zero(), 0.0);

        let neither: Market = serde_json::from_value(json!({"volumeNum": "n/a"})).unwrap();
        assert_eq!(neither.reported_volume(), None);
    }

    #[test]
    fn test_yes_prices_case_and_range() {
        let market: Market = serde_json::from_value(json!({
            "outcomes": [" yes ", "No", "YES"],
            "outcomePrices": ["0.4", "0.6", "1.5"]
        }))
        .unwrap();
        // out-of-range price dropped
        assert_eq!(market.yes_prices(), vec![0.4]);
    }

    #[test]
    fn test_market_text_joins_description() {
        let mut market = Market {
            question: "Q?".to_string(),
            ..Default::default()
        };
        assert_eq!(market.text(), "Q?");
        market.description = Some("details".to_string());
        assert_eq!(market.text(), "Q? details");
    }

    #[test]
    fn test_event_effective_volume() {
        let event: Event = serde_json::from_value(json!({
            "id": "1",
            "category": "  ",
            "markets": [{"volumeNum": 77}, "garbage"]
        }))
        .unwrap();
        assert_eq!(event.markets.len(), 1);
        assert_eq!(event.effective_volume(), Some(77.0));
        assert_eq!(event.category_label(), None);
    }

    #[test]
    fn test_event_volume_missing_null_and_invalid() {
        let missing: Event = serde_json::from_value(json!({"markets": [{"volumeNum": 5}]})).unwrap();
        assert_eq!(missing.volume, Reported::Missing);
        assert_eq!(missing.effective_volume(), Some(5.0));

        let null: Event = serde_json::from_value(json!({"volume": null, "markets": [{"volume": "6"}]})).unwrap();
        assert_eq!(null.effective_volume(), Some(6.0));

        let invalid: Event = serde_json::from_value(json!({"volume": "n/a", "markets": [{"volumeNum": 500}]})).unwrap();
        assert_eq!(invalid.volume, Reported::Invalid);
        assert_eq!(invalid.effective_volume(), None);

        let text: Event = serde_json::from_value(json!({"volume": "12.5"})).unwrap();
        assert_eq!(text.volume, Reported::Value(12.5));
        assert_eq!(serde_json::to_value(&text).unwrap()["volume"], json!(12.5));
        assert_eq!(serde_json::to_value(&invalid).unwrap()["volume"], json!(null));
    }

    #[test]
    fn test_null_text_and_flag_fields_default() {
        let event: Event = serde_json::from_value(json!({
            "title": null,
            "slug": null,
            "markets": [{"question": null, "active": null, "closed": null, "conditionId": "0x1"}]
        }))
        .unwrap();
        assert_eq!(event.title, "");
        assert_eq!(event.markets.len(), 1);
        assert_eq!(event.markets[0].question, "");
        assert!(!event.markets[0].closed);

        let trade: Trade = serde_json::from_value(json!({
            "proxyWallet": null, "side": "SELL", "conditionId": null,
            "size": 1, "price": 0.5, "timestamp": 10
        }))
        .unwrap();
        assert!(trade.proxy_wallet.is_empty());
        assert!(trade.condition_id.is_empty());

        let history: PriceHistory = serde_json::from_value(json!({"history": null})).unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn test_trade_parsing_and_notional() {
        let trade: Trade = serde_json::from_value(json!({
            "proxyWallet": "0xw",
            "side": "BUY",
            "asset": 123456,
            "conditionId": "0xc",
            "size": "20000",
            "price": "0.55",
            "timestamp": "1704067200"
        }))
        .unwrap();

        assert_eq!(trade.asset, "123456");
        assert_eq!(trade.notional(), dec!(11000));
        assert_eq!(trade.notional_f64(), 11000.0);
        assert_eq!(trade.time(), Utc.timestamp_opt(1_704_067_200, 0).single());
    }

    #[test]
    fn test_price_history_lookup() {
        let h = PriceHistory::new(vec![
            PricePoint { t: 200, p: 0.6 },
            PricePoint { t: 100, p: 0.5 },
        ]);
        assert_eq!(h.first_time(), Some(100));
        assert_eq!(h.price_at(99), None);
        assert_eq!(h.price_at(150), Some(0.5));
        assert_eq!(h.price_at(500), Some(0.6));
        assert!((h.change_between(100, 500).unwrap() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_covered_change_requires_full_span() {
        let h = PriceHistory::new(vec![
            PricePoint { t: 100, p: 0.5 },
            PricePoint { t: 200, p: 0.7 },
        ]);
        assert!(h.covered_change(100, 200).is_some());
        // stale price past the last point is not coverage
        assert_eq!(h.covered_change(150, 250), None);
        assert_eq!(h.covered_change(50, 150), None);
        assert_eq!(PriceHistory::default().covered_change(0, 1), None);
    }

    #[test]
    fn test_category_display_and_index() {
        assert_eq!(Category::SciTech.to_string(), "Science & Tech");
        for (i, c) in Category::ALL.iter().enumerate() {
            assert_eq!(c.index(), i);
        }
        assert_eq!(OptionClass::Replicable.to_string(), "replicable");
    }

    #[test]
    fn test_parse_iso_datetime_variants() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(parse_iso_datetime("2024-01-02T03:04:05Z"), Some(expected));
        assert_eq!(parse_iso_datetime("2024-01-02T03:04:05"), Some(expected));
        assert_eq!(parse_iso_datetime("2024-01-02T05:04:05+02:00"), Some(expected));
        assert_eq!(
            parse_iso_datetime("2024-01-02"),
            Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).single()
        );
        assert_eq!(parse_iso_datetime(""), None);
        assert_eq!(parse_iso_datetime("soon"), None);
    }
}
