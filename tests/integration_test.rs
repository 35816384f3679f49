//! End-to-end scoring tests over in-memory and on-disk stores.

mod common;

use common::*;
use fundscore::adapters::csv_adapter::CsvStore;
use fundscore::domain::error::FundScoreError;
use fundscore::domain::etf_map::FundEtfMap;
use fundscore::domain::fetch::{run_fetch, FetchPlan};
use fundscore::domain::fund::{FundRecord, FundTable};
use fundscore::domain::scorer::{Scorer, DEFAULT_VOLATILITY_KEY};
use fundscore::ports::data_port::DataStorePort;
use proptest::prelude::*;
use std::collections::HashMap;
use tempfile::TempDir;

fn contribution(card: &fundscore::domain::scorer::ScoreCard, label: &str) -> u32 {
    card.contributions()
        .into_iter()
        .find(|(l, _, _)| *l == label)
        .map(|(_, earned, _)| earned)
        .unwrap()
}

mod thresholds {
    use super::*;

    #[test]
    fn short_weekly_history_disables_trend_signals() {
        let weekly = weekly_series(&linear(100.0, 1.0, 19));
        let daily = daily_series(&linear(100.0, 1.0, 19));
        let scorer = scorer_for(vec![FundRecord::new("SHK126", weekly, daily)]);
        let as_of = scorer.latest_date("SHK126").unwrap().unwrap();

        assert!(!scorer.ema20_slope("SHK126", as_of).unwrap());
        assert!(!scorer.volatility_filter("SHK126", as_of).unwrap());
        assert!(!scorer.macd_expansion("SHK126", as_of).unwrap());
    }

    #[test]
    fn ema_slope_follows_twenty_five_point_trend() {
        let scorer = scorer_for(vec![
            FundRecord::new(
                "SHK126",
                weekly_series(&linear(100.0, 1.0, 25)),
                daily_series(&[100.0]),
            ),
            FundRecord::new(
                "SHK129",
                weekly_series(&linear(100.0, -1.0, 25)),
                daily_series(&[100.0]),
            ),
        ]);
        let as_of = date("2022-12-30");
        assert!(scorer.ema20_slope("SHK126", as_of).unwrap());
        assert!(!scorer.ema20_slope("SHK129", as_of).unwrap());
    }

    #[test]
    fn macd_needs_twenty_six_points() {
        let growth: Vec<f64> = (0..25).map(|i| 100.0 * 1.2_f64.powi(i)).collect();
        let scorer = scorer_for(vec![FundRecord::new(
            "SHK130",
            weekly_series(&growth),
            daily_series(&growth),
        )]);
        let as_of = scorer.latest_date("SHK130").unwrap().unwrap();
        assert!(!scorer.macd_expansion("SHK130", as_of).unwrap());
        assert!(scorer.ema20_slope("SHK130", as_of).unwrap());
    }

    #[test]
    fn cci_cross_contributes_two_points() {
        let mut daily = vec![100.0; 20];
        daily.extend([90.0, 100.0]);
        let scorer = scorer_for(vec![FundRecord::new(
            "SHK128",
            weekly_series(&[100.0; 5]),
            daily_series(&daily),
        )]);
        let as_of = date("2022-01-24");
        let card = scorer.score_card("SHK128", as_of).unwrap();

        assert_eq!(card.cci_breakthrough, 1);
        assert_eq!(contribution(&card, "cci_breakthrough"), 2);
    }

    #[test]
    fn bearish_cci_cross_also_contributes_two_points() {
        let mut daily = vec![100.0; 20];
        daily.extend([110.0, 100.0]);
        let scorer = scorer_for(vec![FundRecord::new(
            "SHK128",
            weekly_series(&[100.0; 5]),
            daily_series(&daily),
        )]);
        let card = scorer.score_card("SHK128", date("2022-01-24")).unwrap();
        assert_eq!(card.cci_breakthrough, -1);
        assert_eq!(contribution(&card, "cci_breakthrough"), 2);
    }

    #[test]
    fn rsi_resonance_requires_both_timeframes() {
        let rising = linear(100.0, 1.0, 30);
        let falling = linear(130.0, -1.0, 30);

        let scorer = scorer_for(vec![
            FundRecord::new("SHK126", weekly_series(&rising), daily_series(&rising)),
            FundRecord::new("SHK129", weekly_series(&falling), daily_series(&rising)),
        ]);
        let as_of = date("2022-12-30");

        let both = scorer.score_card("SHK126", as_of).unwrap();
        assert_eq!(contribution(&both, "rsi_resonance"), 1);

        let weekly_weak = scorer.score_card("SHK129", as_of).unwrap();
        assert_eq!(contribution(&weekly_weak, "rsi_resonance"), 0);
    }
}

mod divergence {
    use super::*;

    fn scorer_with_etf(code: &str, fund_close: f64, last_volume: i64) -> Scorer {
        let mut weekly = vec![95.0; 51];
        weekly.push(fund_close);
        let mut volumes = vec![1_000_i64; 52];
        volumes[51] = last_volume;

        Scorer::new(
            FundTable::from_records(vec![FundRecord::new(
                code,
                weekly_series(&weekly),
                daily_series(&weekly),
            )]),
            daily_series(&[20.0]),
            HashMap::from([("EWH".to_string(), weekly_bars(&[100.0; 52], &volumes))]),
            FundEtfMap::default(),
        )
    }

    fn last_week() -> chrono::NaiveDate {
        date("2022-01-07") + chrono::Duration::weeks(51)
    }

    #[test]
    fn mapped_fund_near_high_on_thin_volume() {
        let scorer = scorer_with_etf("SHK126", 98.0, 500);
        assert!(scorer.volume_divergence("SHK126", last_week()).unwrap());
    }

    #[test]
    fn fund_below_tolerance_is_false() {
        let scorer = scorer_with_etf("SHK126", 96.0, 500);
        assert!(!scorer.volume_divergence("SHK126", last_week()).unwrap());
    }

    #[test]
    fn unmapped_fund_is_always_false() {
        let scorer = scorer_with_etf("SHK127", 98.0, 500);
        assert!(!scorer.volume_divergence("SHK127", last_week()).unwrap());
        let card = scorer.score_card("SHK127", last_week()).unwrap();
        assert_eq!(card.etf, None);
        assert_eq!(contribution(&card, "volume_divergence"), 0);
    }

    #[test]
    fn as_of_before_enough_history_is_false() {
        let scorer = scorer_with_etf("SHK126", 98.0, 500);
        let early = last_week() - chrono::Duration::weeks(1);
        assert!(!scorer.volume_divergence("SHK126", early).unwrap());
    }
}

mod loading {
    use super::*;

    fn funds() -> FundTable {
        FundTable::from_records(vec![
            FundRecord::new(
                "SHK126",
                weekly_series(&linear(10.0, 0.1, 30)),
                daily_series(&linear(10.0, 0.02, 60)),
            ),
            FundRecord::new(
                "SHK127",
                weekly_series(&linear(20.0, -0.1, 30)),
                daily_series(&linear(20.0, -0.02, 60)),
            ),
        ])
    }

    #[test]
    fn missing_volatility_index_is_an_error() {
        let store = MockStore::new().with_funds(funds());
        let result = Scorer::load(&store, FundEtfMap::default(), DEFAULT_VOLATILITY_KEY);
        assert!(matches!(result, Err(FundScoreError::NoData { key }) if key == "VIX"));
    }

    #[test]
    fn missing_etf_table_is_tolerated() {
        let vix = vec![make_bar(date("2022-01-03"), 17.5, 0)];
        let store = MockStore::new()
            .with_funds(funds())
            .with_bars("VIX", Interval::Daily, vix);
        let scorer = Scorer::load(&store, FundEtfMap::default(), DEFAULT_VOLATILITY_KEY).unwrap();

        assert_eq!(scorer.fund_codes(), vec!["SHK126", "SHK127"]);
        let as_of = scorer.latest_date("SHK126").unwrap().unwrap();
        assert!(!scorer.volume_divergence("SHK126", as_of).unwrap());
        assert_eq!(
            scorer.score_card("SHK126", as_of).unwrap().volatility_index,
            Some(17.5)
        );
    }

    #[test]
    fn malformed_etf_table_is_an_error() {
        let store = MockStore::new()
            .with_funds(funds())
            .with_bars("VIX", Interval::Daily, vec![make_bar(date("2022-01-03"), 17.5, 0)])
            .with_error("EWH", "bad row");
        let result = Scorer::load(&store, FundEtfMap::default(), DEFAULT_VOLATILITY_KEY);
        assert!(matches!(result, Err(FundScoreError::Parse { .. })));
    }

    #[test]
    fn csv_store_round_trip_scores_identically() {
        let dir = TempDir::new().unwrap();
        let store = CsvStore::new(dir.path().to_path_buf(), "manulife_funds.csv", "etfs");
        store.save_fund_table(&funds()).unwrap();
        store
            .save_ohlcv(
                "VIX",
                Interval::Daily,
                &[make_bar(date("2022-01-03"), 17.5, 0)],
            )
            .unwrap();
        store
            .save_ohlcv(
                "EWH",
                Interval::Weekly,
                &weekly_bars(&linear(20.0, 0.1, 30), &[1_000; 30]),
            )
            .unwrap();

        let memory = MockStore::new()
            .with_funds(funds())
            .with_bars("VIX", Interval::Daily, vec![make_bar(date("2022-01-03"), 17.5, 0)])
            .with_bars(
                "EWH",
                Interval::Weekly,
                weekly_bars(&linear(20.0, 0.1, 30), &[1_000; 30]),
            );

        let from_disk = Scorer::load(&store, FundEtfMap::default(), "VIX").unwrap();
        let from_memory = Scorer::load(&memory, FundEtfMap::default(), "VIX").unwrap();

        for code in ["SHK126", "SHK127"] {
            assert_eq!(
                from_disk.calculate_score(code).unwrap(),
                from_memory.calculate_score(code).unwrap()
            );
        }
    }
}

mod fetch_pipeline {
    use super::*;

    fn daily_bars(n: usize) -> Vec<OhlcvBar> {
        (0..n)
            .map(|i| make_bar(date("2022-01-03") + chrono::Duration::days(i as i64), 50.0 + i as f64, 1_000))
            .collect()
    }

    #[test]
    fn fetched_tables_feed_the_scorer() {
        let provider = MockProvider::new()
            .with_bars("EWH", daily_bars(400))
            .with_bars("^VIX", daily_bars(30));
        let source = MockFundSource {
            table: Some(FundTable::from_columns(vec![(
                "SHK126_Daily_Close".to_string(),
                daily_series(&linear(10.0, 0.01, 400)),
            )])),
        };
        let store = MockStore::new();
        let plan = FetchPlan {
            tickers: vec!["EWH".into(), "EPP".into()],
            volatility_symbol: "^VIX".into(),
            period: "max".into(),
            interval: Interval::Daily,
        };

        let report = run_fetch(&provider, Some(&source), &store, &plan).unwrap();
        assert_eq!(report.empty, vec!["EPP"]);
        assert_eq!(report.funds, vec!["SHK126"]);
        assert!(store.load_ohlcv("VIX", Interval::Daily).is_ok());

        let scorer = Scorer::load(&store, FundEtfMap::default(), "VIX").unwrap();
        let score = scorer.calculate_score("SHK126").unwrap();
        assert!(score <= 7);
    }

    #[test]
    fn failing_fund_source_keeps_etf_downloads() {
        let provider = MockProvider::new().with_bars("EWH", daily_bars(10));
        let store = MockStore::new();
        let plan = FetchPlan {
            tickers: vec!["EWH".into()],
            volatility_symbol: "^VIX".into(),
            period: "1y".into(),
            interval: Interval::Daily,
        };
        let report = run_fetch(&provider, Some(&MockFundSource { table: None }), &store, &plan)
            .unwrap();

        assert_eq!(report.saved.len(), 1);
        assert!(report.fund_error.is_some());
        assert_eq!(*provider.calls.borrow(), vec!["EWH", "^VIX"]);
    }

    #[test]
    fn weekly_interval_still_leaves_a_scorable_store() {
        use chrono::{Datelike, Weekday};

        // provider weeks labelled on Mondays
        let mondays: Vec<OhlcvBar> = (0..60)
            .map(|i| make_bar(date("2022-01-03") + chrono::Duration::weeks(i), 50.0 + i as f64, 1_000))
            .collect();
        let provider = MockProvider::new()
            .with_bars("EWH", mondays)
            .with_bars("^VIX", daily_bars(30));
        let dir = TempDir::new().unwrap();
        let store = CsvStore::new(dir.path().to_path_buf(), "manulife_funds.csv", "etfs");
        store
            .save_fund_table(&FundTable::from_records(vec![FundRecord::new(
                "SHK126",
                weekly_series(&linear(10.0, 0.1, 60)),
                daily_series(&linear(10.0, 0.01, 400)),
            )]))
            .unwrap();
        let plan = FetchPlan {
            tickers: vec!["EWH".into()],
            volatility_symbol: "^VIX".into(),
            period: "max".into(),
            interval: Interval::Weekly,
        };

        run_fetch(&provider, None, &store, &plan).unwrap();

        let weekly = store.load_ohlcv("EWH", Interval::Weekly).unwrap();
        assert_eq!(weekly[0].date.weekday(), Weekday::Fri);
        assert_eq!(weekly[0].date, date("2022-01-07"));
        assert_eq!(store.load_ohlcv("VIX", Interval::Daily).unwrap().len(), 30);

        let scorer = Scorer::load(&store, FundEtfMap::default(), "VIX").unwrap();
        assert!(scorer.calculate_score("SHK126").unwrap() <= 7);
    }
}

fn price_vec(min: usize, max: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0f64..500.0, min..max)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn score_stays_within_implemented_bound(
        weekly in price_vec(0, 80),
        daily in price_vec(0, 120),
        etf in price_vec(0, 70),
    ) {
        let volumes: Vec<i64> = (0..etf.len()).map(|i| 1_000 + (i as i64 % 7) * 100).collect();
        let scorer = Scorer::new(
            FundTable::from_records(vec![FundRecord::new(
                "SHK126",
                weekly_series(&weekly),
                daily_series(&daily),
            )]),
            daily_series(&[20.0]),
            HashMap::from([("EWH".to_string(), weekly_bars(&etf, &volumes))]),
            FundEtfMap::default(),
        );

        let score = scorer.calculate_score("SHK126").unwrap();
        prop_assert!(score <= 7);
        prop_assert_eq!(score, scorer.calculate_score("SHK126").unwrap());
    }

    #[test]
    fn later_data_does_not_change_past_scores(
        history in price_vec(30, 60),
        future in price_vec(1, 20),
    ) {
        let mut extended = history.clone();
        extended.extend(&future);

        let base = scorer_for(vec![FundRecord::new(
            "SHK131",
            weekly_series(&history),
            weekly_series(&history),
        )]);
        let longer = scorer_for(vec![FundRecord::new(
            "SHK131",
            weekly_series(&extended),
            weekly_series(&extended),
        )]);

        let as_of = base.latest_date("SHK131").unwrap().unwrap();
        prop_assert_eq!(
            base.score_card("SHK131", as_of).unwrap(),
            longer.score_card("SHK131", as_of).unwrap()
        );
    }
}
