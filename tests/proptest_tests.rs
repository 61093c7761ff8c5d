//! Property-based tests for the arithmetic and filename invariants.

use fakturka::core::{
    artifact_file_name, format_money, invoice_totals, line_amounts, parse_money, parse_quantity,
    round_half_up, VatRate,
};
use proptest::prelude::*;

/// Decimal strings without leading zeros: `D+(.DD?)?`.
fn arb_money_string() -> impl Strategy<Value = String> {
    proptest::string::string_regex("(0|[1-9][0-9]{0,9})(\\.[0-9]{1,2})?").unwrap()
}

fn arb_rate() -> impl Strategy<Value = VatRate> {
    prop_oneof![
        Just(VatRate::Rate23),
        Just(VatRate::Rate8),
        Just(VatRate::Rate5),
        Just(VatRate::Rate0),
        Just(VatRate::Zw),
        Just(VatRate::Np),
    ]
}

/// Canonical two-decimal form of a money string.
fn pad_to_two_decimals(s: &str) -> String {
    match s.split_once('.') {
        None => format!("{s}.00"),
        Some((int, frac)) if frac.len() == 1 => format!("{int}.{frac}0"),
        Some(_) => s.to_string(),
    }
}

proptest! {
    // P1 — money round-trip
    #[test]
    fn money_round_trips_through_canonical_form(s in arb_money_string()) {
        let grosze = parse_money(&s).unwrap();
        prop_assert_eq!(format_money(grosze), pad_to_two_decimals(&s));
        prop_assert_eq!(parse_money(&format_money(grosze)).unwrap(), grosze);
    }

    #[test]
    fn comma_and_dot_parse_identically(int in 0i64..1_000_000, frac in 0i64..100) {
        let with_dot = format!("{int}.{frac:02}");
        let with_comma = format!("{int},{frac:02}");
        prop_assert_eq!(
            parse_money(&with_dot).unwrap(),
            parse_money(&with_comma).unwrap()
        );
    }

    // P2 — line-amount consistency
    #[test]
    fn line_amounts_are_consistent(
        price in 0i64..10_000_000,
        qty_milli in 1i64..1_000_000,
        rate in arb_rate(),
    ) {
        let line = line_amounts(price, qty_milli, rate).unwrap();
        prop_assert_eq!(line.gross, line.net + line.vat);
        prop_assert_eq!(line.net, round_half_up(price * qty_milli, 1000).unwrap());
        match rate.percent() {
            Some(p) => prop_assert_eq!(line.vat, round_half_up(line.net * p, 100).unwrap()),
            None => prop_assert_eq!(line.vat, 0),
        }
    }

    // P3 — totals additivity
    #[test]
    fn totals_are_sums_of_lines(
        lines in proptest::collection::vec(
            (1i64..100_000, 1i64..10_000, arb_rate()),
            1..20,
        )
    ) {
        let amounts: Vec<_> = lines
            .iter()
            .map(|(price, qty, rate)| line_amounts(*price, *qty, *rate).unwrap())
            .collect();
        let totals = invoice_totals(&amounts).unwrap();

        let net: i64 = amounts.iter().map(|a| a.net).sum();
        let vat: i64 = amounts.iter().map(|a| a.vat).sum();
        let gross: i64 = amounts.iter().map(|a| a.gross).sum();
        prop_assert_eq!(totals.subtotal, net);
        prop_assert_eq!(totals.tax, vat);
        prop_assert_eq!(totals.total, gross);
        prop_assert_eq!(totals.total, totals.subtotal + totals.tax);
    }

    // P5 — filename safety
    #[test]
    fn filenames_are_always_safe(number in ".*") {
        if let Ok(name) = artifact_file_name(&number, "xml") {
            prop_assert!(!name.is_empty());
            prop_assert!(name.len() <= 255);
            prop_assert!(!name.contains('/'));
            prop_assert!(!name.contains('\\'));
            prop_assert!(!name.contains(".."));
            prop_assert!(name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-'));
            prop_assert!(name.ends_with(".xml"));
            prop_assert!(!name.starts_with('-') && !name.starts_with('.'));
        }
    }

    // quantity parsing stays within three fractional digits
    #[test]
    fn quantities_scale_to_thousandths(int in 1i64..1_000_000, frac in 0i64..1000) {
        let s = format!("{int}.{frac:03}");
        prop_assert_eq!(parse_quantity(&s).unwrap(), int * 1000 + frac);
    }
}
