//! Property-based tests for the closure engine's pure algebra.

use chrono::{Datelike, Duration, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;
use tesoria_shared::types::EntryId;
use tesoria_shared::ClosureConfig;

use super::generator::{aggregate_totals, build_closing_entries};
use super::period::Period;
use super::types::ClosureTotals;
use super::validator::trial_balance_error;
use crate::gateway::{EntryKind, EntryLine, JournalEntry};

fn year_strategy() -> impl Strategy<Value = i32> {
    2000i32..=2100
}

fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000).prop_map(|n| Decimal::new(n, 2))
}

fn entry_with_lines(lines: Vec<EntryLine>) -> JournalEntry {
    JournalEntry {
        id: EntryId::new(),
        entry_date: NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
        description: "generated".to_string(),
        kind: EntryKind::Regular,
        lines,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The twelve month ranges tile the annual range with no gap or overlap.
    #[test]
    fn prop_month_ranges_tile_the_year(year in year_strategy()) {
        let annual = Period::annual(year).date_range();
        let mut cursor = annual.start;

        for month in 1..=12u32 {
            let range = Period::monthly(year, month).unwrap().date_range();
            prop_assert_eq!(range.start, cursor, "month {} must start where the previous ended", month);
            prop_assert!(range.end > range.start);
            cursor = range.end;
        }

        prop_assert_eq!(cursor, annual.end);
    }

    /// The last day of a period is the final instant-day of its range.
    #[test]
    fn prop_last_day_closes_the_range(year in year_strategy(), month in 1u32..=12) {
        let period = Period::monthly(year, month).unwrap();
        let range = period.date_range();
        let last = period.last_day();

        prop_assert!(range.contains(last.and_hms_opt(0, 0, 0).unwrap()));
        prop_assert_eq!(
            last + Duration::days(1),
            range.end.date(),
            "range must end the day after the period's last day"
        );
        prop_assert_eq!(last.month(), month);
    }

    /// The trial balance verdict depends only on |debit - credit| vs tolerance.
    #[test]
    fn prop_trial_balance_tolerance_boundary(
        debit in amount_strategy(),
        credit in amount_strategy(),
    ) {
        let tolerance = Decimal::new(1, 2);
        let verdict = trial_balance_error(debit, credit, tolerance);
        let diff = (debit - credit).abs();

        if diff > tolerance {
            let message = verdict.expect("imbalance beyond tolerance must be reported");
            prop_assert!(message.contains(&debit.to_string()));
            prop_assert!(message.contains(&credit.to_string()));
        } else {
            prop_assert!(verdict.is_none(), "imbalance within tolerance must pass");
        }
    }

    /// Income credits and expense debits land in their totals with the right sign.
    #[test]
    fn prop_aggregation_sign_conventions(
        income in amount_strategy(),
        expense in amount_strategy(),
        unrelated in amount_strategy(),
    ) {
        let config = ClosureConfig::default();
        let entries = vec![
            entry_with_lines(vec![
                EntryLine::debit("1000", income),
                EntryLine::credit("4300", income),
            ]),
            entry_with_lines(vec![
                EntryLine::debit("5100", expense),
                EntryLine::credit("1000", expense),
            ]),
            // Lines on accounts outside both prefixes change nothing.
            entry_with_lines(vec![
                EntryLine::debit("2100", unrelated),
                EntryLine::credit("1000", unrelated),
            ]),
        ];

        let totals = aggregate_totals(&entries, &config);
        prop_assert_eq!(totals.total_income, income);
        prop_assert_eq!(totals.total_expense, expense);
        prop_assert_eq!(totals.result, income - expense);
    }

    /// Every synthesized closing entry is internally balanced, and one entry
    /// exists per strictly positive side.
    #[test]
    fn prop_closing_entries_balanced(
        income in amount_strategy(),
        expense in amount_strategy(),
        year in year_strategy(),
        month in 1u32..=12,
    ) {
        let config = ClosureConfig::default();
        let period = Period::monthly(year, month).unwrap();
        let totals = ClosureTotals::new(income, expense);

        let entries = build_closing_entries(&period, &totals, &config);

        let expected = usize::from(income > Decimal::ZERO) + usize::from(expense > Decimal::ZERO);
        prop_assert_eq!(entries.len(), expected);

        for entry in &entries {
            let debit: Decimal = entry.lines.iter().map(|l| l.debit).sum();
            let credit: Decimal = entry.lines.iter().map(|l| l.credit).sum();
            prop_assert_eq!(debit, credit, "closing entry must be balanced");
            prop_assert_eq!(entry.entry_date, period.last_day());
        }
    }
}
