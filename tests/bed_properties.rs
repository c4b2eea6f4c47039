//! Property-based tests for line-name chromosome normalization

use liftconcat::formats::bed::{
    clean_input, clean_line, matches_line_name, unclean_bed, unclean_line,
};
use proptest::prelude::*;

/// Chromosome names without underscores or tabs
fn arb_chrom() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("2L".to_string()),
        Just("2R".to_string()),
        Just("3L".to_string()),
        Just("X".to_string()),
        (1u8..=22).prop_map(|n| format!("chr{}", n)),
    ]
}

fn arb_line_name() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9]{0,8}"
}

/// BED3+ record body after the chromosome field
fn arb_rest() -> impl Strategy<Value = String> {
    (0u64..1_000_000, 1u64..5000, "[a-z0-9]{0,6}")
        .prop_map(|(start, size, name)| format!("\t{}\t{}\t{}", start, start + size, name))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// unclean(clean(x)) == x for records of the selected line
    #[test]
    fn prop_clean_unclean_roundtrip(
        chrom in arb_chrom(),
        line_name in arb_line_name(),
        rest in arb_rest(),
    ) {
        let line = format!("{}_{}{}", chrom, line_name, rest);
        let cleaned = clean_line(&line, &line_name).unwrap();

        prop_assert_eq!(&cleaned, &format!("{}{}", chrom, rest));
        prop_assert_eq!(unclean_line(&cleaned, &line_name), line);
    }

    /// Records without any suffix are never selected
    #[test]
    fn prop_plain_chrom_not_selected(
        chrom in arb_chrom(),
        line_name in arb_line_name(),
        rest in arb_rest(),
    ) {
        let line = format!("{}{}", chrom, rest);
        prop_assert!(!matches_line_name(&line, &line_name));
    }

    /// Cleaning never touches anything past the chromosome field
    #[test]
    fn prop_clean_preserves_other_fields(
        chrom in arb_chrom(),
        line_name in arb_line_name(),
        rest in arb_rest(),
    ) {
        let line = format!("{}_{}{}", chrom, line_name, rest);
        let cleaned = clean_line(&line, &line_name).unwrap();
        prop_assert!(cleaned.ends_with(&rest));
    }

    /// An identity lift through clean -> unclean keeps every record exactly once
    #[test]
    fn prop_identity_lift_keeps_record_set(
        records in prop::collection::vec((arb_chrom(), any::<bool>(), arb_rest()), 0..30),
        line_name in arb_line_name(),
    ) {
        let original: String = records
            .iter()
            .map(|(chrom, selected, rest)| {
                if *selected {
                    format!("{}_{}{}\n", chrom, line_name, rest)
                } else {
                    format!("{}_0{}{}\n", chrom, line_name, rest)
                }
            })
            .collect();

        let mut cleaned = Vec::new();
        let kept = clean_input(original.as_bytes(), &mut cleaned, &line_name).unwrap();
        prop_assert_eq!(kept, records.iter().filter(|(_, s, _)| *s).count());

        let mut restored = Vec::new();
        unclean_bed(original.as_bytes(), &cleaned[..], &mut restored, &line_name).unwrap();

        let mut before: Vec<&str> = original.lines().collect();
        let restored = String::from_utf8(restored).unwrap();
        let mut after: Vec<&str> = restored.lines().collect();
        before.sort_unstable();
        after.sort_unstable();
        prop_assert_eq!(before, after);
    }
}
