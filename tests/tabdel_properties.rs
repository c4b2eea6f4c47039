//! Property-based tests for tab-delimited column extraction and substitution

use liftconcat::formats::tabdel::{bed_map, extract_bed, return_bed, TabColumns};
use proptest::prelude::*;

/// One data row: chrom, position, optional end, id
fn arb_row() -> impl Strategy<Value = (String, u64, u64, String)> {
    (
        prop_oneof![Just("2L_a".to_string()), Just("X_a".to_string()), Just("3R_b".to_string())],
        1u64..1_000_000,
        0u64..500,
        "rs[0-9]{1,6}",
    )
        .prop_map(|(chrom, pos, len, id)| (chrom, pos, pos + len, id))
}

fn render(rows: &[(String, u64, u64, String)], with_end: bool, comment_every: usize) -> String {
    let mut text = String::new();
    for (i, (chrom, pos, end, id)) in rows.iter().enumerate() {
        if comment_every > 0 && i % comment_every == 0 {
            text.push_str("# comment\n");
        }
        if with_end {
            text.push_str(&format!("{}\t{}\t{}\t{}\n", id, chrom, pos, end));
        } else {
            text.push_str(&format!("{}\t{}\t{}\n", id, chrom, pos));
        }
    }
    text
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// An identity lift writes the table back byte for byte
    #[test]
    fn prop_identity_roundtrip(
        rows in prop::collection::vec(arb_row(), 0..40),
        with_end in any::<bool>(),
        comment_every in 0usize..5,
    ) {
        let table = render(&rows, with_end, comment_every);
        let columns = TabColumns { chrom: 1, start: 2, end: with_end.then_some(3) };

        let mut bed = Vec::new();
        let n = extract_bed(table.as_bytes(), &mut bed, &columns).unwrap();
        prop_assert_eq!(n, rows.len());

        let lifted = bed_map(&bed[..]).unwrap();
        let mut restored = Vec::new();
        return_bed(table.as_bytes(), &lifted, &mut restored, &columns).unwrap();
        prop_assert_eq!(String::from_utf8(restored).unwrap(), table);
    }

    /// Extracted intervals are 0-based half-open around the 1-based position
    #[test]
    fn prop_extracted_interval(rows in prop::collection::vec(arb_row(), 1..20)) {
        let table = render(&rows, false, 0);
        let columns = TabColumns { chrom: 1, start: 2, end: None };

        let mut bed = Vec::new();
        extract_bed(table.as_bytes(), &mut bed, &columns).unwrap();
        let bed = String::from_utf8(bed).unwrap();

        for (line, (chrom, pos, _, _)) in bed.lines().zip(&rows) {
            let fields: Vec<&str> = line.split('\t').collect();
            prop_assert_eq!(fields[0], chrom.as_str());
            prop_assert_eq!(fields[1].parse::<u64>().unwrap() + 1, *pos);
            prop_assert_eq!(fields[2].parse::<u64>().unwrap(), *pos);
        }
    }

    /// Shifting the lifted start moves only the position column
    #[test]
    fn prop_shift_touches_only_coordinates(
        rows in prop::collection::vec(arb_row(), 1..20),
        shift in 1i64..10_000,
    ) {
        let table = render(&rows, false, 0);
        let columns = TabColumns { chrom: 1, start: 2, end: None };

        let mut bed = Vec::new();
        extract_bed(table.as_bytes(), &mut bed, &columns).unwrap();
        let mut lifted = bed_map(&bed[..]).unwrap();
        for interval in lifted.values_mut() {
            interval.start += shift;
        }

        let mut out = Vec::new();
        return_bed(table.as_bytes(), &lifted, &mut out, &columns).unwrap();
        let out = String::from_utf8(out).unwrap();

        for (line, (chrom, pos, _, id)) in out.lines().zip(&rows) {
            let fields: Vec<&str> = line.split('\t').collect();
            prop_assert_eq!(fields[0], id.as_str());
            prop_assert_eq!(fields[1], chrom.as_str());
            prop_assert_eq!(fields[2].parse::<i64>().unwrap(), *pos as i64 + shift);
        }
    }
}
