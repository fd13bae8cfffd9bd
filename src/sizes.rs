//! Row counts swept by a benchmark run.

/// Builds the ascending list of table sizes to measure.
///
/// Every power of ten from `10^1` to `10^max_exponent` is included, along with
/// the multiples `2·10^e ..= 9·10^e` between consecutive powers. The result is
/// sorted and free of duplicates; `max_exponent == 0` yields an empty list.
/// Sizes that do not fit in a `usize` are left out, so the sequence stops at
/// the largest representable one.
pub fn build_size_sequence(max_exponent: u32) -> Vec<usize> {
    let mut sizes = Vec::new();
    for exponent in 1..=max_exponent {
        let Some(base) = 10usize.checked_pow(exponent) else {
            break;
        };
        sizes.push(base);
        if exponent != max_exponent {
            sizes.extend((1..10).filter_map(|step: usize| step.checked_mul(base)));
        }
    }
    sizes.sort_unstable();
    sizes.dedup();
    sizes
}
