//! Alignment arithmetic.
//!
//! All functions treat an alignment of 0 as 1, so an empty or unconstrained
//! set never forces padding.

/// Greatest common divisor.
pub fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Least common multiple of two alignments.
pub fn lcm(a: usize, b: usize) -> usize {
    let a = a.max(1);
    let b = b.max(1);
    a / gcd(a, b) * b
}

/// Least common multiple of a set of alignments. 1 for an empty set.
pub fn lcm_all(alignments: impl IntoIterator<Item = usize>) -> usize {
    alignments.into_iter().fold(1, lcm)
}

/// Round `value` up to the next multiple of `multiple`.
pub fn round_up(value: usize, multiple: usize) -> usize {
    let multiple = multiple.max(1);
    value.div_ceil(multiple) * multiple
}

/// Number of padding bytes needed to bring `value` to a multiple of `alignment`.
pub fn padding_for(value: usize, alignment: usize) -> usize {
    round_up(value, alignment) - value
}
