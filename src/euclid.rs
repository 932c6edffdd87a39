use crate::concat::fastcat;
use crate::pattern::Pattern;
use crate::rational::Rational;
use crate::value::Value;

/// `p.euclid(pulse, step, rotation)`: structure `p` onto the boolean
/// rhythm `bjorklund(pulse, step, rotation)` generates, via the `keepIf`
/// mix mode (`out`, i.e. `struct`) — onsets where the rhythm is `true`
/// keep `p`'s value, `false` slots are silent.
pub fn euclid_pattern(p: &Pattern, pulse: i64, step: i64, rotation: i64) -> Pattern {
    if step <= 0 {
        return crate::combinators::nothing();
    }
    let rot = rotation.rem_euclid(step.max(1)) as usize;
    let rhythm = bjorklund(pulse.max(0) as usize, step as usize, rot);
    let bool_pat = fastcat(rhythm.into_iter().map(|b| crate::combinators::pure(Value::Bool(b))).collect());
    crate::matrix::struct_with(p, &bool_pat)
}

/// The logical inverse: onsets land on the rhythm's rests instead.
pub fn euclid_inv(p: &Pattern, pulse: i64, step: i64, rotation: i64) -> Pattern {
    if step <= 0 {
        return crate::combinators::nothing();
    }
    let rot = rotation.rem_euclid(step.max(1)) as usize;
    let rhythm = bjorklund(pulse.max(0) as usize, step as usize, rot);
    let bool_pat = fastcat(rhythm.into_iter().map(|b| crate::combinators::pure(Value::Bool(!b))).collect());
    crate::matrix::struct_with(p, &bool_pat)
}

/// Every step sounds, but pulses are accented (`true`) vs plain (`false`),
/// carried through as a `bool` value rather than used for `struct`-style
/// pruning.
pub fn euclid_full(pulse: i64, step: i64, rotation: i64, on_true: &Pattern, on_false: &Pattern) -> Pattern {
    if step <= 0 {
        return crate::combinators::nothing();
    }
    let rot = rotation.rem_euclid(step.max(1)) as usize;
    let rhythm = bjorklund(pulse.max(0) as usize, step as usize, rot);
    let arms: Vec<Pattern> = rhythm
        .into_iter()
        .map(|b| if b { on_true.clone() } else { on_false.clone() })
        .collect();
    fastcat(arms)
}

/// `euclid` with a legato-style whole that extends each onset's duration
/// until the next one, rather than a uniform per-step slice.
pub fn euclid_legato(p: &Pattern, pulse: i64, step: i64, rotation: i64) -> Pattern {
    if step <= 0 {
        return crate::combinators::nothing();
    }
    let rot = rotation.rem_euclid(step.max(1)) as usize;
    let rhythm = bjorklund(pulse.max(0) as usize, step as usize, rot);
    let onsets: Vec<usize> = rhythm.iter().enumerate().filter(|(_, &b)| b).map(|(i, _)| i).collect();
    if onsets.is_empty() {
        return crate::combinators::nothing();
    }
    let arms: Vec<(Rational, Pattern)> = onsets
        .iter()
        .enumerate()
        .map(|(idx, &start)| {
            let next = onsets.get(idx + 1).copied().unwrap_or(rhythm.len()) as i64;
            let width = Rational::from_int(next - start as i64);
            (width, p.clone())
        })
        .collect();
    crate::stepwise::stepcat(arms)
}

/// Generate a Euclidean rhythm pattern using the Bjorklund algorithm
///
/// # Arguments
/// * `pulse` - Number of pulses (onsets) in the pattern
/// * `step` - Total number of steps in the pattern
/// * `rotation` - Number of steps to rotate the pattern
///
/// # Returns
/// A vector of booleans where `true` represents a pulse and `false` represents a rest
///
/// # Examples
/// ```
/// use temporal_pattern::euclid::bjorklund;
///
/// // Classic 3-against-8 pattern
/// let pattern = bjorklund(3, 8, 0);
/// assert_eq!(pattern.len(), 8);
/// assert_eq!(pattern.iter().filter(|&&x| x).count(), 3);
/// ```
pub fn bjorklund(pulse: usize, step: usize, rotation: usize) -> Vec<bool> {
    // Edge cases
    if step == 0 {
        return Vec::new();
    }

    if pulse == 0 {
        return vec![false; step];
    }

    if pulse >= step {
        return vec![true; step];
    }

    // Initialize pattern with pulses at the start
    let mut pattern = vec![true; pulse];
    pattern.extend(vec![false; step - pulse]);

    // Bjorklund algorithm
    let mut groups: Vec<Vec<bool>> = pattern.into_iter().map(|b| vec![b]).collect();

    loop {
        // Count groups that can be paired
        let ones = groups.iter().filter(|g| g.iter().all(|&x| x)).count();
        let zeros = groups.len() - ones;

        if zeros <= 1 {
            break;
        }

        let pairs = ones.min(zeros);

        if pairs == 0 {
            break;
        }

        // Pair groups
        let mut new_groups = Vec::new();

        for i in 0..pairs {
            let mut combined = groups[i].clone();
            combined.extend_from_slice(&groups[ones + i]);
            new_groups.push(combined);
        }

        // Add remaining groups
        for group in groups.iter().take(ones).skip(pairs) {
            new_groups.push(group.clone());
        }

        for group in groups.iter().skip(ones + pairs) {
            new_groups.push(group.clone());
        }

        groups = new_groups;
    }

    // Flatten groups into pattern
    let mut result: Vec<bool> = groups.into_iter().flatten().collect();

    // Apply rotation
    if rotation > 0 && !result.is_empty() {
        let rot = rotation % result.len();
        result.rotate_left(rot);
    }

    result
}
