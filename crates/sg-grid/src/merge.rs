//! Cross-product merging of disjunctive grids.

use sg_types::{Conjunction, Grid};
use tracing::trace;

/// Rewrite every key of `conjunction` to `prefix + key`.
pub fn prefix_keys(conjunction: &Conjunction, prefix: &str) -> Conjunction {
    conjunction
        .iter()
        .map(|(key, candidates)| (format!("{prefix}{key}"), candidates.clone()))
        .collect()
}

/// Merge `src` into `dest` as a cross product.
///
/// Each output conjunction is a `dest` conjunction overlaid with a `src`
/// conjunction (src wins on key collision), iterating `dest` outer and `src`
/// inner. A missing `src` leaves `dest` untouched; an empty `dest` yields an
/// empty result.
pub fn merge(dest: Grid, src: Option<&[Conjunction]>, prefix: Option<&str>) -> Grid {
    let Some(src) = src else {
        return dest;
    };

    let src: Grid = match prefix {
        Some(prefix) if !prefix.is_empty() => {
            src.iter().map(|c| prefix_keys(c, prefix)).collect()
        }
        _ => src.to_vec(),
    };

    let mut out = Grid::with_capacity(dest.len() * src.len());
    for d in &dest {
        for s in &src {
            let mut combined = d.clone();
            for (key, candidates) in s {
                combined.insert(key.clone(), candidates.clone());
            }
            out.push(combined);
        }
    }

    trace!(
        "Merged {} x {} conjunction(s) into {}",
        dest.len(),
        src.len(),
        out.len()
    );
    out
}
