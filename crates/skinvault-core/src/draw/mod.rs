//! Weighted draw engine
//!
//! Resolves a rarity from a case's rarity table and a uniform sample, then
//! picks a skin of that rarity with a second, independent sample. The engine
//! performs no randomness itself: samples come from a [`SampleSource`], which
//! keeps every draw reproducible under test.

mod sample;

pub use sample::{RandomSampler, SampleSource, ScriptedSampler, SAMPLE_DECIMALS};

use crate::error::{Error, Result};
use crate::models::{CaseDetail, DrawOrigin, DrawOutcome, RarityTable, Skin};

/// Cumulative upper boundaries of each rarity, in table order.
///
/// Weights are normalized by their sum, so `{2, 2, 1}` and `{40, 40, 20}`
/// produce identical boundaries. The last boundary is 1 up to float rounding.
pub fn boundaries(table: &RarityTable) -> Result<Vec<f64>> {
    if table.is_empty() {
        return Err(Error::InvalidDistribution("rarity table is empty".into()));
    }

    for entry in table.entries() {
        if !entry.weight.is_finite() {
            return Err(Error::InvalidDistribution(format!(
                "weight of '{}' is not a number",
                entry.rarity
            )));
        }
        if entry.weight < 0.0 {
            return Err(Error::InvalidDistribution(format!(
                "weight of '{}' is negative",
                entry.rarity
            )));
        }
    }

    let total: f64 = table.entries().iter().map(|entry| entry.weight).sum();
    if total <= 0.0 {
        return Err(Error::InvalidDistribution(
            "weights sum to zero".to_string(),
        ));
    }

    let mut cumulative = 0.0;
    Ok(table
        .entries()
        .iter()
        .map(|entry| {
            cumulative += entry.weight / total;
            cumulative
        })
        .collect())
}

/// Resolve the rarity selected by `sample`.
///
/// Picks the first rarity whose cumulative boundary is `>= sample`. Zero-weight
/// rarities are never chosen. When rounding leaves the sample above every
/// boundary, the last positive-weight rarity is chosen.
pub fn draw<'a>(table: &'a RarityTable, sample: f64) -> Result<&'a str> {
    if sample.is_nan() {
        return Err(Error::InvalidInput("draw sample is not a number".into()));
    }

    let bounds = boundaries(table)?;
    let mut last_eligible = None;

    for (entry, bound) in table.entries().iter().zip(bounds) {
        // A zero-weight rarity shares its boundary with the previous one and
        // never wins it, even when the sample lands exactly on that value.
        if entry.weight <= 0.0 {
            continue;
        }
        if sample <= bound {
            return Ok(&entry.rarity);
        }
        last_eligible = Some(entry.rarity.as_str());
    }

    // total > 0 guarantees at least one positive weight
    last_eligible
        .ok_or_else(|| Error::InvalidDistribution("no rarity has a positive weight".into()))
}

/// Pick one skin of `rarity` uniformly using `sample`.
pub fn pick_skin<'a>(detail: &'a CaseDetail, rarity: &'a str, sample: f64) -> Result<&'a Skin> {
    let pool = detail.skins_of_rarity(rarity).collect::<Vec<_>>();

    if pool.is_empty() {
        return Err(Error::EmptyRarityPool {
            case_id: detail.case.id.clone(),
            rarity: rarity.to_string(),
        });
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let index = (sample.clamp(0.0, 1.0) * pool.len() as f64).floor() as usize;
    Ok(pool[index.min(pool.len() - 1)])
}

/// Run a complete local draw for `user_id` against a cached case.
///
/// Validation failures return before any sample is consumed.
pub fn resolve<S: SampleSource + ?Sized>(
    detail: &CaseDetail,
    user_id: &str,
    sampler: &mut S,
    timestamp: i64,
) -> Result<DrawOutcome> {
    boundaries(&detail.case.rarity_table)?;

    let sample = sampler.next_sample();
    let rarity = draw(&detail.case.rarity_table, sample)?;
    let skin_sample = sampler.next_sample();
    let skin = pick_skin(detail, rarity, skin_sample)?;

    Ok(DrawOutcome {
        case_id: detail.case.id.clone(),
        user_id: user_id.to_string(),
        sample,
        skin_sample: Some(skin_sample),
        chosen_rarity: rarity.to_string(),
        chosen_skin_id: skin.id.clone(),
        skin: skin.clone(),
        timestamp,
        origin: DrawOrigin::LocalFallback,
        op_id: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Case;
    use pretty_assertions::assert_eq;

    fn table(pairs: &[(&str, f64)]) -> RarityTable {
        RarityTable::from_pairs(pairs.iter().map(|(rarity, weight)| (*rarity, *weight)))
    }

    fn skin(id: &str, rarity: &str) -> Skin {
        Skin {
            id: id.to_string(),
            name: format!("Skin {id}"),
            rarity: rarity.to_string(),
            image_ref: format!("https://img.example.com/{id}.png"),
            cost: 3.0,
            case_id: "case-1".to_string(),
        }
    }

    fn detail(pairs: &[(&str, f64)], skins: Vec<Skin>) -> CaseDetail {
        CaseDetail {
            case: Case {
                id: "case-1".to_string(),
                name: "Chroma".to_string(),
                image_ref: String::new(),
                rarity_table: table(pairs),
            },
            skins,
        }
    }

    #[test]
    fn seventy_thirty_scenario() {
        let table = table(&[("A", 0.7), ("B", 0.3)]);
        assert_eq!(draw(&table, 0.5).unwrap(), "A");
        assert_eq!(draw(&table, 0.75).unwrap(), "B");
        assert_eq!(draw(&table, 1.0).unwrap(), "B");
    }

    #[test]
    fn boundary_sample_belongs_to_lower_rarity() {
        let table = table(&[("A", 1.0), ("B", 1.0)]);
        assert_eq!(draw(&table, 0.5).unwrap(), "A");
        assert_eq!(draw(&table, 0.0).unwrap(), "A");
    }

    #[test]
    fn normalization_is_unit_invariant() {
        let small = boundaries(&table(&[("A", 2.0), ("B", 2.0), ("C", 1.0)])).unwrap();
        let large = boundaries(&table(&[("A", 40.0), ("B", 40.0), ("C", 20.0)])).unwrap();
        assert_eq!(small, large);
        assert!((small[2] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn draw_is_closed_over_table() {
        let table = table(&[
            ("Mil-Spec", 79.92),
            ("Restricted", 15.98),
            ("Classified", 3.2),
            ("Covert", 0.64),
            ("Gold", 0.26),
        ]);
        let rarities = table.rarities().collect::<Vec<_>>();
        for step in 0..=1_000 {
            let sample = f64::from(step) / 1_000.0;
            let chosen = draw(&table, sample).unwrap();
            assert!(rarities.contains(&chosen));
        }
    }

    #[test]
    fn increasing_sample_visits_rarities_in_order_once() {
        let table = table(&[("A", 5.0), ("B", 3.0), ("C", 2.0)]);
        let mut visited: Vec<&str> = Vec::new();
        for step in 0..=10_000 {
            let chosen = draw(&table, f64::from(step) / 10_000.0).unwrap();
            if visited.last() != Some(&chosen) {
                visited.push(chosen);
            }
        }
        assert_eq!(visited, vec!["A", "B", "C"]);
    }

    #[test]
    fn overshoot_picks_last_rarity() {
        let table = table(&[("A", 0.1), ("B", 0.2), ("C", 0.7)]);
        assert_eq!(draw(&table, 1.000_000_1).unwrap(), "C");
    }

    #[test]
    fn zero_weight_rarity_is_never_chosen() {
        let table = table(&[("Ghost", 0.0), ("A", 1.0), ("Tail", 0.0)]);
        assert_eq!(draw(&table, 0.0).unwrap(), "A");
        assert_eq!(draw(&table, 1.5).unwrap(), "A");
    }

    #[test]
    fn invalid_tables_are_rejected() {
        for bad in [
            table(&[]),
            table(&[("A", 0.0), ("B", 0.0)]),
            table(&[("A", 1.0), ("B", -0.1)]),
            table(&[("A", f64::NAN)]),
        ] {
            let error = draw(&bad, 0.5).unwrap_err();
            assert!(matches!(error, Error::InvalidDistribution(_)), "{error}");
        }
    }

    #[test]
    fn pick_skin_is_uniform_over_pool() {
        let detail = detail(
            &[("A", 1.0), ("B", 1.0)],
            vec![skin("s1", "A"), skin("s2", "B"), skin("s3", "A")],
        );
        assert_eq!(pick_skin(&detail, "A", 0.0).unwrap().id, "s1");
        assert_eq!(pick_skin(&detail, "A", 0.49).unwrap().id, "s1");
        assert_eq!(pick_skin(&detail, "A", 0.5).unwrap().id, "s3");
        assert_eq!(pick_skin(&detail, "A", 1.0).unwrap().id, "s3");
    }

    #[test]
    fn pick_skin_reports_empty_pool() {
        let detail = detail(&[("A", 1.0), ("B", 1.0)], vec![skin("s1", "A")]);
        let error = pick_skin(&detail, "B", 0.3).unwrap_err();
        assert!(matches!(error, Error::EmptyRarityPool { .. }));
    }

    #[test]
    fn resolve_uses_two_independent_samples() {
        let detail = detail(
            &[("A", 0.7), ("B", 0.3)],
            vec![skin("a1", "A"), skin("b1", "B"), skin("b2", "B")],
        );
        let mut sampler = ScriptedSampler::new(vec![0.75, 0.9]);

        let outcome = resolve(&detail, "user-1", &mut sampler, 1_000).unwrap();
        assert_eq!(outcome.chosen_rarity, "B");
        assert_eq!(outcome.chosen_skin_id, "b2");
        assert_eq!(outcome.origin, DrawOrigin::LocalFallback);
        assert!((outcome.sample - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn resolve_rejects_invalid_table_before_sampling() {
        let detail = detail(&[("A", 0.0)], vec![skin("a1", "A")]);
        let mut sampler = ScriptedSampler::new(vec![0.2, 0.4]);

        assert!(resolve(&detail, "user-1", &mut sampler, 0).is_err());
        assert!((sampler.next_sample() - 0.2).abs() < f64::EPSILON);
    }
}
