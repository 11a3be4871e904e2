// Formation choice: the valid shape whose best players sum highest.

use std::collections::HashMap;

use squadcast_core::{Formation, Position, VALID_FORMATIONS};

use crate::scoring::ScoredPlayer;

/// Best valid formation given each position's values, sorted descending.
///
/// Formations that need more players than a position has are skipped. Ties
/// keep the earlier formation in `VALID_FORMATIONS`.
pub fn best_formation(ranked: &HashMap<Position, Vec<f64>>) -> Option<(Formation, f64)> {
    let mut best: Option<(Formation, f64)> = None;

    for formation in VALID_FORMATIONS {
        let mut total = 0.0;
        let mut fits = true;
        for position in Position::ALL {
            let slots = formation.slots(position);
            let values = ranked.get(&position).map(Vec::as_slice).unwrap_or(&[]);
            if values.len() < slots {
                fits = false;
                break;
            }
            total += values[..slots].iter().sum::<f64>();
        }
        if !fits {
            continue;
        }
        match best {
            Some((_, best_total)) if total <= best_total => {}
            _ => best = Some((formation, total)),
        }
    }

    best
}

/// Suggest a formation for a selected squad from its players' scores.
pub fn suggest_formation(squad: &[ScoredPlayer]) -> Formation {
    let mut ranked: HashMap<Position, Vec<f64>> = HashMap::new();
    for sp in squad {
        ranked.entry(sp.player.position()).or_default().push(sp.total());
    }
    for values in ranked.values_mut() {
        values.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    }
    best_formation(&ranked).map_or_else(Formation::default, |(formation, _)| formation)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked(gk: &[f64], def: &[f64], mid: &[f64], fwd: &[f64]) -> HashMap<Position, Vec<f64>> {
        HashMap::from([
            (Position::Goalkeeper, gk.to_vec()),
            (Position::Defender, def.to_vec()),
            (Position::Midfielder, mid.to_vec()),
            (Position::Forward, fwd.to_vec()),
        ])
    }

    #[test]
    fn strong_forwards_pick_three_up_front() {
        let r = ranked(
            &[5.0, 1.0],
            &[4.0, 4.0, 4.0, 1.0, 1.0],
            &[6.0, 6.0, 6.0, 6.0, 1.0],
            &[9.0, 9.0, 9.0],
        );
        let (formation, total) = best_formation(&r).unwrap();
        assert_eq!(formation, Formation::new(3, 4, 3));
        assert!((total - (5.0 + 12.0 + 24.0 + 27.0)).abs() < 1e-9);
    }

    #[test]
    fn ties_keep_list_order() {
        let flat = ranked(&[1.0, 1.0], &[1.0; 5], &[1.0; 5], &[1.0; 3]);
        assert_eq!(best_formation(&flat).unwrap().0, VALID_FORMATIONS[0]);
    }

    #[test]
    fn short_positions_skip_formations() {
        let r = ranked(&[1.0], &[2.0; 5], &[1.0; 3], &[1.0; 2]);
        // only 3 mids and 2 forwards: 5-3-2 is the one shape that fits
        assert_eq!(best_formation(&r).unwrap().0, Formation::new(5, 3, 2));
        assert!(best_formation(&ranked(&[], &[1.0; 5], &[1.0; 5], &[1.0; 3])).is_none());
    }
}
