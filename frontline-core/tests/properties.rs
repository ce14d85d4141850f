//! Property tests for retreat paths, flags and hit counting

use frontline_core::board::{all_hexes, Baseline};
use frontline_core::combat::{count_flags, count_hits, handle_flags, retreat_paths};
use frontline_core::{DieFace, HexCoord, UnitKind};
use proptest::prelude::*;

fn on_board_hex() -> impl Strategy<Value = HexCoord> {
    let hexes: Vec<HexCoord> = all_hexes().collect();
    prop::sample::select(hexes)
}

fn blocked_hexes() -> impl Strategy<Value = Vec<HexCoord>> {
    prop::collection::vec(on_board_hex(), 0..25)
}

fn baseline() -> impl Strategy<Value = Baseline> {
    prop_oneof![Just(Baseline::North), Just(Baseline::South)]
}

fn faces() -> impl Strategy<Value = Vec<DieFace>> {
    prop::collection::vec(prop::sample::select(DieFace::FACES.to_vec()), 0..8)
}

proptest! {
    #[test]
    fn retreat_rings_step_toward_baseline(
        start in on_board_hex(),
        blocked in blocked_hexes(),
        side in baseline(),
        distance in 0u8..4,
    ) {
        let paths = retreat_paths(start, distance, side, |h| blocked.contains(&h));
        let step = match side {
            Baseline::North => -1,
            Baseline::South => 1,
        };

        prop_assert!(paths.max_distance() <= distance);
        prop_assert_eq!(paths.ring(0), &[start][..]);
        for d in 1..=paths.max_distance() {
            let ring = paths.ring(d);
            prop_assert!(!ring.is_empty());
            prop_assert!(ring.len() <= paths.ring(d - 1).len() + 1);
            for hex in ring {
                prop_assert!(hex.is_on_board());
                prop_assert!(!blocked.contains(hex));
                prop_assert_eq!(hex.r, start.r + step * d as i16);
            }
        }
    }

    #[test]
    fn retreat_paths_are_deterministic(
        start in on_board_hex(),
        blocked in blocked_hexes(),
        side in baseline(),
    ) {
        let first = retreat_paths(start, 3, side, |h| blocked.contains(&h));
        let second = retreat_paths(start, 3, side, |h| blocked.contains(&h));
        prop_assert_eq!(first, second);
    }

    #[test]
    fn unretreated_flags_become_damage(
        start in on_board_hex(),
        blocked in blocked_hexes(),
        side in baseline(),
        flags in 1u8..4,
    ) {
        let paths = retreat_paths(start, flags, side, |h| blocked.contains(&h));
        let result = handle_flags(flags, 0, &paths);
        let achieved = paths.max_distance().min(flags);
        prop_assert_eq!(result.damage + achieved, flags);
        prop_assert_eq!(result.candidates.is_empty(), achieved == 0);
    }

    #[test]
    fn ignorable_flag_never_adds_damage(
        start in on_board_hex(),
        blocked in blocked_hexes(),
        side in baseline(),
        flags in 1u8..4,
    ) {
        let paths = retreat_paths(start, flags, side, |h| blocked.contains(&h));
        let plain = handle_flags(flags, 0, &paths);
        let fortified = handle_flags(flags, 1, &paths);
        prop_assert!(fortified.damage <= plain.damage);
        if fortified.damage == 0 {
            prop_assert!(!fortified.candidates.is_empty());
        }

        // Each offered hex plus the damage never accounts for more than the flags
        for candidate in &fortified.candidates {
            let retreated = start.r.abs_diff(candidate.r) as u8;
            prop_assert!(fortified.damage + retreated <= flags);
        }
        // Holding the start hex is only offered when a lone flag is ignored
        let holds = fortified.candidates.contains(&start);
        prop_assert_eq!(holds, flags == 1 && fortified.damage == 0);
    }

    #[test]
    fn hits_and_flags_never_exceed_dice(roll in faces(), stars_hit in any::<bool>()) {
        for kind in [UnitKind::Infantry, UnitKind::Armor] {
            let hits = count_hits(&roll, kind, stars_hit) as usize;
            let flags = count_flags(&roll) as usize;
            prop_assert!(hits + flags <= roll.len());
        }
    }
}

#[test]
fn test_known_roll_hits() {
    use DieFace::*;
    let roll = [Infantry, Infantry, Armor, Grenade];
    assert_eq!(count_hits(&roll, UnitKind::Infantry, false), 3);
    assert_eq!(count_hits(&roll, UnitKind::Armor, false), 2);
}
