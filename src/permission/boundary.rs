//! Boundary-crossing checks for mechanically displaced terrain
//!
//! A push or pull may not carry terrain between wilderness and a claim,
//! between differently held plots, or across a plot that is up for sale.

use crate::core::error::ProtectionError;
use crate::spatial::coord::{BlockPos, Coordinate, Direction};
use crate::territory::index::TerritoryIndex;

/// Whether moving a terrain unit from `from` to `to` must be blocked
pub fn evaluate_move(index: &TerritoryIndex, from: &Coordinate, to: &Coordinate) -> bool {
    if from == to {
        return false;
    }

    let claims = index.lookup(from).and_then(|a| Ok((a, index.lookup(to)?)));
    let (source, destination) = match claims {
        Ok(pair) => pair,
        Err(ProtectionError::WorldNotFound(_)) => return false,
        Err(err) => {
            tracing::debug!("Blocking move {} -> {}: {}", from, to, err);
            return true;
        }
    };

    match (source, destination) {
        (None, None) => false,
        (Some(_), None) | (None, Some(_)) => true,
        (Some(a), Some(b)) => {
            if a.is_for_sale() || b.is_for_sale() {
                return true;
            }
            match (index.claim_holder(from), index.claim_holder(to)) {
                (Ok(holder_a), Ok(holder_b)) => holder_a != holder_b,
                (Err(err), _) | (_, Err(err)) => {
                    tracing::debug!("Blocking move {} -> {}: {}", from, to, err);
                    true
                }
            }
        }
    }
}

/// Whether any block in a multi-block push/pull crosses a blocked boundary
pub fn evaluate_block_moves(
    index: &TerritoryIndex,
    world: &str,
    blocks: &[BlockPos],
    direction: Direction,
) -> bool {
    let cell_size = index.cell_size();
    blocks.iter().any(|block| {
        let from = Coordinate {
            world: world.to_string(),
            cell: block.cell(cell_size),
        };
        let to = Coordinate {
            world: world.to_string(),
            cell: block.relative(direction).cell(cell_size),
        };
        evaluate_move(index, &from, &to)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{GroupId, SubjectId};
    use crate::spatial::coord::CellCoord;
    use crate::territory::claim::{Claim, Group};
    use crate::territory::world::WorldSettings;

    fn setup() -> TerritoryIndex {
        let mut index = TerritoryIndex::new(16);
        index.register_world("w", WorldSettings::default());
        index.register_group(Group::new(GroupId(1), "Ashford"));
        index.register_group(Group::new(GroupId(2), "Brook"));
        index
    }

    fn c(x: i32, z: i32) -> Coordinate {
        Coordinate::new("w", x, z)
    }

    fn claim(index: &mut TerritoryIndex, x: i32, z: i32, group: u32) {
        index
            .insert_claim("w", Claim::new(CellCoord::new(x, z), GroupId(group)))
            .unwrap();
    }

    fn held_claim(index: &mut TerritoryIndex, x: i32, z: i32, group: u32, holder: SubjectId) {
        index
            .insert_claim(
                "w",
                Claim::new(CellCoord::new(x, z), GroupId(group)).with_holder(holder),
            )
            .unwrap();
    }

    #[test]
    fn test_same_cell_never_blocks() {
        let mut index = setup();
        index
            .insert_claim(
                "w",
                Claim::new(CellCoord::new(0, 0), GroupId(1)).with_price(10),
            )
            .unwrap();
        assert!(!evaluate_move(&index, &c(0, 0), &c(0, 0)));
    }

    #[test]
    fn test_wilderness_to_wilderness_allowed() {
        let index = setup();
        assert!(!evaluate_move(&index, &c(0, 0), &c(1, 0)));
    }

    #[test]
    fn test_wilderness_claim_edge_blocks_both_ways() {
        let mut index = setup();
        claim(&mut index, 1, 0, 1);
        assert!(evaluate_move(&index, &c(0, 0), &c(1, 0)));
        assert!(evaluate_move(&index, &c(1, 0), &c(0, 0)));
    }

    #[test]
    fn test_group_owned_neighbours_allowed() {
        let mut index = setup();
        claim(&mut index, 0, 0, 1);
        claim(&mut index, 1, 0, 1);
        assert!(!evaluate_move(&index, &c(0, 0), &c(1, 0)));
    }

    #[test]
    fn test_unheld_plots_of_different_groups_allowed() {
        let mut index = setup();
        claim(&mut index, 0, 0, 1);
        claim(&mut index, 1, 0, 2);
        assert!(!evaluate_move(&index, &c(0, 0), &c(1, 0)));
        assert!(!evaluate_move(&index, &c(1, 0), &c(0, 0)));
    }

    #[test]
    fn test_different_groups_with_different_holders_block() {
        let mut index = setup();
        let first = SubjectId::new();
        let second = SubjectId::new();
        index.add_resident(first, GroupId(1));
        index.add_resident(second, GroupId(2));
        held_claim(&mut index, 0, 0, 1, first);
        held_claim(&mut index, 1, 0, 2, second);
        assert!(evaluate_move(&index, &c(0, 0), &c(1, 0)));
    }

    #[test]
    fn test_different_groups_with_price_block() {
        let mut index = setup();
        claim(&mut index, 0, 0, 1);
        claim(&mut index, 1, 0, 2);
        index.update_claim(&c(0, 0), |claim| claim.price = 250).unwrap();
        assert!(evaluate_move(&index, &c(0, 0), &c(1, 0)));
    }

    #[test]
    fn test_for_sale_blocks_even_with_same_holder() {
        let mut index = setup();
        let holder = SubjectId::new();
        index.add_resident(holder, GroupId(1));
        held_claim(&mut index, 0, 0, 1, holder);
        held_claim(&mut index, 1, 0, 1, holder);
        assert!(!evaluate_move(&index, &c(0, 0), &c(1, 0)));

        index.update_claim(&c(1, 0), |claim| claim.price = 0).unwrap();
        assert!(evaluate_move(&index, &c(0, 0), &c(1, 0)));
    }

    #[test]
    fn test_holder_mismatch_blocks() {
        let mut index = setup();
        let holder = SubjectId::new();
        index.add_resident(holder, GroupId(1));
        held_claim(&mut index, 0, 0, 1, holder);
        claim(&mut index, 1, 0, 1);
        assert!(evaluate_move(&index, &c(0, 0), &c(1, 0)));
    }

    #[test]
    fn test_broken_holder_reference_blocks() {
        let mut index = setup();
        let ghost = SubjectId::new();
        held_claim(&mut index, 0, 0, 1, ghost);
        held_claim(&mut index, 1, 0, 1, ghost);
        assert!(evaluate_move(&index, &c(0, 0), &c(1, 0)));
    }

    #[test]
    fn test_unknown_world_allows() {
        let index = setup();
        let from = Coordinate::new("x", 0, 0);
        let to = Coordinate::new("x", 1, 0);
        assert!(!evaluate_move(&index, &from, &to));
    }

    #[test]
    fn test_any_blocked_block_blocks_event() {
        let mut index = setup();
        claim(&mut index, 1, 0, 1);
        let inside = BlockPos::new(3, 64, 3);
        let edge = BlockPos::new(15, 64, 3);
        assert!(!evaluate_block_moves(&index, "w", &[inside], Direction::East));
        assert!(evaluate_block_moves(&index, "w", &[inside, edge], Direction::East));
        assert!(!evaluate_block_moves(&index, "w", &[], Direction::East));
    }

    #[test]
    fn test_move_at_world_edge_does_not_overflow() {
        let mut index = setup();
        claim(&mut index, 0, 0, 1);
        let edge = BlockPos::new(i32::MAX, 64, 0);
        assert!(!evaluate_block_moves(&index, "w", &[edge], Direction::East));
    }
}
