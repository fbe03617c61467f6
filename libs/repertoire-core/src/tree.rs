//! Move-tree store.
//!
//! Variations own their moves. Shared content lives in an arena keyed by
//! id; moves point into it with an optional id and the store keeps reverse
//! indexes (by identity key and by shared move) so a shared move never holds
//! its referents.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::{CoreError, Result};
use crate::types::{
    Color, Move, MoveContent, MoveId, SharedMove, SharedMoveId, SharedMoveKey, Variation, VariationId,
};

/// Target of a relink edit.
#[derive(Debug, Clone)]
pub enum RelinkTarget {
    Existing(SharedMoveId),
    /// Create a shared move from the moves' common key with this content.
    New(MoveContent),
}

#[derive(Debug, Default)]
pub struct MoveTreeStore {
    variations: BTreeMap<VariationId, Variation>,
    shared: BTreeMap<SharedMoveId, SharedMove>,
    next_shared_id: SharedMoveId,
    move_index: HashMap<MoveId, (VariationId, usize)>,
    position_index: HashMap<SharedMoveKey, BTreeSet<MoveId>>,
    referents: HashMap<SharedMoveId, BTreeSet<MoveId>>,
}

impl MoveTreeStore {
    pub fn new() -> Self {
        Self {
            next_shared_id: 1,
            ..Default::default()
        }
    }

    // === Read access ===

    pub fn get_variation(&self, id: VariationId) -> Result<&Variation> {
        self.variations.get(&id).ok_or(CoreError::VariationNotFound(id))
    }

    pub fn variations(&self) -> impl Iterator<Item = &Variation> {
        self.variations.values()
    }

    pub fn get_move(&self, id: MoveId) -> Result<&Move> {
        let (variation_id, index) = self.locate(id)?;
        Ok(&self.variations[&variation_id].moves[index])
    }

    pub fn shared_move(&self, id: SharedMoveId) -> Result<&SharedMove> {
        self.shared.get(&id).ok_or(CoreError::SharedMoveNotFound(id))
    }

    /// Content that applies to a move: its shared move's if linked, else its own.
    pub fn resolve_content<'a>(&'a self, mv: &'a Move) -> &'a MoveContent {
        match mv.shared_move_id.and_then(|id| self.shared.get(&id)) {
            Some(shared) => &shared.content,
            None => &mv.content,
        }
    }

    /// Every move, in any variation, played from this position with this SAN.
    pub fn move_ids_sharing_position(&self, fen: &str, san: &str, color: Color) -> BTreeSet<MoveId> {
        let key = SharedMoveKey::new(fen, san, color);
        self.position_index.get(&key).cloned().unwrap_or_default()
    }

    /// Shared moves registered under an identity key, oldest first.
    pub fn shared_candidates(&self, key: &SharedMoveKey) -> Vec<&SharedMove> {
        self.shared.values().filter(|s| s.key() == key).collect()
    }

    /// Moves currently linked to a shared move.
    pub fn moves_using(&self, shared_id: SharedMoveId) -> Vec<MoveId> {
        self.referents
            .get(&shared_id)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    // === Loading ===

    /// Register an existing shared move (e.g. loaded from storage).
    pub fn insert_shared_move(&mut self, shared: SharedMove) -> Result<()> {
        let id = shared.id();
        self.next_shared_id = self.next_shared_id.max(id + 1);
        self.shared.insert(id, shared);
        Ok(())
    }

    /// Register a variation. Every shared move it references must already be
    /// present and carry the matching identity key.
    pub fn insert_variation(&mut self, variation: Variation) -> Result<()> {
        if self.variations.contains_key(&variation.id) {
            return Err(CoreError::DuplicateVariation(variation.id));
        }
        let mut seen = BTreeSet::new();
        for mv in &variation.moves {
            if self.move_index.contains_key(&mv.id) || !seen.insert(mv.id) {
                return Err(CoreError::DuplicateMove(mv.id));
            }
            if let Some(shared_id) = mv.shared_move_id {
                self.check_key(mv.id, &variation.shared_key_for(mv), shared_id)?;
            }
        }

        for (index, mv) in variation.moves.iter().enumerate() {
            self.move_index.insert(mv.id, (variation.id, index));
            self.position_index
                .entry(variation.shared_key_for(mv))
                .or_default()
                .insert(mv.id);
            if let Some(shared_id) = mv.shared_move_id {
                self.referents.entry(shared_id).or_default().insert(mv.id);
            }
        }
        self.variations.insert(variation.id, variation);
        Ok(())
    }

    // === Edits ===

    /// Create a shared move for a key and return its id.
    pub fn create_shared_move(&mut self, key: SharedMoveKey, content: MoveContent) -> SharedMoveId {
        let id = self.next_shared_id;
        self.next_shared_id += 1;
        self.shared.insert(id, SharedMove::new(id, key, content));
        id
    }

    /// Replace a shared move's content. Its key is untouched.
    pub fn edit_shared_content(&mut self, id: SharedMoveId, content: MoveContent) -> Result<()> {
        let shared = self.shared.get_mut(&id).ok_or(CoreError::SharedMoveNotFound(id))?;
        shared.content = content;
        Ok(())
    }

    /// Detach a move from its shared move, copying the shared content back
    /// onto the move so nothing visible changes.
    pub fn detach_move(&mut self, move_id: MoveId) -> Result<()> {
        let (variation_id, index) = self.locate(move_id)?;
        let Some(shared_id) = self.variations[&variation_id].moves[index].shared_move_id else {
            return Ok(());
        };
        let content = self.shared_move(shared_id)?.content.clone();

        if let Some(variation) = self.variations.get_mut(&variation_id) {
            let mv = &mut variation.moves[index];
            mv.content = content;
            mv.shared_move_id = None;
        }
        if let Some(ids) = self.referents.get_mut(&shared_id) {
            ids.remove(&move_id);
        }
        Ok(())
    }

    /// Link one move to a shared move with the same identity key.
    pub fn link_move(&mut self, move_id: MoveId, shared_id: SharedMoveId) -> Result<()> {
        let key = self.key_of(move_id)?;
        self.check_key(move_id, &key, shared_id)?;
        self.set_link(move_id, shared_id)
    }

    /// Point a group of moves at one shared move, existing or new.
    ///
    /// All moves must share one identity key; nothing changes if any check fails.
    pub fn relink_moves(&mut self, move_ids: &[MoveId], target: RelinkTarget) -> Result<SharedMoveId> {
        if move_ids.is_empty() {
            return Err(CoreError::NothingToRelink);
        }
        let keys = move_ids
            .iter()
            .map(|id| self.key_of(*id).map(|key| (*id, key)))
            .collect::<Result<Vec<_>>>()?;

        let shared_id = match target {
            RelinkTarget::Existing(shared_id) => {
                for (move_id, key) in &keys {
                    self.check_key(*move_id, key, shared_id)?;
                }
                shared_id
            }
            RelinkTarget::New(content) => {
                let Some((first_id, first_key)) = keys.first() else {
                    return Err(CoreError::NothingToRelink);
                };
                if let Some((move_id, _)) = keys.iter().find(|(_, key)| key != first_key) {
                    return Err(CoreError::SharedMoveMismatch {
                        move_id: *move_id,
                        shared_move_id: 0,
                        reason: format!("position differs from move {first_id}"),
                    });
                }
                self.create_shared_move(first_key.clone(), content)
            }
        };

        for (move_id, _) in &keys {
            self.set_link(*move_id, shared_id)?;
        }
        tracing::debug!(shared_id, moves = keys.len(), "relinked moves");
        Ok(shared_id)
    }

    fn set_link(&mut self, move_id: MoveId, shared_id: SharedMoveId) -> Result<()> {
        let (variation_id, index) = self.locate(move_id)?;
        let previous = self
            .variations
            .get_mut(&variation_id)
            .map(|v| v.moves[index].shared_move_id.replace(shared_id))
            .ok_or(CoreError::VariationNotFound(variation_id))?;

        if let Some(old) = previous.filter(|old| *old != shared_id) {
            if let Some(ids) = self.referents.get_mut(&old) {
                ids.remove(&move_id);
            }
        }
        self.referents.entry(shared_id).or_default().insert(move_id);
        Ok(())
    }

    fn locate(&self, move_id: MoveId) -> Result<(VariationId, usize)> {
        self.move_index
            .get(&move_id)
            .copied()
            .ok_or(CoreError::MoveNotFound(move_id))
    }

    fn key_of(&self, move_id: MoveId) -> Result<SharedMoveKey> {
        let (variation_id, index) = self.locate(move_id)?;
        let variation = &self.variations[&variation_id];
        Ok(variation.shared_key_for(&variation.moves[index]))
    }

    fn check_key(&self, move_id: MoveId, key: &SharedMoveKey, shared_id: SharedMoveId) -> Result<()> {
        let shared = self.shared_move(shared_id)?;
        let expected = shared.key();
        let reason = if expected.fen != key.fen {
            format!("FEN {} != {}", key.fen, expected.fen)
        } else if expected.san != key.san {
            format!("SAN {} != {}", key.san, expected.san)
        } else if expected.color != key.color {
            format!("color {} != {}", key.color.as_str(), expected.color.as_str())
        } else {
            return Ok(());
        };
        Err(CoreError::SharedMoveMismatch {
            move_id,
            shared_move_id: shared_id,
            reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReviewState;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
    const AFTER_E5: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2";

    fn variation(id: VariationId, first_move_id: MoveId, color: Color) -> Variation {
        Variation {
            id,
            title: format!("Line {id}"),
            chapter_id: 1,
            color,
            start_move: 1,
            moves: vec![
                Move::new(first_move_id, 0, "e4", AFTER_E4).with_content(MoveContent {
                    text: format!("own text {id}"),
                    ..Default::default()
                }),
                Move::new(first_move_id + 1, 1, "e5", AFTER_E5),
            ],
            review: ReviewState::unreviewed(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()),
        }
    }

    fn shared_text(text: &str) -> MoveContent {
        MoveContent {
            text: text.to_string(),
            alt: "d4".to_string(),
            ..Default::default()
        }
    }

    fn store_with_two_lines() -> MoveTreeStore {
        let mut store = MoveTreeStore::new();
        store.insert_variation(variation(1, 10, Color::White)).unwrap();
        store.insert_variation(variation(2, 20, Color::White)).unwrap();
        store.insert_variation(variation(3, 30, Color::Black)).unwrap();
        store
    }

    #[test]
    fn unshared_move_resolves_own_content() {
        let store = store_with_two_lines();
        let mv = store.get_move(10).unwrap();
        assert_eq!(store.resolve_content(mv).text, "own text 1");
    }

    #[test]
    fn position_index_is_per_color() {
        let store = store_with_two_lines();
        let white = store.move_ids_sharing_position(AFTER_E4, "e4", Color::White);
        assert_eq!(white.into_iter().collect::<Vec<_>>(), vec![10, 20]);
        let black = store.move_ids_sharing_position(AFTER_E4, "e4", Color::Black);
        assert_eq!(black.into_iter().collect::<Vec<_>>(), vec![30]);
        assert!(store.move_ids_sharing_position(AFTER_E4, "d4", Color::White).is_empty());
    }

    #[test]
    fn relinked_group_sees_one_edit() {
        let mut store = store_with_two_lines();
        let shared_id = store
            .relink_moves(&[10, 20], RelinkTarget::New(shared_text("shared")))
            .unwrap();

        store.edit_shared_content(shared_id, shared_text("edited once")).unwrap();

        for id in [10, 20] {
            let mv = store.get_move(id).unwrap();
            assert_eq!(store.resolve_content(mv).text, "edited once");
        }
        assert_eq!(store.moves_using(shared_id), vec![10, 20]);
        assert_eq!(store.shared_move(shared_id).unwrap().key().san, "e4");
    }

    #[test]
    fn detach_keeps_visible_content() {
        let mut store = store_with_two_lines();
        let shared_id = store
            .relink_moves(&[10, 20], RelinkTarget::New(shared_text("shared")))
            .unwrap();

        store.detach_move(20).unwrap();
        store.edit_shared_content(shared_id, shared_text("later")).unwrap();

        let detached = store.get_move(20).unwrap();
        assert_eq!(detached.shared_move_id, None);
        assert_eq!(store.resolve_content(detached).text, "shared");
        assert_eq!(store.resolve_content(store.get_move(10).unwrap()).text, "later");
        assert_eq!(store.moves_using(shared_id), vec![10]);
    }

    #[test]
    fn relink_to_existing_moves_between_shared_moves() {
        let mut store = store_with_two_lines();
        let key = SharedMoveKey::new(AFTER_E4, "e4", Color::White);
        let first = store.create_shared_move(key.clone(), shared_text("first"));
        let second = store.create_shared_move(key.clone(), shared_text("second"));

        store.link_move(10, first).unwrap();
        store.link_move(20, first).unwrap();
        store.relink_moves(&[20], RelinkTarget::Existing(second)).unwrap();

        assert_eq!(store.moves_using(first), vec![10]);
        assert_eq!(store.moves_using(second), vec![20]);
        assert_eq!(store.shared_candidates(&key).len(), 2);
    }

    #[test]
    fn key_mismatch_is_rejected_without_partial_changes() {
        let mut store = store_with_two_lines();
        let key = SharedMoveKey::new(AFTER_E4, "e4", Color::White);
        let shared_id = store.create_shared_move(key, shared_text("white only"));

        let err = store
            .relink_moves(&[10, 30], RelinkTarget::Existing(shared_id))
            .unwrap_err();
        assert!(matches!(err, CoreError::SharedMoveMismatch { move_id: 30, .. }));
        assert_eq!(store.get_move(10).unwrap().shared_move_id, None);

        let err = store.relink_moves(&[10, 11], RelinkTarget::New(MoveContent::default()));
        assert!(matches!(err, Err(CoreError::SharedMoveMismatch { move_id: 11, .. })));
    }

    #[test]
    fn insert_rejects_dangling_or_mismatched_links() {
        let mut store = MoveTreeStore::new();
        let mut line = variation(1, 10, Color::White);
        line.moves[0].shared_move_id = Some(99);
        assert!(matches!(
            store.insert_variation(line),
            Err(CoreError::SharedMoveNotFound(99))
        ));

        store
            .insert_shared_move(SharedMove::new(
                5,
                SharedMoveKey::new(AFTER_E4, "d4", Color::White),
                MoveContent::default(),
            ))
            .unwrap();
        let mut line = variation(1, 10, Color::White);
        line.moves[0].shared_move_id = Some(5);
        assert!(matches!(
            store.insert_variation(line),
            Err(CoreError::SharedMoveMismatch { .. })
        ));
        assert!(matches!(store.get_variation(1), Err(CoreError::VariationNotFound(1))));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut store = store_with_two_lines();
        assert!(matches!(
            store.insert_variation(variation(1, 90, Color::White)),
            Err(CoreError::DuplicateVariation(1))
        ));
        assert!(matches!(
            store.insert_variation(variation(9, 10, Color::White)),
            Err(CoreError::DuplicateMove(10))
        ));

        let mut repeated = variation(8, 80, Color::White);
        repeated.moves[1].id = 80;
        assert!(matches!(store.insert_variation(repeated), Err(CoreError::DuplicateMove(80))));
        assert!(matches!(store.get_move(80), Err(CoreError::MoveNotFound(80))));
    }

    #[test]
    fn relinking_nothing_is_rejected() {
        let mut store = store_with_two_lines();
        assert!(matches!(
            store.relink_moves(&[], RelinkTarget::New(shared_text("empty"))),
            Err(CoreError::NothingToRelink)
        ));
        let shared = store.create_shared_move(SharedMoveKey::new(AFTER_E4, "e4", Color::White), shared_text("x"));
        assert!(matches!(
            store.relink_moves(&[], RelinkTarget::Existing(shared)),
            Err(CoreError::NothingToRelink)
        ));
    }

    #[test]
    fn loaded_shared_ids_do_not_collide_with_new_ones() {
        let mut store = MoveTreeStore::new();
        store
            .insert_shared_move(SharedMove::new(
                41,
                SharedMoveKey::new(AFTER_E4, "e4", Color::White),
                MoveContent::default(),
            ))
            .unwrap();
        let id = store.create_shared_move(SharedMoveKey::new(AFTER_E5, "e5", Color::Black), MoveContent::default());
        assert_eq!(id, 42);
    }
}
