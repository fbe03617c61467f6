//! Shared move endpoints
//!
//! Edits are first applied to an in-memory store holding every affected
//! variation, so identity-key checks run before anything is written.

use std::collections::BTreeSet;

use axum::{
    extract::{Query, State},
    Json,
};

use repertoire_core::notation::move_verbose;
use repertoire_core::{CoreError, Move, RelinkTarget};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::AppState;

/// GET /api/shared-move
///
/// Lists the shared moves registered for a position and every move played
/// from it.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<SharedMoveQuery>,
) -> Result<Json<SharedMoveListResponse>> {
    let key = query.key()?;
    let variation_ids = state.db.get_variation_ids_at_position(&key).await?;
    let candidate_ids: Vec<i64> = state
        .db
        .get_shared_moves_by_key(&key)
        .await?
        .iter()
        .map(|s| s.id)
        .collect();
    let store = state.db.load_store(&variation_ids, &candidate_ids).await?;

    let candidates = store
        .shared_candidates(&key)
        .into_iter()
        .map(|shared| SharedMoveInfo {
            id: shared.id(),
            content: shared.content.clone(),
            move_ids: store.moves_using(shared.id()),
        })
        .collect();

    let sharing = store.move_ids_sharing_position(&key.fen, &key.san, key.color);
    let moves = store
        .variations()
        .flat_map(|variation| {
            variation
                .moves
                .iter()
                .filter(|mv| sharing.contains(&mv.id))
                .map(|mv| PositionMove {
                    move_id: mv.id,
                    variation_id: variation.id,
                    variation_title: variation.title.clone(),
                    move_verbose: move_verbose(mv.sequence, &mv.san, &store.resolve_content(mv).annotation),
                    shared_move_id: mv.shared_move_id,
                })
        })
        .collect();

    Ok(Json(SharedMoveListResponse { candidates, moves }))
}

/// POST /api/shared-move
pub async fn apply(
    State(state): State<AppState>,
    Json(edit): Json<SharedMoveEdit>,
) -> Result<Json<SharedMoveEditResponse>> {
    let response = match edit {
        SharedMoveEdit::Edit {
            shared_move_id,
            content,
        } => {
            if !state.db.update_shared_content(shared_move_id, &content).await? {
                return Err(CoreError::SharedMoveNotFound(shared_move_id).into());
            }
            SharedMoveEditResponse {
                shared_move_id: Some(shared_move_id),
                move_ids: state.db.get_move_ids_for_shared(shared_move_id).await?,
            }
        }
        SharedMoveEdit::Detach { move_ids } => {
            let move_ids = distinct(move_ids)?;
            let variation_ids = state.db.get_variation_ids_for_moves(&move_ids).await?;
            let mut store = state.db.load_store(&variation_ids, &[]).await?;

            for id in &move_ids {
                store.detach_move(*id)?;
            }
            let detached = move_ids
                .iter()
                .map(|id| store.get_move(*id).cloned())
                .collect::<std::result::Result<Vec<Move>, CoreError>>()?;
            state.db.save_moves(&detached).await?;

            SharedMoveEditResponse {
                shared_move_id: None,
                move_ids,
            }
        }
        SharedMoveEdit::Relink {
            move_ids,
            shared_move_id,
            content,
        } => {
            let move_ids = distinct(move_ids)?;
            let variation_ids = state.db.get_variation_ids_for_moves(&move_ids).await?;
            let extra: Vec<i64> = shared_move_id.into_iter().collect();
            let mut store = state.db.load_store(&variation_ids, &extra).await?;

            let shared_move_id = match shared_move_id {
                Some(id) => {
                    store.relink_moves(&move_ids, RelinkTarget::Existing(id))?;
                    state.db.link_moves(&move_ids, id).await?;
                    id
                }
                None => {
                    let local_id = store.relink_moves(&move_ids, RelinkTarget::New(content.clone()))?;
                    let key = store.shared_move(local_id)?.key().clone();
                    state.db.create_shared_and_link(&key, &content, &move_ids).await?
                }
            };

            SharedMoveEditResponse {
                shared_move_id: Some(shared_move_id),
                move_ids,
            }
        }
    };

    tracing::info!(
        shared_move_id = ?response.shared_move_id,
        moves = response.move_ids.len(),
        "applied shared move edit"
    );
    Ok(Json(response))
}

fn distinct(move_ids: Vec<i64>) -> Result<Vec<i64>> {
    if move_ids.is_empty() {
        return Err(ApiError::BadRequest("move_ids must not be empty".to_string()));
    }
    Ok(move_ids.into_iter().collect::<BTreeSet<_>>().into_iter().collect())
}
