//! Admin REST endpoint handlers.
//!
//! Every route here sits behind [`require_admin`](crate::auth::require_admin)
//! and every write records an audit entry naming the [`Actor`].
//!
//! # Endpoints (all under `/api/admin`)
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` `POST` | `/networks` | List / create networks |
//! | `GET` `PUT` `DELETE` | `/networks/{id}` | Read / replace / delete a network |
//! | `GET` `PUT` | `/networks/{id}/affiliate` | Read / upsert affiliate details |
//! | `GET` `POST` | `/offers` | List (any status) / create offers |
//! | `GET` `PUT` `DELETE` | `/offers/{id}` | Read / replace / delete an offer |
//! | `POST` | `/offers/bulk` | Patch many offers |
//! | `POST` | `/offers/import` | Import offers from sheet rows |
//! | `GET` `POST` | `/banners` | List / create banners |
//! | `DELETE` | `/banners/{id}` | Delete a banner |
//! | `GET` `POST` | `/rotations` | List / create rotations |
//! | `DELETE` | `/rotations/{id}` | Delete a rotation |
//! | `GET` `POST` | `/master-data` | List / create pick-list values |
//! | `DELETE` | `/master-data/{id}` | Delete a pick-list value |
//! | `GET` | `/audit-logs` | Audit trail, newest first |
//! | `GET` | `/network-requests` | Join requests |
//! | `POST` | `/network-requests/{id}/approve` | Approve a join request |
//! | `POST` | `/network-requests/{id}/reject` | Reject a join request |

use std::collections::BTreeSet;
use std::sync::Arc;

use affiliate_core::browse::{self, OfferQuery};
use affiliate_core::bulk::{BulkOutcome, apply_patch};
use affiliate_core::import::{self, ImportReport, ImportRequest, RowFailure};
use affiliate_core::placement::overlapping_banner_ids;
use affiliate_core::{ValidationError, WithCountdown, audit, validation};
use affiliate_types::{
    AffiliateDetailsDraft, AuditAction, Banner, BannerDraft, BannerId, BannerRotation,
    BulkOfferEdit, MasterDataCategory, MasterDataDraft, MasterDataId, NetworkDraft, NetworkId,
    NetworkRequestId, NetworkRequestStatus, NewAuditEntry, OfferDraft, OfferId, RotationDraft,
    RotationId,
};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::auth::Actor;
use crate::error::{ApiError, parse_uuid};
use crate::extract::{ApiJson, ApiQuery};
use crate::state::AppState;

/// Audit rows returned when `limit` is absent.
pub const DEFAULT_AUDIT_LIMIT: usize = 100;

/// Most audit rows one request may return.
pub const MAX_AUDIT_LIMIT: usize = 1_000;

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

/// Query parameters for `GET /api/admin/master-data`.
#[derive(Debug, Deserialize)]
pub struct MasterDataQuery {
    /// Restrict to one pick-list.
    pub category: Option<String>,
}

/// Query parameters for `GET /api/admin/audit-logs`.
#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    /// Restrict to one entity table.
    pub entity: Option<String>,
    /// Maximum number of entries (default 100, max 1000).
    pub limit: Option<usize>,
}

/// Query parameters for `GET /api/admin/network-requests`.
#[derive(Debug, Deserialize)]
pub struct RequestQuery {
    /// Restrict to one review state.
    pub status: Option<String>,
}

/// A newly stored rotation plus members it shares with other active
/// rotations.
#[derive(Debug, Serialize)]
pub struct RotationCreated {
    /// The stored rotation.
    #[serde(flatten)]
    pub rotation: BannerRotation,
    /// Members already claimed by another active rotation.
    pub overlapping_banner_ids: Vec<BannerId>,
}

// ---------------------------------------------------------------------------
// Audit helper
// ---------------------------------------------------------------------------

/// Store an audit entry. The audited write has already committed, so a
/// failure here is logged rather than returned.
async fn record(state: &AppState, entry: Option<NewAuditEntry>) {
    let Some(entry) = entry else {
        return;
    };
    if let Err(e) = state.directory.record_audit(&entry).await {
        error!(
            entity = %entry.entity,
            entity_id = %entry.entity_id,
            error = %e,
            "failed to record audit entry"
        );
    }
}

// ---------------------------------------------------------------------------
// Networks
// ---------------------------------------------------------------------------

/// Every network.
pub async fn list_networks(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.directory.list_networks().await?))
}

/// Create a network.
pub async fn create_network(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    ApiJson(mut draft): ApiJson<NetworkDraft>,
) -> Result<impl IntoResponse, ApiError> {
    validation::validate_network(&mut draft)?;
    let network = state.directory.insert_network(&draft).await?;
    record(
        &state,
        Some(audit::created(
            audit::NETWORKS,
            network.id.into_inner(),
            AuditAction::Create,
            Some(actor.as_str()),
            &network,
        )),
    )
    .await;
    info!(network_id = %network.id, "network created");
    Ok((StatusCode::CREATED, Json(network)))
}

/// A single network.
pub async fn get_network(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: NetworkId = parse_uuid(&id_str)?;
    let network = state
        .directory
        .get_network(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("network {id}")))?;
    Ok(Json(network))
}

/// Replace a network's editable fields.
pub async fn update_network(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    actor: Actor,
    ApiJson(mut draft): ApiJson<NetworkDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let id: NetworkId = parse_uuid(&id_str)?;
    validation::validate_network(&mut draft)?;
    let before = state
        .directory
        .get_network(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("network {id}")))?;
    let after = state
        .directory
        .update_network(id, &draft)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("network {id}")))?;
    record(
        &state,
        audit::updated(
            audit::NETWORKS,
            id.into_inner(),
            AuditAction::Update,
            Some(actor.as_str()),
            &before,
            &after,
        ),
    )
    .await;
    Ok(Json(after))
}

/// Delete a network. Its offers stay, detached from any network.
pub async fn delete_network(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    actor: Actor,
) -> Result<impl IntoResponse, ApiError> {
    let id: NetworkId = parse_uuid(&id_str)?;
    let removed = state
        .directory
        .delete_network(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("network {id}")))?;
    record(
        &state,
        Some(audit::deleted(
            audit::NETWORKS,
            id.into_inner(),
            Some(actor.as_str()),
            &removed,
        )),
    )
    .await;
    info!(network_id = %id, "network deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// A network's private account details; `null` when none are stored.
pub async fn get_affiliate_details(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: NetworkId = parse_uuid(&id_str)?;
    if state.directory.get_network(id).await?.is_none() {
        return Err(ApiError::NotFound(format!("network {id}")));
    }
    Ok(Json(state.directory.affiliate_details(id).await?))
}

/// Create or replace a network's private account details.
pub async fn put_affiliate_details(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    actor: Actor,
    ApiJson(draft): ApiJson<AffiliateDetailsDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let id: NetworkId = parse_uuid(&id_str)?;
    validation::validate_affiliate_details(&draft)?;
    if state.directory.get_network(id).await?.is_none() {
        return Err(ApiError::NotFound(format!("network {id}")));
    }
    let before = state.directory.affiliate_details(id).await?;
    let after = state.directory.upsert_affiliate_details(id, &draft).await?;
    let entry = match &before {
        Some(before) => audit::updated(
            audit::AFFILIATE_DETAILS,
            id.into_inner(),
            AuditAction::Update,
            Some(actor.as_str()),
            before,
            &after,
        ),
        None => Some(audit::created(
            audit::AFFILIATE_DETAILS,
            id.into_inner(),
            AuditAction::Create,
            Some(actor.as_str()),
            &after,
        )),
    };
    record(&state, entry).await;
    Ok(Json(after))
}

// ---------------------------------------------------------------------------
// Offers
// ---------------------------------------------------------------------------

/// Reject a draft whose `network_id` names no stored network.
async fn ensure_network(state: &AppState, network_id: Option<NetworkId>) -> Result<(), ApiError> {
    if let Some(id) = network_id
        && state.directory.get_network(id).await?.is_none()
    {
        let mut err = ValidationError::default();
        err.add("network_id", format!("unknown network {id}"));
        return Err(err.into());
    }
    Ok(())
}

/// Offers in any status, filtered and paged like the public listing.
pub async fn list_offers(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<OfferQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let offers = state.directory.list_offers().await?;
    Ok(Json(browse::filter_offers(offers, &query, None)?))
}

/// Create an offer.
pub async fn create_offer(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    ApiJson(mut draft): ApiJson<OfferDraft>,
) -> Result<impl IntoResponse, ApiError> {
    validation::validate_offer(&mut draft)?;
    ensure_network(&state, draft.network_id).await?;
    let offer = state.directory.insert_offer(&draft).await?;
    record(
        &state,
        Some(audit::created(
            audit::OFFERS,
            offer.id.into_inner(),
            AuditAction::Create,
            Some(actor.as_str()),
            &offer,
        )),
    )
    .await;
    info!(offer_id = %offer.id, "offer created");
    Ok((StatusCode::CREATED, Json(offer)))
}

/// A single offer, any status.
pub async fn get_offer(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: OfferId = parse_uuid(&id_str)?;
    let offer = state
        .directory
        .get_offer(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("offer {id}")))?;
    let expires_at = offer.expires_at;
    Ok(Json(WithCountdown::new(offer, expires_at, Utc::now())))
}

/// Replace an offer's editable fields.
pub async fn update_offer(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    actor: Actor,
    ApiJson(mut draft): ApiJson<OfferDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let id: OfferId = parse_uuid(&id_str)?;
    validation::validate_offer(&mut draft)?;
    ensure_network(&state, draft.network_id).await?;
    let before = state
        .directory
        .get_offer(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("offer {id}")))?;
    let after = state
        .directory
        .update_offer(id, &draft)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("offer {id}")))?;
    record(
        &state,
        audit::updated(
            audit::OFFERS,
            id.into_inner(),
            AuditAction::Update,
            Some(actor.as_str()),
            &before,
            &after,
        ),
    )
    .await;
    Ok(Json(after))
}

/// Delete an offer.
pub async fn delete_offer(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    actor: Actor,
) -> Result<impl IntoResponse, ApiError> {
    let id: OfferId = parse_uuid(&id_str)?;
    let removed = state
        .directory
        .delete_offer(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("offer {id}")))?;
    record(
        &state,
        Some(audit::deleted(audit::OFFERS, id.into_inner(), Some(actor.as_str()), &removed)),
    )
    .await;
    Ok(StatusCode::NO_CONTENT)
}

/// Apply one patch to many offers.
///
/// Each offer is saved independently; a concurrent edit of the same offer
/// may be overwritten.
pub async fn bulk_edit_offers(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    ApiJson(edit): ApiJson<BulkOfferEdit>,
) -> Result<impl IntoResponse, ApiError> {
    validation::validate_bulk_edit(&edit)?;
    if let Some(network_id) = edit.patch.network_id {
        ensure_network(&state, network_id).await?;
    }

    let mut seen = BTreeSet::new();
    let ids: Vec<OfferId> = edit.ids.iter().copied().filter(|id| seen.insert(*id)).collect();
    let found = state.directory.get_offers(&ids).await?;

    let mut outcome = BulkOutcome::default();
    for id in ids {
        let Some(before) = found.iter().find(|o| o.id == id) else {
            outcome.missing.push(id);
            continue;
        };
        let mut offer = before.clone();
        if !apply_patch(&mut offer, &edit.patch) {
            outcome.unchanged.push(id);
            continue;
        }
        match state.directory.save_offer(&offer).await? {
            Some(after) => {
                record(
                    &state,
                    audit::updated(
                        audit::OFFERS,
                        id.into_inner(),
                        AuditAction::BulkUpdate,
                        Some(actor.as_str()),
                        before,
                        &after,
                    ),
                )
                .await;
                outcome.updated.push(id);
            }
            None => outcome.missing.push(id),
        }
    }

    info!(
        updated = outcome.updated.len(),
        unchanged = outcome.unchanged.len(),
        missing = outcome.missing.len(),
        "bulk offer edit applied"
    );
    Ok(Json(outcome))
}

/// Create offers from spreadsheet rows.
pub async fn import_offers(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    ApiJson(request): ApiJson<ImportRequest>,
) -> Result<impl IntoResponse, ApiError> {
    import::check_request(&request)?;
    let networks = state.directory.list_networks().await?;
    let (drafts, mut failed) = import::map_rows(&request, &networks);

    let mut report = ImportReport {
        total: request.rows.len(),
        dry_run: request.dry_run,
        ..ImportReport::default()
    };

    if request.dry_run {
        report.imported = drafts.len();
    } else {
        for (row, draft) in drafts {
            match state.directory.insert_offer(&draft).await {
                Ok(offer) => {
                    record(
                        &state,
                        Some(audit::created(
                            audit::OFFERS,
                            offer.id.into_inner(),
                            AuditAction::Import,
                            Some(actor.as_str()),
                            &offer,
                        )),
                    )
                    .await;
                    report.offer_ids.push(offer.id);
                }
                Err(e) => {
                    warn!(row, error = %e, "import row failed to store");
                    failed.push(RowFailure {
                        row,
                        errors: vec![e.to_string()],
                    });
                }
            }
        }
        report.imported = report.offer_ids.len();
    }

    failed.sort_by_key(|f| f.row);
    report.failed = failed;
    info!(
        total = report.total,
        imported = report.imported,
        failed = report.failed.len(),
        dry_run = report.dry_run,
        "offer import finished"
    );
    Ok(Json(report))
}

// ---------------------------------------------------------------------------
// Banners and rotations
// ---------------------------------------------------------------------------

/// Every banner with its countdown.
pub async fn list_banners(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let now = Utc::now();
    let banners: Vec<WithCountdown<Banner>> = state
        .directory
        .list_banners()
        .await?
        .into_iter()
        .map(|b| {
            let expires_at = b.expires_at;
            WithCountdown::new(b, expires_at, now)
        })
        .collect();
    Ok(Json(banners))
}

/// Create a banner.
pub async fn create_banner(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    ApiJson(mut draft): ApiJson<BannerDraft>,
) -> Result<impl IntoResponse, ApiError> {
    validation::validate_banner(&mut draft, Utc::now())?;
    let banner = state.directory.insert_banner(&draft).await?;
    record(
        &state,
        Some(audit::created(
            audit::BANNERS,
            banner.id.into_inner(),
            AuditAction::Create,
            Some(actor.as_str()),
            &banner,
        )),
    )
    .await;
    Ok((StatusCode::CREATED, Json(banner)))
}

/// Delete a banner and strip it from every rotation.
pub async fn delete_banner(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    actor: Actor,
) -> Result<impl IntoResponse, ApiError> {
    let id: BannerId = parse_uuid(&id_str)?;
    let (removed, touched) = state
        .directory
        .delete_banner(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("banner {id}")))?;

    let min_members = state.config.placement.min_rotation_members;
    for rotation in &touched {
        if rotation.banner_ids.len() < min_members {
            warn!(
                rotation_id = %rotation.id,
                members = rotation.banner_ids.len(),
                min_members,
                "rotation left below minimum size after banner delete"
            );
        }
        record(
            &state,
            Some(NewAuditEntry {
                entity: audit::ROTATIONS.to_owned(),
                entity_id: rotation.id.into_inner(),
                action: AuditAction::Update,
                actor: Some(actor.0.clone()),
                changes: serde_json::json!({"banner_ids": {"removed": [id]}}),
            }),
        )
        .await;
    }
    record(
        &state,
        Some(audit::deleted(audit::BANNERS, id.into_inner(), Some(actor.as_str()), &removed)),
    )
    .await;
    Ok(StatusCode::NO_CONTENT)
}

/// Every rotation with its countdown.
pub async fn list_rotations(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let now = Utc::now();
    let rotations: Vec<WithCountdown<BannerRotation>> = state
        .directory
        .list_rotations()
        .await?
        .into_iter()
        .map(|r| {
            let expires_at = r.expires_at;
            WithCountdown::new(r, expires_at, now)
        })
        .collect();
    Ok(Json(rotations))
}

/// Create a rotation.
///
/// Members already claimed by another active rotation are accepted and
/// reported back in `overlapping_banner_ids`.
pub async fn create_rotation(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    ApiJson(mut draft): ApiJson<RotationDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let now = Utc::now();
    validation::validate_rotation(&mut draft, &state.config.placement, now)?;

    let banners = state.directory.list_banners().await?;
    let mut err = ValidationError::default();
    for id in &draft.banner_ids {
        if !banners.iter().any(|b| b.id == *id) {
            err.add("banner_ids", format!("unknown banner {id}"));
        }
    }
    err.into_result()?;

    let rotations = state.directory.list_rotations().await?;
    let overlapping = overlapping_banner_ids(&draft.banner_ids, &rotations, None, now);
    if !overlapping.is_empty() {
        warn!(
            count = overlapping.len(),
            section = %draft.section,
            "rotation shares banners with another active rotation"
        );
    }

    let rotation = state.directory.insert_rotation(&draft).await?;
    record(
        &state,
        Some(audit::created(
            audit::ROTATIONS,
            rotation.id.into_inner(),
            AuditAction::Create,
            Some(actor.as_str()),
            &rotation,
        )),
    )
    .await;
    Ok((
        StatusCode::CREATED,
        Json(RotationCreated {
            rotation,
            overlapping_banner_ids: overlapping,
        }),
    ))
}

/// Delete a rotation. Its members return to standalone display.
pub async fn delete_rotation(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    actor: Actor,
) -> Result<impl IntoResponse, ApiError> {
    let id: RotationId = parse_uuid(&id_str)?;
    let removed = state
        .directory
        .delete_rotation(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("rotation {id}")))?;
    record(
        &state,
        Some(audit::deleted(audit::ROTATIONS, id.into_inner(), Some(actor.as_str()), &removed)),
    )
    .await;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Master data
// ---------------------------------------------------------------------------

/// Pick-list values, optionally for one category.
pub async fn list_master_data(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<MasterDataQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let category = params
        .category
        .as_deref()
        .map(str::parse::<MasterDataCategory>)
        .transpose()
        .map_err(|e| ApiError::InvalidQuery(e.to_string()))?;
    Ok(Json(state.directory.list_master_data(category).await?))
}

/// Add a pick-list value.
pub async fn create_master_data(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    ApiJson(mut draft): ApiJson<MasterDataDraft>,
) -> Result<impl IntoResponse, ApiError> {
    validation::validate_master_data(&mut draft)?;
    let entry = state.directory.insert_master_data(&draft).await?;
    record(
        &state,
        Some(audit::created(
            audit::MASTER_DATA,
            entry.id.into_inner(),
            AuditAction::Create,
            Some(actor.as_str()),
            &entry,
        )),
    )
    .await;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Remove a pick-list value.
pub async fn delete_master_data(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    actor: Actor,
) -> Result<impl IntoResponse, ApiError> {
    let id: MasterDataId = parse_uuid(&id_str)?;
    let removed = state
        .directory
        .delete_master_data(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("master data {id}")))?;
    record(
        &state,
        Some(audit::deleted(audit::MASTER_DATA, id.into_inner(), Some(actor.as_str()), &removed)),
    )
    .await;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Audit log
// ---------------------------------------------------------------------------

/// Audit entries, newest first.
pub async fn list_audit_logs(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<AuditQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_AUDIT_LIMIT)
        .clamp(1, MAX_AUDIT_LIMIT);
    let entity = params.entity.as_deref().map(str::trim).filter(|e| !e.is_empty());
    Ok(Json(state.directory.list_audit(entity, limit).await?))
}

// ---------------------------------------------------------------------------
// Network requests
// ---------------------------------------------------------------------------

/// Join requests, newest first.
pub async fn list_network_requests(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<RequestQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let status = params
        .status
        .as_deref()
        .map(str::parse::<NetworkRequestStatus>)
        .transpose()
        .map_err(|e| ApiError::InvalidQuery(e.to_string()))?;
    Ok(Json(state.directory.list_requests(status).await?))
}

/// Approve a pending join request.
pub async fn approve_network_request(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    actor: Actor,
) -> Result<impl IntoResponse, ApiError> {
    review(&state, &id_str, &actor, NetworkRequestStatus::Approved).await
}

/// Reject a pending join request.
pub async fn reject_network_request(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    actor: Actor,
) -> Result<impl IntoResponse, ApiError> {
    review(&state, &id_str, &actor, NetworkRequestStatus::Rejected).await
}

async fn review(
    state: &AppState,
    id_str: &str,
    actor: &Actor,
    status: NetworkRequestStatus,
) -> Result<Json<affiliate_types::NetworkRequest>, ApiError> {
    let id: NetworkRequestId = parse_uuid(id_str)?;
    let before = state
        .directory
        .get_request(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("network request {id}")))?;
    if before.status != NetworkRequestStatus::Pending {
        return Err(ApiError::Conflict(format!(
            "network request {id} is already {}",
            before.status
        )));
    }
    let after = state
        .directory
        .review_request(id, status)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("network request {id}")))?;
    record(
        state,
        audit::updated(
            audit::NETWORK_REQUESTS,
            id.into_inner(),
            AuditAction::Update,
            Some(actor.as_str()),
            &before,
            &after,
        ),
    )
    .await;
    info!(request_id = %id, status = %status, "network request reviewed");
    Ok(Json(after))
}
