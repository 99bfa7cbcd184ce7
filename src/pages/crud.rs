//! Landing-page record lifecycle.
//!
//! Mutations keep the row store and the uploads area consistent without a
//! cross-store transaction: an image is on disk before the row referencing
//! it is committed, and file removal happens only after the row change is
//! confirmed. Failure paths compensate by deleting the just-uploaded file
//! before the error is returned, so a committed row never points at a
//! missing file; the reverse (an orphaned file after a failed cleanup) is
//! tolerated and only logged.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::middleware::Claims;
use crate::db::{self, models::LandingPage};
use crate::error::ApiError;
use crate::pages::form::{self, PageForm};
use crate::state::AppState;
use crate::uploads::store;

/// Compensating delete for an upload whose request is about to fail. Runs
/// synchronously (the file must be gone before the error reaches the
/// caller) and never overrides the primary error.
fn discard_upload(data_dir: &str, image: &Option<String>) {
    if let Some(path) = image {
        store::delete_image(data_dir, path);
    }
}

/// Normalize a submitted optional field: a blank value is an explicit clear.
fn normalized(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn fetch_page(conn: &rusqlite::Connection, id: &str) -> Result<LandingPage, ApiError> {
    conn.query_row(
        &format!(
            "SELECT {} FROM landing_pages WHERE id = ?1",
            LandingPage::COLUMNS
        ),
        [id],
        LandingPage::from_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => {
            ApiError::NotFound("Landing page not found".to_string())
        }
        other => ApiError::Storage(format!("Read landing page: {}", other)),
    })
}

// --- Handlers ---

/// GET /api/landing-pages — List all landing pages. Public.
pub async fn list_pages(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let db = state.db.clone();

    let pages = tokio::task::spawn_blocking(move || {
        let conn = db
            .lock()
            .map_err(|_| ApiError::Storage("DB lock".to_string()))?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM landing_pages",
                LandingPage::COLUMNS
            ))
            .map_err(|e| ApiError::Storage(format!("Prepare list: {}", e)))?;

        let pages: Vec<LandingPage> = stmt
            .query_map([], LandingPage::from_row)
            .map_err(|e| ApiError::Storage(format!("List landing pages: {}", e)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok::<_, ApiError>(pages)
    })
    .await??;

    Ok(Json(json!({ "message": "success", "data": pages })))
}

/// GET /api/landing-pages/{slug} — Fetch one landing page by slug. Public.
pub async fn get_page_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let db = state.db.clone();

    let page = tokio::task::spawn_blocking(move || {
        let conn = db
            .lock()
            .map_err(|_| ApiError::Storage("DB lock".to_string()))?;

        conn.query_row(
            &format!(
                "SELECT {} FROM landing_pages WHERE slug = ?1",
                LandingPage::COLUMNS
            ),
            [&slug],
            LandingPage::from_row,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                ApiError::NotFound("Landing page not found".to_string())
            }
            other => ApiError::Storage(format!("Read landing page: {}", other)),
        })
    })
    .await??;

    Ok(Json(json!({ "message": "success", "data": page })))
}

/// POST /api/landing-pages — Create a landing page (auth required).
/// Multipart body with text fields and an optional `main_image` file. The
/// image is saved while the body streams in; slug/title validation and the
/// insert run afterwards, so every failure from here on deletes that file
/// before responding.
pub async fn create_page(
    State(state): State<AppState>,
    claims: Claims,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let form = form::collect(&state.data_dir, multipart).await?;

    let db = state.db.clone();
    let data_dir = state.data_dir.clone();

    let page = tokio::task::spawn_blocking(move || {
        let slug = form.slug.as_deref().unwrap_or("").trim().to_string();
        let title = form.title.as_deref().unwrap_or("").trim().to_string();
        if slug.is_empty() || title.is_empty() {
            discard_upload(&data_dir, &form.main_image);
            return Err(ApiError::Validation(
                "Slug and title are required".to_string(),
            ));
        }

        let conn = db.lock().map_err(|_| {
            discard_upload(&data_dir, &form.main_image);
            ApiError::Storage("DB lock".to_string())
        })?;

        let id = Uuid::now_v7().to_string();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO landing_pages \
                 (id, slug, title, subtitle, description, main_image, cta_link, cta_text, content_html, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            rusqlite::params![
                id,
                slug,
                title,
                normalized(form.subtitle.clone()),
                normalized(form.description.clone()),
                form.main_image,
                normalized(form.cta_link.clone()),
                normalized(form.cta_text.clone()),
                normalized(form.content_html.clone()),
                now,
            ],
        )
        .map_err(|e| {
            discard_upload(&data_dir, &form.main_image);
            if db::is_unique_violation(&e, "landing_pages.slug") {
                ApiError::Duplicate("A landing page with this slug already exists".to_string())
            } else {
                ApiError::Storage(format!("Insert landing page: {}", e))
            }
        })?;

        // Read back the committed row
        fetch_page(&conn, &id)
    })
    .await??;

    tracing::info!("Landing page {} created by {}", page.slug, claims.email);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Landing page created successfully",
            "id": page.id,
            "data": page,
        })),
    ))
}

/// PUT /api/landing-pages/{id} — Update a landing page (auth required).
/// Omitted fields keep their stored value; a submitted blank optional field
/// clears it. A replacement image takes effect with the row update, and the
/// previous file is removed only after that update is confirmed.
pub async fn update_page(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let form = form::collect(&state.data_dir, multipart).await?;

    let db = state.db.clone();
    let data_dir = state.data_dir.clone();
    let page_id = id.clone();

    let (page, changes, replaced_image) = tokio::task::spawn_blocking(move || {
        let conn = db.lock().map_err(|_| {
            discard_upload(&data_dir, &form.main_image);
            ApiError::Storage("DB lock".to_string())
        })?;

        let current = match fetch_page(&conn, &page_id) {
            Ok(page) => page,
            Err(e) => {
                // The upload happened before we could know the row is
                // missing; remove it, then report the lookup failure.
                discard_upload(&data_dir, &form.main_image);
                return Err(match e {
                    ApiError::NotFound(_) => {
                        ApiError::NotFound("Landing page not found for update".to_string())
                    }
                    other => other,
                });
            }
        };

        let merged = merge_fields(&current, form, &data_dir)?;

        let changes = conn
            .execute(
                "UPDATE landing_pages \
                     SET slug = ?1, title = ?2, subtitle = ?3, description = ?4, \
                         main_image = ?5, cta_link = ?6, cta_text = ?7, content_html = ?8 \
                 WHERE id = ?9",
                rusqlite::params![
                    merged.slug,
                    merged.title,
                    merged.subtitle,
                    merged.description,
                    merged.main_image,
                    merged.cta_link,
                    merged.cta_text,
                    merged.content_html,
                    page_id,
                ],
            )
            .map_err(|e| {
                discard_upload(&data_dir, &merged.new_image);
                if db::is_unique_violation(&e, "landing_pages.slug") {
                    ApiError::Duplicate(
                        "A landing page with this slug already exists".to_string(),
                    )
                } else {
                    ApiError::Storage(format!("Update landing page: {}", e))
                }
            })?;

        if changes == 0 {
            // Row vanished between lookup and update
            discard_upload(&data_dir, &merged.new_image);
            return Err(ApiError::NotFound(
                "Landing page not found for update".to_string(),
            ));
        }

        // Old file becomes unreferenced only now that the update is durable.
        let replaced_image = match (&merged.new_image, &current.main_image) {
            (Some(new), Some(old)) if new != old => Some(old.clone()),
            _ => None,
        };

        let page = fetch_page(&conn, &page_id)?;
        Ok::<_, ApiError>((page, changes, replaced_image))
    })
    .await??;

    if let Some(old) = replaced_image {
        store::spawn_delete_image(state.data_dir.clone(), old);
    }

    tracing::info!("Landing page {} updated by {}", page.slug, claims.email);

    Ok(Json(json!({
        "message": "Landing page updated successfully",
        "changes": changes,
        "data": page,
    })))
}

/// DELETE /api/landing-pages/{id} — Delete a landing page (auth required).
/// The row is the source of truth: it goes first, and the image file is
/// removed best-effort afterwards without blocking the response.
pub async fn delete_page(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let db = state.db.clone();
    let page_id = id.clone();

    let (changes, image) = tokio::task::spawn_blocking(move || {
        let conn = db
            .lock()
            .map_err(|_| ApiError::Storage("DB lock".to_string()))?;

        let image: Option<String> = conn
            .query_row(
                "SELECT main_image FROM landing_pages WHERE id = ?1",
                [&page_id],
                |row| row.get(0),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    ApiError::NotFound("Landing page not found for deletion".to_string())
                }
                other => ApiError::Storage(format!("Read landing page: {}", other)),
            })?;

        let changes = conn
            .execute("DELETE FROM landing_pages WHERE id = ?1", [&page_id])
            .map_err(|e| ApiError::Storage(format!("Delete landing page: {}", e)))?;

        if changes == 0 {
            // Deleted concurrently; whichever request deleted the row owns
            // the file cleanup.
            return Err(ApiError::NotFound(
                "Landing page not found for deletion".to_string(),
            ));
        }

        Ok::<_, ApiError>((changes, image))
    })
    .await??;

    if let Some(path) = image {
        store::spawn_delete_image(state.data_dir.clone(), path);
    }

    tracing::info!("Landing page {} deleted by {}", id, claims.email);

    Ok(Json(json!({
        "message": "Landing page deleted successfully",
        "changes": changes,
    })))
}

/// Effective column values for an update, per the field-presence policy.
#[derive(Debug)]
struct MergedFields {
    slug: String,
    title: String,
    subtitle: Option<String>,
    description: Option<String>,
    main_image: Option<String>,
    cta_link: Option<String>,
    cta_text: Option<String>,
    content_html: Option<String>,
    /// The newly uploaded image, if any. Tracked separately from
    /// `main_image` so failure paths know what to compensate for.
    new_image: Option<String>,
}

fn merge_fields(
    current: &LandingPage,
    form: PageForm,
    data_dir: &str,
) -> Result<MergedFields, ApiError> {
    // Required fields may be resubmitted but never blanked.
    for (field, value) in [("slug", &form.slug), ("title", &form.title)] {
        if matches!(value, Some(v) if v.trim().is_empty()) {
            discard_upload(data_dir, &form.main_image);
            return Err(ApiError::Validation(format!("{} cannot be blank", field)));
        }
    }

    let pick = |submitted: Option<String>, existing: &Option<String>| match submitted {
        None => existing.clone(),
        Some(v) => normalized(Some(v)),
    };

    Ok(MergedFields {
        slug: form
            .slug
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| current.slug.clone()),
        title: form
            .title
            .map(|t| t.trim().to_string())
            .unwrap_or_else(|| current.title.clone()),
        subtitle: pick(form.subtitle, &current.subtitle),
        description: pick(form.description, &current.description),
        // New upload wins; otherwise the existing reference is preserved.
        main_image: form.main_image.clone().or_else(|| current.main_image.clone()),
        cta_link: pick(form.cta_link, &current.cta_link),
        cta_text: pick(form.cta_text, &current.cta_text),
        content_html: pick(form.content_html, &current.content_html),
        new_image: form.main_image,
    })
}
