//! Multipart form collection for landing-page mutations.
//!
//! The optional `main_image` file part is written to the uploads area the
//! moment it is encountered, before the request's field validation can run.
//! Callers therefore own a possibly-saved file as soon as collection
//! returns, and every failure path after that point must discard it; a
//! failure *during* collection discards it here.

use axum::extract::Multipart;

use crate::error::ApiError;
use crate::uploads::store;

/// Fields of a create/update request. `None` means the field was absent
/// from the form, which updates treat as "leave unchanged".
#[derive(Debug, Default)]
pub struct PageForm {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub cta_link: Option<String>,
    pub cta_text: Option<String>,
    pub content_html: Option<String>,
    /// Public path of the already-saved uploaded image, if one was sent.
    pub main_image: Option<String>,
}

/// Read every multipart field, saving the image part as a side effect.
pub async fn collect(data_dir: &str, mut multipart: Multipart) -> Result<PageForm, ApiError> {
    let mut form = PageForm::default();

    let result = async {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::Validation(format!("Invalid multipart upload: {}", e)))?
        {
            let name = field.name().unwrap_or("").to_string();
            match name.as_str() {
                "main_image" => {
                    let file_name = field.file_name().unwrap_or("").to_string();
                    // A file input submitted with no selection arrives as an
                    // empty part; treat it as "no image".
                    if file_name.is_empty() {
                        continue;
                    }
                    let content_type = field.content_type().unwrap_or("").to_string();
                    let data = field.bytes().await.map_err(|e| {
                        ApiError::Validation(format!("Invalid multipart upload: {}", e))
                    })?;

                    // A repeated image part supersedes the previous one.
                    if let Some(prev) = form.main_image.take() {
                        store::delete_image(data_dir, &prev);
                    }
                    form.main_image =
                        Some(store::save_image(data_dir, &file_name, &content_type, &data)?);
                }
                "slug" | "title" | "subtitle" | "description" | "cta_link" | "cta_text"
                | "content_html" => {
                    let value = field.text().await.map_err(|e| {
                        ApiError::Validation(format!("Invalid multipart upload: {}", e))
                    })?;
                    let slot = match name.as_str() {
                        "slug" => &mut form.slug,
                        "title" => &mut form.title,
                        "subtitle" => &mut form.subtitle,
                        "description" => &mut form.description,
                        "cta_link" => &mut form.cta_link,
                        "cta_text" => &mut form.cta_text,
                        _ => &mut form.content_html,
                    };
                    *slot = Some(value);
                }
                // Unknown fields are ignored
                _ => {}
            }
        }
        Ok(())
    }
    .await;

    match result {
        Ok(()) => Ok(form),
        Err(e) => {
            // A later field failed after the image was already written;
            // compensate before surfacing the original error.
            if let Some(saved) = form.main_image.take() {
                store::delete_image(data_dir, &saved);
            }
            Err(e)
        }
    }
}
