//! Generic documentation attachments.
//!
//! Any owner entity can carry an ordered list of content blocks without
//! knowing about them; blocks live under a per-owner widget that is created
//! lazily on first attach. All mutations resolve ownership transitively
//! through the access layer.

use metrics::counter;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::access::{self, OwnerRef};
use crate::db::docs_repo;
use crate::errors::AppError;
use crate::models::{DocumentationItem, DocumentationWidget, ItemType};

// ---------------------------------------------------------------------------
// Input / output shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct NewDocumentationItem {
    pub item_type: ItemType,
    pub text_content: Option<String>,
    pub image_ref: Option<String>,
    #[serde(default)]
    pub order: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct WidgetWithItems {
    #[serde(flatten)]
    pub widget: DocumentationWidget,
    pub items: Vec<DocumentationItem>,
}

/// The payload is exclusive by type: TEXT carries text, IMAGE carries an
/// image reference. Both or neither is contradictory input.
pub fn validate_payload(
    item_type: ItemType,
    text_content: Option<&str>,
    image_ref: Option<&str>,
) -> Result<(), AppError> {
    let valid = match item_type {
        ItemType::Text => text_content.is_some() && image_ref.is_none(),
        ItemType::Image => image_ref.is_some() && text_content.is_none(),
    };

    if valid {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "{item_type} items must carry exactly the matching payload"
        )))
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Return the owner's widget, creating it on first use. Mutating an owner's
/// documentation requires write access to the owner itself.
pub async fn get_or_create_widget(
    pool: &PgPool,
    user_id: i64,
    owner: OwnerRef,
) -> Result<DocumentationWidget, AppError> {
    let ownership = access::resolve_owner(pool, owner).await?;
    access::ensure_can_write(ownership, user_id)?;

    Ok(docs_repo::get_or_create_widget(pool, owner).await?)
}

/// Attach one content block to an owner entity.
pub async fn add_item(
    pool: &PgPool,
    user_id: i64,
    owner: OwnerRef,
    item: &NewDocumentationItem,
) -> Result<DocumentationItem, AppError> {
    validate_payload(
        item.item_type,
        item.text_content.as_deref(),
        item.image_ref.as_deref(),
    )?;

    let widget = get_or_create_widget(pool, user_id, owner).await?;
    let created = docs_repo::insert_item(
        pool,
        widget.id,
        &item.item_type.to_string(),
        item.text_content.as_deref(),
        item.image_ref.as_deref(),
        item.order.unwrap_or(0),
    )
    .await?;

    counter!("documentation_items_created_total").increment(1);

    Ok(created)
}

/// Attach one content block to an existing widget directly.
pub async fn add_item_to_widget(
    pool: &PgPool,
    user_id: i64,
    widget_id: i64,
    item: &NewDocumentationItem,
) -> Result<DocumentationItem, AppError> {
    validate_payload(
        item.item_type,
        item.text_content.as_deref(),
        item.image_ref.as_deref(),
    )?;

    let widget = docs_repo::get_widget(pool, widget_id)
        .await?
        .ok_or_else(|| AppError::NotFound("documentation widget not found".into()))?;

    let owner = OwnerRef::parse(&widget.owner_kind, widget.owner_id)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("invalid owner kind in store")))?;
    let ownership = access::resolve_owner(pool, owner).await?;
    access::ensure_can_write(ownership, user_id)?;

    let created = docs_repo::insert_item(
        pool,
        widget.id,
        &item.item_type.to_string(),
        item.text_content.as_deref(),
        item.image_ref.as_deref(),
        item.order.unwrap_or(0),
    )
    .await?;

    counter!("documentation_items_created_total").increment(1);

    Ok(created)
}

/// All content blocks for an owner, flattened across its widgets into
/// display order. Reading requires read access to the owner (public
/// strategies included).
pub async fn list_items(
    pool: &PgPool,
    user_id: i64,
    owner: OwnerRef,
) -> Result<Vec<DocumentationItem>, AppError> {
    let ownership = access::resolve_owner(pool, owner).await?;
    access::ensure_can_read(ownership, user_id)?;

    Ok(docs_repo::list_items_for_owner(pool, owner).await?)
}

/// The owner's widgets with their items embedded.
pub async fn list_widgets(
    pool: &PgPool,
    user_id: i64,
    owner: OwnerRef,
) -> Result<Vec<WidgetWithItems>, AppError> {
    let ownership = access::resolve_owner(pool, owner).await?;
    access::ensure_can_read(ownership, user_id)?;

    let widgets = docs_repo::list_widgets_for_owner(pool, owner).await?;
    let mut out = Vec::with_capacity(widgets.len());
    for widget in widgets {
        let items = docs_repo::list_items_for_widget(pool, widget.id).await?;
        out.push(WidgetWithItems { widget, items });
    }

    Ok(out)
}

/// Replace the owner's entire block list: delete everything, recreate from
/// the given list, order assigned by position. Full-replace, not a patch.
pub async fn replace_all(
    pool: &PgPool,
    user_id: i64,
    owner: OwnerRef,
    items: &[NewDocumentationItem],
) -> Result<Vec<DocumentationItem>, AppError> {
    for item in items {
        validate_payload(
            item.item_type,
            item.text_content.as_deref(),
            item.image_ref.as_deref(),
        )?;
    }

    let ownership = access::resolve_owner(pool, owner).await?;
    access::ensure_can_write(ownership, user_id)?;

    let mut tx = pool.begin().await?;

    let widget = sqlx::query_as::<_, DocumentationWidget>(
        r#"
        INSERT INTO documentation_widgets (owner_kind, owner_id)
        VALUES ($1, $2)
        ON CONFLICT (owner_kind, owner_id) DO UPDATE SET updated_at = now()
        RETURNING *
        "#,
    )
    .bind(owner.kind())
    .bind(owner.id())
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        DELETE FROM documentation_items
        WHERE widget_id IN (
            SELECT id FROM documentation_widgets WHERE owner_kind = $1 AND owner_id = $2
        )
        "#,
    )
    .bind(owner.kind())
    .bind(owner.id())
    .execute(&mut *tx)
    .await?;

    let mut created = Vec::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
        let row = sqlx::query_as::<_, DocumentationItem>(
            r#"
            INSERT INTO documentation_items (widget_id, item_type, text_content, image_ref, display_order)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(widget.id)
        .bind(item.item_type.to_string())
        .bind(item.text_content.as_deref())
        .bind(item.image_ref.as_deref())
        .bind(position as i32)
        .fetch_one(&mut *tx)
        .await?;
        created.push(row);
    }

    tx.commit().await?;

    tracing::info!(
        owner_kind = owner.kind(),
        owner_id = owner.id(),
        count = created.len(),
        "documentation replaced"
    );

    Ok(created)
}

/// Append an image block to a trade's documentation, after its last block.
pub async fn add_screenshot(
    pool: &PgPool,
    user_id: i64,
    trade_id: i64,
    image_ref: &str,
) -> Result<DocumentationItem, AppError> {
    let owner = OwnerRef::Trade(trade_id);
    let ownership = access::resolve_owner(pool, owner).await?;
    access::ensure_can_write(ownership, user_id)?;

    let next_order = docs_repo::max_item_order_for_owner(pool, owner)
        .await?
        .map_or(0, |max| max + 1);

    let widget = docs_repo::get_or_create_widget(pool, owner).await?;
    let item = docs_repo::insert_item(pool, widget.id, "IMAGE", None, Some(image_ref), next_order)
        .await?;

    counter!("documentation_items_created_total").increment(1);

    Ok(item)
}

/// Remove one content block after checking write access to its owner.
pub async fn delete_item(pool: &PgPool, user_id: i64, item_id: i64) -> Result<(), AppError> {
    let item = docs_repo::get_item(pool, item_id)
        .await?
        .ok_or_else(|| AppError::NotFound("documentation item not found".into()))?;

    let widget = docs_repo::get_widget(pool, item.widget_id)
        .await?
        .ok_or_else(|| AppError::NotFound("documentation widget not found".into()))?;

    let owner = OwnerRef::parse(&widget.owner_kind, widget.owner_id)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("invalid owner kind in store")))?;
    let ownership = access::resolve_owner(pool, owner).await?;
    access::ensure_can_write(ownership, user_id)?;

    docs_repo::delete_item(pool, item_id).await?;
    counter!("documentation_items_deleted_total").increment(1);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_payload_requires_text_only() {
        assert!(validate_payload(ItemType::Text, Some("note"), None).is_ok());
        assert!(validate_payload(ItemType::Text, None, None).is_err());
        assert!(validate_payload(ItemType::Text, Some("note"), Some("img")).is_err());
        assert!(validate_payload(ItemType::Text, None, Some("img")).is_err());
    }

    #[test]
    fn test_image_payload_requires_image_only() {
        assert!(validate_payload(ItemType::Image, None, Some("s3://img/1.png")).is_ok());
        assert!(validate_payload(ItemType::Image, None, None).is_err());
        assert!(validate_payload(ItemType::Image, Some("cap"), Some("img")).is_err());
    }

    #[test]
    fn test_validation_error_kind() {
        let err = validate_payload(ItemType::Image, None, None).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
