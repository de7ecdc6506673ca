use sqlx::PgPool;

use crate::access::OwnerRef;
use crate::models::{DocumentationItem, DocumentationWidget};

/// Return the owner's widget, creating it atomically on first use.
pub async fn get_or_create_widget(
    pool: &PgPool,
    owner: OwnerRef,
) -> anyhow::Result<DocumentationWidget> {
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
    .fetch_one(pool)
    .await?;

    Ok(widget)
}

/// Widgets attached to one owner entity.
pub async fn list_widgets_for_owner(
    pool: &PgPool,
    owner: OwnerRef,
) -> anyhow::Result<Vec<DocumentationWidget>> {
    let widgets = sqlx::query_as::<_, DocumentationWidget>(
        r#"
        SELECT * FROM documentation_widgets
        WHERE owner_kind = $1 AND owner_id = $2
        ORDER BY display_order, created_at
        "#,
    )
    .bind(owner.kind())
    .bind(owner.id())
    .fetch_all(pool)
    .await?;

    Ok(widgets)
}

pub async fn get_widget(pool: &PgPool, id: i64) -> anyhow::Result<Option<DocumentationWidget>> {
    let widget =
        sqlx::query_as::<_, DocumentationWidget>("SELECT * FROM documentation_widgets WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

    Ok(widget)
}

pub async fn insert_item(
    pool: &PgPool,
    widget_id: i64,
    item_type: &str,
    text_content: Option<&str>,
    image_ref: Option<&str>,
    order: i32,
) -> anyhow::Result<DocumentationItem> {
    let item = sqlx::query_as::<_, DocumentationItem>(
        r#"
        INSERT INTO documentation_items (widget_id, item_type, text_content, image_ref, display_order)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(widget_id)
    .bind(item_type)
    .bind(text_content)
    .bind(image_ref)
    .bind(order)
    .fetch_one(pool)
    .await?;

    Ok(item)
}

pub async fn get_item(pool: &PgPool, id: i64) -> anyhow::Result<Option<DocumentationItem>> {
    let item =
        sqlx::query_as::<_, DocumentationItem>("SELECT * FROM documentation_items WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

    Ok(item)
}

/// All items across all widgets of one owner, flattened into display order.
/// Ties on `display_order` fall back to insertion order.
pub async fn list_items_for_owner(
    pool: &PgPool,
    owner: OwnerRef,
) -> anyhow::Result<Vec<DocumentationItem>> {
    let items = sqlx::query_as::<_, DocumentationItem>(
        r#"
        SELECT i.* FROM documentation_items i
        JOIN documentation_widgets w ON w.id = i.widget_id
        WHERE w.owner_kind = $1 AND w.owner_id = $2
        ORDER BY i.display_order ASC, i.id ASC
        "#,
    )
    .bind(owner.kind())
    .bind(owner.id())
    .fetch_all(pool)
    .await?;

    Ok(items)
}

/// Items hanging off one widget, in display order.
pub async fn list_items_for_widget(
    pool: &PgPool,
    widget_id: i64,
) -> anyhow::Result<Vec<DocumentationItem>> {
    let items = sqlx::query_as::<_, DocumentationItem>(
        r#"
        SELECT * FROM documentation_items
        WHERE widget_id = $1
        ORDER BY display_order ASC, id ASC
        "#,
    )
    .bind(widget_id)
    .fetch_all(pool)
    .await?;

    Ok(items)
}

/// Highest display_order among an owner's items, if any exist.
pub async fn max_item_order_for_owner(
    pool: &PgPool,
    owner: OwnerRef,
) -> anyhow::Result<Option<i32>> {
    let row: (Option<i32>,) = sqlx::query_as(
        r#"
        SELECT MAX(i.display_order) FROM documentation_items i
        JOIN documentation_widgets w ON w.id = i.widget_id
        WHERE w.owner_kind = $1 AND w.owner_id = $2
        "#,
    )
    .bind(owner.kind())
    .bind(owner.id())
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}

pub async fn delete_item(pool: &PgPool, id: i64) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM documentation_items WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
