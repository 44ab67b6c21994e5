use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: String,
}

pub async fn get_all_categories(pool: &SqlitePool) -> sqlx::Result<Vec<Category>> {
    sqlx::query_as::<_, Category>(
        r#"
SELECT id, type
FROM categories
ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn get_category(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<Category>> {
    sqlx::query_as::<_, Category>(
        r#"
        SELECT id, type FROM categories WHERE categories.id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn create_category(pool: &SqlitePool, kind: &str) -> sqlx::Result<i64> {
    let mut conn = pool.acquire().await?;

    let id = sqlx::query(
        r#"
INSERT INTO categories (type) VALUES (?1)
        "#,
    )
    .bind(kind)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    Ok(id)
}

/// Inserts the categories keeping their ids, overwriting the type of ids that already exist.
pub async fn import_categories(pool: &SqlitePool, categories: Vec<Category>) -> sqlx::Result<()> {
    let mut tx = pool.begin().await?;
    for category in categories {
        sqlx::query(
            r#"
            INSERT INTO categories (id, type) VALUES (?1, ?2)
            ON CONFLICT (id) DO UPDATE SET type = excluded.type
            "#,
        )
        .bind(category.id)
        .bind(&category.kind)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::in_memory;

    #[tokio::test]
    async fn created_categories_are_listed_by_id() {
        let pool = in_memory().await.unwrap();
        let art = create_category(&pool, "Art").await.unwrap();
        let science = create_category(&pool, "Science").await.unwrap();

        let all = get_all_categories(&pool).await.unwrap();
        assert_eq!(
            all,
            vec![
                Category { id: art, kind: "Art".into() },
                Category { id: science, kind: "Science".into() },
            ]
        );
    }

    #[tokio::test]
    async fn missing_category_is_none() {
        let pool = in_memory().await.unwrap();
        assert_eq!(get_category(&pool, 42).await.unwrap(), None);
    }

    #[tokio::test]
    async fn import_keeps_ids_and_overwrites_existing() {
        let pool = in_memory().await.unwrap();
        create_category(&pool, "Sciense").await.unwrap();

        import_categories(
            &pool,
            vec![
                Category { id: 1, kind: "Science".into() },
                Category { id: 5, kind: "Entertainment".into() },
            ],
        )
        .await
        .unwrap();

        let all = get_all_categories(&pool).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(get_category(&pool, 1).await.unwrap().unwrap().kind, "Science");
        assert_eq!(get_category(&pool, 5).await.unwrap().unwrap().kind, "Entertainment");
    }
}
