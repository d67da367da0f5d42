use super::{Db, serialize_vector};
use crate::extract::DocType;
use rusqlite::Result;
use rusqlite::types::Value;
use serde::Serialize;

/// One chunk hit from a vector similarity search.
#[derive(Debug, Serialize)]
pub struct SearchResult {
    pub page_id: i64,
    pub url: String,
    pub title: String,
    pub doc_type: String,
    pub content: String,
    pub similarity: f64,
    pub position: usize,
    pub chunk_id: i64,
}

fn map_search_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SearchResult> {
    let distance: f64 = row.get(7)?;
    let similarity = 1.0 - (distance / 2.0);

    Ok(SearchResult {
        page_id: row.get(0)?,
        url: row.get(1)?,
        title: row.get(2)?,
        doc_type: row.get(3)?,
        content: row.get(4)?,
        position: row.get::<_, i64>(5)? as usize,
        chunk_id: row.get(6)?,
        similarity,
    })
}

impl Db {
    /// Vector similarity search over chunks using cosine distance, nearest
    /// first, optionally restricted to one documentation section.
    pub fn search(
        &self,
        query_vector: &[f32],
        top_k: usize,
        doc_type: Option<DocType>,
    ) -> Result<Vec<SearchResult>> {
        let mut query = String::from(
            r#"
            SELECT
                p.id,
                p.url,
                p.title,
                p.doc_type,
                c.content,
                c.position,
                c.id as chunk_id,
                vec_distance_cosine(v.embedding, ?) as distance
            FROM vec_chunks v
            JOIN chunks c ON v.rowid = c.id
            JOIN pages p ON c.page_id = p.id
            "#,
        );

        let mut params: Vec<Value> = vec![Value::Blob(serialize_vector(query_vector))];

        if let Some(dt) = doc_type {
            query.push_str(" WHERE p.doc_type = ?");
            params.push(Value::Text(dt.as_str().to_string()));
        }

        query.push_str(" ORDER BY distance ASC LIMIT ?");
        params.push(Value::Integer(top_k as i64));

        let param_refs: Vec<&dyn rusqlite::ToSql> =
            params.iter().map(|p| p as &dyn rusqlite::ToSql).collect();

        let mut stmt = self.conn.prepare(&query)?;
        let rows = stmt.query_map(param_refs.as_slice(), map_search_row)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }

        Ok(results)
    }
}
