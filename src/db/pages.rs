//! Page persistence: full-replacement upserts keyed by URL.
use rusqlite::{params, OptionalExtension, Result};
use tracing::debug;

use super::models::{ChunkInput, Page};
use super::{serialize_vector, Db};

impl Db {
    /// Insert or replace a page and its chunks in one transaction.
    ///
    /// Re-indexing the same URL replaces the page row in place and swaps
    /// all chunks and their vectors. Embeddings are aligned with `chunks`
    /// by position.
    pub fn upsert_page(
        &mut self,
        url: &str,
        title: &str,
        doc_type: &str,
        content: &str,
        chunks: &[ChunkInput<'_>],
        embeddings: &[Vec<f32>],
    ) -> Result<i64> {
        debug_assert_eq!(chunks.len(), embeddings.len());

        let tx = self.conn.transaction()?;

        let page_id: i64 = tx.query_row(
            "INSERT INTO pages (url, title, doc_type, content)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(url) DO UPDATE SET
                 title = excluded.title,
                 doc_type = excluded.doc_type,
                 content = excluded.content,
                 updated_at = CURRENT_TIMESTAMP
             RETURNING id",
            params![url, title, doc_type, content],
            |row| row.get(0),
        )?;

        // vec0 virtual tables do not participate in foreign key cascades
        tx.execute(
            "DELETE FROM vec_chunks WHERE rowid IN (SELECT id FROM chunks WHERE page_id = ?1)",
            params![page_id],
        )?;
        tx.execute("DELETE FROM chunks WHERE page_id = ?1", params![page_id])?;

        {
            let mut insert_chunk = tx.prepare(
                "INSERT INTO chunks (page_id, position, content) VALUES (?1, ?2, ?3)",
            )?;
            let mut insert_vec =
                tx.prepare("INSERT INTO vec_chunks (rowid, embedding) VALUES (?1, ?2)")?;

            for (chunk, embedding) in chunks.iter().zip(embeddings) {
                insert_chunk.execute(params![page_id, chunk.position as i64, chunk.content])?;
                let chunk_id = tx.last_insert_rowid();
                insert_vec.execute(params![chunk_id, serialize_vector(embedding)])?;
            }
        }

        tx.commit()?;
        debug!("Upserted page {} ({} chunks)", url, chunks.len());
        Ok(page_id)
    }

    pub fn get_page(&self, id: i64) -> Result<Option<Page>> {
        self.conn
            .query_row(
                "SELECT id, url, title, doc_type, content, created_at, updated_at
                 FROM pages WHERE id = ?1",
                params![id],
                map_page_row,
            )
            .optional()
    }

    pub fn get_page_by_url(&self, url: &str) -> Result<Option<Page>> {
        self.conn
            .query_row(
                "SELECT id, url, title, doc_type, content, created_at, updated_at
                 FROM pages WHERE url = ?1",
                params![url],
                map_page_row,
            )
            .optional()
    }
}

impl Db {
    /// Replace the stored code snippets for a page.
    pub fn replace_page_code(&mut self, page_id: i64, snippets: &[String]) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM code_examples WHERE page_id = ?1",
            params![page_id],
        )?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO code_examples (page_id, position, code) VALUES (?1, ?2, ?3)",
            )?;
            for (position, code) in snippets.iter().enumerate() {
                insert.execute(params![page_id, position as i64, code])?;
            }
        }
        tx.commit()
    }

    /// Code snippets stored for a page, in source order.
    pub fn code_for_page(&self, page_id: i64) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT code FROM code_examples WHERE page_id = ?1 ORDER BY position")?;
        let rows = stmt.query_map(params![page_id], |r| r.get(0))?;
        rows.collect()
    }
}

fn map_page_row(row: &rusqlite::Row<'_>) -> Result<Page> {
    Ok(Page {
        id: row.get(0)?,
        url: row.get(1)?,
        title: row.get(2)?,
        doc_type: row.get(3)?,
        content: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}
