//! Structured API storage: classes, methods, properties, parameters.
use rusqlite::{params, OptionalExtension, Result};

use crate::extract::reference::ExtractedClass;

use super::models::{
    ClassDetail, ClassSummary, MethodRecord, ParameterRecord, PropertyRecord, StoreStats,
};
use super::Db;

impl Db {
    /// Replace the structured records attached to a page with a freshly
    /// extracted class, in one transaction.
    pub fn replace_page_class(&mut self, page_id: i64, class: &ExtractedClass) -> Result<i64> {
        let tx = self.conn.transaction()?;

        // CASCADE clears methods, properties and parameters
        tx.execute("DELETE FROM classes WHERE page_id = ?1", params![page_id])?;

        tx.execute(
            "INSERT INTO classes (page_id, name, namespace, description, inherits_from, is_static)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                page_id,
                class.name,
                class.namespace,
                class.description,
                class.inherits_from,
                class.is_static,
            ],
        )?;
        let class_id = tx.last_insert_rowid();

        {
            let mut insert_method = tx.prepare(
                "INSERT INTO methods (class_id, name, return_type, is_static, description, signature)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            let mut insert_param = tx.prepare(
                "INSERT INTO parameters (method_id, name, param_type, description, position)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for method in &class.methods {
                insert_method.execute(params![
                    class_id,
                    method.name,
                    method.return_type,
                    method.is_static,
                    method.description,
                    method.signature,
                ])?;
                let method_id = tx.last_insert_rowid();
                for param in &method.parameters {
                    insert_param.execute(params![
                        method_id,
                        param.name,
                        param.param_type,
                        param.description,
                        param.position as i64,
                    ])?;
                }
            }

            let mut insert_property = tx.prepare(
                "INSERT INTO properties (class_id, name, property_type, is_static, description)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for property in &class.properties {
                insert_property.execute(params![
                    class_id,
                    property.name,
                    property.property_type,
                    property.is_static,
                    property.description,
                ])?;
            }
        }

        tx.commit()?;
        Ok(class_id)
    }

    /// Clear any structured records attached to a page. Used when a page
    /// that previously held a class is re-indexed without one.
    pub fn clear_page_class(&self, page_id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM classes WHERE page_id = ?1", params![page_id])?;
        Ok(())
    }

    /// Full class record by exact name (case-insensitive), with members in
    /// stored order and parameters ordered by position.
    pub fn get_class(&self, name: &str) -> Result<Option<ClassDetail>> {
        let summary = self
            .conn
            .query_row(
                "SELECT c.id, c.name, c.namespace, c.description, c.inherits_from, c.is_static, p.url
                 FROM classes c JOIN pages p ON p.id = c.page_id
                 WHERE c.name = ?1 COLLATE NOCASE",
                params![name],
                map_class_row,
            )
            .optional()?;

        let Some(summary) = summary else {
            return Ok(None);
        };

        let methods = self.class_methods(summary.id)?;
        let properties = self.class_properties(summary.id)?;

        Ok(Some(ClassDetail {
            summary,
            methods,
            properties,
        }))
    }

    fn class_methods(&self, class_id: i64) -> Result<Vec<MethodRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, return_type, is_static, description, signature
             FROM methods WHERE class_id = ?1 ORDER BY id",
        )?;
        let rows: Vec<MethodRecord> = stmt
            .query_map(params![class_id], |row| {
                Ok(MethodRecord {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    return_type: row.get(2)?,
                    is_static: row.get(3)?,
                    description: row.get(4)?,
                    signature: row.get(5)?,
                    class_name: None,
                    namespace: None,
                    parameters: Vec::new(),
                })
            })?
            .collect::<Result<_>>()?;

        let mut methods = Vec::with_capacity(rows.len());
        for mut method in rows {
            method.parameters = self.method_parameters(method.id)?;
            methods.push(method);
        }
        Ok(methods)
    }

    fn method_parameters(&self, method_id: i64) -> Result<Vec<ParameterRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, param_type, description, position
             FROM parameters WHERE method_id = ?1 ORDER BY position",
        )?;
        let rows = stmt.query_map(params![method_id], |row| {
            Ok(ParameterRecord {
                name: row.get(0)?,
                param_type: row.get(1)?,
                description: row.get(2)?,
                position: row.get::<_, i64>(3)? as usize,
            })
        })?;
        rows.collect()
    }

    fn class_properties(&self, class_id: i64) -> Result<Vec<PropertyRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, property_type, is_static, description
             FROM properties WHERE class_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![class_id], |row| {
            Ok(PropertyRecord {
                id: row.get(0)?,
                name: row.get(1)?,
                property_type: row.get(2)?,
                is_static: row.get(3)?,
                description: row.get(4)?,
            })
        })?;
        rows.collect()
    }

    /// Classes whose name or description matches the query.
    pub fn search_classes(&self, query: &str, limit: usize) -> Result<Vec<ClassSummary>> {
        let pattern = format!("%{query}%");
        let mut stmt = self.conn.prepare(
            "SELECT c.id, c.name, c.namespace, c.description, c.inherits_from, c.is_static, p.url
             FROM classes c JOIN pages p ON p.id = c.page_id
             WHERE c.name LIKE ?1 COLLATE NOCASE OR c.description LIKE ?1 COLLATE NOCASE
             ORDER BY c.name LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![pattern, limit as i64], map_class_row)?;
        rows.collect()
    }

    /// Methods whose name or description matches the query, joined with
    /// their owning class for display.
    pub fn search_methods(&self, query: &str, limit: usize) -> Result<Vec<MethodRecord>> {
        let pattern = format!("%{query}%");
        let mut stmt = self.conn.prepare(
            "SELECT m.id, m.name, m.return_type, m.is_static, m.description, m.signature,
                    c.name, c.namespace
             FROM methods m JOIN classes c ON c.id = m.class_id
             WHERE m.name LIKE ?1 COLLATE NOCASE OR m.description LIKE ?1 COLLATE NOCASE
             ORDER BY c.name, m.name LIMIT ?2",
        )?;
        let rows: Vec<MethodRecord> = stmt
            .query_map(params![pattern, limit as i64], |row| {
                Ok(MethodRecord {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    return_type: row.get(2)?,
                    is_static: row.get(3)?,
                    description: row.get(4)?,
                    signature: row.get(5)?,
                    class_name: row.get(6)?,
                    namespace: row.get(7)?,
                    parameters: Vec::new(),
                })
            })?
            .collect::<Result<_>>()?;

        let mut methods = Vec::with_capacity(rows.len());
        for mut method in rows {
            method.parameters = self.method_parameters(method.id)?;
            methods.push(method);
        }
        Ok(methods)
    }

    /// Row counts across the whole store.
    pub fn stats(&self) -> Result<StoreStats> {
        let count = |table: &str| -> Result<usize> {
            self.conn
                .query_row(&format!("SELECT count(*) FROM {table}"), [], |r| r.get(0))
        };
        let pages_of = |doc_type: &str| -> Result<usize> {
            self.conn.query_row(
                "SELECT count(*) FROM pages WHERE doc_type = ?1",
                [doc_type],
                |r| r.get(0),
            )
        };
        Ok(StoreStats {
            pages: count("pages")?,
            manual_pages: pages_of("manual")?,
            script_reference_pages: pages_of("script_reference")?,
            chunks: count("chunks")?,
            classes: count("classes")?,
            methods: count("methods")?,
            properties: count("properties")?,
        })
    }
}

fn map_class_row(row: &rusqlite::Row<'_>) -> Result<ClassSummary> {
    Ok(ClassSummary {
        id: row.get(0)?,
        name: row.get(1)?,
        namespace: row.get(2)?,
        description: row.get(3)?,
        inherits_from: row.get(4)?,
        is_static: row.get(5)?,
        page_url: row.get(6)?,
    })
}
