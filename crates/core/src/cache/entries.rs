//! Cache entry operations on the SQLite backend.
//!
//! One row per `(bucket, url)`. Writes use UPSERT so repeated stores of the
//! same URL leave exactly one entry holding the latest response.

use super::{ResponseCache, connection::CacheDb};
use crate::{CapturedResponse, Error};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

impl CacheDb {
    /// Number of entries currently held in `bucket`.
    pub async fn entry_count(&self, bucket: &str) -> Result<u64, Error> {
        let bucket = bucket.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM cache_entries WHERE bucket = ?1", params![bucket], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[async_trait::async_trait]
impl ResponseCache for CacheDb {
    async fn match_url(&self, bucket: &str, url: &str) -> Result<Option<CapturedResponse>, Error> {
        let bucket = bucket.to_string();
        let url = url.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CapturedResponse>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT response_url, status, headers_json, body, captured_at
                     FROM cache_entries WHERE bucket = ?1 AND url = ?2",
                )?;

                let row = stmt.query_row(params![bucket, url], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, u16>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Vec<u8>>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                });

                match row {
                    Ok((response_url, status, headers_json, body, captured_at)) => Ok(Some(CapturedResponse {
                        url: response_url,
                        status,
                        headers: serde_json::from_str(&headers_json)?,
                        body: body.into(),
                        captured_at,
                    })),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    async fn put(&self, bucket: &str, url: &str, response: &CapturedResponse) -> Result<(), Error> {
        let bucket = bucket.to_string();
        let url = url.to_string();
        let headers_json = serde_json::to_string(&response.headers)?;
        let response = response.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO cache_entries (bucket, url, response_url, status, headers_json, body, captured_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                     ON CONFLICT(bucket, url) DO UPDATE SET
                        response_url = excluded.response_url,
                        status = excluded.status,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        captured_at = excluded.captured_at",
                    params![
                        &bucket,
                        &url,
                        &response.url,
                        response.status,
                        &headers_json,
                        &response.body[..],
                        &response.captured_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn bucket_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT DISTINCT bucket FROM cache_entries ORDER BY bucket")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<bool, Error> {
        let bucket = bucket.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM cache_entries WHERE bucket = ?1", params![bucket])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }
}
