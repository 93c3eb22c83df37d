use std::path::Path;

use chrono::{DateTime, Datelike, Utc};
use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use super::{BucketStore, Keyed};
use crate::error::Result;

/// A record that belongs to a time series. `storage_key` must return
/// `bucket_key(entity_id, year, month)` of `recorded_at`, so two records for
/// the same entity and calendar month always land in the same bucket.
pub trait SeriesRecord: Keyed + Clone + Serialize + DeserializeOwned {
    fn entity_id(&self) -> i64;
    fn recorded_at(&self) -> DateTime<Utc>;
}

/// Daily review-count snapshot for one tracked app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSnapshot {
    pub app_id: i64,
    pub recorded_at: DateTime<Utc>,
    pub total_reviews: u64,
    pub recent_reviews: u64,
}

impl Keyed for ReviewSnapshot {
    fn storage_key(&self) -> String {
        bucket_key(self.app_id, self.recorded_at.year(), self.recorded_at.month())
    }
}

impl SeriesRecord for ReviewSnapshot {
    fn entity_id(&self) -> i64 {
        self.app_id
    }

    fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }
}

pub fn bucket_key(entity_id: i64, year: i32, month: u32) -> String {
    format!("{entity_id}_{year:04}_{month:02}")
}

/// Month-bucketed time series over a [`BucketStore`]. Each bucket holds the
/// ordered records of one entity for one calendar month, with at most one
/// record per calendar day.
///
/// Writers within a process are serialized by an internal lock; the bucket
/// read-modify-write is not protected across processes, and a second process
/// writing the same bucket loses updates. Single-writer access is a
/// precondition.
pub struct SeriesStore<T: SeriesRecord> {
    buckets: BucketStore,
    all: Mutex<Vec<T>>,
    write_lock: Mutex<()>,
}

impl<T: SeriesRecord> SeriesStore<T> {
    pub fn open(path: impl AsRef<Path>, wipe: bool) -> Result<Self> {
        Ok(Self {
            buckets: BucketStore::open(path, wipe)?,
            all: Mutex::new(Vec::new()),
            write_lock: Mutex::new(()),
        })
    }

    /// Upserts `record` into its month bucket, replacing any record already
    /// stored for the same entity and calendar day. Records for other days in
    /// the bucket are untouched.
    pub fn add(&self, record: T) -> Result<()> {
        let _guard = self.write_lock.lock();

        let key = record.storage_key();
        let day = record.recorded_at().date_naive();

        let mut records: Vec<T> = self.buckets.get_opt(&key)?.unwrap_or_default();
        records.retain(|existing| existing.recorded_at().date_naive() != day);
        records.push(record.clone());
        self.buckets.put(&key, &records)?;
        debug!(
            entity = record.entity_id(),
            bucket = %key,
            records = records.len(),
            "stored series record"
        );

        self.all.lock().push(record);
        Ok(())
    }

    /// Records for `entity_id` with `start <= recorded_at <= end`, walking
    /// month buckets from `start`'s month through `end`'s month inclusive.
    /// Months with no bucket are skipped; an inverted range yields nothing.
    pub fn load(&self, entity_id: i64, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<T>> {
        let mut matches = Vec::new();
        for (year, month) in month_span(start, end) {
            let key = bucket_key(entity_id, year, month);
            let Some(records) = self.buckets.get_opt::<Vec<T>>(&key)? else {
                continue;
            };
            matches.extend(
                records
                    .into_iter()
                    .filter(|record| record.recorded_at() >= start && record.recorded_at() <= end),
            );
        }
        Ok(matches)
    }

    /// The stored bucket for one entity-month, if any.
    pub fn bucket(&self, entity_id: i64, year: i32, month: u32) -> Result<Option<Vec<T>>> {
        self.buckets.get_opt(&bucket_key(entity_id, year, month))
    }

    /// Every record added through this handle, in add order. This is a cache
    /// for whole-history scans; the engine remains the source of truth.
    pub fn all(&self) -> Vec<T> {
        self.all.lock().clone()
    }

    pub fn bucket_count(&self) -> Result<usize> {
        Ok(self.buckets.keys()?.len())
    }
}

fn month_span(start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<(i32, u32)> {
    let mut months = Vec::new();
    if start > end {
        return months;
    }

    let (mut year, mut month) = (start.year(), start.month());
    loop {
        months.push((year, month));
        if year == end.year() && month == end.month() {
            break;
        }
        month += 1;
        if month > 12 {
            month = 1;
            year += 1;
        }
    }
    months
}
