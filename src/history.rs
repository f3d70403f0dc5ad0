//! history.rs: in-memory forecast log for the service layer.
//!
//! Forecasts are appended when issued, completed exactly once after their
//! window elapses, and never touched again. The scoring core never reads
//! this; the scheduled recalibration (`POST /forecasts/recalibrate`) pulls
//! completed records out of it and feeds them to
//! `feedback::calculate_feedback_loop`.

use std::sync::Mutex;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::ScoreError;
use crate::feedback::ForecastRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggedForecast {
    pub id: u64,
    #[serde(flatten)]
    pub record: ForecastRecord,
}

#[derive(Debug)]
struct Inner {
    next_id: u64,
    rows: Vec<LoggedForecast>,
}

#[derive(Debug)]
pub struct ForecastLog {
    inner: Mutex<Inner>,
    cap: usize,
}

impl ForecastLog {
    pub fn with_capacity(cap: usize) -> Self {
        let cap = cap.clamp(1, 100_000);
        Self {
            inner: Mutex::new(Inner {
                next_id: 1,
                rows: Vec::with_capacity(cap.min(1_024)),
            }),
            cap,
        }
    }

    /// Append a newly issued forecast. Any outcome on the input is dropped:
    /// outcomes arrive through `record_outcome` once the window has elapsed.
    pub fn issue(&self, mut record: ForecastRecord) -> u64 {
        record.actual_roi = None;

        let mut inner = self.inner.lock().expect("forecast log mutex poisoned");
        let id = inner.next_id;
        inner.next_id += 1;
        inner.rows.push(LoggedForecast { id, record });
        if inner.rows.len() > self.cap {
            let excess = inner.rows.len() - self.cap;
            inner.rows.drain(0..excess);
        }
        id
    }

    /// Complete a forecast with its observed ROI.
    pub fn record_outcome(
        &self,
        id: u64,
        actual_roi: f64,
        today: NaiveDate,
    ) -> Result<ForecastRecord, ScoreError> {
        let mut inner = self.inner.lock().expect("forecast log mutex poisoned");
        let row = inner
            .rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(ScoreError::UnknownForecast { id })?;

        if row.record.is_completed() {
            return Err(ScoreError::OutcomeAlreadyRecorded { id });
        }
        let due = row.record.due_date();
        if today < due {
            return Err(ScoreError::WindowOpen { id, due });
        }

        row.record.actual_roi = Some(actual_roi);
        Ok(row.record.clone())
    }

    /// Forecasts whose window has elapsed but which have no outcome yet.
    pub fn due(&self, today: NaiveDate) -> Vec<LoggedForecast> {
        let inner = self.inner.lock().expect("forecast log mutex poisoned");
        inner
            .rows
            .iter()
            .filter(|r| !r.record.is_completed() && r.record.due_date() <= today)
            .cloned()
            .collect()
    }

    /// Completed forecasts in issue order.
    pub fn completed(&self) -> Vec<ForecastRecord> {
        let inner = self.inner.lock().expect("forecast log mutex poisoned");
        inner
            .rows
            .iter()
            .filter(|r| r.record.is_completed())
            .map(|r| r.record.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("forecast log mutex poisoned").rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
