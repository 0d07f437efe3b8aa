//! Calendar domain model: weekly operating hours and date-scoped
//! schedule exceptions.

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SlotwiseResult;
use crate::time::{TimeOfDay, TimeRange};

/// Opening hours for one weekday, `[open, close)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayHours {
    pub is_open: bool,
    pub open: TimeOfDay,
    pub close: TimeOfDay,
}

impl DayHours {
    pub fn closed() -> Self {
        Self {
            is_open: false,
            open: TimeOfDay::MIDNIGHT,
            close: TimeOfDay::MIDNIGHT,
        }
    }

    pub fn open(open: TimeOfDay, close: TimeOfDay) -> SlotwiseResult<Self> {
        TimeRange::new(open, close)?;
        Ok(Self {
            is_open: true,
            open,
            close,
        })
    }

    /// The open window, or `None` on a closed day.
    pub fn window(&self) -> Option<TimeRange> {
        if self.is_open && self.open < self.close {
            Some(TimeRange {
                start: self.open,
                end: self.close,
            })
        } else {
            None
        }
    }
}

/// Base weekly schedule, indexed Monday-first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatingHours {
    pub days: [DayHours; 7],
}

impl OperatingHours {
    /// Every weekday closed.
    pub fn closed() -> Self {
        Self {
            days: [DayHours::closed(); 7],
        }
    }

    /// Same hours on each listed weekday, closed on the rest.
    pub fn uniform(weekdays: &[Weekday], hours: DayHours) -> Self {
        let mut schedule = Self::closed();
        for day in weekdays {
            schedule.set(*day, hours);
        }
        schedule
    }

    pub fn get(&self, weekday: Weekday) -> DayHours {
        self.days[weekday.num_days_from_monday() as usize]
    }

    pub fn set(&mut self, weekday: Weekday, hours: DayHours) {
        self.days[weekday.num_days_from_monday() as usize] = hours;
    }

    pub fn for_date(&self, date: NaiveDate) -> DayHours {
        self.get(date.weekday())
    }
}

impl Default for OperatingHours {
    fn default() -> Self {
        Self::closed()
    }
}

/// What part of a date an exception blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExceptionBlock {
    FullDay,
    Partial { range: TimeRange },
}

/// A date-scoped override of the base schedule. At most one exists per
/// tenant and date; a newer one replaces the older.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleException {
    pub tenant_id: Uuid,
    pub date: NaiveDate,
    pub block: ExceptionBlock,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl ScheduleException {
    /// True when the exception blocks the given minute.
    pub fn blocks(&self, t: TimeOfDay) -> bool {
        match self.block {
            ExceptionBlock::FullDay => true,
            ExceptionBlock::Partial { range } => range.contains(t),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PutScheduleException {
    pub tenant_id: Uuid,
    pub date: NaiveDate,
    pub block: ExceptionBlock,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> TimeOfDay {
        s.parse().unwrap()
    }

    #[test]
    fn uniform_schedule_leaves_other_days_closed() {
        let hours = OperatingHours::uniform(
            &[Weekday::Mon, Weekday::Fri],
            DayHours::open(t("09:00"), t("18:00")).unwrap(),
        );
        assert!(hours.get(Weekday::Mon).window().is_some());
        assert!(hours.get(Weekday::Tue).window().is_none());
        assert_eq!(hours.get(Weekday::Fri).open, t("09:00"));
    }

    #[test]
    fn day_with_inverted_hours_is_rejected() {
        assert!(DayHours::open(t("18:00"), t("09:00")).is_err());
    }

    #[test]
    fn partial_exception_blocks_only_its_range() {
        let ex = ScheduleException {
            tenant_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2024, 2, 13).unwrap(),
            block: ExceptionBlock::Partial {
                range: TimeRange::new(t("12:00"), t("13:00")).unwrap(),
            },
            reason: "Staff meeting".into(),
            created_at: Utc::now(),
        };
        assert!(ex.blocks(t("12:00")));
        assert!(ex.blocks(t("12:59")));
        assert!(!ex.blocks(t("13:00")));
        assert!(!ex.blocks(t("11:59")));
    }
}
