//! Month grid and per-day workout lookup for the calendar view.

use std::collections::BTreeMap;

use time::{util::days_in_year_month, Date, Duration, Month, UtcOffset};

use crate::workouts::Workout;

/// A calendar month, identified by its first day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CalendarMonth {
    first: Date,
}

impl CalendarMonth {
    pub fn new(year: i32, month: Month) -> Result<Self, time::error::ComponentRange> {
        Ok(Self {
            first: Date::from_calendar_date(year, month, 1)?,
        })
    }

    pub fn containing(date: Date) -> Self {
        Self {
            first: date.replace_day(1).unwrap_or(date),
        }
    }

    pub fn year(self) -> i32 {
        self.first.year()
    }

    pub fn month(self) -> Month {
        self.first.month()
    }

    /// "May 2024"
    pub fn title(self) -> String {
        format!("{} {}", self.month(), self.year())
    }

    pub fn days_in_month(self) -> u8 {
        days_in_year_month(self.year(), self.month())
    }

    /// Column of the 1st in a Sunday-first week.
    pub fn first_weekday(self) -> u8 {
        self.first.weekday().number_days_from_sunday()
    }

    /// The following month. Stays put at the last representable month.
    pub fn next(self) -> Self {
        self.first
            .checked_add(Duration::days(i64::from(self.days_in_month())))
            .map(Self::containing)
            .unwrap_or(self)
    }

    /// The preceding month. Stays put at the first representable month.
    pub fn previous(self) -> Self {
        self.first
            .previous_day()
            .map(Self::containing)
            .unwrap_or(self)
    }

    pub fn contains(self, date: Date) -> bool {
        date.year() == self.year() && date.month() == self.month()
    }

    pub fn is_today(self, day: u8, today: Date) -> bool {
        self.contains(today) && today.day() == day
    }

    /// Sunday-first rows of day numbers; cells outside the month are `None`.
    pub fn weeks(self) -> Vec<[Option<u8>; 7]> {
        let lead = usize::from(self.first_weekday());
        let days = self.days_in_month();
        let mut weeks = Vec::with_capacity(6);
        let mut row = [None; 7];
        let mut col = lead;
        for day in 1..=days {
            row[col] = Some(day);
            col += 1;
            if col == 7 {
                weeks.push(row);
                row = [None; 7];
                col = 0;
            }
        }
        if col > 0 {
            weeks.push(row);
        }
        weeks
    }

    /// Workouts whose local date (at `offset`) is `day` of this month.
    pub fn workouts_on<'a>(self, workouts: &'a [Workout], day: u8, offset: UtcOffset) -> Vec<&'a Workout> {
        workouts
            .iter()
            .filter(|w| {
                let local = w.date.to_offset(offset).date();
                self.contains(local) && local.day() == day
            })
            .collect()
    }

    /// Number of workouts on each day of this month that has any.
    pub fn day_counts(self, workouts: &[Workout], offset: UtcOffset) -> BTreeMap<u8, usize> {
        let mut counts = BTreeMap::new();
        for w in workouts {
            let local = w.date.to_offset(offset).date();
            if self.contains(local) {
                *counts.entry(local.day()).or_default() += 1;
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime, offset};
    use uuid::Uuid;

    fn workout(at: time::OffsetDateTime) -> Workout {
        Workout {
            id: Uuid::new_v4(),
            date: at,
            kind: "Run".into(),
            duration: 30,
            calories: 300,
            notes: String::new(),
        }
    }

    #[test]
    fn navigation_wraps_years() {
        let dec = CalendarMonth::new(2024, Month::December).unwrap();
        let jan = dec.next();
        assert_eq!((jan.year(), jan.month()), (2025, Month::January));
        assert_eq!(jan.previous(), dec);
        assert_eq!(jan.title(), "January 2025");
    }

    #[test]
    fn grid_layout_for_may_2024() {
        // May 1st 2024 is a Wednesday
        let may = CalendarMonth::containing(date!(2024-05-17));
        assert_eq!(may.days_in_month(), 31);
        assert_eq!(may.first_weekday(), 3);

        let weeks = may.weeks();
        assert_eq!(weeks.len(), 5);
        assert_eq!(weeks[0], [None, None, None, Some(1), Some(2), Some(3), Some(4)]);
        assert_eq!(weeks[4], [Some(26), Some(27), Some(28), Some(29), Some(30), Some(31), None]);
    }

    #[test]
    fn six_rows_when_month_spills() {
        // June 2024 starts on a Saturday
        let june = CalendarMonth::new(2024, Month::June).unwrap();
        let weeks = june.weeks();
        assert_eq!(weeks.len(), 6);
        assert_eq!(weeks[5][0], Some(30));
    }

    #[test]
    fn leap_february() {
        assert_eq!(CalendarMonth::new(2024, Month::February).unwrap().days_in_month(), 29);
        assert_eq!(CalendarMonth::new(2023, Month::February).unwrap().days_in_month(), 28);
    }

    #[test]
    fn workouts_bucketed_by_local_day() {
        let workouts = vec![
            workout(datetime!(2024-05-03 08:00 UTC)),
            workout(datetime!(2024-05-03 18:00 UTC)),
            workout(datetime!(2024-05-31 23:30 UTC)),
            workout(datetime!(2024-04-30 08:00 UTC)),
        ];
        let may = CalendarMonth::new(2024, Month::May).unwrap();

        assert_eq!(may.workouts_on(&workouts, 3, offset!(UTC)).len(), 2);
        assert_eq!(may.workouts_on(&workouts, 31, offset!(UTC)).len(), 1);
        // at +01:00 the late workout falls on June 1st
        assert!(may.workouts_on(&workouts, 31, offset!(+1)).is_empty());

        let counts = may.day_counts(&workouts, offset!(UTC));
        assert_eq!(counts.get(&3), Some(&2));
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn today_marker() {
        let may = CalendarMonth::new(2024, Month::May).unwrap();
        assert!(may.is_today(10, date!(2024-05-10)));
        assert!(!may.is_today(10, date!(2024-06-10)));
    }
}
