use crate::models::{weekday_name, RecordSet, WEEKDAYS};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WeekdayCount {
    pub weekday: &'static str,
    pub count: usize,
}

/// Publication frequencies by hour, weekday and month. Every member is empty
/// when no record carries a date.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PublicationPatterns {
    pub hourly_distribution: BTreeMap<u32, usize>,
    /// Monday→Sunday, days without articles omitted.
    pub weekday_distribution: Vec<WeekdayCount>,
    pub monthly_distribution: BTreeMap<u32, usize>,
    pub peak_hour: Option<u32>,
    pub most_active_day: Option<&'static str>,
}

impl PublicationPatterns {
    pub fn is_empty(&self) -> bool {
        self.hourly_distribution.is_empty()
    }
}

pub fn publication_patterns(records: &RecordSet) -> PublicationPatterns {
    let mut hourly: BTreeMap<u32, usize> = BTreeMap::new();
    let mut monthly: BTreeMap<u32, usize> = BTreeMap::new();
    let mut by_weekday = [0usize; 7];
    for record in records {
        let d = record.derived();
        let (Some(hour), Some(month), Some(weekday)) = (d.hour, d.month, d.weekday) else {
            continue;
        };
        *hourly.entry(hour).or_default() += 1;
        *monthly.entry(month).or_default() += 1;
        by_weekday[weekday.num_days_from_monday() as usize] += 1;
    }

    // Strict comparison keeps the earliest hour / weekday among equal maxima.
    let mut peak_hour: Option<(u32, usize)> = None;
    for (&hour, &count) in &hourly {
        if peak_hour.map_or(true, |(_, best)| count > best) {
            peak_hour = Some((hour, count));
        }
    }
    let mut most_active: Option<(usize, usize)> = None;
    for (i, &count) in by_weekday.iter().enumerate() {
        if count > 0 && most_active.map_or(true, |(_, best)| count > best) {
            most_active = Some((i, count));
        }
    }

    PublicationPatterns {
        hourly_distribution: hourly,
        weekday_distribution: WEEKDAYS
            .iter()
            .zip(by_weekday)
            .filter(|(_, count)| *count > 0)
            .map(|(day, count)| WeekdayCount {
                weekday: weekday_name(*day),
                count,
            })
            .collect(),
        monthly_distribution: monthly,
        peak_hour: peak_hour.map(|(hour, _)| hour),
        most_active_day: most_active.map(|(i, _)| weekday_name(WEEKDAYS[i])),
    }
}
