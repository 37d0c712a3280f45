//! Calendar aggregation over entry keys.
//!
//! Everything here is derived from the flat key list on every change and
//! never stored.

use std::collections::BTreeMap;

use chrono::{Days, Local, NaiveDate};
use serde::Serialize;

use crate::journal::entry_key::EntryKey;

/// How far back `find_most_recent_empty_date` looks, in days.
pub const EMPTY_DATE_SEARCH_DAYS: u64 = 30;

const MARK_COLOR: &str = "#007AFF";

/// Calendar date → keys on that date, in input order.
pub type EntriesByDate = BTreeMap<NaiveDate, Vec<EntryKey>>;

/// Calendar date → presentation flags.
pub type MarkedDates = BTreeMap<NaiveDate, MarkedDate>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkedDate {
    pub marked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dot_color: Option<String>,
    pub selected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_color: Option<String>,
}

pub fn group_entries_by_date(keys: &[EntryKey]) -> EntriesByDate {
    let mut grouped = EntriesByDate::new();
    for key in keys {
        grouped
            .entry(key.calendar_date())
            .or_default()
            .push(key.clone());
    }
    grouped
}

/// Marks every date with at least one entry, then overlays the selection.
/// A selected date with no entries is still highlighted.
pub fn generate_marked_dates(keys: &[EntryKey], selected: Option<NaiveDate>) -> MarkedDates {
    let mut marked: MarkedDates = group_entries_by_date(keys)
        .into_keys()
        .map(|date| {
            (
                date,
                MarkedDate {
                    marked: true,
                    dot_color: Some(MARK_COLOR.to_string()),
                    ..MarkedDate::default()
                },
            )
        })
        .collect();

    if let Some(date) = selected {
        let flags = marked.entry(date).or_default();
        flags.selected = true;
        flags.selected_color = Some(MARK_COLOR.to_string());
    }

    marked
}

/// Walks back from the day before `today`, returning the first day without
/// an entry. Gives up after `EMPTY_DATE_SEARCH_DAYS` days; `None` means the
/// whole window is covered.
pub fn find_most_recent_empty_date(keys: &[EntryKey], today: NaiveDate) -> Option<NaiveDate> {
    let by_date = group_entries_by_date(keys);
    (1..=EMPTY_DATE_SEARCH_DAYS)
        .filter_map(|back| today.checked_sub_days(Days::new(back)))
        .find(|date| !by_date.contains_key(date))
}

/// `find_most_recent_empty_date` against the local calendar.
pub fn find_most_recent_empty_date_from_now(keys: &[EntryKey]) -> Option<NaiveDate> {
    find_most_recent_empty_date(keys, Local::now().date_naive())
}

/// `Jun 1, 2024`
pub fn format_date_for_display(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Label for an entry shown under a date header.
#[derive(Debug, Clone, Serialize)]
pub struct EntryLabel {
    pub entry_key: EntryKey,
    pub label: String,
}

/// The calendar screen's derived state.
#[derive(Debug, Clone, Serialize)]
pub struct CalendarView {
    pub marked_dates: MarkedDates,
    pub selected_date: Option<NaiveDate>,
    pub selected_date_display: Option<String>,
    pub entries_for_selected_date: Vec<EntryLabel>,
    pub most_recent_empty_date: Option<NaiveDate>,
}

impl CalendarView {
    pub fn build(keys: &[EntryKey], selected: Option<NaiveDate>, today: NaiveDate) -> Self {
        let mut by_date = group_entries_by_date(keys);
        let on_selected = selected
            .and_then(|date| by_date.remove(&date))
            .unwrap_or_default();
        let ambiguous = on_selected.len() > 1;

        Self {
            marked_dates: generate_marked_dates(keys, selected),
            selected_date: selected,
            selected_date_display: selected.map(format_date_for_display),
            entries_for_selected_date: on_selected
                .into_iter()
                .map(|key| EntryLabel {
                    label: key.label(ambiguous),
                    entry_key: key,
                })
                .collect(),
            most_recent_empty_date: find_most_recent_empty_date(keys, today),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(raw: &[&str]) -> Vec<EntryKey> {
        raw.iter().map(|k| EntryKey::parse(k).unwrap()).collect()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_group_by_date_scenario() {
        let input = keys(&[
            "06-01-24_09:00:00AM",
            "06-01-24_02:00:00PM",
            "06-02-24_08:30:00AM",
        ]);
        let grouped = group_entries_by_date(&input);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[&date(2024, 6, 1)], vec![input[0].clone(), input[1].clone()]);
        assert_eq!(grouped[&date(2024, 6, 2)], vec![input[2].clone()]);
    }

    #[test]
    fn test_group_is_partition() {
        let input = keys(&[
            "03-04-24_11:11:11PM",
            "03-05-24_12:00:00AM",
            "03-04-24_01:00:00AM",
            "12-31-23_10:00:00AM",
            "03-05-24_06:45:00PM",
        ]);
        let grouped = group_entries_by_date(&input);
        let total: usize = grouped.values().map(Vec::len).sum();
        assert_eq!(total, input.len());
        for (day, bucket) in &grouped {
            assert!(bucket.iter().all(|k| k.calendar_date() == *day));
        }
        for key in &input {
            let hits = grouped.values().filter(|b| b.contains(key)).count();
            assert_eq!(hits, 1);
        }
    }

    #[test]
    fn test_group_keeps_input_order() {
        let input = keys(&["06-01-24_02:00:00PM", "06-01-24_09:00:00AM"]);
        let grouped = group_entries_by_date(&input);
        assert_eq!(grouped[&date(2024, 6, 1)], input);
    }

    #[test]
    fn test_marked_dates_without_selection() {
        let input = keys(&["06-01-24_09:00:00AM", "06-02-24_08:30:00AM"]);
        let marked = generate_marked_dates(&input, None);
        assert_eq!(marked.len(), 2);
        for flags in marked.values() {
            assert!(flags.marked);
            assert!(!flags.selected);
            assert_eq!(flags.dot_color.as_deref(), Some("#007AFF"));
            assert!(flags.selected_color.is_none());
        }
    }

    #[test]
    fn test_marked_dates_selects_existing_date() {
        let input = keys(&["06-01-24_09:00:00AM"]);
        let marked = generate_marked_dates(&input, Some(date(2024, 6, 1)));
        let flags = &marked[&date(2024, 6, 1)];
        assert!(flags.marked);
        assert!(flags.selected);
        assert_eq!(flags.selected_color.as_deref(), Some("#007AFF"));
    }

    #[test]
    fn test_marked_dates_selects_empty_date() {
        let input = keys(&["06-01-24_09:00:00AM"]);
        let marked = generate_marked_dates(&input, Some(date(2024, 6, 9)));
        assert_eq!(marked.len(), 2);
        let flags = &marked[&date(2024, 6, 9)];
        assert!(!flags.marked);
        assert!(flags.selected);
    }

    #[test]
    fn test_marked_date_json_shape() {
        let input = keys(&["06-01-24_09:00:00AM"]);
        let marked = generate_marked_dates(&input, None);
        let json = serde_json::to_value(&marked).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "2024-06-01": { "marked": true, "dotColor": "#007AFF", "selected": false }
            })
        );
    }

    #[test]
    fn test_most_recent_empty_with_no_entries() {
        assert_eq!(
            find_most_recent_empty_date(&[], date(2024, 7, 15)),
            Some(date(2024, 7, 14))
        );
    }

    #[test]
    fn test_most_recent_empty_ignores_today() {
        let input = keys(&["07-15-24_09:00:00AM", "07-14-24_09:00:00AM"]);
        assert_eq!(
            find_most_recent_empty_date(&input, date(2024, 7, 15)),
            Some(date(2024, 7, 13))
        );
    }

    #[test]
    fn test_most_recent_empty_none_when_window_covered() {
        let today = date(2024, 3, 10);
        let covered: Vec<EntryKey> = (1..=30)
            .map(|back| {
                let day = today.checked_sub_days(Days::new(back)).unwrap();
                EntryKey::from_datetime(day.and_hms_opt(8, 0, 0).unwrap()).unwrap()
            })
            .collect();
        assert_eq!(find_most_recent_empty_date(&covered, today), None);
    }

    #[test]
    fn test_most_recent_empty_finds_last_day_of_window() {
        let today = date(2024, 3, 10);
        let covered: Vec<EntryKey> = (1..=29)
            .map(|back| {
                let day = today.checked_sub_days(Days::new(back)).unwrap();
                EntryKey::from_datetime(day.and_hms_opt(8, 0, 0).unwrap()).unwrap()
            })
            .collect();
        assert_eq!(
            find_most_recent_empty_date(&covered, today),
            today.checked_sub_days(Days::new(30))
        );
    }

    #[test]
    fn test_format_date_for_display() {
        assert_eq!(format_date_for_display(date(2024, 6, 1)), "Jun 1, 2024");
        assert_eq!(format_date_for_display(date(2023, 12, 25)), "Dec 25, 2023");
    }

    #[test]
    fn test_calendar_view_labels_shared_date_by_time() {
        let input = keys(&[
            "06-01-24_02:00:00PM",
            "06-01-24_09:00:00AM",
            "06-02-24_08:30:00AM",
        ]);
        let view = CalendarView::build(&input, Some(date(2024, 6, 1)), date(2024, 6, 3));
        let labels: Vec<&str> = view
            .entries_for_selected_date
            .iter()
            .map(|e| e.label.as_str())
            .collect();
        assert_eq!(labels, vec!["2:00:00 PM", "9:00:00 AM"]);
        assert_eq!(view.selected_date_display.as_deref(), Some("Jun 1, 2024"));
        assert_eq!(view.most_recent_empty_date, Some(date(2024, 5, 31)));
    }

    #[test]
    fn test_calendar_view_single_entry_uses_full_label() {
        let input = keys(&["06-02-24_08:30:00AM"]);
        let view = CalendarView::build(&input, Some(date(2024, 6, 2)), date(2024, 6, 3));
        assert_eq!(view.entries_for_selected_date.len(), 1);
        assert_eq!(view.entries_for_selected_date[0].label, "6-02-2024 8:30:00 AM");
    }

    #[test]
    fn test_calendar_view_without_selection() {
        let input = keys(&["06-02-24_08:30:00AM"]);
        let view = CalendarView::build(&input, None, date(2024, 6, 3));
        assert!(view.entries_for_selected_date.is_empty());
        assert!(view.selected_date_display.is_none());
        assert!(view.marked_dates.values().all(|m| !m.selected));
    }
}
