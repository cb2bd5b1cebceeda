//! Weekly statistics engine feeding the weekly report.
//!
//! Pure functions over a task snapshot and a reference "now"; deterministic
//! for fixed inputs, no side effects.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::task::{Category, Task};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyStats {
    pub completed_count: usize,
    pub remaining_count: usize,
    /// Integer percentage over ALL tasks, not just this week's.
    pub completion_rate: u32,
    /// Mean creation-to-completion delay in whole days, one decimal.
    pub average_delay_days: f64,
    /// Consecutive days with at least one completion, counting back from today.
    pub streak: u32,
    pub top_category: Option<Category>,
    pub overdue_count: usize,
    pub upcoming_count: usize,
}

/// Compute the full statistics block for the trailing 7-day window.
pub fn compute_weekly_stats(tasks: &[Task], now: DateTime<Utc>) -> WeeklyStats {
    let week_ago = now - Duration::days(7);

    // Window is inclusive on both ends.
    let completed_this_week: Vec<&Task> = tasks
        .iter()
        .filter(|t| {
            t.is_completed
                && t.completed_at
                    .map(|c| c >= week_ago && c <= now)
                    .unwrap_or(false)
        })
        .collect();

    let remaining: Vec<&Task> = tasks
        .iter()
        .filter(|t| !t.is_completed && !t.is_archived)
        .collect();

    let all_completed: Vec<&Task> = tasks.iter().filter(|t| t.is_completed).collect();

    let completion_rate = if tasks.is_empty() {
        0
    } else {
        ((all_completed.len() as f64 / tasks.len() as f64) * 100.0).round() as u32
    };

    let (overdue_count, upcoming_count) = partition_by_due_date(&remaining, now);

    WeeklyStats {
        completed_count: completed_this_week.len(),
        remaining_count: remaining.len(),
        completion_rate,
        average_delay_days: average_delay_days(&all_completed),
        streak: completion_streak(&all_completed, now),
        top_category: top_category(&completed_this_week),
        overdue_count,
        upcoming_count,
    }
}

/// Mean creation-to-completion delay in whole days over all completed tasks,
/// rounded to one decimal. 0 when nothing is completed.
fn average_delay_days(completed: &[&Task]) -> f64 {
    if completed.is_empty() {
        return 0.0;
    }

    let total: i64 = completed
        .iter()
        .filter_map(|t| t.completed_at.map(|c| (c - t.created_at).num_days()))
        .sum();

    let mean = total as f64 / completed.len() as f64;
    (mean * 10.0).round() / 10.0
}

/// Walk backward from today's calendar day; each day must have at least one
/// completion. The first gap stops the walk, so a day without completions
/// breaks the streak immediately.
fn completion_streak(completed: &[&Task], now: DateTime<Utc>) -> u32 {
    let days: HashSet<NaiveDate> = completed
        .iter()
        .filter_map(|t| t.completed_at.map(|c| c.date_naive()))
        .collect();

    if days.is_empty() {
        return 0;
    }

    let mut streak = 0;
    let mut day = now.date_naive();
    while days.contains(&day) {
        streak += 1;
        match day.pred_opt() {
            Some(prev) => day = prev,
            None => break,
        }
    }
    streak
}

/// Most frequent category among this week's completions. Counts accumulate
/// in first-encounter order and the scan uses a strict comparison, so the
/// first category to reach the maximum keeps the title on a tie.
fn top_category(completed_this_week: &[&Task]) -> Option<Category> {
    let mut counts: Vec<(Category, usize)> = Vec::new();

    for task in completed_this_week {
        for cat in &task.categories {
            match counts.iter_mut().find(|(c, _)| c == cat) {
                Some((_, n)) => *n += 1,
                None => counts.push((*cat, 1)),
            }
        }
    }

    let mut best: Option<(Category, usize)> = None;
    for (cat, n) in counts {
        if best.map(|(_, max)| n > max).unwrap_or(true) {
            best = Some((cat, n));
        }
    }
    best.map(|(cat, _)| cat)
}

/// Partition remaining tasks into overdue / upcoming. A task with no due
/// date counts as upcoming; overdue requires the due date strictly before
/// now.
fn partition_by_due_date(remaining: &[&Task], now: DateTime<Utc>) -> (usize, usize) {
    let mut overdue = 0;
    let mut upcoming = 0;
    for task in remaining {
        match task.due_date {
            Some(due) if due < now => overdue += 1,
            _ => upcoming += 1,
        }
    }
    (overdue, upcoming)
}

/// Congratulation line for the weekly email, keyed on the number of tasks
/// completed this week. Thresholds: 0, 1, 2-3, 4-7, 8-15, 16+.
pub fn congratulations_message(count: usize) -> String {
    match count {
        0 => "Pas de tâches cette semaine. Prêt à repartir ? 💭".to_string(),
        1 => "Bravo ! 1 tâche complétée. Chaque pas compte ! 🎊".to_string(),
        2..=3 => format!("Super ! {count} tâches. Tu prends de l'élan ! 🎉"),
        4..=7 => format!("Excellent ! {count} tâches. Belle lancée ! 🌟"),
        8..=15 => format!("Incroyable ! {count} tâches. Machine à productivité ! 🚀"),
        _ => format!("WOW ! {count} tâches. Tu es en feu ! 🏆"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Priority;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn now() -> DateTime<Utc> {
        at(2026, 6, 20, 12, 0)
    }

    fn completed(id: &str, created: DateTime<Utc>, done: DateTime<Utc>) -> Task {
        let mut t = Task::new(id, id, created);
        t.complete(done);
        t
    }

    #[test]
    fn empty_input_yields_zeroes_not_errors() {
        let stats = compute_weekly_stats(&[], now());
        assert_eq!(stats.completed_count, 0);
        assert_eq!(stats.remaining_count, 0);
        assert_eq!(stats.completion_rate, 0);
        assert_eq!(stats.average_delay_days, 0.0);
        assert_eq!(stats.streak, 0);
        assert_eq!(stats.top_category, None);
    }

    #[test]
    fn window_is_inclusive_on_both_ends() {
        let boundary = completed("t1", at(2026, 6, 10, 12, 0), now() - Duration::days(7));
        let inside = completed("t2", at(2026, 6, 15, 12, 0), now());
        let outside = completed(
            "t3",
            at(2026, 6, 1, 12, 0),
            now() - Duration::days(7) - Duration::minutes(1),
        );

        let stats = compute_weekly_stats(&[boundary, inside, outside], now());
        assert_eq!(stats.completed_count, 2);
    }

    #[test]
    fn completion_rate_counts_all_tasks() {
        let done = completed("t1", at(2026, 6, 1, 9, 0), at(2026, 6, 2, 9, 0));
        let open = Task::new("t2", "open", at(2026, 6, 1, 9, 0));
        let also_open = Task::new("t3", "open too", at(2026, 6, 1, 9, 0));

        let stats = compute_weekly_stats(&[done, open, also_open], now());
        // 1 of 3 -> 33.33 -> 33
        assert_eq!(stats.completion_rate, 33);
    }

    #[test]
    fn average_delay_rounds_to_one_decimal() {
        // Delays of 1 and 2 whole days -> 1.5
        let a = completed("t1", at(2026, 6, 1, 9, 0), at(2026, 6, 2, 10, 0));
        let b = completed("t2", at(2026, 6, 1, 9, 0), at(2026, 6, 3, 11, 0));
        let stats = compute_weekly_stats(&[a, b], now());
        assert_eq!(stats.average_delay_days, 1.5);
    }

    #[test]
    fn streak_stops_at_first_gap() {
        // Completions today, yesterday and 3 days ago; gap at 2 days ago.
        let tasks = vec![
            completed("t1", at(2026, 6, 1, 9, 0), now()),
            completed("t2", at(2026, 6, 1, 9, 0), now() - Duration::days(1)),
            completed("t3", at(2026, 6, 1, 9, 0), now() - Duration::days(3)),
        ];
        let stats = compute_weekly_stats(&tasks, now());
        assert_eq!(stats.streak, 2);
    }

    #[test]
    fn streak_is_zero_without_a_completion_today() {
        let tasks = vec![completed("t1", at(2026, 6, 1, 9, 0), now() - Duration::days(1))];
        let stats = compute_weekly_stats(&tasks, now());
        assert_eq!(stats.streak, 0);
    }

    #[test]
    fn multiple_completions_on_one_day_count_once() {
        let tasks = vec![
            completed("t1", at(2026, 6, 1, 9, 0), now()),
            completed("t2", at(2026, 6, 1, 9, 0), now() - Duration::hours(2)),
        ];
        let stats = compute_weekly_stats(&tasks, now());
        assert_eq!(stats.streak, 1);
    }

    #[test]
    fn top_category_tie_goes_to_first_encountered() {
        let mut a = completed("t1", at(2026, 6, 18, 9, 0), now() - Duration::hours(5));
        a.categories = vec![Category::Travail];
        let mut b = completed("t2", at(2026, 6, 18, 9, 0), now() - Duration::hours(4));
        b.categories = vec![Category::Maison];
        let mut c = completed("t3", at(2026, 6, 18, 9, 0), now() - Duration::hours(3));
        c.categories = vec![Category::Maison];
        let mut d = completed("t4", at(2026, 6, 18, 9, 0), now() - Duration::hours(2));
        d.categories = vec![Category::Travail];

        // Travail and Maison both at 2; Travail was encountered first.
        let stats = compute_weekly_stats(&[a, b, c, d], now());
        assert_eq!(stats.top_category, Some(Category::Travail));
    }

    #[test]
    fn top_category_none_when_window_empty() {
        let mut old = completed("t1", at(2026, 5, 1, 9, 0), at(2026, 5, 2, 9, 0));
        old.categories = vec![Category::Courses];
        let stats = compute_weekly_stats(&[old], now());
        assert_eq!(stats.top_category, None);
    }

    #[test]
    fn due_exactly_now_counts_as_upcoming() {
        let due_now = Task::new("t1", "a", at(2026, 6, 1, 9, 0)).with_due_date(now());
        let overdue = Task::new("t2", "b", at(2026, 6, 1, 9, 0))
            .with_due_date(now() - Duration::minutes(1));
        let dateless = Task::new("t3", "c", at(2026, 6, 1, 9, 0));

        let stats = compute_weekly_stats(&[due_now, overdue, dateless], now());
        assert_eq!(stats.overdue_count, 1);
        assert_eq!(stats.upcoming_count, 2);
    }

    #[test]
    fn archived_completions_still_count_in_stats() {
        let mut t = completed("t1", at(2026, 6, 18, 9, 0), now() - Duration::hours(1));
        t.archive(now());
        let stats = compute_weekly_stats(&[t], now());
        assert_eq!(stats.completed_count, 1);
        assert_eq!(stats.remaining_count, 0);
    }

    #[test]
    fn congratulations_bucket_boundaries() {
        assert!(congratulations_message(0).contains("Pas de tâches"));
        assert!(congratulations_message(1).contains("Bravo"));
        assert!(congratulations_message(3).contains("Super"));
        assert!(congratulations_message(4).contains("Excellent"));
        assert!(congratulations_message(7).contains("Excellent"));
        assert!(congratulations_message(8).contains("Incroyable"));
        assert!(congratulations_message(15).contains("Incroyable"));
        assert!(congratulations_message(16).contains("WOW"));
    }

    #[test]
    fn stats_serialize_camel_case() {
        let stats = compute_weekly_stats(&[], now());
        let json = serde_json::to_value(&stats).unwrap();
        assert!(json.get("completedCount").is_some());
        assert!(json.get("averageDelayDays").is_some());
        assert!(json.get("topCategory").is_some());
    }

    #[test]
    fn priority_does_not_affect_stats() {
        let mut a = completed("t1", at(2026, 6, 18, 9, 0), now());
        a.priority = Priority::Low;
        let mut b = completed("t2", at(2026, 6, 18, 9, 0), now());
        b.priority = Priority::High;
        let stats = compute_weekly_stats(&[a, b], now());
        assert_eq!(stats.completed_count, 2);
    }
}
