//! Weekly digest HTML. Thin templating over the computed statistics.

use chrono::{DateTime, Duration, Utc};

use relance_core::stats::{WeeklyStats, congratulations_message};
use relance_core::task::Task;

/// How many remaining tasks the email lists before the overflow line.
const REMAINING_ROW_LIMIT: usize = 10;

fn format_date_fr(dt: DateTime<Utc>) -> String {
    dt.format("%d/%m/%Y").to_string()
}

fn categories_line(task: &Task) -> String {
    task.categories
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn task_row(task: &Task, right: &str) -> String {
    format!(
        r#"<tr>
  <td style="padding: 12px; border-bottom: 1px solid #E5E7EB;">
    <strong>{}</strong><br>
    <small style="color: #6B7280;">{} • {}</small>
  </td>
  <td style="padding: 12px; border-bottom: 1px solid #E5E7EB; text-align: right; color: #6B7280;">{}</td>
</tr>"#,
        task.title,
        task.priority.label(),
        categories_line(task),
        right
    )
}

/// Render the full report email for the given snapshot.
pub fn render_weekly_email(
    stats: &WeeklyStats,
    tasks: &[Task],
    now: DateTime<Utc>,
    is_test: bool,
) -> String {
    let week_ago = now - Duration::days(7);

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

    let congrats = congratulations_message(stats.completed_count);

    let completed_rows = if completed_this_week.is_empty() {
        r#"<tr><td colspan="2" style="padding: 20px; text-align: center; color: #6B7280;">Aucune tâche complétée cette semaine</td></tr>"#.to_string()
    } else {
        completed_this_week
            .iter()
            .map(|t| {
                let date = t.completed_at.map(format_date_fr).unwrap_or_default();
                task_row(t, &date)
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let remaining_rows = if remaining.is_empty() {
        r#"<tr><td colspan="2" style="padding: 20px; text-align: center; color: #6B7280;">Aucune tâche restante ! 🎉</td></tr>"#.to_string()
    } else {
        remaining
            .iter()
            .take(REMAINING_ROW_LIMIT)
            .map(|t| {
                let due = t
                    .due_date
                    .map(format_date_fr)
                    .unwrap_or_else(|| "Pas de date".to_string());
                task_row(t, &due)
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let overflow = remaining.len().saturating_sub(REMAINING_ROW_LIMIT);
    let overflow_line = if overflow > 0 {
        let s = if overflow > 1 { "s" } else { "" };
        format!(
            r#"<p style="text-align: center; color: #6B7280; margin-top: 10px;">... et {overflow} autre{s} tâche{s}</p>"#
        )
    } else {
        String::new()
    };

    let overdue_banner = if stats.overdue_count > 0 {
        let s = if stats.overdue_count > 1 { "s" } else { "" };
        format!(
            r#"<div style="margin-top: 15px; padding: 12px; background-color: #FEF2F2; border-left: 4px solid #EF4444; border-radius: 4px;">
  <span style="color: #991B1B; font-weight: 600;">⚠️ {} tâche{s} en retard</span>
</div>"#,
            stats.overdue_count
        )
    } else {
        String::new()
    };

    let header_line = if is_test {
        "📧 Email de Test"
    } else {
        "📊 Votre Bilan Hebdomadaire"
    };

    let top_category = stats
        .top_category
        .map(|c| c.to_string())
        .unwrap_or_else(|| "N/A".to_string());

    format!(
        r#"<!DOCTYPE html>
<html lang="fr">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Bilan Hebdomadaire Relance</title>
</head>
<body style="margin: 0; padding: 0; font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background-color: #FFFDF7;">
  <table width="100%" cellpadding="0" cellspacing="0" style="background-color: #FFFDF7;">
    <tr>
      <td align="center" style="padding: 40px 20px;">
        <table width="600" cellpadding="0" cellspacing="0" style="background-color: white; border-radius: 12px; box-shadow: 0 4px 6px rgba(0,0,0,0.1);">
          <tr>
            <td style="background: linear-gradient(135deg, #FF6B35 0%, #E85A2B 100%); padding: 40px; text-align: center; border-radius: 12px 12px 0 0;">
              <h1 style="margin: 0; color: white; font-size: 32px; font-weight: bold;">Relance</h1>
              <p style="margin: 10px 0 0; color: rgba(255,255,255,0.9); font-size: 16px;">{header_line}</p>
            </td>
          </tr>
          <tr>
            <td style="padding: 40px; text-align: center; background-color: #FFF7ED; border-bottom: 1px solid #FFEDD5;">
              <h2 style="margin: 0; color: #2D3142; font-size: 24px;">{congrats}</h2>
            </td>
          </tr>
          <tr>
            <td style="padding: 30px;">
              <table width="100%" cellpadding="0" cellspacing="0">
                <tr>
                  <td width="50%" style="padding: 20px; text-align: center; background-color: #F9FAFB; border-radius: 8px;">
                    <div style="font-size: 36px; font-weight: bold; color: #FF6B35;">{completed}</div>
                    <div style="color: #6B7280; margin-top: 5px;">Tâches complétées</div>
                  </td>
                  <td width="10"></td>
                  <td width="50%" style="padding: 20px; text-align: center; background-color: #F9FAFB; border-radius: 8px;">
                    <div style="font-size: 36px; font-weight: bold; color: #FF6B35;">{remaining_count}</div>
                    <div style="color: #6B7280; margin-top: 5px;">Tâches restantes</div>
                  </td>
                </tr>
              </table>
              <table width="100%" cellpadding="0" cellspacing="0" style="margin-top: 15px;">
                <tr>
                  <td width="33%" style="padding: 15px; text-align: center;">
                    <div style="font-size: 24px; font-weight: bold; color: #2D3142;">{rate}%</div>
                    <div style="color: #6B7280; font-size: 12px; margin-top: 3px;">Taux complétion</div>
                  </td>
                  <td width="33%" style="padding: 15px; text-align: center; border-left: 1px solid #E5E7EB; border-right: 1px solid #E5E7EB;">
                    <div style="font-size: 24px; font-weight: bold; color: #2D3142;">{delay}j</div>
                    <div style="color: #6B7280; font-size: 12px; margin-top: 3px;">Délai moyen</div>
                  </td>
                  <td width="33%" style="padding: 15px; text-align: center;">
                    <div style="font-size: 24px; font-weight: bold; color: #2D3142;">{top_category}</div>
                    <div style="color: #6B7280; font-size: 12px; margin-top: 3px;">Top catégorie</div>
                  </td>
                </tr>
              </table>
              {overdue_banner}
            </td>
          </tr>
          <tr>
            <td style="padding: 0 30px 30px;">
              <h3 style="color: #2D3142; margin: 0 0 15px;">✅ Tâches complétées cette semaine</h3>
              <table width="100%" cellpadding="0" cellspacing="0" style="border: 1px solid #E5E7EB; border-radius: 8px; overflow: hidden;">
                {completed_rows}
              </table>
            </td>
          </tr>
          <tr>
            <td style="padding: 0 30px 30px;">
              <h3 style="color: #2D3142; margin: 0 0 15px;">📋 Tâches restantes</h3>
              <table width="100%" cellpadding="0" cellspacing="0" style="border: 1px solid #E5E7EB; border-radius: 8px; overflow: hidden;">
                {remaining_rows}
              </table>
              {overflow_line}
            </td>
          </tr>
          <tr>
            <td style="padding: 30px; text-align: center; background-color: #F9FAFB; border-radius: 0 0 12px 12px;">
              <p style="margin: 0; color: #6B7280; font-size: 14px;">
                Continuez comme ça ! 💪<br>
                <strong style="color: #FF6B35;">Relance</strong> - Ne plus jamais oublier vos tâches
              </p>
            </td>
          </tr>
        </table>
      </td>
    </tr>
  </table>
</body>
</html>"#,
        completed = stats.completed_count,
        remaining_count = stats.remaining_count,
        rate = stats.completion_rate,
        delay = stats.average_delay_days,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use relance_core::compute_weekly_stats;
    use relance_core::task::Category;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn renders_stats_and_test_header() {
        let now = at(2026, 6, 20, 12, 0);
        let mut done = Task::new("t1", "ranger le garage", at(2026, 6, 18, 9, 0))
            .with_categories(vec![Category::Maison]);
        done.complete(now - Duration::hours(2));
        let open = Task::new("t2", "faire les courses", at(2026, 6, 19, 9, 0));

        let tasks = vec![done, open];
        let stats = compute_weekly_stats(&tasks, now);
        let html = render_weekly_email(&stats, &tasks, now, true);

        assert!(html.contains("📧 Email de Test"));
        assert!(html.contains("ranger le garage"));
        assert!(html.contains("faire les courses"));
        assert!(html.contains("Bravo ! 1 tâche complétée"));
        assert!(!html.contains("en retard"));
    }

    #[test]
    fn overdue_banner_and_overflow_line() {
        let now = at(2026, 6, 20, 12, 0);
        let mut tasks: Vec<Task> = (0..12)
            .map(|i| Task::new(format!("t{i}"), format!("tâche {i}"), at(2026, 6, 1, 9, 0)))
            .collect();
        tasks[0].due_date = Some(at(2026, 6, 10, 9, 0));

        let stats = compute_weekly_stats(&tasks, now);
        let html = render_weekly_email(&stats, &tasks, now, false);

        assert!(html.contains("📊 Votre Bilan Hebdomadaire"));
        assert!(html.contains("1 tâche en retard"));
        assert!(html.contains("... et 2 autres tâches"));
        assert!(html.contains("Pas de date"));
    }
}
