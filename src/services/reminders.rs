// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Renewal reminder selection and email rendering.

use chrono::NaiveDate;

use crate::models::Subscription;
use crate::services::email::escape_html;

/// Active subscriptions renewing between `today` and `today + days`
/// (inclusive), soonest first.
pub fn due_for_reminder(
    subscriptions: &[Subscription],
    today: NaiveDate,
    days: i64,
) -> Vec<&Subscription> {
    let horizon = today + chrono::Duration::days(days.max(0));
    let mut due: Vec<&Subscription> = subscriptions
        .iter()
        .filter(|s| s.is_active() && s.next_billing >= today && s.next_billing <= horizon)
        .collect();
    due.sort_by_key(|s| s.next_billing);
    due
}

/// Subject and HTML body for a reminder digest.
pub fn render_reminder_email(due: &[&Subscription], today: NaiveDate) -> (String, String) {
    let subject = match due {
        [single] => format!("{} renews soon", single.name),
        _ => format!("{} subscriptions renew soon", due.len()),
    };

    let rows: String = due
        .iter()
        .map(|s| {
            let days = (s.next_billing - today).num_days();
            let when = match days {
                0 => "today".to_string(),
                1 => "tomorrow".to_string(),
                n => format!("in {} days", n),
            };
            format!(
                "<tr><td>{}</td><td>{:.2} {}</td><td>{} ({})</td></tr>",
                escape_html(&s.name),
                s.cost,
                escape_html(&s.currency),
                s.next_billing.format("%b %-d, %Y"),
                when
            )
        })
        .collect();

    let html = format!(
        "<h2>Upcoming renewals</h2>\
         <table><tr><th>Service</th><th>Cost</th><th>Renews</th></tr>{}</table>\
         <p>Pause or cancel anything you no longer use from your SubTrack dashboard.</p>",
        rows
    );

    (subject, html)
}
