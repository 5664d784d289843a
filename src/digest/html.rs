use chrono::NaiveDate;

use crate::models::{Insight, Role, Urgency};

const URGENCY_ORDER: [Urgency; 3] = [Urgency::High, Urgency::Medium, Urgency::Low];

pub fn digest_file_name(role: Role, date: NaiveDate) -> String {
    format!("digest-{}-{}.html", role, date.format("%Y-%m-%d"))
}

/// Self-contained HTML digest for one role, grouped high to low urgency.
pub fn render_digest(role: Role, date: NaiveDate, insights: &[Insight]) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!(
        "<title>Pricing intelligence for {} - {}</title>\n",
        role,
        date.format("%Y-%m-%d")
    ));
    html.push_str(STYLE);
    html.push_str("</head>\n<body>\n");
    html.push_str(&format!(
        "<h1>Pricing intelligence: {} digest</h1>\n\
         <p class=\"meta\">{} &middot; {} item(s) &middot; focus: {}</p>\n",
        role,
        date.format("%B %-d, %Y"),
        insights.len(),
        escape_html(role.focus())
    ));

    if insights.is_empty() {
        html.push_str("<p>No relevant pricing news today.</p>\n");
    }

    for urgency in URGENCY_ORDER {
        let mut group: Vec<&Insight> = insights.iter().filter(|i| i.urgency == urgency).collect();
        if group.is_empty() {
            continue;
        }
        group.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));

        html.push_str(&format!(
            "<section class=\"urgency-{0}\">\n<h2>{1} urgency ({2})</h2>\n",
            urgency,
            capitalize(&urgency.to_string()),
            group.len()
        ));
        for insight in group {
            render_insight(&mut html, role, insight);
        }
        html.push_str("</section>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn render_insight(html: &mut String, role: Role, insight: &Insight) {
    html.push_str("<article>\n");
    html.push_str(&format!(
        "<h3><a href=\"{}\">{}</a></h3>\n",
        escape_html(&insight.url),
        escape_html(&insight.title)
    ));

    html.push_str("<p class=\"badges\">");
    if let Some(vendor) = &insight.vendor {
        html.push_str(&format!("<span class=\"badge vendor\">{}</span> ", escape_html(vendor)));
    }
    html.push_str(&format!(
        "<span class=\"badge score\">score {:.1}</span> \
         <span class=\"badge source\">{}</span></p>\n",
        insight.relevance_score,
        escape_html(&insight.source)
    ));

    if let Some(summary) = insight.summary_for(role) {
        html.push_str(&format!("<p>{}</p>\n", escape_html(summary)));
    }
    if !insight.key_points.is_empty() {
        html.push_str("<ul>\n");
        for point in &insight.key_points {
            html.push_str(&format!("<li>{}</li>\n", escape_html(point)));
        }
        html.push_str("</ul>\n");
    }
    html.push_str("</article>\n");
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

const STYLE: &str = r#"<style>
body {
  font-family: -apple-system, Segoe UI, Helvetica, Arial, sans-serif;
  max-width: 760px;
  margin: 2em auto;
  color: #222;
}
h1 { font-size: 1.5em; }
.meta { color: #666; }
section { margin-top: 1.5em; }
.urgency-high h2 { color: #b3261e; }
.urgency-medium h2 { color: #a15c00; }
.urgency-low h2 { color: #3b6e3b; }
article { border-left: 3px solid #ddd; padding-left: 1em; margin-bottom: 1em; }
.badge {
  display: inline-block;
  font-size: 0.8em;
  padding: 0 0.5em;
  border-radius: 3px;
  background: #eee;
}
.vendor { background: #e3ecfa; }
</style>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn insight(title: &str, urgency: Urgency, score: f64) -> Insight {
        let mut summaries = BTreeMap::new();
        summaries.insert(Role::Executive, "exec <summary>".to_string());
        summaries.insert(Role::Sales, "sales summary".to_string());
        Insight {
            title: title.to_string(),
            url: "https://example.com/?a=1&b=2".into(),
            source: "reddit/r/msp".into(),
            vendor: Some("vmware".into()),
            urgency,
            relevance_score: score,
            summaries,
            key_points: vec!["point".into()],
            created_at: Utc::now(),
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
    }

    #[test]
    fn test_file_name_format() {
        assert_eq!(
            digest_file_name(Role::Procurement, date()),
            "digest-procurement-2024-03-05.html"
        );
    }

    #[test]
    fn test_groups_high_before_low_and_escapes() {
        let insights = vec![
            insight("Low <one>", Urgency::Low, 2.0),
            insight("High one", Urgency::High, 8.0),
        ];
        let html = render_digest(Role::Technical, date(), &insights);

        let high = html.find("High urgency").unwrap();
        let low = html.find("Low urgency").unwrap();
        assert!(high < low);
        assert!(!html.contains("Medium urgency"));
        assert!(html.contains("Low &lt;one&gt;"));
        assert!(html.contains("exec &lt;summary&gt;"));
        assert!(html.contains("a=1&amp;b=2"));
    }

    #[test]
    fn test_role_summary_preferred() {
        let html = render_digest(Role::Sales, date(), &[insight("t", Urgency::Medium, 5.0)]);
        assert!(html.contains("sales summary"));
        assert!(!html.contains("exec &lt;summary&gt;"));
    }

    #[test]
    fn test_empty_digest_says_so() {
        let html = render_digest(Role::Executive, date(), &[]);
        assert!(html.contains("No relevant pricing news today."));
    }
}
