use std::fmt::Write;

use html_escaper::Escape;

use crate::{
    data_service::{DashboardData, TeamSummary},
    predictions_service::PredictionRecord,
    route_rank::Route,
    season_stats_service::RankedStat,
    standing_service::StandingRow,
    team_names,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Home,
    Predictions,
    Team,
}

pub fn routes() -> Vec<Route<Page>> {
    vec![
        Route::new("/", Page::Home),
        Route::new("/home", Page::Home),
        Route::new("/predictions", Page::Predictions),
        Route::new("/:team", Page::Team),
    ]
}

pub fn escape(s: &str) -> String {
    struct Escaped<'a>(&'a str);
    impl std::fmt::Display for Escaped<'_> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            self.0.escape(f, false)
        }
    }
    Escaped(s).to_string()
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{}</body>\n</html>\n",
        escape(title),
        body,
    )
}

fn standings_table(rows: &[StandingRow], highlight: Option<&str>) -> String {
    let mut html = String::from("<table class=\"standings\">\n<tr><th>#</th><th>Team</th><th>P</th><th>W</th><th>D</th><th>L</th><th>GF</th><th>GA</th><th>GD</th><th>Pts</th></tr>\n");
    for row in rows {
        let class = if Some(row.team.as_str()) == highlight { " class=\"this-team\"" } else { "" };
        _ = writeln!(html,
            "<tr{class}><td>{}</td><td><a href=\"/{}\">{}</a></td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            row.position, escape(&team_names::slug(&row.team)), escape(&row.team),
            row.played, row.won, row.drawn, row.lost, row.gf, row.ga, row.gd, row.points);
    }
    html.push_str("</table>\n");
    html
}

pub fn home(data: &DashboardData) -> String {
    let mut body = format!("<h1>Premier League {}</h1>\n<ul class=\"teams\">\n", data.current_season);
    for team in &data.team_names {
        _ = writeln!(body, "<li><a href=\"/{}\">{}</a></li>", escape(&team_names::slug(team)), escape(team));
    }
    body.push_str("</ul>\n");
    body.push_str(&standings_table(data.standings.current_table(), None));
    _ = writeln!(body, "<p class=\"last-updated\">Last updated {}</p>", data.last_updated.format("%Y-%m-%d %H:%M"));
    layout("Premier League Dashboard", &body)
}

fn stat_line(label: &str, stat: &Option<RankedStat>) -> String {
    match stat {
        Some(s) => format!("<li>{label}: {} ({})</li>\n", s.value, escape(&s.rank)),
        None => format!("<li>{label}: -</li>\n"),
    }
}

fn form_badges(summary: &TeamSummary) -> String {
    let n_none = summary.form.form.iter().filter(|e| e.as_str() == "None").count();
    let mut html = String::from("<div class=\"form\">");
    for (i, result) in summary.form.form.iter().enumerate() {
        let star = i.checked_sub(n_none)
            .and_then(|idx| summary.form.won_against_star_team.get(idx))
            .cloned()
            .unwrap_or(false);
        let class = if star { "form-badge star-team" } else { "form-badge" };
        let opponent = i.checked_sub(n_none)
            .and_then(|idx| summary.form.teams_played.get(idx))
            .map(|e| escape(e))
            .unwrap_or_default();
        _ = write!(html, "<span class=\"{class} result-{}\" title=\"{opponent}\">{}</span>", escape(result), escape(result));
    }
    html.push_str("</div>\n");
    html
}

pub fn team(data: &DashboardData, team: &str) -> Option<String> {
    let summary = data.team_summary(team)?;
    let mut body = format!("<h1>{}</h1>\n", escape(&summary.team));
    if let Some(logo) = &summary.logo_url {
        _ = writeln!(body, "<img class=\"logo\" src=\"{}\" alt=\"{}\">", escape(logo), escape(&summary.initials));
    }
    if let Some(position) = summary.position {
        _ = writeln!(body, "<p class=\"position\">{}</p>", team_names::ordinal(position as usize));
    }

    body.push_str(&form_badges(&summary));
    _ = writeln!(body, "<p class=\"form-rating\">Form rating {}%</p>", summary.form.rating);
    _ = writeln!(body, "<p class=\"form-rating-long-term\">Long term form rating {}%</p>", summary.form.rating_long_term);

    if let Some(snippet) = &summary.table_snippet {
        body.push_str(&standings_table(&snippet.rows, Some(&summary.team)));
    }

    body.push_str("<ul class=\"season-stats\">\n");
    body.push_str(&stat_line("Clean sheet ratio", &summary.clean_sheet_ratio));
    body.push_str(&stat_line("Goals per game", &summary.goals_per_game));
    body.push_str(&stat_line("Conceded per game", &summary.conceded_per_game));
    body.push_str("</ul>\n");

    match &summary.next_game {
        Some(next) => {
            _ = writeln!(body, "<h2>Next game</h2>\n<p class=\"next-game\">{} ({}) {}</p>",
                escape(&next.opponent),
                if next.at_home { "Home" } else { "Away" },
                escape(&team_names::readable_date(&next.date)));
            if let Some(prediction) = &summary.prediction {
                _ = writeln!(body, "<p class=\"prediction\">Predicted {}</p>", escape(&prediction.scoreline()));
            }
            body.push_str("<ul class=\"prev-matches\">\n");
            for prev in &next.prev_matches {
                _ = writeln!(body, "<li class=\"result-{}\">{} {} {} - {} {}</li>",
                    escape(&prev.result),
                    escape(&prev.readable_date),
                    escape(&team_names::to_initials(&prev.home_team)),
                    prev.home_goals,
                    prev.away_goals,
                    escape(&team_names::to_initials(&prev.away_team)));
            }
            body.push_str("</ul>\n");
        },
        None => body.push_str("<p class=\"next-game\">Season complete</p>\n"),
    }

    Some(layout(&summary.team, &body))
}

fn prediction_row(record: &PredictionRecord) -> String {
    let actual = record.actual.map(|e| e.to_string()).unwrap_or_else(|| "-".to_string());
    format!("<tr><td>{}</td><td>{} {} {}</td><td>{}</td></tr>\n",
        escape(&record.time),
        escape(&record.home_initials),
        record.prediction,
        escape(&record.away_initials),
        actual)
}

pub fn predictions(data: &DashboardData) -> String {
    let accuracy = &data.predictions.accuracy;
    let mut body = String::from("<h1>Predictions</h1>\n");
    _ = writeln!(body, "<p class=\"accuracy\">Score accuracy {:.2}%</p>", accuracy.accuracy * 100.0);
    _ = writeln!(body, "<p class=\"result-accuracy\">Result accuracy {:.2}%</p>", accuracy.result_accuracy * 100.0);
    for (date, records) in data.predictions.book.predictions.iter().rev() {
        _ = writeln!(body, "<h2>{}</h2>\n<table class=\"predictions\">", escape(date));
        for record in records {
            body.push_str(&prediction_row(record));
        }
        body.push_str("</table>\n");
    }
    layout("Predictions", &body)
}

pub fn loading() -> String {
    layout("Loading", "<p class=\"loading\">Data is loading, try again shortly.</p>\n")
}

pub fn not_found(path: &str) -> String {
    layout("Not found", &format!("<h1>Not found</h1>\n<p>{} does not exist.</p>\n", escape(path)))
}

#[cfg(test)]
mod tests {
    use crate::data_service::test_data::small_dashboard;
    use crate::route_rank::pick;

    use super::{escape, routes, Page};

    #[test]
    fn test_escape() {
        assert_eq!(escape("<b>\"Brighton & Hove\""), "&lt;b&gt;&quot;Brighton &amp; Hove&quot;");
        assert_eq!(escape("Arsenal"), "Arsenal");
    }

    #[test]
    fn test_page_routes() {
        let routes = routes();
        assert_eq!(pick(&routes, "/").unwrap().unwrap().route.value, Page::Home);
        assert_eq!(pick(&routes, "/home").unwrap().unwrap().route.value, Page::Home);
        assert_eq!(pick(&routes, "/predictions").unwrap().unwrap().route.value, Page::Predictions);
        let m = pick(&routes, "/manchester-city").unwrap().unwrap();
        assert_eq!(m.route.value, Page::Team);
        assert_eq!(m.params.get("team"), Some(&"manchester-city".to_string()));
    }

    #[test]
    fn test_home_page() {
        let html = super::home(&small_dashboard());
        assert!(html.contains("<a href=\"/liverpool\">Liverpool</a>"));
        assert!(html.contains("Premier League 2021"));
        assert!(html.find("Arsenal</a></td>").unwrap() < html.find("Everton</a></td>").unwrap());
    }

    #[test]
    fn test_team_page() {
        let data = small_dashboard();

        let html = super::team(&data, "Arsenal").unwrap();

        assert!(html.contains("<title>Arsenal</title>"));
        assert!(html.contains("<p class=\"position\">1st</p>"));
        assert!(html.contains("Form rating 100%"));
        assert!(html.contains("Long term form rating 100%"));
        assert!(html.contains("form-badge star-team result-W"));
        assert!(html.contains("class=\"this-team\""));
        assert!(html.contains("Chelsea (Away)"));
        assert!(html.contains("14th August 2021 ARS 2 - 0 CHE"));
        assert!(super::team(&data, "Nobody").is_none());
    }

    #[test]
    fn test_other_pages() {
        let html = super::predictions(&small_dashboard());
        assert!(html.contains("Score accuracy 0.00%"));
        assert!(super::loading().contains("loading"));
        let html = super::not_found("<x>");
        assert!(html.contains("&lt;x&gt; does not exist."));
        assert!(!html.contains("<x>"));
    }
}
