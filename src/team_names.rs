use chrono::{DateTime, Datelike, Utc};
use lazy_static::lazy_static;
use std::collections::HashMap;

const NAMES_AND_INITIALS: [(&str, &str); 26] = [
    ("ARS", "Arsenal"),
    ("AVL", "Aston Villa"),
    ("BHA", "Brighton and Hove Albion"),
    ("BUR", "Burnley"),
    ("BRE", "Brentford"),
    ("BOU", "Bournemouth"),
    ("CHE", "Chelsea"),
    ("CRY", "Crystal Palace"),
    ("EVE", "Everton"),
    ("FUL", "Fulham"),
    ("LEE", "Leeds United"),
    ("LEI", "Leicester City"),
    ("LIV", "Liverpool"),
    ("LUT", "Luton Town"),
    ("MCI", "Manchester City"),
    ("MUN", "Manchester United"),
    ("NOR", "Norwich City"),
    ("NEW", "Newcastle United"),
    ("SHU", "Sheffield United"),
    ("SOU", "Southampton"),
    ("TOT", "Tottenham Hotspur"),
    ("WAT", "Watford"),
    ("WBA", "West Bromwich Albion"),
    ("WHU", "West Ham United"),
    ("WOL", "Wolverhampton Wanderers"),
    ("NOT", "Nottingham Forest"),
];

lazy_static! {
    static ref BY_NAME: HashMap<&'static str, &'static str> = NAMES_AND_INITIALS.iter()
        .map(|(initials, name)| (*name, *initials))
        .collect();
    static ref BY_INITIALS: HashMap<&'static str, &'static str> = NAMES_AND_INITIALS.iter()
        .map(|(initials, name)| (*initials, *name))
        .collect();
}

/// Unknown clubs get the first three letters of their name.
pub fn to_initials(team_name: &str) -> String {
    match BY_NAME.get(team_name) {
        Some(initials) => initials.to_string(),
        None => team_name.chars().take(3).collect::<String>().to_uppercase(),
    }
}

pub fn to_name(initials: &str) -> Option<&'static str> {
    BY_INITIALS.get(initials).copied()
}

/// "Brighton & Hove Albion FC" -> "Brighton and Hove Albion"
pub fn clean(full_team_name: &str) -> String {
    full_team_name
        .replace(" FC", "")
        .replace("AFC ", "")
        .replace('&', "and")
        .trim()
        .to_string()
}

pub fn slug(team_name: &str) -> String {
    team_name
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join("-")
}

pub fn from_slug<'a>(team_slug: &str, team_names: &'a [String]) -> Option<&'a String> {
    team_names.iter().find(|e| slug(e) == team_slug)
}

pub fn ordinal(n: usize) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

/// "5th March 2022"
pub fn readable_date(date: &DateTime<Utc>) -> String {
    format!("{} {}", ordinal(date.day() as usize), date.format("%B %Y"))
}

/// Scoreline from the perspective of `team_name`, always written home first.
pub fn scoreline(team_name: &str, opp_team_name: &str, scored: u8, conceded: u8, at_home: bool) -> String {
    let team = to_initials(team_name);
    let opp = to_initials(opp_team_name);
    if at_home {
        format!("{team} {scored} - {conceded} {opp}")
    } else {
        format!("{opp} {conceded} - {scored} {team}")
    }
}

/// "LIV 2 - 1 EVE" -> ("LIV", 2, 1, "EVE")
pub fn parse_scoreline(scoreline: &str) -> Option<(String, u8, u8, String)> {
    let parts: Vec<&str> = scoreline.split(' ').collect();
    match parts.as_slice() {
        [home, home_goals, "-", away_goals, away] => Some((
            home.to_string(),
            home_goals.parse().ok()?,
            away_goals.parse().ok()?,
            away.to_string(),
        )),
        _ => None,
    }
}

/// True when both scorelines are a draw, both a home win or both an away win.
pub fn identical_result<T: PartialOrd>(pred_home: T, pred_away: T, act_home: T, act_away: T) -> bool {
    (pred_home == pred_away && act_home == act_away)
        || (pred_home > pred_away && act_home > act_away)
        || (pred_home < pred_away && act_home < act_away)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn test_initials_both_ways() {
        assert_eq!(to_initials("Liverpool"), "LIV");
        assert_eq!(to_initials("Brighton and Hove Albion"), "BHA");
        assert_eq!(to_initials("Ipswich Town"), "IPS");
        assert_eq!(to_name("MUN"), Some("Manchester United"));
        assert_eq!(to_name("XYZ"), None);
    }

    #[test]
    fn test_clean_and_slug() {
        assert_eq!(clean("Brighton & Hove Albion FC"), "Brighton and Hove Albion");
        assert_eq!(clean("AFC Bournemouth"), "Bournemouth");
        assert_eq!(slug("West Ham United"), "west-ham-united");

        let names = vec!["Liverpool".to_string(), "West Ham United".to_string()];
        assert_eq!(from_slug("west-ham-united", &names), Some(&names[1]));
        assert_eq!(from_slug("chelsea", &names), None);
    }

    #[test]
    fn test_ordinal() {
        let ordinals: Vec<String> = [1, 2, 3, 4, 11, 12, 13, 21, 22, 101, 111].into_iter().map(ordinal).collect();
        assert_eq!(ordinals, vec!["1st", "2nd", "3rd", "4th", "11th", "12th", "13th", "21st", "22nd", "101st", "111th"]);
    }

    #[test]
    fn test_readable_date() {
        let date = Utc.with_ymd_and_hms(2022, 3, 5, 15, 0, 0).unwrap();
        assert_eq!(readable_date(&date), "5th March 2022");
    }

    #[test]
    fn test_scoreline() {
        assert_eq!(scoreline("Liverpool", "Everton", 2, 1, true), "LIV 2 - 1 EVE");
        assert_eq!(scoreline("Liverpool", "Everton", 2, 1, false), "EVE 1 - 2 LIV");
        assert_eq!(parse_scoreline("EVE 1 - 2 LIV"), Some(("EVE".to_string(), 1, 2, "LIV".to_string())));
        assert_eq!(parse_scoreline("EVE 1-2 LIV"), None);
    }

    #[test]
    fn test_identical_result() {
        assert!(identical_result(1, 1, 0, 0));
        assert!(identical_result(2, 0, 3, 1));
        assert!(identical_result(0.4, 1.2, 0.0, 2.0));
        assert!(!identical_result(2, 1, 1, 1));
    }
}
