//! Club name resolution.

/// Common short names and their full football-data.org names.
const TEAM_NAMES: [(&str, &str); 20] = [
    ("Liverpool", "Liverpool FC"),
    ("Manchester United", "Manchester United FC"),
    ("Manchester City", "Manchester City FC"),
    ("Chelsea", "Chelsea FC"),
    ("Arsenal", "Arsenal FC"),
    ("Tottenham", "Tottenham Hotspur FC"),
    ("Newcastle", "Newcastle United FC"),
    ("West Ham", "West Ham United FC"),
    ("Brighton", "Brighton & Hove Albion FC"),
    ("Aston Villa", "Aston Villa FC"),
    ("Wolves", "Wolverhampton Wanderers FC"),
    ("Bournemouth", "AFC Bournemouth"),
    ("Crystal Palace", "Crystal Palace FC"),
    ("Brentford", "Brentford FC"),
    ("Everton", "Everton FC"),
    ("Fulham", "Fulham FC"),
    ("Southampton", "Southampton FC"),
    ("Leicester", "Leicester City FC"),
    ("Nottingham", "Nottingham Forest FC"),
    ("Ipswich", "Ipswich Town FC"),
];

/// Maps a common club name to its full name. Unknown names pass through
/// trimmed.
pub fn full_team_name(name: &str) -> String {
    let name = name.trim();
    TEAM_NAMES
        .iter()
        .find(|(short, _)| short.eq_ignore_ascii_case(name))
        .map(|(_, full)| (*full).to_string())
        .unwrap_or_else(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_names() {
        assert_eq!(full_team_name("Tottenham"), "Tottenham Hotspur FC");
        assert_eq!(full_team_name("wolves"), "Wolverhampton Wanderers FC");
        assert_eq!(full_team_name(" Arsenal "), "Arsenal FC");
    }

    #[test]
    fn test_unknown_passes_through() {
        assert_eq!(full_team_name("Leeds United FC"), "Leeds United FC");
    }
}
