/// Shown for teams without an entry.
pub const UNKNOWN_FLAG: &str = "🏴";

const COUNTRY_FLAGS: &[(&str, &str)] = &[
    ("Albania", "🇦🇱"),
    ("Austria", "🇦🇹"),
    ("Belgium", "🇧🇪"),
    ("Croatia", "🇭🇷"),
    ("Czech Republic", "🇨🇿"),
    ("Denmark", "🇩🇰"),
    ("England", "🏴\u{e0067}\u{e0062}\u{e0065}\u{e006e}\u{e0067}\u{e007f}"),
    ("France", "🇫🇷"),
    ("Georgia", "🇬🇪"),
    ("Germany", "🇩🇪"),
    ("Hungary", "🇭🇺"),
    ("Italy", "🇮🇹"),
    ("Netherlands", "🇳🇱"),
    ("Poland", "🇵🇱"),
    ("Portugal", "🇵🇹"),
    ("Romania", "🇷🇴"),
    ("Scotland", "🏴\u{e0067}\u{e0062}\u{e0073}\u{e0063}\u{e0074}\u{e007f}"),
    ("Serbia", "🇷🇸"),
    ("Slovakia", "🇸🇰"),
    ("Slovenia", "🇸🇮"),
    ("Spain", "🇪🇸"),
    ("Switzerland", "🇨🇭"),
    ("Turkey", "🇹🇷"),
    ("Ukraine", "🇺🇦"),
];

pub fn country_flag(team: &str) -> &'static str {
    let team = team.trim();
    COUNTRY_FLAGS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(team))
        .map(|(_, flag)| *flag)
        .unwrap_or(UNKNOWN_FLAG)
}

/// `"🇩🇪 v 🏴"` style heading for a result card.
pub fn fixture_label(home: &str, away: &str) -> String {
    format!("{} v {}", country_flag(home), country_flag(away))
}
