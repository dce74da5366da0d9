//! Clubs inserted on first boot.

pub const DEFAULT_CLUBS: &[(&str, &str)] = &[
    ("NEET Club", "A gathering of NEETs"),
    ("Free Time Club", "For people with time to kill"),
    ("Venting Club", "Let out your everyday complaints"),
    ("Fujoshi Club", "By fujoshi, for fujoshi"),
    ("Debate Club", "For those who like a heated argument"),
    ("Romance Club", "Let's talk about love"),
    ("Study Club", "Let's study together"),
    ("Comedy Club", "Come here if you want to laugh"),
    ("Nanj", "Live commentary on anything"),
    ("VIP", "Hangout for VIPPERs"),
];
