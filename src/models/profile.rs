use serde::{Deserialize, Serialize};

use crate::service::lookup::PlayerProfile;

pub const PROFILE_NOT_LINKED_NOTICE: &str =
    "You don't have Discord linked in your BeatLeader, link it [here](https://beatleader.com/signin/socials).";

/// What the host renders for "show me my account".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProfileCard {
    Linked {
        /// `name (#rank)`
        title: String,
        url: String,
        avatar: Option<String>,
        /// Flag emoji followed by "Rank", e.g. "🇺🇸 Rank".
        country_label: String,
        country_rank: String,
        /// Two decimal places.
        pp: String,
        clan: Option<String>,
    },
    Unlinked {
        notice: String,
    },
}

impl ProfileCard {
    pub fn from_lookup(profile: Option<PlayerProfile>) -> Self {
        let Some(profile) = profile else {
            return ProfileCard::Unlinked {
                notice: PROFILE_NOT_LINKED_NOTICE.to_string(),
            };
        };

        let rank = profile
            .rank
            .map(|r| r.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        let flag = profile.country.as_deref().map(country_flag).unwrap_or_default();
        ProfileCard::Linked {
            title: format!("{} (#{rank})", profile.name),
            url: format!("https://beatleader.xyz/u/{}", profile.id),
            avatar: profile.avatar,
            country_label: format!("{flag} Rank").trim_start().to_string(),
            country_rank: format!("#{}", profile.country_rank.unwrap_or(0)),
            pp: format!("{:.2}", profile.pp),
            clan: profile.clans.into_iter().next().map(|clan| clan.tag),
        }
    }
}

/// Two-letter country code to its regional-indicator flag.
fn country_flag(code: &str) -> String {
    code.chars()
        .filter(|c| c.is_ascii_alphabetic())
        .filter_map(|c| char::from_u32(c.to_ascii_uppercase() as u32 + 127_397))
        .collect()
}
