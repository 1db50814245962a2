//! Message and name formatting for show channels. Everything here is pure.

use crate::models::{MAX_CHANNEL_NAME_LEN, ShowSnapshot, truncate_slug};
use chrono::{DateTime, Utc};
use lionhub_protocol::{Block, TextObject};

const TBD: &str = "TBD";
const ARCHIVE_PREFIX: &str = "arch-";

/// Blocks plus the plain-text fallback shown in notifications
#[derive(Debug, Clone, PartialEq)]
pub struct Briefing {
    pub blocks: Vec<Block>,
    pub text: String,
}

pub fn briefing(show: &ShowSnapshot) -> Briefing {
    let date = show.formatted_date();
    let time = show.formatted_time();
    let point = show
        .point
        .as_ref()
        .map(|point| point.mention_or_name())
        .unwrap_or_else(|| TBD.to_string());
    let lions = show
        .lion_count()
        .map(|n| n.to_string())
        .unwrap_or_else(|| TBD.to_string());

    let blocks = vec![
        Block::section(TextObject::mrkdwn(format!(
            "Hi everyone! Thank you for signing up to perform at {}. \
             Below is a quick rundown of important information about the show. \
             Please read carefully.",
            show.name
        ))),
        Block::header(":lion_face:  Show Info"),
        Block::fields(vec![
            TextObject::mrkdwn(format!("*Date:* {}", date.as_deref().unwrap_or(TBD))),
            TextObject::mrkdwn(format!("*Time:* {}", time.as_deref().unwrap_or(TBD))),
            TextObject::mrkdwn(format!("*Point Person:* {}", point)),
            TextObject::mrkdwn(format!("*Lions:* {}", lions)),
            TextObject::mrkdwn(format!("*Venue:* {}", show.venue().unwrap_or(TBD))),
        ]),
        Block::section(TextObject::mrkdwn(
            "<!channel> Please react :thumbsup: to this message to confirm that you can make it.",
        )),
    ];

    Briefing {
        blocks,
        text: format!("New show on {}", date.as_deref().unwrap_or(TBD)),
    }
}

/// `a`, `a and b`, `a, b and c`
pub fn join_fields<S: AsRef<str>>(fields: &[S]) -> String {
    match fields {
        [] => String::new(),
        [only] => only.as_ref().to_string(),
        [rest @ .., last] => {
            let rest: Vec<&str> = rest.iter().map(|f| f.as_ref()).collect();
            format!("{} and {}", rest.join(", "), last.as_ref())
        }
    }
}

pub fn update_notice<S: AsRef<str>>(fields: &[S]) -> String {
    let verb = if fields.len() == 1 { "has" } else { "have" };
    format!(
        "<!channel> The {} {} been updated.",
        join_fields(fields),
        verb
    )
}

/// Name that frees the canonical one for a future channel of the same show.
///
/// Archived channels cannot be brought back by the bot, so the token keeps a
/// recreated channel from colliding with the archived one.
pub fn archived_channel_name(base: &str, now: DateTime<Utc>) -> String {
    let token = format!("{}-{:06}", now.timestamp(), now.timestamp_subsec_micros());
    let mut base = base.to_string();
    truncate_slug(
        &mut base,
        MAX_CHANNEL_NAME_LEN - ARCHIVE_PREFIX.len() - token.len() - 1,
    );
    format!("{}{}-{}", ARCHIVE_PREFIX, base, token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MemberRef, SlackUser};
    use chrono::{NaiveDate, NaiveTime, TimeZone};
    use uuid::Uuid;

    fn show() -> ShowSnapshot {
        ShowSnapshot {
            id: Uuid::new_v4(),
            name: "Fall Show".to_string(),
            date: None,
            time: None,
            point: None,
            lions: None,
            address: None,
            notes: None,
            performers: vec![],
        }
    }

    fn field_texts(briefing: &Briefing) -> Vec<String> {
        briefing
            .blocks
            .iter()
            .find_map(|block| match block {
                Block::Section {
                    fields: Some(fields),
                    ..
                } => Some(fields.iter().map(|f| f.text().to_string()).collect()),
                _ => None,
            })
            .unwrap_or_default()
    }

    #[test]
    fn field_lists() {
        assert_eq!(join_fields(&["date"]), "date");
        assert_eq!(join_fields(&["date", "time"]), "date and time");
        assert_eq!(join_fields(&["date", "time", "venue"]), "date, time and venue");
    }

    #[test]
    fn update_notice_agrees_with_count() {
        assert!(update_notice(&["date"]).ends_with("The date has been updated."));
        assert!(update_notice(&["date", "time"]).ends_with("The date and time have been updated."));
        assert!(
            update_notice(&["date", "time", "venue"])
                .ends_with("The date, time and venue have been updated.")
        );
        assert!(update_notice(&["lions"]).starts_with("<!channel> "));
    }

    #[test]
    fn empty_show_renders_tbd() {
        let briefing = briefing(&show());
        assert_eq!(
            field_texts(&briefing),
            vec![
                "*Date:* TBD",
                "*Time:* TBD",
                "*Point Person:* TBD",
                "*Lions:* TBD",
                "*Venue:* TBD",
            ]
        );
        assert_eq!(briefing.text, "New show on TBD");
        assert_eq!(briefing.blocks.len(), 4);
    }

    #[test]
    fn filled_show_renders_values() {
        let mut show = show();
        show.date = NaiveDate::from_ymd_opt(2024, 10, 5);
        show.time = NaiveTime::from_hms_opt(18, 0, 0);
        show.lions = Some(2);
        show.address = Some("Low Library".into());
        show.point = Some(MemberRef {
            member_id: Uuid::new_v4(),
            display_name: "Mei Chen".into(),
            slack_user: Some(SlackUser {
                id: "U0POINT".into(),
                member_id: Uuid::new_v4(),
            }),
        });

        let briefing = briefing(&show);
        let fields = field_texts(&briefing);
        assert_eq!(fields[0], "*Date:* Saturday, October 5, 2024");
        assert_eq!(fields[1], "*Time:* 6:00 PM");
        assert_eq!(fields[2], "*Point Person:* <@U0POINT>");
        assert_eq!(fields[3], "*Lions:* 2");
        assert_eq!(fields[4], "*Venue:* Low Library");
        assert_eq!(briefing.text, "New show on Saturday, October 5, 2024");
    }

    #[test]
    fn unlinked_point_person_renders_name() {
        let mut show = show();
        show.point = Some(MemberRef {
            member_id: Uuid::new_v4(),
            display_name: "Mei Chen".into(),
            slack_user: None,
        });
        assert_eq!(field_texts(&briefing(&show))[2], "*Point Person:* Mei Chen");
    }

    #[test]
    fn archived_name_embeds_timestamp() {
        let now = Utc.timestamp_opt(1_700_000_000, 123_456_000).unwrap();
        assert_eq!(
            archived_channel_name("fall-show", now),
            "arch-fall-show-1700000000-123456"
        );

        let long = "x".repeat(MAX_CHANNEL_NAME_LEN);
        let name = archived_channel_name(&long, now);
        assert_eq!(name.len(), MAX_CHANNEL_NAME_LEN);
        assert!(name.ends_with("-1700000000-123456"));
    }
}
