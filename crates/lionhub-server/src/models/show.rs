use crate::models::SlackUser;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Longest channel name the platform accepts
pub const MAX_CHANNEL_NAME_LEN: usize = 80;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Show {
    pub id: Uuid,
    pub name: String,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub point_id: Option<Uuid>,
    pub lions: Option<i32>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A performer sign-up
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub show_id: Uuid,
    pub performer_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateShow {
    pub name: String,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub point_id: Option<Uuid>,
    pub lions: Option<i32>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

/// Partial show update. A missing key leaves the field alone, an explicit
/// `null` clears it.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateShow {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub time: Option<Option<NaiveTime>>,
    #[serde(default, deserialize_with = "double_option")]
    pub point_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    pub lions: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
}

fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

fn assign<T: PartialEq>(
    slot: &mut T,
    value: Option<T>,
    label: &'static str,
    changed: &mut Vec<&'static str>,
) {
    if let Some(value) = value {
        if *slot != value {
            *slot = value;
            changed.push(label);
        }
    }
}

impl UpdateShow {
    /// Applies the update and returns the labels of the fields whose value
    /// actually changed, in briefing order.
    pub fn apply(self, show: &mut Show) -> Vec<&'static str> {
        let mut changed = Vec::new();
        assign(&mut show.name, self.name, "name", &mut changed);
        assign(&mut show.date, self.date, "date", &mut changed);
        assign(&mut show.time, self.time, "time", &mut changed);
        assign(&mut show.point_id, self.point_id, "point person", &mut changed);
        assign(&mut show.lions, self.lions, "lions", &mut changed);
        assign(&mut show.address, self.address, "venue", &mut changed);
        assign(&mut show.notes, self.notes, "notes", &mut changed);
        changed
    }
}

/// A member as seen from a show, with their linked chat identity if any
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberRef {
    pub member_id: Uuid,
    pub display_name: String,
    pub slack_user: Option<SlackUser>,
}

impl MemberRef {
    /// Mention when the member is linked, plain name otherwise
    pub fn mention_or_name(&self) -> String {
        match &self.slack_user {
            Some(slack_user) => slack_user.mention(),
            None => self.display_name.clone(),
        }
    }
}

/// Current state of a show as the channel sync sees it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShowSnapshot {
    pub id: Uuid,
    pub name: String,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub point: Option<MemberRef>,
    pub lions: Option<i32>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub performers: Vec<MemberRef>,
}

impl ShowSnapshot {
    pub fn formatted_date(&self) -> Option<String> {
        self.date.map(|d| d.format("%A, %B %-d, %Y").to_string())
    }

    pub fn formatted_time(&self) -> Option<String> {
        self.time.map(|t| t.format("%-I:%M %p").to_string())
    }

    /// Lion count, where zero means nobody has decided yet
    pub fn lion_count(&self) -> Option<i32> {
        self.lions.filter(|n| *n > 0)
    }

    pub fn venue(&self) -> Option<&str> {
        self.address.as_deref().map(str::trim).filter(|a| !a.is_empty())
    }

    /// Chat identities of the performers that have one
    pub fn performer_slack_users(&self) -> Vec<SlackUser> {
        self.performers
            .iter()
            .filter_map(|p| p.slack_user.clone())
            .collect()
    }

    /// Canonical channel name: `<slug>[-<yyyy-mm-dd>]-<id prefix>`.
    ///
    /// The id prefix keeps two shows with the same name and date apart.
    pub fn default_channel_name(&self) -> String {
        let mut suffix = String::new();
        if let Some(date) = self.date {
            suffix.push_str(&date.format("-%Y-%m-%d").to_string());
        }
        suffix.push('-');
        suffix.push_str(&self.id.simple().to_string()[..8]);

        let mut slug = slugify(&self.name);
        if slug.is_empty() {
            slug.push_str("show");
        }
        truncate_slug(&mut slug, MAX_CHANNEL_NAME_LEN - suffix.len());
        slug + &suffix
    }
}

/// Lowercase ascii alphanumerics, every other run collapsed into one `-`
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Slugs are ascii, so byte truncation never splits a char.
pub fn truncate_slug(slug: &mut String, max_len: usize) {
    slug.truncate(max_len);
    while slug.ends_with('-') {
        slug.pop();
    }
}
