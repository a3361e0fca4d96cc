//! Numeric type tags and format codes as persisted in the replicated documents.
//!
//! Every enum here round-trips through an `i64` code because that is what the
//! collaborating clients write. Unknown codes are not an error: callers get
//! `None` back and fall through to their own defaults.

use serde::{Deserialize, Serialize};

/// Discriminant of a field's current value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FieldType {
    RichText,
    Number,
    DateTime,
    SingleSelect,
    MultiSelect,
    Checkbox,
    URL,
    Checklist,
    LastEditedTime,
    CreatedTime,
    Relation,
    Summary,
    Translate,
    Time,
    FileMedia,
    Person,
    Rollup,
}

impl FieldType {
    pub const ALL: [FieldType; 17] = [
        FieldType::RichText,
        FieldType::Number,
        FieldType::DateTime,
        FieldType::SingleSelect,
        FieldType::MultiSelect,
        FieldType::Checkbox,
        FieldType::URL,
        FieldType::Checklist,
        FieldType::LastEditedTime,
        FieldType::CreatedTime,
        FieldType::Relation,
        FieldType::Summary,
        FieldType::Translate,
        FieldType::Time,
        FieldType::FileMedia,
        FieldType::Person,
        FieldType::Rollup,
    ];

    /// The persisted numeric tag.
    pub const fn tag(self) -> i64 {
        match self {
            FieldType::RichText => 0,
            FieldType::Number => 1,
            FieldType::DateTime => 2,
            FieldType::SingleSelect => 3,
            FieldType::MultiSelect => 4,
            FieldType::Checkbox => 5,
            FieldType::URL => 6,
            FieldType::Checklist => 7,
            FieldType::LastEditedTime => 8,
            FieldType::CreatedTime => 9,
            FieldType::Relation => 10,
            FieldType::Summary => 11,
            FieldType::Translate => 12,
            FieldType::Time => 13,
            FieldType::FileMedia => 14,
            FieldType::Person => 15,
            FieldType::Rollup => 16,
        }
    }

    pub fn from_tag(tag: i64) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.tag() == tag)
    }

    /// Key of this type's blob inside a field's `type_option` map.
    pub fn type_option_key(self) -> String {
        self.tag().to_string()
    }
}

/// Date rendering preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DateFormat {
    #[default]
    Local,
    US,
    ISO,
    Friendly,
    DayMonthYear,
}

impl DateFormat {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(DateFormat::Local),
            1 => Some(DateFormat::US),
            2 => Some(DateFormat::ISO),
            3 => Some(DateFormat::Friendly),
            4 => Some(DateFormat::DayMonthYear),
            _ => None,
        }
    }

    pub const fn code(self) -> i64 {
        match self {
            DateFormat::Local => 0,
            DateFormat::US => 1,
            DateFormat::ISO => 2,
            DateFormat::Friendly => 3,
            DateFormat::DayMonthYear => 4,
        }
    }

    /// strftime pattern used when rendering a date with this format.
    pub const fn pattern(self) -> &'static str {
        match self {
            DateFormat::Local => "%m/%d/%Y",
            DateFormat::US => "%Y/%m/%d",
            DateFormat::ISO => "%Y-%m-%d",
            DateFormat::Friendly => "%b %d, %Y",
            DateFormat::DayMonthYear => "%d/%m/%Y",
        }
    }
}

/// Time-of-day rendering preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeFormat {
    #[default]
    TwelveHour,
    TwentyFourHour,
}

impl TimeFormat {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(TimeFormat::TwelveHour),
            1 => Some(TimeFormat::TwentyFourHour),
            _ => None,
        }
    }

    pub const fn code(self) -> i64 {
        match self {
            TimeFormat::TwelveHour => 0,
            TimeFormat::TwentyFourHour => 1,
        }
    }

    pub const fn pattern(self) -> &'static str {
        match self {
            TimeFormat::TwelveHour => "%I:%M %p",
            TimeFormat::TwentyFourHour => "%H:%M",
        }
    }
}

/// Display format of a Number field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NumberFormat {
    #[default]
    Num,
    USD,
    EUR,
    Pound,
    Yen,
    Percent,
}

impl NumberFormat {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(NumberFormat::Num),
            1 => Some(NumberFormat::USD),
            2 => Some(NumberFormat::EUR),
            3 => Some(NumberFormat::Pound),
            4 => Some(NumberFormat::Yen),
            5 => Some(NumberFormat::Percent),
            _ => None,
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            NumberFormat::Num => "",
            NumberFormat::USD => "$",
            NumberFormat::EUR => "€",
            NumberFormat::Pound => "£",
            NumberFormat::Yen => "¥",
            NumberFormat::Percent => "%",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FieldVisibility {
    #[default]
    AlwaysShown,
    AlwaysHidden,
}

impl FieldVisibility {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => FieldVisibility::AlwaysHidden,
            _ => FieldVisibility::AlwaysShown,
        }
    }

    pub const fn code(self) -> i64 {
        match self {
            FieldVisibility::AlwaysShown => 0,
            FieldVisibility::AlwaysHidden => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ViewLayout {
    #[default]
    Grid,
    Board,
    Calendar,
}

impl ViewLayout {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => ViewLayout::Board,
            2 => ViewLayout::Calendar,
            _ => ViewLayout::Grid,
        }
    }

    pub const fn code(self) -> i64 {
        match self {
            ViewLayout::Grid => 0,
            ViewLayout::Board => 1,
            ViewLayout::Calendar => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_tags_are_unique() {
        for (i, a) in FieldType::ALL.iter().enumerate() {
            for b in &FieldType::ALL[i + 1..] {
                assert_ne!(a.tag(), b.tag(), "{:?} and {:?} share a tag", a, b);
            }
        }
    }

    #[test]
    fn test_field_type_from_tag() {
        for t in FieldType::ALL {
            assert_eq!(FieldType::from_tag(t.tag()), Some(t));
        }
        assert_eq!(FieldType::from_tag(-1), None);
        assert_eq!(FieldType::from_tag(99), None);
        assert_eq!(FieldType::Rollup.type_option_key(), "16");
        assert_eq!(FieldType::Time.type_option_key(), "13");
    }

    #[test]
    fn test_format_codes() {
        assert_eq!(DateFormat::from_code(2), Some(DateFormat::ISO));
        assert_eq!(DateFormat::from_code(7), None);
        assert_eq!(TimeFormat::from_code(1), Some(TimeFormat::TwentyFourHour));
        assert_eq!(TimeFormat::from_code(2), None);
        assert_eq!(DateFormat::default(), DateFormat::Local);
        assert_eq!(TimeFormat::default(), TimeFormat::TwelveHour);
    }
}
