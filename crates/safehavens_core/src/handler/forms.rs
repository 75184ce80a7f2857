//! Submitted form payloads.

use crate::model::review::{FlagKind, ReviewFlags};
use crate::model::venue::VenueFields;
use std::collections::BTreeMap;

/// Prefix that marks a review checkbox as a category tag.
const TAG_FIELD_PREFIX: &str = "tags_";

/// Venue form as posted. Missing inputs count as blank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VenueForm {
    pub name: Option<String>,
    pub venue_type: Option<String>,
    pub address: Option<String>,
    pub post_code: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub link: Option<String>,
    pub lat: Option<String>,
    pub lng: Option<String>,
}

impl VenueForm {
    pub fn into_fields(self) -> VenueFields {
        VenueFields {
            name: self.name.unwrap_or_default(),
            category: self.venue_type,
            address: self.address.unwrap_or_default(),
            post_code: self.post_code.unwrap_or_default(),
            city: self.city.unwrap_or_default(),
            country: self.country.unwrap_or_default(),
            link: self.link.unwrap_or_default(),
            lat: self.lat.unwrap_or_default(),
            lng: self.lng.unwrap_or_default(),
        }
    }
}

/// Review form as posted: free text plus checkbox inputs by field name.
///
/// `tags_<Name>` inputs are category tags; every other checkbox is an
/// inclusivity flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewForm {
    pub text_field: Option<String>,
    pub checkboxes: BTreeMap<String, String>,
}

impl ReviewForm {
    pub fn text(&self) -> String {
        self.text_field.clone().unwrap_or_default()
    }

    /// Default flags, switched on where a checked input was posted.
    pub fn flags(&self) -> ReviewFlags {
        let mut flags = ReviewFlags::defaults();
        for (field, value) in &self.checkboxes {
            let checked = is_checked(value);
            match field.strip_prefix(TAG_FIELD_PREFIX) {
                Some(tag) => flags.set(FlagKind::Category, tag, checked),
                None => flags.set(FlagKind::Inclusivity, field.as_str(), checked),
            }
        }
        flags
    }
}

fn is_checked(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "0" | "off" | "false" | "no"
    )
}

#[cfg(test)]
mod tests {
    use super::{ReviewForm, VenueForm};
    use crate::model::review::FlagKind;
    use std::collections::BTreeMap;

    #[test]
    fn missing_venue_inputs_become_blank() {
        let fields = VenueForm {
            name: Some("Only a name".to_string()),
            ..VenueForm::default()
        }
        .into_fields();
        assert_eq!(fields.name, "Only a name");
        assert_eq!(fields.city, "");
        assert_eq!(fields.category, None);
    }

    #[test]
    fn checkboxes_split_into_flags_and_tags() {
        let form = ReviewForm {
            text_field: Some("Lovely".to_string()),
            checkboxes: BTreeMap::from([
                ("rainbow_flag".to_string(), "on".to_string()),
                ("tags_Trans".to_string(), "y".to_string()),
                ("welcoming".to_string(), "off".to_string()),
            ]),
        };
        let flags = form.flags();
        assert!(flags.get(FlagKind::Inclusivity, "rainbow_flag"));
        assert!(flags.get(FlagKind::Category, "Trans"));
        assert!(!flags.get(FlagKind::Inclusivity, "welcoming"));
        assert!(!flags.get(FlagKind::Category, "Youth"));
        assert!(flags.tags.contains_key("Shelter"));
    }
}
