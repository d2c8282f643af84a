use serde::{Deserialize, Deserializer, Serializer};
use serde_with::{DeserializeAs, SerializeAs};
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

/// Dates are sent in RFC 2822 format:
///
/// ```txt
/// Sat, 21 Aug 2010 22:31:20 +0000
/// ```
///
/// Empty strings and `null` are treated as missing.
pub(crate) struct OptRfc2822;

pub(crate) fn parse_rfc2822(s: &str) -> Result<OffsetDateTime, time::error::Parse> {
    OffsetDateTime::parse(s, &Rfc2822)
}

impl<'de> DeserializeAs<'de, Option<OffsetDateTime>> for OptRfc2822 {
    fn deserialize_as<D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = Option::<String>::deserialize(deserializer)?.filter(|s| !s.is_empty());

        match s {
            Some(s) => parse_rfc2822(&s)
                .map_err(serde::de::Error::custom)
                .map(Some),
            None => Ok(None),
        }
    }
}

impl SerializeAs<Option<OffsetDateTime>> for OptRfc2822 {
    fn serialize_as<S>(source: &Option<OffsetDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match source {
            Some(dt) => {
                let s = dt.format(&Rfc2822).map_err(serde::ser::Error::custom)?;
                serializer.serialize_some(&s)
            }
            None => serializer.serialize_none(),
        }
    }
}
